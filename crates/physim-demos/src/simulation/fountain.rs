//! Ballistic particles under constant gravity.
//!
//! Screen coordinates grow downward, so gravity is a positive `vy` increment
//! and launches have negative `vy`.

use physim_core::prelude::*;
use rand::Rng;
use serde::Deserialize;
use std::f32::consts::{FRAC_PI_4, PI};

/// Record field indices.
pub mod field {
    /// Position x.
    pub const X: usize = 0;
    /// Position y.
    pub const Y: usize = 1;
    /// Velocity x.
    pub const VX: usize = 2;
    /// Velocity y.
    pub const VY: usize = 3;
}

/// Fountain particles: `(x, y, vx, vy)`.
pub type FountainParticles = ParticleBuffer<4>;

/// What happens to particles that leave the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RespawnPolicy {
    /// Particles keep falling forever.
    #[default]
    Never,
    /// Particles past the sides or the bottom are launched again from the source.
    OffScreen,
}

/// Parameters for the fountain demo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FountainParams {
    /// Number of particles.
    pub particles: usize,
    /// Time step factor applied to launch speeds and gravity.
    pub timescale: f32,
    /// Gravity per unit timescale.
    pub gravity_scale: f32,
    /// Frames in a default run.
    pub steps: u64,
    /// Off-screen handling.
    pub respawn: RespawnPolicy,
    /// Launch point; the bottom center of the screen when unset.
    pub source: Option<(f32, f32)>,
}

impl Default for FountainParams {
    fn default() -> Self {
        Self {
            particles: 100_000,
            timescale: 0.001,
            gravity_scale: 1.0,
            steps: 100,
            respawn: RespawnPolicy::Never,
            source: None,
        }
    }
}

impl FountainParams {
    /// Set the particle count.
    pub fn with_particles(mut self, particles: usize) -> Self {
        self.particles = particles;
        self
    }

    /// Set the respawn policy.
    pub fn with_respawn(mut self, respawn: RespawnPolicy) -> Self {
        self.respawn = respawn;
        self
    }

    /// Gravity added to `vy` per step.
    pub fn gravity(&self) -> f32 {
        self.gravity_scale * self.timescale
    }
}

/// Random launch state at `source`.
pub fn launch<R: Rng + ?Sized>(rng: &mut R, source: (f32, f32), timescale: f32) -> [f32; 4] {
    let speed: f32 = (0..3).map(|_| rng.gen_range(10.0f32..100.0)).sum::<f32>() * timescale;
    let angle = rng.gen_range(FRAC_PI_4..3.0 * PI / 4.0);
    [source.0, source.1, speed * angle.cos(), -speed * angle.sin()]
}

/// Semi-implicit Euler step under constant gravity.
pub struct BallisticIntegrator<'a> {
    input: &'a FountainParticles,
    gravity: f32,
}

impl<'a> BallisticIntegrator<'a> {
    /// Bind the integrator to a particle snapshot.
    pub fn new(input: &'a FountainParticles, gravity: f32) -> Self {
        Self { input, gravity }
    }
}

impl ParticleRule<4> for BallisticIntegrator<'_> {
    fn len(&self) -> usize {
        self.input.len()
    }

    #[inline]
    fn eval(&self, index: usize) -> [f32; 4] {
        let [x, y, vx, vy] = *self.input.record(index);
        let vy = vy + self.gravity;
        [x + vx, y + vy, vx, vy]
    }
}

/// Fountain demo state.
pub struct FountainSim<R> {
    particles: DoubleBuffer<FountainParticles>,
    image: FieldBuffer,
    params: FountainParams,
    source: (f32, f32),
    rng: R,
}

impl<R: Rng> FountainSim<R> {
    /// Launch every particle from the source of a `width × height` screen.
    ///
    /// The generator is kept for respawns.
    pub fn seeded(width: usize, height: usize, params: FountainParams, mut rng: R) -> Self {
        let source = params
            .source
            .unwrap_or((width as f32 / 2.0, height.saturating_sub(1) as f32));
        let records = (0..params.particles)
            .map(|_| launch(&mut rng, source, params.timescale))
            .collect();

        tracing::info!(
            particles = params.particles,
            source = ?source,
            respawn = ?params.respawn,
            "fountain launched"
        );
        Self {
            particles: DoubleBuffer::from_initial(FountainParticles::from_records(records)),
            image: FieldBuffer::new(width, height),
            params,
            source,
            rng,
        }
    }

    /// The latest particle state.
    pub fn particles(&self) -> &FountainParticles {
        self.particles.current()
    }

    /// Launch point.
    pub fn source(&self) -> (f32, f32) {
        self.source
    }

    /// Parameters in use.
    pub fn params(&self) -> &FountainParams {
        &self.params
    }

    /// Relaunch off-screen particles in the freshly computed buffer.
    fn respawn(&mut self) -> usize {
        let (width, height) = (self.image.width(), self.image.height());
        let (source, timescale) = (self.source, self.params.timescale);
        let mut relaunched = 0;
        for record in self.particles.next_mut().records_mut() {
            if !on_screen(record, width, height) {
                *record = launch(&mut self.rng, source, timescale);
                relaunched += 1;
            }
        }
        relaunched
    }
}

/// Whether a particle is still in play on a `width × height` screen.
///
/// Particles above the top edge still count, since they fall back.
fn on_screen(record: &[f32; 4], width: usize, height: usize) -> bool {
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;
    (0.0..=max_x).contains(&record[field::X]) && record[field::Y] <= max_y
}

/// Whether a particle can be drawn without clamping it onto the border.
fn visible(record: &[f32; 4], width: usize, height: usize) -> bool {
    on_screen(record, width, height) && record[field::Y] >= 0.0
}

impl<R: Rng> Simulation for FountainSim<R> {
    fn name(&self) -> &'static str {
        "fountain"
    }

    fn render(&mut self) -> &FieldBuffer {
        let (width, height) = (self.image.width(), self.image.height());
        self.image.fill(0.0);
        let positions = self
            .particles
            .current()
            .records()
            .iter()
            .filter(|r| visible(r, width, height))
            .map(|r| (r[field::X], r[field::Y]));
        render::splat(&mut self.image, positions, 1.0);
        &self.image
    }

    fn step<E: KernelEvaluator>(&mut self, evaluator: &E) {
        if let Some(first) = self.particles.current().records().first() {
            tracing::trace!(
                x = first[field::X],
                y = first[field::Y],
                vx = first[field::VX],
                vy = first[field::VY],
                "particle 0"
            );
        }

        let (current, next) = self.particles.split_mut();
        let integrator = BallisticIntegrator::new(current, self.params.gravity());
        evaluator.realize_particles(&integrator, next);

        if self.params.respawn == RespawnPolicy::OffScreen {
            let relaunched = self.respawn();
            if relaunched > 0 {
                tracing::debug!(relaunched, "fountain respawn");
            }
        }
        self.particles.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use tracing::field::{Field, Visit};

    #[test]
    fn test_ballistic_step() {
        let input = FountainParticles::from_records(vec![[3.0, 50.0, 0.5, -5.0]]);
        let out = BallisticIntegrator::new(&input, 0.1).eval(0);

        assert!((out[field::VY] + 4.9).abs() < 1e-6);
        assert!((out[field::Y] - 45.1).abs() < 1e-5);
        assert_eq!(out[field::X], 3.5);
        assert_eq!(out[field::VX], 0.5);
    }

    #[test]
    fn test_launch_ranges() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..1000 {
            let [x, y, vx, vy] = launch(&mut rng, (640.0, 719.0), 0.001);
            assert_eq!((x, y), (640.0, 719.0));

            let speed = (vx * vx + vy * vy).sqrt();
            assert!((0.03 - 1e-5..=0.3 + 1e-5).contains(&speed), "speed {speed}");
            // Upward, within 45 degrees of vertical
            assert!(vy < 0.0);
            assert!(vx.abs() <= -vy + 1e-6);
        }
    }

    #[test]
    fn test_default_source() {
        let params = FountainParams::default().with_particles(10);
        let sim = FountainSim::seeded(1280, 720, params, SmallRng::seed_from_u64(2));
        assert_eq!(sim.source(), (640.0, 719.0));
        assert_eq!(sim.particles().len(), 10);
        assert!((sim.params().gravity() - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_never_respawn_keeps_falling() {
        let params = FountainParams {
            particles: 4,
            timescale: 1.0,
            gravity_scale: 100.0,
            ..FountainParams::default()
        };
        let mut sim = FountainSim::seeded(32, 32, params, SmallRng::seed_from_u64(3));
        for _ in 0..20 {
            sim.step(&SequentialEvaluator);
        }
        assert!(sim.particles().records().iter().all(|r| r[field::Y] > 31.0));
    }

    #[test]
    fn test_off_screen_respawn() {
        let params = FountainParams {
            particles: 4,
            timescale: 1.0,
            gravity_scale: 100.0,
            ..FountainParams::default()
        }
        .with_respawn(RespawnPolicy::OffScreen);
        let mut sim = FountainSim::seeded(32, 32, params, SmallRng::seed_from_u64(3));
        for _ in 0..20 {
            sim.step(&SequentialEvaluator);
            for r in sim.particles().records() {
                assert!(r[field::Y] <= 31.0, "particle left the screen: {r:?}");
                assert!((0.0..=31.0).contains(&r[field::X]));
            }
        }
    }

    #[test]
    fn test_render_skips_off_screen() {
        let mut sim = FountainSim::seeded(
            16,
            16,
            FountainParams::default().with_particles(0),
            SmallRng::seed_from_u64(4),
        );
        sim.particles = DoubleBuffer::from_initial(FountainParticles::from_records(vec![
            [3.0, 4.0, 0.0, 0.0],
            [8.0, 40.0, 0.0, 0.0],
            [9.0, -3.0, 0.0, 0.0],
            [-2.0, 6.0, 0.0, 0.0],
        ]));

        let image = sim.render();
        assert_eq!(image.get(3, 4), 1.0);
        // Above the top edge is not clamped onto row 0
        assert_eq!(image.get(9, 0), 0.0);
        assert_eq!(image.as_slice().iter().sum::<f32>(), 1.0);
    }

    /// Collects the `y` field of every "particle 0" event.
    #[derive(Clone, Default)]
    struct TraceRecorder(std::sync::Arc<std::sync::Mutex<Vec<f64>>>);

    struct YVisitor<'a>(&'a mut Vec<f64>);

    impl Visit for YVisitor<'_> {
        fn record_f64(&mut self, field: &Field, value: f64) {
            if field.name() == "y" {
                self.0.push(value);
            }
        }

        fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for TraceRecorder {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut ys = self.0.lock().unwrap();
            event.record(&mut YVisitor(&mut ys));
        }
    }

    #[test]
    fn test_trace_shows_state_before_each_step() {
        use tracing_subscriber::layer::SubscriberExt;

        let params = FountainParams {
            particles: 1,
            timescale: 1.0,
            gravity_scale: 0.1,
            ..FountainParams::default()
        };
        let mut sim = FountainSim::seeded(64, 64, params, SmallRng::seed_from_u64(6));
        let start = vec![[5.0, 50.0, 0.0, -5.0]];
        sim.particles = DoubleBuffer::from_initial(FountainParticles::from_records(start));

        let recorder = TraceRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..3 {
                sim.step(&SequentialEvaluator);
            }
        });

        let ys = recorder.0.lock().unwrap().clone();
        assert_eq!(ys.len(), 3);
        assert_eq!(ys[0], 50.0);
        assert!((ys[1] - 45.1).abs() < 1e-4);
        assert!((ys[2] - 40.3).abs() < 1e-4);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let params = FountainParams::default().with_particles(5000);
        let mut seq = FountainSim::seeded(1280, 720, params.clone(), SmallRng::seed_from_u64(5));
        let mut par = FountainSim::seeded(1280, 720, params, SmallRng::seed_from_u64(5));
        for _ in 0..25 {
            seq.step(&SequentialEvaluator);
            par.step(&ParallelEvaluator::new());
        }
        assert_eq!(seq.particles(), par.particles());
    }
}
