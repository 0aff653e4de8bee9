//! All-pairs N-body gravity.
//!
//! Every particle sums the pull of every other particle from the previous
//! frame's snapshot, so the outer loop is embarrassingly parallel. Squared
//! distances are floored at [`SOFTENING_FLOOR`] to keep close encounters from
//! producing unbounded forces.

use physim_core::prelude::*;
use rand::Rng;
use serde::Deserialize;

/// Record field indices.
pub mod field {
    /// Position x.
    pub const X: usize = 0;
    /// Position y.
    pub const Y: usize = 1;
    /// Position z.
    pub const Z: usize = 2;
    /// Velocity x.
    pub const VX: usize = 3;
    /// Velocity y.
    pub const VY: usize = 4;
    /// Velocity z.
    pub const VZ: usize = 5;
    /// Mass (seven-field records only).
    pub const MASS: usize = 6;
}

/// Particles without a mass field; every particle has unit mass.
pub type UnitParticles = ParticleBuffer<6>;

/// Particles carrying their own mass.
pub type MassiveParticles = ParticleBuffer<7>;

/// Minimum squared distance used in the force law.
pub const SOFTENING_FLOOR: f32 = 1.0;

/// Parameters for the gravity demo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GravityParams {
    /// Number of particles.
    pub particles: usize,
    /// Gravitational constant.
    pub strength: f32,
    /// Use seven-field records with per-particle mass and a heavy anchor.
    pub with_mass: bool,
    /// Mass of the anchor particle (mass variant only).
    pub anchor_mass: f32,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self {
            particles: 512,
            strength: 2.0,
            with_mass: false,
            anchor_mass: 50.0,
        }
    }
}

impl GravityParams {
    /// Set the particle count.
    pub fn with_particles(mut self, particles: usize) -> Self {
        self.particles = particles;
        self
    }

    /// Enable or disable per-particle mass.
    pub fn with_mass(mut self, with_mass: bool) -> Self {
        self.with_mass = with_mass;
        self
    }
}

/// Acceleration exerted on a particle by a source `mass` at offset `dx`.
///
/// `G * mass * dx / (r * r2)` with `r2 = max(SOFTENING_FLOOR, |dx|²)`.
#[inline]
pub fn pair_acceleration(dx: [f32; 3], mass: f32, strength: f32) -> [f32; 3] {
    let r2 = (dx[0] * dx[0] + dx[1] * dx[1] + dx[2] * dx[2]).max(SOFTENING_FLOOR);
    let r = r2.sqrt();
    let k = strength * mass / (r * r2);
    [k * dx[0], k * dx[1], k * dx[2]]
}

/// The all-pairs gravity update over six- or seven-field records.
pub struct GravityField<'a, const F: usize> {
    input: &'a ParticleBuffer<F>,
    strength: f32,
}

impl<'a, const F: usize> GravityField<'a, F> {
    /// Bind the rule to a particle snapshot.
    ///
    /// # Panics
    /// Panics unless `F` is 6 (unit mass) or 7 (with mass).
    pub fn new(input: &'a ParticleBuffer<F>, strength: f32) -> Self {
        assert!(F == 6 || F == 7, "gravity records have 6 or 7 fields, not {F}");
        Self { input, strength }
    }

    #[inline]
    fn mass(record: &[f32; F]) -> f32 {
        record.get(field::MASS).copied().unwrap_or(1.0)
    }

    /// Total acceleration on particle `i` from every particle in the snapshot.
    pub fn acceleration(&self, i: usize) -> [f32; 3] {
        let me = self.input.record(i);
        let mut acc = [0.0f32; 3];
        for other in self.input.records() {
            let dx = [
                other[field::X] - me[field::X],
                other[field::Y] - me[field::Y],
                other[field::Z] - me[field::Z],
            ];
            // Self-interaction has dx = 0 and contributes nothing
            let a = pair_acceleration(dx, Self::mass(other), self.strength);
            acc[0] += a[0];
            acc[1] += a[1];
            acc[2] += a[2];
        }
        acc
    }
}

impl<const F: usize> ParticleRule<F> for GravityField<'_, F> {
    fn len(&self) -> usize {
        self.input.len()
    }

    fn eval(&self, index: usize) -> [f32; F] {
        let acc = self.acceleration(index);
        let mut out = *self.input.record(index);

        // Positions advance with the velocity from before this step
        out[field::X] += out[field::VX];
        out[field::Y] += out[field::VY];
        out[field::Z] += out[field::VZ];
        out[field::VX] += acc[0];
        out[field::VY] += acc[1];
        out[field::VZ] += acc[2];
        out
    }
}

/// N-body demo state.
pub struct GravitySim<const F: usize> {
    particles: DoubleBuffer<ParticleBuffer<F>>,
    image: FieldBuffer,
    params: GravityParams,
}

impl<const F: usize> GravitySim<F> {
    /// Wrap an existing particle set, rendering into a `width × height` image.
    pub fn from_particles(
        particles: ParticleBuffer<F>,
        width: usize,
        height: usize,
        params: GravityParams,
    ) -> Self {
        Self {
            particles: DoubleBuffer::from_initial(particles),
            image: FieldBuffer::new(width, height),
            params,
        }
    }

    /// Scatter `params.particles` at rest over the screen plane (z = 0).
    ///
    /// With seven-field records every particle gets unit mass, and particle 0
    /// becomes an anchor of `params.anchor_mass` at the screen center.
    pub fn seeded<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        params: GravityParams,
        rng: &mut R,
    ) -> Self {
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;

        let mut particles = ParticleBuffer::<F>::new(params.particles);
        for record in particles.records_mut() {
            record[field::X] = rng.gen_range(0.0..=max_x);
            record[field::Y] = rng.gen_range(0.0..=max_y);
            if let Some(mass) = record.get_mut(field::MASS) {
                *mass = 1.0;
            }
        }
        if let Some(anchor) = particles.records_mut().first_mut() {
            if let Some(mass) = anchor.get_mut(field::MASS) {
                *mass = params.anchor_mass;
                anchor[field::X] = width as f32 / 2.0;
                anchor[field::Y] = height as f32 / 2.0;
            }
        }

        tracing::info!(
            particles = params.particles,
            fields = F,
            strength = params.strength,
            "gravity particles seeded"
        );
        Self::from_particles(particles, width, height, params)
    }

    /// The latest particle state.
    pub fn particles(&self) -> &ParticleBuffer<F> {
        self.particles.current()
    }

    /// Parameters in use.
    pub fn params(&self) -> &GravityParams {
        &self.params
    }

    /// Total momentum `Σ m v`.
    pub fn momentum(&self) -> [f32; 3] {
        self.particles().records().iter().fold([0.0; 3], |acc, r| {
            let m = GravityField::<F>::mass(r);
            [
                acc[0] + m * r[field::VX],
                acc[1] + m * r[field::VY],
                acc[2] + m * r[field::VZ],
            ]
        })
    }
}

impl<const F: usize> Simulation for GravitySim<F> {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn render(&mut self) -> &FieldBuffer {
        self.image.fill(0.0);
        let positions = self
            .particles
            .current()
            .records()
            .iter()
            .map(|r| (r[field::X], r[field::Y]));
        render::splat(&mut self.image, positions, 1.0);
        &self.image
    }

    fn step<E: KernelEvaluator>(&mut self, evaluator: &E) {
        let (current, next) = self.particles.split_mut();
        evaluator.realize_particles(&GravityField::new(current, self.params.strength), next);
        self.particles.advance();
    }
}
