//! Building and running a demo from configuration.

use crate::config::DemoConfig;
use crate::simulation::{FountainSim, GravitySim, SpringMeshSim, WaveSim};
use physim_core::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fmt;

/// The available demos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemoKind {
    /// 2D wave equation on a height field.
    Wave,
    /// All-pairs N-body gravity.
    Gravity,
    /// Driven spring lattice.
    Spring,
    /// Ballistic particle fountain.
    Fountain,
}

impl DemoKind {
    /// Every demo, in menu order.
    pub const ALL: [DemoKind; 4] = [Self::Wave, Self::Gravity, Self::Spring, Self::Fountain];

    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Wave => "wave",
            Self::Gravity => "gravity",
            Self::Spring => "spring",
            Self::Fountain => "fountain",
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-run overrides on top of a [`DemoConfig`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Frames to run; falls back to the config, then to the demo default.
    pub frames: Option<u64>,
    /// Display frequency; falls back to the config, then to the demo default.
    pub display_every: Option<u64>,
    /// Seed; falls back to the config, then to OS entropy.
    pub seed: Option<u64>,
    /// Evaluate on one thread.
    pub sequential: bool,
}

/// Result of a finished demo run.
#[derive(Debug, Clone, Copy)]
pub struct DemoOutcome {
    /// Loop statistics.
    pub summary: RunSummary,
    /// Checksum of the last presented frame (zero if nothing was shown).
    pub checksum: u64,
}

struct Plan {
    limit: LoopLimit,
    display_every: u64,
}

impl Plan {
    fn resolve(kind: DemoKind, config: &DemoConfig, options: &RunOptions) -> Self {
        let default_frames = match kind {
            DemoKind::Fountain => Some(config.fountain.steps),
            _ => None,
        };
        let limit = match options.frames.or(config.frames).or(default_frames) {
            Some(n) => LoopLimit::Frames(n),
            None => LoopLimit::Unbounded,
        };
        // The fountain only traces particle 0 unless asked to draw
        let default_display = match kind {
            DemoKind::Fountain => 0,
            _ => 1,
        };
        let display_every = options
            .display_every
            .or(config.display.display_every)
            .unwrap_or(default_display);
        Self {
            limit,
            display_every,
        }
    }
}

/// Build the requested demo and run it to completion.
///
/// Fails before any stepping if the configuration is invalid or the display
/// surface cannot be created.
pub fn run_demo(kind: DemoKind, config: &DemoConfig, options: &RunOptions) -> Result<DemoOutcome> {
    config.validate()?;

    let display = &config.display;
    let framebuffer =
        Framebuffer::new(display.width, display.height)?.with_range(display.color_range());
    let evaluator = CpuEvaluator::new(!options.sequential);
    let plan = Plan::resolve(kind, config, options);

    let mut rng = match options.seed.or(config.seed) {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let (width, height) = (display.width, display.height);

    tracing::info!(
        demo = %kind,
        width,
        height,
        evaluator = evaluator.name(),
        display_every = plan.display_every,
        "building demo"
    );

    let outcome = match kind {
        DemoKind::Wave => {
            let mut sim = WaveSim::seeded(width, height, config.wave.clone(), &mut rng);
            drive(&mut sim, evaluator, framebuffer, &plan)
        }
        DemoKind::Gravity if config.gravity.with_mass => {
            let mut sim = GravitySim::<7>::seeded(width, height, config.gravity.clone(), &mut rng);
            drive(&mut sim, evaluator, framebuffer, &plan)
        }
        DemoKind::Gravity => {
            let mut sim = GravitySim::<6>::seeded(width, height, config.gravity.clone(), &mut rng);
            drive(&mut sim, evaluator, framebuffer, &plan)
        }
        DemoKind::Spring => {
            let mut sim = SpringMeshSim::seeded(width, height, config.spring.clone(), &mut rng);
            drive(&mut sim, evaluator, framebuffer, &plan)
        }
        DemoKind::Fountain => {
            let mut sim = FountainSim::seeded(width, height, config.fountain.clone(), rng);
            drive(&mut sim, evaluator, framebuffer, &plan)
        }
    };
    Ok(outcome)
}

fn drive<S: Simulation>(
    sim: &mut S,
    evaluator: CpuEvaluator,
    framebuffer: Framebuffer,
    plan: &Plan,
) -> DemoOutcome {
    let mut sim_loop =
        SimulationLoop::new(evaluator, framebuffer).with_display_every(plan.display_every);
    let summary = sim_loop.run(sim, plan.limit);
    let checksum = if summary.displayed > 0 {
        sim_loop.sink().checksum()
    } else {
        0
    };
    DemoOutcome { summary, checksum }
}
