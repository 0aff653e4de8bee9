//! The frame loop driving a simulation.
//!
//! Each frame runs `prepare → [display] → step` to completion before the
//! next one starts. The loop owns the evaluator and the display sink; the
//! simulation owns its buffers and rotates them at the end of `step`.

use crate::buffer::FieldBuffer;
use crate::display::DisplaySink;
use crate::evaluator::KernelEvaluator;
use std::time::{Duration, Instant};

/// A stepped simulation with renderable state.
pub trait Simulation {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Hook run at the start of every frame, before display and step.
    ///
    /// Used for externally driven perturbations of the current state and for
    /// per-frame bookkeeping, such as trails, that must not depend on how
    /// often the frame is displayed.
    fn prepare(&mut self, _frame: u64) {}

    /// Render the current state into a float image and return it.
    fn render(&mut self) -> &FieldBuffer;

    /// Compute the next state from the current one and make it current.
    fn step<E: KernelEvaluator>(&mut self, evaluator: &E);
}

/// How many frames a run lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopLimit {
    /// Run until the process is terminated.
    #[default]
    Unbounded,
    /// Run exactly this many frames.
    Frames(u64),
}

impl LoopLimit {
    fn reached(self, frames: u64) -> bool {
        match self {
            LoopLimit::Unbounded => false,
            LoopLimit::Frames(n) => frames >= n,
        }
    }
}

/// Statistics for a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Frames stepped during the run.
    pub frames: u64,
    /// Frames handed to the display sink during the run.
    pub displayed: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Average stepping rate.
    pub fn frames_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Drives a [`Simulation`] with an evaluator and a display sink.
pub struct SimulationLoop<E, D> {
    evaluator: E,
    sink: D,
    display_every: u64,
    frame: u64,
}

impl<E: KernelEvaluator, D: DisplaySink> SimulationLoop<E, D> {
    /// Create a loop that displays every frame.
    pub fn new(evaluator: E, sink: D) -> Self {
        Self {
            evaluator,
            sink,
            display_every: 1,
            frame: 0,
        }
    }

    /// Display only every `n`-th frame; `0` disables display.
    pub fn with_display_every(mut self, n: u64) -> Self {
        self.display_every = n;
        self
    }

    /// Number of frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The evaluator in use.
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// The display sink.
    pub fn sink(&self) -> &D {
        &self.sink
    }

    /// Consume the loop, returning the sink.
    pub fn into_sink(self) -> D {
        self.sink
    }

    fn displays(&self, frame: u64) -> bool {
        self.display_every != 0 && frame % self.display_every == 0
    }

    /// Run a single frame.
    pub fn run_frame<S: Simulation>(&mut self, sim: &mut S) {
        let frame = self.frame;
        tracing::debug!(frame, sim = sim.name(), "frame");

        sim.prepare(frame);
        if self.displays(frame) {
            let image = sim.render();
            self.sink.present(image);
        }
        sim.step(&self.evaluator);

        self.frame += 1;
    }

    /// Run frames until `limit` is reached.
    pub fn run<S: Simulation>(&mut self, sim: &mut S, limit: LoopLimit) -> RunSummary {
        tracing::info!(
            sim = sim.name(),
            evaluator = self.evaluator.name(),
            ?limit,
            "starting simulation"
        );

        let start = Instant::now();
        let first_frame = self.frame;
        let first_displayed = self.sink.frames_presented();

        while !limit.reached(self.frame - first_frame) {
            self.run_frame(sim);
        }

        let summary = RunSummary {
            frames: self.frame - first_frame,
            displayed: self.sink.frames_presented() - first_displayed,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            sim = sim.name(),
            frames = summary.frames,
            displayed = summary.displayed,
            fps = summary.frames_per_sec(),
            "simulation finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ParticleBuffer;
    use crate::display::{FrameRecorder, NullSink};
    use crate::evaluator::{ParticleRule, SequentialEvaluator};
    use crate::rotation::DoubleBuffer;

    /// One particle counting up by one per step; logs call order.
    struct Counter {
        state: DoubleBuffer<ParticleBuffer<1>>,
        image: FieldBuffer,
        log: Vec<String>,
    }

    struct Increment<'a> {
        input: &'a ParticleBuffer<1>,
    }

    impl ParticleRule<1> for Increment<'_> {
        fn len(&self) -> usize {
            self.input.len()
        }

        fn eval(&self, index: usize) -> [f32; 1] {
            [self.input.read(index, 0) + 1.0]
        }
    }

    impl Counter {
        fn new() -> Self {
            Self {
                state: DoubleBuffer::from_initial(ParticleBuffer::new(1)),
                image: FieldBuffer::new(1, 1),
                log: Vec::new(),
            }
        }
    }

    impl Simulation for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn prepare(&mut self, frame: u64) {
            self.log.push(format!("prepare {frame}"));
        }

        fn render(&mut self) -> &FieldBuffer {
            let value = self.state.current().read(0, 0);
            self.log.push(format!("render {value}"));
            self.image.set(0, 0, value);
            &self.image
        }

        fn step<E: KernelEvaluator>(&mut self, evaluator: &E) {
            let (current, next) = self.state.split_mut();
            evaluator.realize_particles(&Increment { input: current }, next);
            self.state.advance();
            self.log.push("step".to_string());
        }
    }

    #[test]
    fn test_bounded_run() {
        let mut sim = Counter::new();
        let mut sim_loop = SimulationLoop::new(SequentialEvaluator, NullSink::new());

        let summary = sim_loop.run(&mut sim, LoopLimit::Frames(100));

        assert_eq!(summary.frames, 100);
        assert_eq!(summary.displayed, 100);
        assert_eq!(sim.state.current().read(0, 0), 100.0);
    }

    #[test]
    fn test_frame_ordering() {
        let mut sim = Counter::new();
        let mut sim_loop = SimulationLoop::new(SequentialEvaluator, NullSink::new());

        sim_loop.run(&mut sim, LoopLimit::Frames(2));

        assert_eq!(
            sim.log,
            vec!["prepare 0", "render 0", "step", "prepare 1", "render 1", "step"]
        );
    }

    #[test]
    fn test_display_every() {
        let mut sim = Counter::new();
        let mut sim_loop =
            SimulationLoop::new(SequentialEvaluator, FrameRecorder::new(10)).with_display_every(3);

        let summary = sim_loop.run(&mut sim, LoopLimit::Frames(7));

        // Frames 0, 3 and 6 are displayed, showing the state before their step
        assert_eq!(summary.displayed, 3);
        let shown: Vec<f32> = sim_loop.sink().frames().iter().map(|f| f.get(0, 0)).collect();
        assert_eq!(shown, vec![0.0, 3.0, 6.0]);
    }

    #[test]
    fn test_display_disabled() {
        let mut sim = Counter::new();
        let mut sim_loop =
            SimulationLoop::new(SequentialEvaluator, NullSink::new()).with_display_every(0);
        let summary = sim_loop.run(&mut sim, LoopLimit::Frames(5));
        assert_eq!(summary.displayed, 0);
        assert_eq!(sim_loop.frame(), 5);
    }
}
