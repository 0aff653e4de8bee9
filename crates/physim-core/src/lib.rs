//! # PhySim Core
//!
//! The engine underneath the PhySim demos: flat simulation buffers,
//! identity-swapping double/triple buffering, kernel evaluation over whole
//! buffers, and the frame loop that ties a simulation to a display sink.
//!
//! ## Model
//!
//! Simulation state lives in [`ParticleBuffer`]s (records of `F` floats) or
//! [`FieldBuffer`]s (2D scalar grids). An update rule computes one output
//! element from the read-only previous state; a [`KernelEvaluator`] applies
//! it to every element, sequentially or with rayon. Since rules never read
//! the buffer being written, every element of a step is independent.
//!
//! ```ignore
//! use physim_core::prelude::*;
//!
//! let mut sim_loop = SimulationLoop::new(ParallelEvaluator::new(), NullSink::new());
//! let summary = sim_loop.run(&mut my_sim, LoopLimit::Frames(100));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod display;
pub mod error;
pub mod evaluator;
pub mod render;
pub mod rotation;
pub mod sim_loop;

pub use buffer::{FieldBuffer, ParticleBuffer};
pub use display::{ColorRange, DisplaySink, FrameRecorder, Framebuffer, NullSink};
pub use error::{Result, SimError};
pub use evaluator::{
    CpuEvaluator, FieldRule, KernelEvaluator, ParallelEvaluator, ParticleRule, Region,
    SequentialEvaluator,
};
pub use rotation::{DoubleBuffer, TripleBuffer};
pub use sim_loop::{LoopLimit, RunSummary, Simulation, SimulationLoop};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::buffer::{FieldBuffer, ParticleBuffer};
    pub use crate::display::{ColorRange, DisplaySink, FrameRecorder, Framebuffer, NullSink};
    pub use crate::error::{Result, SimError};
    pub use crate::evaluator::{
        CpuEvaluator, FieldRule, KernelEvaluator, ParallelEvaluator, ParticleRule, Region,
        SequentialEvaluator,
    };
    pub use crate::render;
    pub use crate::rotation::{DoubleBuffer, TripleBuffer};
    pub use crate::sim_loop::{LoopLimit, RunSummary, Simulation, SimulationLoop};
}
