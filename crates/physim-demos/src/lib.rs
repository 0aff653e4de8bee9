// Enable portable_simd feature for SIMD optimizations
#![cfg_attr(feature = "simd", feature(portable_simd))]

//! # PhySim Demos
//!
//! Four stepped simulations built on `physim-core`, each written as a pure
//! per-element update rule over the previous state:
//!
//! - **wave**: FTCS wave equation on a height field (triple buffered)
//! - **gravity**: all-pairs N-body with a softening floor
//! - **spring**: driven 2D spring lattice, 4- or 8-neighbor
//! - **fountain**: ballistic particles under constant gravity
//!
//! ## Run
//!
//! ```bash
//! cargo run --release -p physim-demos --bin physim -- wave --frames 500
//! cargo run --release -p physim-demos --bin physim -- spring --config demo.toml
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod demo;
pub mod simulation;

pub use config::{DemoConfig, DisplayConfig};
pub use demo::{run_demo, DemoKind, DemoOutcome, RunOptions};
pub use simulation::{
    Connectivity, FountainParams, FountainSim, GravityParams, GravitySim, RespawnPolicy,
    SpringMeshSim, SpringParams, WaveParams, WaveSim,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{DemoConfig, DisplayConfig};
    pub use crate::demo::{run_demo, DemoKind, DemoOutcome, RunOptions};
    pub use crate::simulation::*;
    pub use physim_core::prelude::*;
}
