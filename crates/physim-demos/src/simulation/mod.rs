//! The four demo simulations.

pub mod fountain;
pub mod gravity;
pub mod spring_mesh;
pub mod wave;

pub use fountain::{BallisticIntegrator, FountainParams, FountainSim, RespawnPolicy};
pub use gravity::{GravityField, GravityParams, GravitySim};
pub use spring_mesh::{Connectivity, SpringDrive, SpringMesh, SpringMeshSim, SpringParams};
pub use wave::{WaveParams, WaveSim, WaveStencil};
