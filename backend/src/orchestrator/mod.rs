//! Orchestrator - main simulation loop
//!
//! Implements the complete event-dispatch loop integrating all simulation
//! components.
//!
//! See `engine.rs` for full implementation.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use engine::{
    SchemeConfig, Simulation, SimulationConfig, SimulationError, SimulationReport,
};

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot, StationSnapshot};
