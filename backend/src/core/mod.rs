//! Core simulation infrastructure

pub mod clock;

// Re-exports
pub use clock::SimulationClock;
