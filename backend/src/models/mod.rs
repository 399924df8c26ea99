//! Domain models for the cellular simulator

pub mod call;
pub mod outcome;
pub mod state;
pub mod station;
pub mod topology;

// Re-exports
pub use call::CallEvent;
pub use outcome::{CallOutcome, OutcomeLog};
pub use state::SimulationState;
pub use station::{BaseStation, ChannelKind, ChannelPool};
pub use topology::{Direction, LinearTopology};
