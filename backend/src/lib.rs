//! Cellular Simulator Core - Rust Engine
//!
//! Discrete-event simulator for call traffic along a linear chain of
//! cellular base stations with fixed channel allocation, measuring
//! blocked-call and dropped-call rates with deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Simulation clock
//! - **models**: Domain types (BaseStation, CallEvent, State, Topology)
//! - **motion**: Car kinematics and next-event planning
//! - **policy**: Channel admission schemes (full access, reserved handover)
//! - **scheduler**: Time-ordered event queue
//! - **traffic**: Call sources (stochastic, trace-driven)
//! - **orchestrator**: Main simulation loop and checkpoints
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All times are f64 seconds; the clock never moves backwards
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Blocked and dropped calls are counted outcomes, never errors

// Module declarations
pub mod core;
pub mod models;
pub mod motion;
pub mod orchestrator;
pub mod policy;
pub mod rng;
pub mod scheduler;
pub mod traffic;

// Re-exports for convenience
pub use core::SimulationClock;
pub use models::{
    call::CallEvent,
    outcome::{CallOutcome, OutcomeLog},
    state::SimulationState,
    station::{BaseStation, ChannelKind, ChannelPool},
    topology::{Direction, LinearTopology},
};
pub use motion::{kmh_to_ms, LegEntry, MotionCalculator, TravelLeg};
pub use orchestrator::{
    SchemeConfig, Simulation, SimulationConfig, SimulationError, SimulationReport, StateSnapshot,
};
pub use policy::{ChannelPolicy, FullAccessPolicy, ReservedHandoverPolicy};
pub use rng::RngManager;
pub use scheduler::EventScheduler;
pub use traffic::{
    CallRecord, CallSource, StochasticSource, TraceSource, TrafficConfig, TrafficError,
};
