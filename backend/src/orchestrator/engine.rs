//! Simulation Engine
//!
//! Main discrete-event loop integrating all components:
//! - Call admission (traffic sources, channel policy)
//! - Event dispatch (initiation, handover, termination)
//! - Motion planning (next event per admitted call)
//! - Warm-up discard and statistics aggregation
//! - Outcome logging (complete per-call history)
//!
//! # Architecture
//!
//! The driver is a classic event-queue drain:
//!
//! ```text
//! Seed: pull one Initiation per requested call from the source
//! Loop while the queue is non-empty:
//! 1. Pop the earliest event, advance the clock to its time
//! 2. Initiation  → policy admits (schedule next leg) or blocks
//! 3. Handover    → release here, resolve neighbor, policy admits
//!                  (schedule next leg) or drops
//! 4. Termination → release, count completion
//! 5. After each Initiation: warm-up threshold check, one-time reset
//! ```
//!
//! Time never advances except through step 1, so clock monotonicity is
//! exactly heap ordering.
//!
//! # Example
//!
//! ```rust
//! use cellular_simulator_core_rs::orchestrator::{SchemeConfig, Simulation, SimulationConfig};
//! use cellular_simulator_core_rs::traffic::{StochasticSource, TrafficConfig};
//!
//! let config = SimulationConfig {
//!     total_calls: 200,
//!     warm_up_calls: 20,
//!     rng_seed: 12345,
//!     scheme: SchemeConfig::ReservedHandover { reserved_channels: 1 },
//!     ..SimulationConfig::default()
//! };
//!
//! let mut source = StochasticSource::new(
//!     TrafficConfig::default(),
//!     config.num_stations,
//!     config.coverage_m,
//! );
//! let mut simulation = Simulation::new(config, &mut source).unwrap();
//! let report = simulation.run();
//!
//! assert_eq!(report.total_calls, 200);
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::call::CallEvent;
use crate::models::outcome::{CallOutcome, OutcomeLog};
use crate::models::state::SimulationState;
use crate::models::station::ChannelKind;
use crate::models::topology::{Direction, LinearTopology};
use crate::motion::{LegEntry, MotionCalculator, TravelLeg};
use crate::policy::{ChannelPolicy, FullAccessPolicy, ReservedHandoverPolicy};
use crate::rng::RngManager;
use crate::scheduler::EventScheduler;
use crate::traffic::{validate_record, CallSource, TrafficError};

// ============================================================================
// Configuration Types
// ============================================================================

/// Channel scheme selection
///
/// Determines how each station's fixed budget is split and what handovers
/// may draw from. See the policy module for the admission rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeConfig {
    /// Plain FCA: every channel is ordinary
    FullAccess,

    /// FCA with a handover-only reserve per station
    ReservedHandover { reserved_channels: usize },
}

/// Complete simulation configuration
///
/// All reference values are run parameters; nothing in the engine is
/// hardwired to the 20-station highway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of the linear station chain
    pub num_stations: usize,

    /// Total channel budget per station, split by the scheme
    pub channels_per_station: usize,

    /// Coverage length of one station, meters
    pub coverage_m: f64,

    /// Call records admitted into the run
    pub total_calls: u64,

    /// Initiation dispatches before blocked/dropped statistics are zeroed
    pub warm_up_calls: u64,

    /// Seed for the deterministic RNG
    pub rng_seed: u64,

    /// Channel scheme
    pub scheme: SchemeConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_stations: 20,
            channels_per_station: 10,
            coverage_m: 2000.0,
            total_calls: 10_000,
            warm_up_calls: 1_705,
            rng_seed: 42,
            scheme: SchemeConfig::FullAccess,
        }
    }
}

impl SimulationConfig {
    /// Validate the configuration
    ///
    /// Called by [`Simulation::new`]; exposed for config-loading code
    /// that wants to fail before building a source.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.num_stations == 0 {
            return Err(SimulationError::InvalidConfig(
                "num_stations must be > 0".to_string(),
            ));
        }

        if self.channels_per_station == 0 {
            return Err(SimulationError::InvalidConfig(
                "channels_per_station must be > 0".to_string(),
            ));
        }

        if !(self.coverage_m.is_finite() && self.coverage_m > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "coverage_m must be positive, got {}",
                self.coverage_m
            )));
        }

        if self.total_calls == 0 {
            return Err(SimulationError::InvalidConfig(
                "total_calls must be > 0".to_string(),
            ));
        }

        if self.warm_up_calls >= self.total_calls {
            return Err(SimulationError::InvalidConfig(format!(
                "warm_up_calls ({}) must be below total_calls ({})",
                self.warm_up_calls, self.total_calls
            )));
        }

        if let SchemeConfig::ReservedHandover { reserved_channels } = self.scheme {
            if reserved_channels == 0 {
                return Err(SimulationError::InvalidConfig(
                    "reserved_channels must be > 0 under the reserved scheme".to_string(),
                ));
            }
            if reserved_channels >= self.channels_per_station {
                return Err(SimulationError::InvalidConfig(format!(
                    "reserved_channels ({}) must leave ordinary channels out of {}",
                    reserved_channels, self.channels_per_station
                )));
            }
        }

        Ok(())
    }

    /// Calls measured after the warm-up discard
    pub fn measured_calls(&self) -> u64 {
        self.total_calls - self.warm_up_calls
    }
}

/// Materialize the configured scheme into a policy object
pub(crate) fn build_policy(scheme: &SchemeConfig) -> Box<dyn ChannelPolicy> {
    match scheme {
        SchemeConfig::FullAccess => Box::new(FullAccessPolicy::new()),
        SchemeConfig::ReservedHandover { reserved_channels } => {
            Box::new(ReservedHandoverPolicy::new(*reserved_channels))
        }
    }
}

// ============================================================================
// Report and Errors
// ============================================================================

/// Final statistics of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Policy name of the scheme that produced the numbers
    pub scheme: String,

    /// Call records admitted
    pub total_calls: u64,

    /// Initiation dispatches discarded as warm-up
    pub warm_up_calls: u64,

    /// Blocked calls after the warm-up discard
    pub blocked_calls: u64,

    /// Dropped calls after the warm-up discard
    pub dropped_calls: u64,

    /// Completed calls over the whole run (diagnostic)
    pub completed_calls: u64,

    /// Blocked calls as a percentage of the measured calls
    pub blocked_rate_percent: f64,

    /// Dropped calls as a percentage of the measured calls
    pub dropped_rate_percent: f64,

    /// Clock value when the queue drained, seconds
    pub final_time_s: f64,
}

impl std::fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Scheme:          {}", self.scheme)?;
        writeln!(
            f,
            "Total calls:     {} ({} warm-up)",
            self.total_calls, self.warm_up_calls
        )?;
        writeln!(
            f,
            "Blocked calls:   {} ({:.3}%)",
            self.blocked_calls, self.blocked_rate_percent
        )?;
        writeln!(
            f,
            "Dropped calls:   {} ({:.3}%)",
            self.dropped_calls, self.dropped_rate_percent
        )?;
        writeln!(f, "Completed calls: {}", self.completed_calls)?;
        write!(f, "Clock at finish: {:.2} s", self.final_time_s)
    }
}

/// Simulation error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// Configuration validation error
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Input record error from a traffic source
    #[error(transparent)]
    Traffic(#[from] TrafficError),

    /// Serde failure while hashing or persisting state
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Snapshot failed an integrity check
    #[error("state validation failed: {0}")]
    StateValidationError(String),

    /// Snapshot was taken under a different configuration
    #[error("config hash mismatch: snapshot has {snapshot}, current config has {current}")]
    ConfigHashMismatch { snapshot: String, current: String },
}

// ============================================================================
// Simulation
// ============================================================================

/// Discrete-event simulation driver
///
/// Owns all run state and drains the event queue to completion. All call
/// records are pulled from the source and validated up front, so a
/// constructed `Simulation` can no longer fail; blocking and dropping are
/// counted outcomes, not errors.
///
/// # Determinism
///
/// All randomness goes through the seeded xorshift64* RNG. Same seed +
/// same config (or same trace) = identical dispatch sequence, counters
/// and outcome log.
#[derive(Debug)]
pub struct Simulation {
    /// Configuration the run was built from
    config: SimulationConfig,

    /// Stations, clock and counters
    state: SimulationState,

    /// Pending events, earliest first
    scheduler: EventScheduler,

    /// Deterministic RNG (consumed during seeding, kept for checkpoints)
    rng: RngManager,

    /// Channel admission policy built from the scheme
    policy: Box<dyn ChannelPolicy>,

    /// Kinematics of the station chain
    motion: MotionCalculator,

    /// Station adjacency
    topology: LinearTopology,

    /// Per-dispatch outcome records
    outcome_log: OutcomeLog,
}

impl Simulation {
    /// Create a simulation and seed it with `config.total_calls` records
    ///
    /// Pulls every record from `source` immediately, validating each
    /// against the chain geometry; the first bad record aborts with an
    /// error naming it. Arrival order does not matter, the queue orders
    /// dispatch by time.
    pub fn new(
        config: SimulationConfig,
        source: &mut dyn CallSource,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let policy = build_policy(&config.scheme);
        let (ordinary, reserved) = policy.pool_layout(config.channels_per_station);

        let topology = LinearTopology::new(config.num_stations);
        let mut rng = RngManager::new(config.rng_seed);
        let mut scheduler = EventScheduler::new();

        for _ in 0..config.total_calls {
            let record = source.next_call(&mut rng)?;
            validate_record(&record, config.num_stations, config.coverage_m)?;

            scheduler.insert(CallEvent::Initiation {
                call_id: record.id,
                time: record.arrival_time_s,
                station: record.station,
                speed_kmh: record.speed_kmh,
                duration_s: record.duration_s,
                direction: record.direction,
                position_m: record.position_m,
            });
        }

        info!(
            "seeded {} calls across {} stations ({} scheme)",
            config.total_calls,
            config.num_stations,
            policy.name()
        );

        Ok(Self {
            state: SimulationState::new(config.num_stations, ordinary, reserved),
            motion: MotionCalculator::new(config.coverage_m, topology),
            topology,
            scheduler,
            rng,
            policy,
            outcome_log: OutcomeLog::new(),
            config,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Configuration the run was built from
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current run state
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Events not yet dispatched
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    /// Outcome records so far, in dispatch order
    pub fn outcome_log(&self) -> &OutcomeLog {
        &self.outcome_log
    }

    /// Current RNG state (for checkpointing)
    pub fn rng_state(&self) -> u64 {
        self.rng.get_state()
    }

    /// Pending events in dispatch order (for checkpointing)
    pub fn pending_in_order(&self) -> Vec<CallEvent> {
        self.scheduler.pending_in_order()
    }

    /// Rebuild a simulation around restored state
    ///
    /// Used by snapshot restore; `pending` must already be in dispatch
    /// order and is re-inserted as such. The config must have passed
    /// validation.
    pub(crate) fn from_restored(
        config: SimulationConfig,
        state: SimulationState,
        pending: Vec<CallEvent>,
        rng_state: u64,
    ) -> Self {
        let policy = build_policy(&config.scheme);
        let topology = LinearTopology::new(config.num_stations);

        let mut scheduler = EventScheduler::new();
        for event in pending {
            scheduler.insert(event);
        }

        Self {
            motion: MotionCalculator::new(config.coverage_m, topology),
            topology,
            state,
            scheduler,
            rng: RngManager::new(rng_state),
            policy,
            outcome_log: OutcomeLog::new(),
            config,
        }
    }

    // ========================================================================
    // Dispatch Loop
    // ========================================================================

    /// Dispatch the next event
    ///
    /// Returns `false` once the queue is empty. The clock advances to the
    /// popped event's time before the event is handled.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.scheduler.pop_earliest() else {
            return false;
        };

        self.state.advance_clock_to(event.time());

        match event {
            CallEvent::Initiation {
                call_id,
                time,
                station,
                speed_kmh,
                duration_s,
                direction,
                position_m,
            } => {
                self.dispatch_initiation(
                    call_id, time, station, speed_kmh, duration_s, direction, position_m,
                );
            }
            CallEvent::Handover {
                call_id,
                time,
                station,
                speed_kmh,
                remaining_s,
                direction,
                channel,
            } => {
                self.dispatch_handover(
                    call_id, time, station, speed_kmh, remaining_s, direction, channel,
                );
            }
            CallEvent::Termination {
                call_id,
                time,
                station,
                channel,
            } => {
                self.dispatch_termination(call_id, time, station, channel);
            }
        }

        true
    }

    /// Drain the queue and produce the final report
    ///
    /// Once the queue empties every admitted call has released its
    /// channel, which is asserted here.
    pub fn run(&mut self) -> SimulationReport {
        while self.step() {}

        assert!(
            self.state.all_channels_free(),
            "drained queue left {} channels in use",
            self.state.total_channels_in_use()
        );

        let report = self.report();
        info!(
            "run finished at {:.2} s: {} blocked, {} dropped, {} completed",
            report.final_time_s, report.blocked_calls, report.dropped_calls, report.completed_calls
        );
        report
    }

    /// Snapshot of the statistics at this moment
    ///
    /// Percentages are normalized over the measured (post-warm-up) calls.
    pub fn report(&self) -> SimulationReport {
        let measured = self.config.measured_calls();

        SimulationReport {
            scheme: self.policy.name().to_string(),
            total_calls: self.config.total_calls,
            warm_up_calls: self.config.warm_up_calls,
            blocked_calls: self.state.blocked_calls(),
            dropped_calls: self.state.dropped_calls(),
            completed_calls: self.state.completed_calls(),
            blocked_rate_percent: self.state.blocked_calls() as f64 / measured as f64 * 100.0,
            dropped_rate_percent: self.state.dropped_calls() as f64 / measured as f64 * 100.0,
            final_time_s: self.state.clock().now(),
        }
    }

    // ========================================================================
    // Event Handlers
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    fn dispatch_initiation(
        &mut self,
        call_id: u64,
        time: f64,
        station: usize,
        speed_kmh: f64,
        duration_s: f64,
        direction: Direction,
        position_m: f64,
    ) {
        let dispatches = self.state.note_initiation_dispatch();

        let pool = self.state.station_mut(station).channels_mut();
        match self.policy.admit_new_call(pool) {
            Some(channel) => {
                self.outcome_log.record(CallOutcome::Admitted {
                    time,
                    call_id,
                    station,
                    channel,
                });

                let leg = TravelLeg {
                    call_id,
                    station,
                    direction,
                    speed_kmh,
                    duration_s,
                    entry: LegEntry::Fresh { position_m },
                    channel,
                };
                self.scheduler.insert(self.motion.next_event(&leg, time));
            }
            None => {
                self.state.record_blocked();
                self.outcome_log.record(CallOutcome::Blocked {
                    time,
                    call_id,
                    station,
                });
                debug!("call {} blocked at station {} (t={:.2})", call_id, station, time);
            }
        }

        // The threshold dispatch itself still lands in the discard: the
        // reset runs after the event is handled, exactly once
        if dispatches == self.config.warm_up_calls {
            self.state.reset_statistics();
            info!(
                "warm-up complete after {} initiations, statistics reset",
                dispatches
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_handover(
        &mut self,
        call_id: u64,
        time: f64,
        station: usize,
        speed_kmh: f64,
        remaining_s: f64,
        direction: Direction,
        channel: ChannelKind,
    ) {
        // Leave the current cell before asking the next one
        self.state.station_mut(station).channels_mut().release(channel);

        let target = self
            .topology
            .neighbor(station, direction)
            .expect("handover fired at a terminal station");

        let pool = self.state.station_mut(target).channels_mut();
        match self.policy.admit_handover(pool) {
            Some(granted) => {
                self.outcome_log.record(CallOutcome::HandedOver {
                    time,
                    call_id,
                    from: station,
                    to: target,
                    channel: granted,
                });

                let leg = TravelLeg {
                    call_id,
                    station: target,
                    direction,
                    speed_kmh,
                    duration_s: remaining_s,
                    entry: LegEntry::Crossing,
                    channel: granted,
                };
                self.scheduler.insert(self.motion.next_event(&leg, time));
            }
            None => {
                self.state.record_dropped();
                self.outcome_log.record(CallOutcome::Dropped {
                    time,
                    call_id,
                    from: station,
                    to: target,
                });
                debug!(
                    "call {} dropped crossing {} -> {} (t={:.2})",
                    call_id, station, target, time
                );
            }
        }
    }

    fn dispatch_termination(&mut self, call_id: u64, time: f64, station: usize, channel: ChannelKind) {
        self.state.station_mut(station).channels_mut().release(channel);
        self.state.record_completed();
        self.outcome_log.record(CallOutcome::Completed {
            time,
            call_id,
            station,
        });
    }
}
