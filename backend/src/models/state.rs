//! Simulation State
//!
//! Represents the complete mutable state of a simulation run: the station
//! chain, the clock, and the outcome counters.
//!
//! # Critical Invariants
//!
//! 1. **Channel Conservation**: per station, `free + in_use == total` for
//!    the ordinary and reserved sub-pools independently
//! 2. **Clock Monotonicity**: the clock only moves forward, and only when
//!    an event is dispatched
//! 3. **Warm-up Reset**: blocked/dropped counters are zeroed exactly once,
//!    at the configured initiation-dispatch threshold

use crate::core::clock::SimulationClock;
use crate::models::station::BaseStation;

/// Complete simulation state
///
/// This struct holds all state for a running call-traffic simulation:
/// - The linear chain of base stations and their channel pools
/// - The simulation clock
/// - Blocked/dropped/completed counters and the warm-up dispatch count
///
/// # Example
///
/// ```rust
/// use cellular_simulator_core_rs::SimulationState;
///
/// let state = SimulationState::new(20, 10, 0);
/// assert_eq!(state.num_stations(), 20);
/// assert_eq!(state.blocked_calls(), 0);
/// assert!(state.all_channels_free());
/// ```
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Station chain, indexed by position along the line
    stations: Vec<BaseStation>,

    /// Simulation clock, advanced once per dispatched event
    clock: SimulationClock,

    /// New calls rejected for lack of a free channel
    blocked_calls: u64,

    /// Active calls that lost service at a handover
    dropped_calls: u64,

    /// Calls that ran to normal completion
    ///
    /// Diagnostic only; it is deliberately not zeroed by the warm-up
    /// reset and feeds no reported percentage.
    completed_calls: u64,

    /// Initiation events dispatched so far (admitted or blocked alike)
    ///
    /// Drives the warm-up reset. Counts dispatches, not admissions.
    initiation_dispatches: u64,
}

impl SimulationState {
    /// Create a fresh state with all channels free and the clock at zero
    ///
    /// # Arguments
    ///
    /// * `num_stations` - Length of the station chain
    /// * `ordinary_channels` - Ordinary channel budget per station
    /// * `reserved_channels` - Reserved channel budget per station (0 under plain FCA)
    pub fn new(num_stations: usize, ordinary_channels: usize, reserved_channels: usize) -> Self {
        assert!(num_stations > 0, "need at least one station");

        let stations = (0..num_stations)
            .map(|id| BaseStation::new(id, ordinary_channels, reserved_channels))
            .collect();

        Self {
            stations,
            clock: SimulationClock::new(),
            blocked_calls: 0,
            dropped_calls: 0,
            completed_calls: 0,
            initiation_dispatches: 0,
        }
    }

    /// Reassemble a state from snapshot parts
    ///
    /// # Panics
    /// Panics if `stations` is empty.
    pub fn from_parts(
        stations: Vec<BaseStation>,
        clock: SimulationClock,
        blocked_calls: u64,
        dropped_calls: u64,
        completed_calls: u64,
        initiation_dispatches: u64,
    ) -> Self {
        assert!(!stations.is_empty(), "need at least one station");
        Self {
            stations,
            clock,
            blocked_calls,
            dropped_calls,
            completed_calls,
            initiation_dispatches,
        }
    }

    /// Get reference to a station by index
    ///
    /// # Panics
    /// Panics if the index is out of bounds; callers validate station
    /// indices at admission, so this is an internal defect.
    pub fn station(&self, id: usize) -> &BaseStation {
        assert!(id < self.stations.len(), "station {} out of bounds", id);
        &self.stations[id]
    }

    /// Get mutable reference to a station by index
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn station_mut(&mut self, id: usize) -> &mut BaseStation {
        assert!(id < self.stations.len(), "station {} out of bounds", id);
        &mut self.stations[id]
    }

    /// All stations in chain order
    pub fn stations(&self) -> &[BaseStation] {
        &self.stations
    }

    /// Number of stations in the chain
    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    /// Read access to the clock
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Advance the clock to a dispatched event's time
    pub fn advance_clock_to(&mut self, time: f64) {
        self.clock.advance_to(time);
    }

    /// Count one blocked call
    pub fn record_blocked(&mut self) {
        self.blocked_calls += 1;
    }

    /// Count one dropped call
    pub fn record_dropped(&mut self) {
        self.dropped_calls += 1;
    }

    /// Count one completed call
    pub fn record_completed(&mut self) {
        self.completed_calls += 1;
    }

    /// Count one Initiation dispatch and return the new total
    pub fn note_initiation_dispatch(&mut self) -> u64 {
        self.initiation_dispatches += 1;
        self.initiation_dispatches
    }

    /// Discard warm-up statistics
    ///
    /// Zeroes the blocked and dropped counters only. Channels held by
    /// in-flight calls stay held; the completed-call diagnostic keeps
    /// counting across the reset.
    pub fn reset_statistics(&mut self) {
        self.blocked_calls = 0;
        self.dropped_calls = 0;
    }

    /// Blocked-call count
    pub fn blocked_calls(&self) -> u64 {
        self.blocked_calls
    }

    /// Dropped-call count
    pub fn dropped_calls(&self) -> u64 {
        self.dropped_calls
    }

    /// Completed-call count (whole run)
    pub fn completed_calls(&self) -> u64 {
        self.completed_calls
    }

    /// Initiation dispatches so far
    pub fn initiation_dispatches(&self) -> u64 {
        self.initiation_dispatches
    }

    /// Total channels currently held across all stations (for invariant checking)
    pub fn total_channels_in_use(&self) -> usize {
        self.stations.iter().map(|s| s.channels().in_use()).sum()
    }

    /// True when every channel of every station is free
    pub fn all_channels_free(&self) -> bool {
        self.stations.iter().all(|s| s.channels().is_fully_idle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = SimulationState::new(20, 9, 1);

        assert_eq!(state.num_stations(), 20);
        assert_eq!(state.clock().now(), 0.0);
        assert_eq!(state.blocked_calls(), 0);
        assert_eq!(state.dropped_calls(), 0);
        assert_eq!(state.initiation_dispatches(), 0);
        assert!(state.all_channels_free());
        assert_eq!(state.total_channels_in_use(), 0);
    }

    #[test]
    fn test_station_ids_match_positions() {
        let state = SimulationState::new(5, 10, 0);
        for (idx, station) in state.stations().iter().enumerate() {
            assert_eq!(station.id(), idx);
        }
    }

    #[test]
    fn test_counters_accumulate() {
        let mut state = SimulationState::new(3, 10, 0);

        state.record_blocked();
        state.record_blocked();
        state.record_dropped();
        state.record_completed();

        assert_eq!(state.blocked_calls(), 2);
        assert_eq!(state.dropped_calls(), 1);
        assert_eq!(state.completed_calls(), 1);
    }

    #[test]
    fn test_reset_statistics_keeps_completed_and_occupancy() {
        let mut state = SimulationState::new(3, 10, 0);

        state.station_mut(1).channels_mut().acquire().unwrap();
        state.record_blocked();
        state.record_dropped();
        state.record_completed();

        state.reset_statistics();

        assert_eq!(state.blocked_calls(), 0);
        assert_eq!(state.dropped_calls(), 0);
        assert_eq!(state.completed_calls(), 1, "completed diagnostic survives the reset");
        assert_eq!(
            state.total_channels_in_use(),
            1,
            "reset must not free held channels"
        );
    }

    #[test]
    fn test_note_initiation_dispatch_counts_up() {
        let mut state = SimulationState::new(3, 10, 0);
        assert_eq!(state.note_initiation_dispatch(), 1);
        assert_eq!(state.note_initiation_dispatch(), 2);
        assert_eq!(state.initiation_dispatches(), 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_station_out_of_bounds_panics() {
        let state = SimulationState::new(3, 10, 0);
        state.station(3);
    }
}
