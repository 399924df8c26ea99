//! Simulation clock
//!
//! The simulation operates in continuous time (seconds, f64). The clock
//! never ticks on its own: it jumps to the timestamp of each dispatched
//! event, so time advances only through the event queue.

use serde::{Deserialize, Serialize};

/// Monotone simulation clock in seconds
///
/// # Example
/// ```
/// use cellular_simulator_core_rs::SimulationClock;
///
/// let mut clock = SimulationClock::new();
/// assert_eq!(clock.now(), 0.0);
///
/// clock.advance_to(12.5);
/// assert_eq!(clock.now(), 12.5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Seconds elapsed since simulation start
    now: f64,
}

impl SimulationClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self { now: 0.0 }
    }

    /// Recreate a clock at an arbitrary time (snapshot restore)
    ///
    /// # Panics
    /// Panics if `now` is negative or not finite.
    pub fn at(now: f64) -> Self {
        assert!(now.is_finite() && now >= 0.0, "clock time must be finite and non-negative");
        Self { now }
    }

    /// Advance the clock to the given timestamp
    ///
    /// Called exactly once per dispatched event, with that event's
    /// scheduled time. Equal timestamps are allowed (simultaneous
    /// events); going backwards is an internal defect.
    ///
    /// # Panics
    /// Panics if `time` is earlier than the current clock value.
    pub fn advance_to(&mut self, time: f64) {
        assert!(
            time >= self.now,
            "clock must not go backwards: {} < {}",
            time,
            self.now
        );
        self.now = time;
    }

    /// Current simulation time in seconds
    pub fn now(&self) -> f64 {
        self.now
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}
