//! Motion and transition planning
//!
//! Once a call holds a channel, its future is fully determined by
//! kinematics: constant speed, constant direction, fixed coverage length
//! per station. This module computes how long the call stays inside its
//! current station and whether it leaves as a handover or ends as a
//! termination.
//!
//! Position convention: `position_m` is the car's offset in meters from
//! the low-index edge of the station's coverage. A car heading toward
//! station 0 exits after `position_m` meters; a car heading the other way
//! exits after `coverage - position_m` meters. A call that just crossed
//! into a station always traverses the full coverage length.

use crate::models::call::CallEvent;
use crate::models::station::ChannelKind;
use crate::models::topology::{Direction, LinearTopology};

/// Convert a speed from km/h to m/s
pub fn kmh_to_ms(speed_kmh: f64) -> f64 {
    speed_kmh * 1000.0 / 3600.0
}

/// How a call entered its current station
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegEntry {
    /// Call started here; the car is somewhere inside the coverage
    Fresh { position_m: f64 },
    /// Call crossed in from the adjacent station at the boundary
    Crossing,
}

/// One admitted stretch of a call: the car at a station, holding a channel
#[derive(Debug, Clone, PartialEq)]
pub struct TravelLeg {
    pub call_id: u64,
    /// Station the call currently occupies
    pub station: usize,
    pub direction: Direction,
    pub speed_kmh: f64,
    /// Call time left to serve, in seconds
    pub duration_s: f64,
    pub entry: LegEntry,
    /// Kind of the channel the call holds at `station`
    pub channel: ChannelKind,
}

/// Plans each call's next event from its motion parameters
///
/// # Example
/// ```
/// use cellular_simulator_core_rs::models::station::ChannelKind;
/// use cellular_simulator_core_rs::models::topology::{Direction, LinearTopology};
/// use cellular_simulator_core_rs::motion::{LegEntry, MotionCalculator, TravelLeg};
///
/// let motion = MotionCalculator::new(2000.0, LinearTopology::new(20));
/// let leg = TravelLeg {
///     call_id: 1,
///     station: 5,
///     direction: Direction::TowardLast,
///     speed_kmh: 72.0,
///     duration_s: 100.0,
///     entry: LegEntry::Fresh { position_m: 1000.0 },
///     channel: ChannelKind::Ordinary,
/// };
///
/// // 72 km/h = 20 m/s, 1000 m to the boundary: crossing after 50 s
/// let next = motion.next_event(&leg, 0.0);
/// assert_eq!(next.event_type(), "Handover");
/// assert_eq!(next.time(), 50.0);
/// ```
#[derive(Debug, Clone)]
pub struct MotionCalculator {
    /// Coverage length of one station, in meters
    coverage_m: f64,
    topology: LinearTopology,
}

impl MotionCalculator {
    /// Create a calculator for the given coverage length and chain
    ///
    /// # Panics
    /// Panics if the coverage length is not positive and finite.
    pub fn new(coverage_m: f64, topology: LinearTopology) -> Self {
        assert!(
            coverage_m.is_finite() && coverage_m > 0.0,
            "coverage length must be positive"
        );
        Self {
            coverage_m,
            topology,
        }
    }

    /// Coverage length of one station, in meters
    pub fn coverage_m(&self) -> f64 {
        self.coverage_m
    }

    /// Distance in meters from the car to the boundary it is heading for
    pub fn remaining_distance(&self, entry: LegEntry, direction: Direction) -> f64 {
        match entry {
            LegEntry::Fresh { position_m } => {
                assert!(
                    (0.0..=self.coverage_m).contains(&position_m),
                    "position {} outside coverage [0, {}]",
                    position_m,
                    self.coverage_m
                );
                match direction {
                    Direction::TowardFirst => position_m,
                    Direction::TowardLast => self.coverage_m - position_m,
                }
            }
            LegEntry::Crossing => self.coverage_m,
        }
    }

    /// The next event for an admitted call, scheduled relative to `now`
    ///
    /// The call stays in its station for `min(transit time, remaining
    /// duration)`. If the call outlives the transit AND the chain
    /// continues in its direction, it leaves as a Handover bound to the
    /// station being left (the target is resolved at dispatch). In every
    /// other case it ends here as a Termination. A call at a terminal
    /// station heading outward is forced to terminate no matter how much
    /// duration remains.
    ///
    /// # Panics
    /// Panics if speed or duration are not positive and finite.
    pub fn next_event(&self, leg: &TravelLeg, now: f64) -> CallEvent {
        assert!(
            leg.speed_kmh.is_finite() && leg.speed_kmh > 0.0,
            "speed must be positive"
        );
        assert!(
            leg.duration_s.is_finite() && leg.duration_s > 0.0,
            "duration must be positive"
        );

        let distance_m = self.remaining_distance(leg.entry, leg.direction);
        let transit_s = distance_m / kmh_to_ms(leg.speed_kmh);
        let time_in_station = transit_s.min(leg.duration_s);

        let outlives_station = leg.duration_s > time_in_station;
        let can_continue = !self.topology.is_terminal(leg.station, leg.direction);

        if outlives_station && can_continue {
            CallEvent::Handover {
                call_id: leg.call_id,
                time: now + time_in_station,
                station: leg.station,
                speed_kmh: leg.speed_kmh,
                remaining_s: leg.duration_s - time_in_station,
                direction: leg.direction,
                channel: leg.channel,
            }
        } else {
            CallEvent::Termination {
                call_id: leg.call_id,
                time: now + time_in_station,
                station: leg.station,
                channel: leg.channel,
            }
        }
    }
}
