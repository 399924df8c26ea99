//! Call events
//!
//! A call's life is a chain of scheduled events: one Initiation, zero or
//! more Handovers, and a final Termination (unless the call is blocked or
//! dropped first, in which case the chain just stops). Every variant
//! carries the absolute simulation time at which it fires and the station
//! it fires at.
//!
//! A Handover is scheduled against the station the car is *leaving*; the
//! dispatch logic resolves the target station at fire time. Handover and
//! Termination also remember which channel kind the call holds, so release
//! restores the correct sub-pool.
//!
//! # Example
//!
//! ```rust
//! use cellular_simulator_core_rs::models::call::CallEvent;
//! use cellular_simulator_core_rs::models::station::ChannelKind;
//! use cellular_simulator_core_rs::models::topology::Direction;
//!
//! let event = CallEvent::Initiation {
//!     call_id: 42,
//!     time: 17.25,
//!     station: 4,
//!     speed_kmh: 120.0,
//!     duration_s: 95.0,
//!     direction: Direction::TowardLast,
//!     position_m: 310.0,
//! };
//!
//! assert_eq!(event.time(), 17.25);
//! assert_eq!(event.event_type(), "Initiation");
//! ```

use serde::{Deserialize, Serialize};

use crate::models::station::ChannelKind;
use crate::models::topology::Direction;

/// A scheduled simulation event for one call.
///
/// Times are absolute seconds on the simulation clock. Station indices
/// are 0-based positions along the linear chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CallEvent {
    /// A new call appears at a station and asks for a channel
    Initiation {
        call_id: u64,
        time: f64,
        station: usize,
        speed_kmh: f64,
        /// Total requested call duration in seconds
        duration_s: f64,
        direction: Direction,
        /// Car position in meters from the low-index edge of the
        /// station's coverage
        position_m: f64,
    },

    /// An active call reaches the coverage boundary of its station
    ///
    /// `station` is the cell being left. The handler resolves the
    /// adjacent target cell at dispatch time.
    Handover {
        call_id: u64,
        time: f64,
        station: usize,
        speed_kmh: f64,
        /// Call time still to serve after the crossing, in seconds
        remaining_s: f64,
        direction: Direction,
        /// Kind of the channel currently held at `station`
        channel: ChannelKind,
    },

    /// An active call ends inside its current station
    Termination {
        call_id: u64,
        time: f64,
        station: usize,
        /// Kind of the channel currently held at `station`
        channel: ChannelKind,
    },
}

impl CallEvent {
    /// Absolute time at which this event fires
    pub fn time(&self) -> f64 {
        match self {
            CallEvent::Initiation { time, .. } => *time,
            CallEvent::Handover { time, .. } => *time,
            CallEvent::Termination { time, .. } => *time,
        }
    }

    /// The call this event belongs to
    pub fn call_id(&self) -> u64 {
        match self {
            CallEvent::Initiation { call_id, .. } => *call_id,
            CallEvent::Handover { call_id, .. } => *call_id,
            CallEvent::Termination { call_id, .. } => *call_id,
        }
    }

    /// Station the event is bound to (for a Handover, the station being left)
    pub fn station(&self) -> usize {
        match self {
            CallEvent::Initiation { station, .. } => *station,
            CallEvent::Handover { station, .. } => *station,
            CallEvent::Termination { station, .. } => *station,
        }
    }

    /// Short name of the event variant
    pub fn event_type(&self) -> &'static str {
        match self {
            CallEvent::Initiation { .. } => "Initiation",
            CallEvent::Handover { .. } => "Handover",
            CallEvent::Termination { .. } => "Termination",
        }
    }

    /// Channel kind the call holds going into this event, if any
    ///
    /// An Initiation holds nothing yet.
    pub fn held_channel(&self) -> Option<ChannelKind> {
        match self {
            CallEvent::Initiation { .. } => None,
            CallEvent::Handover { channel, .. } => Some(*channel),
            CallEvent::Termination { channel, .. } => Some(*channel),
        }
    }
}
