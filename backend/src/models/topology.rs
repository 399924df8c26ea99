//! Linear station topology
//!
//! The coverage area is a straight chain of stations indexed 0..N. All
//! adjacency questions go through [`LinearTopology::neighbor`], which
//! returns `None` past either end of the chain. Handover logic never
//! does its own index arithmetic.

use serde::{Deserialize, Serialize};

/// Travel direction of a car along the station chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Toward station 0 (decreasing indices)
    TowardFirst,
    /// Toward station N-1 (increasing indices)
    TowardLast,
}

/// A straight chain of `num_stations` cells
///
/// # Example
/// ```
/// use cellular_simulator_core_rs::models::topology::{Direction, LinearTopology};
///
/// let topology = LinearTopology::new(20);
/// assert_eq!(topology.neighbor(5, Direction::TowardLast), Some(6));
/// assert_eq!(topology.neighbor(19, Direction::TowardLast), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearTopology {
    num_stations: usize,
}

impl LinearTopology {
    /// Create a chain with the given number of stations
    ///
    /// # Panics
    /// Panics if `num_stations` is zero.
    pub fn new(num_stations: usize) -> Self {
        assert!(num_stations > 0, "topology needs at least one station");
        Self { num_stations }
    }

    /// Number of stations in the chain
    pub fn num_stations(&self) -> usize {
        self.num_stations
    }

    /// True if `station` is a valid index into the chain
    pub fn contains(&self, station: usize) -> bool {
        station < self.num_stations
    }

    /// The adjacent station in the travel direction, if any
    ///
    /// Returns `None` when the move would leave the chain, which is what
    /// forces a call at a terminal station to terminate rather than hand
    /// over.
    ///
    /// # Panics
    /// Panics if `station` is out of bounds.
    pub fn neighbor(&self, station: usize, direction: Direction) -> Option<usize> {
        assert!(self.contains(station), "station {} out of bounds", station);
        match direction {
            Direction::TowardFirst => station.checked_sub(1),
            Direction::TowardLast => {
                if station + 1 < self.num_stations {
                    Some(station + 1)
                } else {
                    None
                }
            }
        }
    }

    /// True when no further handover is possible in this direction
    pub fn is_terminal(&self, station: usize, direction: Direction) -> bool {
        self.neighbor(station, direction).is_none()
    }
}
