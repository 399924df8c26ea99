//! Base station model
//!
//! A base station is one cell in the linear coverage chain. Each station
//! owns a fixed channel budget split into an ordinary pool and an optional
//! reserved pool. Reserved channels exist to privilege handovers: a call
//! already in progress may fall back to them, a brand-new call may not.
//!
//! CRITICAL: pool counters are the only mutable state here, and every
//! mutation preserves `free <= total` per sub-pool.

use serde::{Deserialize, Serialize};

/// Which sub-pool a held channel was drawn from
///
/// Carried by the call for its whole occupancy so that release always
/// restores the same sub-pool that satisfied the acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Regular channel, available to new calls and handovers alike
    Ordinary,
    /// Handover-only channel, never granted to a new call
    Reserved,
}

/// Fixed-capacity channel pool with an ordinary and a reserved sub-pool
///
/// # Example
/// ```
/// use cellular_simulator_core_rs::models::station::{ChannelKind, ChannelPool};
///
/// let mut pool = ChannelPool::new(9, 1);
/// let kind = pool.acquire().unwrap();
/// assert_eq!(kind, ChannelKind::Ordinary);
/// assert_eq!(pool.ordinary_free(), 8);
///
/// pool.release(kind);
/// assert_eq!(pool.ordinary_free(), 9);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPool {
    /// Ordinary channel budget (fixed for the run)
    ordinary_total: usize,
    /// Ordinary channels currently free
    ordinary_free: usize,
    /// Reserved channel budget (fixed for the run, 0 under plain FCA)
    reserved_total: usize,
    /// Reserved channels currently free
    reserved_free: usize,
}

impl ChannelPool {
    /// Create a pool with all channels free
    pub fn new(ordinary_total: usize, reserved_total: usize) -> Self {
        assert!(
            ordinary_total > 0,
            "a station needs at least one ordinary channel"
        );
        Self {
            ordinary_total,
            ordinary_free: ordinary_total,
            reserved_total,
            reserved_free: reserved_total,
        }
    }

    /// Recreate a pool at a given occupancy (snapshot restore)
    ///
    /// # Panics
    /// Panics if either free count exceeds its total.
    pub fn with_occupancy(
        ordinary_total: usize,
        ordinary_free: usize,
        reserved_total: usize,
        reserved_free: usize,
    ) -> Self {
        assert!(ordinary_free <= ordinary_total, "ordinary free exceeds total");
        assert!(reserved_free <= reserved_total, "reserved free exceeds total");
        Self {
            ordinary_total,
            ordinary_free,
            reserved_total,
            reserved_free,
        }
    }

    /// Try to acquire an ordinary channel
    ///
    /// Succeeds iff at least one ordinary channel is free. On failure the
    /// pool is untouched.
    pub fn acquire(&mut self) -> Option<ChannelKind> {
        if self.ordinary_free > 0 {
            self.ordinary_free -= 1;
            Some(ChannelKind::Ordinary)
        } else {
            None
        }
    }

    /// Try to acquire a reserved channel
    ///
    /// Only meaningful after `acquire` has failed; callers enforce the
    /// handover-only rule. On failure the pool is untouched.
    pub fn acquire_reserved(&mut self) -> Option<ChannelKind> {
        if self.reserved_free > 0 {
            self.reserved_free -= 1;
            Some(ChannelKind::Reserved)
        } else {
            None
        }
    }

    /// Return a held channel to the sub-pool it came from
    ///
    /// # Panics
    /// Panics if that sub-pool is already full. A double release is an
    /// internal defect, not a recoverable condition.
    pub fn release(&mut self, kind: ChannelKind) {
        match kind {
            ChannelKind::Ordinary => {
                assert!(
                    self.ordinary_free < self.ordinary_total,
                    "ordinary release on a full pool"
                );
                self.ordinary_free += 1;
            }
            ChannelKind::Reserved => {
                assert!(
                    self.reserved_free < self.reserved_total,
                    "reserved release on a full pool"
                );
                self.reserved_free += 1;
            }
        }
    }

    /// Ordinary channels currently free
    pub fn ordinary_free(&self) -> usize {
        self.ordinary_free
    }

    /// Reserved channels currently free
    pub fn reserved_free(&self) -> usize {
        self.reserved_free
    }

    /// Ordinary channel budget
    pub fn ordinary_total(&self) -> usize {
        self.ordinary_total
    }

    /// Reserved channel budget
    pub fn reserved_total(&self) -> usize {
        self.reserved_total
    }

    /// Channels currently held across both sub-pools
    pub fn in_use(&self) -> usize {
        (self.ordinary_total - self.ordinary_free) + (self.reserved_total - self.reserved_free)
    }

    /// True when every channel of both sub-pools is free
    pub fn is_fully_idle(&self) -> bool {
        self.ordinary_free == self.ordinary_total && self.reserved_free == self.reserved_total
    }
}

/// One cell in the linear station chain
///
/// Identity is the station's position index along the chain (0-based).
/// Stations are created once at simulation init and live for the whole
/// run; only their pool counters change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStation {
    /// Position index along the chain, 0..num_stations
    id: usize,
    /// This station's channel budget
    channels: ChannelPool,
}

impl BaseStation {
    /// Create a station with the given channel split, all channels free
    pub fn new(id: usize, ordinary_channels: usize, reserved_channels: usize) -> Self {
        Self {
            id,
            channels: ChannelPool::new(ordinary_channels, reserved_channels),
        }
    }

    /// Reassemble a station from snapshot parts
    pub fn from_parts(id: usize, channels: ChannelPool) -> Self {
        Self { id, channels }
    }

    /// Position index along the chain
    pub fn id(&self) -> usize {
        self.id
    }

    /// Read access to the channel pool
    pub fn channels(&self) -> &ChannelPool {
        &self.channels
    }

    /// Mutable access to the channel pool
    pub fn channels_mut(&mut self) -> &mut ChannelPool {
        &mut self.channels
    }
}
