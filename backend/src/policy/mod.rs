//! Channel Allocation Policy Module
//!
//! This module defines the policy interface for channel admission decisions.
//!
//! # Overview
//!
//! Every station splits its fixed channel budget according to the active
//! policy, and every admission question goes through the policy:
//! - a **new call** asks for a channel at its originating station
//! - a **handover** asks for a channel at the station it is crossing into
//!
//! The two stock policies differ only in what handovers may touch:
//! 1. **FullAccess**: plain FCA, every channel is ordinary, handovers and
//!    new calls compete for the same pool
//! 2. **ReservedHandover**: part of the budget is reserved; new calls see
//!    only the ordinary pool, handovers fall back to the reserved pool
//!    when the ordinary pool is exhausted
//!
//! Policies are stateless over the run; they never remember calls. All
//! occupancy lives in the per-station [`ChannelPool`].
//!
//! # Example
//!
//! ```
//! use cellular_simulator_core_rs::models::station::ChannelPool;
//! use cellular_simulator_core_rs::policy::{ChannelPolicy, ReservedHandoverPolicy};
//!
//! let policy = ReservedHandoverPolicy::new(1);
//! let (ordinary, reserved) = policy.pool_layout(10);
//! assert_eq!((ordinary, reserved), (9, 1));
//!
//! let mut pool = ChannelPool::new(ordinary, reserved);
//! assert!(policy.admit_new_call(&mut pool).is_some());
//! ```

use crate::models::station::{ChannelKind, ChannelPool};

/// Channel admission policy
///
/// Implementations decide how a station's budget is split at construction
/// and which sub-pools each admission class may draw from.
pub trait ChannelPolicy: std::fmt::Debug + Send + Sync {
    /// Split a per-station budget into (ordinary, reserved) channel counts
    fn pool_layout(&self, channels_per_station: usize) -> (usize, usize);

    /// Try to admit a brand-new call
    ///
    /// Returns the kind of the granted channel, or `None` if the call
    /// must be blocked. Never grants a reserved channel.
    fn admit_new_call(&self, pool: &mut ChannelPool) -> Option<ChannelKind>;

    /// Try to admit a handover continuation
    ///
    /// Returns the kind of the granted channel, or `None` if the call
    /// must be dropped.
    fn admit_handover(&self, pool: &mut ChannelPool) -> Option<ChannelKind>;

    /// Short policy name for logs and reports
    fn name(&self) -> &'static str;
}

/// Plain FCA: the whole budget is one ordinary pool
#[derive(Debug, Clone, Copy, Default)]
pub struct FullAccessPolicy;

impl FullAccessPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl ChannelPolicy for FullAccessPolicy {
    fn pool_layout(&self, channels_per_station: usize) -> (usize, usize) {
        (channels_per_station, 0)
    }

    fn admit_new_call(&self, pool: &mut ChannelPool) -> Option<ChannelKind> {
        pool.acquire()
    }

    fn admit_handover(&self, pool: &mut ChannelPool) -> Option<ChannelKind> {
        pool.acquire()
    }

    fn name(&self) -> &'static str {
        "full_access"
    }
}

/// FCA with a handover-only reserve carved out of each station's budget
#[derive(Debug, Clone, Copy)]
pub struct ReservedHandoverPolicy {
    reserved_channels: usize,
}

impl ReservedHandoverPolicy {
    /// # Panics
    /// Panics if `reserved_channels` is zero; use [`FullAccessPolicy`]
    /// for an empty reserve.
    pub fn new(reserved_channels: usize) -> Self {
        assert!(reserved_channels > 0, "reserve must not be empty");
        Self { reserved_channels }
    }

    /// Size of the per-station reserve
    pub fn reserved_channels(&self) -> usize {
        self.reserved_channels
    }
}

impl ChannelPolicy for ReservedHandoverPolicy {
    fn pool_layout(&self, channels_per_station: usize) -> (usize, usize) {
        assert!(
            self.reserved_channels < channels_per_station,
            "reserve {} leaves no ordinary channels out of {}",
            self.reserved_channels,
            channels_per_station
        );
        (
            channels_per_station - self.reserved_channels,
            self.reserved_channels,
        )
    }

    fn admit_new_call(&self, pool: &mut ChannelPool) -> Option<ChannelKind> {
        pool.acquire()
    }

    fn admit_handover(&self, pool: &mut ChannelPool) -> Option<ChannelKind> {
        // Ordinary first; the reserve is a fallback, not a fast lane
        pool.acquire().or_else(|| pool.acquire_reserved())
    }

    fn name(&self) -> &'static str {
        "reserved_handover"
    }
}
