//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of complete run state for
//! pause/resume functionality.
//!
//! # Critical Invariants
//!
//! - **Determinism**: restoring a snapshot and draining the queue gives
//!   the same counters as the uninterrupted run
//! - **Channel Conservation**: every held channel is owed to exactly one
//!   pending event, per station and per kind
//! - **Config Matching**: a snapshot can only be loaded with the config
//!   that produced it

use crate::models::call::CallEvent;
use crate::models::state::SimulationState;
use crate::models::station::{BaseStation, ChannelKind, ChannelPool};
use crate::orchestrator::engine::{build_policy, Simulation, SimulationConfig, SimulationError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete run state snapshot
///
/// Captures everything needed to resume a run from an arbitrary point
/// between two event dispatches. The outcome log is not part of it; a
/// resumed run logs outcomes from the restore point onward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Clock value at the time of the snapshot, seconds
    pub clock_s: f64,

    /// Blocked counter (subject to the warm-up discard)
    pub blocked_calls: u64,

    /// Dropped counter (subject to the warm-up discard)
    pub dropped_calls: u64,

    /// Completed counter (whole-run diagnostic)
    pub completed_calls: u64,

    /// Initiation dispatches so far, drives the warm-up threshold
    pub initiation_dispatches: u64,

    /// RNG state at the time of the snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// Per-station channel occupancy
    pub stations: Vec<StationSnapshot>,

    /// Undispatched events in dispatch order
    pub pending_events: Vec<CallEvent>,

    /// SHA256 hash of the producing config (for validation)
    pub config_hash: String,
}

/// Station occupancy snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub id: usize,
    pub ordinary_total: usize,
    pub ordinary_free: usize,
    pub reserved_total: usize,
    pub reserved_free: usize,
}

impl From<&BaseStation> for StationSnapshot {
    fn from(station: &BaseStation) -> Self {
        let pool = station.channels();
        StationSnapshot {
            id: station.id(),
            ordinary_total: pool.ordinary_total(),
            ordinary_free: pool.ordinary_free(),
            reserved_total: pool.reserved_total(),
            reserved_free: pool.reserved_free(),
        }
    }
}

impl From<&StationSnapshot> for BaseStation {
    fn from(snapshot: &StationSnapshot) -> Self {
        BaseStation::from_parts(
            snapshot.id,
            ChannelPool::with_occupancy(
                snapshot.ordinary_total,
                snapshot.ordinary_free,
                snapshot.reserved_total,
                snapshot.reserved_free,
            ),
        )
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Restoring checks this hash against the offered config, which keeps a
/// snapshot from resuming under a different geometry or scheme.
///
/// Uses canonical JSON serialization with sorted keys so the hash does
/// not depend on map iteration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("config serialization failed: {}", e))
    })?;

    // Sort every object's keys, recursively
    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate snapshot integrity against a config
///
/// Checks critical invariants before any state is rebuilt:
/// - Station count and pool layout match the config's scheme
/// - Free counts never exceed totals
/// - Channel conservation: held channels match pending holders one to
///   one, per station and per kind
/// - No pending event lies in the snapshot's past
pub fn validate_snapshot(
    snapshot: &StateSnapshot,
    config: &SimulationConfig,
) -> Result<(), SimulationError> {
    // 1. Geometry and layout
    if snapshot.stations.len() != config.num_stations {
        return Err(SimulationError::StateValidationError(format!(
            "snapshot has {} stations, config expects {}",
            snapshot.stations.len(),
            config.num_stations
        )));
    }

    let (ordinary, reserved) =
        build_policy(&config.scheme).pool_layout(config.channels_per_station);

    for station in &snapshot.stations {
        if station.ordinary_total != ordinary || station.reserved_total != reserved {
            return Err(SimulationError::StateValidationError(format!(
                "station {} has layout {}+{}, scheme expects {}+{}",
                station.id, station.ordinary_total, station.reserved_total, ordinary, reserved
            )));
        }

        if station.ordinary_free > station.ordinary_total
            || station.reserved_free > station.reserved_total
        {
            return Err(SimulationError::StateValidationError(format!(
                "station {} has more free channels than its budget",
                station.id
            )));
        }
    }

    // 2. Clock sanity
    if !(snapshot.clock_s.is_finite() && snapshot.clock_s >= 0.0) {
        return Err(SimulationError::StateValidationError(format!(
            "snapshot clock is invalid: {}",
            snapshot.clock_s
        )));
    }

    // 3. Channel conservation: each pending Handover or Termination holds
    // exactly one channel at its station, of the kind it carries
    let mut held = vec![(0usize, 0usize); snapshot.stations.len()];
    for event in &snapshot.pending_events {
        if let Some(kind) = event.held_channel() {
            let station = event.station();
            if station >= held.len() {
                return Err(SimulationError::StateValidationError(format!(
                    "pending event for call {} references station {} out of {}",
                    event.call_id(),
                    station,
                    held.len()
                )));
            }
            match kind {
                ChannelKind::Ordinary => held[station].0 += 1,
                ChannelKind::Reserved => held[station].1 += 1,
            }
        }

        if event.time() < snapshot.clock_s {
            return Err(SimulationError::StateValidationError(format!(
                "pending event for call {} at {:.3} s lies before the clock at {:.3} s",
                event.call_id(),
                event.time(),
                snapshot.clock_s
            )));
        }
    }

    for (station, &(ordinary_held, reserved_held)) in snapshot.stations.iter().zip(held.iter()) {
        let ordinary_in_use = station.ordinary_total - station.ordinary_free;
        let reserved_in_use = station.reserved_total - station.reserved_free;
        if ordinary_in_use != ordinary_held || reserved_in_use != reserved_held {
            return Err(SimulationError::StateValidationError(format!(
                "station {} holds {}+{} channels but {}+{} pending events own one there",
                station.id, ordinary_in_use, reserved_in_use, ordinary_held, reserved_held
            )));
        }
    }

    // 4. Counter sanity
    if snapshot.initiation_dispatches > config.total_calls {
        return Err(SimulationError::StateValidationError(format!(
            "snapshot counts {} initiation dispatches, config admits only {}",
            snapshot.initiation_dispatches, config.total_calls
        )));
    }

    Ok(())
}

// ============================================================================
// Simulation Save/Load
// ============================================================================

impl Simulation {
    /// Capture the complete run state between two dispatches
    pub fn snapshot(&self) -> Result<StateSnapshot, SimulationError> {
        let state = self.state();

        Ok(StateSnapshot {
            clock_s: state.clock().now(),
            blocked_calls: state.blocked_calls(),
            dropped_calls: state.dropped_calls(),
            completed_calls: state.completed_calls(),
            initiation_dispatches: state.initiation_dispatches(),
            rng_state: self.rng_state(),
            stations: state.stations().iter().map(StationSnapshot::from).collect(),
            pending_events: self.pending_in_order(),
            config_hash: compute_config_hash(self.config())?,
        })
    }

    /// Resume a run from a snapshot
    ///
    /// The config must hash to the snapshot's recorded hash and the
    /// snapshot must pass every integrity check; nothing is rebuilt
    /// until both hold.
    pub fn restore(
        config: SimulationConfig,
        snapshot: &StateSnapshot,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let current_hash = compute_config_hash(&config)?;
        if current_hash != snapshot.config_hash {
            return Err(SimulationError::ConfigHashMismatch {
                snapshot: snapshot.config_hash.clone(),
                current: current_hash,
            });
        }

        validate_snapshot(snapshot, &config)?;

        let stations: Vec<BaseStation> = snapshot.stations.iter().map(BaseStation::from).collect();
        let state = SimulationState::from_parts(
            stations,
            crate::core::SimulationClock::at(snapshot.clock_s),
            snapshot.blocked_calls,
            snapshot.dropped_calls,
            snapshot.completed_calls,
            snapshot.initiation_dispatches,
        );

        Ok(Simulation::from_restored(
            config,
            state,
            snapshot.pending_events.clone(),
            snapshot.rng_state,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::engine::SchemeConfig;

    #[test]
    fn test_compute_config_hash_deterministic() {
        let config1 = SimulationConfig::default();
        let config2 = SimulationConfig::default();

        let hash1 = compute_config_hash(&config1).unwrap();
        let hash2 = compute_config_hash(&config2).unwrap();

        assert_eq!(hash1, hash2, "same config should produce the same hash");
    }

    #[test]
    fn test_compute_config_hash_differs_across_configs() {
        let config1 = SimulationConfig::default();
        let config2 = SimulationConfig {
            scheme: SchemeConfig::ReservedHandover { reserved_channels: 1 },
            ..SimulationConfig::default()
        };

        let hash1 = compute_config_hash(&config1).unwrap();
        let hash2 = compute_config_hash(&config2).unwrap();

        assert_ne!(
            hash1, hash2,
            "different configs should produce different hashes"
        );
    }

    #[test]
    fn test_validate_snapshot_rejects_leaked_channel() {
        let config = SimulationConfig::default();
        let (ordinary, reserved) =
            build_policy(&config.scheme).pool_layout(config.channels_per_station);

        // One channel in use at station 3 but no pending event owns it
        let mut stations: Vec<StationSnapshot> = (0..config.num_stations)
            .map(|id| StationSnapshot {
                id,
                ordinary_total: ordinary,
                ordinary_free: ordinary,
                reserved_total: reserved,
                reserved_free: reserved,
            })
            .collect();
        stations[3].ordinary_free -= 1;

        let snapshot = StateSnapshot {
            clock_s: 10.0,
            blocked_calls: 0,
            dropped_calls: 0,
            completed_calls: 0,
            initiation_dispatches: 5,
            rng_state: 99,
            stations,
            pending_events: vec![],
            config_hash: compute_config_hash(&config).unwrap(),
        };

        let err = validate_snapshot(&snapshot, &config).unwrap_err();
        assert!(matches!(err, SimulationError::StateValidationError(_)));
    }

    #[test]
    fn test_validate_snapshot_rejects_station_count_mismatch() {
        let config = SimulationConfig::default();

        let snapshot = StateSnapshot {
            clock_s: 0.0,
            blocked_calls: 0,
            dropped_calls: 0,
            completed_calls: 0,
            initiation_dispatches: 0,
            rng_state: 1,
            stations: vec![],
            pending_events: vec![],
            config_hash: compute_config_hash(&config).unwrap(),
        };

        assert!(validate_snapshot(&snapshot, &config).is_err());
    }

    #[test]
    fn test_restore_rejects_foreign_config() {
        let config = SimulationConfig::default();

        let snapshot = StateSnapshot {
            clock_s: 0.0,
            blocked_calls: 0,
            dropped_calls: 0,
            completed_calls: 0,
            initiation_dispatches: 0,
            rng_state: 1,
            stations: vec![],
            pending_events: vec![],
            config_hash: "not-the-right-hash".to_string(),
        };

        let err = Simulation::restore(config, &snapshot).unwrap_err();
        assert!(matches!(err, SimulationError::ConfigHashMismatch { .. }));
    }
}
