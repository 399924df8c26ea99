//! Call traffic sources.
//!
//! The engine consumes a stream of [`CallRecord`]s and does not care where
//! they come from. Two sources are provided:
//!
//! 1. **StochasticSource**: draws records from configured distributions,
//!    all sampling through the seeded RNG (same seed + same config → same
//!    traffic)
//! 2. **TraceSource**: replays records parsed from a tabular trace, with
//!    direction and starting position randomized per record since traces
//!    do not carry them
//!
//! # Example
//!
//! ```
//! use cellular_simulator_core_rs::rng::RngManager;
//! use cellular_simulator_core_rs::traffic::{CallSource, StochasticSource, TrafficConfig};
//!
//! let mut rng = RngManager::new(42);
//! let mut source = StochasticSource::new(TrafficConfig::default(), 20, 2000.0);
//!
//! let record = source.next_call(&mut rng).unwrap();
//! assert!(record.station < 20);
//! assert!(record.duration_s > 0.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::topology::Direction;
use crate::rng::RngManager;

/// Errors produced while generating, parsing or validating call records
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrafficError {
    #[error("malformed trace record on line {line}: {reason} (got {content:?})")]
    MalformedRecord {
        line: usize,
        reason: String,
        content: String,
    },

    #[error("trace exhausted: only {available} records available")]
    TraceExhausted { available: usize },

    #[error("call {call_id}: station index {station} outside the {num_stations}-station chain")]
    StationOutOfRange {
        call_id: u64,
        station: usize,
        num_stations: usize,
    },

    #[error("call {call_id}: {field} must be positive, got {value}")]
    NonPositive {
        call_id: u64,
        field: &'static str,
        value: f64,
    },

    #[error("call {call_id}: position {position} outside coverage [0, {coverage}]")]
    PositionOutOfCoverage {
        call_id: u64,
        position: f64,
        coverage: f64,
    },

    #[error("invalid traffic config: {0}")]
    InvalidConfig(String),
}

/// One call request, fully resolved and ready for admission
///
/// Station indices are 0-based here; the trace file format is 1-based and
/// converted during parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Stable call identity, carried through all handovers
    pub id: u64,
    /// Absolute arrival time on the simulation clock, seconds
    pub arrival_time_s: f64,
    /// Originating station, 0-based
    pub station: usize,
    /// Car speed in km/h
    pub speed_kmh: f64,
    /// Requested call duration in seconds
    pub duration_s: f64,
    /// Travel direction along the chain
    pub direction: Direction,
    /// Car offset from the low-index coverage edge, meters
    pub position_m: f64,
}

/// Check a record against the run's topology and physical bounds
///
/// Called by the driver before admission; a failure aborts the run with
/// the offending record identified.
pub fn validate_record(
    record: &CallRecord,
    num_stations: usize,
    coverage_m: f64,
) -> Result<(), TrafficError> {
    if record.station >= num_stations {
        return Err(TrafficError::StationOutOfRange {
            call_id: record.id,
            station: record.station,
            num_stations,
        });
    }
    if !(record.speed_kmh.is_finite() && record.speed_kmh > 0.0) {
        return Err(TrafficError::NonPositive {
            call_id: record.id,
            field: "speed",
            value: record.speed_kmh,
        });
    }
    if !(record.duration_s.is_finite() && record.duration_s > 0.0) {
        return Err(TrafficError::NonPositive {
            call_id: record.id,
            field: "duration",
            value: record.duration_s,
        });
    }
    if !(record.arrival_time_s.is_finite() && record.arrival_time_s >= 0.0) {
        return Err(TrafficError::NonPositive {
            call_id: record.id,
            field: "arrival time",
            value: record.arrival_time_s,
        });
    }
    if !(0.0..=coverage_m).contains(&record.position_m) {
        return Err(TrafficError::PositionOutOfCoverage {
            call_id: record.id,
            position: record.position_m,
            coverage: coverage_m,
        });
    }
    Ok(())
}

/// Source of call records consumed by the simulation driver
pub trait CallSource: Send + Sync {
    /// Produce the next call record
    ///
    /// Sources draw any randomness they need from `rng`, which is the
    /// engine's single RNG; nothing else may generate random values.
    fn next_call(&mut self, rng: &mut RngManager) -> Result<CallRecord, TrafficError>;
}

/// Distribution parameters for stochastic traffic
///
/// Defaults reproduce the reference workload: calls arrive every 1.37 s
/// on average, last a little under two minutes, and travel at highway
/// speeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Mean of the exponential inter-arrival gap, seconds
    pub mean_inter_arrival_s: f64,

    /// Hard floor on call duration, seconds
    pub min_duration_s: f64,

    /// Mean of the exponential duration excess above the floor, seconds
    pub mean_extra_duration_s: f64,

    /// Mean car speed, km/h
    pub mean_speed_kmh: f64,

    /// Standard deviation of car speed, km/h
    pub std_dev_speed_kmh: f64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            mean_inter_arrival_s: 1.3698,
            min_duration_s: 10.004,
            mean_extra_duration_s: 99.8312,
            mean_speed_kmh: 120.0722,
            std_dev_speed_kmh: 9.0186,
        }
    }
}

impl TrafficConfig {
    /// Validate distribution parameters
    pub fn validate(&self) -> Result<(), TrafficError> {
        if !(self.mean_inter_arrival_s.is_finite() && self.mean_inter_arrival_s > 0.0) {
            return Err(TrafficError::InvalidConfig(format!(
                "mean inter-arrival must be positive, got {}",
                self.mean_inter_arrival_s
            )));
        }
        if !(self.min_duration_s.is_finite() && self.min_duration_s > 0.0) {
            return Err(TrafficError::InvalidConfig(format!(
                "minimum duration must be positive, got {}",
                self.min_duration_s
            )));
        }
        if !(self.mean_extra_duration_s.is_finite() && self.mean_extra_duration_s > 0.0) {
            return Err(TrafficError::InvalidConfig(format!(
                "mean extra duration must be positive, got {}",
                self.mean_extra_duration_s
            )));
        }
        if !(self.mean_speed_kmh.is_finite() && self.mean_speed_kmh > 0.0) {
            return Err(TrafficError::InvalidConfig(format!(
                "mean speed must be positive, got {}",
                self.mean_speed_kmh
            )));
        }
        if !(self.std_dev_speed_kmh.is_finite() && self.std_dev_speed_kmh >= 0.0) {
            return Err(TrafficError::InvalidConfig(format!(
                "speed standard deviation must be non-negative, got {}",
                self.std_dev_speed_kmh
            )));
        }
        Ok(())
    }
}

/// Generates call records from the configured distributions.
///
/// Per record, in a fixed draw order: inter-arrival gap (exponential),
/// station (uniform), duration (floor + exponential), speed (normal),
/// direction (uniform), position (uniform over the coverage). Arrival
/// times accumulate, so successive records are non-decreasing in time.
pub struct StochasticSource {
    config: TrafficConfig,
    num_stations: usize,
    coverage_m: f64,

    /// Identity for the next generated call, starting at 1
    next_call_id: u64,

    /// Running arrival clock, seconds
    next_arrival_s: f64,
}

impl StochasticSource {
    /// Create a generator for the given chain geometry
    ///
    /// # Panics
    /// Panics if the config is invalid or the geometry is degenerate;
    /// the driver validates configs before construction.
    pub fn new(config: TrafficConfig, num_stations: usize, coverage_m: f64) -> Self {
        assert!(config.validate().is_ok(), "traffic config must be validated");
        assert!(num_stations > 0, "need at least one station");
        assert!(coverage_m > 0.0, "coverage must be positive");

        Self {
            config,
            num_stations,
            coverage_m,
            next_call_id: 1,
            next_arrival_s: 0.0,
        }
    }
}

impl CallSource for StochasticSource {
    fn next_call(&mut self, rng: &mut RngManager) -> Result<CallRecord, TrafficError> {
        self.next_arrival_s += rng.next_exponential(self.config.mean_inter_arrival_s);

        let station = rng.range(0, self.num_stations as i64) as usize;
        let duration_s =
            self.config.min_duration_s + rng.next_exponential(self.config.mean_extra_duration_s);
        // Floor keeps the kinematics valid on the far tail of the normal
        let speed_kmh = rng
            .next_normal(self.config.mean_speed_kmh, self.config.std_dev_speed_kmh)
            .max(1.0);
        let direction = if rng.range(0, 2) == 0 {
            Direction::TowardFirst
        } else {
            Direction::TowardLast
        };
        let position_m = rng.next_f64() * self.coverage_m;

        let id = self.next_call_id;
        self.next_call_id += 1;

        Ok(CallRecord {
            id,
            arrival_time_s: self.next_arrival_s,
            station,
            speed_kmh,
            duration_s,
            direction,
            position_m,
        })
    }
}

/// Row parsed from a call trace, before direction/position randomization
#[derive(Debug, Clone, PartialEq)]
struct TraceRow {
    id: u64,
    arrival_time_s: f64,
    /// 0-based station index (converted from the file's 1-based form)
    station: usize,
    duration_s: f64,
    speed_kmh: f64,
}

/// Replays call records parsed from a tabular trace.
///
/// Expected format: one header line, then one record per line with the
/// fields `id arrivalTime baseStationIndex callDuration carSpeed`,
/// separated by commas and/or whitespace. Station indices in the file
/// are 1-based. Blank lines are skipped. Rows need not be time-sorted;
/// the event queue orders dispatch regardless.
///
/// Traces carry no direction or starting position, so both are
/// randomized per record when the record is handed out.
#[derive(Debug)]
pub struct TraceSource {
    rows: Vec<TraceRow>,
    next_index: usize,
    coverage_m: f64,
}

impl TraceSource {
    /// Parse a trace from its full text contents
    ///
    /// # Example
    ///
    /// ```
    /// use cellular_simulator_core_rs::traffic::TraceSource;
    ///
    /// let trace = "\
    /// id,arrivalTime,baseStation,callDuration,carSpeed
    /// 1,0.8,3,98.2,121.5
    /// 2,2.1,17,45.0,115.9";
    ///
    /// let source = TraceSource::parse(trace, 2000.0).unwrap();
    /// assert_eq!(source.remaining(), 2);
    /// ```
    pub fn parse(contents: &str, coverage_m: f64) -> Result<Self, TrafficError> {
        assert!(coverage_m > 0.0, "coverage must be positive");

        let mut rows = Vec::new();
        // Line 1 is the header
        for (line_no, line) in contents.lines().enumerate().skip(1) {
            let line_no = line_no + 1; // 1-based for error messages
            if line.trim().is_empty() {
                continue;
            }
            rows.push(Self::parse_row(line_no, line)?);
        }

        Ok(Self {
            rows,
            next_index: 0,
            coverage_m,
        })
    }

    /// Records not yet handed out
    pub fn remaining(&self) -> usize {
        self.rows.len() - self.next_index
    }

    /// Total records parsed from the trace
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the trace parsed to zero records
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn parse_row(line_no: usize, line: &str) -> Result<TraceRow, TrafficError> {
        let malformed = |reason: String| TrafficError::MalformedRecord {
            line: line_no,
            reason,
            content: line.to_string(),
        };

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if fields.len() != 5 {
            return Err(malformed(format!("expected 5 fields, found {}", fields.len())));
        }

        let id: u64 = fields[0]
            .parse()
            .map_err(|_| malformed(format!("unparsable call id {:?}", fields[0])))?;
        let arrival_time_s: f64 = fields[1]
            .parse()
            .map_err(|_| malformed(format!("unparsable arrival time {:?}", fields[1])))?;
        let station_one_based: usize = fields[2]
            .parse()
            .map_err(|_| malformed(format!("unparsable station index {:?}", fields[2])))?;
        let duration_s: f64 = fields[3]
            .parse()
            .map_err(|_| malformed(format!("unparsable call duration {:?}", fields[3])))?;
        let speed_kmh: f64 = fields[4]
            .parse()
            .map_err(|_| malformed(format!("unparsable car speed {:?}", fields[4])))?;

        if station_one_based == 0 {
            return Err(malformed("station index is 1-based, got 0".to_string()));
        }

        Ok(TraceRow {
            id,
            arrival_time_s,
            station: station_one_based - 1,
            duration_s,
            speed_kmh,
        })
    }
}

impl CallSource for TraceSource {
    fn next_call(&mut self, rng: &mut RngManager) -> Result<CallRecord, TrafficError> {
        let row = self
            .rows
            .get(self.next_index)
            .ok_or(TrafficError::TraceExhausted {
                available: self.rows.len(),
            })?
            .clone();
        self.next_index += 1;

        // The trace carries neither of these
        let direction = if rng.range(0, 2) == 0 {
            Direction::TowardFirst
        } else {
            Direction::TowardLast
        };
        let position_m = rng.next_f64() * self.coverage_m;

        Ok(CallRecord {
            id: row.id,
            arrival_time_s: row.arrival_time_s,
            station: row.station,
            speed_kmh: row.speed_kmh,
            duration_s: row.duration_s,
            direction,
            position_m,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "\
id,arrivalTime,baseStation,callDuration,carSpeed
1,0.8,3,98.2,121.5
2,2.1,17,45.0,115.9
3,3.0,20,130.4,128.2";

    #[test]
    fn test_stochastic_records_within_bounds() {
        let mut rng = RngManager::new(42);
        let mut source = StochasticSource::new(TrafficConfig::default(), 20, 2000.0);

        let mut last_arrival = 0.0;
        for expected_id in 1..=500u64 {
            let record = source.next_call(&mut rng).unwrap();
            assert_eq!(record.id, expected_id);
            assert!(record.station < 20);
            assert!(record.duration_s >= 10.004);
            assert!(record.speed_kmh > 0.0);
            assert!((0.0..2000.0).contains(&record.position_m));
            assert!(record.arrival_time_s >= last_arrival, "arrivals accumulate");
            last_arrival = record.arrival_time_s;

            validate_record(&record, 20, 2000.0).unwrap();
        }
    }

    #[test]
    fn test_stochastic_deterministic_per_seed() {
        let config = TrafficConfig::default();
        let mut rng1 = RngManager::new(7);
        let mut rng2 = RngManager::new(7);
        let mut source1 = StochasticSource::new(config.clone(), 20, 2000.0);
        let mut source2 = StochasticSource::new(config, 20, 2000.0);

        for _ in 0..100 {
            assert_eq!(
                source1.next_call(&mut rng1).unwrap(),
                source2.next_call(&mut rng2).unwrap()
            );
        }
    }

    #[test]
    fn test_stochastic_seeds_diverge() {
        let config = TrafficConfig::default();
        let mut rng1 = RngManager::new(1);
        let mut rng2 = RngManager::new(2);
        let mut source1 = StochasticSource::new(config.clone(), 20, 2000.0);
        let mut source2 = StochasticSource::new(config, 20, 2000.0);

        let a = source1.next_call(&mut rng1).unwrap();
        let b = source2.next_call(&mut rng2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_trace_parses_and_converts_station_index() {
        let source = TraceSource::parse(TRACE, 2000.0).unwrap();
        assert_eq!(source.len(), 3);

        let mut source = source;
        let mut rng = RngManager::new(9);

        let first = source.next_call(&mut rng).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.arrival_time_s, 0.8);
        assert_eq!(first.station, 2, "file index 3 is 0-based station 2");
        assert_eq!(first.duration_s, 98.2);
        assert_eq!(first.speed_kmh, 121.5);
        assert!((0.0..2000.0).contains(&first.position_m));

        let third_station = {
            source.next_call(&mut rng).unwrap();
            source.next_call(&mut rng).unwrap().station
        };
        assert_eq!(third_station, 19, "file index 20 is the last station");
    }

    #[test]
    fn test_trace_randomization_is_seed_deterministic() {
        let mut source1 = TraceSource::parse(TRACE, 2000.0).unwrap();
        let mut source2 = TraceSource::parse(TRACE, 2000.0).unwrap();
        let mut rng1 = RngManager::new(77);
        let mut rng2 = RngManager::new(77);

        for _ in 0..3 {
            assert_eq!(
                source1.next_call(&mut rng1).unwrap(),
                source2.next_call(&mut rng2).unwrap()
            );
        }
    }

    #[test]
    fn test_trace_accepts_whitespace_separation() {
        let trace = "id arrivalTime baseStation callDuration carSpeed\n7  1.5\t4 60.0 110.0";
        let mut source = TraceSource::parse(trace, 2000.0).unwrap();
        let mut rng = RngManager::new(1);

        let record = source.next_call(&mut rng).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.station, 3);
    }

    #[test]
    fn test_trace_skips_blank_lines() {
        let trace = "id,arrivalTime,baseStation,callDuration,carSpeed\n\n1,0.8,3,98.2,121.5\n\n";
        let source = TraceSource::parse(trace, 2000.0).unwrap();
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_trace_malformed_row_names_line() {
        let trace = "id,arrivalTime,baseStation,callDuration,carSpeed\n1,0.8,3,98.2,121.5\n2,oops,5,40.0,100.0";
        let err = TraceSource::parse(trace, 2000.0).unwrap_err();
        match err {
            TrafficError::MalformedRecord { line, .. } => assert_eq!(line, 3),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_trace_wrong_field_count_rejected() {
        let trace = "header\n1,0.8,3";
        let err = TraceSource::parse(trace, 2000.0).unwrap_err();
        assert!(matches!(err, TrafficError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_trace_zero_station_rejected() {
        let trace = "header\n1,0.8,0,98.2,121.5";
        let err = TraceSource::parse(trace, 2000.0).unwrap_err();
        assert!(matches!(err, TrafficError::MalformedRecord { .. }));
    }

    #[test]
    fn test_trace_exhaustion_is_an_error() {
        let trace = "header\n1,0.8,3,98.2,121.5";
        let mut source = TraceSource::parse(trace, 2000.0).unwrap();
        let mut rng = RngManager::new(1);

        source.next_call(&mut rng).unwrap();
        let err = source.next_call(&mut rng).unwrap_err();
        assert_eq!(err, TrafficError::TraceExhausted { available: 1 });
    }

    #[test]
    fn test_validate_record_rejects_bad_station() {
        let record = CallRecord {
            id: 4,
            arrival_time_s: 1.0,
            station: 20,
            speed_kmh: 100.0,
            duration_s: 60.0,
            direction: Direction::TowardLast,
            position_m: 100.0,
        };

        let err = validate_record(&record, 20, 2000.0).unwrap_err();
        assert_eq!(
            err,
            TrafficError::StationOutOfRange {
                call_id: 4,
                station: 20,
                num_stations: 20
            }
        );
    }

    #[test]
    fn test_validate_record_rejects_non_positive_values() {
        let mut record = CallRecord {
            id: 5,
            arrival_time_s: 1.0,
            station: 0,
            speed_kmh: 100.0,
            duration_s: 60.0,
            direction: Direction::TowardLast,
            position_m: 100.0,
        };

        record.speed_kmh = 0.0;
        assert!(matches!(
            validate_record(&record, 20, 2000.0),
            Err(TrafficError::NonPositive { field: "speed", .. })
        ));

        record.speed_kmh = 100.0;
        record.duration_s = -3.0;
        assert!(matches!(
            validate_record(&record, 20, 2000.0),
            Err(TrafficError::NonPositive { field: "duration", .. })
        ));
    }

    #[test]
    fn test_config_validation_catches_bad_parameters() {
        let mut config = TrafficConfig::default();
        config.mean_inter_arrival_s = 0.0;
        assert!(config.validate().is_err());

        let mut config = TrafficConfig::default();
        config.std_dev_speed_kmh = -1.0;
        assert!(config.validate().is_err());

        assert!(TrafficConfig::default().validate().is_ok());
    }
}
