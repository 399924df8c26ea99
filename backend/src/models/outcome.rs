//! Outcome logging for replay verification and auditing.
//!
//! Every dispatched event appends exactly one outcome record, in dispatch
//! order. The log enables:
//! - Deterministic replay checks (two runs with one seed ⇒ identical logs)
//! - Debugging (follow a single call through its handovers)
//! - Analysis (blocked/dropped breakdowns beyond the headline counters)

use crate::models::station::ChannelKind;

/// What happened to a call at one dispatched event.
///
/// All outcomes include the simulation time at which they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// New call admitted; it now holds a channel at `station`
    Admitted {
        time: f64,
        call_id: u64,
        station: usize,
        channel: ChannelKind,
    },

    /// New call rejected for lack of a free channel (terminal)
    Blocked {
        time: f64,
        call_id: u64,
        station: usize,
    },

    /// Active call crossed a cell boundary and kept service
    HandedOver {
        time: f64,
        call_id: u64,
        from: usize,
        to: usize,
        channel: ChannelKind,
    },

    /// Active call lost service at a cell boundary (terminal)
    Dropped {
        time: f64,
        call_id: u64,
        from: usize,
        to: usize,
    },

    /// Active call ran to completion (terminal)
    Completed {
        time: f64,
        call_id: u64,
        station: usize,
    },
}

impl CallOutcome {
    /// Simulation time at which the outcome occurred
    pub fn time(&self) -> f64 {
        match self {
            CallOutcome::Admitted { time, .. } => *time,
            CallOutcome::Blocked { time, .. } => *time,
            CallOutcome::HandedOver { time, .. } => *time,
            CallOutcome::Dropped { time, .. } => *time,
            CallOutcome::Completed { time, .. } => *time,
        }
    }

    /// The call the outcome belongs to
    pub fn call_id(&self) -> u64 {
        match self {
            CallOutcome::Admitted { call_id, .. } => *call_id,
            CallOutcome::Blocked { call_id, .. } => *call_id,
            CallOutcome::HandedOver { call_id, .. } => *call_id,
            CallOutcome::Dropped { call_id, .. } => *call_id,
            CallOutcome::Completed { call_id, .. } => *call_id,
        }
    }

    /// Short name of the outcome variant
    pub fn outcome_type(&self) -> &'static str {
        match self {
            CallOutcome::Admitted { .. } => "Admitted",
            CallOutcome::Blocked { .. } => "Blocked",
            CallOutcome::HandedOver { .. } => "HandedOver",
            CallOutcome::Dropped { .. } => "Dropped",
            CallOutcome::Completed { .. } => "Completed",
        }
    }

    /// True for Blocked, Dropped and Completed: nothing follows for this call
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallOutcome::Blocked { .. } | CallOutcome::Dropped { .. } | CallOutcome::Completed { .. }
        )
    }
}

/// Outcome log storing per-dispatch records in dispatch order.
///
/// This is a simple wrapper around Vec<CallOutcome> with convenience methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeLog {
    outcomes: Vec<CallOutcome>,
}

impl OutcomeLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    /// Append an outcome record
    pub fn record(&mut self, outcome: CallOutcome) {
        self.outcomes.push(outcome);
    }

    /// Number of records logged
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// All records in dispatch order
    pub fn outcomes(&self) -> &[CallOutcome] {
        &self.outcomes
    }

    /// Records belonging to one call, in dispatch order
    pub fn outcomes_for_call(&self, call_id: u64) -> Vec<&CallOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.call_id() == call_id)
            .collect()
    }

    /// Records of a specific variant
    pub fn outcomes_of_type(&self, outcome_type: &str) -> Vec<&CallOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.outcome_type() == outcome_type)
            .collect()
    }

    /// Clear all records
    pub fn clear(&mut self) {
        self.outcomes.clear();
    }
}
