//! Time-ordered event queue
//!
//! A min-priority queue over `std::collections::BinaryHeap` (a max-heap,
//! inverted by reversing the comparison). Events come out in scheduled-time
//! order; among equal times, in insertion order via a per-queue sequence
//! number. That tie-break makes whole runs reproducible, but simulation
//! statistics must not depend on which equal-time event fires first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::models::call::CallEvent;

/// Heap entry pairing an event with its insertion sequence number.
#[derive(Debug, Clone)]
struct ScheduledEvent {
    event: CallEvent,
    seq: u64,
}

impl ScheduledEvent {
    /// Min-heap key: earlier time first, then lower sequence number.
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.event
            .time()
            .total_cmp(&other.event.time())
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key_cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for earliest-first dispatch
        self.key_cmp(other).reverse()
    }
}

/// Min-priority event queue keyed by scheduled time
///
/// # Example
/// ```
/// use cellular_simulator_core_rs::models::call::CallEvent;
/// use cellular_simulator_core_rs::models::station::ChannelKind;
/// use cellular_simulator_core_rs::scheduler::EventScheduler;
///
/// let mut scheduler = EventScheduler::new();
/// scheduler.insert(CallEvent::Termination {
///     call_id: 1,
///     time: 9.0,
///     station: 0,
///     channel: ChannelKind::Ordinary,
/// });
/// scheduler.insert(CallEvent::Termination {
///     call_id: 2,
///     time: 4.0,
///     station: 0,
///     channel: ChannelKind::Ordinary,
/// });
///
/// assert_eq!(scheduler.pop_earliest().unwrap().call_id(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    heap: BinaryHeap<ScheduledEvent>,
    next_seq: u64,
}

impl EventScheduler {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Insert an event
    ///
    /// # Panics
    /// Panics if the event's time is not finite.
    pub fn insert(&mut self, event: CallEvent) {
        assert!(event.time().is_finite(), "event time must be finite");

        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledEvent { event, seq });
    }

    /// Remove and return the earliest event, if any
    pub fn pop_earliest(&mut self) -> Option<CallEvent> {
        self.heap.pop().map(|scheduled| scheduled.event)
    }

    /// Scheduled time of the earliest event, if any
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|scheduled| scheduled.event.time())
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pending events in dispatch order, without consuming the queue
    ///
    /// Used by checkpointing. Clones the heap internally.
    pub fn pending_in_order(&self) -> Vec<CallEvent> {
        let mut copy = self.heap.clone();
        let mut ordered = Vec::with_capacity(copy.len());
        while let Some(scheduled) = copy.pop() {
            ordered.push(scheduled.event);
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::station::ChannelKind;

    fn termination_at(call_id: u64, time: f64) -> CallEvent {
        CallEvent::Termination {
            call_id,
            time,
            station: 0,
            channel: ChannelKind::Ordinary,
        }
    }

    #[test]
    fn test_pops_in_time_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.insert(termination_at(1, 30.0));
        scheduler.insert(termination_at(2, 10.0));
        scheduler.insert(termination_at(3, 20.0));

        assert_eq!(scheduler.pop_earliest().unwrap().call_id(), 2);
        assert_eq!(scheduler.pop_earliest().unwrap().call_id(), 3);
        assert_eq!(scheduler.pop_earliest().unwrap().call_id(), 1);
        assert!(scheduler.pop_earliest().is_none());
    }

    #[test]
    fn test_equal_times_dispatch_in_insertion_order() {
        let mut scheduler = EventScheduler::new();
        for call_id in 0..50 {
            scheduler.insert(termination_at(call_id, 5.0));
        }

        for expected in 0..50 {
            assert_eq!(scheduler.pop_earliest().unwrap().call_id(), expected);
        }
    }

    #[test]
    fn test_interleaved_insert_and_pop() {
        let mut scheduler = EventScheduler::new();
        scheduler.insert(termination_at(1, 10.0));
        scheduler.insert(termination_at(2, 5.0));

        assert_eq!(scheduler.pop_earliest().unwrap().call_id(), 2);

        scheduler.insert(termination_at(3, 7.0));
        scheduler.insert(termination_at(4, 12.0));

        assert_eq!(scheduler.pop_earliest().unwrap().call_id(), 3);
        assert_eq!(scheduler.pop_earliest().unwrap().call_id(), 1);
        assert_eq!(scheduler.pop_earliest().unwrap().call_id(), 4);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut scheduler = EventScheduler::new();
        scheduler.insert(termination_at(1, 3.0));

        assert_eq!(scheduler.peek_time(), Some(3.0));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_pending_in_order_preserves_queue() {
        let mut scheduler = EventScheduler::new();
        scheduler.insert(termination_at(1, 8.0));
        scheduler.insert(termination_at(2, 2.0));
        scheduler.insert(termination_at(3, 2.0));

        let pending = scheduler.pending_in_order();
        let ids: Vec<u64> = pending.iter().map(|e| e.call_id()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(scheduler.len(), 3, "inspection must not consume");
    }

    #[test]
    #[should_panic(expected = "event time must be finite")]
    fn test_non_finite_time_rejected() {
        let mut scheduler = EventScheduler::new();
        scheduler.insert(termination_at(1, f64::NAN));
    }
}
