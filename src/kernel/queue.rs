// src/kernel/queue.rs

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::errors::{Result, WfsimError};
use crate::kernel::event::{Event, WorkflowEvent};
use crate::kernel::{EntityId, SimTime};

/// Heap entry ordering events by `(time, seq)`, earliest first.
#[derive(Debug)]
struct Queued(Event);

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse both keys.
        other
            .0
            .time
            .total_cmp(&self.0.time)
            .then_with(|| other.0.seq.cmp(&self.0.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

/// Future event list.
///
/// Events pop in increasing time order; events with equal times pop in
/// the order they were scheduled.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` for `target` at `now + delay`.
    ///
    /// Fails with [`WfsimError::InvalidEventTime`] for negative or
    /// non-finite delays.
    pub fn schedule(
        &mut self,
        now: SimTime,
        source: EntityId,
        target: EntityId,
        delay: SimTime,
        payload: WorkflowEvent,
    ) -> Result<()> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(WfsimError::InvalidEventTime { delay });
        }
        self.insert(now + delay, source, target, payload);
        Ok(())
    }

    /// Insert at an absolute time already known to be valid.
    pub(crate) fn insert(
        &mut self,
        time: SimTime,
        source: EntityId,
        target: EntityId,
        payload: WorkflowEvent,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Queued(Event {
            time,
            seq,
            source,
            target,
            payload,
        }));
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|q| q.0)
    }

    /// Delivery time of the next event, if any.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|q| q.0.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
