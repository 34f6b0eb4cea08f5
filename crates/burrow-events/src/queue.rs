//! Pending-event priority queue.
//!
//! A max-heap on [`Event::priority`]. Among events of equal priority the one
//! pushed first is popped first: every push is stamped with a monotonically
//! increasing sequence number that acts as the secondary key.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::event::Event;

/// Heap entry: the event plus its ordering keys.
#[derive(Debug)]
struct Queued {
    priority: i32,
    sequence: u64,
    event: Event,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority wins; on a tie the lower sequence (older) wins.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Events waiting to be processed, most urgent first.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Queued>,
    next_sequence: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event. Returns the sequence number it was stamped with.
    pub fn push(&mut self, event: Event) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Queued {
            priority: event.priority,
            sequence,
            event,
        });
        sequence
    }

    /// Remove and return the most urgent event.
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|q| q.event)
    }

    /// Priority of the event [`pop`](Self::pop) would return next.
    pub fn peek_priority(&self) -> Option<i32> {
        self.heap.peek().map(|q| q.priority)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
