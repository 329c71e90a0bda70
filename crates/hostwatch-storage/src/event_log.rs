use hostwatch_common::types::AlertEvent;
use std::collections::VecDeque;

pub const DEFAULT_EVENT_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrder {
    /// Oldest first.
    Insertion,
    NewestFirst,
}

/// Bounded append-only buffer of alert events. The oldest event is dropped
/// when a new one arrives at capacity.
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    events: VecDeque<AlertEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventLog {
    /// Creates an empty log. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, event: AlertEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Up to `limit` events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<AlertEvent> {
        self.events.iter().rev().take(limit).cloned().collect()
    }

    pub fn ordered(&self, order: ReadOrder) -> Vec<AlertEvent> {
        match order {
            ReadOrder::Insertion => self.events.iter().cloned().collect(),
            ReadOrder::NewestFirst => self.events.iter().rev().cloned().collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.events.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
