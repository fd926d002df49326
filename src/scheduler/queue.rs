use std::cmp::Ordering;

use keyed_priority_queue::KeyedPriorityQueue;

use crate::core::{Pid, Ticks};

/// Shortest remaining burst first, earlier pid on ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortestFirst {
    pub remaining: Ticks,
    pub pid: Pid,
}

// KeyedPriorityQueue is a max-heap, so the smallest key has to compare greatest
impl Ord for ShortestFirst {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.remaining, other.pid).cmp(&(self.remaining, self.pid))
    }
}

impl PartialOrd for ShortestFirst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ready or IO-wait queue. The key is captured at push time; a queued
/// process never runs, so its remaining time cannot go stale.
#[derive(Debug)]
pub struct RunQueue {
    tasks: KeyedPriorityQueue<Pid, ShortestFirst>,
}

impl RunQueue {
    pub fn new() -> Self {
        Self {
            tasks: KeyedPriorityQueue::new(),
        }
    }

    pub fn push(&mut self, pid: Pid, remaining: Ticks) {
        let previous = self.tasks.push(pid, ShortestFirst { remaining, pid });
        assert!(previous.is_none(), "process {pid} queued twice");
    }

    pub fn pop(&mut self) -> Option<Pid> {
        self.tasks.pop().map(|(pid, _)| pid)
    }

    pub fn peek(&self) -> Option<Pid> {
        self.tasks.peek().map(|(pid, _)| *pid)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
