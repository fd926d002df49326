use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::core::{Mem, Pid};

/// Processes blocked on memory, ordered by the memory they already hold.
///
/// One set serves both views: the lightest holder (lowest pid on ties) is
/// first in line for allotment, the heaviest holder (highest pid on ties) is
/// the deadlock victim. A waiting process's holding does not change, so the
/// `(held, pid)` key stays valid until removal.
#[derive(Debug, Default)]
pub struct MemoryWaitSet {
    by_holding: BTreeSet<(Mem, Pid)>,
    held: FxHashMap<Pid, Mem>,
}

impl MemoryWaitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pid: Pid, held: Mem) {
        let previous = self.held.insert(pid, held);
        assert!(previous.is_none(), "process {pid} already waiting for memory");
        self.by_holding.insert((held, pid));
    }

    pub fn remove(&mut self, pid: Pid) -> bool {
        match self.held.remove(&pid) {
            Some(held) => {
                let removed = self.by_holding.remove(&(held, pid));
                debug_assert!(removed, "memory-wait index out of sync for {pid}");
                true
            }
            None => false,
        }
    }

    /// Next process to be offered memory.
    pub fn lightest(&self) -> Option<Pid> {
        self.by_holding.first().map(|&(_, pid)| pid)
    }

    /// Process whose kill frees the most memory.
    pub fn heaviest(&self) -> Option<Pid> {
        self.by_holding.last().map(|&(_, pid)| pid)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.held.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}
