use std::fmt;

use super::memory::MemoryManager;
use crate::sim::{Job, Process};

// Index into the process arena; also admission order
pub type Pid = usize;
pub type Ticks = u64;
pub type Mem = u64;
pub type MemDelta = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    Io,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("CPU"),
            Self::Io => f.write_str("IO"),
        }
    }
}

#[derive(Debug)]
pub struct DeviceSlot {
    pub kind: DeviceKind,
    pub current: Option<Pid>,
}

/// Everything the dispatcher and admission controller read or mutate
/// besides their own queues.
#[derive(Debug)]
pub struct MachineCtx {
    pub now: Ticks,
    pub memory: MemoryManager,
    pub cpu: DeviceSlot,
    pub io: DeviceSlot,
    pub processes: Vec<Process>,
    // Ticks during which the CPU held a process
    pub cpu_busy_ticks: Ticks,
}

impl MachineCtx {
    pub fn new(total_memory: Mem, os_memory: Mem) -> Self {
        Self {
            now: 0,
            memory: MemoryManager::new(total_memory, os_memory),
            cpu: DeviceSlot {
                kind: DeviceKind::Cpu,
                current: None,
            },
            io: DeviceSlot {
                kind: DeviceKind::Io,
                current: None,
            },
            processes: Vec::new(),
            cpu_busy_ticks: 0,
        }
    }

    pub fn create_process(&mut self, job: Job) -> Pid {
        let pid = self.processes.len();
        self.processes.push(Process::new(pid, job, self.now));
        pid
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn process(&self, pid: Pid) -> &Process {
        &self.processes[pid]
    }

    pub fn process_mut(&mut self, pid: Pid) -> &mut Process {
        &mut self.processes[pid]
    }

    pub fn device(&self, kind: DeviceKind) -> &DeviceSlot {
        match kind {
            DeviceKind::Cpu => &self.cpu,
            DeviceKind::Io => &self.io,
        }
    }

    fn device_mut(&mut self, kind: DeviceKind) -> &mut DeviceSlot {
        match kind {
            DeviceKind::Cpu => &mut self.cpu,
            DeviceKind::Io => &mut self.io,
        }
    }

    pub fn occupant(&self, kind: DeviceKind) -> Option<Pid> {
        self.device(kind).current
    }

    pub fn set_occupant(&mut self, kind: DeviceKind, pid: Pid) {
        let slot = self.device_mut(kind);
        debug_assert!(
            slot.current.is_none(),
            "{kind} already occupied by {:?}",
            slot.current
        );
        slot.current = Some(pid);
    }

    pub fn clear_device(&mut self, kind: DeviceKind) -> Option<Pid> {
        self.device_mut(kind).current.take()
    }

    pub fn both_idle(&self) -> bool {
        self.cpu.current.is_none() && self.io.current.is_none()
    }
}
