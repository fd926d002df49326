use crate::core::{DeviceKind, Mem, Pid, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineEvent {
    Admitted {
        pid: Pid,
        memory: Mem,
    },
    Dispatched {
        pid: Pid,
        device: DeviceKind,
    },
    Preempted {
        pid: Pid,
        by: Pid,
        device: DeviceKind,
    },
    AwaitingIo {
        pid: Pid,
    },
    // Next CPU burst asked for more memory than is free
    AwaitingMemory {
        pid: Pid,
        requested: Mem,
    },
    MemoryAllotted {
        pid: Pid,
        amount: Mem,
    },
    Terminated {
        pid: Pid,
        at: Ticks,
    },
    Killed {
        pid: Pid,
        freed: Mem,
        at: Ticks,
    },
}
