use std::fmt;

use super::job::Job;
use crate::core::{Mem, MemDelta, Pid, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    Io,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Waiting(WaitReason),
    Terminated,
    Killed,
}

impl ProcessState {
    pub fn is_final(self) -> bool {
        matches!(self, Self::Terminated | Self::Killed)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Waiting(_) => "WAITING",
            Self::Terminated => "TERMINATED",
            Self::Killed => "KILLED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Placed on the device matching the current burst.
    Dispatch,
    /// One tick on the device.
    Run,
    /// Removed from its device before the burst finished.
    Preempt,
    AwaitIo,
    AwaitMemory,
    /// Memory for the current CPU burst is in hand.
    Ready,
    Terminate,
    /// Chosen as a deadlock victim.
    Kill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    CpuDispatch,
    CpuTick,
    IoDispatch,
    IoTick,
    Preemption,
    MemoryWait,
}

/// The whole lifecycle machine. `on_cpu` tells whether the current burst is
/// a CPU burst. Returns `None` for a transition the state does not allow.
pub fn transition(
    state: ProcessState,
    on_cpu: bool,
    t: Transition,
) -> Option<(ProcessState, Option<Stat>)> {
    use ProcessState::*;
    use Transition as T;

    let next = match (state, t) {
        (Ready, T::Dispatch) if on_cpu => (Running, Some(Stat::CpuDispatch)),
        (Waiting(WaitReason::Io), T::Dispatch) if !on_cpu => (Running, Some(Stat::IoDispatch)),
        (Running, T::Run) if on_cpu => (Running, Some(Stat::CpuTick)),
        (Running, T::Run) => (Running, Some(Stat::IoTick)),
        (Running, T::Preempt) if on_cpu => (Ready, Some(Stat::Preemption)),
        (Running, T::Preempt) => (Waiting(WaitReason::Io), None),
        (Running, T::AwaitIo) if !on_cpu => (Waiting(WaitReason::Io), None),
        (Running, T::AwaitMemory) if on_cpu => {
            (Waiting(WaitReason::Memory), Some(Stat::MemoryWait))
        }
        (Running | Waiting(WaitReason::Memory), T::Ready) if on_cpu => (Ready, None),
        (Running, T::Terminate) => (Terminated, None),
        (Waiting(WaitReason::Memory), T::Kill) => (Killed, None),
        _ => return None,
    };
    Some(next)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub cpu_dispatches: u64,
    pub cpu_ticks: Ticks,
    pub io_dispatches: u64,
    pub io_ticks: Ticks,
    pub preemptions: u64,
    pub memory_waits: u64,
}

impl ProcessStats {
    fn bump(&mut self, stat: Stat) {
        let counter = match stat {
            Stat::CpuDispatch => &mut self.cpu_dispatches,
            Stat::CpuTick => &mut self.cpu_ticks,
            Stat::IoDispatch => &mut self.io_dispatches,
            Stat::IoTick => &mut self.io_ticks,
            Stat::Preemption => &mut self.preemptions,
            Stat::MemoryWait => &mut self.memory_waits,
        };
        *counter += 1;
    }
}

#[derive(Debug)]
pub struct Process {
    pub pid: Pid,
    pub arrival_time: Ticks,
    pub job: Job,
    state: ProcessState,
    memory: Mem,
    stats: ProcessStats,
    completion_time: Option<Ticks>,
}

impl Process {
    pub fn new(pid: Pid, job: Job, arrival_time: Ticks) -> Self {
        let memory = job.memory_required();
        Self {
            pid,
            arrival_time,
            job,
            state: ProcessState::Ready,
            memory,
            stats: ProcessStats::default(),
            completion_time: None,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn stats(&self) -> &ProcessStats {
        &self.stats
    }

    /// Memory currently charged to this process.
    pub fn memory(&self) -> Mem {
        self.memory
    }

    pub fn completion_time(&self) -> Option<Ticks> {
        self.completion_time
    }

    /// Remaining ticks of the current burst.
    pub fn remaining(&self) -> Ticks {
        self.job.current().remaining()
    }

    pub fn on_cpu_burst(&self) -> bool {
        self.job.current().is_cpu()
    }

    /// Extra memory the current CPU burst needs on entry.
    ///
    /// Panics on an IO burst: only CPU bursts carry a memory requirement.
    pub fn burst_memory(&self) -> MemDelta {
        self.job.current().memory_delta().unwrap_or_else(|| {
            panic!(
                "process {} asked for CPU burst memory while on an IO burst",
                self.pid
            )
        })
    }

    pub fn adjust_memory(&mut self, delta: MemDelta) {
        self.memory = self
            .memory
            .checked_add_signed(delta)
            .unwrap_or_else(|| panic!("process {} memory would go negative", self.pid));
    }

    /// Applies a lifecycle transition and its statistic, recording the
    /// completion tick on entry to a final state.
    pub fn apply(&mut self, t: Transition, now: Ticks) {
        let (next, stat) = transition(self.state, self.on_cpu_burst(), t).unwrap_or_else(|| {
            panic!(
                "illegal transition {t:?} for process {} in state {:?}",
                self.pid, self.state
            )
        });
        self.state = next;
        if let Some(stat) = stat {
            self.stats.bump(stat);
        }
        if next.is_final() {
            debug_assert!(self.completion_time.is_none());
            self.completion_time = Some(now);
        }
    }

    /// Runs the current burst for one tick. An exhausted burst is not
    /// decremented but the tick is still charged.
    pub fn run_tick(&mut self, now: Ticks) {
        self.job.current_mut().run();
        self.apply(Transition::Run, now);
    }
}
