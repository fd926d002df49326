use super::state::{DeviceKind, MachineCtx};
use crate::{
    scheduler::{Dispatcher, QueueKind},
    sim::{ProcessState, WaitReason},
};

#[derive(Debug)]
pub struct Observer {
    step: u64,
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn observe(&mut self, ctx: &MachineCtx, dispatcher: &Dispatcher) {
        self.step += 1;

        let memory = &ctx.memory;
        debug_assert!(
            memory.reserved() <= memory.in_use() && memory.in_use() <= memory.total(),
            "step {}: memory in use {} outside [{}, {}]",
            self.step,
            memory.in_use(),
            memory.reserved(),
            memory.total()
        );

        for device in [DeviceKind::Cpu, DeviceKind::Io] {
            if let Some(pid) = ctx.occupant(device) {
                let process = ctx.process(pid);
                debug_assert_eq!(
                    process.state(),
                    ProcessState::Running,
                    "{device} occupant {pid} must be Running"
                );
                debug_assert_eq!(
                    process.on_cpu_burst(),
                    device == DeviceKind::Cpu,
                    "process {pid} is on {device} with the wrong burst kind"
                );
                debug_assert!(
                    dispatcher.queue_of(pid).is_none(),
                    "{device} occupant {pid} must not appear in any queue"
                );
            }
        }

        for (pid, queue) in dispatcher.queued() {
            let state = ctx.process(pid).state();
            let expected = match queue {
                QueueKind::Ready => ProcessState::Ready,
                QueueKind::IoWait => ProcessState::Waiting(WaitReason::Io),
                QueueKind::MemoryWait => ProcessState::Waiting(WaitReason::Memory),
            };
            debug_assert_eq!(
                state, expected,
                "process {pid} queued in {queue:?} while {state:?}"
            );
            debug_assert_eq!(
                queue == QueueKind::MemoryWait,
                dispatcher.memory_wait().contains(pid),
                "process {pid} memory-wait membership disagrees with {queue:?}"
            );
        }
        debug_assert_eq!(
            dispatcher.memory_wait().len(),
            dispatcher
                .queued()
                .filter(|&(_, q)| q == QueueKind::MemoryWait)
                .count(),
            "memory-wait set disagrees with queue membership"
        );

        let held: u64 = ctx
            .processes
            .iter()
            .filter(|p| !p.state().is_final())
            .map(|p| p.memory())
            .sum();
        debug_assert_eq!(
            held,
            memory.freeable(),
            "step {}: live processes hold {held} but the pool charges {}",
            self.step,
            memory.freeable()
        );
    }
}
