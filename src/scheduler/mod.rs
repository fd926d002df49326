pub mod admission;
pub mod memory_wait;
pub mod queue;

use rustc_hash::FxHashMap;

use crate::{
    core::{
        state::{MachineCtx, Mem, Pid},
        DeviceKind,
    },
    sim::{Job, ProcessState, Transition, WaitReason},
};
pub use admission::AdmissionController;
pub use memory_wait::MemoryWaitSet;
pub use queue::RunQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Ready,
    IoWait,
    MemoryWait,
}

/// Short-term scheduler: shortest-remaining-time queues for both devices,
/// the memory-wait set, and the final resting lists.
#[derive(Debug)]
pub struct Dispatcher {
    ready: RunQueue,
    io_wait: RunQueue,
    memory_wait: MemoryWaitSet,
    killed: Vec<Pid>,
    terminated: Vec<Pid>,
    queued: FxHashMap<Pid, QueueKind>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            ready: RunQueue::new(),
            io_wait: RunQueue::new(),
            memory_wait: MemoryWaitSet::new(),
            killed: Vec::new(),
            terminated: Vec::new(),
            queued: FxHashMap::default(),
        }
    }

    /// Creates a READY process for `job`. Memory is the caller's business.
    pub fn create_process(&mut self, ctx: &mut MachineCtx, job: Job) -> Pid {
        let pid = ctx.create_process(job);
        self.enqueue_ready(ctx, pid);
        pid
    }

    fn mark_queued(&mut self, pid: Pid, kind: QueueKind) {
        let previous = self.queued.insert(pid, kind);
        assert!(
            previous.is_none(),
            "process {pid} already in {previous:?}, cannot join {kind:?}"
        );
    }

    fn unmark(&mut self, pid: Pid) {
        let removed = self.queued.remove(&pid);
        debug_assert!(removed.is_some(), "process {pid} missing queue membership");
    }

    pub fn enqueue_ready(&mut self, ctx: &MachineCtx, pid: Pid) {
        let process = ctx.process(pid);
        debug_assert_eq!(process.state(), ProcessState::Ready);
        self.mark_queued(pid, QueueKind::Ready);
        self.ready.push(pid, process.remaining());
    }

    pub fn enqueue_io(&mut self, ctx: &MachineCtx, pid: Pid) {
        let process = ctx.process(pid);
        debug_assert_eq!(process.state(), ProcessState::Waiting(WaitReason::Io));
        self.mark_queued(pid, QueueKind::IoWait);
        self.io_wait.push(pid, process.remaining());
    }

    pub fn enqueue_memory_wait(&mut self, ctx: &MachineCtx, pid: Pid) {
        let process = ctx.process(pid);
        debug_assert_eq!(process.state(), ProcessState::Waiting(WaitReason::Memory));
        self.mark_queued(pid, QueueKind::MemoryWait);
        self.memory_wait.insert(pid, process.memory());
    }

    /// Puts a preempted or reconsidered process back in the queue for `device`.
    pub fn requeue(&mut self, ctx: &MachineCtx, device: DeviceKind, pid: Pid) {
        match device {
            DeviceKind::Cpu => self.enqueue_ready(ctx, pid),
            DeviceKind::Io => self.enqueue_io(ctx, pid),
        }
    }

    pub fn dispatch_to_cpu(&mut self) -> Option<Pid> {
        let pid = self.ready.pop()?;
        self.unmark(pid);
        Some(pid)
    }

    pub fn dispatch_for_io(&mut self) -> Option<Pid> {
        let pid = self.io_wait.pop()?;
        self.unmark(pid);
        Some(pid)
    }

    /// Pops the best candidate for `device`.
    pub fn next_for(&mut self, device: DeviceKind) -> Option<Pid> {
        match device {
            DeviceKind::Cpu => self.dispatch_to_cpu(),
            DeviceKind::Io => self.dispatch_for_io(),
        }
    }

    /// Serves the lightest memory waiter if its request fits. Returns the
    /// process and the amount handed to it.
    pub fn allot_memory(&mut self, ctx: &mut MachineCtx) -> Option<(Pid, Mem)> {
        let pid = self.memory_wait.lightest()?;
        let requested = ctx.process(pid).burst_memory();
        debug_assert!(requested > 0, "process {pid} waits for {requested}");
        let requested = requested as Mem;

        ctx.memory.allocate(requested).ok()?;

        self.memory_wait.remove(pid);
        self.unmark(pid);
        let now = ctx.now;
        let process = ctx.process_mut(pid);
        process.adjust_memory(requested as i64);
        process.apply(Transition::Ready, now);
        self.enqueue_ready(ctx, pid);
        Some((pid, requested))
    }

    /// Removes the heaviest memory waiter so it can be killed.
    pub fn evict_heaviest(&mut self) -> Option<Pid> {
        let pid = self.memory_wait.heaviest()?;
        self.memory_wait.remove(pid);
        self.unmark(pid);
        Some(pid)
    }

    pub fn record_terminated(&mut self, pid: Pid) {
        self.terminated.push(pid);
    }

    pub fn record_killed(&mut self, pid: Pid) {
        self.killed.push(pid);
    }

    /// Nothing left that could make progress.
    pub fn is_terminated(&self) -> bool {
        self.ready.is_empty() && self.io_wait.is_empty() && self.memory_wait.is_empty()
    }

    /// Only memory waiters remain, and nothing can ever free memory for them.
    pub fn is_deadlocked(&self) -> bool {
        self.ready.is_empty() && self.io_wait.is_empty() && !self.memory_wait.is_empty()
    }

    pub fn queue_of(&self, pid: Pid) -> Option<QueueKind> {
        self.queued.get(&pid).copied()
    }

    pub fn queued(&self) -> impl Iterator<Item = (Pid, QueueKind)> + '_ {
        self.queued.iter().map(|(&pid, &kind)| (pid, kind))
    }

    pub fn ready(&self) -> &RunQueue {
        &self.ready
    }

    pub fn io_wait(&self) -> &RunQueue {
        &self.io_wait
    }

    pub fn memory_wait(&self) -> &MemoryWaitSet {
        &self.memory_wait
    }

    pub fn killed(&self) -> &[Pid] {
        &self.killed
    }

    pub fn terminated(&self) -> &[Pid] {
        &self.terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Burst;

    fn job(bursts: Vec<Burst>) -> Job {
        Job::new("t", bursts).unwrap()
    }

    // Parks `pid` in memory-wait holding `held`, asking for `ask` more.
    fn park(ctx: &mut MachineCtx, d: &mut Dispatcher, held: i64, ask: i64) -> Pid {
        let pid = d.create_process(
            ctx,
            job(vec![Burst::cpu(1, held), Burst::io(1), Burst::cpu(5, ask)]),
        );
        ctx.memory.allocate(held as Mem).unwrap();
        d.dispatch_to_cpu();
        let now = ctx.now;
        let p = ctx.process_mut(pid);
        p.apply(Transition::Dispatch, now);
        p.job.advance();
        p.apply(Transition::AwaitIo, now);
        p.apply(Transition::Dispatch, now);
        p.job.advance();
        p.apply(Transition::AwaitMemory, now);
        d.enqueue_memory_wait(ctx, pid);
        pid
    }

    #[test]
    fn ready_queue_orders_by_remaining_then_pid() {
        let mut ctx = MachineCtx::new(1024, 0);
        let mut d = Dispatcher::new();
        let a = d.create_process(&mut ctx, job(vec![Burst::cpu(9, 1)]));
        let b = d.create_process(&mut ctx, job(vec![Burst::cpu(4, 1)]));
        let c = d.create_process(&mut ctx, job(vec![Burst::cpu(4, 1)]));

        assert_eq!(d.queue_of(a), Some(QueueKind::Ready));
        assert_eq!(d.dispatch_to_cpu(), Some(b));
        assert_eq!(d.dispatch_to_cpu(), Some(c));
        assert_eq!(d.dispatch_to_cpu(), Some(a));
        assert_eq!(d.dispatch_to_cpu(), None);
        assert_eq!(d.dispatch_for_io(), None);
        assert_eq!(d.queue_of(a), None);
    }

    #[test]
    fn allotment_serves_lightest_holder_first() {
        let mut ctx = MachineCtx::new(100, 0);
        let mut d = Dispatcher::new();
        let heavy = park(&mut ctx, &mut d, 40, 10);
        let light = park(&mut ctx, &mut d, 20, 30);
        // 40 free: the light holder's 30 fits
        assert!(d.is_deadlocked());

        assert_eq!(d.allot_memory(&mut ctx), Some((light, 30)));
        assert_eq!(ctx.process(light).memory(), 50);
        assert_eq!(ctx.process(light).state(), ProcessState::Ready);
        assert_eq!(d.queue_of(light), Some(QueueKind::Ready));
        assert_eq!(ctx.memory.available(), 10);

        assert_eq!(d.allot_memory(&mut ctx), Some((heavy, 10)));
        assert!(d.memory_wait().is_empty());
        assert_eq!(d.allot_memory(&mut ctx), None);
        assert!(!d.is_deadlocked());
    }

    #[test]
    fn blocked_head_stops_allotment() {
        let mut ctx = MachineCtx::new(100, 0);
        let mut d = Dispatcher::new();
        let _heavy = park(&mut ctx, &mut d, 60, 1);
        let light = park(&mut ctx, &mut d, 10, 50);

        assert_eq!(d.allot_memory(&mut ctx), None);
        assert_eq!(ctx.memory.available(), 30);
        assert!(d.memory_wait().contains(light));
    }

    #[test]
    fn victim_is_heaviest_holder_and_leaves_both_views() {
        let mut ctx = MachineCtx::new(1000, 0);
        let mut d = Dispatcher::new();
        let a = park(&mut ctx, &mut d, 30, 990);
        let b = park(&mut ctx, &mut d, 70, 990);
        let c = park(&mut ctx, &mut d, 70, 990);

        assert_eq!(d.evict_heaviest(), Some(c));
        assert_eq!(d.queue_of(c), None);
        assert_eq!(d.memory_wait().lightest(), Some(a));
        assert_eq!(d.evict_heaviest(), Some(b));
        assert_eq!(d.evict_heaviest(), Some(a));
        assert_eq!(d.evict_heaviest(), None);
        assert!(d.is_terminated());
    }

    #[test]
    #[should_panic(expected = "already in")]
    fn process_cannot_sit_in_two_queues() {
        let mut ctx = MachineCtx::new(100, 0);
        let mut d = Dispatcher::new();
        let pid = d.create_process(&mut ctx, job(vec![Burst::cpu(1, 1)]));
        d.enqueue_ready(&ctx, pid);
    }
}
