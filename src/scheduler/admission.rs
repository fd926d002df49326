use std::collections::VecDeque;

use super::Dispatcher;
use crate::{
    core::{MachineCtx, Pid},
    sim::Job,
};

/// Long-term scheduler: a FIFO backlog of jobs waiting to become processes.
#[derive(Debug)]
pub struct AdmissionController {
    backlog: VecDeque<Job>,
    // Fraction of total memory that must stay free after an admission
    slack: f64,
}

impl AdmissionController {
    pub fn new(slack: f64) -> Self {
        Self {
            backlog: VecDeque::new(),
            slack,
        }
    }

    pub fn submit(&mut self, jobs: impl IntoIterator<Item = Job>) {
        self.backlog.extend(jobs);
    }

    pub fn slack(&self) -> f64 {
        self.slack
    }

    pub fn has_pending(&self) -> bool {
        !self.backlog.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.backlog.len()
    }

    /// Admits the head job if, after charging its initial memory, at least
    /// `slack * total` memory would still be free. Jobs are never reordered:
    /// a head that does not fit blocks the rest.
    pub fn try_admit_one(
        &mut self,
        ctx: &mut MachineCtx,
        dispatcher: &mut Dispatcher,
    ) -> Option<Pid> {
        let job = self.backlog.front()?;
        let required = job.memory_required();
        let headroom = ctx.memory.available() as f64 - required as f64;
        if headroom < self.slack * ctx.memory.total() as f64 {
            return None;
        }

        let job = self.backlog.pop_front()?;
        if required > 0 {
            ctx.memory
                .allocate(required)
                .expect("admission headroom check guarantees the allocation");
        }
        let pid = dispatcher.create_process(ctx, job);
        tracing::info!(
            pid,
            job = ctx.process(pid).job.name(),
            memory = required,
            now = ctx.now,
            "admitted job"
        );
        Some(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Burst;

    fn job(name: &str, memory: i64) -> Job {
        Job::new(name, vec![Burst::cpu(5, memory)]).unwrap()
    }

    #[test]
    fn admits_while_slack_remains() {
        let mut ctx = MachineCtx::new(1000, 0);
        let mut d = Dispatcher::new();
        let mut lts = AdmissionController::new(0.15);
        lts.submit([job("a", 400), job("b", 400), job("c", 10)]);

        assert_eq!(lts.try_admit_one(&mut ctx, &mut d), Some(0));
        // 200 left afterwards, still above 150
        assert_eq!(lts.try_admit_one(&mut ctx, &mut d), Some(1));
        assert_eq!(lts.try_admit_one(&mut ctx, &mut d), Some(2));
        assert!(!lts.has_pending());
        assert_eq!(ctx.memory.in_use(), 810);
        assert_eq!(ctx.process(1).memory(), 400);
    }

    #[test]
    fn head_of_line_blocks_lighter_jobs() {
        let mut ctx = MachineCtx::new(1000, 0);
        let mut d = Dispatcher::new();
        let mut lts = AdmissionController::new(0.15);
        lts.submit([job("big", 900), job("small", 1)]);

        assert_eq!(lts.try_admit_one(&mut ctx, &mut d), None);
        assert_eq!(lts.pending(), 2);
        assert_eq!(ctx.memory.in_use(), 0);
        assert!(d.ready().is_empty());
    }

    #[test]
    fn boundary_is_inclusive() {
        let mut ctx = MachineCtx::new(100, 0);
        let mut d = Dispatcher::new();
        let mut lts = AdmissionController::new(0.15);
        lts.submit([job("exact", 85)]);

        assert_eq!(lts.try_admit_one(&mut ctx, &mut d), Some(0));
        assert_eq!(ctx.memory.available(), 15);
    }

    #[test]
    fn zero_memory_job_allocates_nothing() {
        let mut ctx = MachineCtx::new(100, 20);
        let mut d = Dispatcher::new();
        let mut lts = AdmissionController::new(0.15);
        lts.submit([job("free", 0)]);

        assert_eq!(lts.try_admit_one(&mut ctx, &mut d), Some(0));
        assert_eq!(ctx.memory.in_use(), 20);
        assert_eq!(ctx.process(0).arrival_time, 0);
    }
}
