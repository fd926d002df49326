use super::{
    event::MachineEvent,
    observer::Observer,
    state::{DeviceKind, MachineCtx, Mem, Pid, Ticks},
};
use crate::{
    config::SystemConfig,
    error::SimError,
    scheduler::{AdmissionController, Dispatcher},
    sim::{Job, Report, Transition},
};

/// One CPU, one IO device and a shared memory pool, advanced one tick at a
/// time by [`Machine::step`].
pub struct Machine {
    pub ctx: MachineCtx,
    pub dispatcher: Dispatcher,
    pub admission: AdmissionController,
    admission_interval: Ticks,
    boot_delay: Ticks,
    events: Vec<MachineEvent>,
    observer: Observer,
}

impl Machine {
    /// Builds an idle machine, rejecting configurations it cannot run.
    pub fn new(config: &SystemConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            ctx: MachineCtx::new(config.total_memory, config.os_memory),
            dispatcher: Dispatcher::new(),
            admission: AdmissionController::new(config.admission_slack),
            admission_interval: config.admission_interval,
            boot_delay: config.boot_delay,
            events: Vec::new(),
            observer: Observer::new(),
        })
    }

    /// Queues jobs for admission. A job that could not be admitted even into
    /// an otherwise empty machine is rejected up front, since it would block
    /// the backlog forever.
    pub fn submit(&mut self, jobs: impl IntoIterator<Item = Job>) -> Result<(), SimError> {
        let jobs: Vec<Job> = jobs.into_iter().collect();
        let memory = &self.ctx.memory;
        let ceiling = (memory.total() - memory.reserved()) as f64
            - self.admission.slack() * memory.total() as f64;
        if let Some(job) = jobs.iter().find(|j| j.memory_required() as f64 > ceiling) {
            return Err(SimError::InvalidJob {
                name: job.name().to_string(),
                reason: format!(
                    "needs {} memory but at most {ceiling} can ever be admitted",
                    job.memory_required()
                ),
            });
        }
        self.admission.submit(jobs);
        Ok(())
    }

    /// Admits the initial batch, lets the boot delay elapse and fills the
    /// idle devices.
    pub fn boot(&mut self) {
        self.admit_all();
        self.ctx.advance_time(self.boot_delay);
        self.fill_idle_devices();
    }

    /// Advances the machine by one tick. Returns `false`, without touching
    /// the clock, once every job has finished or been killed.
    pub fn step(&mut self) -> bool {
        let mut running = self.ctx.occupant(DeviceKind::Cpu);
        let mut busy = self.ctx.occupant(DeviceKind::Io);

        if running.is_none() && busy.is_none() {
            if self.is_finished() {
                return false;
            }
            self.resolve_deadlock();
            if self.is_finished() {
                return false;
            }
            self.fill_idle_devices();
            running = self.ctx.occupant(DeviceKind::Cpu);
            busy = self.ctx.occupant(DeviceKind::Io);
        }

        let now = self.ctx.now;
        if let Some(pid) = running {
            self.ctx.process_mut(pid).run_tick(now);
            self.ctx.cpu_busy_ticks += 1;
        }
        if let Some(pid) = busy {
            self.ctx.process_mut(pid).run_tick(now);
        }

        self.ctx.advance_time(1);
        if self.ctx.now % self.admission_interval == 0 {
            self.admit_all();
        }

        for (device, occupant) in [(DeviceKind::Cpu, running), (DeviceKind::Io, busy)] {
            if let Some(pid) = occupant {
                if self.ctx.process(pid).remaining() == 0 {
                    self.ctx.clear_device(device);
                    self.complete_burst(pid);
                }
            }
        }

        self.allot_all();
        self.preempt(DeviceKind::Cpu);
        self.preempt(DeviceKind::Io);

        self.observer.observe(&self.ctx, &self.dispatcher);
        true
    }

    /// Steps until nothing is left to run; returns the final clock.
    pub fn run_to_completion(&mut self) -> Ticks {
        while self.step() {}
        tracing::info!(
            elapsed = self.ctx.now,
            terminated = self.dispatcher.terminated().len(),
            killed = self.dispatcher.killed().len(),
            "simulation finished"
        );
        self.ctx.now
    }

    pub fn is_finished(&self) -> bool {
        self.dispatcher.is_terminated() && !self.admission.has_pending()
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    /// Fraction of elapsed ticks during which the CPU held a process.
    pub fn cpu_utilization(&self) -> f64 {
        if self.ctx.now == 0 {
            return 0.0;
        }
        self.ctx.cpu_busy_ticks as f64 / self.ctx.now as f64
    }

    pub fn drain_events(&mut self) -> Vec<MachineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn report(&self) -> Report {
        Report::from_machine(self)
    }

    fn emit(&mut self, event: MachineEvent) {
        tracing::trace!(now = self.ctx.now, ?event);
        self.events.push(event);
    }

    fn admit_all(&mut self) {
        while let Some(pid) = self
            .admission
            .try_admit_one(&mut self.ctx, &mut self.dispatcher)
        {
            let memory = self.ctx.process(pid).memory();
            self.emit(MachineEvent::Admitted { pid, memory });
        }
    }

    fn allot_all(&mut self) {
        while let Some((pid, amount)) = self.dispatcher.allot_memory(&mut self.ctx) {
            tracing::debug!(pid, amount, now = self.ctx.now, "memory allotted");
            self.emit(MachineEvent::MemoryAllotted { pid, amount });
        }
    }

    fn fill_idle_devices(&mut self) {
        for device in [DeviceKind::Cpu, DeviceKind::Io] {
            if self.ctx.occupant(device).is_some() {
                continue;
            }
            if let Some(pid) = self.dispatcher.next_for(device) {
                self.put_on(device, pid);
            }
        }
    }

    fn put_on(&mut self, device: DeviceKind, pid: Pid) {
        let now = self.ctx.now;
        self.ctx.process_mut(pid).apply(Transition::Dispatch, now);
        self.ctx.set_occupant(device, pid);
        tracing::debug!(pid, %device, now, "dispatched");
        self.emit(MachineEvent::Dispatched { pid, device });
    }

    /// Offers `device` to the best queued candidate, displacing the occupant
    /// only when the candidate has strictly less time left.
    fn preempt(&mut self, device: DeviceKind) {
        let Some(candidate) = self.dispatcher.next_for(device) else {
            return;
        };
        let Some(current) = self.ctx.occupant(device) else {
            self.put_on(device, candidate);
            return;
        };

        if self.ctx.process(current).remaining() > self.ctx.process(candidate).remaining() {
            let now = self.ctx.now;
            self.ctx.clear_device(device);
            self.ctx.process_mut(current).apply(Transition::Preempt, now);
            self.dispatcher.requeue(&self.ctx, device, current);
            tracing::debug!(pid = current, by = candidate, %device, now, "preempted");
            self.emit(MachineEvent::Preempted {
                pid: current,
                by: candidate,
                device,
            });
            self.put_on(device, candidate);
        } else {
            self.dispatcher.requeue(&self.ctx, device, candidate);
        }
    }

    /// The occupant's burst is exhausted: finish the process or move it on
    /// to its next burst.
    fn complete_burst(&mut self, pid: Pid) {
        let now = self.ctx.now;
        if self.ctx.process(pid).job.is_last_burst() {
            self.release_all(pid);
            self.ctx.process_mut(pid).apply(Transition::Terminate, now);
            self.dispatcher.record_terminated(pid);
            tracing::info!(pid, now, "process terminated");
            self.emit(MachineEvent::Terminated { pid, at: now });
            return;
        }

        let process = self.ctx.process_mut(pid);
        process.job.advance();
        if !process.on_cpu_burst() {
            process.apply(Transition::AwaitIo, now);
            self.dispatcher.enqueue_io(&self.ctx, pid);
            self.emit(MachineEvent::AwaitingIo { pid });
            return;
        }

        let delta = process.burst_memory();
        let granted = match delta {
            0 => true,
            d if d < 0 => {
                let released = d.unsigned_abs();
                self.ctx
                    .memory
                    .free(released)
                    .expect("a process never releases more than it holds");
                true
            }
            d => self.ctx.memory.allocate(d as Mem).is_ok(),
        };

        let process = self.ctx.process_mut(pid);
        if granted {
            process.adjust_memory(delta);
            process.apply(Transition::Ready, now);
            self.dispatcher.enqueue_ready(&self.ctx, pid);
        } else {
            process.apply(Transition::AwaitMemory, now);
            self.dispatcher.enqueue_memory_wait(&self.ctx, pid);
            tracing::debug!(pid, requested = delta, now, "waiting for memory");
            self.emit(MachineEvent::AwaitingMemory {
                pid,
                requested: delta as Mem,
            });
        }
    }

    fn release_all(&mut self, pid: Pid) -> Mem {
        let held = self.ctx.process(pid).memory();
        if held > 0 {
            self.ctx
                .memory
                .free(held)
                .expect("process memory is always charged to the pool");
        }
        held
    }

    /// Kills the heaviest memory waiters one at a time, re-running allotment
    /// after each kill, until some process can make progress again.
    fn resolve_deadlock(&mut self) {
        if !self.dispatcher.is_deadlocked() {
            return;
        }
        tracing::warn!(
            now = self.ctx.now,
            waiting = self.dispatcher.memory_wait().len(),
            "memory deadlock detected"
        );

        while self.dispatcher.is_deadlocked() {
            let victim = self
                .dispatcher
                .evict_heaviest()
                .expect("a deadlock has at least one memory waiter");
            let now = self.ctx.now;
            let freed = self.release_all(victim);
            self.ctx.process_mut(victim).apply(Transition::Kill, now);
            self.dispatcher.record_killed(victim);
            tracing::info!(pid = victim, freed, now, "killed deadlock victim");
            self.emit(MachineEvent::Killed {
                pid: victim,
                freed,
                at: now,
            });
            self.allot_all();
        }
    }
}
