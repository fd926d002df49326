use std::fmt;

use average::{Estimate, Mean};

use super::process::{Process, ProcessState};
use crate::core::{Machine, Pid, Ticks};

/// Final statistics of one process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub pid: Pid,
    pub name: String,
    pub arrival_time: Ticks,
    pub bursts: usize,
    pub cpu_dispatches: u64,
    pub cpu_time: Ticks,
    pub io_dispatches: u64,
    pub io_time: Ticks,
    pub memory_waits: u64,
    pub preemptions: u64,
    pub completion_time: Ticks,
    pub final_state: ProcessState,
}

impl ProcessReport {
    fn from_process(process: &Process) -> Self {
        let stats = process.stats();
        Self {
            pid: process.pid,
            name: process.job.name().to_string(),
            arrival_time: process.arrival_time,
            bursts: process.job.burst_count(),
            cpu_dispatches: stats.cpu_dispatches,
            cpu_time: stats.cpu_ticks,
            io_dispatches: stats.io_dispatches,
            io_time: stats.io_ticks,
            memory_waits: stats.memory_waits,
            preemptions: stats.preemptions,
            completion_time: process
                .completion_time()
                .expect("reported process must have finished"),
            final_state: process.state(),
        }
    }

    pub fn turnaround(&self) -> Ticks {
        self.completion_time - self.arrival_time
    }
}

impl fmt::Display for ProcessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Process ID: {}", self.pid)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Arrival Time: {}", self.arrival_time)?;
        writeln!(f, "Number of Bursts: {}", self.bursts)?;
        writeln!(f, "Number of times in CPU: {}", self.cpu_dispatches)?;
        writeln!(f, "Time spent in CPU: {}", self.cpu_time)?;
        writeln!(f, "Number of times performed IO: {}", self.io_dispatches)?;
        writeln!(f, "Time spent performing IO: {}", self.io_time)?;
        writeln!(f, "Number of times waiting for memory: {}", self.memory_waits)?;
        writeln!(f, "Number of times preempted: {}", self.preemptions)?;
        writeln!(f, "Completion Time: {}", self.completion_time)?;
        write!(f, "Final State: {}", self.final_state)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Killed processes first, then terminated ones, each in completion order.
    pub processes: Vec<ProcessReport>,
    pub cpu_utilization: f64,
    pub elapsed: Ticks,
}

impl Report {
    pub fn from_machine(machine: &Machine) -> Self {
        let dispatcher = &machine.dispatcher;
        let processes = dispatcher
            .killed()
            .iter()
            .chain(dispatcher.terminated())
            .map(|&pid| ProcessReport::from_process(machine.ctx.process(pid)))
            .collect();
        Self {
            processes,
            cpu_utilization: machine.cpu_utilization(),
            elapsed: machine.now(),
        }
    }

    pub fn count(&self, state: ProcessState) -> usize {
        self.processes
            .iter()
            .filter(|p| p.final_state == state)
            .count()
    }

    /// Mean arrival-to-completion time of processes that ran to the end.
    pub fn mean_turnaround(&self) -> f64 {
        self.processes
            .iter()
            .filter(|p| p.final_state == ProcessState::Terminated)
            .map(|p| p.turnaround() as f64)
            .collect::<Mean>()
            .estimate()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of Processes: {}", self.processes.len())?;
        for process in &self.processes {
            writeln!(f)?;
            writeln!(f, "{process}")?;
        }
        writeln!(f)?;
        writeln!(f, "Elapsed Ticks: {}", self.elapsed)?;
        writeln!(
            f,
            "Terminated: {}  Killed: {}",
            self.count(ProcessState::Terminated),
            self.count(ProcessState::Killed)
        )?;
        writeln!(f, "Mean Turnaround: {:.2}", self.mean_turnaround())?;
        write!(f, "CPU Utilization: {:.4}", self.cpu_utilization)
    }
}
