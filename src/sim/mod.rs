pub mod job;
pub mod process;
pub mod report;
pub mod workload;

pub use job::{Burst, BurstKind, Job};
pub use process::{transition, Process, ProcessState, ProcessStats, Stat, Transition, WaitReason};
pub use report::{ProcessReport, Report};
