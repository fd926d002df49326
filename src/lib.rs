pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use crate::core::{Machine, MachineEvent};
pub use config::SystemConfig;
pub use error::{MemoryError, SimError};
pub use sim::{Burst, Job, Report};
