use crate::core::Mem;

/// Failures of the memory manager. A failed call never mutates the pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("memory request must be positive")]
    InvalidSize,

    #[error("out of memory: requested {requested}, only {available} available")]
    OutOfMemory { requested: Mem, available: Mem },

    #[error("cannot free {requested}: only {freeable} is held outside the OS reservation")]
    FreeBelowReserved { requested: Mem, freeable: Mem },
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The job definition cannot be simulated as given.
    #[error("invalid job '{name}': {reason}")]
    InvalidJob { name: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}
