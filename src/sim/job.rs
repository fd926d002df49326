use crate::{
    core::{Mem, MemDelta, Ticks},
    error::SimError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    /// `memory` is applied to the owner's allocation on entry to the burst.
    Cpu { memory: MemDelta },
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Burst {
    kind: BurstKind,
    duration: Ticks,
    remaining: Ticks,
}

impl Burst {
    pub fn cpu(duration: Ticks, memory: MemDelta) -> Self {
        Self {
            kind: BurstKind::Cpu { memory },
            duration,
            remaining: duration,
        }
    }

    pub fn io(duration: Ticks) -> Self {
        Self {
            kind: BurstKind::Io,
            duration,
            remaining: duration,
        }
    }

    pub fn kind(&self) -> BurstKind {
        self.kind
    }

    pub fn is_cpu(&self) -> bool {
        matches!(self.kind, BurstKind::Cpu { .. })
    }

    pub fn duration(&self) -> Ticks {
        self.duration
    }

    pub fn remaining(&self) -> Ticks {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Memory change requested on entry, `None` for IO bursts.
    pub fn memory_delta(&self) -> Option<MemDelta> {
        match self.kind {
            BurstKind::Cpu { memory } => Some(memory),
            BurstKind::Io => None,
        }
    }

    pub fn run(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Ordered bursts of one program, with a forward-only cursor.
#[derive(Debug, Clone)]
pub struct Job {
    name: String,
    bursts: Vec<Burst>,
    cursor: usize,
    total_cpu_time: Ticks,
    total_io_time: Ticks,
    memory_required: Mem,
}

impl Job {
    /// Validates the burst list: it must open with a CPU burst, every burst
    /// must last at least one tick, and the running memory total may never
    /// go negative.
    pub fn new(name: impl Into<String>, bursts: Vec<Burst>) -> Result<Self, SimError> {
        let name = name.into();
        let invalid = |reason: String| SimError::InvalidJob {
            name: name.clone(),
            reason,
        };

        let memory_required = match bursts.first().map(Burst::kind) {
            None => return Err(invalid("a job needs at least one burst".into())),
            Some(BurstKind::Io) => return Err(invalid("first burst must be a CPU burst".into())),
            Some(BurstKind::Cpu { memory }) if memory < 0 => {
                return Err(invalid(format!("initial memory {memory} is negative")))
            }
            Some(BurstKind::Cpu { memory }) => memory as Mem,
        };

        let mut held: MemDelta = 0;
        let mut total_cpu_time = 0;
        let mut total_io_time = 0;
        for (index, burst) in bursts.iter().enumerate() {
            if burst.duration == 0 {
                return Err(invalid(format!("burst {index} has zero duration")));
            }
            match burst.kind {
                BurstKind::Cpu { memory } => {
                    held += memory;
                    if held < 0 {
                        return Err(invalid(format!(
                            "burst {index} releases more memory than the job holds"
                        )));
                    }
                    total_cpu_time += burst.duration;
                }
                BurstKind::Io => total_io_time += burst.duration,
            }
        }

        Ok(Self {
            name,
            bursts,
            cursor: 0,
            total_cpu_time,
            total_io_time,
            memory_required,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn burst_count(&self) -> usize {
        self.bursts.len()
    }

    pub fn total_cpu_time(&self) -> Ticks {
        self.total_cpu_time
    }

    pub fn total_io_time(&self) -> Ticks {
        self.total_io_time
    }

    /// Memory held from admission onwards: the first burst's requirement.
    pub fn memory_required(&self) -> Mem {
        self.memory_required
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &Burst {
        &self.bursts[self.cursor]
    }

    pub fn current_mut(&mut self) -> &mut Burst {
        &mut self.bursts[self.cursor]
    }

    pub fn is_last_burst(&self) -> bool {
        self.cursor == self.bursts.len() - 1
    }

    /// Moves to the next burst and returns it.
    pub fn advance(&mut self) -> &Burst {
        assert!(
            !self.is_last_burst(),
            "job '{}' advanced past its last burst",
            self.name
        );
        self.cursor += 1;
        &self.bursts[self.cursor]
    }
}
