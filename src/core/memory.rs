use super::state::Mem;
use crate::error::MemoryError;

/// Fixed memory pool with a permanent OS reservation.
///
/// Invariant: `reserved <= in_use <= total`.
#[derive(Debug, Clone)]
pub struct MemoryManager {
    total: Mem,
    reserved: Mem,
    in_use: Mem,
}

impl MemoryManager {
    pub fn new(total: Mem, reserved: Mem) -> Self {
        assert!(
            reserved <= total,
            "OS reservation {reserved} exceeds total memory {total}"
        );
        Self {
            total,
            reserved,
            in_use: reserved,
        }
    }

    pub fn total(&self) -> Mem {
        self.total
    }

    pub fn reserved(&self) -> Mem {
        self.reserved
    }

    pub fn in_use(&self) -> Mem {
        self.in_use
    }

    pub fn available(&self) -> Mem {
        self.total - self.in_use
    }

    /// Memory held outside the OS reservation.
    pub fn freeable(&self) -> Mem {
        self.in_use - self.reserved
    }

    pub fn allocate(&mut self, n: Mem) -> Result<(), MemoryError> {
        if n == 0 {
            return Err(MemoryError::InvalidSize);
        }
        if n > self.available() {
            return Err(MemoryError::OutOfMemory {
                requested: n,
                available: self.available(),
            });
        }
        self.in_use += n;
        Ok(())
    }

    pub fn free(&mut self, n: Mem) -> Result<(), MemoryError> {
        if n == 0 {
            return Err(MemoryError::InvalidSize);
        }
        if n > self.freeable() {
            return Err(MemoryError::FreeBelowReserved {
                requested: n,
                freeable: self.freeable(),
            });
        }
        self.in_use -= n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_reservation_in_use() {
        let mem = MemoryManager::new(1024, 320);
        assert_eq!(mem.in_use(), 320);
        assert_eq!(mem.available(), 704);
        assert_eq!(mem.freeable(), 0);
    }

    #[test]
    fn allocate_then_free_restores_usage() {
        let mut mem = MemoryManager::new(1024, 320);
        mem.allocate(100).unwrap();
        assert_eq!(mem.in_use(), 420);
        mem.free(100).unwrap();
        assert_eq!(mem.in_use(), 320);
    }

    #[test]
    fn failed_allocation_does_not_mutate() {
        let mut mem = MemoryManager::new(100, 10);
        assert_eq!(mem.allocate(0), Err(MemoryError::InvalidSize));
        assert_eq!(
            mem.allocate(91),
            Err(MemoryError::OutOfMemory {
                requested: 91,
                available: 90
            })
        );
        assert_eq!(mem.in_use(), 10);

        mem.allocate(90).unwrap();
        assert_eq!(mem.available(), 0);
    }

    #[test]
    fn free_cannot_touch_reservation() {
        let mut mem = MemoryManager::new(100, 10);
        mem.allocate(20).unwrap();
        assert_eq!(
            mem.free(21),
            Err(MemoryError::FreeBelowReserved {
                requested: 21,
                freeable: 20
            })
        );
        assert_eq!(mem.free(0), Err(MemoryError::InvalidSize));
        assert_eq!(mem.in_use(), 30);
        mem.free(20).unwrap();
        assert_eq!(mem.in_use(), mem.reserved());
    }
}
