pub mod driver;
pub mod event;
pub mod memory;
pub mod observer;
pub mod state;

pub use driver::Machine;
pub use event::MachineEvent;
pub use memory::MemoryManager;
pub use observer::Observer;
pub use state::{DeviceKind, DeviceSlot, MachineCtx, Mem, MemDelta, Pid, Ticks};
