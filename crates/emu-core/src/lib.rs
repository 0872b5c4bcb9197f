//! Core traits and types for cycle-accurate emulation.
//!
//! Every component advances one bus cycle at a time; the host drives
//! scheduling and owns the ordering between CPU and peripheral updates.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
