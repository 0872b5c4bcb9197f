//! CPU core trait.

use crate::Bus;

/// A CPU core driven one bus cycle at a time.
///
/// Each `step` performs exactly one bus access through the supplied bus.
/// The host owns scheduling: it calls `step` once per CPU clock and
/// interleaves peripheral updates between calls.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute exactly one bus cycle.
    fn step<B: Bus>(&mut self, bus: &mut B);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// True when the next `step` will be an instruction fetch (the SYNC
    /// pin on real hardware).
    fn sync(&self) -> bool;

    /// True if the CPU is halted (bus stall or jam) rather than executing.
    fn is_halted(&self) -> bool;

    /// Begin the reset sequence at the next `step`.
    fn reset(&mut self);
}
