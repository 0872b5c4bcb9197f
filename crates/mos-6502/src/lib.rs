//! Cycle-accurate NMOS 6502 CPU emulator.
//!
//! The 6502 performs one bus access on every cycle, no matter what it is
//! doing — including the reads it discards. Peripherals sharing the bus
//! can observe (and react to) every one of those accesses, so this
//! emulator reproduces them all: each `step()` advances exactly one
//! cycle and issues exactly one read or write through the host bus.
//!
//! All 151 documented opcodes and the stable undocumented set are
//! implemented, along with the RESET, IRQ, NMI, SO and RDY input
//! signals, the SYNC output, and the interrupt timing idiosyncrasies
//! (CLI delay, branch-taken masking, BRK/IRQ/NMI vector morphing).
//!
//! The host maps devices into the address space via [`emu_core::Bus`];
//! if nothing is mapped at an address, the host's `read` should return
//! the open-bus value (conventionally the high byte of the address).

mod cpu;
pub mod flags;
mod ops;
mod registers;
mod tables;

pub use cpu::Mos6502;
pub use flags::Status;
pub use ops::{LXA_MAGIC, XAA_MAGIC};
pub use registers::Registers;
