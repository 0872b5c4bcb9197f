//! Cycle-accurate NMOS 6502 CPU.
//!
//! Each `step()` performs exactly one bus access, including the dummy
//! reads real silicon places on the bus. Instructions are sequences of
//! T-stages; the current stage is named by a `(Mode, cycle)` cursor and
//! two 256-entry tables map the fetched opcode to its T1 stage and its
//! operation body.
//!
//! Branch instructions are the anomaly: their opcode executes at T1 and
//! address-mode cycles may follow, which is the root of the 6502's
//! branch-taken interrupt idiosyncrasy (emulated here alongside the CLI
//! delay and the BRK/IRQ/NMI vector morphing).

use emu_core::{Bus, Cpu, Observable, Value};

use crate::flags::{self, I, V};
use crate::tables::{Mode, Op, MODES, OPS};
use crate::{Registers, Status};

/// The MOS 6502 CPU.
///
/// Construction leaves the CPU at the start of its 7-cycle reset
/// sequence; the first seven `step()` calls fetch the reset vector.
#[derive(Debug)]
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,

    /// Current address-mode micro-program.
    pub(crate) mode: Mode,

    /// Operation body to run when the address mode completes.
    pub(crate) op: Op,

    /// T-stage within the current mode (0 is the fetch/entry cycle).
    pub(crate) cycle: u8,

    /// Last fetched instruction byte.
    pub(crate) opcode: u8,

    /// Effective address for the current instruction.
    pub(crate) ea: u16,

    /// Intermediate address: indirect pointers, pre-carry indexed
    /// addresses, and the pre-branch PC.
    pub(crate) ia: u16,

    /// Operand produced by the address mode, consumed by the operation.
    pub(crate) value: u8,

    /// IRQ line level (level-sensitive, owned by external devices).
    pub(crate) irq_line: bool,

    /// NMI line level.
    pub(crate) nmi_line: bool,

    /// NMI line level seen at the previous cycle, for edge detection.
    pub(crate) nmi_seen: bool,

    /// NMI edge latched, awaiting service.
    pub(crate) nmi_pending: bool,

    /// CLI executed; the next interrupt poll lets one instruction run.
    pub(crate) cli_masking: bool,

    /// Taken same-page branch; the next interrupt poll skips once.
    pub(crate) branch_masking: bool,

    /// RDY line pulled low (halt request).
    pub(crate) rdy_asserted: bool,

    /// CPU is stalled on a read cycle waiting for RDY to release.
    pub(crate) rdy_halted: bool,

    /// Address re-issued on every stalled cycle.
    pub(crate) halt_addr: u16,

    /// Total cycles executed (for harnesses and debugging).
    pub(crate) total_cycles: u64,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    /// Create a new CPU at the start of its reset sequence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mode: Mode::Reset,
            op: Op::Nop,
            cycle: 0,
            opcode: 0,
            ea: 0,
            ia: 0,
            value: 0,
            irq_line: false,
            nmi_line: false,
            nmi_seen: false,
            nmi_pending: false,
            cli_masking: false,
            branch_masking: false,
            rdy_asserted: false,
            rdy_halted: false,
            halt_addr: 0,
            total_cycles: 0,
        }
    }

    /// Begin the 7-cycle reset sequence at the next `step()`.
    ///
    /// Reset is the only way out of a JAM. A/X/Y and the D flag keep
    /// their prior values; SP is decremented three times by the
    /// sequence's bus-visible stack reads.
    pub fn reset(&mut self) {
        self.mode = Mode::Reset;
        self.cycle = 0;
        self.nmi_pending = false;
        self.cli_masking = false;
        self.branch_masking = false;
        self.rdy_halted = false;
    }

    /// Execute exactly one bus cycle.
    pub fn step<B: Bus>(&mut self, bus: &mut B) {
        self.total_cycles += 1;

        // NMI is edge-triggered: latch a released->asserted transition.
        if self.nmi_line && !self.nmi_seen {
            self.nmi_pending = true;
        }
        self.nmi_seen = self.nmi_line;

        if self.rdy_halted {
            if self.rdy_asserted {
                // Hold the address bus; the state machine does not move.
                let _ = bus.read(self.halt_addr);
                return;
            }
            self.rdy_halted = false;
        }

        match self.mode {
            Mode::Fetch | Mode::FetchAfterIrq => self.fetch(bus),
            Mode::Implied => self.implied(bus),
            Mode::Immediate => self.immediate(bus),
            Mode::Relative => self.relative(bus),
            Mode::ZpRead => self.zp_read(bus),
            Mode::ZpWrite => self.zp_write(bus),
            Mode::ZpRmw => self.zp_rmw(bus),
            Mode::ZpXRead => {
                let idx = self.regs.x;
                self.zp_indexed_read(bus, idx);
            }
            Mode::ZpYRead => {
                let idx = self.regs.y;
                self.zp_indexed_read(bus, idx);
            }
            Mode::ZpXWrite => {
                let idx = self.regs.x;
                self.zp_indexed_write(bus, idx);
            }
            Mode::ZpYWrite => {
                let idx = self.regs.y;
                self.zp_indexed_write(bus, idx);
            }
            Mode::ZpXRmw => self.zpx_rmw(bus),
            Mode::AbsRead => self.abs_read(bus),
            Mode::AbsWrite => self.abs_write(bus),
            Mode::AbsRmw => self.abs_rmw(bus),
            Mode::AbsXRead => {
                let idx = self.regs.x;
                self.abs_indexed_read(bus, idx);
            }
            Mode::AbsYRead => {
                let idx = self.regs.y;
                self.abs_indexed_read(bus, idx);
            }
            Mode::AbsXWrite => {
                let idx = self.regs.x;
                self.abs_indexed_write(bus, idx);
            }
            Mode::AbsYWrite => {
                let idx = self.regs.y;
                self.abs_indexed_write(bus, idx);
            }
            Mode::AbsXRmw => {
                let idx = self.regs.x;
                self.abs_indexed_rmw(bus, idx);
            }
            Mode::AbsYRmw => {
                let idx = self.regs.y;
                self.abs_indexed_rmw(bus, idx);
            }
            Mode::IndXRead => self.ind_x_read(bus),
            Mode::IndXWrite => self.ind_x_write(bus),
            Mode::IndXRmw => self.ind_x_rmw(bus),
            Mode::IndYRead => self.ind_y_read(bus),
            Mode::IndYWrite => self.ind_y_write(bus),
            Mode::IndYRmw => self.ind_y_rmw(bus),
            Mode::Push => self.push_stage(bus),
            Mode::Pull => self.pull_stage(bus),
            Mode::JmpAbs => self.jmp_abs(bus),
            Mode::JmpInd => self.jmp_ind(bus),
            Mode::Jsr => self.jsr(bus),
            Mode::Rts => self.rts(bus),
            Mode::Rti => self.rti(bus),
            Mode::Brk | Mode::Irq | Mode::Nmi => self.interrupt(bus),
            Mode::Jam => self.jam_entry(bus),
            Mode::Jammed => {
                // Locked up until reset; keep reading the stuck PC.
                let _ = bus.read(self.regs.pc);
            }
            Mode::Reset => self.reset_stage(bus),
        }
    }

    /// Assert the level-sensitive IRQ line.
    pub fn assert_irq(&mut self) {
        self.irq_line = true;
    }

    /// Release the IRQ line.
    pub fn release_irq(&mut self) {
        self.irq_line = false;
    }

    /// Assert the NMI line. Service fires once per released->asserted
    /// edge.
    pub fn assert_nmi(&mut self) {
        self.nmi_line = true;
    }

    /// Release the NMI line.
    pub fn release_nmi(&mut self) {
        self.nmi_line = false;
    }

    /// Pulse the SO pin: sets the V flag immediately.
    pub fn set_so(&mut self) {
        self.regs.p.set(V);
    }

    /// Drive the RDY line. While asserted the CPU halts on read cycles;
    /// write cycles always complete.
    pub fn rdy(&mut self, asserted: bool) {
        self.rdy_asserted = asserted;
    }

    /// True when the next `step()` will be an instruction fetch (the
    /// SYNC pin).
    #[must_use]
    pub fn sync(&self) -> bool {
        matches!(self.mode, Mode::Fetch | Mode::FetchAfterIrq) && !self.rdy_halted
    }

    /// True while RDY-halted or jammed.
    #[must_use]
    pub fn halted(&self) -> bool {
        self.rdy_halted || self.mode == Mode::Jammed
    }

    /// The I flag: true when IRQs are ignored.
    #[must_use]
    pub fn irq_disabled(&self) -> bool {
        self.regs.p.is_set(I)
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    /// Accumulator.
    #[must_use]
    pub fn a(&self) -> u8 {
        self.regs.a
    }

    /// X index register.
    #[must_use]
    pub fn x(&self) -> u8 {
        self.regs.x
    }

    /// Y index register.
    #[must_use]
    pub fn y(&self) -> u8 {
        self.regs.y
    }

    /// Stack pointer.
    #[must_use]
    pub fn sp(&self) -> u8 {
        self.regs.s
    }

    /// Processor status register.
    #[must_use]
    pub fn status(&self) -> Status {
        self.regs.p
    }

    /// Snapshot of all registers.
    #[must_use]
    pub fn registers(&self) -> Registers {
        self.regs
    }

    /// Total cycles executed since construction.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    // ========================================================================
    // Dispatcher internals
    // ========================================================================

    /// One bus read, recording the address for RDY stalling.
    pub(crate) fn bus_read<B: Bus>(&mut self, bus: &mut B, addr: u16) -> u8 {
        if self.rdy_asserted {
            self.rdy_halted = true;
            self.halt_addr = addr;
        }
        bus.read(addr)
    }

    /// Return to the instruction-fetch stage.
    pub(crate) fn finish(&mut self) {
        self.mode = Mode::Fetch;
        self.cycle = 0;
    }

    /// Instruction fetch, with the interrupt poll at entry.
    fn fetch<B: Bus>(&mut self, bus: &mut B) {
        if self.mode == Mode::FetchAfterIrq {
            // NMI pulses confined to the IRQ's vector-read cycles are
            // lost; a line still held is serviced now.
            self.nmi_pending = self.nmi_line;
        }
        let irq_masked = self.cli_masking || self.branch_masking;
        self.cli_masking = false;
        self.branch_masking = false;

        if self.nmi_pending {
            self.bus_read(bus, self.regs.pc);
            self.mode = Mode::Nmi;
            self.cycle = 1;
            return;
        }
        if self.irq_line && !self.regs.p.is_set(I) && !irq_masked {
            self.bus_read(bus, self.regs.pc);
            self.mode = Mode::Irq;
            self.cycle = 1;
            return;
        }

        self.opcode = self.bus_read(bus, self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.mode = MODES[usize::from(self.opcode)];
        self.op = OPS[usize::from(self.opcode)];
        self.cycle = 1;
    }

    // ========================================================================
    // Address-mode stages
    // ========================================================================

    /// Single-byte instructions: dummy read of PC, operand is A.
    fn implied<B: Bus>(&mut self, bus: &mut B) {
        self.bus_read(bus, self.regs.pc);
        self.value = self.regs.a;
        self.execute(bus);
    }

    fn immediate<B: Bus>(&mut self, bus: &mut B) {
        self.value = self.bus_read(bus, self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.execute(bus);
    }

    /// Conditional branches. The condition is evaluated at T1; a taken
    /// branch runs T2, and T3 only when the target crosses a page.
    fn relative<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.value = self.bus_read(bus, self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                if self.branch_taken() {
                    self.ia = self.regs.pc;
                    let target = self.branch_target();
                    self.regs.pc = (self.ia & 0xFF00) | (target & 0x00FF);
                    if self.regs.pc == target {
                        // A 3-cycle taken branch delays an asserted IRQ
                        // by one instruction.
                        self.branch_masking = true;
                    }
                    self.cycle = 2;
                } else {
                    self.finish();
                }
            }
            2 => {
                // Dummy read of the same-page target.
                self.bus_read(bus, self.regs.pc);
                if self.regs.pc == self.branch_target() {
                    self.finish();
                } else {
                    self.cycle = 3;
                }
            }
            3 => {
                // Dummy read at the wrong-page address, then fix PCH.
                self.bus_read(bus, self.regs.pc);
                self.regs.pc = self.branch_target();
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    fn branch_target(&self) -> u16 {
        self.ia.wrapping_add(i16::from(self.value as i8) as u16)
    }

    fn branch_taken(&self) -> bool {
        let p = self.regs.p;
        match self.op {
            Op::Bpl => !p.is_set(flags::N),
            Op::Bmi => p.is_set(flags::N),
            Op::Bvc => !p.is_set(V),
            Op::Bvs => p.is_set(V),
            Op::Bcc => !p.is_set(flags::C),
            Op::Bcs => p.is_set(flags::C),
            Op::Bne => !p.is_set(flags::Z),
            Op::Beq => p.is_set(flags::Z),
            _ => unreachable!(),
        }
    }

    fn zp_read<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.value = self.bus_read(bus, self.ea);
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn zp_write<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn zp_rmw<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.value = self.bus_read(bus, self.ea);
                self.cycle = 3;
            }
            3 => {
                // The unmodified value is written back first.
                bus.write(self.ea, self.value);
                self.cycle = 4;
            }
            4 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn zp_indexed_read<B: Bus>(&mut self, bus: &mut B, idx: u8) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                // Dummy read of the un-indexed address while adding the
                // index; the sum wraps within page zero.
                self.bus_read(bus, self.ea);
                self.ea = (self.ea + u16::from(idx)) & 0x00FF;
                self.cycle = 3;
            }
            3 => {
                self.value = self.bus_read(bus, self.ea);
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn zp_indexed_write<B: Bus>(&mut self, bus: &mut B, idx: u8) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.bus_read(bus, self.ea);
                self.ea = (self.ea + u16::from(idx)) & 0x00FF;
                self.cycle = 3;
            }
            3 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn zpx_rmw<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.bus_read(bus, self.ea);
                self.ea = (self.ea + u16::from(self.regs.x)) & 0x00FF;
                self.cycle = 3;
            }
            3 => {
                self.value = self.bus_read(bus, self.ea);
                self.cycle = 4;
            }
            4 => {
                bus.write(self.ea, self.value);
                self.cycle = 5;
            }
            5 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn abs_read<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.ea |= u16::from(self.bus_read(bus, self.regs.pc)) << 8;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 3;
            }
            3 => {
                self.value = self.bus_read(bus, self.ea);
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn abs_write<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.ea |= u16::from(self.bus_read(bus, self.regs.pc)) << 8;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 3;
            }
            3 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn abs_rmw<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.ea |= u16::from(self.bus_read(bus, self.regs.pc)) << 8;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 3;
            }
            3 => {
                self.value = self.bus_read(bus, self.ea);
                self.cycle = 4;
            }
            4 => {
                bus.write(self.ea, self.value);
                self.cycle = 5;
            }
            5 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn abs_indexed_read<B: Bus>(&mut self, bus: &mut B, idx: u8) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                let base = self.ea | (u16::from(self.bus_read(bus, self.regs.pc)) << 8);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.ea = base.wrapping_add(u16::from(idx));
                self.ia = (base & 0xFF00) | (self.ea & 0x00FF);
                self.cycle = 3;
            }
            3 => {
                // The read lands at the pre-carry address; without a page
                // cross it is the real operand fetch.
                let data = self.bus_read(bus, self.ia);
                if self.ia == self.ea {
                    self.value = data;
                    self.execute(bus);
                } else {
                    self.cycle = 4;
                }
            }
            4 => {
                self.value = self.bus_read(bus, self.ea);
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn abs_indexed_write<B: Bus>(&mut self, bus: &mut B, idx: u8) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                let base = self.ea | (u16::from(self.bus_read(bus, self.regs.pc)) << 8);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.ea = base.wrapping_add(u16::from(idx));
                self.ia = (base & 0xFF00) | (self.ea & 0x00FF);
                self.cycle = 3;
            }
            3 => {
                // Stores always spend this cycle on the pre-carry read.
                self.bus_read(bus, self.ia);
                self.cycle = 4;
            }
            4 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn abs_indexed_rmw<B: Bus>(&mut self, bus: &mut B, idx: u8) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                let base = self.ea | (u16::from(self.bus_read(bus, self.regs.pc)) << 8);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.ea = base.wrapping_add(u16::from(idx));
                self.ia = (base & 0xFF00) | (self.ea & 0x00FF);
                self.cycle = 3;
            }
            3 => {
                self.bus_read(bus, self.ia);
                self.cycle = 4;
            }
            4 => {
                self.value = self.bus_read(bus, self.ea);
                self.cycle = 5;
            }
            5 => {
                bus.write(self.ea, self.value);
                self.cycle = 6;
            }
            6 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn ind_x_read<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ia = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                // Dummy read of the un-indexed pointer while adding X.
                self.bus_read(bus, self.ia);
                self.ia = (self.ia + u16::from(self.regs.x)) & 0x00FF;
                self.cycle = 3;
            }
            3 => {
                self.ea = u16::from(self.bus_read(bus, self.ia));
                self.ia = (self.ia + 1) & 0x00FF;
                self.cycle = 4;
            }
            4 => {
                self.ea |= u16::from(self.bus_read(bus, self.ia)) << 8;
                self.cycle = 5;
            }
            5 => {
                self.value = self.bus_read(bus, self.ea);
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn ind_x_write<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ia = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.bus_read(bus, self.ia);
                self.ia = (self.ia + u16::from(self.regs.x)) & 0x00FF;
                self.cycle = 3;
            }
            3 => {
                self.ea = u16::from(self.bus_read(bus, self.ia));
                self.ia = (self.ia + 1) & 0x00FF;
                self.cycle = 4;
            }
            4 => {
                self.ea |= u16::from(self.bus_read(bus, self.ia)) << 8;
                self.cycle = 5;
            }
            5 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn ind_x_rmw<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ia = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.bus_read(bus, self.ia);
                self.ia = (self.ia + u16::from(self.regs.x)) & 0x00FF;
                self.cycle = 3;
            }
            3 => {
                self.ea = u16::from(self.bus_read(bus, self.ia));
                self.ia = (self.ia + 1) & 0x00FF;
                self.cycle = 4;
            }
            4 => {
                self.ea |= u16::from(self.bus_read(bus, self.ia)) << 8;
                self.cycle = 5;
            }
            5 => {
                self.value = self.bus_read(bus, self.ea);
                self.cycle = 6;
            }
            6 => {
                bus.write(self.ea, self.value);
                self.cycle = 7;
            }
            7 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn ind_y_read<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ia = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.ea = u16::from(self.bus_read(bus, self.ia));
                self.cycle = 3;
            }
            3 => {
                let hi = self.bus_read(bus, (self.ia + 1) & 0x00FF);
                let base = self.ea | (u16::from(hi) << 8);
                self.ea = base.wrapping_add(u16::from(self.regs.y));
                self.ia = (base & 0xFF00) | (self.ea & 0x00FF);
                self.cycle = 4;
            }
            4 => {
                let data = self.bus_read(bus, self.ia);
                if self.ia == self.ea {
                    self.value = data;
                    self.execute(bus);
                } else {
                    self.cycle = 5;
                }
            }
            5 => {
                self.value = self.bus_read(bus, self.ea);
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn ind_y_write<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ia = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.ea = u16::from(self.bus_read(bus, self.ia));
                self.cycle = 3;
            }
            3 => {
                let hi = self.bus_read(bus, (self.ia + 1) & 0x00FF);
                let base = self.ea | (u16::from(hi) << 8);
                self.ea = base.wrapping_add(u16::from(self.regs.y));
                self.ia = (base & 0xFF00) | (self.ea & 0x00FF);
                self.cycle = 4;
            }
            4 => {
                // Unlike the absolute-indexed stores, the Y carry is
                // already applied here: the dummy read lands on the
                // corrected address.
                self.bus_read(bus, self.ea);
                self.cycle = 5;
            }
            5 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn ind_y_rmw<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ia = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.ea = u16::from(self.bus_read(bus, self.ia));
                self.cycle = 3;
            }
            3 => {
                let hi = self.bus_read(bus, (self.ia + 1) & 0x00FF);
                let base = self.ea | (u16::from(hi) << 8);
                self.ea = base.wrapping_add(u16::from(self.regs.y));
                self.ia = (base & 0xFF00) | (self.ea & 0x00FF);
                self.cycle = 4;
            }
            4 => {
                // Y carry already applied; the dummy read is post-carry.
                self.bus_read(bus, self.ea);
                self.cycle = 5;
            }
            5 => {
                self.value = self.bus_read(bus, self.ea);
                self.cycle = 6;
            }
            6 => {
                bus.write(self.ea, self.value);
                self.cycle = 7;
            }
            7 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn push_stage<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.bus_read(bus, self.regs.pc);
                self.cycle = 2;
            }
            2 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn pull_stage<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.bus_read(bus, self.regs.pc);
                self.cycle = 2;
            }
            2 => {
                self.bus_read(bus, self.regs.stack_addr());
                self.cycle = 3;
            }
            3 => self.execute(bus),
            _ => unreachable!(),
        }
    }

    fn jmp_abs<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.ea |= u16::from(self.bus_read(bus, self.regs.pc)) << 8;
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn jmp_ind<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ia = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.ia |= u16::from(self.bus_read(bus, self.regs.pc)) << 8;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 3;
            }
            3 => {
                self.ea = u16::from(self.bus_read(bus, self.ia));
                self.cycle = 4;
            }
            4 => {
                // NMOS bug: the pointer's low byte wraps without carrying
                // into the high byte.
                let hi_addr = (self.ia & 0xFF00) | (self.ia.wrapping_add(1) & 0x00FF);
                self.ea |= u16::from(self.bus_read(bus, hi_addr)) << 8;
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn jsr<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.ea = u16::from(self.bus_read(bus, self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.bus_read(bus, self.regs.stack_addr());
                self.cycle = 3;
            }
            3 => {
                let addr = self.regs.push();
                bus.write(addr, (self.regs.pc >> 8) as u8);
                self.cycle = 4;
            }
            4 => {
                let addr = self.regs.push();
                bus.write(addr, self.regs.pc as u8);
                self.cycle = 5;
            }
            5 => {
                self.ea |= u16::from(self.bus_read(bus, self.regs.pc)) << 8;
                self.regs.pc = self.ea;
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn rts<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.bus_read(bus, self.regs.pc);
                self.cycle = 2;
            }
            2 => {
                self.bus_read(bus, self.regs.stack_addr());
                self.cycle = 3;
            }
            3 => {
                let addr = self.regs.pop();
                self.regs.pc = u16::from(self.bus_read(bus, addr));
                self.cycle = 4;
            }
            4 => {
                let addr = self.regs.pop();
                self.regs.pc |= u16::from(self.bus_read(bus, addr)) << 8;
                self.cycle = 5;
            }
            5 => {
                // RTS returns to the pulled address + 1.
                self.bus_read(bus, self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn rti<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.bus_read(bus, self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.bus_read(bus, self.regs.stack_addr());
                self.cycle = 3;
            }
            3 => {
                let addr = self.regs.pop();
                let status = self.bus_read(bus, addr);
                self.regs.p.pull(status);
                self.cycle = 4;
            }
            4 => {
                let addr = self.regs.pop();
                self.regs.pc = u16::from(self.bus_read(bus, addr));
                self.cycle = 5;
            }
            5 => {
                let addr = self.regs.pop();
                self.regs.pc |= u16::from(self.bus_read(bus, addr)) << 8;
                self.execute(bus);
            }
            _ => unreachable!(),
        }
    }

    fn jam_entry<B: Bus>(&mut self, bus: &mut B) {
        self.bus_read(bus, self.regs.pc);
        self.mode = Mode::Jammed;
    }

    // ========================================================================
    // BRK / IRQ / NMI / RESET sequences
    // ========================================================================

    /// The unified BRK/IRQ/NMI push sequence. T4 is the morph point: an
    /// NMI that latched during the pushes steals the vector from
    /// whichever entry started the sequence.
    fn interrupt<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.bus_read(bus, self.regs.pc);
                if self.mode == Mode::Brk {
                    // BRK skips a padding byte.
                    self.regs.pc = self.regs.pc.wrapping_add(1);
                }
                self.cycle = 2;
            }
            2 => {
                let addr = self.regs.push();
                bus.write(addr, (self.regs.pc >> 8) as u8);
                self.cycle = 3;
            }
            3 => {
                let addr = self.regs.push();
                bus.write(addr, self.regs.pc as u8);
                self.cycle = 4;
            }
            4 => {
                let pushed = if self.mode == Mode::Brk {
                    self.regs.p.to_byte_brk()
                } else {
                    self.regs.p.clear(flags::B);
                    self.regs.p.to_byte_irq()
                };
                let addr = self.regs.push();
                bus.write(addr, pushed);
                self.regs.p.set(I);
                if self.mode != Mode::Nmi && self.nmi_pending {
                    self.mode = Mode::Nmi;
                }
                self.cycle = 5;
            }
            5 => {
                let vector = if self.mode == Mode::Nmi { 0xFFFA } else { 0xFFFE };
                self.ea = u16::from(self.bus_read(bus, vector));
                self.cycle = 6;
            }
            6 => {
                let (vector, next) = match self.mode {
                    Mode::Nmi => (0xFFFB, Mode::Fetch),
                    Mode::Irq => (0xFFFF, Mode::FetchAfterIrq),
                    _ => (0xFFFF, Mode::Fetch),
                };
                self.regs.pc = self.ea | (u16::from(self.bus_read(bus, vector)) << 8);
                if self.mode == Mode::Nmi {
                    self.nmi_pending = false;
                }
                self.mode = next;
                self.cycle = 0;
            }
            _ => unreachable!(),
        }
    }

    /// The 7-cycle reset sequence: two PC reads, three stack reads that
    /// decrement SP without writing, then the $FFFC/$FFFD vector.
    fn reset_stage<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            0 | 1 => {
                self.bus_read(bus, self.regs.pc);
                self.cycle += 1;
            }
            2 | 3 => {
                self.bus_read(bus, self.regs.stack_addr());
                self.regs.s = self.regs.s.wrapping_sub(1);
                self.cycle += 1;
            }
            4 => {
                self.bus_read(bus, self.regs.stack_addr());
                self.regs.s = self.regs.s.wrapping_sub(1);
                self.regs.p.clear(flags::B);
                self.regs.p.set(I);
                self.cycle = 5;
            }
            5 => {
                self.ea = u16::from(self.bus_read(bus, 0xFFFC));
                self.cycle = 6;
            }
            6 => {
                self.regs.pc = self.ea | (u16::from(self.bus_read(bus, 0xFFFD)) << 8);
                self.finish();
            }
            _ => unreachable!(),
        }
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl Cpu for Mos6502 {
    type Registers = Registers;

    fn step<B: Bus>(&mut self, bus: &mut B) {
        Mos6502::step(self, bus);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn sync(&self) -> bool {
        Mos6502::sync(self)
    }

    fn is_halted(&self) -> bool {
        self.halted()
    }

    fn reset(&mut self) {
        Mos6502::reset(self);
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(self.regs.p.0.into()),
            "flags.c" => Some(self.regs.p.is_set(flags::C).into()),
            "flags.z" => Some(self.regs.p.is_set(flags::Z).into()),
            "flags.i" => Some(self.regs.p.is_set(I).into()),
            "flags.d" => Some(self.regs.p.is_set(flags::D).into()),
            "flags.v" => Some(self.regs.p.is_set(V).into()),
            "flags.n" => Some(self.regs.p.is_set(flags::N).into()),
            "sync" => Some(self.sync().into()),
            "halted" => Some(self.halted().into()),
            "cycle" => Some(Value::U64(self.total_cycles)),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "x", "y", "s", "p", "flags.c", "flags.z", "flags.i", "flags.d", "flags.v",
            "flags.n", "sync", "halted", "cycle",
        ]
    }
}
