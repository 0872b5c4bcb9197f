//! Opcode semantics.
//!
//! Each operation is a short function over registers, flags and the
//! operand the address mode produced. Store and read-modify-write
//! operations perform the final bus write of their instruction here;
//! everything else is pure register and flag math.
//!
//! BRK, JSR, RTS, RTI and JAM do their work inside their mode sequences
//! and have empty bodies. Branches never reach `execute` at all: their
//! condition is evaluated at T1 of the relative mode.

use emu_core::Bus;

use crate::cpu::Mos6502;
use crate::flags::{C, D, I, N, V, Z};
use crate::tables::{Mode, Op};

/// Magic constant for XAA (ANE). The value depends on the individual
/// NMOS die; CPUs in 1541 drives measure $EE.
pub const XAA_MAGIC: u8 = 0xEE;

/// Magic constant for LXA, same die-dependent origin as [`XAA_MAGIC`].
pub const LXA_MAGIC: u8 = 0xEE;

impl Mos6502 {
    /// Run the current operation body, then return to instruction fetch.
    pub(crate) fn execute<B: Bus>(&mut self, bus: &mut B) {
        match self.op {
            Op::Adc => self.adc(),
            Op::Anc => self.anc(),
            Op::And => self.and(),
            Op::Arr => self.arr(),
            Op::Asl => self.asl(bus),
            Op::Asr => self.asr(),
            Op::Bit => self.bit(),
            Op::Clc => self.regs.p.clear(C),
            Op::Cld => self.regs.p.clear(D),
            Op::Cli => self.cli(),
            Op::Clv => self.regs.p.clear(V),
            Op::Cmp => {
                let reg = self.regs.a;
                self.compare(reg);
            }
            Op::Cpx => {
                let reg = self.regs.x;
                self.compare(reg);
            }
            Op::Cpy => {
                let reg = self.regs.y;
                self.compare(reg);
            }
            Op::Dcp => self.dcp(bus),
            Op::Dec => self.dec(bus),
            Op::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Op::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.y);
            }
            Op::Eor => self.eor(),
            Op::Inc => self.inc(bus),
            Op::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Op::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.update_nz(self.regs.y);
            }
            Op::Isb => self.isb(bus),
            Op::Jmp => self.regs.pc = self.ea,
            Op::Las => self.las(),
            Op::Lax => self.lax(),
            Op::Lda => {
                self.regs.a = self.value;
                self.regs.p.update_nz(self.value);
            }
            Op::Ldx => {
                self.regs.x = self.value;
                self.regs.p.update_nz(self.value);
            }
            Op::Ldy => {
                self.regs.y = self.value;
                self.regs.p.update_nz(self.value);
            }
            Op::Lsr => self.lsr(bus),
            Op::Lxa => self.lxa(),
            Op::Ora => self.ora(),
            Op::Pha => {
                let a = self.regs.a;
                self.push8(bus, a);
            }
            Op::Php => {
                let p = self.regs.p.to_byte_brk();
                self.push8(bus, p);
            }
            Op::Pla => {
                let v = self.pull8(bus);
                self.regs.a = v;
                self.regs.p.update_nz(v);
            }
            Op::Plp => {
                let v = self.pull8(bus);
                self.regs.p.pull(v);
            }
            Op::Rla => self.rla(bus),
            Op::Rol => self.rol(bus),
            Op::Ror => self.ror(bus),
            Op::Rra => self.rra(bus),
            Op::Sax => {
                let v = self.regs.a & self.regs.x;
                self.write_value(bus, v);
            }
            Op::Sbc => self.sbc(),
            Op::Sbx => self.sbx(),
            Op::Sec => self.regs.p.set(C),
            Op::Sed => self.regs.p.set(D),
            Op::Sei => self.regs.p.set(I),
            Op::Sha => {
                let v = self.regs.a & self.regs.x;
                self.sh_store(bus, v);
            }
            Op::Shs => self.shs(bus),
            Op::Shx => {
                let v = self.regs.x;
                self.sh_store(bus, v);
            }
            Op::Shy => {
                let v = self.regs.y;
                self.sh_store(bus, v);
            }
            Op::Slo => self.slo(bus),
            Op::Sre => self.sre(bus),
            Op::Sta => {
                let v = self.regs.a;
                self.write_value(bus, v);
            }
            Op::Stx => {
                let v = self.regs.x;
                self.write_value(bus, v);
            }
            Op::Sty => {
                let v = self.regs.y;
                self.write_value(bus, v);
            }
            Op::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
            }
            Op::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
            }
            Op::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.update_nz(self.regs.x);
            }
            Op::Txa => {
                self.regs.a = self.regs.x;
                self.regs.p.update_nz(self.regs.a);
            }
            Op::Txs => self.regs.s = self.regs.x,
            Op::Tya => {
                self.regs.a = self.regs.y;
                self.regs.p.update_nz(self.regs.a);
            }
            Op::Xaa => self.xaa(),
            Op::Brk | Op::Jsr | Op::Rts | Op::Rti | Op::Jam | Op::Nop => {}
            Op::Bcc | Op::Bcs | Op::Beq | Op::Bmi | Op::Bne | Op::Bpl | Op::Bvc | Op::Bvs => {
                unreachable!()
            }
        }
        self.finish();
    }

    /// Write an instruction result: accumulator-mode opcodes target A,
    /// everything else the effective address.
    fn write_value<B: Bus>(&mut self, bus: &mut B, value: u8) {
        if self.mode == Mode::Implied {
            self.regs.a = value;
        } else {
            bus.write(self.ea, value);
        }
    }

    fn push8<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let addr = self.regs.push();
        bus.write(addr, value);
    }

    fn pull8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let addr = self.regs.pop();
        self.bus_read(bus, addr)
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    fn adc(&mut self) {
        if self.regs.p.is_set(D) {
            self.adc_decimal();
        } else {
            self.adc_binary(self.value);
        }
    }

    fn adc_binary(&mut self, value: u8) {
        let a = self.regs.a;
        let carry = u16::from(self.regs.p.is_set(C));
        let sum = u16::from(a) + u16::from(value) + carry;
        let result = sum as u8;

        self.regs.p.set_if(C, sum > 0xFF);
        self.regs
            .p
            .set_if(V, (a ^ result) & (value ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.p.update_nz(result);
    }

    fn adc_decimal(&mut self) {
        let a = self.regs.a;
        let value = self.value;
        let carry = u8::from(self.regs.p.is_set(C));

        // N, Z and V follow the pre-adjust binary sum on NMOS silicon.
        let bin = (u16::from(a) + u16::from(value) + u16::from(carry)) as u8;
        self.regs.p.update_nz(bin);
        self.regs.p.set_if(V, (a ^ bin) & (value ^ bin) & 0x80 != 0);

        let mut lo = (a & 0x0F) + (value & 0x0F) + carry;
        if lo > 9 {
            lo += 6;
        }
        let mut hi = (a >> 4) + (value >> 4) + u8::from(lo > 0x0F);
        if hi > 9 {
            hi += 6;
        }

        self.regs.p.set_if(C, hi > 0x0F);
        self.regs.a = (hi << 4) | (lo & 0x0F);
    }

    fn sbc(&mut self) {
        if self.regs.p.is_set(D) {
            self.sbc_decimal();
        } else {
            // SBC is ADC with the operand ones-complemented.
            self.adc_binary(!self.value);
        }
    }

    fn sbc_decimal(&mut self) {
        let a = self.regs.a;
        let value = self.value;
        let borrow = i16::from(!self.regs.p.is_set(C));

        // All flags follow the binary difference.
        let bin = i16::from(a) - i16::from(value) - borrow;
        self.regs.p.set_if(C, bin >= 0);
        self.regs.p.update_nz(bin as u8);
        self.regs.p.set_if(
            V,
            (i16::from(a) ^ bin) & (i16::from(a) ^ i16::from(value)) & 0x80 != 0,
        );

        let mut lo = i16::from(a & 0x0F) - i16::from(value & 0x0F) - borrow;
        let mut hi = i16::from(a >> 4) - i16::from(value >> 4);
        if lo < 0 {
            lo -= 6;
            hi -= 1;
        }
        if hi < 0 {
            hi -= 6;
        }

        self.regs.a = ((hi << 4) as u8) | ((lo & 0x0F) as u8);
    }

    fn compare(&mut self, reg: u8) {
        let value = self.value;
        self.regs.p.set_if(C, reg >= value);
        self.regs.p.update_nz(reg.wrapping_sub(value));
    }

    // ========================================================================
    // Logic and shifts
    // ========================================================================

    fn and(&mut self) {
        self.regs.a &= self.value;
        self.regs.p.update_nz(self.regs.a);
    }

    fn ora(&mut self) {
        self.regs.a |= self.value;
        self.regs.p.update_nz(self.regs.a);
    }

    fn eor(&mut self) {
        self.regs.a ^= self.value;
        self.regs.p.update_nz(self.regs.a);
    }

    fn bit(&mut self) {
        self.regs.p.set_if(Z, self.regs.a & self.value == 0);
        self.regs.p.set_if(N, self.value & 0x80 != 0);
        self.regs.p.set_if(V, self.value & 0x40 != 0);
    }

    fn asl<B: Bus>(&mut self, bus: &mut B) {
        let value = self.value;
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = value << 1;
        self.regs.p.update_nz(result);
        self.write_value(bus, result);
    }

    fn lsr<B: Bus>(&mut self, bus: &mut B) {
        let value = self.value;
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.p.update_nz(result);
        self.write_value(bus, result);
    }

    fn rol<B: Bus>(&mut self, bus: &mut B) {
        let value = self.value;
        let carry = u8::from(self.regs.p.is_set(C));
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = (value << 1) | carry;
        self.regs.p.update_nz(result);
        self.write_value(bus, result);
    }

    fn ror<B: Bus>(&mut self, bus: &mut B) {
        let value = self.value;
        let carry = if self.regs.p.is_set(C) { 0x80 } else { 0 };
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = (value >> 1) | carry;
        self.regs.p.update_nz(result);
        self.write_value(bus, result);
    }

    fn inc<B: Bus>(&mut self, bus: &mut B) {
        let result = self.value.wrapping_add(1);
        self.regs.p.update_nz(result);
        self.write_value(bus, result);
    }

    fn dec<B: Bus>(&mut self, bus: &mut B) {
        let result = self.value.wrapping_sub(1);
        self.regs.p.update_nz(result);
        self.write_value(bus, result);
    }

    fn cli(&mut self) {
        // The flag clears now (visible to the next instruction), but one
        // instruction runs before a pending IRQ is honoured.
        self.regs.p.clear(I);
        self.cli_masking = true;
    }

    // ========================================================================
    // Undocumented operations
    // ========================================================================

    fn anc(&mut self) {
        self.regs.a &= self.value;
        self.regs.p.update_nz(self.regs.a);
        self.regs.p.set_if(C, self.regs.a & 0x80 != 0);
    }

    fn asr(&mut self) {
        let v = self.regs.a & self.value;
        self.regs.p.set_if(C, v & 0x01 != 0);
        let result = v >> 1;
        self.regs.a = result;
        self.regs.p.update_nz(result);
    }

    fn arr(&mut self) {
        let v = self.regs.a & self.value;
        let carry = if self.regs.p.is_set(C) { 0x80 } else { 0 };
        let result = (v >> 1) | carry;
        self.regs.p.update_nz(result);
        self.regs.p.set_if(C, result & 0x40 != 0);
        self.regs
            .p
            .set_if(V, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
        self.regs.a = result;
    }

    fn lax(&mut self) {
        self.regs.a = self.value;
        self.regs.x = self.value;
        self.regs.p.update_nz(self.value);
    }

    fn las(&mut self) {
        self.regs.s &= self.value;
        self.regs.a = self.regs.s;
        self.regs.x = self.regs.s;
        self.regs.p.update_nz(self.regs.s);
    }

    fn lxa(&mut self) {
        let result = (self.regs.a | LXA_MAGIC) & self.value;
        self.regs.a = result;
        self.regs.x = result;
        self.regs.p.update_nz(result);
    }

    fn xaa(&mut self) {
        let result = (self.regs.a | XAA_MAGIC) & self.regs.x & self.value;
        self.regs.a = result;
        self.regs.p.update_nz(result);
    }

    fn sbx(&mut self) {
        let ax = self.regs.a & self.regs.x;
        self.regs.p.set_if(C, ax >= self.value);
        self.regs.x = ax.wrapping_sub(self.value);
        self.regs.p.update_nz(self.regs.x);
    }

    fn dcp<B: Bus>(&mut self, bus: &mut B) {
        let result = self.value.wrapping_sub(1);
        self.regs.p.set_if(C, self.regs.a >= result);
        self.regs.p.update_nz(self.regs.a.wrapping_sub(result));
        self.write_value(bus, result);
    }

    fn isb<B: Bus>(&mut self, bus: &mut B) {
        self.value = self.value.wrapping_add(1);
        let v = self.value;
        self.write_value(bus, v);
        self.sbc();
    }

    fn slo<B: Bus>(&mut self, bus: &mut B) {
        let value = self.value;
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = value << 1;
        self.regs.a |= result;
        self.regs.p.update_nz(self.regs.a);
        self.write_value(bus, result);
    }

    fn rla<B: Bus>(&mut self, bus: &mut B) {
        let value = self.value;
        let carry = u8::from(self.regs.p.is_set(C));
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = (value << 1) | carry;
        self.regs.a &= result;
        self.regs.p.update_nz(self.regs.a);
        self.write_value(bus, result);
    }

    fn sre<B: Bus>(&mut self, bus: &mut B) {
        let value = self.value;
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.a ^= result;
        self.regs.p.update_nz(self.regs.a);
        self.write_value(bus, result);
    }

    fn rra<B: Bus>(&mut self, bus: &mut B) {
        let value = self.value;
        let carry = if self.regs.p.is_set(C) { 0x80 } else { 0 };
        let result = (value >> 1) | carry;
        // The ADC below consumes the carry shifted out here.
        self.regs.p.set_if(C, value & 0x01 != 0);
        self.write_value(bus, result);
        self.value = result;
        self.adc();
    }

    /// Shared body of the SHA/SHX/SHY stores. The stored value is
    /// `reg & (H + 1)` with `H` the pre-index high byte of the target;
    /// when the index carried into the high byte the corrupted value
    /// also becomes the high byte of the store address.
    fn sh_store<B: Bus>(&mut self, bus: &mut B, reg: u8) {
        let value = reg & ((self.ia >> 8) as u8).wrapping_add(1);
        let addr = if (self.ea ^ self.ia) & 0xFF00 != 0 {
            (u16::from(value) << 8) | (self.ea & 0x00FF)
        } else {
            self.ea
        };
        bus.write(addr, value);
    }

    fn shs<B: Bus>(&mut self, bus: &mut B) {
        let t = self.regs.a & self.regs.x;
        self.regs.s = t;
        self.sh_store(bus, t);
    }
}
