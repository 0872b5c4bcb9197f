//! Opcode dispatch tables.
//!
//! Two 256-entry tables drive the state machine: one names the T1
//! address-mode micro-program for each opcode, the other names the
//! operation executed once the address mode completes. The CPU's cursor
//! is a `(Mode, cycle)` pair; each `step` matches on it and performs one
//! bus access.

/// Address-mode micro-programs, plus the non-instruction sequences the
/// cursor can point at (fetch, interrupts, reset, jam).
///
/// Entries marked `Rmw` perform the NMOS read / dummy-write / write
/// sequence. The `Ind*Rmw` forms only exist for undocumented opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Instruction fetch; T0 of everything except reset. Interrupts are
    /// polled at entry.
    Fetch,
    /// Fetch following an IRQ sequence; re-derives the NMI latch from the
    /// line so pulses confined to the IRQ's vector reads are masked.
    FetchAfterIrq,
    /// Single-byte instructions; dummy read of PC, operand is A.
    Implied,
    Immediate,
    /// Conditional branches; the opcode executes at T1.
    Relative,
    ZpRead,
    ZpWrite,
    ZpRmw,
    ZpXRead,
    ZpXWrite,
    ZpXRmw,
    ZpYRead,
    ZpYWrite,
    AbsRead,
    AbsWrite,
    AbsRmw,
    AbsXRead,
    AbsXWrite,
    AbsXRmw,
    AbsYRead,
    AbsYWrite,
    AbsYRmw,
    IndXRead,
    IndXWrite,
    IndXRmw,
    IndYRead,
    IndYWrite,
    IndYRmw,
    /// PHA/PHP.
    Push,
    /// PLA/PLP.
    Pull,
    JmpAbs,
    JmpInd,
    Jsr,
    Rts,
    Rti,
    Brk,
    /// Entry cycle of a JAM opcode.
    Jam,
    /// Latched JAM state; dummy-reads PC forever until reset.
    Jammed,
    Irq,
    Nmi,
    Reset,
}

/// Operation tags, one per opcode body.
///
/// Branch tags are only consulted for their condition; BRK/JSR/RTS/RTI
/// and JAM do their work inside their mode sequences and have empty
/// bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Adc,
    Anc,
    And,
    Arr,
    Asl,
    Asr,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dcp,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Isb,
    Jam,
    Jmp,
    Jsr,
    Las,
    Lax,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Lxa,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rla,
    Rol,
    Ror,
    Rra,
    Rti,
    Rts,
    Sax,
    Sbc,
    Sbx,
    Sec,
    Sed,
    Sei,
    Sha,
    Shs,
    Shx,
    Shy,
    Slo,
    Sre,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    Xaa,
}

use self::Mode as M;
use self::Op as O;

/// Opcode -> T1 address-mode table.
#[rustfmt::skip]
pub(crate) const MODES: [Mode; 256] = [
    // $00
    M::Brk,      M::IndXRead, M::Jam,      M::IndXRmw,  M::ZpRead,   M::ZpRead,   M::ZpRmw,    M::ZpRmw,
    M::Push,     M::Immediate, M::Implied, M::Immediate, M::AbsRead, M::AbsRead,  M::AbsRmw,   M::AbsRmw,
    // $10
    M::Relative, M::IndYRead, M::Jam,      M::IndYRmw,  M::ZpXRead,  M::ZpXRead,  M::ZpXRmw,   M::ZpXRmw,
    M::Implied,  M::AbsYRead, M::Implied,  M::AbsYRmw,  M::AbsXRead, M::AbsXRead, M::AbsXRmw,  M::AbsXRmw,
    // $20
    M::Jsr,      M::IndXRead, M::Jam,      M::IndXRmw,  M::ZpRead,   M::ZpRead,   M::ZpRmw,    M::ZpRmw,
    M::Pull,     M::Immediate, M::Implied, M::Immediate, M::AbsRead, M::AbsRead,  M::AbsRmw,   M::AbsRmw,
    // $30
    M::Relative, M::IndYRead, M::Jam,      M::IndYRmw,  M::ZpXRead,  M::ZpXRead,  M::ZpXRmw,   M::ZpXRmw,
    M::Implied,  M::AbsYRead, M::Implied,  M::AbsYRmw,  M::AbsXRead, M::AbsXRead, M::AbsXRmw,  M::AbsXRmw,
    // $40
    M::Rti,      M::IndXRead, M::Jam,      M::IndXRmw,  M::ZpRead,   M::ZpRead,   M::ZpRmw,    M::ZpRmw,
    M::Push,     M::Immediate, M::Implied, M::Immediate, M::JmpAbs,  M::AbsRead,  M::AbsRmw,   M::AbsRmw,
    // $50
    M::Relative, M::IndYRead, M::Jam,      M::IndYRmw,  M::ZpXRead,  M::ZpXRead,  M::ZpXRmw,   M::ZpXRmw,
    M::Implied,  M::AbsYRead, M::Implied,  M::AbsYRmw,  M::AbsXRead, M::AbsXRead, M::AbsXRmw,  M::AbsXRmw,
    // $60
    M::Rts,      M::IndXRead, M::Jam,      M::IndXRmw,  M::ZpRead,   M::ZpRead,   M::ZpRmw,    M::ZpRmw,
    M::Pull,     M::Immediate, M::Implied, M::Immediate, M::JmpInd,  M::AbsRead,  M::AbsRmw,   M::AbsRmw,
    // $70
    M::Relative, M::IndYRead, M::Jam,      M::IndYRmw,  M::ZpXRead,  M::ZpXRead,  M::ZpXRmw,   M::ZpXRmw,
    M::Implied,  M::AbsYRead, M::Implied,  M::AbsYRmw,  M::AbsXRead, M::AbsXRead, M::AbsXRmw,  M::AbsXRmw,
    // $80
    M::Immediate, M::IndXWrite, M::Immediate, M::IndXWrite, M::ZpWrite, M::ZpWrite, M::ZpWrite, M::ZpWrite,
    M::Implied,  M::Immediate, M::Implied,  M::Immediate, M::AbsWrite, M::AbsWrite, M::AbsWrite, M::AbsWrite,
    // $90
    M::Relative, M::IndYWrite, M::Jam,     M::IndYWrite, M::ZpXWrite, M::ZpXWrite, M::ZpYWrite, M::ZpYWrite,
    M::Implied,  M::AbsYWrite, M::Implied, M::AbsYWrite, M::AbsXWrite, M::AbsXWrite, M::AbsYWrite, M::AbsYWrite,
    // $A0
    M::Immediate, M::IndXRead, M::Immediate, M::IndXRead, M::ZpRead,  M::ZpRead,   M::ZpRead,   M::ZpRead,
    M::Implied,  M::Immediate, M::Implied,  M::Immediate, M::AbsRead, M::AbsRead,  M::AbsRead,  M::AbsRead,
    // $B0
    M::Relative, M::IndYRead, M::Jam,      M::IndYRead,  M::ZpXRead,  M::ZpXRead,  M::ZpYRead,  M::ZpYRead,
    M::Implied,  M::AbsYRead, M::Implied,  M::AbsYRead,  M::AbsXRead, M::AbsXRead, M::AbsYRead, M::AbsYRead,
    // $C0
    M::Immediate, M::IndXRead, M::Immediate, M::IndXRmw, M::ZpRead,   M::ZpRead,   M::ZpRmw,    M::ZpRmw,
    M::Implied,  M::Immediate, M::Implied,  M::Immediate, M::AbsRead, M::AbsRead,  M::AbsRmw,   M::AbsRmw,
    // $D0
    M::Relative, M::IndYRead, M::Jam,      M::IndYRmw,  M::ZpXRead,  M::ZpXRead,  M::ZpXRmw,   M::ZpXRmw,
    M::Implied,  M::AbsYRead, M::Implied,  M::AbsYRmw,  M::AbsXRead, M::AbsXRead, M::AbsXRmw,  M::AbsXRmw,
    // $E0
    M::Immediate, M::IndXRead, M::Immediate, M::IndXRmw, M::ZpRead,   M::ZpRead,   M::ZpRmw,    M::ZpRmw,
    M::Implied,  M::Immediate, M::Implied,  M::Immediate, M::AbsRead, M::AbsRead,  M::AbsRmw,   M::AbsRmw,
    // $F0
    M::Relative, M::IndYRead, M::Jam,      M::IndYRmw,  M::ZpXRead,  M::ZpXRead,  M::ZpXRmw,   M::ZpXRmw,
    M::Implied,  M::AbsYRead, M::Implied,  M::AbsYRmw,  M::AbsXRead, M::AbsXRead, M::AbsXRmw,  M::AbsXRmw,
];

/// Opcode -> operation table.
#[rustfmt::skip]
pub(crate) const OPS: [Op; 256] = [
    // $00
    O::Brk, O::Ora, O::Jam, O::Slo, O::Nop, O::Ora, O::Asl, O::Slo,
    O::Php, O::Ora, O::Asl, O::Anc, O::Nop, O::Ora, O::Asl, O::Slo,
    // $10
    O::Bpl, O::Ora, O::Jam, O::Slo, O::Nop, O::Ora, O::Asl, O::Slo,
    O::Clc, O::Ora, O::Nop, O::Slo, O::Nop, O::Ora, O::Asl, O::Slo,
    // $20
    O::Jsr, O::And, O::Jam, O::Rla, O::Bit, O::And, O::Rol, O::Rla,
    O::Plp, O::And, O::Rol, O::Anc, O::Bit, O::And, O::Rol, O::Rla,
    // $30
    O::Bmi, O::And, O::Jam, O::Rla, O::Nop, O::And, O::Rol, O::Rla,
    O::Sec, O::And, O::Nop, O::Rla, O::Nop, O::And, O::Rol, O::Rla,
    // $40
    O::Rti, O::Eor, O::Jam, O::Sre, O::Nop, O::Eor, O::Lsr, O::Sre,
    O::Pha, O::Eor, O::Lsr, O::Asr, O::Jmp, O::Eor, O::Lsr, O::Sre,
    // $50
    O::Bvc, O::Eor, O::Jam, O::Sre, O::Nop, O::Eor, O::Lsr, O::Sre,
    O::Cli, O::Eor, O::Nop, O::Sre, O::Nop, O::Eor, O::Lsr, O::Sre,
    // $60
    O::Rts, O::Adc, O::Jam, O::Rra, O::Nop, O::Adc, O::Ror, O::Rra,
    O::Pla, O::Adc, O::Ror, O::Arr, O::Jmp, O::Adc, O::Ror, O::Rra,
    // $70
    O::Bvs, O::Adc, O::Jam, O::Rra, O::Nop, O::Adc, O::Ror, O::Rra,
    O::Sei, O::Adc, O::Nop, O::Rra, O::Nop, O::Adc, O::Ror, O::Rra,
    // $80
    O::Nop, O::Sta, O::Nop, O::Sax, O::Sty, O::Sta, O::Stx, O::Sax,
    O::Dey, O::Nop, O::Txa, O::Xaa, O::Sty, O::Sta, O::Stx, O::Sax,
    // $90
    O::Bcc, O::Sta, O::Jam, O::Sha, O::Sty, O::Sta, O::Stx, O::Sax,
    O::Tya, O::Sta, O::Txs, O::Shs, O::Shy, O::Sta, O::Shx, O::Sha,
    // $A0
    O::Ldy, O::Lda, O::Ldx, O::Lax, O::Ldy, O::Lda, O::Ldx, O::Lax,
    O::Tay, O::Lda, O::Tax, O::Lxa, O::Ldy, O::Lda, O::Ldx, O::Lax,
    // $B0
    O::Bcs, O::Lda, O::Jam, O::Lax, O::Ldy, O::Lda, O::Ldx, O::Lax,
    O::Clv, O::Lda, O::Tsx, O::Las, O::Ldy, O::Lda, O::Ldx, O::Lax,
    // $C0
    O::Cpy, O::Cmp, O::Nop, O::Dcp, O::Cpy, O::Cmp, O::Dec, O::Dcp,
    O::Iny, O::Cmp, O::Dex, O::Sbx, O::Cpy, O::Cmp, O::Dec, O::Dcp,
    // $D0
    O::Bne, O::Cmp, O::Jam, O::Dcp, O::Nop, O::Cmp, O::Dec, O::Dcp,
    O::Cld, O::Cmp, O::Nop, O::Dcp, O::Nop, O::Cmp, O::Dec, O::Dcp,
    // $E0
    O::Cpx, O::Sbc, O::Nop, O::Isb, O::Cpx, O::Sbc, O::Inc, O::Isb,
    O::Inx, O::Sbc, O::Nop, O::Sbc, O::Cpx, O::Sbc, O::Inc, O::Isb,
    // $F0
    O::Beq, O::Sbc, O::Jam, O::Isb, O::Nop, O::Sbc, O::Inc, O::Isb,
    O::Sed, O::Sbc, O::Nop, O::Isb, O::Nop, O::Sbc, O::Inc, O::Isb,
];
