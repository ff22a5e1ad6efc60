//! Instruction word layout.
//!
//! An instruction is decoded once per fetch: the top four bits select the [`Opcode`], and every
//! other field is pulled out by the opcode's handler with the extractors below.

use std::fmt;

/// All sixteen values of the opcode nibble, in encoding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Br = 0x0,
    Add = 0x1,
    Ld = 0x2,
    St = 0x3,
    Jsr = 0x4,
    And = 0x5,
    Ldr = 0x6,
    Str = 0x7,
    Rti = 0x8,
    Not = 0x9,
    Ldi = 0xA,
    Sti = 0xB,
    Jmp = 0xC,
    Res = 0xD,
    Lea = 0xE,
    Trap = 0xF,
}

impl Opcode {
    const ALL: [Opcode; 16] = [
        Opcode::Br,
        Opcode::Add,
        Opcode::Ld,
        Opcode::St,
        Opcode::Jsr,
        Opcode::And,
        Opcode::Ldr,
        Opcode::Str,
        Opcode::Rti,
        Opcode::Not,
        Opcode::Ldi,
        Opcode::Sti,
        Opcode::Jmp,
        Opcode::Res,
        Opcode::Lea,
        Opcode::Trap,
    ];

    /// Opcode of an instruction word. Every word has one, reserved or not.
    #[inline]
    pub fn from_instr(instr: u16) -> Self {
        Self::ALL[(instr >> 12) as usize]
    }

    /// `RTI` and `RES` have no behavior on this machine.
    pub fn is_reserved(self) -> bool {
        matches!(self, Opcode::Rti | Opcode::Res)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Br => "BR",
            Opcode::Add => "ADD",
            Opcode::Ld => "LD",
            Opcode::St => "ST",
            Opcode::Jsr => "JSR",
            Opcode::And => "AND",
            Opcode::Ldr => "LDR",
            Opcode::Str => "STR",
            Opcode::Rti => "RTI",
            Opcode::Not => "NOT",
            Opcode::Ldi => "LDI",
            Opcode::Sti => "STI",
            Opcode::Jmp => "JMP",
            Opcode::Res => "RES",
            Opcode::Lea => "LEA",
            Opcode::Trap => "TRAP",
        };
        f.write_str(name)
    }
}

/// Sign-extend the lowest `bits` bits of `val` to the full 16-bit width.
///
/// Bits above the field are discarded first, so a whole instruction word can be passed in.
#[inline]
pub fn sign_extend(val: u16, bits: u32) -> u16 {
    debug_assert!(bits > 0 && bits <= 16);
    // Sign bit
    let sign = val & (1u16 << (bits - 1));
    // Bits of the field, including the sign bit
    let magnitude = val & ((1u32 << bits) - 1) as u16;
    // Positive input: 0x0000
    // Negative input: sign bit and everything above it is set, eg. bits=5 -> 0xFFF0
    let sign_extension = (!sign).wrapping_add(1);
    magnitude | sign_extension
}

/// Destination register (also the source register of `ST`/`STI`/`STR`), bits [11:9].
#[inline]
pub fn extract_dr(instr: u16) -> u16 {
    (instr >> 9) & 0b111
}

/// First source register, bits [8:6].
#[inline]
pub fn extract_sr1(instr: u16) -> u16 {
    (instr >> 6) & 0b111
}

/// Second source register of the register form of `ADD`/`AND`, bits [2:0].
#[inline]
pub fn extract_sr2(instr: u16) -> u16 {
    instr & 0b111
}

/// Base register of `JMP`/`JSRR`/`LDR`/`STR`. Same bits as [`extract_sr1`].
#[inline]
pub fn extract_base_r(instr: u16) -> u16 {
    extract_sr1(instr)
}

/// Condition mask of `BR`, bits [11:9] as `nzp`.
#[inline]
pub fn extract_cond(instr: u16) -> u16 {
    (instr >> 9) & 0b111
}

/// Bit 5 of `ADD`/`AND`.
#[inline]
pub fn is_imm(instr: u16) -> bool {
    instr & 0x0020 != 0
}

/// Bit 11 of `JSR`: set for `JSR`, clear for `JSRR`.
#[inline]
pub fn is_long(instr: u16) -> bool {
    instr & 0x0800 != 0
}

#[inline]
pub fn extract_imm5(instr: u16) -> u16 {
    sign_extend(instr, 5)
}

#[inline]
pub fn extract_offset6(instr: u16) -> u16 {
    sign_extend(instr, 6)
}

#[inline]
pub fn extract_offset9(instr: u16) -> u16 {
    sign_extend(instr, 9)
}

#[inline]
pub fn extract_offset11(instr: u16) -> u16 {
    sign_extend(instr, 11)
}

#[inline]
pub fn extract_trapvect8(instr: u16) -> u8 {
    (instr & 0xFF) as u8
}
