use std::cmp::Ordering;

/// Condition code, set using the result of the previous register-writing instruction.
///
/// Discriminants line up with the `nzp` mask of a `BR` instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    N = 0b100,
    Z = 0b010,
    P = 0b001,
}

impl Flag {
    /// Condition of a 16-bit value read as two's complement.
    pub fn of(val: u16) -> Self {
        match (val as i16).cmp(&0) {
            Ordering::Less => Flag::N,
            Ordering::Equal => Flag::Z,
            Ordering::Greater => Flag::P,
        }
    }
}

/// General purpose registers, program counter and condition code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    /// 8x 16-bit registers
    reg: [u16; 8],
    /// Address of the next instruction to fetch
    pc: u16,
    /// Condition code
    flag: Flag,
}

impl Registers {
    /// Zeroed registers with the condition code at `Z`.
    pub fn new(pc: u16) -> Self {
        Self {
            reg: [0; 8],
            pc,
            flag: Flag::Z,
        }
    }

    /// Value of general register `index`. Only the low three bits of `index` are used.
    #[inline]
    pub fn get(&self, index: u16) -> u16 {
        self.reg[(index & 0b111) as usize]
    }

    #[inline]
    pub fn set(&mut self, index: u16, val: u16) {
        self.reg[(index & 0b111) as usize] = val;
    }

    /// Set the condition code from the current value of general register `index`.
    #[inline]
    pub fn recompute_flags(&mut self, index: u16) {
        self.flag = Flag::of(self.get(index));
    }

    #[inline]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    #[inline]
    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.flag = flag;
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.reg.iter().copied()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(crate::PC_START)
    }
}
