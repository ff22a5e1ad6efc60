use super::{RunState, Status};
use crate::device::Console;
use crate::error::RunError;
use crate::instr::extract_trapvect8;

/// System services reachable through `TRAP`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapVector {
    /// Read a character without echo.
    Getc = 0x20,
    /// Write the character in R0.
    Out = 0x21,
    /// Write a string of one character per word.
    Puts = 0x22,
    /// Prompt for a character and echo it.
    In = 0x23,
    /// Write a string of two characters per word.
    Putsp = 0x24,
    Halt = 0x25,
}

impl TryFrom<u8> for TrapVector {
    type Error = u8;
    fn try_from(vector: u8) -> Result<Self, Self::Error> {
        Ok(match vector {
            0x20 => TrapVector::Getc,
            0x21 => TrapVector::Out,
            0x22 => TrapVector::Puts,
            0x23 => TrapVector::In,
            0x24 => TrapVector::Putsp,
            0x25 => TrapVector::Halt,
            _ => return Err(vector),
        })
    }
}

const IN_PROMPT: &[u8] = b"Enter a character: ";

impl<C: Console> RunState<C> {
    pub(super) fn trap(&mut self, instr: u16) -> Result<(), RunError> {
        let addr = self.instr_addr();
        self.reg.set(7, self.reg.pc());

        let vector = TrapVector::try_from(extract_trapvect8(instr))
            .map_err(|vector| RunError::UnknownTrap { vector, addr })?;
        tracing::debug!(addr = format!("0x{addr:04X}"), "trap {vector:?}");

        match vector {
            TrapVector::Getc => {
                let ch = self.read_input()?;
                self.reg.set(0, ch as u16);
                self.reg.recompute_flags(0);
            }
            TrapVector::Out => {
                // Surrogates have no character
                let ch = char::from_u32(u32::from(self.reg.get(0)))
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                let mut bytes = [0u8; 4];
                self.emit(ch.encode_utf8(&mut bytes).as_bytes());
            }
            TrapVector::Puts => {
                let mut string = Vec::new();
                let mut addr = self.reg.get(0);
                loop {
                    let word = self.mem.peek(addr);
                    if word == 0 {
                        break;
                    }
                    string.push((word & 0xFF) as u8);
                    addr = addr.wrapping_add(1);
                }
                self.emit(&string);
            }
            TrapVector::In => {
                self.emit(IN_PROMPT);
                let ch = self.read_input()?;
                self.emit(&[ch]);
                self.reg.set(0, ch as u16);
                self.reg.recompute_flags(0);
            }
            TrapVector::Putsp => {
                let mut string = Vec::new();
                let mut addr = self.reg.get(0);
                'string: loop {
                    let word = self.mem.peek(addr);
                    // Low byte first
                    for ch in [word & 0xFF, word >> 8] {
                        if ch == 0 {
                            break 'string;
                        }
                        string.push(ch as u8);
                    }
                    addr = addr.wrapping_add(1);
                }
                self.emit(&string);
            }
            TrapVector::Halt => {
                self.status = Status::Halted;
            }
        }
        Ok(())
    }

    fn read_input(&mut self) -> Result<u8, RunError> {
        self.console.read_byte()?.ok_or(RunError::InputClosed)
    }

    /// Output is best-effort; the program keeps running if it cannot be written.
    fn emit(&mut self, bytes: &[u8]) {
        let result = self
            .console
            .write_bytes(bytes)
            .and_then(|()| self.console.flush());
        if let Err(e) = result {
            tracing::warn!("failed to write program output: {e}");
        }
    }
}
