use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::instr::Opcode;

/// Failure to turn a file into an [`Image`](crate::Image).
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("Could not open image `{}`", path.display())]
    #[diagnostic(code(load::open), help("check that the file exists and is readable"))]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not read image `{}`", path.display())]
    #[diagnostic(code(load::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Image is empty")]
    #[diagnostic(
        code(load::empty),
        help("an image must start with a 16-bit origin address")
    )]
    Empty,

    #[error("Image is not aligned to 16 bits ({len} bytes)")]
    #[diagnostic(
        code(load::misaligned),
        help("images are sequences of big-endian 16-bit words")
    )]
    Misaligned { len: usize },
}

/// Fatal condition which stops the machine.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    #[error("Executed reserved opcode {opcode} at 0x{addr:04x}")]
    #[diagnostic(
        code(run::reserved_opcode),
        help("RTI and RES have no behavior on this machine")
    )]
    ReservedOpcode { opcode: Opcode, addr: u16 },

    #[error("Called a trap with an unknown vector of 0x{vector:02x} at 0x{addr:04x}")]
    #[diagnostic(
        code(run::unknown_trap),
        help("available vectors are GETC (x20), OUT (x21), PUTS (x22), IN (x23), PUTSP (x24) and HALT (x25)")
    )]
    UnknownTrap { vector: u8, addr: u16 },

    #[error("Input ended while the program was waiting for a character")]
    #[diagnostic(code(run::input_closed))]
    InputClosed,

    #[error("Interrupted")]
    #[diagnostic(code(run::interrupted))]
    Interrupted,

    #[error("Failed to read input")]
    #[diagnostic(code(run::input))]
    Input(#[source] io::Error),
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::Interrupted => RunError::Interrupted,
            io::ErrorKind::UnexpectedEof => RunError::InputClosed,
            _ => RunError::Input(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_run_errors() {
        let interrupted = io::Error::from(io::ErrorKind::Interrupted);
        assert!(matches!(RunError::from(interrupted), RunError::Interrupted));
        let eof = io::Error::from(io::ErrorKind::UnexpectedEof);
        assert!(matches!(RunError::from(eof), RunError::InputClosed));
        let other = io::Error::other("tty gone");
        assert!(matches!(RunError::from(other), RunError::Input(_)));
    }

    #[test]
    fn messages_name_the_culprit() {
        let e = RunError::ReservedOpcode {
            opcode: Opcode::Res,
            addr: 0x3004,
        };
        assert_eq!(e.to_string(), "Executed reserved opcode RES at 0x3004");
        let e = RunError::UnknownTrap {
            vector: 0x26,
            addr: 0x3000,
        };
        assert!(e.to_string().contains("0x26"));
    }
}
