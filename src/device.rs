//! Character devices attached to the machine.
//!
//! [`Keyboard`] is the memory-mapped device behind `KBSR`/`KBDR`, and is only ever polled.
//! [`Console`] adds the blocking input and the output used by the trap routines.

use std::collections::VecDeque;
use std::io::{self, stdin, stdout, IsTerminal, Read, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::term::TermInput;

/// Polled keyboard.
pub trait Keyboard {
    /// Take the pending key, if any.
    ///
    /// Must never block. A device which fails to answer has no key available.
    fn poll(&mut self) -> Option<u8>;
}

/// Input and output streams used by the trap routines.
pub trait Console: Keyboard {
    /// Block until one byte of input is available.
    ///
    /// Returns `None` once input is exhausted.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// Whether the user asked to stop the machine since the last call.
    fn take_interrupt(&mut self) -> bool {
        false
    }
}

/// In-memory console: input is a fixed script, output is captured.
#[derive(Debug, Default)]
pub struct BufferConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl BufferConsole {
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into().into(),
            output: Vec::new(),
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Bytes not yet consumed by the machine.
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Keyboard for BufferConsole {
    fn poll(&mut self) -> Option<u8> {
        self.input.pop_front()
    }
}

impl Console for BufferConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Process stdin/stdout.
///
/// An interactive terminal is read key-by-key without echo. Any other stdin is drained by a
/// reader thread, so that it can be polled without blocking.
#[derive(Debug)]
pub struct StdConsole {
    input: StdInput,
}

#[derive(Debug)]
enum StdInput {
    Terminal(TermInput),
    Piped(PipedInput),
}

impl StdConsole {
    pub fn new() -> Self {
        let input = if stdin().is_terminal() {
            StdInput::Terminal(TermInput::default())
        } else {
            StdInput::Piped(PipedInput::default())
        };
        Self { input }
    }

    /// Return an interactive terminal to its normal mode.
    ///
    /// Reads re-enter raw mode on demand, so this is safe to call at any point.
    pub fn release_terminal(&mut self) {
        if let StdInput::Terminal(term) = &mut self.input {
            term.release();
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard for StdConsole {
    fn poll(&mut self) -> Option<u8> {
        match &mut self.input {
            StdInput::Terminal(term) => term.poll(),
            StdInput::Piped(piped) => piped.poll(),
        }
    }
}

impl Console for StdConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match &mut self.input {
            StdInput::Terminal(term) => term.read_byte(),
            StdInput::Piped(piped) => Ok(piped.read_byte()),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        // Raw mode would drop the carriage return from `\n`
        self.release_terminal();
        stdout().lock().write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        stdout().flush()
    }

    fn take_interrupt(&mut self) -> bool {
        match &mut self.input {
            StdInput::Terminal(term) => term.take_interrupt(),
            StdInput::Piped(_) => false,
        }
    }
}

/// Non-terminal stdin, read on a background thread.
///
/// The thread is only started on first use, so machines which never read input leave stdin
/// untouched.
#[derive(Debug, Default)]
struct PipedInput {
    rx: Option<Receiver<u8>>,
}

impl PipedInput {
    fn receiver(&mut self) -> &Receiver<u8> {
        self.rx.get_or_insert_with(|| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                for byte in stdin().lock().bytes() {
                    let byte = match byte {
                        Ok(byte) => byte,
                        Err(e) => {
                            tracing::warn!("stopped reading stdin: {e}");
                            break;
                        }
                    };
                    if tx.send(byte).is_err() {
                        break;
                    }
                }
            });
            rx
        })
    }

    fn poll(&mut self) -> Option<u8> {
        match self.receiver().try_recv() {
            Ok(byte) => Some(byte),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        // Disconnected once the reader thread reaches end of input
        self.receiver().recv().ok()
    }
}
