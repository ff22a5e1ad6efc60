//! A virtual machine for the LC3 architecture.
//!
//! Load one or more [`Image`]s into a [`RunState`] and [`run`](RunState::run) it until `HALT`.

// Machine
mod instr;
pub use instr::{sign_extend, Opcode};
mod registers;
pub use registers::{Flag, Registers};
mod memory;
pub use memory::{Memory, KBDR, KBSR, MEMORY_MAX};

// Running
mod runtime;
pub use runtime::{RunState, Status, TrapVector};
mod device;
pub use device::{BufferConsole, Console, Keyboard, StdConsole};
mod term;

// Loading
mod image;
pub use image::Image;

mod error;
pub use error::{LoadError, RunError};

pub mod env;
pub mod output;

/// Default address to load and start user programs.
pub const PC_START: u16 = 0x3000;
