//! Status messages from the driver.
//!
//! These go to stderr, leaving stdout to the running program.

use std::cell::RefCell;
use std::fmt::Display;
use std::path::Path;

use colored::Colorize;

use crate::registers::Registers;

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

/// Produce minimal output, suited for blackbox tests.
pub fn set_minimal(new_value: bool) -> bool {
    IS_MINIMAL.with(|value| value.replace(new_value))
}

pub fn is_minimal() -> bool {
    IS_MINIMAL.with(|value| *value.borrow())
}

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

/// Print a status line, eg. `     Running target hello.obj`. Skipped if minimal.
pub fn message(color: MsgColor, left: &str, right: impl Display) {
    if is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    eprintln!("{left:>12} {right}");
}

pub fn file_message(color: MsgColor, left: &str, right: &Path) {
    message(color, left, format!("target {}", right.display()));
}

/// Report that the program reached `HALT`. Always printed, as a bare `HALT` line if minimal.
pub fn halted(count: u64) {
    eprintln!("{}", format_halted(count, is_minimal()));
}

fn format_halted(count: u64, minimal: bool) -> String {
    if minimal {
        return "HALT".to_string();
    }
    format!("{:>12} after {count} instructions", "Halted".cyan())
}

/// Dump the register file. Always printed, but without decoration if minimal.
pub fn print_registers(reg: &Registers) {
    eprint!("{}", format_registers(reg, is_minimal()));
}

fn format_registers(reg: &Registers, minimal: bool) -> String {
    if minimal {
        let mut out = String::new();
        for (i, val) in reg.iter().enumerate() {
            out += &format!("R{i} {val}\n");
        }
        out += &format!("PC {}\n", reg.pc());
        out += &format!("CC {:03b}\n", reg.flag() as u8);
        return out;
    }

    let mut out = String::new();
    out += "\x1b[2m┌────────────────────────────┐\x1b[0m\n";
    out += "\x1b[2m│        \x1b[3mhex     int    uint\x1b[0m\x1b[2m │\x1b[0m\n";
    for (i, val) in reg.iter().enumerate() {
        out += &format!(
            "\x1b[2m│\x1b[0m \x1b[1mR{i}\x1b[0m  0x{val:04x}  {:-6}  {val:-6} \x1b[2m│\x1b[0m\n",
            val as i16
        );
    }
    out += &format!(
        "\x1b[2m│\x1b[0m \x1b[1mPC\x1b[0m  0x{:04x}        \x1b[1mCC\x1b[0m  {:03b} \x1b[2m│\x1b[0m\n",
        reg.pc(),
        reg.flag() as u8
    );
    out += "\x1b[2m└────────────────────────────┘\x1b[0m\n";
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_registers() {
        let mut reg = Registers::new(0x3002);
        reg.set(0, 5);
        reg.set(7, 0x3002);
        reg.recompute_flags(0);
        let expected = "R0 5\nR1 0\nR2 0\nR3 0\nR4 0\nR5 0\nR6 0\nR7 12290\nPC 12290\nCC 001\n";
        assert_eq!(format_registers(&reg, true), expected);
    }

    #[test]
    fn decorated_registers_show_signed_value() {
        let mut reg = Registers::default();
        reg.set(3, 0xFFFF);
        let table = format_registers(&reg, false);
        assert!(table.contains("0xffff"));
        assert!(table.contains("    -1"));
        assert!(table.contains("65535"));
    }

    #[test]
    fn halt_notice_is_never_empty() {
        assert_eq!(format_halted(42, true), "HALT");
        let decorated = format_halted(42, false);
        assert!(decorated.contains("Halted"));
        assert!(decorated.ends_with("after 42 instructions"));
    }

    #[test]
    fn minimal_flag_is_replaced() {
        assert!(!set_minimal(true));
        assert!(is_minimal());
        assert!(set_minimal(false));
    }
}
