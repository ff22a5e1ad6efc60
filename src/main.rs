use std::path::PathBuf;

use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use lc3vm::env::Env;
use lc3vm::output::{self, file_message, message, MsgColor};
use lc3vm::{Image, RunState, StdConsole, PC_START};

/// Lc3vm runs binary LC3 images.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.obj` images to load, in order. Later images overwrite earlier ones
    #[arg(required = true)]
    images: Vec<PathBuf>,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Print registers after the program halts
    #[arg(short, long)]
    registers: bool,
    /// Start address, instead of the origin of the first image (eg. `x3000`)
    #[arg(short, long, value_parser = parse_address)]
    entry: Option<u16>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let env = Env::from_process();
    init_tracing(env.log_filter.as_deref());

    let minimal = args.minimal || env.minimal;
    output::set_minimal(minimal);
    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .color(!minimal)
                .build(),
        )
    }))?;

    let mut state = RunState::new(StdConsole::new());
    let mut first_origin = None;
    for path in &args.images {
        file_message(MsgColor::Green, "Loading", path);
        let image = Image::from_file(path)?;
        let origin = state.load(&image);
        first_origin.get_or_insert(origin);
    }

    let entry = args.entry.or(first_origin).unwrap_or(PC_START);
    state.registers_mut().set_pc(entry);

    message(MsgColor::Green, "Running", format!("from 0x{entry:04x}"));
    let result = state.run();
    state.console_mut().release_terminal();
    if result.is_err() {
        // Error itself is reported once, by miette
        let pc = state.registers().pc();
        message(MsgColor::Red, "Stopped", format!("at 0x{pc:04x}"));
    }
    output::halted(result?);

    if args.registers {
        output::print_registers(state.registers());
    }
    Ok(())
}

fn init_tracing(directives: Option<&str>) {
    let filter = directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Accepts `x3000`, `0x3000` or `12288`.
fn parse_address(s: &str) -> Result<u16, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("x"))
        .or_else(|| s.strip_prefix("X"));
    let parsed = match hex {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address `{s}`: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_in_hex_or_decimal() {
        assert_eq!(parse_address("x3000"), Ok(0x3000));
        assert_eq!(parse_address("0x3000"), Ok(0x3000));
        assert_eq!(parse_address("X00ff"), Ok(0x00FF));
        assert_eq!(parse_address("12288"), Ok(0x3000));
        assert!(parse_address("x10000").is_err());
        assert!(parse_address("start").is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
