//! Simulated controller example
//!
//! Runs the watcher against a 2 KB synthetic RAM laid out like a small
//! 8-bit board, driving it with the same subcommands an operator would type.
//!
//! Run with: cargo run --example simulated_controller -- F C3 F D
//! Set `RUST_LOG=memwatch=debug` to see every free block as it is found.
//! Without arguments a scripted session runs instead.

use std::io::{self, Write};

use memwatch::{
    diagnostics, AddressWidth, CommandOutcome, FreeMemoryWatcher, ReportSink, StatusSink,
    Subcommand, SyntheticMemory, WatchConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RAM_START: usize = 0x0200;
const RAM_SIZE: usize = 0x0800;
const HEAP_END: usize = 0x0400;
const STACK_TOP: usize = 0x0A00 - 0x40;
const COMMAND_BUFFER: usize = 0x0480;

/// Serial console: the report goes to stdout.
struct Console<W: Write> {
    out: W,
}

impl<W: Write> ReportSink for Console<W> {
    fn emit_hex_byte(&mut self, byte: u8) {
        let _ = write!(self.out, "{:02X}", byte);
    }

    fn emit_hex_word(&mut self, word: usize, width: AddressWidth) {
        let _ = write!(self.out, "{}", width.format(word));
    }

    fn emit_text(&mut self, text: &str) {
        let _ = write!(self.out, "{}", text);
    }

    fn emit_line(&mut self) {
        let _ = writeln!(self.out);
    }
}

/// Status display: one short line at a time.
struct Lcd;

impl StatusSink for Lcd {
    fn show_message(&mut self, text: &str) {
        println!("[LCD] {}", text);
    }
}

/// Parse `C3`, `F`, `d` and friends.
fn parse_command(word: &str) -> Option<Subcommand> {
    let mut chars = word.trim().chars();
    let letter = chars.next()?;
    let rest: String = chars.collect();
    let argument = if rest.is_empty() { None } else { rest.parse().ok() };
    Subcommand::from_parts(letter, argument)
}

fn main() {
    // `init` also bridges the `log` records memwatch emits.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
    diagnostics::init_from_env();

    let config = match WatchConfig::avr().from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bad configuration: {}", err);
            std::process::exit(2);
        }
    };

    let memory = SyntheticMemory::new(RAM_START, RAM_SIZE)
        .with_width(AddressWidth::Bits16)
        .with_boundaries(HEAP_END, STACK_TOP)
        .with_command_buffer(COMMAND_BUFFER..COMMAND_BUFFER + 96);

    let watcher = match FreeMemoryWatcher::new(memory, config) {
        Ok(watcher) => watcher,
        Err(err) => {
            eprintln!("cannot start watcher: {}", err);
            std::process::exit(2);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let script: Vec<String> = if args.is_empty() {
        ["F", "C3", "F", "I", "F"].iter().map(|s| s.to_string()).collect()
    } else {
        args
    };

    let mut console = Console { out: io::stdout() };
    let mut lcd = Lcd;

    for word in &script {
        let Some(command) = parse_command(word) else {
            println!("unknown subcommand: {}", word);
            continue;
        };

        println!("> M100 {}", word);
        // The dispatcher leaves the typed line in its buffer.
        watcher.with_platform(|mem| {
            mem.write_slice(COMMAND_BUFFER, format!("M100 {}\n", word).as_bytes())
        });

        match watcher.execute(command, &mut console, &mut lcd) {
            CommandOutcome::Checked(report) => print!("{}", report),
            CommandOutcome::Skipped => println!("nothing to do"),
            _ => {}
        }
    }

    // Finally let the stack run into the heap.
    println!("> stack overflow");
    watcher.with_platform(|mem| mem.set_stack_top(HEAP_END - 0x20));
    let report = watcher.check_corruption();
    print!("{}", report);
    for row in &report.forensic_dump {
        println!("{}", row.render(AddressWidth::Bits16));
    }
}
