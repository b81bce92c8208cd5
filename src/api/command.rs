//! The operator command surface.
//!
//! Parsing the typed command belongs to the firmware's command dispatcher;
//! it hands over a subcommand letter and an optional number.

use crate::error::WatchError;
use crate::pool::{CorruptionReport, InitReport};

/// One of the four watcher subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    /// `I`: re-initialize the free pool.
    Initialize,
    /// `F`: report free blocks and corruption.
    Report,
    /// `D`: hex dump of the free pool.
    Dump,
    /// `C<n>`: corrupt `n` bytes; without a count this does nothing.
    Corrupt(Option<u16>),
}

impl Subcommand {
    /// Build a subcommand from the dispatcher's letter and argument.
    ///
    /// The argument is ignored for everything except `C`.
    pub fn from_parts(letter: char, argument: Option<u16>) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'I' => Some(Subcommand::Initialize),
            'F' => Some(Subcommand::Report),
            'D' => Some(Subcommand::Dump),
            'C' => Some(Subcommand::Corrupt(argument)),
            _ => None,
        }
    }

    /// The subcommand letter.
    pub fn letter(&self) -> char {
        match self {
            Subcommand::Initialize => 'I',
            Subcommand::Report => 'F',
            Subcommand::Dump => 'D',
            Subcommand::Corrupt(_) => 'C',
        }
    }
}

/// What [`execute`](crate::FreeMemoryWatcher::execute) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The pool was (re-)initialized.
    Initialized(Result<InitReport, WatchError>),
    /// The pool was checked.
    Checked(CorruptionReport),
    /// The pool was dumped.
    Dumped {
        /// Rows written.
        rows: usize,
    },
    /// Bytes were corrupted on request.
    Corrupted(Result<Vec<usize>, WatchError>),
    /// `C` without a count.
    Skipped,
}
