//! # memwatch
//!
//! Free-memory watcher for resource-constrained embedded controllers.
//!
//! On a target without memory protection, the gap between the top of the
//! heap and the top of the stack should never be written by anything. This
//! crate fills that gap with a sentinel byte and later checks that the
//! pattern is still whole, giving forensic evidence of stray writes.
//!
//! ## Features
//!
//! - Region locator driven by an injected [`MemoryLayout`]
//! - Sentinel fill with read-back verification
//! - Block scanner classifying the pool as intact, fragmented or gone
//! - Stack/heap collision fast-check with optional forensic dump
//! - Hex dump with a per-byte verdict column
//! - Fault injector for self-tests
//! - Coded diagnostics, `log` integration, strict mode for CI
//!
//! ## Quick Start
//!
//! ```rust
//! use memwatch::{FreeMemoryWatcher, PoolStatus, SyntheticMemory, WatchConfig};
//!
//! let memory = SyntheticMemory::new(0x0200, 2000);
//! let watcher = FreeMemoryWatcher::new(memory, WatchConfig::avr()).unwrap();
//!
//! // First call fills the pool.
//! assert!(watcher.check_corruption().intact());
//!
//! // Self-test: three stray bytes split the pool into four blocks.
//! watcher.corrupt(3).unwrap();
//! let report = watcher.check_corruption();
//! assert_eq!(report.status, PoolStatus::Fragmented(4));
//! assert_eq!(report.code(), 4);
//! ```

pub mod api;
pub mod diagnostics;
pub mod dump;
pub mod error;
pub mod output;
pub mod platform;
pub mod pool;
pub mod region;

mod sync;
mod util;

// Re-export public API at crate root for convenience
pub use api::command::{CommandOutcome, Subcommand};
pub use api::config::{GuardMargins, WatchConfig};
pub use api::watcher::FreeMemoryWatcher;
pub use error::WatchError;

// Building blocks
pub use dump::{dump_rows, DumpRow, DumpRows};
pub use pool::{
    check_region, classify, corrupt, initialize, scan_runs, scan_runs_with, CorruptionReport,
    FreeBlock, InitReport, PoolStatus, ScanResult, WriteAnomaly,
};
pub use region::{locate_region, MemoryRegion};

// Platform adapter
pub use platform::{AddressWidth, MemoryBus, MemoryLayout, Platform, SyntheticMemory};
#[cfg(feature = "linker-symbols")]
pub use platform::{LinkerLayout, RawMemory};

// Output contracts
pub use output::{MessageLog, NoPacing, Pacer, ReportSink, SleepPacer, StatusSink, TextReport};

// Diagnostics
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, CollectingSink};
pub use diagnostics::{StrictMode, set_strict_mode, StrictModeGuard};
pub use diagnostics::{MW001, MW002, MW003, MW101, MW201, MW301, MW901};
