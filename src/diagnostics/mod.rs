//! Coded diagnostics for free-memory checks.
//!
//! This module provides:
//! - **Runtime diagnostics**: corruption findings with stable codes
//! - **Sinks**: stderr, the `log` facade, or a custom [`DiagnosticSink`]
//! - **Strict mode**: optional panic-on-error for CI self-tests
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                          |
//! |-------|----------------------------------|
//! | MW0xx | Free pool state                  |
//! | MW1xx | Region boundaries                |
//! | MW2xx | Hardware anomalies               |
//! | MW3xx | Self-test fault injection        |
//! | MW9xx | Internal errors                  |
//!
//! ## Strict mode
//!
//! ```rust
//! use memwatch::{FreeMemoryWatcher, StrictModeGuard, SyntheticMemory, WatchConfig};
//!
//! let watcher = FreeMemoryWatcher::new(SyntheticMemory::new(0x0200, 2000), WatchConfig::avr()).unwrap();
//! let _strict = StrictModeGuard::panic_on_error();
//!
//! // An intact pool raises nothing, so this does not panic.
//! assert!(watcher.check_corruption().intact());
//! ```

pub mod kind;
pub mod emit;
pub mod strict;
pub mod macros;

pub use kind::{Diagnostic, DiagnosticKind};
pub use emit::{emit_with_context, suppress_diagnostics, DiagnosticSink, CollectingSink};
pub use strict::{StrictMode, set_strict_mode, strict_mode, StrictModeGuard, init_from_env};

pub use kind::{MW001, MW002, MW003, MW101, MW201, MW301, MW901};
