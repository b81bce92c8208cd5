//! The sentinel-filled free pool: initialization, scanning, classification
//! and fault injection.
//!
//! These are free functions over a [`MemoryBus`](crate::platform::MemoryBus)
//! and an explicit [`MemoryRegion`](crate::region::MemoryRegion); the
//! [`FreeMemoryWatcher`](crate::FreeMemoryWatcher) adds locking, lazy
//! initialization and diagnostics on top.

pub mod check;
pub mod corrupt;
pub mod init;
pub mod scan;

pub use check::{check_region, classify, CorruptionReport, PoolStatus};
pub use corrupt::corrupt;
pub use init::{initialize, InitReport, WriteAnomaly};
pub use scan::{scan_runs, scan_runs_with, FreeBlock, ScanResult};
