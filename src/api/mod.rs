//! Public API for memwatch.
//!
//! Most users only need [`FreeMemoryWatcher`](watcher::FreeMemoryWatcher)
//! and [`WatchConfig`](config::WatchConfig).

pub mod command;
pub mod config;
pub mod watcher;
