//! The free memory watcher: owns the platform and the one-shot
//! initialization flag.

use std::sync::Arc;

use crate::api::command::{CommandOutcome, Subcommand};
use crate::api::config::WatchConfig;
use crate::diagnostics::emit::{emit_with_context, DiagnosticSink};
use crate::diagnostics::kind::{Diagnostic, MW001, MW002, MW003, MW101, MW201, MW301, MW901};
use crate::diagnostics::macros::mw_log;
use crate::dump::{dump_rows, DumpRow};
use crate::error::WatchError;
use crate::output::{NoPacing, Pacer, ReportSink, StatusSink};
use crate::platform::{AddressWidth, Platform};
use crate::pool::{self, check_region, CorruptionReport, FreeBlock, InitReport, PoolStatus};
use crate::region::MemoryRegion;
use crate::sync::mutex::Mutex;

struct WatchState<P> {
    platform: P,
    initialized: bool,
    pacer: Box<dyn Pacer + Send>,
}

/// Watches the free gap between heap and stack for stray writes.
///
/// Every entry point locks the whole region, so initialization, checks,
/// dumps and fault injection never overlap even on a multi-threaded host.
/// The first entry point to run fills the pool with the sentinel; after that
/// only [`initialize`](Self::initialize) rewrites it.
///
/// ```rust
/// use memwatch::{FreeMemoryWatcher, SyntheticMemory, WatchConfig};
///
/// let memory = SyntheticMemory::new(0x1000, 2000);
/// let watcher = FreeMemoryWatcher::new(memory, WatchConfig::default()).unwrap();
///
/// let report = watcher.check_corruption();
/// assert!(report.intact());
/// assert_eq!(report.largest_block().unwrap().len, 1742);
/// ```
pub struct FreeMemoryWatcher<P> {
    state: Mutex<WatchState<P>>,
    config: WatchConfig,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl<P: Platform> FreeMemoryWatcher<P> {
    /// Create a watcher. The pool is not touched until the first call.
    pub fn new(platform: P, config: WatchConfig) -> Result<Self, WatchError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(WatchState {
                platform,
                initialized: false,
                pacer: Box::new(NoPacing),
            }),
            config,
            sink: None,
        })
    }

    /// Builder pattern: yield through `pacer` after every dump row.
    pub fn with_pacer<T: Pacer + Send + 'static>(mut self, pacer: T) -> Self {
        self.state.get_mut().pacer = Box::new(pacer);
        self
    }

    /// Builder pattern: also send diagnostics to `sink`.
    pub fn with_diagnostic_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Whether the pool has been initialized by this watcher.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// The current region, freshly located.
    pub fn region(&self) -> MemoryRegion {
        MemoryRegion::locate(&self.state.lock().platform)
    }

    /// Run `f` on the platform while holding the region lock.
    pub fn with_platform<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state.platform)
    }

    /// Consume the watcher, returning the platform.
    pub fn into_platform(self) -> P {
        self.state.into_inner().platform
    }

    /// Re-fill the pool with the sentinel, whether or not it ran before.
    pub fn initialize(&self) -> Result<InitReport, WatchError> {
        let mut state = self.state.lock();
        self.init_locked(&mut state)
    }

    /// Check the pool for corruption.
    ///
    /// Initializes the pool first if nothing has yet. A stack/heap collision
    /// is reported without scanning or initializing.
    pub fn check_corruption(&self) -> CorruptionReport {
        let mut state = self.state.lock();
        self.ensure_initialized(&mut state);
        self.check_locked(&mut state, |_| {})
    }

    /// Dump the region, one row per 16 bytes.
    pub fn dump(&self) -> Vec<DumpRow> {
        let mut state = self.state.lock();
        self.ensure_initialized(&mut state);
        let region = MemoryRegion::locate(&state.platform);
        let mut rows = Vec::new();
        self.walk_rows(&mut state, region, |row| rows.push(row));
        rows
    }

    /// Dump the region through a formatter. Returns the number of rows.
    pub fn dump_to(&self, out: &mut dyn ReportSink) -> usize {
        let mut state = self.state.lock();
        self.ensure_initialized(&mut state);
        let region = MemoryRegion::locate(&state.platform);
        self.emit_rows(&mut state, region, out)
    }

    /// Dump an arbitrary range under a title, for use from debugging code.
    ///
    /// Does not initialize the pool.
    pub fn dump_range(&self, title: &str, start: usize, end: usize, out: &mut dyn ReportSink) -> usize {
        let mut state = self.state.lock();
        out.emit_text(title);
        out.emit_line();
        self.emit_rows(&mut state, MemoryRegion::new(start, end), out)
    }

    /// Corrupt `count` evenly spaced bytes of the pool.
    pub fn corrupt(&self, count: usize) -> Result<Vec<usize>, WatchError> {
        let mut state = self.state.lock();
        self.ensure_initialized(&mut state);
        self.corrupt_locked(&mut state, count)
    }

    /// Run an operator subcommand, writing the textual report to `out` and a
    /// one-line summary to `status`.
    pub fn execute(
        &self,
        command: Subcommand,
        out: &mut dyn ReportSink,
        status: &mut dyn StatusSink,
    ) -> CommandOutcome {
        let mut state = self.state.lock();
        let width = state.platform.address_width();
        let region = MemoryRegion::locate(&state.platform);

        out.emit_text("start of free space : ");
        out.emit_hex_word(region.start, width);
        out.emit_line();
        out.emit_text("Stack Pointer : ");
        out.emit_hex_word(region.end, width);
        out.emit_line();

        if command != Subcommand::Initialize {
            if let Some(init) = self.ensure_initialized(&mut state) {
                write_init(out, &init, width);
            }
        }

        match command {
            Subcommand::Initialize => {
                let init = self.init_locked(&mut state);
                write_init(out, &init, width);
                status.show_message(match &init {
                    Ok(_) => "Free memory initialized",
                    Err(_) => "Free memory too small",
                });
                CommandOutcome::Initialized(init)
            }
            Subcommand::Report => {
                let mut blocks = Vec::new();
                let report = self.check_locked(&mut state, |block| blocks.push(*block));
                write_check(out, &report, &blocks, width);
                status.show_message(match report.status {
                    PoolStatus::Intact => "Free memory OK",
                    PoolStatus::Collision => "Stack hit heap",
                    _ => "Free memory corrupt",
                });
                CommandOutcome::Checked(report)
            }
            Subcommand::Dump => {
                let rows = self.emit_rows(&mut state, region, out);
                CommandOutcome::Dumped { rows }
            }
            Subcommand::Corrupt(None) | Subcommand::Corrupt(Some(0)) => CommandOutcome::Skipped,
            Subcommand::Corrupt(Some(count)) => {
                out.emit_text("Corrupting free memory block.");
                out.emit_line();
                let result = self.corrupt_locked(&mut state, usize::from(count));
                match &result {
                    Ok(touched) => {
                        for &addr in touched {
                            out.emit_text("Corrupting address: ");
                            out.emit_hex_word(addr, width);
                            out.emit_line();
                        }
                        status.show_message("Free memory corrupted");
                    }
                    Err(err) => {
                        out.emit_text(&err.to_string());
                        out.emit_line();
                        status.show_message("Free memory too small");
                    }
                }
                CommandOutcome::Corrupted(result)
            }
        }
    }

    // =========================================================================
    // Locked helpers
    // =========================================================================

    /// Lazy init. A collided region is left for the check to report; the
    /// flag stays clear so the fill happens once the stack recovers.
    fn ensure_initialized(&self, state: &mut WatchState<P>) -> Option<Result<InitReport, WatchError>> {
        if state.initialized || MemoryRegion::locate(&state.platform).is_collision() {
            return None;
        }
        Some(self.init_locked(state))
    }

    fn init_locked(&self, state: &mut WatchState<P>) -> Result<InitReport, WatchError> {
        state.initialized = true;
        let region = MemoryRegion::locate(&state.platform);

        match pool::initialize(&mut state.platform, region, &self.config) {
            Ok(report) => {
                for anomaly in &report.anomalies {
                    match anomaly.found {
                        Some(found) => self.raise(
                            &MW201,
                            format!("address={:#x} found={:#04x}", anomaly.address, found),
                        ),
                        None => self.raise(
                            &MW901,
                            format!("address={:#x} inside the free pool is not readable", anomaly.address),
                        ),
                    }
                }
                Ok(report)
            }
            Err(err) => {
                self.raise(
                    &MW001,
                    format!("region={} size={} guards={}", region, region.len(), self.config.guards.total()),
                );
                Err(err)
            }
        }
    }

    fn check_locked<F: FnMut(&FreeBlock)>(
        &self,
        state: &mut WatchState<P>,
        mut on_block: F,
    ) -> CorruptionReport {
        let region = MemoryRegion::locate(&state.platform);
        let exempt = state.platform.command_buffer();
        let mut report = check_region(&state.platform, region, exempt.as_ref(), &self.config, |block| {
            mw_log!(debug, "found {} bytes free at {:#x}", block.len, block.start);
            on_block(block);
        });

        match report.status {
            PoolStatus::Intact => {
                mw_log!(
                    info,
                    "free memory intact: {} bytes free",
                    report.largest_block().map_or(0, |block| block.len)
                );
            }
            PoolStatus::NoFreeBlock => {
                self.raise(&MW002, format!("region={}", region));
            }
            PoolStatus::Fragmented(count) => {
                let largest = report.largest_block().map_or_else(String::new, |block| {
                    format!(" largest={} bytes at {:#x}", block.len, block.start)
                });
                self.raise(&MW003, format!("blocks={}{}", count, largest));
            }
            PoolStatus::Collision => {
                self.raise(
                    &MW101,
                    format!("heap_end={:#x} stack_top={:#x}", region.start, region.end),
                );
                if self.config.dump_on_collision {
                    let width = state.platform.address_width();
                    let mut rows = Vec::new();
                    self.walk_rows(state, region, |row| {
                        mw_log!(error, "{}", row.render(width));
                        rows.push(row);
                    });
                    report.forensic_dump = rows;
                }
            }
        }

        report
    }

    fn corrupt_locked(&self, state: &mut WatchState<P>, count: usize) -> Result<Vec<usize>, WatchError> {
        let region = MemoryRegion::locate(&state.platform);
        let touched = pool::corrupt(&mut state.platform, region, count, &self.config)?;
        if !touched.is_empty() {
            self.raise(&MW301, format!("count={} region={}", touched.len(), region));
        }
        Ok(touched)
    }

    fn walk_rows<F: FnMut(DumpRow)>(&self, state: &mut WatchState<P>, region: MemoryRegion, mut visit: F) {
        let WatchState { platform, pacer, .. } = state;
        let exempt = platform.command_buffer();
        for row in dump_rows(&*platform, region, exempt, &self.config) {
            visit(row);
            pacer.pause();
        }
    }

    fn emit_rows(&self, state: &mut WatchState<P>, region: MemoryRegion, out: &mut dyn ReportSink) -> usize {
        let width = state.platform.address_width();
        let mut rows = 0;
        self.walk_rows(state, region, |row| {
            row.emit_to(out, width);
            rows += 1;
        });
        rows
    }

    fn raise(&self, diag: &Diagnostic, context: String) {
        emit_with_context(diag, &context);
        if let Some(sink) = &self.sink {
            sink.emit(diag, &context);
        }
    }
}

fn write_init(out: &mut dyn ReportSink, init: &Result<InitReport, WatchError>, width: AddressWidth) {
    out.emit_text("Initializing free memory block.");
    out.emit_line();
    match init {
        Ok(report) => {
            out.emit_text(&format!("{} bytes of memory initialized.", report.bytes_initialized));
            out.emit_line();
            for anomaly in &report.anomalies {
                out.emit_text("? address : ");
                out.emit_hex_word(anomaly.address, width);
                out.emit_text("=");
                match anomaly.found {
                    Some(byte) => out.emit_hex_byte(byte),
                    None => out.emit_text("--"),
                }
                out.emit_line();
            }
        }
        Err(err) => {
            out.emit_text(&format!("Unable to initialize: {}", err));
            out.emit_line();
        }
    }
}

fn write_check(
    out: &mut dyn ReportSink,
    report: &CorruptionReport,
    blocks: &[FreeBlock],
    width: AddressWidth,
) {
    for block in blocks {
        out.emit_text(&format!("Found {} bytes free at ", block.len));
        out.emit_hex_word(block.start, width);
        out.emit_line();
    }

    match report.status {
        PoolStatus::Intact => {}
        PoolStatus::Collision => {
            out.emit_text("Memory corruption detected with sp<Heap");
            out.emit_line();
            for row in &report.forensic_dump {
                row.emit_to(out, width);
            }
        }
        PoolStatus::NoFreeBlock | PoolStatus::Fragmented(_) => {
            out.emit_text("Memory Corruption detected in free memory area.");
            out.emit_line();
            if let Some(block) = report.largest_block() {
                out.emit_text(&format!("Largest free block is {} bytes at ", block.len));
                out.emit_hex_word(block.start, width);
                out.emit_line();
            }
        }
    }

    out.emit_text(&format!("free memory check = {}", report.code()));
    out.emit_line();
}
