//! Diagnostic kinds and core types.
//!
//! Mirrors rustc's diagnostic levels for familiar UX.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A hard error - something is definitely wrong.
    Error,
    /// A warning - something is probably wrong or suspicious.
    Warning,
    /// Additional context about another diagnostic.
    Note,
    /// Actionable suggestion to fix the issue.
    Help,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note => "note",
            DiagnosticKind::Help => "help",
        }
    }
}

/// A diagnostic message with code, message, and optional context.
///
/// Diagnostic codes follow the pattern:
/// - `MW0xx` - Free pool state
/// - `MW1xx` - Region boundaries
/// - `MW2xx` - Hardware anomalies
/// - `MW3xx` - Self-test fault injection
/// - `MW9xx` - Internal errors
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "MW003").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Create a new note diagnostic.
    pub const fn note(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Note,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Add a note to this diagnostic.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (MW0xx - Free pool)
// =============================================================================

/// MW001: Watched region too small to initialize.
pub const MW001: Diagnostic = Diagnostic::warning(
    "MW001",
    "free memory region too small to initialize"
).with_note("the gap between heap and stack is smaller than both guard margins together")
 .with_help("reduce static allocations or lower the guard margins in WatchConfig");

/// MW002: No free block left in the pool.
pub const MW002: Diagnostic = Diagnostic::error(
    "MW002",
    "no free block detected in free memory area"
).with_note("the whole pool has been overwritten, or nothing was ever initialized")
 .with_help("run the initialize command, then check again to tell the two apart");

/// MW003: Pool split into several free blocks.
pub const MW003: Diagnostic = Diagnostic::error(
    "MW003",
    "memory corruption detected in free memory area"
).with_note("something wrote into the middle of the pool, splitting it into several blocks")
 .with_help("dump the region to locate the overwritten bytes");

// =============================================================================
// Predefined diagnostics (MW1xx - Region boundaries)
// =============================================================================

/// MW101: Stack descended below the heap.
pub const MW101: Diagnostic = Diagnostic::error(
    "MW101",
    "stack pointer below top of heap"
).with_note("the stack has grown down into dynamically allocated memory")
 .with_help("reduce stack depth or heap usage; heap contents are likely already damaged");

// =============================================================================
// Predefined diagnostics (MW2xx - Hardware)
// =============================================================================

/// MW201: Sentinel write did not read back.
pub const MW201: Diagnostic = Diagnostic::warning(
    "MW201",
    "sentinel byte did not read back after initialization"
).with_note("nothing else can have written the pool yet, so the RAM cell itself is suspect");

// =============================================================================
// Predefined diagnostics (MW3xx - Self-test)
// =============================================================================

/// MW301: Corruption injected on request.
pub const MW301: Diagnostic = Diagnostic::note(
    "MW301",
    "corrupting free memory block"
).with_note("expect the next check to report one more free block than bytes written");

// =============================================================================
// Predefined diagnostics (MW9xx - Internal)
// =============================================================================

/// MW901: Internal watcher error.
pub const MW901: Diagnostic = Diagnostic::error(
    "MW901",
    "internal free memory watcher error"
).with_note("this indicates a bug in memwatch or in the platform adapter");
