//! Watcher configuration.

use crate::error::WatchError;

/// Default sentinel written into untouched memory.
pub const DEFAULT_SENTINEL: u8 = 0xE5;

/// Bytes skipped just above the heap end.
pub const DEFAULT_GUARD_LOW: usize = 8;

/// Bytes left alone just below the stack top, for interrupt frames that land
/// while a check is running.
pub const DEFAULT_GUARD_HIGH: usize = 250;

/// A run must be longer than this to count as a free block.
pub const DEFAULT_MIN_BLOCK: usize = 8;

/// Longest run measured in one step.
pub const DEFAULT_MAX_RUN: usize = 32_000;

/// The two guard margins at either end of the watched region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardMargins {
    /// Margin above the heap end.
    pub low: usize,
    /// Margin below the stack top.
    pub high: usize,
}

impl GuardMargins {
    /// Create guard margins.
    pub const fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    /// Combined size of both margins, saturating at `usize::MAX`.
    pub const fn total(&self) -> usize {
        self.low.saturating_add(self.high)
    }
}

impl Default for GuardMargins {
    fn default() -> Self {
        Self::new(DEFAULT_GUARD_LOW, DEFAULT_GUARD_HIGH)
    }
}

/// Configuration for the free memory watcher.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Byte value marking untouched memory (default: 0xE5)
    pub sentinel: u8,

    /// Guard margins at both ends of the region (default: 8 / 250)
    pub guards: GuardMargins,

    /// Runs must be longer than this to count as a block (default: 8)
    pub min_block: usize,

    /// Cap on a single run measurement (default: 32000)
    pub max_run: usize,

    /// Dump the colliding range when the stack is found below the heap
    pub dump_on_collision: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL,
            guards: GuardMargins::default(),
            min_block: DEFAULT_MIN_BLOCK,
            max_run: DEFAULT_MAX_RUN,
            dump_on_collision: true,
        }
    }
}

impl WatchConfig {
    /// Config for 8 KiB AVR boards. Same as the default.
    pub fn avr() -> Self {
        Self::default()
    }

    /// Config for a hosted simulation with a large address space.
    pub fn host() -> Self {
        Self {
            guards: GuardMargins::new(16, 4096),
            max_run: usize::MAX,
            dump_on_collision: false,
            ..Self::default()
        }
    }

    /// Builder pattern: set the sentinel byte.
    pub fn with_sentinel(mut self, sentinel: u8) -> Self {
        self.sentinel = sentinel;
        self
    }

    /// Builder pattern: set both guard margins.
    pub fn with_guards(mut self, low: usize, high: usize) -> Self {
        self.guards = GuardMargins::new(low, high);
        self
    }

    /// Builder pattern: set the minimum block threshold.
    pub fn with_min_block(mut self, min_block: usize) -> Self {
        self.min_block = min_block;
        self
    }

    /// Builder pattern: set the run measurement cap.
    pub fn with_max_run(mut self, max_run: usize) -> Self {
        self.max_run = max_run;
        self
    }

    /// Builder pattern: enable or disable the forensic dump on collision.
    pub fn with_dump_on_collision(mut self, enable: bool) -> Self {
        self.dump_on_collision = enable;
        self
    }

    /// Check the settings for values that would make every scan meaningless.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.sentinel == 0x00 {
            return Err(WatchError::InvalidConfig("sentinel must not be 0x00"));
        }
        if self.max_run == 0 {
            return Err(WatchError::InvalidConfig("max_run must be non-zero"));
        }
        if self.guards.low.checked_add(self.guards.high).is_none() {
            return Err(WatchError::InvalidConfig("guard margins overflow the address space"));
        }
        if self.max_run <= self.min_block {
            return Err(WatchError::InvalidConfig("max_run must exceed min_block"));
        }
        Ok(())
    }

    /// Apply overrides from `MEMWATCH_*` environment variables.
    ///
    /// Recognised: `MEMWATCH_SENTINEL` (hex, with or without `0x`),
    /// `MEMWATCH_GUARD_LOW`, `MEMWATCH_GUARD_HIGH`, `MEMWATCH_MIN_BLOCK`,
    /// `MEMWATCH_MAX_RUN`.
    pub fn from_env(self) -> Result<Self, WatchError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, WatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MEMWATCH_SENTINEL") {
            let digits = v.trim().trim_start_matches("0x").trim_start_matches("0X");
            self.sentinel = u8::from_str_radix(digits, 16)
                .map_err(|_| WatchError::InvalidConfig("MEMWATCH_SENTINEL is not a hex byte"))?;
        }
        if let Some(v) = lookup("MEMWATCH_GUARD_LOW") {
            self.guards.low = parse_usize(&v, "MEMWATCH_GUARD_LOW is not a number")?;
        }
        if let Some(v) = lookup("MEMWATCH_GUARD_HIGH") {
            self.guards.high = parse_usize(&v, "MEMWATCH_GUARD_HIGH is not a number")?;
        }
        if let Some(v) = lookup("MEMWATCH_MIN_BLOCK") {
            self.min_block = parse_usize(&v, "MEMWATCH_MIN_BLOCK is not a number")?;
        }
        if let Some(v) = lookup("MEMWATCH_MAX_RUN") {
            self.max_run = parse_usize(&v, "MEMWATCH_MAX_RUN is not a number")?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_usize(value: &str, what: &'static str) -> Result<usize, WatchError> {
    value.trim().parse().map_err(|_| WatchError::InvalidConfig(what))
}
