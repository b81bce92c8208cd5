//! Corruption reporter: collision fast-check and block classification.

use std::ops::Range;

use crate::api::config::WatchConfig;
use crate::dump::DumpRow;
use crate::error::WatchError;
use crate::platform::MemoryBus;
use crate::region::MemoryRegion;

use super::scan::{scan_runs_with, FreeBlock, ScanResult};

/// Classification of the free pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Exactly one free block: nothing has broken the pool up.
    Intact,
    /// No free block at all.
    NoFreeBlock,
    /// Several free blocks: something wrote into the middle of the pool.
    Fragmented(usize),
    /// The stack top is below the heap end; the pool was not scanned.
    Collision,
}

impl PoolStatus {
    /// Numeric result: 0 when intact, -1 for no block, the block count when
    /// fragmented, -2 for a collision.
    pub fn code(&self) -> i32 {
        match self {
            PoolStatus::Intact => 0,
            PoolStatus::NoFreeBlock => WatchError::NoFreeBlockDetected.code(),
            PoolStatus::Fragmented(count) => {
                WatchError::MultipleFreeBlocksDetected { count: *count }.code()
            }
            PoolStatus::Collision => -2,
        }
    }

    /// Whether the pool is intact.
    pub fn is_intact(&self) -> bool {
        matches!(self, PoolStatus::Intact)
    }
}

/// Map a block count to a pool status.
pub fn classify(scan: &ScanResult) -> PoolStatus {
    match scan.block_count {
        0 => PoolStatus::NoFreeBlock,
        1 => PoolStatus::Intact,
        n => PoolStatus::Fragmented(n),
    }
}

/// Result of a corruption check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptionReport {
    /// Region that was checked.
    pub region: MemoryRegion,
    /// Classification.
    pub status: PoolStatus,
    /// Raw scan numbers (empty on collision).
    pub scan: ScanResult,
    /// Rows dumped after a collision, if the config asked for them.
    pub forensic_dump: Vec<DumpRow>,
}

impl CorruptionReport {
    /// Whether the pool is intact.
    pub fn intact(&self) -> bool {
        self.status.is_intact()
    }

    /// Number of free blocks found.
    pub fn block_count(&self) -> usize {
        self.scan.block_count
    }

    /// Longest free block found.
    pub fn largest_block(&self) -> Option<FreeBlock> {
        self.scan.largest_block
    }

    /// Numeric result code, see [`PoolStatus::code`].
    pub fn code(&self) -> i32 {
        self.status.code()
    }

    /// The error matching a non-intact status.
    pub fn error(&self) -> Option<WatchError> {
        match self.status {
            PoolStatus::Intact => None,
            PoolStatus::NoFreeBlock => Some(WatchError::NoFreeBlockDetected),
            PoolStatus::Fragmented(count) => Some(WatchError::MultipleFreeBlocksDetected { count }),
            PoolStatus::Collision => Some(WatchError::StackHeapCollision {
                start: self.region.start,
                end: self.region.end,
            }),
        }
    }

    /// `Ok(scan)` when intact, the matching error otherwise.
    pub fn into_result(self) -> Result<ScanResult, WatchError> {
        match self.error() {
            None => Ok(self.scan),
            Some(err) => Err(err),
        }
    }
}

impl std::fmt::Display for CorruptionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Free memory check:")?;
        writeln!(f, "  Region:       {}", self.region)?;
        writeln!(f, "  Blocks found: {}", self.scan.block_count)?;
        if let Some(block) = self.scan.largest_block {
            writeln!(f, "  Largest:      {} bytes at {:#x}", block.len, block.start)?;
        }
        match self.error() {
            None => writeln!(f, "  Result:       0")?,
            Some(err) => writeln!(f, "  Result:       {} ({})", self.code(), err)?,
        }
        Ok(())
    }
}

/// Check a region: collision first, then a block scan of the effective span.
///
/// A collision returns immediately without reading memory. A region whose
/// margins leave nothing to scan reports [`PoolStatus::NoFreeBlock`].
pub fn check_region<B, F>(
    bus: &B,
    region: MemoryRegion,
    exempt: Option<&Range<usize>>,
    config: &WatchConfig,
    on_block: F,
) -> CorruptionReport
where
    B: MemoryBus + ?Sized,
    F: FnMut(&FreeBlock),
{
    if region.is_collision() {
        return CorruptionReport {
            region,
            status: PoolStatus::Collision,
            scan: ScanResult::default(),
            forensic_dump: Vec::new(),
        };
    }

    let scan = match region.effective_span(config.guards) {
        Some(span) => scan_runs_with(bus, span, exempt, config, on_block),
        None => ScanResult::default(),
    };

    CorruptionReport {
        region,
        status: classify(&scan),
        scan,
        forensic_dump: Vec::new(),
    }
}
