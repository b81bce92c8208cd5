//! The watched region between heap end and stack top.

use std::ops::Range;

use crate::api::config::GuardMargins;
use crate::platform::MemoryLayout;
use crate::util::layout::{align_down, align_up};

/// Bytes per dump row; row boundaries are aligned to this.
pub const ROW_BYTES: usize = 16;

/// Address range of the free gap, `start` at the heap end and `end` at the
/// stack top.
///
/// Recomputed on every invocation. `end < start` means the stack has grown
/// into the heap; such a region is never scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Heap end.
    pub start: usize,
    /// Stack top.
    pub end: usize,
}

impl MemoryRegion {
    /// Create a region from explicit boundaries.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Read the current boundaries from a layout provider.
    pub fn locate<L: MemoryLayout + ?Sized>(layout: &L) -> Self {
        Self::new(layout.heap_end(), layout.stack_top())
    }

    /// Whether the stack top is below the heap end.
    pub const fn is_collision(&self) -> bool {
        self.end < self.start
    }

    /// Size of the gap, zero on collision.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the gap is empty (or a collision).
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `addr` lies in `[start, end)`.
    pub const fn contains(&self, addr: usize) -> bool {
        self.start <= addr && addr < self.end
    }

    /// Address `offset` bytes into the region, if still inside it.
    pub fn offset(&self, offset: usize) -> Option<usize> {
        self.start.checked_add(offset).filter(|&addr| self.contains(addr))
    }

    /// `[start + low, end - high)`, or `None` if the margins leave nothing.
    pub fn effective_span(&self, guards: GuardMargins) -> Option<Range<usize>> {
        if self.is_collision() {
            return None;
        }
        let lo = self.start.checked_add(guards.low)?;
        let hi = self.end.checked_sub(guards.high)?;
        (lo < hi).then_some(lo..hi)
    }

    /// Length of the effective span, zero if there is none.
    pub fn usable_len(&self, guards: GuardMargins) -> usize {
        self.effective_span(guards).map_or(0, |span| span.len())
    }

    /// Row-aligned range covering every address in `[low, high]`, where
    /// `low`/`high` are the smaller and larger boundary.
    pub fn aligned_rows(&self) -> Range<usize> {
        let (low, high) = if self.is_collision() {
            (self.end, self.start)
        } else {
            (self.start, self.end)
        };
        align_down(low, ROW_BYTES)..align_up(high.saturating_add(1), ROW_BYTES)
    }
}

impl std::fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}..{:#x}", self.start, self.end)
    }
}

/// Compute the watched region from the layout provider.
pub fn locate_region<L: MemoryLayout + ?Sized>(layout: &L) -> MemoryRegion {
    MemoryRegion::locate(layout)
}
