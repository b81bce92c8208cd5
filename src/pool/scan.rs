//! Block scanner: counts runs of sentinel bytes.

use std::ops::Range;

use crate::api::config::WatchConfig;
use crate::platform::MemoryBus;

/// A maximal run of sentinel bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    /// First address of the run.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
}

impl FreeBlock {
    /// One past the last address of the run.
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Outcome of one pass over a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanResult {
    /// Runs longer than the minimum block size.
    pub block_count: usize,
    /// The longest of those runs; the first one wins a tie.
    pub largest_block: Option<FreeBlock>,
}

/// Scan `range` and count free blocks.
///
/// See [`scan_runs_with`].
pub fn scan_runs<B: MemoryBus + ?Sized>(
    bus: &B,
    range: Range<usize>,
    exempt: Option<&Range<usize>>,
    config: &WatchConfig,
) -> ScanResult {
    scan_runs_with(bus, range, exempt, config, |_| {})
}

/// Scan `range` and count free blocks, calling `on_block` for each one.
///
/// A run starts on a sentinel byte and extends until a non-sentinel byte,
/// the end of `range`, or `config.max_run` bytes, whichever comes first.
/// Runs no longer than `config.min_block` are stray sentinel-valued bytes in
/// overwritten memory and are not counted. Bytes inside `exempt` extend a
/// run but never start one. Unreadable bytes end a run.
///
/// Every byte is visited once, so the work is linear in `range.len()`.
pub fn scan_runs_with<B, F>(
    bus: &B,
    range: Range<usize>,
    exempt: Option<&Range<usize>>,
    config: &WatchConfig,
    mut on_block: F,
) -> ScanResult
where
    B: MemoryBus + ?Sized,
    F: FnMut(&FreeBlock),
{
    let is_exempt = |addr: usize| exempt.map_or(false, |zone| zone.contains(&addr));
    let mut result = ScanResult::default();
    let mut addr = range.start;

    while addr < range.end {
        if is_exempt(addr) || bus.read_byte(addr) != Some(config.sentinel) {
            addr += 1;
            continue;
        }

        let cap = (range.end - addr).min(config.max_run);
        let mut len = 1;
        while len < cap {
            let next = addr + len;
            if !is_exempt(next) && bus.read_byte(next) != Some(config.sentinel) {
                break;
            }
            len += 1;
        }

        if len > config.min_block {
            let block = FreeBlock { start: addr, len };
            result.block_count += 1;
            if result.largest_block.map_or(true, |largest| len > largest.len) {
                result.largest_block = Some(block);
            }
            on_block(&block);
        }

        addr += len;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SyntheticMemory;

    const BASE: usize = 0x1000;

    fn memory(bytes: &[u8]) -> SyntheticMemory {
        let mut mem = SyntheticMemory::new(BASE, bytes.len());
        mem.write_slice(BASE, bytes);
        mem
    }

    fn config() -> WatchConfig {
        WatchConfig::default()
    }

    #[test]
    fn test_single_block() {
        let mem = memory(&[0xE5; 100]);
        let result = scan_runs(&mem, BASE..BASE + 100, None, &config());
        assert_eq!(result.block_count, 1);
        assert_eq!(result.largest_block, Some(FreeBlock { start: BASE, len: 100 }));
    }

    #[test]
    fn test_no_block() {
        let mem = memory(&[0x00; 64]);
        let result = scan_runs(&mem, BASE..BASE + 64, None, &config());
        assert_eq!(result, ScanResult::default());
    }

    #[test]
    fn test_short_runs_are_ignored() {
        // 8 sentinels is not more than the threshold; 9 is.
        let mut bytes = vec![0u8; 40];
        bytes[2..10].fill(0xE5);
        bytes[20..29].fill(0xE5);
        let mem = memory(&bytes);

        let result = scan_runs(&mem, BASE..BASE + 40, None, &config());
        assert_eq!(result.block_count, 1);
        assert_eq!(result.largest_block, Some(FreeBlock { start: BASE + 20, len: 9 }));
    }

    #[test]
    fn test_fragmented_pool() {
        let mut bytes = vec![0xE5; 300];
        bytes[100] = 1;
        bytes[200] = 2;
        let mem = memory(&bytes);

        let mut seen = Vec::new();
        let result = scan_runs_with(&mem, BASE..BASE + 300, None, &config(), |b| seen.push(*b));
        assert_eq!(result.block_count, 3);
        assert_eq!(
            seen,
            vec![
                FreeBlock { start: BASE, len: 100 },
                FreeBlock { start: BASE + 101, len: 99 },
                FreeBlock { start: BASE + 201, len: 99 },
            ]
        );
        // First block wins over the later, shorter ones.
        assert_eq!(result.largest_block, Some(seen[0]));
    }

    #[test]
    fn test_run_stops_at_range_end() {
        let mem = memory(&[0xE5; 64]);
        let result = scan_runs(&mem, BASE + 10..BASE + 30, None, &config());
        assert_eq!(result.largest_block, Some(FreeBlock { start: BASE + 10, len: 20 }));
    }

    #[test]
    fn test_run_cap_splits_long_runs() {
        let mem = memory(&[0xE5; 100]);
        let config = config().with_max_run(40);
        let result = scan_runs(&mem, BASE..BASE + 100, None, &config);
        assert_eq!(result.block_count, 3);
        assert_eq!(result.largest_block, Some(FreeBlock { start: BASE, len: 40 }));
    }

    #[test]
    fn test_exempt_zone_does_not_fragment() {
        let mut bytes = vec![0xE5; 100];
        bytes[40..60].copy_from_slice(b"G1 X10 Y20 F3000\n\0\0\0");
        let mem = memory(&bytes);
        let zone = BASE + 40..BASE + 60;

        let exempt = scan_runs(&mem, BASE..BASE + 100, Some(&zone), &config());
        assert_eq!(exempt.block_count, 1);
        assert_eq!(exempt.largest_block, Some(FreeBlock { start: BASE, len: 100 }));

        let strict = scan_runs(&mem, BASE..BASE + 100, None, &config());
        assert_eq!(strict.block_count, 2);
    }

    #[test]
    fn test_exempt_zone_never_starts_a_run() {
        let mem = memory(&[0xE5; 32]);
        let zone = BASE..BASE + 32;
        let result = scan_runs(&mem, BASE..BASE + 32, Some(&zone), &config());
        assert_eq!(result.block_count, 0);
    }

    #[test]
    fn test_unreadable_bytes_end_runs() {
        let mem = memory(&[0xE5; 20]);
        let result = scan_runs(&mem, BASE + 5..BASE + 40, None, &config());
        assert_eq!(result.largest_block, Some(FreeBlock { start: BASE + 5, len: 15 }));
    }
}
