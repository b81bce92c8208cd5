//! Integration tests for memwatch.

use std::sync::Arc;
use std::thread;

use memwatch::{
    initialize, scan_runs, CollectingSink, CommandOutcome, FreeMemoryWatcher, MemoryBus,
    MemoryRegion, MessageLog, PoolStatus, Subcommand, SyntheticMemory, TextReport, WatchConfig,
    WatchError,
};

const BASE: usize = 0x0200;

fn watcher(size: usize) -> FreeMemoryWatcher<SyntheticMemory> {
    FreeMemoryWatcher::new(SyntheticMemory::new(BASE, size), WatchConfig::default()).unwrap()
}

#[test]
fn test_initialized_pool_is_one_block() {
    let config = WatchConfig::default();
    let guards = config.guards.total();

    for size in (guards + config.min_block + 1..guards + 600).step_by(7) {
        let mut mem = SyntheticMemory::new(BASE, size);
        let region = MemoryRegion::new(BASE, BASE + size);

        let report = initialize(&mut mem, region, &config).unwrap();
        let scan = scan_runs(&mem, report.span.clone(), None, &config);

        assert_eq!(scan.block_count, 1, "size {}", size);
        assert_eq!(scan.largest_block.unwrap().len, size - guards, "size {}", size);
    }
}

#[test]
fn test_too_small_region_is_untouched() {
    let config = WatchConfig::default();

    for size in 0..=config.guards.total() {
        let mut mem = SyntheticMemory::new(BASE, size + 32).with_fill(0x3C);
        let before = mem.bytes().to_vec();

        let result = initialize(&mut mem, MemoryRegion::new(BASE, BASE + size), &config);
        assert!(matches!(result, Err(WatchError::RegionTooSmall { .. })), "size {}", size);
        assert_eq!(mem.bytes(), &before[..], "size {}", size);
    }
}

#[test]
fn test_check_is_idempotent() {
    let w = watcher(3000);
    w.corrupt(2).unwrap();

    let first = w.check_corruption();
    let second = w.check_corruption();
    assert_eq!(first.scan, second.scan);
    assert_eq!(first, second);
}

#[test]
fn test_corrupt_yields_count_plus_one_blocks() {
    for count in 1..=10 {
        let w = watcher(4000);
        let touched = w.corrupt(count).unwrap();
        assert_eq!(touched.len(), count);

        let report = w.check_corruption();
        assert!(!report.intact());
        assert_eq!(report.block_count(), count + 1);
        assert_eq!(report.code(), (count + 1) as i32);
    }
}

#[test]
fn test_two_thousand_byte_scenario() {
    let w = watcher(2000);

    let report = w.check_corruption();
    assert_eq!(report.code(), 0);
    assert_eq!(report.largest_block().unwrap().len, 1742);

    w.corrupt(3).unwrap();
    let report = w.check_corruption();
    assert_eq!(report.code(), 4);
    assert_eq!(report.status, PoolStatus::Fragmented(4));
    assert_eq!(
        report.into_result(),
        Err(WatchError::MultipleFreeBlocksDetected { count: 4 })
    );
}

#[test]
fn test_collision_is_reported_without_scan() {
    let sink = Arc::new(CollectingSink::new());
    let mem = SyntheticMemory::new(BASE, 0x400)
        .with_fill(0xE5)
        .with_boundaries(BASE + 0x300, BASE + 0x100);
    let w = FreeMemoryWatcher::new(mem, WatchConfig::default().with_dump_on_collision(false))
        .unwrap()
        .with_diagnostic_sink(sink.clone());

    let report = w.check_corruption();
    assert_eq!(report.status, PoolStatus::Collision);
    assert_eq!(report.block_count(), 0);
    assert!(report.largest_block().is_none());
    assert!(report.forensic_dump.is_empty());
    assert_eq!(
        report.error(),
        Some(WatchError::StackHeapCollision { start: BASE + 0x300, end: BASE + 0x100 })
    );
    assert_eq!(sink.codes(), vec!["MW101"]);
}

#[test]
fn test_collision_forensic_dump() {
    let mem = SyntheticMemory::new(BASE, 0x400).with_boundaries(BASE + 0x140, BASE + 0x100);
    let w = FreeMemoryWatcher::new(mem, WatchConfig::default()).unwrap();

    let report = w.check_corruption();
    assert_eq!(report.forensic_dump.len(), 5);
    assert_eq!(report.forensic_dump[0].address, BASE + 0x100);
}

#[test]
fn test_dump_covers_region_once() {
    let mem = SyntheticMemory::new(0, 0x1000).with_boundaries(0x123, 0x9AB);
    let w = FreeMemoryWatcher::new(mem, WatchConfig::default()).unwrap();
    let region = w.region();

    let rows = w.dump();
    let first = rows[0].address;
    let last = rows.last().unwrap().address;

    assert_eq!(first, 0x120);
    assert_eq!(last, 0x9A0);
    assert_eq!(rows.len(), (0x9B0 - 0x120) / 16);
    assert!(rows.windows(2).all(|pair| pair[1].address == pair[0].address + 16));
    assert!(first <= region.start && region.end < last + 16);
}

#[test]
fn test_dump_flags_injected_bytes() {
    let w = watcher(2000);
    let touched = w.corrupt(3).unwrap();
    let rows = w.dump();

    let flagged: usize = rows
        .iter()
        .map(|row| {
            row.glyphs
                .iter()
                .enumerate()
                .filter(|&(i, &g)| g == '?' && touched.contains(&(row.address + i)))
                .count()
        })
        .sum();
    assert_eq!(flagged, 3);
}

#[test]
fn test_command_buffer_is_exempt() {
    let mem = SyntheticMemory::new(BASE, 2000).with_command_buffer(BASE + 500..BASE + 596);
    let w = FreeMemoryWatcher::new(mem, WatchConfig::default()).unwrap();
    assert!(w.check_corruption().intact());

    // Live command text lands in the buffer after initialization.
    w.with_platform(|mem| mem.write_slice(BASE + 500, b"M100 F\n"));
    let report = w.check_corruption();
    assert!(report.intact());

    let rows = w.dump();
    let text: String = rows.iter().flat_map(|row| row.glyphs.iter().copied()).collect();
    assert!(text.contains("M100 F"));

    // Only the zeroed guard margins show up as anomalies.
    let span = BASE + 8..BASE + 2000 - 250;
    let flagged_in_span = rows
        .iter()
        .flat_map(|row| (row.address..row.address + 16).zip(row.glyphs.iter()))
        .filter(|&(addr, &g)| g == '?' && span.contains(&addr))
        .count();
    assert_eq!(flagged_in_span, 0);
}

#[test]
fn test_execute_command_sequence() {
    let w = watcher(2000);
    let mut status = MessageLog::new();

    let mut out = TextReport::new();
    let outcome = w.execute(Subcommand::Initialize, &mut out, &mut status);
    assert!(matches!(outcome, CommandOutcome::Initialized(Ok(_))));
    assert_eq!(status.last(), Some("Free memory initialized"));

    let mut out = TextReport::new();
    let outcome = w.execute(Subcommand::from_parts('C', Some(3)).unwrap(), &mut out, &mut status);
    match outcome {
        CommandOutcome::Corrupted(Ok(addrs)) => assert_eq!(addrs.len(), 3),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(out.lines().iter().filter(|l| l.starts_with("Corrupting address: ")).count(), 3);

    let mut out = TextReport::new();
    w.execute(Subcommand::Report, &mut out, &mut status);
    assert!(out.contains("Memory Corruption detected in free memory area."));
    assert!(out.contains("free memory check = 4"));
    assert_eq!(status.last(), Some("Free memory corrupt"));

    let mut out = TextReport::new();
    let outcome = w.execute(Subcommand::Dump, &mut out, &mut status);
    let rows = match outcome {
        CommandOutcome::Dumped { rows } => rows,
        other => panic!("unexpected outcome: {:?}", other),
    };
    // Two vitals lines, then one line per row.
    assert_eq!(out.lines().len(), 2 + rows);
}

#[test]
fn test_first_command_initializes() {
    let w = watcher(2000);
    let mut out = TextReport::new();
    let mut status = MessageLog::new();

    w.execute(Subcommand::Dump, &mut out, &mut status);
    assert!(w.is_initialized());
    assert!(out.contains("Initializing free memory block."));
}

#[test]
fn test_narrow_address_width() {
    let mem = SyntheticMemory::new(0x1B80, 0x100).with_width(memwatch::AddressWidth::Bits16);
    let w = FreeMemoryWatcher::new(mem, WatchConfig::default().with_guards(8, 16)).unwrap();
    let mut out = TextReport::new();
    w.dump_to(&mut out);

    assert!(out.lines()[0].starts_with("1B80:"));
}

#[test]
fn test_dump_range_does_not_initialize() {
    let w = watcher(2000);
    let mut out = TextReport::new();
    let rows = w.dump_range("   Memory corruption detected", BASE, BASE + 0x3F, &mut out);

    assert_eq!(rows, 4);
    assert_eq!(out.lines()[0], "   Memory corruption detected");
    assert!(!w.is_initialized());
}

#[test]
fn test_shared_across_threads() {
    let w = Arc::new(watcher(8000));
    w.initialize().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let w = Arc::clone(&w);
            thread::spawn(move || {
                for _ in 0..10 {
                    assert!(w.check_corruption().intact());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_into_platform_returns_memory() {
    let w = watcher(2000);
    w.check_corruption();
    let mem = w.into_platform();
    assert_eq!(mem.read_byte(BASE + 8), Some(0xE5));
    assert_eq!(mem.read_byte(BASE + 7), Some(0));
}
