//! Benchmarks for memwatch.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memwatch::{
    dump_rows, initialize, scan_runs, FreeMemoryWatcher, MemoryRegion, SyntheticMemory,
    WatchConfig,
};

const BASE: usize = 0x0200;

fn bench_scan(c: &mut Criterion) {
    let config = WatchConfig::host();
    let mut group = c.benchmark_group("scan");

    for size in [8_192usize, 65_536, 262_144] {
        let mut mem = SyntheticMemory::new(BASE, size);
        let region = MemoryRegion::new(BASE, BASE + size);
        let span = match initialize(&mut mem, region, &config) {
            Ok(report) => report.span,
            Err(_) => continue,
        };

        group.throughput(Throughput::Bytes(span.len() as u64));
        group.bench_with_input(BenchmarkId::new("intact", size), &span, |b, span| {
            b.iter(|| black_box(scan_runs(&mem, span.clone(), None, &config)))
        });

        let mut fragmented = mem.clone();
        memwatch::corrupt(&mut fragmented, region, 16, &config).ok();
        group.bench_with_input(BenchmarkId::new("fragmented", size), &span, |b, span| {
            b.iter(|| black_box(scan_runs(&fragmented, span.clone(), None, &config)))
        });
    }

    group.finish();
}

fn bench_initialize(c: &mut Criterion) {
    let config = WatchConfig::host();
    let mut group = c.benchmark_group("initialize");

    for size in [8_192usize, 65_536] {
        let mut mem = SyntheticMemory::new(BASE, size);
        let region = MemoryRegion::new(BASE, BASE + size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| black_box(initialize(&mut mem, region, &config)))
        });
    }

    group.finish();
}

fn bench_dump(c: &mut Criterion) {
    let config = WatchConfig::default();
    let mem = SyntheticMemory::new(BASE, 8_192).with_fill(config.sentinel);
    let region = MemoryRegion::new(BASE, BASE + 8_192);
    let width = memwatch::AddressWidth::Bits16;

    c.bench_function("dump_render_8k", |b| {
        b.iter(|| {
            for row in dump_rows(&mem, region, None, &config) {
                black_box(row.render(width));
            }
        })
    });
}

fn bench_watcher_check(c: &mut Criterion) {
    let watcher = match FreeMemoryWatcher::new(SyntheticMemory::new(BASE, 8_192), WatchConfig::host()) {
        Ok(watcher) => watcher,
        Err(_) => return,
    };
    watcher.check_corruption();

    c.bench_function("watcher_check_8k", |b| {
        b.iter(|| black_box(watcher.check_corruption()))
    });
}

criterion_group!(benches, bench_scan, bench_initialize, bench_dump, bench_watcher_check);
criterion_main!(benches);
