//! Append and lookup benchmarks for chronolog.
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench append
//! cargo bench --bench append -- "fixed"
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tempfile::tempdir;

use chronolog::{Disposition, Log, LogConfig, RecordFormat};

fn fixed_log(dir: &tempfile::TempDir) -> Log {
    Log::open(
        dir.path().join("bench.log"),
        "bench.fixed",
        "8-byte payload",
        RecordFormat::Fixed { record_size: 16 },
        Disposition::CreateAlways,
        &LogConfig::default(),
    )
    .unwrap()
}

fn variable_log(dir: &tempfile::TempDir) -> Log {
    Log::open(
        dir.path().join("bench.log"),
        "bench.variable",
        "raw bytes",
        RecordFormat::Variable,
        Disposition::CreateAlways,
        &LogConfig::default(),
    )
    .unwrap()
}

fn bench_fixed_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    group.throughput(Throughput::Elements(1));

    group.bench_function("fixed_16_byte", |b| {
        let dir = tempdir().unwrap();
        let mut log = fixed_log(&dir);
        let mut ts = 0u64;
        b.iter(|| {
            ts += 1;
            assert!(log.append_raw(ts, black_box(&ts.to_le_bytes())));
        });
    });

    group.bench_function("variable_64_byte", |b| {
        let dir = tempdir().unwrap();
        let mut log = variable_log(&dir);
        let payload = [0xA5u8; 64];
        let mut ts = 0u64;
        b.iter(|| {
            ts += 1;
            assert!(log.append_raw(ts, black_box(&payload)));
        });
    });

    group.finish();
}

fn bench_read_and_find(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut log = fixed_log(&dir);
    for ts in 1..=100_000u64 {
        assert!(log.append_raw(ts * 10, &ts.to_le_bytes()));
    }

    let mut group = c.benchmark_group("lookup");

    group.bench_function("read_raw", |b| {
        let mut n = 0usize;
        b.iter(|| {
            n = (n + 7919) % 100_000;
            black_box(log.read_raw(n))
        });
    });

    group.bench_function("find", |b| {
        let mut probe = 0u64;
        b.iter(|| {
            probe = (probe + 99_991) % 1_000_000;
            black_box(log.find(probe))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_fixed_append, bench_read_and_find);
criterion_main!(benches);
