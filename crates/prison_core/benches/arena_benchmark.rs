//! # Arena and Container Benchmark
//!
//! Bump allocation, scratch scopes, handle list growth and string table
//! inserts/lookups.
//!
//! Run with: `cargo bench --package prison_core --bench arena_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prison_core::{kilobytes, megabytes, Arena, HandleList, StrTable};

/// Benchmark: many small allocations followed by a reset.
fn bench_bump_allocation(c: &mut Criterion) {
    let arena = Arena::new(megabytes(1));

    c.bench_function("alloc_4096x64B_then_reset", |b| {
        b.iter(|| {
            for _ in 0..4096 {
                black_box(arena.alloc(64).unwrap());
            }
            arena.reset();
        });
    });
}

/// Benchmark: scratch scope open/alloc/close.
fn bench_temp_scope(c: &mut Criterion) {
    let arena = Arena::new(kilobytes(64));

    c.bench_function("temp_scope_1KiB", |b| {
        b.iter(|| {
            let scratch = arena.temp();
            black_box(scratch.alloc(1024).unwrap());
        });
    });
}

/// Benchmark: handle list push with in-place doubling.
fn bench_handle_list_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_list_push");

    for count in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let arena = Arena::new(megabytes(1));
            b.iter(|| {
                let mut list = HandleList::new(&arena).unwrap();
                for i in 0..count {
                    list.push(i).unwrap();
                }
                let len = list.len();
                arena.reset();
                len
            });
        });
    }

    group.finish();
}

/// Benchmark: asset-table sized string table, inserts then lookups.
fn bench_str_table(c: &mut Criterion) {
    let keys: Vec<String> = (0..512).map(|i| format!("sprite_{i}")).collect();

    c.bench_function("str_table_set_512", |b| {
        let arena = Arena::new(kilobytes(256));
        b.iter(|| {
            let mut table = StrTable::new(&arena).unwrap();
            for (i, key) in keys.iter().enumerate() {
                table.set(key, i as i32).unwrap();
            }
            let len = table.len();
            arena.reset();
            len
        });
    });

    let arena = Arena::new(kilobytes(256));
    let mut table = StrTable::with_capacity(&arena, 1024).unwrap();
    for (i, key) in keys.iter().enumerate() {
        table.set(key, i as i32).unwrap();
    }

    c.bench_function("str_table_get_512", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(table.get(key));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_bump_allocation,
    bench_temp_scope,
    bench_handle_list_push,
    bench_str_table,
);

criterion_main!(benches);
