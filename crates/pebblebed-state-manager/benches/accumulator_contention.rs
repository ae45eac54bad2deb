// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! HeatAccumulator throughput with 1..N concurrent writers.
//!
//! Run: cargo bench -p pebblebed-state-manager --bench accumulator_contention

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pebblebed_state_manager::HeatAccumulator;
use std::sync::Arc;
use std::thread;

const ADDS_PER_WRITER: u64 = 10_000;

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("heat_accumulator_add");

    for writers in [1_u64, 2, 4, 8] {
        group.throughput(Throughput::Elements(writers * ADDS_PER_WRITER));
        group.bench_with_input(BenchmarkId::from_parameter(writers), &writers, |b, &writers| {
            b.iter(|| {
                let acc = Arc::new(HeatAccumulator::new());
                let handles: Vec<_> = (0..writers)
                    .map(|_| {
                        let acc = Arc::clone(&acc);
                        thread::spawn(move || {
                            for _ in 0..ADDS_PER_WRITER {
                                acc.add(black_box(0.25));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.join();
                }
                black_box(acc.total())
            });
        });
    }

    group.finish();
}

fn bench_total_read(c: &mut Criterion) {
    let acc = HeatAccumulator::with_initial(1234.5);
    c.bench_function("heat_accumulator_total", |b| b.iter(|| black_box(acc.total())));
}

criterion_group!(benches, bench_contention, bench_total_read);
criterion_main!(benches);
