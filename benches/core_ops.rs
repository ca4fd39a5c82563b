// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Core index operation benchmarks.
//!
//! Measures performance of:
//! - insert() - Keyed insert with splits and redistribution
//! - get() - Point lookup
//! - delete() - Keyed delete with merges and redistribution
//! - iter() - Full ordered scan over the leaf chain

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reedindex::{pred, BPlusTree, Journal, Order};

/// Pseudo-random key sequence, identical across runs.
fn shuffled_keys(count: usize) -> Vec<u64> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        })
        .collect()
}

/// Benchmark insert() with sequential and shuffled keys.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for count in [1_000usize, 10_000, 100_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("sequential", count),
            count,
            |b, &count| {
                b.iter(|| {
                    let mut tree = BPlusTree::new(Order::new(64).unwrap()).unwrap();
                    let mut journal = Journal::new().unwrap();
                    for i in 0..count as u64 {
                        tree.insert(i, i, &mut journal, pred::always).unwrap();
                    }
                    black_box(tree)
                });
            },
        );
        group.bench_with_input(BenchmarkId::new("shuffled", count), count, |b, &count| {
            let keys = shuffled_keys(count);
            b.iter(|| {
                let mut tree = BPlusTree::new(Order::new(64).unwrap()).unwrap();
                let mut journal = Journal::new().unwrap();
                for &key in &keys {
                    tree.insert(key, key, &mut journal, pred::always).unwrap();
                }
                black_box(tree)
            });
        });
    }

    group.finish();
}

/// Benchmark get() on a populated tree.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for count in [1_000usize, 10_000, 100_000].iter() {
        let keys = shuffled_keys(*count);
        let mut tree = BPlusTree::new(Order::new(64).unwrap()).unwrap();
        let mut journal = Journal::new().unwrap();
        for &key in &keys {
            tree.insert(key, key, &mut journal, pred::always).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            let mut i = 0;
            b.iter(|| {
                let key = keys[i % keys.len()];
                i += 1;
                black_box(tree.get(&key))
            });
        });
    }

    group.finish();
}

/// Benchmark delete() draining a populated tree.
fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");
    group.sample_size(20); // expensive setup per iteration

    for count in [1_000usize, 10_000].iter() {
        let keys = shuffled_keys(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter_batched(
                || {
                    let mut tree = BPlusTree::new(Order::new(64).unwrap()).unwrap();
                    let mut journal = Journal::new().unwrap();
                    for &key in &keys {
                        tree.insert(key, key, &mut journal, pred::always).unwrap();
                    }
                    (tree, journal)
                },
                |(mut tree, mut journal)| {
                    for &key in &keys {
                        tree.delete(&key, &mut journal, |_| true).unwrap();
                    }
                    black_box(tree)
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Benchmark a full ordered scan.
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for count in [10_000usize, 100_000].iter() {
        let keys = shuffled_keys(*count);
        let mut tree = BPlusTree::new(Order::new(64).unwrap()).unwrap();
        let mut journal = Journal::new().unwrap();
        for &key in &keys {
            tree.insert(key, key, &mut journal, pred::always).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let mut sum = 0u64;
                for (_, value) in tree.iter() {
                    sum = sum.wrapping_add(*value);
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_get, bench_delete, bench_scan);
criterion_main!(benches);
