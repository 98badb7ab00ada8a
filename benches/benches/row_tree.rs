// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_row_tree::{RowForest, TreeId};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive == 0 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }
}

/// A flat list of `n` rows with pseudo-random heights in `8..40`.
fn build_flat(n: usize, seed: u64) -> (RowForest, TreeId) {
    let mut forest = RowForest::new();
    let top = forest.top();
    let mut rng = Lcg::new(seed);
    let mut last = None;
    for _ in 0..n {
        let height = 8 + rng.gen_range_usize(32) as i32;
        last = Some(forest.insert_after(top, last, height, true));
    }
    (forest, top)
}

/// A two-level forest: `n` top-level rows, every fourth one expanded with
/// eight nested rows.
fn build_nested(n: usize, seed: u64) -> (RowForest, TreeId) {
    let (mut forest, top) = build_flat(n, seed);
    let mut rng = Lcg::new(seed ^ 0x5EED);
    for i in (0..n).step_by(4) {
        let row = forest.find_by_count(top, i).expect("row exists");
        let child = forest.create_children(top, row);
        let mut last = None;
        for _ in 0..8 {
            let height = 8 + rng.gen_range_usize(32) as i32;
            last = Some(forest.insert_after(child, last, height, true));
        }
    }
    (forest, top)
}

fn bench_row_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_row_tree");
    group.sample_size(50);

    for &n in &[256_usize, 4_096] {
        group.bench_function(format!("insert_append(n={n})"), |b| {
            b.iter(|| {
                let (forest, top) = build_flat(n, 0xB0B);
                black_box(forest.total_height(top));
            });
        });

        group.bench_function(format!("insert_random_position(n={n})"), |b| {
            b.iter(|| {
                let mut forest = RowForest::new();
                let top = forest.top();
                let mut rng = Lcg::new(0xFACE);
                let _ = forest.insert_after(top, None, 10, true);
                for i in 1..n {
                    let at = rng.gen_range_usize(i);
                    let anchor = forest.find_by_count(top, at);
                    let _ = forest.insert_after(top, anchor, 10, true);
                }
                black_box(forest.row_count(top));
            });
        });

        group.bench_function(format!("find_by_offset(n={n})"), |b| {
            let (forest, top) = build_nested(n, 0xC0FFEE);
            let total = forest.total_height(top);
            let mut rng = Lcg::new(0xD1CE);
            b.iter(|| {
                let h = rng.gen_range_usize(total as usize) as i32;
                black_box(forest.find_by_offset(top, h));
            });
        });

        group.bench_function(format!("node_offset(n={n})"), |b| {
            let (forest, top) = build_flat(n, 0xC0FFEE);
            let mut rng = Lcg::new(0xD1CE);
            b.iter(|| {
                let node = forest
                    .find_by_count(top, rng.gen_range_usize(n))
                    .expect("row exists");
                black_box(forest.node_offset(top, node));
            });
        });

        group.bench_function(format!("remove_front(n={n})"), |b| {
            b.iter_batched(
                || build_flat(n, 0xB0B),
                |(mut forest, top)| {
                    while let Some(first) = forest.first(top) {
                        forest.remove_node(top, first);
                    }
                    black_box(forest.row_count(top));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_row_tree);
criterion_main!(benches);
