use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use high_utility_pattern::{Miner, MiningConfig, Sequence, SequenceStore};

/// Generate a synthetic sequence database
///
/// Parameters:
/// - num_sequences: Number of sequences
/// - num_items: Total number of possible items
/// - avg_length: Average itemsets per sequence
/// - avg_itemset: Average items per itemset
fn generate_sequences(
    num_sequences: usize,
    num_items: u32,
    avg_length: usize,
    avg_itemset: usize,
) -> SequenceStore {
    let mut rng = StdRng::seed_from_u64(7);

    (0..num_sequences)
        .map(|_| {
            let length = rng.gen_range(1..=avg_length * 2);
            let itemsets: Vec<Vec<(u32, f64)>> = (0..length)
                .map(|_| {
                    let width = rng.gen_range(1..=avg_itemset * 2);
                    let mut ids: Vec<u32> = (0..width).map(|_| rng.gen_range(0..num_items)).collect();
                    ids.sort_unstable();
                    ids.dedup();
                    ids.into_iter()
                        .map(|id| (id, rng.gen_range(1..=10) as f64))
                        .collect()
                })
                .collect();
            Sequence::from_pairs(itemsets)
        })
        .collect()
}

/// Benchmark mining with different database sizes
fn bench_mining_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("mining_scaling");
    group.sample_size(10);

    let configs = vec![
        ("small_100seq", 100, 20, 4, 2),
        ("medium_300seq", 300, 30, 5, 2),
        ("large_1000seq", 1000, 40, 6, 3),
    ];

    for (name, num_sequences, num_items, avg_length, avg_itemset) in configs {
        let store = generate_sequences(num_sequences, num_items, avg_length, avg_itemset);
        let miner = Miner::new(MiningConfig::new(num_sequences as f64 * 0.1, 0.0)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(name), &store, |b, store| {
            b.iter(|| miner.mine(black_box(store.clone())));
        });
    }

    group.finish();
}

/// Benchmark parallel against in-place recursion
fn bench_mining_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("mining_parallel");
    group.sample_size(10);

    let store = generate_sequences(500, 30, 5, 2);

    for parallel in [false, true] {
        let miner = Miner::new(MiningConfig::new(50.0, 100.0).with_parallel(parallel)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(parallel), &store, |b, store| {
            b.iter(|| miner.mine(black_box(store.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mining_scaling, bench_mining_parallel);
criterion_main!(benches);
