//! Criterion benchmarks for the scratch pool under thread contention.

use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_bench::init_tracing;
use strata_marshal::{MarshalService, PoolConfig};
use strata_test_utils::{random_jump_params, rng, JumpParams};

const OPS_PER_THREAD: usize = 1_000;

/// Benchmark: `threads` workers each transcoding 1K records through one
/// service with the default four entries per type.
fn bench_contended_round_trips(c: &mut Criterion) {
    init_tracing();
    let service = MarshalService::new();
    let params = random_jump_params(&mut rng(11));
    let mut group = c.benchmark_group("pool_contention");

    for threads in [1usize, 4, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &n| {
            b.iter(|| {
                thread::scope(|s| {
                    for _ in 0..n {
                        s.spawn(|| {
                            let mut buffer = [0u8; std::mem::size_of::<JumpParams>()];
                            for _ in 0..OPS_PER_THREAD {
                                service.get_bytes(&mut buffer, 0, &params).unwrap();
                                let _: JumpParams = service.get_structure(&buffer, 0).unwrap();
                            }
                        });
                    }
                });
            });
        });
    }
    group.finish();
}

/// Benchmark: uncontended lease and release on a single-entry pool.
fn bench_lease_release(c: &mut Criterion) {
    let service = MarshalService::with_config(PoolConfig::new(1)).unwrap();

    c.bench_function("pool_lease_release", |b| {
        b.iter(|| {
            let lease = service.pool().lease::<JumpParams>().unwrap();
            drop(lease);
        });
    });
}

criterion_group!(benches, bench_contended_round_trips, bench_lease_release);
criterion_main!(benches);
