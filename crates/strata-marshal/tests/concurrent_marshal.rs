//! Concurrency tests for the pooled marshal service.
//!
//! Many threads share one service whose pool holds fewer scratch entries
//! than there are threads. Every value must read back exactly as the
//! owning thread wrote it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

use strata_marshal::{MarshalError, MarshalService, PoolConfig};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

const THREADS: usize = 8;
const ITERATIONS: usize = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct Tagged {
    thread: u64,
    iteration: u64,
    payload: [u32; 4],
}

fn record(thread: usize, iteration: usize) -> Tagged {
    let t = thread as u32;
    let i = iteration as u32;
    Tagged {
        thread: thread as u64,
        iteration: iteration as u64,
        payload: [t, i, t ^ i, t.wrapping_mul(31).wrapping_add(i)],
    }
}

#[test]
fn eight_threads_share_four_entries_without_corruption() {
    let service = MarshalService::new();
    let barrier = Barrier::new(THREADS);
    let completed = AtomicUsize::new(0);

    thread::scope(|s| {
        for t in 0..THREADS {
            let service = &service;
            let barrier = &barrier;
            let completed = &completed;
            s.spawn(move || {
                barrier.wait();
                let mut buffer = vec![0u8; std::mem::size_of::<Tagged>()];
                for i in 0..ITERATIONS {
                    let expected = record(t, i);
                    service.get_bytes(&mut buffer, 0, &expected).unwrap();
                    let back: Tagged = service.get_structure(&buffer, 0).unwrap();
                    assert_eq!(back, expected, "thread {t} iteration {i}");
                    completed.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    assert_eq!(completed.load(Ordering::Relaxed), THREADS * ITERATIONS);
    let stats = service.pool_stats();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].entries, PoolConfig::DEFAULT_ENTRIES_PER_TYPE);
    assert_eq!(stats[0].available, stats[0].entries);
}

#[test]
fn concurrent_first_use_creates_one_pool_per_type() {
    let service = MarshalService::new();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for t in 0..THREADS {
            let service = &service;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                let bytes = service.to_vec(&(t as u32)).unwrap();
                assert_eq!(service.get_structure::<u32>(&bytes, 0).unwrap(), t as u32);
                let bytes = service.to_vec(&(t as f64)).unwrap();
                assert_eq!(service.get_structure::<f64>(&bytes, 0).unwrap(), t as f64);
            });
        }
    });

    assert_eq!(service.pool().type_count(), 2);
}

#[test]
fn batched_reads_run_concurrently_with_single_reads() {
    let service = MarshalService::with_config(PoolConfig::new(2)).unwrap();
    let values: Vec<u64> = (0..512).collect();
    let mut shared = vec![0u8; values.len() * 8];
    service.get_bytes_many(&mut shared, 0, &values).unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            let service = &service;
            let shared = &shared;
            let values = &values;
            s.spawn(move || {
                for _ in 0..50 {
                    let back: Vec<u64> = service
                        .get_structures::<u64>(shared, 0, shared.len())
                        .unwrap()
                        .collect();
                    assert_eq!(&back, values);
                    assert_eq!(service.get_structure::<u64>(shared, 8 * 100).unwrap(), 100);
                }
            });
        }
    });
}

#[test]
fn held_iterators_starve_other_callers_until_timeout() {
    let config = PoolConfig::new(1).with_lease_timeout(Duration::from_millis(25));
    let service = MarshalService::with_config(config).unwrap();
    let buffer = vec![0u8; 16];

    let held = service.get_structures::<u32>(&buffer, 0, 16).unwrap();
    thread::scope(|s| {
        let service = &service;
        let buffer = &buffer;
        s.spawn(move || {
            let err = service.get_structure::<u32>(buffer, 0).unwrap_err();
            assert!(matches!(err, MarshalError::LeaseTimeout { .. }));
        });
    });
    drop(held);

    assert_eq!(service.get_structure::<u32>(&buffer, 0).unwrap(), 0);
}
