//! Containers transitioning on many threads through one shared service.

use std::sync::Barrier;
use std::thread;

use strata_interop::{BlobEntity, InteropArray, InteropList};
use strata_marshal::{MarshalService, PoolConfig};
use strata_test_utils::{random_vec3s, vec3_lattice};

const THREADS: usize = 8;
const ROUNDS: usize = 50;

#[test]
fn arrays_collapse_and_expand_concurrently() {
    let service = MarshalService::new();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for t in 0..THREADS {
            let service = &service;
            let barrier = &barrier;
            s.spawn(move || {
                let lattice = vec3_lattice(t as u64, &[3, 4, 5]);
                let mut array = InteropArray::from_lattice(lattice.clone());
                barrier.wait();
                for round in 0..ROUNDS {
                    array.to_binary(service).unwrap();
                    array.to_object(service).unwrap();
                    assert_eq!(
                        array.values().unwrap(),
                        lattice.values(),
                        "thread {t} round {round}"
                    );
                }
            });
        }
    });

    let stats = service.pool_stats();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].available, stats[0].entries);
}

#[test]
fn lists_share_a_single_entry_pool() {
    let service = MarshalService::with_config(PoolConfig::new(1)).unwrap();

    thread::scope(|s| {
        for t in 0..THREADS {
            let service = &service;
            s.spawn(move || {
                let values = random_vec3s(100 + t as u64, 64);
                let mut list = InteropList::from_vec(values.clone());
                for _ in 0..ROUNDS {
                    list.to_binary(service).unwrap();
                    list.to_object(service).unwrap();
                }
                assert_eq!(list.into_vec().unwrap(), values);
            });
        }
    });
}
