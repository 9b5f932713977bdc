//! Criterion micro-benchmarks for array and list state transitions.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strata_bench::{init_tracing, reference_lattice, reference_occupations};
use strata_interop::{BlobEntity, InteropArray, InteropList};
use strata_marshal::MarshalService;
use strata_test_utils::{random_vec3s, Vec3};

/// Benchmark: collapse the 32K-element reference lattice.
fn bench_array_collapse_32k(c: &mut Criterion) {
    init_tracing();
    let service = MarshalService::new();
    let lattice = reference_lattice(42);

    c.bench_function("array_collapse_32k", |b| {
        b.iter(|| {
            let mut array = InteropArray::from_lattice(lattice.clone());
            array.to_binary(&service).unwrap();
            black_box(array.blob_byte_count());
        });
    });
}

/// Benchmark: expand the collapsed reference lattice.
fn bench_array_expand_32k(c: &mut Criterion) {
    let service = MarshalService::new();
    let mut array = InteropArray::from_lattice(reference_lattice(42));
    array.to_binary(&service).unwrap();
    let bytes = array.into_binary().unwrap();

    c.bench_function("array_expand_32k", |b| {
        b.iter(|| {
            let mut array = InteropArray::<Vec3>::from_binary(bytes.clone());
            array.to_object(&service).unwrap();
            black_box(array.len());
        });
    });
}

/// Benchmark: collapse and expand 4K site occupations in place.
fn bench_occupation_cycle_4k(c: &mut Criterion) {
    let service = MarshalService::new();
    let mut array = InteropArray::from_lattice(reference_occupations(7));

    c.bench_function("array_occupation_cycle_4k", |b| {
        b.iter(|| {
            array.to_binary(&service).unwrap();
            array.to_object(&service).unwrap();
        });
    });
}

/// Benchmark: collapse and expand a 10K-element list in place.
fn bench_list_cycle_10k(c: &mut Criterion) {
    let service = MarshalService::new();
    let mut list = InteropList::from_vec(random_vec3s(5, 10_000));

    c.bench_function("list_cycle_10k", |b| {
        b.iter(|| {
            list.to_binary(&service).unwrap();
            list.to_object(&service).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_array_collapse_32k,
    bench_array_expand_32k,
    bench_occupation_cycle_4k,
    bench_list_cycle_10k
);
criterion_main!(benches);
