//! Benchmarks for CRDT implementations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use synapsed_replica::*;

fn add(i: usize) -> SetCommand {
    SetCommand::Add(Value::from(format!("item{}", i)))
}

fn populated_set(id: &ReplicaId, size: usize) -> AWORSet {
    (0..size).fold(AWORSet::init(), |set, i| set.write(id, add(i)))
}

fn populated_counter(replicas: usize) -> GCounter {
    (0..replicas).fold(GCounter::init(), |counter, i| {
        counter.write(&ReplicaId::new(format!("node{}", i)), i as u64 + 1)
    })
}

// AWORSet Benchmarks
fn bench_aworset_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("aworset");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("add", size), size, |b, &size| {
            let id = ReplicaId::from("node1");
            b.iter(|| black_box(populated_set(&id, size).len()));
        });

        group.bench_with_input(BenchmarkId::new("add_remove", size), size, |b, &size| {
            let id = ReplicaId::from("node1");
            b.iter(|| {
                let set = populated_set(&id, size);

                // Remove half
                let set = (0..size / 2).fold(set, |set, i| {
                    set.write(&id, SetCommand::Remove(Value::from(format!("item{}", i))))
                });

                black_box(set.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("merge", size), size, |b, &size| {
            let set1 = populated_set(&ReplicaId::from("node1"), size);
            let set2 = populated_set(&ReplicaId::from("node2"), size);
            b.iter(|| black_box(set1.merge(&set2).len()));
        });

        group.bench_with_input(BenchmarkId::new("merge_self", size), size, |b, &size| {
            let set = populated_set(&ReplicaId::from("node1"), size);
            b.iter(|| black_box(set.merge(&set).len()));
        });
    }

    group.finish();
}

// GCounter Benchmarks
fn bench_gcounter_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("gcounter");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("increment", size), size, |b, &size| {
            let id = ReplicaId::from("node1");
            b.iter(|| {
                let counter = (0..size).fold(GCounter::init(), |counter, _| counter.write(&id, 1));
                black_box(counter.value())
            });
        });

        group.bench_with_input(BenchmarkId::new("merge", size), size, |b, &size| {
            let counter1 = populated_counter(size);
            let counter2 = populated_counter(size / 2).write(&ReplicaId::from("extra"), 7);
            b.iter(|| black_box(counter1.merge(&counter2).value()));
        });
    }

    group.finish();
}

// Codec Benchmarks
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let set = populated_set(&ReplicaId::from("node1"), 1000);

    for (name, config) in [("binary", CodecConfig::default()), ("json", CodecConfig::json())] {
        group.bench_function(BenchmarkId::new("encode", name), |b| {
            b.iter(|| black_box(set.encode_with(&config).unwrap().len()));
        });

        let bytes = set.encode_with(&config).unwrap();
        group.bench_function(BenchmarkId::new("decode", name), |b| {
            b.iter(|| black_box(AWORSet::decode(&bytes).unwrap().len()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_aworset_operations,
    bench_gcounter_operations,
    bench_codec
);

criterion_main!(benches);
