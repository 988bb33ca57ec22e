//! Benchmarks for coherence decorator stacks

use coherence::prelude::*;
use coherence::{fnv1a32, fnv1a64, sha256};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use tokio::runtime::Runtime;

type Bucket = CoalescingCache<DoubleDeleteCache<MemoryCache<u64>, MemoryDatabase<u64>>, u64>;

fn create_stack(buckets: usize) -> ShardedCache<Bucket> {
    let database = MemoryDatabase::new();
    let buckets = (0..buckets)
        .map(|_| {
            let ddd = DoubleDeleteCache::builder(MemoryCache::with_defaults(), database.clone())
                .delay(Duration::from_millis(10))
                .build();
            CoalescingCache::new(ddd)
        })
        .collect();
    ShardedCache::new(buckets).unwrap()
}

fn bench_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = create_stack(4);

    // Pre-populate the database and warm the caches
    rt.block_on(async {
        cache.set("key", 42).await.unwrap();
        cache.get("key").await.unwrap();
    });

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let value = cache.get(black_box("key")).await.unwrap();
                black_box(value);
            });
        });
    });

    group.bench_function("miss", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = cache.get(black_box("nonexistent")).await;
                black_box(result.is_err());
            });
        });
    });

    group.finish();
}

fn bench_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = create_stack(4);

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("double_delete", |b| {
        b.iter(|| {
            rt.block_on(async {
                cache.set(black_box("key"), black_box(7)).await.unwrap();
            });
        });
    });

    group.finish();
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("route");
    group.throughput(Throughput::Elements(1));

    for (name, factory) in [("fnv1a32", fnv1a32()), ("fnv1a64", fnv1a64()), ("sha256", sha256())] {
        let buckets: Vec<MemoryCache<u64>> = (0..16).map(|_| MemoryCache::with_defaults()).collect();
        let cache = ShardedCache::with_hash_factory(buckets, factory).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(cache.bucket_index(black_box("user:123456")).unwrap()));
        });
    }

    group.finish();
}

fn bench_mixed_workload(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = create_stack(8);

    rt.block_on(async {
        for i in 0..100u64 {
            cache.set(&format!("key:{i}"), i).await.unwrap();
        }
    });

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(100));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            rt.block_on(async {
                for _ in 0..100 {
                    i = i.wrapping_add(1);
                    let key = format!("key:{}", i % 100);
                    if i % 5 == 0 {
                        // 20% writes
                        cache.set(&key, i).await.unwrap();
                    } else {
                        // 80% reads
                        let _ = cache.get(&key).await.unwrap();
                    }
                }
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_get, bench_set, bench_routing, bench_mixed_workload);
criterion_main!(benches);
