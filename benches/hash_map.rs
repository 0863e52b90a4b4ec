use criterion::{criterion_group, criterion_main, Criterion};
use exhash::HashMap;
use std::time::{Duration, Instant};

fn insert_cold(c: &mut Criterion) {
    c.bench_function("HashMap: insert, cold", |b| {
        b.iter_custom(|iters| {
            let mut hashmap: HashMap<u64, u64> = HashMap::default();
            let start = Instant::now();
            for i in 0..iters {
                assert!(hashmap.insert(i, i).is_ok());
            }
            start.elapsed()
        })
    });
}

fn insert_warmed_up(c: &mut Criterion) {
    c.bench_function("HashMap: insert, warmed up", |b| {
        b.iter_custom(|iters| {
            let mut hashmap: HashMap<u64, u64> = HashMap::with_capacity(iters as usize * 2);
            let start = Instant::now();
            for i in 0..iters {
                assert!(hashmap.insert(i, i).is_ok());
            }
            start.elapsed()
        })
    });
}

fn get(c: &mut Criterion) {
    c.bench_function("HashMap: get", |b| {
        b.iter_custom(|iters| {
            let mut hashmap: HashMap<u64, u64> = HashMap::with_capacity(iters as usize * 2);
            for i in 0..iters {
                assert!(hashmap.insert(i, i).is_ok());
            }
            let start = Instant::now();
            for i in 0..iters {
                assert_eq!(hashmap.get(&i), Some(&i));
            }
            start.elapsed()
        })
    });
}

fn remove_reinsert(c: &mut Criterion) {
    c.bench_function("HashMap: remove and reinsert", |b| {
        b.iter_custom(|iters| {
            let mut hashmap: HashMap<u64, u64> = (0..4096).map(|i| (i, i)).collect();
            let start = Instant::now();
            for i in 0..iters {
                let k = i % 4096;
                assert!(hashmap.remove(&k).is_some());
                assert!(hashmap.insert(k, i).is_ok());
            }
            start.elapsed()
        })
    });
}

fn cursor_with_inserts(c: &mut Criterion) {
    c.bench_function("HashMap: cursor with inserts", |b| {
        b.iter_custom(|iters| {
            let mut duration = Duration::default();
            for _ in 0..iters {
                let mut hashmap: HashMap<u64, u64> = (0..16_384).map(|i| (i, i)).collect();
                let mut next = 16_384;
                let start = Instant::now();
                let mut cursor = hashmap.cursor();
                while cursor.next(&hashmap).is_some() {
                    hashmap.upsert(next, next);
                    next += 1;
                }
                duration += start.elapsed();
            }
            duration
        })
    });
}

fn insert_tail_latency(c: &mut Criterion) {
    c.bench_function("HashMap: insert_tail_latency", move |b| {
        b.iter_custom(|iters| {
            let mut duration = Duration::default();
            for _ in 0..iters {
                let mut hashmap: HashMap<u64, u64> = HashMap::default();
                let mut key = 0;
                let mut max_duration = Duration::default();
                (0..1048576).for_each(|_| {
                    key += 1;
                    let start = Instant::now();
                    assert!(hashmap.insert(key, key).is_ok());
                    let elapsed = start.elapsed();
                    if elapsed > max_duration {
                        max_duration = elapsed;
                    }
                });
                duration += max_duration;
            }
            duration
        })
    });
}

criterion_group!(
    hash_map,
    insert_cold,
    insert_tail_latency,
    insert_warmed_up,
    get,
    remove_reinsert,
    cursor_with_inserts
);
criterion_main!(hash_map);
