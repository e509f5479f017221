use chained_hashmap::ResizableArray;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn bench_push_back(c: &mut Criterion) {
    c.bench_function("resizable_array_push_back_10k", |b| {
        b.iter_batched(
            ResizableArray::<u64>::new,
            |mut a| {
                for i in 0..10_000u64 {
                    a.push_back(i);
                }
                black_box(a)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_push_pop_cycle(c: &mut Criterion) {
    // Crosses the grow and shrink boundaries on every round.
    c.bench_function("resizable_array_push_pop_cycle", |b| {
        let mut a: ResizableArray<u64> = (0..1024u64).collect();
        b.iter(|| {
            for i in 0..1024u64 {
                a.push_back(i);
            }
            for _ in 0..1024 {
                black_box(a.pop_back());
            }
        })
    });
}

fn bench_front_insert_remove(c: &mut Criterion) {
    c.bench_function("resizable_array_front_insert_remove", |b| {
        let mut a: ResizableArray<u64> = (0..4096u64).collect();
        b.iter(|| {
            a.insert(0, black_box(1)).unwrap();
            black_box(a.remove(0).unwrap());
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_push_back, bench_push_pop_cycle, bench_front_insert_remove
}
criterion_main!(benches);
