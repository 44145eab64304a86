//! Benchmarks for the notification cycle.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trellis_core::ObservableList;

fn bench_notify(c: &mut Criterion) {
    let numbers = ObservableList::from_iter(0..64);
    for _ in 0..8 {
        // Subscriptions stay active after the handle is dropped.
        let _ = numbers.subscribe(|current| {
            black_box(current.len());
        });
    }

    c.bench_function("notify_8_subscribers", |b| b.iter(|| numbers.notify()));

    c.bench_function("replace_all_64_elements", |b| {
        b.iter(|| numbers.replace_all(black_box(0..64)))
    });
}

criterion_group!(benches, bench_notify);
criterion_main!(benches);
