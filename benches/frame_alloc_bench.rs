use alder::{
    Value,
    config::AllocatorConfig,
    runtime::alloc::{FrameAllocator, class_capacity},
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rayon::prelude::*;

fn bench_alloc_free(c: &mut Criterion) {
    let allocator = FrameAllocator::new(&AllocatorConfig::default());
    let mut group = c.benchmark_group("alloc/alloc_free");

    for class in [0, 3, 7] {
        let size = class_capacity(class);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, size| {
            b.iter(|| {
                let mut lease = allocator.lease(*size);
                lease[0] = Value::Integer(1);
                black_box(&lease);
            });
        });
    }

    group.finish();
}

fn bench_span_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc/span_entries");

    for span_entries in [1, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(span_entries),
            &span_entries,
            |b, span_entries| {
                b.iter(|| {
                    let allocator = FrameAllocator::new(&AllocatorConfig {
                        span_entries: *span_entries,
                    });
                    let frames: Vec<_> = (0..64).map(|_| allocator.alloc(12)).collect();
                    for frame in frames {
                        allocator.free(frame);
                    }
                    black_box(allocator.stats());
                });
            },
        );
    }

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let allocator = FrameAllocator::new(&AllocatorConfig::default());
    c.bench_function("alloc/contended", |b| {
        b.iter(|| {
            (0..256usize).into_par_iter().for_each(|i| {
                let lease = allocator.lease(8 + i % 64);
                black_box(&lease);
            });
        });
    });
}

criterion_group!(benches, bench_alloc_free, bench_span_size, bench_contended);
criterion_main!(benches);
