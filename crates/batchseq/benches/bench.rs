use batchseq::{BatchSequence, BatchSequenceGenerator, Dialect, MemoryDatabase, NumericKind};
use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

fn make_generator(fetch_size: i64) -> (BatchSequenceGenerator, MemoryDatabase) {
    let db = MemoryDatabase::new(Dialect::Postgres);
    db.create_sequence("seq_bench");
    let generator = BatchSequenceGenerator::from_annotation(
        &BatchSequence::new("seq_bench").with_fetch_size(fetch_size),
        NumericKind::Long,
    )
    .expect("valid configuration");
    (generator, db)
}

/// Single-threaded throughput for a range of fetch sizes.
fn bench_fetch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    for fetch_size in [1, 10, 100, 1000] {
        group.bench_function(format!("fetch_size/{fetch_size}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    let (generator, db) = make_generator(fetch_size);
                    for _ in 0..TOTAL_IDS {
                        black_box(generator.generate(&db).expect("id"));
                    }
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Contended throughput: every thread draws from one shared generator.
fn bench_contended(c: &mut Criterion) {
    let threads = num_cpus::get();
    let mut group = c.benchmark_group("generate_contended");
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

    group.bench_function(format!("threads/{threads}"), |b| {
        b.iter_custom(|iters| {
            let mut total = core::time::Duration::ZERO;
            for _ in 0..iters {
                let (generator, db) = make_generator(100);
                let barrier = Arc::new(Barrier::new(threads + 1));
                let start = scope(|s| {
                    for _ in 0..threads {
                        let barrier = Arc::clone(&barrier);
                        let generator = generator.clone();
                        let db = db.clone();
                        s.spawn(move || {
                            barrier.wait();
                            for _ in 0..TOTAL_IDS {
                                black_box(generator.generate(&db).expect("id"));
                            }
                        });
                    }
                    barrier.wait();
                    Instant::now()
                });
                total += start.elapsed();
            }
            total
        });
    });

    group.finish();
}

criterion_group!(benches, bench_fetch_sizes, bench_contended);
criterion_main!(benches);
