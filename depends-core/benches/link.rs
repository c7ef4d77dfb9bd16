use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use depends_core::graph::Dag;
use depends_core::tracker::Tracker;

const SIZES: [u32; 3] = [16, 64, 256];

fn chain(size: u32) -> Dag<u32> {
    let mut dag: Dag<u32> = (0..size).collect();
    for value in 1..size {
        let _ = dag.link_values(&(value - 1), &value);
    }
    dag
}

fn bench_link(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag.link");

    for size in SIZES {
        group.throughput(Throughput::Elements(u64::from(size)));

        group.bench_with_input(BenchmarkId::new("chain", size), &size, |b, &size| {
            b.iter(|| black_box(chain(size)))
        });

        let dag = chain(size);
        group.bench_with_input(BenchmarkId::new("refused", size), &dag, |b, dag| {
            b.iter_batched(
                || dag.clone(),
                |mut dag| black_box(dag.link_values(&(size - 1), &0)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_linked(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag.linked");

    for size in SIZES {
        let dag = chain(size);
        let first = dag.find(&0);
        let last = dag.find(&(size - 1));

        group.bench_with_input(BenchmarkId::new("chain", size), &dag, |b, dag| {
            b.iter(|| match (first, last) {
                (Some(first), Some(last)) => black_box(dag.linked(first, last)),
                _ => false,
            })
        });
    }

    group.finish();
}

fn bench_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker.depends");

    for size in SIZES {
        let mut tracker: Tracker<u32> = Tracker::with_capacity(size as usize);
        for value in 1..size {
            tracker.select(value);
            let _ = tracker.add_prerequisite(value - 1);
        }

        group.bench_with_input(BenchmarkId::new("chain", size), &tracker, |b, tracker| {
            b.iter(|| black_box(tracker.depends(&(size - 1), &0)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_link, bench_linked, bench_tracker);
criterion_main!(benches);
