use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fieldtrack::assignment::GreedySolver;
use fieldtrack::bbox::BBox;
use fieldtrack::{Detection, SortTracker, TrackerConfig};
use std::hint::black_box;

fn create_test_detections(n_detections: usize, n_frames: usize) -> Vec<Vec<Detection>> {
    (0..n_frames)
        .map(|frame| {
            (0..n_detections)
                .map(|i| {
                    let x = (frame * 3 + i * 60) as f32;
                    let y = (frame * 2 + i * 35) as f32;
                    Detection::new("player", 0.8, BBox::ltrb(x, y, x + 50.0, y + 30.0))
                })
                .collect()
        })
        .collect()
}

fn bench_sort_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_update");

    for n in [5usize, 22, 60] {
        let detections = create_test_detections(n, 10);

        group.bench_with_input(BenchmarkId::new("munkres", n), &detections, |b, dets| {
            b.iter_batched(
                || SortTracker::new(TrackerConfig::default()).unwrap(),
                |mut tracker| {
                    for frame in dets {
                        black_box(tracker.update(black_box(frame)).unwrap());
                    }
                },
                criterion::BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("greedy", n), &detections, |b, dets| {
            b.iter_batched(
                || SortTracker::with_solver(TrackerConfig::default(), GreedySolver).unwrap(),
                |mut tracker| {
                    for frame in dets {
                        black_box(tracker.update(black_box(frame)).unwrap());
                    }
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sort_update);
criterion_main!(benches);
