//! Benchmarks for dashboard layout and grid snapping
//!
//! Run with: cargo bench

use chrona::layout::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn create_test_sizes(count: usize) -> Vec<Size> {
    (0..count)
        .map(|i| Size::new(160.0 + (i % 5) as f64 * 40.0, 120.0 + (i % 3) as f64 * 60.0))
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let engine = LayoutEngine::new();
    let viewport = Size::new(1440.0, 900.0);

    for count in [6, 60, 600] {
        let sizes = create_test_sizes(count);
        group.throughput(Throughput::Elements(count as u64));

        for mode in LayoutMode::ALL {
            group.bench_function(format!("{}_{}", mode, count), |b| {
                b.iter(|| engine.compute(black_box(mode), black_box(&sizes), viewport))
            });
        }
    }

    group.finish();
}

fn bench_snap(c: &mut Criterion) {
    let mut group = c.benchmark_group("snap");
    let grid = GridSnapController::new(GridConfig::default());

    let points: Vec<Position> = (0..1000)
        .map(|i| Position::new(i as f64 * 7.3, i as f64 * 3.1))
        .collect();

    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("snap_1000", |b| {
        b.iter(|| {
            points
                .iter()
                .map(|p| grid.snap_to_grid(black_box(*p)))
                .filter(SnapResult::is_snapped)
                .count()
        })
    });

    let mut grid = grid;
    grid.toggle_guides();
    let area = Rect::new(Position::ORIGIN, Size::new(3840.0, 2160.0));
    group.bench_function("guide_lines_4k", |b| {
        b.iter(|| grid.guide_lines(black_box(area)))
    });

    group.finish();
}

criterion_group!(benches, bench_layout, bench_snap);
criterion_main!(benches);
