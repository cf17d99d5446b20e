//! Grid generation throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fieldplots_grid::{generate_grid, DirectionFrame, GridParams};
use nalgebra::{Point2, Vector2};

fn rotated_frame() -> DirectionFrame {
    let angle = 12f64.to_radians();
    DirectionFrame::new(
        Point2::new(640_000.0, 4_320_000.0),
        Vector2::new(angle.cos(), angle.sin()),
        Vector2::new(-angle.sin(), angle.cos()),
    )
    .expect("frame")
}

fn bench_generate(c: &mut Criterion) {
    let frame = rotated_frame();
    let mut group = c.benchmark_group("generate_grid");
    for &(ranges, columns) in &[(10usize, 20usize), (40, 60), (100, 120)] {
        for &rows in &[1usize, 4] {
            let params = GridParams {
                num_ranges: ranges,
                num_columns: columns,
                num_rows: rows,
                range_spacing: 0.9,
                ..GridParams::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("rows{rows}"), ranges * columns),
                &params,
                |b, params| b.iter(|| generate_grid(black_box(&frame), black_box(params))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
