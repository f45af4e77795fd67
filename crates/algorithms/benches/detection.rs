//! Benchmarks for the tree-detection pipeline

use canopy_algorithms::canopy::{DetectionParams, TreeDetector};
use canopy_algorithms::clustering::{dbscan, DbscanParams};
use canopy_algorithms::morphology::{closing, StructuringElement};
use canopy_core::{GeoTransform, Raster};
use canopy_parallel::ProcessingMode;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo_types::Coord;

/// Height grid with a regular lattice of Gaussian crowns every 40 cells
fn create_forest(size: usize) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64 * 0.1, 0.1, -0.1));
    for row in 0..size {
        for col in 0..size {
            let (dr, dc) = ((row % 40) as f64 - 20.0, (col % 40) as f64 - 20.0);
            let peak = 8.0 + ((row / 40 + col / 40) % 5) as f64;
            r.set(row, col, peak * (-(dr * dr + dc * dc) / 50.0).exp()).unwrap();
        }
    }
    r
}

fn bench_closing(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection/denoise");
    let se = StructuringElement::Square(2);
    for size in [256, 512, 1024] {
        let raster = create_forest(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| closing(black_box(&raster), &se).unwrap())
        });
    }
    group.finish();
}

fn bench_dbscan(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection/dbscan");
    for n in [1_000, 10_000, 50_000] {
        let side = (n as f64).sqrt() as usize;
        let points: Vec<Coord<f64>> = (0..n)
            .map(|i| Coord {
                x: (i % side) as f64 * 0.1,
                y: (i / side) as f64 * 0.1,
            })
            .collect();
        let params = DbscanParams { eps: 0.3, min_points: 5 };
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| dbscan(black_box(&points), &params).unwrap())
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection/pipeline");
    group.sample_size(10);
    let chm = create_forest(1024);
    let params = DetectionParams {
        tile_size: 256,
        ..Default::default()
    };
    let modes = [
        ("sequential", ProcessingMode::Sequential),
        ("parallel", ProcessingMode::Parallel),
    ];
    for (name, mode) in modes {
        let detector = TreeDetector::new(params.clone()).with_mode(mode);
        group.bench_with_input(BenchmarkId::new("mode", name), &name, |b, _| {
            b.iter(|| detector.detect_in_height_model(black_box(&chm)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_closing, bench_dbscan, bench_pipeline);
criterion_main!(benches);
