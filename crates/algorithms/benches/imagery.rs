//! Benchmarks for imagery algorithms

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use s2ndvi_algorithms::imagery::ndvi;
use s2ndvi_core::{GeoTransform, Raster};

fn create_band(size: usize, base: f32) -> Raster<f32> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(600000.0, 5000040.0, 10.0, -10.0));
    for row in 0..size {
        for col in 0..size {
            let v = base + ((row * 7 + col * 13) % 2000) as f32;
            r.set(row, col, v).unwrap();
        }
    }
    r
}

fn bench_ndvi(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/ndvi");
    // 10980 is a full Sentinel-2 10 m tile edge
    for size in [512, 2048, 10980] {
        let nir = create_band(size, 3000.0);
        let red = create_band(size, 1000.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| ndvi(black_box(&nir), black_box(&red)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ndvi);
criterion_main!(benches);
