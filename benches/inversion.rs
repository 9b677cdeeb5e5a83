//! Benchmarks for the P(r) inversion.
//!
//! Covers a single inversion at several basis sizes, the basis-size
//! estimator and a D_max sweep in serial and on the rayon pool.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use sansfit_rs::data::Dataset1D;
use sansfit_rs::inversion::{basis, InversionConfig, InversionEngine, InversionParams};

fn data() -> Dataset1D {
    let d_max = 120.0;
    let q = Array1::linspace(0.005, 0.3, 150);
    let i = q.mapv(|q| {
        basis::ortho_transformed(d_max, 1, q) + 0.2 * basis::ortho_transformed(d_max, 3, q)
    });
    let di = i.mapv(|v: f64| 0.01 * v.abs() + 1.0);
    Dataset1D::new(q, i).unwrap().with_errors(di)
}

fn params(n_terms: usize) -> InversionParams {
    InversionParams {
        d_max: 120.0,
        n_terms,
        alpha: 1e-3,
        ..InversionParams::default()
    }
}

fn bench_invert(c: &mut Criterion) {
    let data = data();
    let mut group = c.benchmark_group("invert");
    for &n in &[10, 20, 40] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut engine = InversionEngine::new(params(n));
            b.iter(|| black_box(engine.invert(&data).unwrap()))
        });
    }
    group.finish();
}

fn bench_estimate(c: &mut Criterion) {
    let data = data();
    let mut group = c.benchmark_group("estimate");
    group.sample_size(10);
    group.bench_function("numterms", |b| {
        let mut engine = InversionEngine::new(params(10));
        b.iter(|| black_box(engine.estimate(&data).unwrap()))
    });
    group.finish();
}

fn bench_explore(c: &mut Criterion) {
    let data = data();
    let mut group = c.benchmark_group("explore_dmax");
    for parallel in [false, true] {
        let config = InversionConfig::default().with_parallel_explore(parallel);
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_function(label, |b| {
            let mut engine = InversionEngine::with_config(params(15), config.clone());
            b.iter(|| black_box(engine.explore_dmax(&data, None, None, None).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_invert, bench_estimate, bench_explore);
criterion_main!(benches);
