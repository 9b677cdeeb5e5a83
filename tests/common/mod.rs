//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use sansfit_rs::data::Dataset1D;
use sansfit_rs::models::ModelId;
use sansfit_rs::ScatteringModel;

/// Seeded Gaussian noise with standard deviation `sigma`.
pub fn noise(n: usize, sigma: f64, seed: u64) -> Array1<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).unwrap();
    Array1::from_shape_fn(n, |_| normal.sample(&mut rng))
}

/// `y = slope * x + intercept` on x = 0..n, with seeded noise and matching σ.
pub fn noisy_line(n: usize, slope: f64, intercept: f64, sigma: f64, seed: u64) -> Dataset1D {
    let x = Array1::range(0.0, n as f64, 1.0);
    let y = x.mapv(|x| slope * x + intercept) + noise(n, sigma, seed);
    Dataset1D::new(x, y)
        .unwrap()
        .with_errors(Array1::from_elem(n, sigma))
}

/// Sphere intensity with default contrast and no background.
pub fn sphere_intensity(radius: f64, scale: f64, q: &Array1<f64>) -> Array1<f64> {
    let mut model = sansfit_rs::models::create_model(ModelId::Sphere.id()).unwrap();
    model.set_param("radius", radius).unwrap();
    model.set_param("scale", scale).unwrap();
    model.evaluate(q).unwrap()
}

/// Sphere curve with 1% error bars and seeded noise of the same size.
pub fn noisy_sphere(radius: f64, q: Array1<f64>, seed: u64) -> Dataset1D {
    let i = sphere_intensity(radius, 1.0, &q);
    let di = i.mapv(|v| 0.01 * v + 1e-4);
    let n = q.len();
    let unit = noise(n, 1.0, seed);
    let noisy = &i + &(&unit * &di);
    Dataset1D::new(q, noisy).unwrap().with_errors(di)
}
