//! Fit a sphere model to a simulated SANS curve.
//!
//! Generates a noisy sphere curve with point resolution, fits radius and
//! scale with and without smearing, and stores the result as a flat map.

use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use sansfit_rs::data::Dataset1D;
use sansfit_rs::fit::{FitConfig, FitProblem};
use sansfit_rs::flat_map::to_json;
use sansfit_rs::models::ModelId;
use sansfit_rs::smearing::{default_adapter_for, SmearingSelection};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sphere fit example");
    println!("==================\n");

    // Simulated measurement: R = 60 Å, dQ/Q = 5%, 2% noise
    let q = Array1::linspace(0.004, 0.2, 120);
    let dq = q.mapv(|q| 0.05 * q);
    let mut truth = FitProblem::new(ModelId::Sphere)?;
    truth.set_parameter("radius", 60.0, false)?;
    truth.set_parameter("background", 0.01, false)?;
    let template = Dataset1D::new(q.clone(), Array1::ones(q.len()))?
        .with_point_resolution(dq.clone())?;
    let truth = truth.with_smearing(SmearingSelection::DataDefault, None);
    let clean = truth.compute_model(&template)?.y;

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let normal = Normal::new(0.0, 1.0)?;
    let di = clean.mapv(|v| 0.02 * v);
    let i = Array1::from_shape_fn(clean.len(), |k| clean[k] + di[k] * normal.sample(&mut rng));
    let data = Dataset1D::new(q, i)?
        .with_errors(di)
        .with_point_resolution(dq)?
        .with_id(1);

    // 1. Ignore the resolution
    let mut plain = FitProblem::new(ModelId::Sphere)?.with_data_id(1);
    plain.set_parameter("radius", 50.0, true)?;
    plain.set_parameter("scale", 0.5, true)?;
    plain.set_parameter("background", 0.0, true)?;
    let report = plain.perform_fit(&data, &FitConfig::default())?;
    println!("1. Without smearing");
    println!("{}", report);
    println!("Reduced chi2: {:.3}\n", report.reduced_chi2().unwrap_or(f64::NAN));

    // 2. Use the resolution stored with the data
    let adapter = default_adapter_for(&data)?;
    let mut smeared = FitProblem::new(ModelId::Sphere)?
        .with_data_id(1)
        .with_smearing(SmearingSelection::DataDefault, adapter);
    smeared.set_parameter("radius", 50.0, true)?;
    smeared.set_parameter("scale", 0.5, true)?;
    smeared.set_parameter("background", 0.0, true)?;
    let report = smeared.perform_fit(&data, &FitConfig::default())?;
    println!("2. With the data's point resolution");
    println!("{}", report);
    println!("Reduced chi2: {:.3}\n", report.reduced_chi2().unwrap_or(f64::NAN));

    println!("Stored problem:");
    println!("{}\n", smeared);
    println!("{}", to_json(&smeared.as_flat_map())?);

    Ok(())
}
