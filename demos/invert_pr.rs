//! Invert a sphere curve into P(r).
//!
//! Estimates the basis size and regularization weight, runs the inversion,
//! prints the derived quantities and a D_max sweep.

use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use sansfit_rs::data::Dataset1D;
use sansfit_rs::inversion::{InversionEngine, InversionParams, InversionProblem};
use sansfit_rs::models::create_model;
use sansfit_rs::{ModelId, ScatteringModel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("P(r) inversion example");
    println!("======================\n");

    // Sphere of radius 40 Å: D_max = 80 Å, Rg = 31 Å
    let mut model = create_model(ModelId::Sphere.id())?;
    model.set_param("radius", 40.0)?;
    let q = Array1::linspace(0.005, 0.35, 150);
    let clean = model.evaluate(&q)?;

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let normal = Normal::new(0.0, 1.0)?;
    let floor = 1e-3 * clean[0];
    let di = clean.mapv(|v| 0.01 * v + floor);
    let i = Array1::from_shape_fn(clean.len(), |k| clean[k] + di[k] * normal.sample(&mut rng));
    // A leading Q = 0 point is dropped with a message
    let q = Array1::from_iter(std::iter::once(0.0).chain(q.iter().copied()));
    let i = Array1::from_iter(std::iter::once(clean[0]).chain(i.iter().copied()));
    let di = Array1::from_iter(std::iter::once(floor).chain(di.iter().copied()));
    let data = Dataset1D::new(q, i)?.with_errors(di).with_id(3);

    let mut engine = InversionEngine::new(InversionParams {
        d_max: 80.0,
        ..InversionParams::default()
    });

    let estimate = engine.apply_estimate(&data)?;
    println!(
        "Estimated {} terms, alpha = {:.3e}",
        estimate.n_terms, estimate.alpha
    );

    let result = engine.invert(&data)?;
    println!("\n{}", result.output);
    for message in &engine.messages {
        println!("note: {}", message);
    }

    println!("\n   r        P(r)      dP(r)");
    for k in (0..result.pr.r.len()).step_by(7) {
        println!(
            "{:6.1}  {:10.4e}  {:10.4e}",
            result.pr.r[k], result.pr.p[k], result.pr.dp[k]
        );
    }

    let sweep = engine.explore_dmax(&data, Some(60.0), Some(100.0), Some(9))?;
    println!("\n D_max     chi2        Rg");
    for point in &sweep.points {
        let chi2 = point.chi2.map_or("-".to_string(), |v| format!("{:10.4e}", v));
        let rg = point.rg.map_or("-".to_string(), |v| format!("{:6.2}", v));
        println!("{:6.1}  {:>10}  {:>6}", point.d_max, chi2, rg);
    }

    let record = InversionProblem::new(engine.params.clone()).with_data_id(3);
    println!("\nStored settings: {:?}", record.as_flat_map());
    Ok(())
}
