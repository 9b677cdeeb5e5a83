//! Flat-map persistence of fit and inversion records.

use ndarray::Array1;
use proptest::prelude::*;

use sansfit_rs::data::Dataset1D;
use sansfit_rs::fit::{fit_problem_from_flat_map, FitProblem};
use sansfit_rs::flat_map::{from_json, to_json, FlatMap, FlatMapExt};
use sansfit_rs::inversion::{InversionParams, InversionProblem};
use sansfit_rs::models::ModelId;
use sansfit_rs::smearing::{PointAdapter, SlitAdapter, SmearAdapter, SmearingSelection};

fn smearing_strategy() -> impl Strategy<Value = (SmearingSelection, Option<SmearAdapter>)> {
    prop_oneof![
        Just((SmearingSelection::None, None)),
        (1e-4..0.01f64).prop_map(|dq| (
            SmearingSelection::Point,
            Some(SmearAdapter::Point(PointAdapter::uniform(dq)))
        )),
        (1e-4..0.01f64, 1e-4..0.01f64, 1e-4..0.01f64).prop_map(|(a, b, c)| (
            SmearingSelection::DataDefault,
            Some(SmearAdapter::Point(PointAdapter::summary(a, b, c)))
        )),
        (0.0..0.05f64, 0.0..0.05f64).prop_map(|(w, h)| {
            let mut params = FlatMap::new();
            params.put("smear_width", w);
            params.put("smear_height", h);
            (
                SmearingSelection::Slit,
                Some(SmearAdapter::Slit(SlitAdapter::from_params(&params, false))),
            )
        }),
    ]
}

fn sphere_problem() -> impl Strategy<Value = FitProblem> {
    (
        prop::collection::vec((-1e3..1e3f64, any::<bool>(), prop::option::of(0.0..10.0f64)), 4),
        prop::option::of(0.0..0.05f64),
        prop::option::of(0.1..0.5f64),
        smearing_strategy(),
    )
        .prop_map(|(values, q_min, q_max, (smearing, adapter))| {
            let mut problem = FitProblem::new(ModelId::Sphere)
                .unwrap()
                .with_q_range(q_min, q_max)
                .with_smearing(smearing, adapter);
            for (p, (value, free, error)) in problem.parameters.iter_mut().zip(values) {
                p.value = value;
                p.is_fixed = !free;
                p.error = error;
            }
            problem
        })
}

proptest! {
    #[test]
    fn prop_fit_problem_round_trip(problem in sphere_problem()) {
        let map = problem.as_flat_map();
        let restored = fit_problem_from_flat_map(&map).unwrap();
        prop_assert_eq!(restored.as_flat_map(), map.clone());
        prop_assert_eq!(&restored.parameters, &problem.parameters);

        // Populating an existing problem from its own map changes nothing
        let mut again = problem.clone();
        again.populate_from_flat_map(&map).unwrap();
        prop_assert_eq!(again.as_flat_map(), map);
    }

    #[test]
    fn prop_fit_problem_survives_json(problem in sphere_problem()) {
        let map = problem.as_flat_map();
        let json = to_json(&map).unwrap();
        let parsed = from_json(&json).unwrap();
        let restored = fit_problem_from_flat_map(&parsed).unwrap();
        prop_assert_eq!(restored.as_flat_map(), map);
    }

    #[test]
    fn prop_window_masks_points(lo in 0.0..0.2f64, width in 0.01..0.2f64) {
        let q = Array1::linspace(0.005, 0.3, 60);
        let hi = lo + width;
        let expected = q.iter().filter(|&&x| x >= lo && x <= hi).count();
        let data = Dataset1D::new(q.clone(), q.mapv(|x| 2.0 * x + 1.0)).unwrap();

        let mut problem = FitProblem::new(ModelId::Line).unwrap().with_q_range(Some(lo), Some(hi));
        problem.set_parameter("A", 2.0, true).unwrap();
        let engine = problem.engine(&data);
        if expected == 0 {
            prop_assert!(engine.is_err());
        } else {
            let engine = engine.unwrap();
            prop_assert_eq!(engine.n_points(), expected);
            let curve = problem.compute_model(&data).unwrap();
            prop_assert!(curve.x.iter().all(|&x| x >= lo && x <= hi));
            prop_assert!(curve.chi2 < 1e-20);
        }
    }

    #[test]
    fn prop_inversion_problem_round_trip(
        d_max in 10.0..500.0f64,
        n_terms in 1usize..60,
        alpha in 0.0..1.0f64,
        q_min in prop::option::of(0.0..0.05f64),
        q_max in prop::option::of(0.1..0.5f64),
        has_bck in any::<bool>(),
    ) {
        let problem = InversionProblem::new(InversionParams {
            d_max,
            n_terms,
            alpha,
            q_min,
            q_max,
            has_bck,
            ..InversionParams::default()
        });
        let map = problem.as_flat_map();
        prop_assert_eq!(InversionProblem::from_flat_map(&map).unwrap(), problem);
    }
}

#[test]
fn test_form_style_values() {
    // Values posted by a form arrive as text
    let mut map = FlatMap::new();
    map.put("model", "31");
    map.put("A", "2.5");
    map.put("checked_A", "on");
    map.put("B", "-1");
    let problem = fit_problem_from_flat_map(&map).unwrap();
    assert_eq!(problem.model_id, ModelId::Line);
    assert_eq!(problem.parameters.value("A").unwrap(), 2.5);
    assert!(!problem.parameters.get("A").unwrap().is_fixed);
    assert_eq!(problem.parameters.value("B").unwrap(), -1.0);
    assert!(problem.parameters.get("B").unwrap().is_fixed);
}
