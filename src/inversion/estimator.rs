//! Heuristic choice of the regularization weight and basis size.

use tracing::debug;

use super::invertor::{InversionParams, Invertor};
use crate::error::Result;

/// Reduction applied to alpha at each step of the search.
const ALPHA_REDUCTION: f64 = 0.33;

pub const ALPHA_TOO_LARGE: &str =
    "The estimated alpha for your system is too large. Try increasing your maximum distance.";

/// Alpha chosen by [`estimate_alpha`] with an optional note for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaEstimate {
    pub alpha: f64,
    pub message: Option<String>,
}

/// Basis size and alpha chosen by [`estimate_numterms`].
#[derive(Debug, Clone, PartialEq)]
pub struct TermEstimate {
    pub n_terms: usize,
    pub alpha: f64,
    pub message: Option<String>,
}

/// Pick alpha for `n_terms` basis functions.
///
/// Starts from the alpha at which penalty and data weigh the same and
/// reduces it until P(r) shows more than one peak, keeping the last value
/// with a single peak.
pub fn estimate_alpha(
    invertor: &Invertor,
    params: &InversionParams,
    n_terms: usize,
) -> Result<AlphaEstimate> {
    let mut trial = InversionParams {
        n_terms,
        ..params.clone()
    };
    let suggested = invertor.reference_alpha(&trial)?;
    trial.alpha = suggested;
    if invertor.invert(&trial)?.peaks() > 1 {
        return Ok(AlphaEstimate {
            alpha: suggested,
            message: None,
        });
    }

    let mut best = suggested;
    let mut found = false;
    let mut factor = 1.0;
    for _ in 0..invertor.config().alpha_steps {
        factor *= ALPHA_REDUCTION;
        trial.alpha = factor * suggested;
        if invertor.invert(&trial)?.peaks() > 1 {
            found = true;
            break;
        }
        best = trial.alpha;
    }

    let message = (found && best >= 0.5 * suggested).then(|| ALPHA_TOO_LARGE.to_string());
    debug!(n_terms, suggested, alpha = best, found, "estimated alpha");
    Ok(AlphaEstimate {
        alpha: best,
        message,
    })
}

/// Pick the basis size, with its alpha.
///
/// Sizes from `nterm_min` up to `nterm_max` (capped by the number of points)
/// are tried until P(r) oscillates too much. Among the sizes whose
/// one-sigma positive fraction falls in the best populated band, the one
/// with median oscillation wins.
pub fn estimate_numterms(invertor: &Invertor, params: &InversionParams) -> Result<TermEstimate> {
    let config = invertor.config();
    let upper = config.nterm_max.min(invertor.len());

    // (pos_err, osc, n_terms, alpha, message)
    let mut trials = Vec::new();
    let mut alpha = params.alpha;
    for n_terms in config.nterm_min..upper {
        let estimate = estimate_alpha(invertor, params, n_terms)?;
        alpha = estimate.alpha;
        let solution = invertor.invert(&InversionParams {
            n_terms,
            alpha,
            ..params.clone()
        })?;
        let osc = solution.oscillations();
        let pos_err = solution.positive_fraction_1sigma();
        debug!(n_terms, alpha, osc, pos_err, "term candidate");
        if osc > 10.0 {
            break;
        }
        trials.push((pos_err, osc, n_terms, alpha, estimate.message));
    }

    for (lo, hi, inclusive) in [(0.9, 1.0, true), (0.8, 0.9, false), (0.7, 0.8, false)] {
        let mut band: Vec<_> = trials
            .iter()
            .filter(|t| t.0 >= lo && (t.0 < hi || (inclusive && t.0 <= hi)))
            .collect();
        if band.is_empty() {
            continue;
        }
        band.sort_by(|a, b| a.1.total_cmp(&b.1));
        let chosen = band[band.len() / 2];
        return Ok(TermEstimate {
            n_terms: chosen.2,
            alpha: chosen.3,
            message: chosen.4.clone(),
        });
    }

    Ok(TermEstimate {
        n_terms: config.nterm_min,
        alpha,
        message: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inversion::basis::ortho_transformed;
    use crate::inversion::InversionConfig;
    use ndarray::Array1;

    /// Intensity of P(r) = 2r sin(πr/D), one smooth peak.
    fn single_peak() -> Invertor {
        let d = 80.0;
        let x = Array1::linspace(0.005, 0.3, 80);
        let y = x.mapv(|q| ortho_transformed(d, 1, q));
        let err = y.mapv(|v: f64| 0.01 * v.abs() + 1.0);
        Invertor::new(x, y, err, InversionConfig::default()).unwrap()
    }

    fn params() -> InversionParams {
        InversionParams {
            d_max: 80.0,
            ..InversionParams::default()
        }
    }

    #[test]
    fn test_alpha_is_positive_and_bounded() {
        let inv = single_peak();
        let reference = inv
            .reference_alpha(&InversionParams {
                n_terms: 10,
                ..params()
            })
            .unwrap();
        let estimate = estimate_alpha(&inv, &params(), 10).unwrap();
        assert!(estimate.alpha > 0.0);
        assert!(estimate.alpha <= reference * (1.0 + 1e-12));
    }

    #[test]
    fn test_alpha_is_deterministic() {
        let inv = single_peak();
        let first = estimate_alpha(&inv, &params(), 12).unwrap();
        let second = estimate_alpha(&inv, &params(), 12).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_numterms_within_range() {
        let inv = single_peak();
        let estimate = estimate_numterms(&inv, &params()).unwrap();
        let config = inv.config();
        assert!(estimate.n_terms >= config.nterm_min);
        assert!(estimate.n_terms < config.nterm_max);
        assert!(estimate.alpha >= 0.0);
    }

    #[test]
    fn test_numterms_fallback_with_few_points() {
        let x = Array1::linspace(0.01, 0.1, 8);
        let y = x.mapv(|q| ortho_transformed(50.0, 1, q));
        let inv = Invertor::new(x, y, Array1::ones(8), InversionConfig::default()).unwrap();
        let estimate = estimate_numterms(&inv, &params()).unwrap();
        assert_eq!(estimate.n_terms, 10);
        assert_eq!(estimate.alpha, params().alpha);
        assert!(estimate.message.is_none());
    }
}
