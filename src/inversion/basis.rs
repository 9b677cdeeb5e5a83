//! Orthogonal sine basis for P(r) and its Fourier transforms.
//!
//! `P(r) = Σ cₙ φₙ(r)` with `φₙ(r) = 2r sin(πnr/D)` for `n = 1..=N`, which
//! vanishes at `r = 0` and `r = D`. The functions below are indexed by that
//! `n`, starting at one.

use std::f64::consts::PI;

/// Relative distance from the `qD = πn` singularity below which the limit is used.
const SINGULAR_TOLERANCE: f64 = 1e-9;

/// `(-1)^(n+1)`.
fn alternating(n: usize) -> f64 {
    if n % 2 == 1 {
        1.0
    } else {
        -1.0
    }
}

/// Basis function `φₙ(r) = 2r sin(πnr/D)`.
pub fn ortho(d_max: f64, n: usize, r: f64) -> f64 {
    2.0 * r * (PI * n as f64 * r / d_max).sin()
}

/// First derivative `dφₙ/dr`.
pub fn ortho_derived(d_max: f64, n: usize, r: f64) -> f64 {
    let a = PI * n as f64 / d_max;
    2.0 * (a * r).sin() + 2.0 * r * a * (a * r).cos()
}

/// Second derivative `d²φₙ/dr²`, used by the smoothness penalty.
pub fn ortho_second_derived(d_max: f64, n: usize, r: f64) -> f64 {
    let a = PI * n as f64 / d_max;
    4.0 * a * (a * r).cos() - 2.0 * a * a * r * (a * r).sin()
}

/// Contribution of `φₙ` to I(q):
/// `8π²Dn(-1)^(n+1) sin(qD) / (q((πn)² - (qD)²))`.
pub fn ortho_transformed(d_max: f64, n: usize, q: f64) -> f64 {
    let pn = PI * n as f64;
    let qd = q * d_max;
    if q == 0.0 {
        return 8.0 * d_max * d_max * alternating(n) / n as f64;
    }
    if (qd - pn).abs() <= SINGULAR_TOLERANCE * pn {
        return 4.0 * PI * d_max / q;
    }
    8.0 * PI * PI * d_max * n as f64 * alternating(n) * qd.sin() / (q * (pn * pn - qd * qd))
}

/// [`ortho_transformed`] averaged over a slit of the given height and width,
/// sampled on an `npts × npts` grid. Samples at zero Q are skipped.
pub fn ortho_transformed_smeared(
    d_max: f64,
    n: usize,
    q: f64,
    height: f64,
    width: f64,
    npts: usize,
) -> f64 {
    let steps = npts.saturating_sub(1).max(1) as f64;
    let n_height = if height > 0.0 { npts.max(1) } else { 1 };
    let n_width = if width > 0.0 { npts.max(1) } else { 1 };

    let mut sum = 0.0;
    let mut count = 0usize;
    for j in 0..n_height {
        let z = if height > 0.0 { height / steps * j as f64 } else { 0.0 };
        for i in 0..n_width {
            let y = if width > 0.0 { -0.5 * width + width / steps * i as f64 } else { 0.0 };
            let q2 = (q - y) * (q - y) + z * z;
            if q2 > 0.0 {
                sum += ortho_transformed(d_max, n, q2.sqrt());
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
