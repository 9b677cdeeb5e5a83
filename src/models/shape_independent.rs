//! Empirical and shape-independent functions.

use crate::parameters::ParameterInfo;

pub const DAB_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0),
    ParameterInfo::new("length", "Correlation length", "Å", 50.0),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

/// Debye-Anderson-Brumberger random two-phase medium.
pub fn dab(p: &[f64], q: f64) -> f64 {
    let ql = q * p[1];
    p[0] / (1.0 + ql * ql).powi(2) + p[2]
}

pub const GUINIER_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0),
    ParameterInfo::new("rg", "Radius of gyration", "Å", 60.0),
];

pub fn guinier(p: &[f64], q: f64) -> f64 {
    p[0] * (-(q * p[1]).powi(2) / 3.0).exp()
}

pub const DEBYE_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0),
    ParameterInfo::new("rg", "Radius of gyration", "Å", 50.0),
    ParameterInfo::new("background", "Background", "1/cm", 0.001),
];

/// Gaussian polymer coil.
pub fn debye(p: &[f64], q: f64) -> f64 {
    let x = (q * p[1]).powi(2);
    let shape = if x < 1e-5 {
        1.0 - x / 3.0 + x * x / 12.0
    } else {
        2.0 * ((-x).exp() + x - 1.0) / (x * x)
    };
    p[0] * shape + p[2]
}

pub const POROD_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0e-5),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

pub fn porod(p: &[f64], q: f64) -> f64 {
    p[0] / q.powi(4) + p[1]
}

pub const PEAK_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 100.0),
    ParameterInfo::new("q0", "Peak position", "1/Å", 0.05),
    ParameterInfo::new("B", "Peak width", "1/Å", 0.005),
    ParameterInfo::new("background", "Background", "1/cm", 1.0),
];

pub fn gauss_peak(p: &[f64], q: f64) -> f64 {
    let z = (q - p[1]) / p[2];
    p[0] * (-0.5 * z * z).exp() + p[3]
}

pub fn lorentz_peak(p: &[f64], q: f64) -> f64 {
    let z = (q - p[1]) / p[2];
    p[0] / (1.0 + z * z) + p[3]
}

pub const LORENTZ_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 100.0),
    ParameterInfo::new("length", "Screening length", "Å", 50.0),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

/// Ornstein-Zernike.
pub fn lorentz(p: &[f64], q: f64) -> f64 {
    let ql = q * p[1];
    p[0] / (1.0 + ql * ql) + p[2]
}

pub const POWER_LAW_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0),
    ParameterInfo::new("m", "Exponent", "", 4.0),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

pub fn power_law(p: &[f64], q: f64) -> f64 {
    p[0] * q.powf(-p[1]) + p[2]
}

pub const TEUBNER_STREY_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 0.1),
    ParameterInfo::new("c1", "c1", "", -30.0),
    ParameterInfo::new("c2", "c2", "", 5000.0),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

/// Microemulsion structure, `1 / (a + c1 q² + c2 q⁴)`.
pub fn teubner_strey(p: &[f64], q: f64) -> f64 {
    let q2 = q * q;
    1.0 / (p[0] + p[1] * q2 + p[2] * q2 * q2) + p[3]
}

pub const LINE_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("A", "Slope", "", 1.0),
    ParameterInfo::new("B", "Intercept", "", 1.0),
];

/// `A·x + B`.
pub fn line(p: &[f64], x: f64) -> f64 {
    p[0] * x + p[1]
}
