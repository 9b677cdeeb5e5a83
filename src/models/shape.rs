//! Spherical and planar form factors.
//!
//! Intensities are in 1/cm for lengths in Å and scattering length densities
//! in 1/Å², hence the 1e8 conversion factor.

use std::f64::consts::PI;

use crate::parameters::ParameterInfo;

const CM_PER_ANGSTROM: f64 = 1.0e8;

/// Normalized sphere amplitude `3 (sin x - x cos x) / x³`, 1 at x = 0.
pub fn sphere_amplitude(x: f64) -> f64 {
    if x.abs() < 1e-3 {
        // Taylor expansion avoids cancellation near zero
        1.0 - x * x / 10.0
    } else {
        3.0 * (x.sin() - x * x.cos()) / x.powi(3)
    }
}

fn sphere_volume(r: f64) -> f64 {
    4.0 / 3.0 * PI * r.powi(3)
}

pub const SPHERE_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0),
    ParameterInfo::new("radius", "Radius", "Å", 60.0),
    ParameterInfo::new("contrast", "Contrast", "1/Å²", 1.0e-6),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

/// Homogeneous sphere.
pub fn sphere(p: &[f64], q: f64) -> f64 {
    let (scale, radius, contrast, background) = (p[0], p[1], p[2], p[3]);
    let v = sphere_volume(radius);
    let f = sphere_amplitude(q * radius);
    scale * v * (contrast * f).powi(2) * CM_PER_ANGSTROM + background
}

pub const CORE_SHELL_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0),
    ParameterInfo::new("radius", "Core radius", "Å", 60.0),
    ParameterInfo::new("thickness", "Shell thickness", "Å", 10.0),
    ParameterInfo::new("core_sld", "Core SLD", "1/Å²", 1.0e-6),
    ParameterInfo::new("shell_sld", "Shell SLD", "1/Å²", 2.0e-6),
    ParameterInfo::new("solvent_sld", "Solvent SLD", "1/Å²", 3.0e-6),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

/// Sphere with one concentric shell, normalized by the outer volume.
pub fn core_shell(p: &[f64], q: f64) -> f64 {
    let (scale, radius, thickness, core, shell, solvent, background) =
        (p[0], p[1], p[2], p[3], p[4], p[5], p[6]);
    let outer = radius + thickness;
    let (vc, vt) = (sphere_volume(radius), sphere_volume(outer));
    let f = vc * (core - shell) * sphere_amplitude(q * radius)
        + vt * (shell - solvent) * sphere_amplitude(q * outer);
    if vt <= 0.0 {
        return background;
    }
    scale * f * f / vt * CM_PER_ANGSTROM + background
}

pub const VESICLE_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0),
    ParameterInfo::new("radius", "Core radius", "Å", 100.0),
    ParameterInfo::new("thickness", "Shell thickness", "Å", 30.0),
    ParameterInfo::new("core_sld", "Core (solvent) SLD", "1/Å²", 6.36e-6),
    ParameterInfo::new("shell_sld", "Shell SLD", "1/Å²", 5.0e-7),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

/// Hollow spherical shell filled with solvent, normalized by the shell volume.
pub fn vesicle(p: &[f64], q: f64) -> f64 {
    let (scale, radius, thickness, core, shell, background) = (p[0], p[1], p[2], p[3], p[4], p[5]);
    let outer = radius + thickness;
    let (vc, vt) = (sphere_volume(radius), sphere_volume(outer));
    let v_shell = vt - vc;
    if v_shell <= 0.0 {
        return background;
    }
    let f = (shell - core) * (vt * sphere_amplitude(q * outer) - vc * sphere_amplitude(q * radius));
    scale * f * f / v_shell * CM_PER_ANGSTROM + background
}

pub const LAMELLAR_PARAMS: &[ParameterInfo] = &[
    ParameterInfo::new("scale", "Scale factor", "", 1.0),
    ParameterInfo::new("bi_thick", "Bilayer thickness", "Å", 50.0),
    ParameterInfo::new("sld_bi", "Bilayer SLD", "1/Å²", 1.0e-6),
    ParameterInfo::new("sld_sol", "Solvent SLD", "1/Å²", 6.3e-6),
    ParameterInfo::new("background", "Background", "1/cm", 0.0),
];

/// Randomly oriented infinite sheets of uniform thickness.
pub fn lamellar(p: &[f64], q: f64) -> f64 {
    let (scale, thickness, sld_bi, sld_sol, background) = (p[0], p[1], p[2], p[3], p[4]);
    let contrast = sld_bi - sld_sol;
    if q == 0.0 || thickness <= 0.0 {
        return background;
    }
    let pq = 2.0 * contrast * contrast / (q * q) * (1.0 - (q * thickness).cos());
    2.0 * PI * scale * pq / (q * q) / thickness * CM_PER_ANGSTROM + background
}
