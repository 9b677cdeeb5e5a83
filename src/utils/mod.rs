//! Numerical helpers shared by the solver, the fit engine and the inversion.

pub mod finite_difference;
pub mod linalg;
pub mod matrix_convert;

pub use finite_difference::jacobian;
pub use linalg::{invert_symmetric, lstsq_svd, pseudo_inverse, solve_damped};
pub use matrix_convert::{
    faer_to_nalgebra, faer_vec_to_nalgebra, nalgebra_to_ndarray, nalgebra_vec_to_ndarray,
    ndarray_to_faer, ndarray_to_nalgebra, ndarray_vec_to_faer, ndarray_vec_to_nalgebra,
};
