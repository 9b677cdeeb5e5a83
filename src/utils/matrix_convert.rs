//! Matrix conversion utilities.
//!
//! Data lives in ndarray containers throughout the crate. The solver forms its
//! normal equations with faer products and hands them to nalgebra for the
//! decompositions, so these helpers move dense `f64` data between the three
//! layouts.

use crate::error::Result;
use faer::{Col, Mat};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

// === ndarray -> faer ===

/// Convert an ndarray Array2 to a faer Mat.
pub fn ndarray_to_faer(arr: &Array2<f64>) -> Result<Mat<f64>> {
    Ok(Mat::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]]))
}

/// Convert an ndarray Array1 to a faer Col (column vector).
pub fn ndarray_vec_to_faer(arr: &Array1<f64>) -> Result<Col<f64>> {
    Ok(Col::from_fn(arr.len(), |i| arr[i]))
}

// === faer -> nalgebra ===

/// Convert a faer Mat to a nalgebra DMatrix.
///
/// faer and nalgebra are both column-major, but the copy goes element by
/// element so no layout assumption leaks out of this function.
pub fn faer_to_nalgebra(mat: &Mat<f64>) -> Result<DMatrix<f64>> {
    Ok(DMatrix::from_fn(mat.nrows(), mat.ncols(), |i, j| mat[(i, j)]))
}

/// Convert a faer Col to a nalgebra DVector.
pub fn faer_vec_to_nalgebra(col: &Col<f64>) -> Result<DVector<f64>> {
    Ok(DVector::from_fn(col.nrows(), |i, _| col[i]))
}

// === ndarray <-> nalgebra ===

/// Convert an ndarray Array2 to a nalgebra DMatrix.
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> Result<DMatrix<f64>> {
    Ok(DMatrix::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]]))
}

/// Convert a nalgebra DMatrix to an ndarray Array2.
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Result<Array2<f64>> {
    Ok(Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| {
        mat[(i, j)]
    }))
}

/// Convert an ndarray Array1 to a nalgebra DVector.
pub fn ndarray_vec_to_nalgebra(arr: &Array1<f64>) -> Result<DVector<f64>> {
    Ok(DVector::from_iterator(arr.len(), arr.iter().copied()))
}

/// Convert a nalgebra DVector to an ndarray Array1.
pub fn nalgebra_vec_to_ndarray(vec: &DVector<f64>) -> Result<Array1<f64>> {
    Ok(vec.iter().copied().collect())
}
