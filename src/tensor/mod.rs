//! Symmetrisation, diagonalisation and Haeberlen ordering of rank-2 tensors.

use std::error::Error;
use std::fmt;

use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

pub mod invariants;

#[cfg(test)]
#[path = "tensor_tests.rs"]
mod tensor_tests;

#[derive(Debug, Clone)]
pub struct TensorError(pub String);

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tensor error: {}", self.0)
    }
}

impl Error for TensorError {}

/// A structure containing the spectral decomposition of a symmetric $`3 \times 3`$ tensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EigenResult {
    /// The eigenvalues in ascending order.
    pub evals: Vector3<f64>,

    /// The orthonormal eigenvectors, column $`i`$ belonging to eigenvalue $`i`$.
    pub evecs: Matrix3<f64>,
}

/// Trait for batch diagonalisers of $`3 \times 3`$ tensors.
///
/// Implementors must symmetrise every tensor before decomposing it and must return exactly one
/// [`EigenResult`] per input tensor, in input order, with eigenvalues in ascending order.
pub trait Diagonaliser {
    fn diagonalise(&self, tensors: &[Matrix3<f64>]) -> Vec<EigenResult>;
}

/// Diagonaliser based on `nalgebra`'s symmetric eigen-decomposition.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymmetricEigenDiagonaliser;

impl Diagonaliser for SymmetricEigenDiagonaliser {
    fn diagonalise(&self, tensors: &[Matrix3<f64>]) -> Vec<EigenResult> {
        log::debug!("Diagonalising {} tensor(s).", tensors.len());
        tensors.iter().map(diagonalise_symmetric).collect()
    }
}

/// Returns the symmetric part $`(\mathbf{M} + \mathbf{M}^{\mathrm{T}})/2`$ of a tensor.
pub fn symmetrise(tensor: &Matrix3<f64>) -> Matrix3<f64> {
    (tensor + tensor.transpose()) * 0.5
}

/// Symmetrises and diagonalises a single tensor.
///
/// # Arguments
///
/// * `tensor` - A $`3 \times 3`$ tensor, not necessarily symmetric.
///
/// # Returns
///
/// The eigenvalues in ascending order together with their eigenvectors.
pub fn diagonalise_symmetric(tensor: &Matrix3<f64>) -> EigenResult {
    let eig = symmetrise(tensor).symmetric_eigen();
    let order = (0..3)
        .sorted_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]))
        .collect_vec();
    let evals = Vector3::from_fn(|i, _| eig.eigenvalues[order[i]]);
    let evecs = Matrix3::from_fn(|row, col| eig.eigenvectors[(row, order[col])]);
    EigenResult { evals, evecs }
}

/// Builds a $`3 \times 3`$ tensor from row-major nested vectors.
///
/// # Errors
///
/// Errors if `rows` is not exactly three rows of three elements each.
pub fn matrix3_from_rows(rows: &[Vec<f64>]) -> Result<Matrix3<f64>, TensorError> {
    if rows.len() != 3 || rows.iter().any(|row| row.len() != 3) {
        return Err(TensorError(format!(
            "expected a 3 × 3 tensor, got rows of lengths [{}]",
            rows.iter().map(Vec::len).join(", ")
        )));
    }
    Ok(Matrix3::from_fn(|i, j| rows[i][j]))
}

/// Reorders an eigenvalue triplet by the Haeberlen convention.
///
/// With $`\delta_i = |e_i - e_{\mathrm{iso}}|`$, the result is
/// $`(e_{\delta\text{-mid}}, e_{\delta\text{-min}}, e_{\delta\text{-max}})`$, so that
/// $`|r_1 - e_{\mathrm{iso}}| \le |r_0 - e_{\mathrm{iso}}| \le |r_2 - e_{\mathrm{iso}}|`$.
/// Ties in $`\delta`$ keep their input order.
pub fn haeberlen_order(evals: [f64; 3]) -> [f64; 3] {
    let iso = evals.iter().sum::<f64>() / 3.0;
    let by_deviation = (0..3)
        .sorted_by(|&i, &j| (evals[i] - iso).abs().total_cmp(&(evals[j] - iso).abs()))
        .collect_vec();
    [
        evals[by_deviation[1]],
        evals[by_deviation[0]],
        evals[by_deviation[2]],
    ]
}

/// Applies [`haeberlen_order`] to every row of an $`N \times 3`$ array of eigenvalues.
pub fn haeberlen_sort(evals: &Array2<f64>) -> Array2<f64> {
    let mut sorted = evals.clone();
    sorted.axis_iter_mut(Axis(0)).for_each(|mut row| {
        let ordered = haeberlen_order([row[0], row[1], row[2]]);
        row.iter_mut()
            .zip(ordered.iter())
            .for_each(|(dst, src)| *dst = *src);
    });
    sorted
}

/// Collects the eigenvalues of a batch of decompositions into an $`N \times 3`$ array.
pub fn evals_array(eigs: &[EigenResult]) -> Array2<f64> {
    Array2::from_shape_fn((eigs.len(), 3), |(i, j)| eigs[i].evals[j])
}

/// Converts eigenvector matrices into the unit quaternions describing the rotation of each
/// tensor's principal axis system with respect to the Cartesian axes.
///
/// Each eigenvector matrix is first multiplied by its determinant so that it represents a
/// proper rotation.
pub fn evecs_to_quaternions(evecs: &[Matrix3<f64>]) -> Vec<UnitQuaternion<f64>> {
    evecs
        .iter()
        .map(|evec| {
            let proper = evec * evec.determinant().signum();
            UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(
                proper.transpose(),
            ))
        })
        .collect()
}
