//! Scalar invariants of diagonalised tensors.
//!
//! Every function maps an $`N \times 3`$ array of eigenvalue triplets to one scalar per row.
//! [`anisotropy`] and [`asymmetry`] expect Haeberlen-ordered triplets (see
//! [`super::haeberlen_sort`]); [`span`] and [`skew`] accept any ordering.
//!
//! Degenerate tensors give non-finite values in [`asymmetry`] (zero anisotropy) and [`skew`]
//! (zero span). These are returned as they are.

use ndarray::{Array1, Array2, Axis};

#[cfg(test)]
#[path = "invariants_tests.rs"]
mod invariants_tests;

/// Calculates the anisotropy $`\Delta = e_2 - (e_0 + e_1)/2`$ of Haeberlen-ordered triplets.
///
/// # Arguments
///
/// * `haeb_evals` - Haeberlen-ordered eigenvalue triplets, one per row.
/// * `reduced` - If `true`, returns the reduced anisotropy $`\frac{2}{3}\Delta`$.
pub fn anisotropy(haeb_evals: &Array2<f64>, reduced: bool) -> Array1<f64> {
    let f = if reduced { 2.0 / 3.0 } else { 1.0 };
    haeb_evals.map_axis(Axis(1), |row| (row[2] - (row[0] + row[1]) / 2.0) * f)
}

/// Calculates the asymmetry $`\eta = (e_1 - e_0)/\delta`$ of Haeberlen-ordered triplets, where
/// $`\delta`$ is the reduced anisotropy.
pub fn asymmetry(haeb_evals: &Array2<f64>) -> Array1<f64> {
    let numerator = haeb_evals.column(1).to_owned() - haeb_evals.column(0);
    numerator / anisotropy(haeb_evals, true)
}

/// Calculates the span $`\max(e) - \min(e)`$.
pub fn span(evals: &Array2<f64>) -> Array1<f64> {
    evals.map_axis(Axis(1), |row| {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = row.iter().cloned().fold(f64::INFINITY, f64::min);
        max - min
    })
}

/// Calculates the skew $`3(\tilde{e} - \bar{e})/\Omega`$, where $`\tilde{e}`$ is the median,
/// $`\bar{e}`$ the mean and $`\Omega`$ the span of each triplet.
pub fn skew(evals: &Array2<f64>) -> Array1<f64> {
    let offsets = evals.map_axis(Axis(1), |row| {
        let mut sorted = [row[0], row[1], row[2]];
        sorted.sort_by(f64::total_cmp);
        let mean = sorted.iter().sum::<f64>() / 3.0;
        3.0 * (sorted[1] - mean)
    });
    offsets / span(evals)
}
