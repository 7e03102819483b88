use approx;
use nalgebra::{Matrix3, Vector3};
use ndarray::array;
use proptest::prelude::*;

use crate::tensor::{
    diagonalise_symmetric, evals_array, evecs_to_quaternions, haeberlen_order, haeberlen_sort,
    matrix3_from_rows, symmetrise, Diagonaliser, SymmetricEigenDiagonaliser,
};

#[test]
fn test_tensor_symmetrise() {
    let m = Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
    let s = symmetrise(&m);
    assert_eq!(s, s.transpose());
    assert_eq!(s[(0, 1)], 3.0);
    assert_eq!(s[(0, 2)], 5.0);
    assert_eq!(s[(1, 2)], 7.0);
    assert_eq!(s.diagonal(), m.diagonal());

    let already = Matrix3::new(1.0, 0.5, 0.0, 0.5, -2.0, 0.0, 0.0, 0.0, 1.0);
    assert_eq!(symmetrise(&already), already);
}

#[test]
fn test_tensor_diagonalise_diagonal() {
    let m = Matrix3::new(1.0, 0.0, 0.0, 0.0, -2.0, 0.0, 0.0, 0.0, 1.0);
    let eig = diagonalise_symmetric(&m);
    approx::assert_relative_eq!(eig.evals, Vector3::new(-2.0, 1.0, 1.0), epsilon = 1e-12);
    // The eigenvector of -2 is along y.
    approx::assert_relative_eq!(eig.evecs.column(0).abs(), Vector3::y(), epsilon = 1e-12);
}

#[test]
fn test_tensor_diagonalise_asymmetric_input() {
    // Only the symmetric part contributes.
    let m = Matrix3::new(2.0, 1.0, 0.0, -1.0, 2.0, 0.0, 0.0, 0.0, -4.0);
    let eig = diagonalise_symmetric(&m);
    approx::assert_relative_eq!(eig.evals, Vector3::new(-4.0, 2.0, 2.0), epsilon = 1e-12);
}

#[test]
fn test_tensor_diagonalise_reconstructs_tensor() {
    let m = Matrix3::new(3.0, 1.0, -0.5, 1.0, -1.0, 0.25, -0.5, 0.25, -2.0);
    let eig = diagonalise_symmetric(&m);
    assert!(eig.evals[0] <= eig.evals[1] && eig.evals[1] <= eig.evals[2]);
    let reconstructed = eig.evecs * Matrix3::from_diagonal(&eig.evals) * eig.evecs.transpose();
    approx::assert_relative_eq!(reconstructed, m, epsilon = 1e-10);
    approx::assert_relative_eq!(
        eig.evecs.transpose() * eig.evecs,
        Matrix3::identity(),
        epsilon = 1e-10
    );
}

#[test]
fn test_tensor_diagonaliser_preserves_order() {
    let tensors = vec![
        Matrix3::from_diagonal(&Vector3::new(3.0, 2.0, 1.0)),
        Matrix3::from_diagonal(&Vector3::new(-1.0, 5.0, 0.0)),
    ];
    let eigs = SymmetricEigenDiagonaliser.diagonalise(&tensors);
    assert_eq!(eigs.len(), 2);
    let evals = evals_array(&eigs);
    approx::assert_relative_eq!(evals, array![[1.0, 2.0, 3.0], [-1.0, 0.0, 5.0]], epsilon = 1e-12);
}

#[test]
fn test_tensor_matrix3_from_rows() {
    let m = matrix3_from_rows(&[
        vec![1.0, 2.0, 3.0],
        vec![4.0, 5.0, 6.0],
        vec![7.0, 8.0, 9.0],
    ])
    .unwrap();
    assert_eq!(m[(1, 0)], 4.0);
    assert_eq!(m[(0, 2)], 3.0);

    let err = matrix3_from_rows(&[vec![1.0, 2.0], vec![4.0, 5.0]]).unwrap_err();
    assert!(err.to_string().contains("[2, 2]"));
    assert!(matrix3_from_rows(&[vec![0.0; 3], vec![0.0; 3], vec![0.0; 4]]).is_err());
}

#[test]
fn test_tensor_haeberlen_order() {
    // iso = 0: deviations 2, 1, 1.
    assert_eq!(haeberlen_order([-2.0, 1.0, 1.0]), [1.0, 1.0, -2.0]);
    // iso = 8/3: deviations 8/3, 1/3, 7/3.
    assert_eq!(haeberlen_order([0.0, 3.0, 5.0]), [5.0, 3.0, 0.0]);
    // iso = 1: deviations 3, 0, 3; ties keep input order.
    assert_eq!(haeberlen_order([-2.0, 1.0, 4.0]), [-2.0, 1.0, 4.0]);
    // iso = 1/3: deviations 10/3, 1/3, 11/3.
    assert_eq!(haeberlen_order([-3.0, 0.0, 4.0]), [-3.0, 0.0, 4.0]);
    // iso = -1/3: deviations 11/3, 1/3, 10/3.
    assert_eq!(haeberlen_order([-4.0, 0.0, 3.0]), [3.0, 0.0, -4.0]);
}

#[test]
fn test_tensor_haeberlen_sort_rows() {
    let evals = array![[-2.0, 1.0, 1.0], [-4.0, 0.0, 3.0]];
    let sorted = haeberlen_sort(&evals);
    assert_eq!(sorted, array![[1.0, 1.0, -2.0], [3.0, 0.0, -4.0]]);
    // The input is left untouched.
    assert_eq!(evals[(0, 0)], -2.0);
}

#[test]
fn test_tensor_evecs_to_quaternions() {
    let identity = Matrix3::identity();
    let inverted = -Matrix3::identity();
    let quats = evecs_to_quaternions(&[identity, inverted]);
    approx::assert_relative_eq!(quats[0].angle(), 0.0, epsilon = 1e-12);
    approx::assert_relative_eq!(quats[1].angle(), 0.0, epsilon = 1e-12);

    // A rotation by 90° about z.
    let rot = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
    let quat = evecs_to_quaternions(&[rot])[0];
    approx::assert_relative_eq!(quat.angle(), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    approx::assert_relative_eq!(
        quat.to_rotation_matrix().into_inner(),
        rot.transpose(),
        epsilon = 1e-12
    );
}

fn symmetric_tensor(elements: [f64; 6]) -> Matrix3<f64> {
    let [a, b, c, d, e, f] = elements;
    Matrix3::new(a, d, e, d, b, f, e, f, c)
}

proptest! {
    #[test]
    fn prop_tensor_eigenvalue_sum_equals_trace(
        elements in proptest::array::uniform6(-10.0f64..10.0)
    ) {
        let m = symmetric_tensor(elements);
        let eig = diagonalise_symmetric(&m);
        prop_assert!((eig.evals.sum() - m.trace()).abs() < 1e-9);
        prop_assert!(eig.evals[0] <= eig.evals[1] && eig.evals[1] <= eig.evals[2]);
    }

    #[test]
    fn prop_tensor_haeberlen_ordering(
        evals in proptest::array::uniform3(-100.0f64..100.0)
    ) {
        let mut ascending = evals;
        ascending.sort_by(f64::total_cmp);
        let iso = ascending.iter().sum::<f64>() / 3.0;
        let h = haeberlen_order(ascending);
        prop_assert!((h[1] - iso).abs() <= (h[0] - iso).abs());
        prop_assert!((h[0] - iso).abs() <= (h[2] - iso).abs());
        let mut resorted = h;
        resorted.sort_by(f64::total_cmp);
        prop_assert_eq!(resorted, ascending);
    }
}
