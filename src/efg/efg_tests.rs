use std::cell::Cell;

use approx;
use nalgebra::{Matrix3, Vector3};
use ndarray::array;

use crate::auxiliary::structure::{
    AtomicStructure, InfoValue, PropertyStore, Structure, EFG_ARRAY,
};
use crate::efg::{
    efg_anisotropy_with, efg_asymmetry_with, efg_diagonal, efg_diagonal_with,
    efg_quaternions_with, efg_reduced_anisotropy_with, efg_skew_with, efg_span_with,
    efg_vzz, efg_vzz_with, EfgError, EFG_EVALS_HSORT_KEY, EFG_EVALS_KEY, EFG_EVECS_KEY,
};
use crate::tensor::{Diagonaliser, EigenResult, SymmetricEigenDiagonaliser};

/// A diagonaliser counting how many batch passes it performs.
#[derive(Default)]
pub(crate) struct CountingDiagonaliser {
    pub(crate) passes: Cell<usize>,
}

impl Diagonaliser for CountingDiagonaliser {
    fn diagonalise(&self, tensors: &[Matrix3<f64>]) -> Vec<EigenResult> {
        self.passes.set(self.passes.get() + 1);
        SymmetricEigenDiagonaliser.diagonalise(tensors)
    }
}

/// A diagonaliser that drops the last tensor.
struct ShortDiagonaliser;

impl Diagonaliser for ShortDiagonaliser {
    fn diagonalise(&self, tensors: &[Matrix3<f64>]) -> Vec<EigenResult> {
        let mut eigs = SymmetricEigenDiagonaliser.diagonalise(tensors);
        eigs.pop();
        eigs
    }
}

pub(crate) fn axial_structure() -> Structure {
    Structure::from_efg_rows(
        &["Na"],
        &[[[1.0, 0.0, 0.0], [0.0, -2.0, 0.0], [0.0, 0.0, 1.0]]],
    )
    .unwrap()
}

fn two_site_structure() -> Structure {
    Structure::from_efg_rows(
        &["Na", "Cl"],
        &[
            [[1.0, 0.0, 0.0], [0.0, -2.0, 0.0], [0.0, 0.0, 1.0]],
            [[-4.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 1.0]],
        ],
    )
    .unwrap()
}

#[test]
fn test_efg_missing_data() {
    let mut structure = Structure::new(&["Na", "Cl"]).unwrap();
    let diag = CountingDiagonaliser::default();
    let err = efg_anisotropy_with(&mut structure, false, &diag).unwrap_err();
    assert!(matches!(err, EfgError::MissingData(_)));
    assert!(efg_span_with(&mut structure, true, &diag).is_err());
    assert!(efg_quaternions_with(&mut structure, false, &diag).is_err());
    assert!(efg_diagonal_with(&mut structure, true, &diag).is_err());
    assert_eq!(diag.passes.get(), 0);
    assert!(structure.info().is_empty());
}

#[test]
fn test_efg_axial_tensor() {
    let mut structure = axial_structure();
    let diag = CountingDiagonaliser::default();

    let eigs = efg_diagonal_with(&mut structure, true, &diag).unwrap();
    approx::assert_relative_eq!(eigs[0].evals, Vector3::new(-2.0, 1.0, 1.0), epsilon = 1e-12);
    let hsort = structure
        .info()
        .get_info(EFG_EVALS_HSORT_KEY)
        .and_then(InfoValue::as_triplets)
        .unwrap()
        .clone();
    approx::assert_relative_eq!(hsort, array![[1.0, 1.0, -2.0]], epsilon = 1e-12);

    let vzz = efg_vzz_with(&mut structure, false, &diag).unwrap();
    approx::assert_relative_eq!(vzz[0], -2.0, epsilon = 1e-12);
    let aniso = efg_anisotropy_with(&mut structure, false, &diag).unwrap();
    approx::assert_relative_eq!(aniso[0], -3.0, epsilon = 1e-12);
    let red_aniso = efg_reduced_anisotropy_with(&mut structure, false, &diag).unwrap();
    approx::assert_relative_eq!(red_aniso[0], -2.0, epsilon = 1e-12);
    let asym = efg_asymmetry_with(&mut structure, false, &diag).unwrap();
    approx::assert_relative_eq!(asym[0], 0.0, epsilon = 1e-12);
    let span = efg_span_with(&mut structure, false, &diag).unwrap();
    approx::assert_relative_eq!(span[0], 3.0, epsilon = 1e-12);
    let skew = efg_skew_with(&mut structure, false, &diag).unwrap();
    approx::assert_relative_eq!(skew[0], 1.0, epsilon = 1e-12);

    assert_eq!(diag.passes.get(), 1);
}

#[test]
fn test_efg_compute_once_cache_three() {
    let mut structure = two_site_structure();
    let diag = CountingDiagonaliser::default();
    assert!(!structure.info().has_info(EFG_EVALS_KEY));

    let vzz = efg_vzz_with(&mut structure, false, &diag).unwrap();
    assert_eq!(vzz.len(), 2);
    assert_eq!(diag.passes.get(), 1);
    let info = structure.info();
    assert_eq!(info.get_info(EFG_EVALS_KEY).unwrap().len(), 2);
    assert_eq!(info.get_info(EFG_EVALS_HSORT_KEY).unwrap().len(), 2);
    assert_eq!(info.get_info(EFG_EVECS_KEY).unwrap().len(), 2);

    // The ascending and eigenvector entries are served from the cache too.
    efg_span_with(&mut structure, false, &diag).unwrap();
    efg_skew_with(&mut structure, false, &diag).unwrap();
    efg_quaternions_with(&mut structure, false, &diag).unwrap();
    assert_eq!(diag.passes.get(), 1);
}

#[test]
fn test_efg_force_recalc() {
    let mut structure = two_site_structure();
    let diag = CountingDiagonaliser::default();
    efg_anisotropy_with(&mut structure, false, &diag).unwrap();
    efg_anisotropy_with(&mut structure, false, &diag).unwrap();
    assert_eq!(diag.passes.get(), 1);
    efg_anisotropy_with(&mut structure, true, &diag).unwrap();
    assert_eq!(diag.passes.get(), 2);
    efg_asymmetry_with(&mut structure, true, &diag).unwrap();
    assert_eq!(diag.passes.get(), 3);
    efg_asymmetry_with(&mut structure, false, &diag).unwrap();
    assert_eq!(diag.passes.get(), 3);
}

#[test]
fn test_efg_diagonal_without_saving() {
    let mut structure = two_site_structure();
    let diag = CountingDiagonaliser::default();
    let eigs = efg_diagonal_with(&mut structure, false, &diag).unwrap();
    assert_eq!(eigs.len(), 2);
    assert!(structure.info().is_empty());

    // A later property still needs its own pass.
    efg_span_with(&mut structure, false, &diag).unwrap();
    assert_eq!(diag.passes.get(), 2);
}

#[test]
fn test_efg_cache_not_invalidated_on_mutation() {
    let mut structure = axial_structure();
    let before = efg_vzz(&mut structure, false).unwrap();
    structure
        .set_array(EFG_ARRAY, vec![Matrix3::from_diagonal(&Vector3::new(-1.0, -1.0, 2.0))])
        .unwrap();
    let cached = efg_vzz(&mut structure, false).unwrap();
    assert_eq!(cached, before);
    let fresh = efg_vzz(&mut structure, true).unwrap();
    approx::assert_relative_eq!(fresh[0], 2.0, epsilon = 1e-12);
}

#[test]
fn test_efg_stale_cache_length() {
    let mut structure = two_site_structure();
    structure
        .info_mut()
        .set_info(EFG_EVALS_HSORT_KEY, InfoValue::Triplets(array![[1.0, 1.0, -2.0]]));
    let err = efg_vzz(&mut structure, false).unwrap_err();
    assert!(matches!(err, EfgError::InvalidInput(_)));
    assert_eq!(efg_vzz(&mut structure, true).unwrap().len(), 2);
}

#[test]
fn test_efg_index_alignment() {
    let mut structure = two_site_structure();
    let vzz = efg_vzz(&mut structure, false).unwrap();
    // Second site: eigenvalues -4, 1, 3 with iso 0; -4 deviates the most.
    approx::assert_relative_eq!(vzz, array![-2.0, -4.0], epsilon = 1e-12);
    let diag = SymmetricEigenDiagonaliser;
    let span = efg_span_with(&mut structure, false, &diag).unwrap();
    approx::assert_relative_eq!(span, array![3.0, 7.0], epsilon = 1e-12);
}

#[test]
fn test_efg_asymmetric_tensor_is_symmetrised() {
    let mut structure = Structure::from_efg_rows(
        &["O"],
        &[[[2.0, 1.0, 0.0], [-1.0, 2.0, 0.0], [0.0, 0.0, -4.0]]],
    )
    .unwrap();
    let eigs = efg_diagonal(&mut structure, false).unwrap();
    approx::assert_relative_eq!(eigs[0].evals, Vector3::new(-4.0, 2.0, 2.0), epsilon = 1e-12);
}

#[test]
fn test_efg_quaternions() {
    let mut structure = axial_structure();
    let diag = SymmetricEigenDiagonaliser;
    let quats = efg_quaternions_with(&mut structure, false, &diag).unwrap();
    assert_eq!(quats.len(), 1);
    // The rotation maps the principal axis of -2 onto y.
    let evecs = structure
        .info()
        .get_info(EFG_EVECS_KEY)
        .and_then(InfoValue::as_tensors)
        .unwrap()[0];
    let proper = evecs * evecs.determinant().signum();
    approx::assert_relative_eq!(
        quats[0].to_rotation_matrix().into_inner(),
        proper.transpose(),
        epsilon = 1e-10
    );
}

#[test]
fn test_efg_misbehaving_diagonaliser() {
    let mut structure = two_site_structure();
    let err = efg_vzz_with(&mut structure, false, &ShortDiagonaliser).unwrap_err();
    assert!(matches!(err, EfgError::InvalidInput(_)));
    assert!(!structure.info().has_info(EFG_EVALS_HSORT_KEY));
}
