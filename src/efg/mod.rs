//! Electric field gradient (EFG) properties of atomic structures.
//!
//! Every operation diagonalises the symmetrised EFG tensors of a structure at most once and
//! memoises the outcome in the structure's side-store under three entries:
//! - [`EFG_EVALS_KEY`]: eigenvalues in ascending order ($`N \times 3`$),
//! - [`EFG_EVALS_HSORT_KEY`]: eigenvalues in Haeberlen order ($`N \times 3`$),
//! - [`EFG_EVECS_KEY`]: eigenvectors ($`N`$ matrices).
//!
//! Later operations reuse these entries unless `force_recalc` is set. Entries are never
//! invalidated when the structure changes; callers replacing the EFG array must force a
//! recalculation.

use std::error::Error;
use std::fmt;

use log;
use nalgebra::{Matrix3, UnitQuaternion};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::auxiliary::structure::{
    AtomicStructure, InfoValue, PropertyStore, StructureError, EFG_ARRAY,
};
use crate::nmrdata::NmrDataError;
use crate::tensor::invariants::{anisotropy, asymmetry, skew, span};
use crate::tensor::{
    evals_array, evecs_to_quaternions, haeberlen_sort, Diagonaliser, EigenResult,
    SymmetricEigenDiagonaliser, TensorError,
};

pub mod quadrupolar;

#[cfg(test)]
#[path = "efg_tests.rs"]
mod efg_tests;

/// Side-store key of the ascending eigenvalues.
pub const EFG_EVALS_KEY: &str = "efg_diagonal_evals";

/// Side-store key of the Haeberlen-ordered eigenvalues.
pub const EFG_EVALS_HSORT_KEY: &str = "efg_diagonal_evals_hsort";

/// Side-store key of the eigenvectors.
pub const EFG_EVECS_KEY: &str = "efg_diagonal_evecs";

// ==================
// Error definitions
// ==================

/// Enumerated type for failures of EFG operations. Any failure aborts the whole batch.
#[derive(Debug, Clone, PartialEq)]
pub enum EfgError {
    /// The structure lacks data the operation requires.
    MissingData(String),

    /// The input violates a precondition.
    InvalidInput(String),

    /// Reference NMR data are unavailable or do not cover the request.
    NmrData(NmrDataError),
}

impl fmt::Display for EfgError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingData(reason) => write!(f, "Missing data: {reason}."),
            Self::InvalidInput(reason) => write!(f, "Invalid input: {reason}."),
            Self::NmrData(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EfgError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NmrData(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NmrDataError> for EfgError {
    fn from(err: NmrDataError) -> Self {
        Self::NmrData(err)
    }
}

impl From<TensorError> for EfgError {
    fn from(err: TensorError) -> Self {
        Self::InvalidInput(err.0)
    }
}

impl From<StructureError> for EfgError {
    fn from(err: StructureError) -> Self {
        Self::InvalidInput(err.0)
    }
}

// ================
// Enum definitions
// ================

/// Enumerated type for the per-atom scalar EFG properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EfgProperty {
    /// The major principal component $`V_{zz}`$ (au).
    Vzz,

    /// The anisotropy (au).
    Anisotropy,

    /// The reduced anisotropy (au).
    ReducedAnisotropy,

    /// The asymmetry (dimensionless).
    Asymmetry,

    /// The span (au).
    Span,

    /// The skew (dimensionless).
    Skew,

    /// The quadrupolar coupling constant (Hz).
    QuadrupolarConstant,
}

impl EfgProperty {
    /// Returns the short column label of the property.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vzz => "Vzz",
            Self::Anisotropy => "Aniso",
            Self::ReducedAnisotropy => "Red. aniso",
            Self::Asymmetry => "Asym",
            Self::Span => "Span",
            Self::Skew => "Skew",
            Self::QuadrupolarConstant => "Cq",
        }
    }

    /// Returns the unit of the property.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Vzz | Self::Anisotropy | Self::ReducedAnisotropy | Self::Span => "au",
            Self::Asymmetry | Self::Skew => "",
            Self::QuadrupolarConstant => "Hz",
        }
    }
}

impl fmt::Display for EfgProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vzz => write!(f, "EFG major component Vzz"),
            Self::Anisotropy => write!(f, "EFG anisotropy"),
            Self::ReducedAnisotropy => write!(f, "EFG reduced anisotropy"),
            Self::Asymmetry => write!(f, "EFG asymmetry"),
            Self::Span => write!(f, "EFG span"),
            Self::Skew => write!(f, "EFG skew"),
            Self::QuadrupolarConstant => write!(f, "Quadrupolar coupling constant"),
        }
    }
}

// ==========================
// Precondition and memo cache
// ==========================

/// Retrieves the EFG tensors of a structure.
///
/// # Errors
///
/// Errors with [`EfgError::MissingData`] if the structure has no EFG array.
pub fn require_efg<S: AtomicStructure>(structure: &S) -> Result<&[Matrix3<f64>], EfgError> {
    structure.get_array(EFG_ARRAY).ok_or_else(|| {
        EfgError::MissingData("no electric field gradient data found for this system".to_string())
    })
}

/// Diagonalises the EFG tensors of `structure` unless the side-store already holds `key`.
fn ensure_diagonalised<S: AtomicStructure>(
    structure: &mut S,
    key: &str,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<(), EfgError> {
    require_efg(structure)?;
    if force_recalc || !structure.info().has_info(key) {
        log::debug!(
            "Diagonalising EFG tensors ({}).",
            if force_recalc {
                "recalculation forced".to_string()
            } else {
                format!("`{key}` not cached")
            }
        );
        efg_diagonal_with(structure, true, diagonaliser)?;
    } else {
        log::debug!("Reusing cached `{key}`.");
    }
    Ok(())
}

/// Reads a cached triplet entry and checks that it matches the atom count.
fn cached_triplets<S: AtomicStructure>(structure: &S, key: &str) -> Result<Array2<f64>, EfgError> {
    let evals = structure
        .info()
        .get_info(key)
        .and_then(InfoValue::as_triplets)
        .ok_or_else(|| EfgError::MissingData(format!("no eigenvalue triplets cached under `{key}`")))?;
    check_cached_len(structure, key, evals.nrows())?;
    Ok(evals.clone())
}

fn check_cached_len<S: AtomicStructure>(
    structure: &S,
    key: &str,
    len: usize,
) -> Result<(), EfgError> {
    if len == structure.n_atoms() {
        Ok(())
    } else {
        Err(EfgError::InvalidInput(format!(
            "cached `{key}` describes {len} atoms but the structure has {}; force a recalculation",
            structure.n_atoms()
        )))
    }
}

fn haeberlen_evals_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Array2<f64>, EfgError> {
    ensure_diagonalised(structure, EFG_EVALS_HSORT_KEY, force_recalc, diagonaliser)?;
    cached_triplets(structure, EFG_EVALS_HSORT_KEY)
}

fn ascending_evals_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Array2<f64>, EfgError> {
    ensure_diagonalised(structure, EFG_EVALS_KEY, force_recalc, diagonaliser)?;
    cached_triplets(structure, EFG_EVALS_KEY)
}

// ==========
// Operations
// ==========

/// Symmetrises and diagonalises every EFG tensor of a structure.
///
/// # Arguments
///
/// * `structure` - The structure, which must carry an EFG array.
/// * `save_info` - If `true`, stores the ascending eigenvalues, the Haeberlen-ordered
/// eigenvalues and the eigenvectors in the side-store.
/// * `diagonaliser` - The diagonaliser to use.
///
/// # Returns
///
/// One [`EigenResult`] per atom, in atom order.
pub fn efg_diagonal_with<S: AtomicStructure>(
    structure: &mut S,
    save_info: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Vec<EigenResult>, EfgError> {
    let tensors = require_efg(structure)?;
    let n_tensors = tensors.len();
    let eigs = diagonaliser.diagonalise(tensors);
    if eigs.len() != n_tensors {
        return Err(EfgError::InvalidInput(format!(
            "diagonaliser returned {} results for {n_tensors} tensors",
            eigs.len()
        )));
    }

    if save_info {
        let evals = evals_array(&eigs);
        let evals_hsort = haeberlen_sort(&evals);
        let evecs = eigs.iter().map(|eig| eig.evecs).collect::<Vec<_>>();
        let info = structure.info_mut();
        info.set_info(EFG_EVALS_KEY, InfoValue::Triplets(evals));
        info.set_info(EFG_EVALS_HSORT_KEY, InfoValue::Triplets(evals_hsort));
        info.set_info(EFG_EVECS_KEY, InfoValue::Tensors(evecs));
    }
    Ok(eigs)
}

/// Symmetrises and diagonalises every EFG tensor of a structure. See [`efg_diagonal_with`].
pub fn efg_diagonal<S: AtomicStructure>(
    structure: &mut S,
    save_info: bool,
) -> Result<Vec<EigenResult>, EfgError> {
    efg_diagonal_with(structure, save_info, &SymmetricEigenDiagonaliser)
}

/// Returns $`V_{zz}`$ of every atom using `diagonaliser`. See [`efg_vzz`].
pub fn efg_vzz_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Array1<f64>, EfgError> {
    Ok(haeberlen_evals_with(structure, force_recalc, diagonaliser)?
        .column(2)
        .to_owned())
}

/// Returns the major EFG component $`V_{zz}`$ of every atom (au).
pub fn efg_vzz<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
) -> Result<Array1<f64>, EfgError> {
    efg_vzz_with(structure, force_recalc, &SymmetricEigenDiagonaliser)
}

/// Returns the EFG anisotropy of every atom using `diagonaliser`. See [`efg_anisotropy`].
pub fn efg_anisotropy_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Array1<f64>, EfgError> {
    let evals = haeberlen_evals_with(structure, force_recalc, diagonaliser)?;
    Ok(anisotropy(&evals, false))
}

/// Returns the EFG anisotropy of every atom (au).
pub fn efg_anisotropy<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
) -> Result<Array1<f64>, EfgError> {
    efg_anisotropy_with(structure, force_recalc, &SymmetricEigenDiagonaliser)
}

/// Returns the EFG reduced anisotropy of every atom using `diagonaliser`. See
/// [`efg_reduced_anisotropy`].
pub fn efg_reduced_anisotropy_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Array1<f64>, EfgError> {
    let evals = haeberlen_evals_with(structure, force_recalc, diagonaliser)?;
    Ok(anisotropy(&evals, true))
}

/// Returns the EFG reduced anisotropy of every atom (au).
pub fn efg_reduced_anisotropy<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
) -> Result<Array1<f64>, EfgError> {
    efg_reduced_anisotropy_with(structure, force_recalc, &SymmetricEigenDiagonaliser)
}

/// Returns the EFG asymmetry of every atom using `diagonaliser`. See [`efg_asymmetry`].
pub fn efg_asymmetry_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Array1<f64>, EfgError> {
    let evals = haeberlen_evals_with(structure, force_recalc, diagonaliser)?;
    Ok(asymmetry(&evals))
}

/// Returns the EFG asymmetry of every atom. Atoms with a vanishing anisotropy get a
/// non-finite value.
pub fn efg_asymmetry<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
) -> Result<Array1<f64>, EfgError> {
    efg_asymmetry_with(structure, force_recalc, &SymmetricEigenDiagonaliser)
}

/// Returns the EFG span of every atom using `diagonaliser`. See [`efg_span`].
pub fn efg_span_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Array1<f64>, EfgError> {
    let evals = ascending_evals_with(structure, force_recalc, diagonaliser)?;
    Ok(span(&evals))
}

/// Returns the EFG span of every atom (au).
pub fn efg_span<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
) -> Result<Array1<f64>, EfgError> {
    efg_span_with(structure, force_recalc, &SymmetricEigenDiagonaliser)
}

/// Returns the EFG skew of every atom using `diagonaliser`. See [`efg_skew`].
pub fn efg_skew_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Array1<f64>, EfgError> {
    let evals = ascending_evals_with(structure, force_recalc, diagonaliser)?;
    Ok(skew(&evals))
}

/// Returns the EFG skew of every atom. Atoms with a vanishing span get a non-finite value.
pub fn efg_skew<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
) -> Result<Array1<f64>, EfgError> {
    efg_skew_with(structure, force_recalc, &SymmetricEigenDiagonaliser)
}

/// Returns the principal axis quaternion of every atom using `diagonaliser`. See
/// [`efg_quaternions`].
pub fn efg_quaternions_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    diagonaliser: &dyn Diagonaliser,
) -> Result<Vec<UnitQuaternion<f64>>, EfgError> {
    ensure_diagonalised(structure, EFG_EVECS_KEY, force_recalc, diagonaliser)?;
    let evecs = structure
        .info()
        .get_info(EFG_EVECS_KEY)
        .and_then(InfoValue::as_tensors)
        .ok_or_else(|| {
            EfgError::MissingData(format!("no eigenvectors cached under `{EFG_EVECS_KEY}`"))
        })?;
    check_cached_len(structure, EFG_EVECS_KEY, evecs.len())?;
    Ok(evecs_to_quaternions(evecs))
}

/// Returns, for every atom, the unit quaternion rotating the Cartesian axes onto the principal
/// axis system of its EFG tensor.
pub fn efg_quaternions<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
) -> Result<Vec<UnitQuaternion<f64>>, EfgError> {
    efg_quaternions_with(structure, force_recalc, &SymmetricEigenDiagonaliser)
}
