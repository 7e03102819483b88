//! Quadrupolar coupling constants from EFG tensors and nuclear quadrupole moments.

use std::fmt;

use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::auxiliary::structure::AtomicStructure;
use crate::efg::{efg_vzz_with, ensure_diagonalised, EfgError, EFG_EVALS_KEY};
use crate::io::format::{efgkit_warn, nice_bool};
use crate::nmrdata::{NmrDataCell, NmrDataError, ReferenceDataset, NMR_DATA};
use crate::tensor::{Diagonaliser, SymmetricEigenDiagonaliser};

#[cfg(test)]
#[path = "quadrupolar_tests.rs"]
mod quadrupolar_tests;

/// Atomic unit of electric field gradient ($`\mathrm{V}\,\mathrm{m}^{-2}`$, CODATA 2018).
pub const AU_EFG: f64 = 9.717_362_429_2e21;

/// Elementary charge ($`\mathrm{C}`$, exact).
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Planck constant ($`\mathrm{J}\,\mathrm{s}`$, exact).
pub const PLANCK: f64 = 6.626_070_15e-34;

/// One barn ($`\mathrm{m}^2`$).
pub const BARN: f64 = 1.0e-28;

/// Factor turning $`V_{zz}`$ (au) times a quadrupole moment (barn) into a frequency (Hz).
pub const EFG_BARN_TO_HZ: f64 = AU_EFG * ELEMENTARY_CHARGE * BARN / PLANCK;

// ==================
// Struct definitions
// ==================

/// A structure containing the isotope choices for quadrupolar coupling calculations.
///
/// For every atom the isotope is taken from the first layer that provides one:
/// 1. [`Self::isotope_list`], if it has a non-`None` entry for the atom;
/// 2. [`Self::isotopes`], if it has an entry for the atom's element;
/// 3. the element's most abundant quadrupole-active isotope, if [`Self::use_q_isotopes`] is
/// set and the element has one;
/// 4. the element's default isotope.
#[derive(Clone, Builder, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IsotopeSelection {
    /// Boolean indicating if the most abundant quadrupole-active isotope of each element is to
    /// be preferred over its default isotope.
    #[builder(default = "false")]
    #[serde(default)]
    pub use_q_isotopes: bool,

    /// Isotope mass numbers by element symbol.
    #[builder(default)]
    #[serde(default)]
    pub isotopes: IndexMap<String, u32>,

    /// Isotope mass numbers atom by atom, `None` deferring to the other layers. A list whose
    /// length differs from the number of atoms is ignored with a warning.
    #[builder(default = "None")]
    #[serde(default)]
    pub isotope_list: Option<Vec<Option<u32>>>,
}

impl IsotopeSelection {
    /// Returns a builder to construct an [`IsotopeSelection`] structure.
    pub fn builder() -> IsotopeSelectionBuilder {
        IsotopeSelectionBuilder::default()
    }
}

impl IsotopeSelectionBuilder {
    /// Sets the isotope of one element, keeping any isotopes already set for other elements.
    pub fn isotope(&mut self, element: &str, isotope: u32) -> &mut Self {
        self.isotopes
            .get_or_insert_with(IndexMap::new)
            .insert(element.to_string(), isotope);
        self
    }
}

impl fmt::Display for IsotopeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Prefer quadrupole-active isotopes: {}",
            nice_bool(self.use_q_isotopes)
        )?;
        writeln!(
            f,
            "Isotopes by element: {}",
            if self.isotopes.is_empty() {
                "--".to_string()
            } else {
                self.isotopes
                    .iter()
                    .map(|(element, iso)| format!("{iso}{element}"))
                    .join(", ")
            }
        )?;
        writeln!(
            f,
            "Isotopes by atom: {}",
            self.isotope_list
                .as_ref()
                .map(|list| list
                    .iter()
                    .map(|iso| iso.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string()))
                    .join(" "))
                .unwrap_or_else(|| "--".to_string())
        )?;
        Ok(())
    }
}

/// A structure containing quadrupolar couplings and the nuclear data they were built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadrupolarCouplings {
    /// The resolved isotope mass number of every atom.
    pub isotopes: Vec<u32>,

    /// The quadrupole moment of every atom's isotope (barn).
    pub moments: Array1<f64>,

    /// The quadrupolar coupling constant of every atom (Hz).
    pub constants: Array1<f64>,
}

// =========
// Functions
// =========

/// Resolves the isotope of every atom.
///
/// # Arguments
///
/// * `symbols` - The element symbols of the atoms, in order.
/// * `selection` - The isotope choices.
/// * `data` - The reference dataset.
///
/// # Returns
///
/// The mass number of every atom's isotope.
///
/// # Errors
///
/// Errors if an element is not in `data`, or if a resolved isotope, including one requested
/// explicitly, is not tabulated for its element.
pub fn resolve_isotopes<S: AsRef<str>>(
    symbols: &[S],
    selection: &IsotopeSelection,
    data: &ReferenceDataset,
) -> Result<Vec<u32>, NmrDataError> {
    Ok(resolve_nuclei(symbols, selection, data)?
        .into_iter()
        .map(|(iso, _)| iso)
        .collect())
}

/// Resolves the isotope of every atom together with its quadrupole moment (barn).
fn resolve_nuclei<S: AsRef<str>>(
    symbols: &[S],
    selection: &IsotopeSelection,
    data: &ReferenceDataset,
) -> Result<Vec<(u32, f64)>, NmrDataError> {
    let isotope_list = match selection.isotope_list.as_ref() {
        Some(list) if list.len() != symbols.len() => {
            efgkit_warn!(
                "Invalid isotope list ({} entries for {} atoms). It will be ignored.",
                list.len(),
                symbols.len()
            );
            None
        }
        list => list,
    };

    symbols
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let element = element.as_ref();
            let entry = data.element(element)?;
            let iso = if let Some(iso) = isotope_list.and_then(|list| list[i]) {
                iso
            } else if let Some(iso) = selection.isotopes.get(element) {
                *iso
            } else if let (true, Some(q_iso)) = (selection.use_q_isotopes, entry.q_iso) {
                q_iso
            } else {
                entry.iso
            };
            let q = data.isotope(element, iso)?.q;
            Ok((iso, q))
        })
        .collect()
}

/// Computes the quadrupolar couplings of every atom, using `nmr_data` for nuclear data.
///
/// # Arguments
///
/// * `structure` - The structure, which must carry an EFG array.
/// * `force_recalc` - If `true`, always diagonalises the EFG tensors.
/// * `selection` - The isotope choices.
/// * `nmr_data` - The cell providing the reference dataset.
/// * `diagonaliser` - The diagonaliser to use.
pub fn efg_quadrupolar_couplings_with<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    selection: &IsotopeSelection,
    nmr_data: &NmrDataCell,
    diagonaliser: &dyn Diagonaliser,
) -> Result<QuadrupolarCouplings, EfgError> {
    ensure_diagonalised(structure, EFG_EVALS_KEY, force_recalc, diagonaliser)?;
    let data = nmr_data.get()?;
    let (isotopes, moments): (Vec<u32>, Vec<f64>) =
        resolve_nuclei(structure.chemical_symbols(), selection, data)?
            .into_iter()
            .unzip();
    let moments = Array1::from_vec(moments);
    let vzz = efg_vzz_with(structure, false, diagonaliser)?;
    let constants = EFG_BARN_TO_HZ * &moments * &vzz;
    Ok(QuadrupolarCouplings {
        isotopes,
        moments,
        constants,
    })
}

/// Returns the quadrupolar coupling constant of every atom (Hz), using the bundled reference
/// dataset. Atoms of isotopes without a quadrupole moment get zero.
pub fn efg_quadrupolar_constants<S: AtomicStructure>(
    structure: &mut S,
    force_recalc: bool,
    selection: &IsotopeSelection,
) -> Result<Array1<f64>, EfgError> {
    efg_quadrupolar_couplings_with(
        structure,
        force_recalc,
        selection,
        &NMR_DATA,
        &SymmetricEigenDiagonaliser,
    )
    .map(|couplings| couplings.constants)
}
