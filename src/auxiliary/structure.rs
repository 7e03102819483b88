//! Atomic structures carrying per-atom tensor arrays and a key/value side-store.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;
use nalgebra::Matrix3;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::auxiliary::atom::ElementMap;

#[cfg(test)]
#[path = "structure_tests.rs"]
mod structure_tests;

/// Name of the per-atom array holding electric field gradient tensors.
pub const EFG_ARRAY: &str = "efg";

// ==================
// Error definitions
// ==================

#[derive(Debug, Clone)]
pub struct StructureError(pub String);

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Structure error: {}", self.0)
    }
}

impl Error for StructureError {}

// ==================
// Side-store entries
// ==================

/// Enumerated type for values that can be stored in a structure's side-store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum InfoValue {
    /// One triplet per atom, stored as the rows of an $`N \times 3`$ array.
    Triplets(Array2<f64>),

    /// One $`3 \times 3`$ matrix per atom.
    Tensors(Vec<Matrix3<f64>>),
}

impl InfoValue {
    /// Returns the number of atoms this entry describes.
    pub fn len(&self) -> usize {
        match self {
            Self::Triplets(arr) => arr.nrows(),
            Self::Tensors(mats) => mats.len(),
        }
    }

    /// Returns `true` if this entry describes no atoms.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_triplets(&self) -> Option<&Array2<f64>> {
        match self {
            Self::Triplets(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_tensors(&self) -> Option<&[Matrix3<f64>]> {
        match self {
            Self::Tensors(mats) => Some(mats),
            _ => None,
        }
    }
}

// =================
// Trait definitions
// =================

/// Trait for per-structure key/value side-stores used to memoise derived quantities.
///
/// Entries are never invalidated implicitly: a stored value is trusted until it is overwritten
/// or removed.
pub trait PropertyStore {
    /// Retrieves the entry stored under `key`, if any.
    fn get_info(&self, key: &str) -> Option<&InfoValue>;

    /// Stores `value` under `key`, replacing any previous entry.
    fn set_info(&mut self, key: &str, value: InfoValue);

    /// Removes and returns the entry stored under `key`, if any.
    fn remove_info(&mut self, key: &str) -> Option<InfoValue>;

    /// Checks whether an entry is stored under `key`.
    fn has_info(&self, key: &str) -> bool {
        self.get_info(key).is_some()
    }
}

/// Trait for atomic structures that expose what the EFG pipeline reads: ordered element
/// symbols, named per-atom tensor arrays, and a mutable side-store.
pub trait AtomicStructure {
    /// The type of the side-store attached to the structure.
    type Store: PropertyStore;

    /// Returns the element symbols of the atoms, in atom order.
    fn chemical_symbols(&self) -> &[String];

    /// Returns the per-atom tensor array stored under `name`, if any.
    fn get_array(&self, name: &str) -> Option<&[Matrix3<f64>]>;

    /// Returns the side-store.
    fn info(&self) -> &Self::Store;

    /// Returns the side-store mutably.
    fn info_mut(&mut self) -> &mut Self::Store;

    /// Returns the number of atoms.
    fn n_atoms(&self) -> usize {
        self.chemical_symbols().len()
    }

    /// Checks whether a per-atom tensor array is stored under `name`.
    fn has_array(&self, name: &str) -> bool {
        self.get_array(name).is_some()
    }
}

// ==================
// Struct definitions
// ==================

/// An in-memory side-store preserving insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InfoMap(IndexMap<String, InfoValue>);

impl InfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the stored keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PropertyStore for InfoMap {
    fn get_info(&self, key: &str) -> Option<&InfoValue> {
        self.0.get(key)
    }

    fn set_info(&mut self, key: &str, value: InfoValue) {
        self.0.insert(key.to_string(), value);
    }

    fn remove_info(&mut self, key: &str) -> Option<InfoValue> {
        self.0.shift_remove(key)
    }
}

/// A structure containing the atoms of a single system together with their per-atom tensor
/// arrays and an [`InfoMap`] side-store.
#[derive(Clone, Debug)]
pub struct Structure {
    /// The element symbols of the atoms.
    symbols: Vec<String>,

    /// Named per-atom tensor arrays, each index-aligned with [`Self::symbols`].
    arrays: IndexMap<String, Vec<Matrix3<f64>>>,

    /// The side-store.
    info: InfoMap,
}

impl Structure {
    /// Creates a structure without any per-atom arrays.
    ///
    /// # Arguments
    ///
    /// * `symbols` - The element symbols of the atoms, in order.
    ///
    /// # Returns
    ///
    /// The structure, or an error if any symbol does not name a known element.
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<Self, StructureError> {
        let emap = ElementMap::new();
        let unknown = symbols
            .iter()
            .map(|symbol| symbol.as_ref())
            .filter(|symbol| !emap.contains(symbol))
            .unique()
            .collect_vec();
        if !unknown.is_empty() {
            return Err(StructureError(format!(
                "unknown element symbol(s): {}",
                unknown.join(", ")
            )));
        }
        Ok(Self {
            symbols: symbols.iter().map(|s| s.as_ref().to_string()).collect(),
            arrays: IndexMap::new(),
            info: InfoMap::new(),
        })
    }

    /// Creates a structure with electric field gradient tensors given as row-major nested
    /// arrays.
    pub fn from_efg_rows<S: AsRef<str>>(
        symbols: &[S],
        efg: &[[[f64; 3]; 3]],
    ) -> Result<Self, StructureError> {
        let mut structure = Self::new(symbols)?;
        let tensors = efg.iter().map(rows_to_matrix).collect_vec();
        structure.set_array(EFG_ARRAY, tensors)?;
        Ok(structure)
    }

    /// Stores a per-atom tensor array under `name`.
    ///
    /// Existing side-store entries are left untouched.
    ///
    /// # Errors
    ///
    /// Errors if the array length differs from the number of atoms.
    pub fn set_array(
        &mut self,
        name: &str,
        tensors: Vec<Matrix3<f64>>,
    ) -> Result<(), StructureError> {
        if tensors.len() != self.symbols.len() {
            return Err(StructureError(format!(
                "array `{name}` has {} entries but the structure has {} atoms",
                tensors.len(),
                self.symbols.len()
            )));
        }
        self.arrays.insert(name.to_string(), tensors);
        Ok(())
    }
}

impl AtomicStructure for Structure {
    type Store = InfoMap;

    fn chemical_symbols(&self) -> &[String] {
        &self.symbols
    }

    fn get_array(&self, name: &str) -> Option<&[Matrix3<f64>]> {
        self.arrays.get(name).map(Vec::as_slice)
    }

    fn info(&self) -> &InfoMap {
        &self.info
    }

    fn info_mut(&mut self) -> &mut InfoMap {
        &mut self.info
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Atoms: {}", self.symbols.len())?;
        let emap = ElementMap::new();
        writeln!(
            f,
            "Composition: {}",
            self.symbols
                .iter()
                .counts()
                .into_iter()
                .sorted_by_key(|(s, _)| emap.atomic_number(s))
                .map(|(s, n)| format!("{s}{n}"))
                .join(" ")
        )?;
        writeln!(
            f,
            "Tensor arrays: {}",
            if self.arrays.is_empty() {
                "--".to_string()
            } else {
                self.arrays.keys().join(", ")
            }
        )?;
        Ok(())
    }
}

/// Converts a row-major nested array into a matrix.
pub fn rows_to_matrix(rows: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_fn(|i, j| rows[i][j])
}
