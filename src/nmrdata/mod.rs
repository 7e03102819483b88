//! Reference NMR data: default isotopes, nuclear spins and quadrupole moments per element.
//!
//! A dataset is bundled with the crate and loaded on first use through the process-wide
//! [`NMR_DATA`] cell. Custom datasets in the same YAML format can be read with
//! [`ReferenceDataset::from_yaml_file`].

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use itertools::Itertools;
use log;
use serde::{Deserialize, Serialize};
use serde_yaml;


/// The bundled reference dataset in YAML format.
pub const BUNDLED_NMR_DATA: &str = include_str!("../../data/nmrdata.yml");

// ==================
// Error definitions
// ==================

/// Enumerated type for failures when accessing reference NMR data.
#[derive(Debug, Clone, PartialEq)]
pub enum NmrDataError {
    /// The reference dataset could not be loaded.
    Unavailable(String),

    /// The dataset has no entry for the element.
    UnsupportedElement(String),

    /// The dataset has no entry for the isotope of the element.
    UnsupportedIsotope { element: String, isotope: u32 },

    /// The dataset text is malformed or inconsistent.
    Parse(String),
}

impl fmt::Display for NmrDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(
                f,
                "NMR reference data not available ({reason}). The installation may be broken."
            ),
            Self::UnsupportedElement(element) => write!(f, "No NMR data on element {element}."),
            Self::UnsupportedIsotope { element, isotope } => {
                write!(f, "Isotope {isotope} does not exist for element {element}.")
            }
            Self::Parse(reason) => write!(f, "Invalid NMR reference data: {reason}."),
        }
    }
}

impl Error for NmrDataError {}

// ==================
// Struct definitions
// ==================

/// Nuclear data for a single isotope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IsotopeData {
    /// The nuclear spin quantum number.
    pub spin: f64,

    /// The nuclear quadrupole moment in barn.
    pub q: f64,
}

impl IsotopeData {
    /// Checks whether the nucleus has a non-vanishing quadrupole moment by symmetry, *i.e.* has
    /// a spin larger than $`1/2`$.
    pub fn is_quadrupole_active(&self) -> bool {
        self.spin > 0.5
    }
}

/// NMR data for all tabulated isotopes of an element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementNmrData {
    /// The default isotope, the most abundant NMR-active one.
    pub iso: u32,

    /// The most abundant quadrupole-active isotope, if any.
    #[serde(default)]
    pub q_iso: Option<u32>,

    /// Per-isotope data keyed by mass number.
    pub isotopes: BTreeMap<u32, IsotopeData>,
}

/// A reference dataset of NMR data keyed by element symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDataset {
    /// The format version of the dataset.
    pub version: u32,

    /// Per-element data keyed by element symbol.
    pub elements: IndexMap<String, ElementNmrData>,
}

impl ReferenceDataset {
    /// Parses a dataset from YAML text.
    ///
    /// # Errors
    ///
    /// Errors if the text cannot be parsed, or if an element's default or quadrupole-active
    /// isotope is missing from its isotope table.
    pub fn from_yaml_str(text: &str) -> Result<Self, NmrDataError> {
        let dataset: Self =
            serde_yaml::from_str(text).map_err(|err| NmrDataError::Parse(err.to_string()))?;
        dataset.validate()?;
        log::debug!(
            "Loaded NMR reference data (version {}) for {} elements.",
            dataset.version,
            dataset.elements.len()
        );
        Ok(dataset)
    }

    /// Reads and parses a dataset from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, NmrDataError> {
        let text = fs::read_to_string(path.as_ref()).map_err(|err| {
            NmrDataError::Unavailable(format!("{}: {err}", path.as_ref().display()))
        })?;
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> Result<(), NmrDataError> {
        let dangling = self
            .elements
            .iter()
            .flat_map(|(element, data)| {
                std::iter::once(data.iso)
                    .chain(data.q_iso)
                    .filter(move |iso| !data.isotopes.contains_key(iso))
                    .map(move |iso| format!("{iso}{element}"))
            })
            .collect_vec();
        if dangling.is_empty() {
            Ok(())
        } else {
            Err(NmrDataError::Parse(format!(
                "referenced isotopes without data: {}",
                dangling.join(", ")
            )))
        }
    }

    /// Retrieves the data of an element.
    ///
    /// # Errors
    ///
    /// Errors with [`NmrDataError::UnsupportedElement`] if the element is not tabulated.
    pub fn element(&self, element: &str) -> Result<&ElementNmrData, NmrDataError> {
        self.elements
            .get(element)
            .ok_or_else(|| NmrDataError::UnsupportedElement(element.to_string()))
    }

    /// Retrieves the data of a specific isotope of an element.
    ///
    /// # Errors
    ///
    /// Errors with [`NmrDataError::UnsupportedElement`] or
    /// [`NmrDataError::UnsupportedIsotope`] if either is not tabulated.
    pub fn isotope(&self, element: &str, isotope: u32) -> Result<&IsotopeData, NmrDataError> {
        self.element(element)?
            .isotopes
            .get(&isotope)
            .ok_or_else(|| NmrDataError::UnsupportedIsotope {
                element: element.to_string(),
                isotope,
            })
    }

    /// Retrieves the quadrupole moment (barn) of a specific isotope of an element.
    pub fn quadrupole_moment(&self, element: &str, isotope: u32) -> Result<f64, NmrDataError> {
        self.isotope(element, isotope).map(|data| data.q)
    }
}

// ---------------------
// Single-load data cell
// ---------------------

/// A cell that loads a [`ReferenceDataset`] at most once.
///
/// The loader runs on the first call to [`NmrDataCell::get`]. Its outcome, success or failure,
/// is kept for the lifetime of the cell: a failed load is never retried, and every later
/// access reports [`NmrDataError::Unavailable`].
pub struct NmrDataCell {
    loader: fn() -> Result<ReferenceDataset, NmrDataError>,
    data: OnceLock<Result<ReferenceDataset, String>>,
}

impl NmrDataCell {
    /// Creates an empty cell that will be filled by `loader`.
    pub const fn new(loader: fn() -> Result<ReferenceDataset, NmrDataError>) -> Self {
        Self {
            loader,
            data: OnceLock::new(),
        }
    }

    /// Creates a cell already holding `dataset`.
    pub fn from_dataset(dataset: ReferenceDataset) -> Self {
        Self {
            loader: || Err(NmrDataError::Unavailable("no loader".to_string())),
            data: OnceLock::from(Ok(dataset)),
        }
    }

    /// Returns the dataset, loading it first if this is the first access.
    ///
    /// # Errors
    ///
    /// Errors with [`NmrDataError::Unavailable`] if the load has failed, now or previously.
    pub fn get(&self) -> Result<&ReferenceDataset, NmrDataError> {
        self.data
            .get_or_init(|| {
                (self.loader)().map_err(|err| {
                    log::error!("Unable to load NMR reference data: {err}");
                    err.to_string()
                })
            })
            .as_ref()
            .map_err(|reason| NmrDataError::Unavailable(reason.clone()))
    }

    /// Checks whether a load has been attempted.
    pub fn is_initialised(&self) -> bool {
        self.data.get().is_some()
    }
}

impl fmt::Debug for NmrDataCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.data.get() {
            None => "not loaded".to_string(),
            Some(Ok(dataset)) => format!("loaded ({} elements)", dataset.elements.len()),
            Some(Err(reason)) => format!("unavailable ({reason})"),
        };
        write!(f, "NmrDataCell {{ {state} }}")
    }
}

/// Parses the bundled reference dataset.
pub fn load_bundled_nmr_data() -> Result<ReferenceDataset, NmrDataError> {
    ReferenceDataset::from_yaml_str(BUNDLED_NMR_DATA)
}

/// The process-wide reference dataset, loaded from the bundled data on first use.
pub static NMR_DATA: NmrDataCell = NmrDataCell::new(load_bundled_nmr_data);

/// Returns the process-wide reference dataset.
pub fn nmr_data() -> Result<&'static ReferenceDataset, NmrDataError> {
    NMR_DATA.get()
}
