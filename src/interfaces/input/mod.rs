//! YAML input files for `efgkit`.

use std::path::PathBuf;

use anyhow::{self, ensure, Context};
use serde::{Deserialize, Serialize};

use crate::auxiliary::structure::{Structure, EFG_ARRAY};
use crate::drivers::efg_analysis::{EfgAnalysisDriver, EfgAnalysisParams};
use crate::drivers::EfgDriver;
use crate::interfaces::InputHandle;
use crate::nmrdata::{NmrDataCell, ReferenceDataset, NMR_DATA};
use crate::tensor::matrix3_from_rows;

#[cfg(test)]
#[path = "input_tests.rs"]
mod input_tests;

/// A structure containing the atomic structure specification of an `efgkit` YAML input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputStructure {
    /// The element symbols of the atoms, in order.
    pub symbols: Vec<String>,

    /// The electric field gradient tensor of every atom (au), each given as three rows. If
    /// `None`, the structure carries no EFG data.
    #[serde(default)]
    pub efg: Option<Vec<Vec<Vec<f64>>>>,
}

impl InputStructure {
    /// Builds the [`Structure`] described by this specification.
    pub fn to_structure(&self) -> Result<Structure, anyhow::Error> {
        let mut structure = Structure::new(&self.symbols)?;
        if let Some(efg) = self.efg.as_ref() {
            ensure!(
                efg.len() == self.symbols.len(),
                "{} EFG tensors given for {} atoms.",
                efg.len(),
                self.symbols.len()
            );
            let tensors = efg
                .iter()
                .enumerate()
                .map(|(i, rows)| {
                    matrix3_from_rows(rows)
                        .with_context(|| format!("Invalid EFG tensor for atom {i}"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            structure.set_array(EFG_ARRAY, tensors)?;
        }
        Ok(structure)
    }
}

impl Default for InputStructure {
    fn default() -> Self {
        Self {
            symbols: vec!["Na".to_string()],
            efg: Some(vec![vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, -2.0],
            ]]),
        }
    }
}

/// A structure containing `efgkit` input parameters which can be serialised into and
/// deserialised from a YAML input file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Specification of the structure to be analysed.
    pub structure: InputStructure,

    /// Parameters for EFG analysis.
    ///
    /// # Default
    ///
    /// If not specified, [`EfgAnalysisParams::default`] is used.
    #[serde(default)]
    pub analysis: EfgAnalysisParams,

    /// Optional path to a YAML file containing a custom NMR reference dataset. If `None`, the
    /// bundled dataset is used.
    #[serde(default)]
    pub nmr_data: Option<PathBuf>,
}

impl InputHandle for Input {
    fn handle(&self) -> Result<(), anyhow::Error> {
        let mut structure = self
            .structure
            .to_structure()
            .with_context(|| "Unable to construct the structure from the input specification")?;
        let custom_nmr_data = self
            .nmr_data
            .as_ref()
            .map(|path| {
                ReferenceDataset::from_yaml_file(path)
                    .map(NmrDataCell::from_dataset)
                    .with_context(|| {
                        format!("Unable to read NMR reference data from `{}`", path.display())
                    })
            })
            .transpose()?;
        let nmr_data = custom_nmr_data.as_ref().unwrap_or(&NMR_DATA);

        let mut driver = EfgAnalysisDriver::builder()
            .parameters(&self.analysis)
            .structure(&mut structure)
            .nmr_data(nmr_data)
            .build()
            .with_context(|| "Unable to construct an EFG analysis driver")?;
        driver
            .run()
            .with_context(|| "Unable to run the EFG analysis driver successfully")
    }
}
