//! Driver for electric field gradient analysis in `efgkit`.

use std::fmt;
use std::path::PathBuf;

use anyhow::format_err;
use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::auxiliary::structure::{AtomicStructure, Structure};
use crate::drivers::EfgDriver;
use crate::efg::quadrupolar::{efg_quadrupolar_couplings_with, IsotopeSelection};
use crate::efg::{
    efg_anisotropy, efg_asymmetry, efg_reduced_anisotropy, efg_skew, efg_span, efg_vzz,
    EfgError, EfgProperty,
};
use crate::io::format::{
    efgkit_error, efgkit_output, log_subtitle, log_title, nice_bool, write_subtitle,
    EfgkitOutput,
};
use crate::io::write_efgkit_yaml;
use crate::nmrdata::{NmrDataCell, NMR_DATA};
use crate::tensor::SymmetricEigenDiagonaliser;


// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

fn default_properties() -> Vec<EfgProperty> {
    vec![
        EfgProperty::Vzz,
        EfgProperty::Asymmetry,
        EfgProperty::QuadrupolarConstant,
    ]
}

/// Structure containing control parameters for EFG analysis.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct EfgAnalysisParams {
    /// Boolean indicating if the EFG tensors are to be diagonalised afresh even when the
    /// structure already carries cached eigen-decompositions.
    #[builder(default = "false")]
    #[serde(default)]
    pub force_recalc: bool,

    /// The per-atom properties to compute, in reporting order. Repeated entries are computed
    /// once.
    #[builder(default = "default_properties()")]
    #[serde(default = "default_properties")]
    pub properties: Vec<EfgProperty>,

    /// The isotope choices for quadrupolar coupling constants.
    #[builder(default)]
    #[serde(default)]
    pub isotope_selection: IsotopeSelection,

    /// Optional name (without the `.yml` extension) for saving the analysis result as a YAML
    /// file. If `None`, the result will not be saved.
    #[builder(default = "None")]
    #[serde(default)]
    pub result_save_name: Option<PathBuf>,
}

impl EfgAnalysisParams {
    /// Returns a builder to construct an [`EfgAnalysisParams`] structure.
    pub fn builder() -> EfgAnalysisParamsBuilder {
        EfgAnalysisParamsBuilder::default()
    }
}

impl Default for EfgAnalysisParams {
    fn default() -> Self {
        Self {
            force_recalc: false,
            properties: default_properties(),
            isotope_selection: IsotopeSelection::default(),
            result_save_name: None,
        }
    }
}

impl fmt::Display for EfgAnalysisParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Force recalculation: {}", nice_bool(self.force_recalc))?;
        writeln!(
            f,
            "Properties: {}",
            if self.properties.is_empty() {
                "--".to_string()
            } else {
                self.properties.iter().map(|p| p.label()).join(", ")
            }
        )?;
        if self.properties.contains(&EfgProperty::QuadrupolarConstant) {
            write!(f, "{}", self.isotope_selection)?;
        }
        writeln!(
            f,
            "Save analysis result to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                let mut path = name.clone();
                path.set_extension("yml");
                path.display().to_string()
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Result
// ------

/// Structure to contain EFG analysis results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EfgAnalysisResult {
    /// The element symbols of the atoms, in atom order.
    pub symbols: Vec<String>,

    /// The resolved isotope of every atom, if quadrupolar coupling constants were requested.
    pub isotopes: Option<Vec<u32>>,

    /// The computed per-atom values of every requested property, in reporting order.
    pub properties: IndexMap<EfgProperty, Array1<f64>>,
}

impl EfgAnalysisResult {
    /// Returns the per-atom values of a property, if it has been computed.
    pub fn get(&self, property: EfgProperty) -> Option<&Array1<f64>> {
        self.properties.get(&property)
    }
}

impl fmt::Display for EfgAnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Per-atom EFG properties")?;
        writeln!(f)?;

        let headers = self
            .properties
            .keys()
            .map(|property| {
                if property.unit().is_empty() {
                    property.label().to_string()
                } else {
                    format!("{} ({})", property.label(), property.unit())
                }
            })
            .collect_vec();
        let widths = headers.iter().map(|h| h.chars().count().max(13)).collect_vec();
        let sites = self
            .symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| match self.isotopes.as_ref() {
                Some(isotopes) => format!("{}{symbol}", isotopes[i]),
                None => symbol.clone(),
            })
            .collect_vec();
        let site_width = sites
            .iter()
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0)
            .max(4);
        let index_width = self.symbols.len().to_string().len().max(1);

        let header = headers
            .iter()
            .zip(widths.iter())
            .map(|(h, &w)| format!("{h:>w$}"))
            .join("  ");
        let rule_length = index_width + site_width + 4 + header.chars().count();
        writeln!(f, "{}", "┈".repeat(rule_length))?;
        writeln!(f, "{:>index_width$}  {:<site_width$}  {header}", "#", "Site")?;
        writeln!(f, "{}", "┈".repeat(rule_length))?;
        for (i, site) in sites.iter().enumerate() {
            let row = self
                .properties
                .values()
                .zip(widths.iter())
                .map(|(values, &w)| format!("{:>+w$.6e}", values[i]))
                .join("  ");
            writeln!(f, "{i:>index_width$}  {site:<site_width$}  {row}")?;
        }
        writeln!(f, "{}", "┈".repeat(rule_length))?;
        Ok(())
    }
}

// ------
// Driver
// ------

/// Driver for the analysis of per-atom electric field gradient properties.
///
/// The EFG tensors of the structure are diagonalised at most once across all requested
/// properties; the cached eigen-decompositions are left in the structure's side-store for later
/// use.
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct EfgAnalysisDriver<'a> {
    /// The control parameters for EFG analysis.
    parameters: &'a EfgAnalysisParams,

    /// The structure whose EFG tensors are to be analysed.
    structure: &'a mut Structure,

    /// The cell providing reference NMR data.
    #[builder(default = "&NMR_DATA")]
    nmr_data: &'a NmrDataCell,

    /// The result of the analysis.
    #[builder(setter(skip), default = "None")]
    result: Option<EfgAnalysisResult>,
}

impl<'a> EfgAnalysisDriver<'a> {
    /// Returns a builder to construct an [`EfgAnalysisDriver`] structure.
    pub fn builder() -> EfgAnalysisDriverBuilder<'a> {
        EfgAnalysisDriverBuilder::default()
    }

    fn compute_property(
        &mut self,
        property: EfgProperty,
        force_recalc: bool,
        isotopes: &mut Option<Vec<u32>>,
    ) -> Result<Array1<f64>, EfgError> {
        let structure = &mut *self.structure;
        match property {
            EfgProperty::Vzz => efg_vzz(structure, force_recalc),
            EfgProperty::Anisotropy => efg_anisotropy(structure, force_recalc),
            EfgProperty::ReducedAnisotropy => efg_reduced_anisotropy(structure, force_recalc),
            EfgProperty::Asymmetry => efg_asymmetry(structure, force_recalc),
            EfgProperty::Span => efg_span(structure, force_recalc),
            EfgProperty::Skew => efg_skew(structure, force_recalc),
            EfgProperty::QuadrupolarConstant => {
                let couplings = efg_quadrupolar_couplings_with(
                    structure,
                    force_recalc,
                    &self.parameters.isotope_selection,
                    self.nmr_data,
                    &SymmetricEigenDiagonaliser,
                )?;
                *isotopes = Some(couplings.isotopes);
                Ok(couplings.constants)
            }
        }
    }

    /// Logs the nuclear data of the resolved isotopes.
    fn log_nuclear_data(&self, isotopes: &[u32]) -> Result<(), anyhow::Error> {
        let data = self.nmr_data.get()?;
        log_subtitle("Nuclear data");
        efgkit_output!("");
        let symbols = self.structure.chemical_symbols();
        let site_width = symbols
            .iter()
            .zip(isotopes.iter())
            .map(|(symbol, iso)| format!("{iso}{symbol}").chars().count())
            .max()
            .unwrap_or(0)
            .max(4);
        efgkit_output!(
            "{:<site_width$}  {:>5}  {:>11}  {}",
            "Site",
            "Spin",
            "Q (barn)",
            "Quadrupole-active"
        );
        for (symbol, iso) in symbols.iter().zip(isotopes.iter()).unique() {
            let nucleus = data.isotope(symbol, *iso)?;
            efgkit_output!(
                "{:<site_width$}  {:>5}  {:>+11.4e}  {}",
                format!("{iso}{symbol}"),
                nice_spin(nucleus.spin),
                nucleus.q,
                nice_bool(nucleus.is_quadrupole_active())
            );
        }
        efgkit_output!("");
        Ok(())
    }

    /// Executes EFG analysis.
    fn analyse_efg(&mut self) -> Result<(), anyhow::Error> {
        log_title("Electric Field Gradient Analysis");
        efgkit_output!("");
        let params = self.parameters;
        params.log_output_display();
        self.structure.log_output_display();
        efgkit_output!("");

        let mut properties = IndexMap::new();
        let mut isotopes = None;
        for (i, property) in params.properties.iter().unique().enumerate() {
            // A forced recalculation refreshes the cache once; later properties read it.
            let force_recalc = params.force_recalc && i == 0;
            let values = self
                .compute_property(*property, force_recalc, &mut isotopes)
                .map_err(|err| {
                    efgkit_error!(
                        "Unable to compute the {}: {err}",
                        property.to_string().to_lowercase()
                    );
                    err
                })?;
            properties.insert(*property, values);
        }

        if let Some(isotopes) = isotopes.as_ref() {
            self.log_nuclear_data(isotopes)?;
        }

        let result = EfgAnalysisResult {
            symbols: self.structure.chemical_symbols().to_vec(),
            isotopes,
            properties,
        };
        result.log_output_display();
        efgkit_output!("");

        if let Some(name) = params.result_save_name.as_ref() {
            write_efgkit_yaml(name, &result)?;
            let mut path = name.clone();
            path.set_extension("yml");
            efgkit_output!("Analysis result saved as {}.", path.display());
            efgkit_output!("");
        }

        self.result = Some(result);
        Ok(())
    }
}

impl<'a> EfgDriver for EfgAnalysisDriver<'a> {
    type Params = EfgAnalysisParams;

    type Outcome = EfgAnalysisResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No EFG analysis results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.analyse_efg()
    }
}

/// Formats a nuclear spin as an integer or a half-integer fraction.
fn nice_spin(spin: f64) -> String {
    let twice = (2.0 * spin).round();
    if (twice - 2.0 * spin).abs() > 1e-8 {
        format!("{spin}")
    } else if twice % 2.0 == 0.0 {
        format!("{}", twice / 2.0)
    } else {
        format!("{twice}/2")
    }
}
