use std::path::PathBuf;

use indexmap::IndexMap;

use crate::auxiliary::structure::{AtomicStructure, EFG_ARRAY};
use crate::efg::EfgProperty;
use crate::interfaces::InputHandle;
use crate::io::read_efgkit_yaml;

use super::{Input, InputStructure};

const ROOT: &str = env!("CARGO_MANIFEST_DIR");

#[test]
fn test_interfaces_input_efg_analysis() {
    let name = format!("{ROOT}/tests/input/test_input_efg_analysis.yml");
    let inp = read_efgkit_yaml::<Input, _>(&name).unwrap();

    assert_eq!(inp.structure.symbols, vec!["O", "H", "H"]);
    let structure = inp.structure.to_structure().unwrap();
    let efg = structure.get_array(EFG_ARRAY).unwrap();
    assert_eq!(efg.len(), 3);
    assert_eq!(efg[0][(0, 0)], -1.2);
    assert_eq!(efg[1][(2, 2)], -0.25);

    let params = &inp.analysis;
    assert!(params.force_recalc);
    assert_eq!(
        params.properties,
        vec![
            EfgProperty::Vzz,
            EfgProperty::ReducedAnisotropy,
            EfgProperty::Asymmetry,
            EfgProperty::QuadrupolarConstant,
        ]
    );
    assert!(params.isotope_selection.use_q_isotopes);
    let mut isotopes = IndexMap::new();
    isotopes.insert("O".to_string(), 17);
    assert_eq!(params.isotope_selection.isotopes, isotopes);
    assert_eq!(
        params.isotope_selection.isotope_list,
        Some(vec![None, None, Some(1)])
    );
    assert!(params.result_save_name.is_none());
    assert!(inp.nmr_data.is_none());

    assert!(inp.handle().is_ok());
}

#[test]
fn test_interfaces_input_minimal() {
    let name = format!("{ROOT}/tests/input/test_input_minimal.yml");
    let inp = read_efgkit_yaml::<Input, _>(&name).unwrap();
    assert_eq!(inp.analysis, Default::default());
    assert!(inp.handle().is_ok());
}

#[test]
fn test_interfaces_input_malformed_tensor() {
    let name = format!("{ROOT}/tests/input/test_input_malformed_tensor.yml");
    let inp = read_efgkit_yaml::<Input, _>(&name).unwrap();
    let err = inp.structure.to_structure().unwrap_err();
    assert!(format!("{err:#}").contains("Invalid EFG tensor for atom 0"));
    assert!(format!("{err:#}").contains("[2, 2]"));
    assert!(inp.handle().is_err());
}

#[test]
fn test_interfaces_input_structure_errors() {
    let structure = InputStructure {
        symbols: vec!["Na".to_string(), "Cl".to_string()],
        efg: InputStructure::default().efg,
    };
    let err = structure.to_structure().unwrap_err();
    assert!(err.to_string().contains("1 EFG tensors given for 2 atoms"));

    let structure = InputStructure {
        symbols: vec!["Nq".to_string()],
        efg: None,
    };
    assert!(structure.to_structure().is_err());

    let structure = InputStructure {
        symbols: vec!["Na".to_string()],
        efg: None,
    };
    assert!(!structure.to_structure().unwrap().has_array(EFG_ARRAY));
}

#[test]
fn test_interfaces_input_custom_nmr_data() {
    let name = format!("{ROOT}/tests/input/test_input_custom_nmr_data.yml");
    let mut inp = read_efgkit_yaml::<Input, _>(&name).unwrap();
    assert_eq!(
        inp.nmr_data,
        Some(PathBuf::from("tests/input/test_nmrdata_custom.yml"))
    );
    inp.nmr_data = Some(PathBuf::from(format!(
        "{ROOT}/tests/input/test_nmrdata_custom.yml"
    )));
    assert!(inp.handle().is_ok());

    inp.nmr_data = Some(PathBuf::from(format!("{ROOT}/tests/input/missing.yml")));
    let err = inp.handle().unwrap_err();
    assert!(err.to_string().contains("Unable to read NMR reference data"));
}
