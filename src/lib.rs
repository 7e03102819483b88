//! # efgkit: Electric Field Gradient Analysis
//!
//! `efgkit` turns the per-atom electric field gradient (EFG) tensors of a structure into the
//! quantities used to interpret solid-state NMR spectra:
//! - the principal components in Haeberlen order, and the orientation of each principal axis
//!   system as a unit quaternion,
//! - the scalar invariants anisotropy, reduced anisotropy, asymmetry, span and skew, and
//! - quadrupolar coupling constants for chosen isotopes, using a bundled table of nuclear spins
//!   and quadrupole moments.
//!
//! Every EFG tensor is symmetrised and diagonalised at most once per structure. The
//! eigen-decompositions are memoised in the structure's side-store (see
//! [`auxiliary::structure::PropertyStore`]) and are shared by all later property requests
//! unless a recalculation is forced.
//!
//! ## Getting started
//!
//! ```no_run
//! use efgkit::auxiliary::structure::Structure;
//! use efgkit::efg::{efg_asymmetry, efg_vzz};
//! use efgkit::efg::quadrupolar::{efg_quadrupolar_constants, IsotopeSelection};
//!
//! let mut structure = Structure::from_efg_rows(
//!     &["Na"],
//!     &[[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -2.0]]],
//! )
//! .unwrap();
//! let vzz = efg_vzz(&mut structure, false).unwrap();
//! let eta = efg_asymmetry(&mut structure, false).unwrap();
//! let selection = IsotopeSelection::default();
//! let cq = efg_quadrupolar_constants(&mut structure, false, &selection).unwrap();
//! ```
//!
//! The `efgkit` binary runs the same analysis from a YAML input file:
//!
//! ```text
//! efgkit --config input.yml --output output.log
//! ```

pub mod auxiliary;
pub mod drivers;
pub mod efg;
pub mod interfaces;
pub mod io;
pub mod nmrdata;
pub mod tensor;
