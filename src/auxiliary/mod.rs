//! Helper items to assist the working of `efgkit`.

pub mod atom;
pub mod structure;
