//! Element look-ups for atomic sites.

use std::collections::HashMap;

use periodic_table;

#[cfg(test)]
#[path = "atom_tests.rs"]
mod atom_tests;

/// A struct storing a look-up of element symbols to give atomic numbers.
pub struct ElementMap<'a> {
    /// A [`HashMap`] from a symbol string to an atomic number.
    pub map: HashMap<&'a str, u32>,
}

impl Default for ElementMap<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementMap<'static> {
    /// Creates a new [`ElementMap`] for all elements in the periodic table.
    #[must_use]
    pub fn new() -> ElementMap<'static> {
        let map = periodic_table::periodic_table()
            .into_iter()
            .map(|element| (element.symbol, element.atomic_number))
            .collect::<HashMap<_, _>>();
        ElementMap { map }
    }
}

impl<'a> ElementMap<'a> {
    /// Returns the atomic number of an element symbol, or `None` if the symbol does not name a
    /// known element.
    pub fn atomic_number(&self, symbol: &str) -> Option<u32> {
        self.map.get(symbol).copied()
    }

    /// Checks whether a symbol names a known element.
    pub fn contains(&self, symbol: &str) -> bool {
        self.map.contains_key(symbol)
    }
}
