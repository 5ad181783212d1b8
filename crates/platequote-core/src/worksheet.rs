//! Worksheet type

use ahash::AHashMap;

use crate::cell::{Cell, CellAddress};

/// A worksheet (single sheet in a workbook)
///
/// Cells are stored sparsely; untouched grid positions cost nothing. A
/// calculation pass always works on a [`Clone`] of the sheet so the parsed
/// original is never mutated.
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Sparse cell grid
    cells: AHashMap<CellAddress, Cell>,
}

impl Worksheet {
    /// Create a new empty worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: AHashMap::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of populated cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    // === Cell access ===

    /// Get a cell by address
    pub fn cell(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(&addr)
    }

    /// Get a cell's numeric value
    ///
    /// Returns `None` if the cell is absent, blank, or not coercible to a
    /// finite number.
    pub fn get_numeric(&self, addr: CellAddress) -> Option<f64> {
        self.cells
            .get(&addr)
            .and_then(Cell::as_numeric)
            .filter(|v| v.is_finite())
    }

    /// Get a cell's formula text, if it holds one
    pub fn formula(&self, addr: CellAddress) -> Option<&str> {
        self.cells.get(&addr).and_then(Cell::formula_text)
    }

    // === Cell modification ===

    /// Overwrite (or create) a cell as a numeric cell
    ///
    /// Formula cells are overwritten outright: input cells are never formulas
    /// in a valid configuration, and this only ever runs on a calculation
    /// copy.
    pub fn set_numeric(&mut self, addr: CellAddress, value: f64) {
        self.cells.insert(addr, Cell::Numeric(value));
    }

    /// Set a cell directly
    pub fn set_cell(&mut self, addr: CellAddress, cell: Cell) {
        self.cells.insert(addr, cell);
    }

    /// Iterate over populated cells
    pub fn cells(&self) -> impl Iterator<Item = (&CellAddress, &Cell)> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_get_numeric() {
        let mut sheet = Worksheet::new("Prijzen");
        sheet.set_numeric(addr("B2"), 12.5);
        sheet.set_cell(addr("B3"), Cell::Other);

        assert_eq!(sheet.cell_count(), 2);
        assert_eq!(sheet.get_numeric(addr("B2")), Some(12.5));
        assert_eq!(sheet.get_numeric(addr("B3")), None);
        assert_eq!(sheet.get_numeric(addr("B4")), None); // absent
    }

    #[test]
    fn test_cells_iteration() {
        let mut sheet = Worksheet::new("Prijzen");
        sheet.set_numeric(addr("A1"), 1.0);
        sheet.set_cell(addr("D67"), Cell::formula("A1*2"));
        sheet.set_cell(addr("E1"), Cell::Other);

        let formulas = sheet.cells().filter(|(_, c)| c.is_formula()).count();
        assert_eq!(formulas, 1);
        assert_eq!(sheet.cells().count(), 3);
    }

    #[test]
    fn test_non_finite_is_absent() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_numeric(addr("A1"), f64::NAN);
        sheet.set_numeric(addr("A2"), f64::INFINITY);

        assert_eq!(sheet.get_numeric(addr("A1")), None);
        assert_eq!(sheet.get_numeric(addr("A2")), None);
    }

    #[test]
    fn test_set_numeric_overwrites_formula() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell(addr("D67"), Cell::formula("A1*2"));
        sheet.set_numeric(addr("D67"), 100.0);

        assert_eq!(sheet.formula(addr("D67")), None);
        assert_eq!(sheet.get_numeric(addr("D67")), Some(100.0));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = Worksheet::new("Sheet1");
        original.set_cell(addr("L17"), Cell::formula("D67*1.21"));

        let mut copy = original.clone();
        copy.set_numeric(addr("L17"), 5.0);

        assert_eq!(original.formula(addr("L17")), Some("D67*1.21"));
        assert_eq!(copy.formula(addr("L17")), None);
    }
}
