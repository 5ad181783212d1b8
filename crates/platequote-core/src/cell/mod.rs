//! Cell-related types
//!
//! This module contains:
//! - [`Cell`] - A tagged cell value (numeric, formula, or other)
//! - [`CellAddress`] - A cell's location (e.g., "D67")

mod address;

pub use address::CellAddress;

/// A single worksheet cell
///
/// Calculation only distinguishes three kinds of cell: plain numbers, formula
/// cells, and everything else (text, blanks, errors), which is treated as
/// absent for calculation purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A numeric value
    Numeric(f64),
    /// A formula with an optional last-known value from the file
    Formula {
        /// Formula text as stored in the file (without the leading `=`)
        text: String,
        /// Cached result, if the producing application saved one
        cached: Option<f64>,
    },
    /// Text, blank, or anything else that is not usable in a calculation
    Other,
}

impl Cell {
    /// Create a formula cell without a cached value
    pub fn formula<S: Into<String>>(text: S) -> Self {
        Cell::Formula {
            text: text.into(),
            cached: None,
        }
    }

    /// The cell's numeric value, if it has one
    ///
    /// Formula cells yield their cached value when the file carried one.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Cell::Numeric(v) => Some(*v),
            Cell::Formula { cached, .. } => *cached,
            Cell::Other => None,
        }
    }

    /// The formula text, if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            Cell::Formula { text, .. } => Some(text),
            Cell::Numeric(_) | Cell::Other => None,
        }
    }

    /// Whether this is a formula cell
    pub fn is_formula(&self) -> bool {
        matches!(self, Cell::Formula { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_as_numeric() {
        assert_eq!(Cell::Numeric(4.5).as_numeric(), Some(4.5));
        assert_eq!(Cell::Other.as_numeric(), None);
        assert_eq!(Cell::formula("A1*2").as_numeric(), None);
        assert_eq!(
            Cell::Formula {
                text: "A1*2".into(),
                cached: Some(9.0)
            }
            .as_numeric(),
            Some(9.0)
        );
    }

    #[test]
    fn test_formula_text() {
        assert_eq!(Cell::formula("SUM(A1,A2)").formula_text(), Some("SUM(A1,A2)"));
        assert_eq!(Cell::Numeric(1.0).formula_text(), None);
        assert!(!Cell::Other.is_formula());
    }
}
