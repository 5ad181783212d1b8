//! Formula parsing and evaluation for the platequote pricing engine
//!
//! Templates drive their price cell with a constrained formula grammar:
//! arithmetic, comparisons, cell references, and a fixed set of functions
//! (IF, SUM, MAX, MIN, ABS, ROUND). This crate parses a single formula into
//! an [`Expr`] tree and evaluates it against a worksheet snapshot. There is
//! no dependency graph and no whole-workbook recalculation: one formula in,
//! one number out.
//!
//! ## Example
//!
//! ```rust
//! use platequote_core::{CellAddress, Worksheet};
//! use platequote_formula::{evaluate, parse_formula};
//!
//! let mut sheet = Worksheet::new("Blad1");
//! sheet.set_numeric(CellAddress::parse("A1").unwrap(), 25.0);
//!
//! let expr = parse_formula("=IF(A1>10, IF(A1>20, 100, 50), 10)").unwrap();
//! assert_eq!(evaluate(&expr, &sheet).unwrap(), 100.0);
//! ```

mod ast;
mod error;
mod eval;
mod parser;

pub use ast::{BinaryOperator, Expr, Func, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use eval::evaluate;
pub use parser::parse_formula;
