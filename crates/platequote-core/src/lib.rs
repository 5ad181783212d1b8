//! Core data structures for the platequote pricing engine
//!
//! This crate holds the in-memory model of a pricing template: a [`Workbook`]
//! of named [`Worksheet`]s, each a sparse grid of [`Cell`]s addressed by
//! A1-style [`CellAddress`]es.

mod cell;
mod error;
mod workbook;
mod worksheet;

pub use cell::{Cell, CellAddress};
pub use error::{Error, Result};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns (Excel limit, column XFD)
pub const MAX_COLS: u16 = 16_384;
