//! XLSX reading for the platequote pricing engine
//!
//! Parses an Office Open XML spreadsheet into the
//! [`platequote_core::Workbook`] model: sheet names, numeric cells, and
//! formula text. Everything the pricing engine does not touch (styles,
//! comments, charts, validations) is skipped on purpose.

mod error;
mod reader;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
