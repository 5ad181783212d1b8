//! Workbook type - the parsed template document

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;

/// A workbook (parsed spreadsheet document)
///
/// Immutable once parsed: calculations clone individual worksheets, never
/// mutate the workbook itself. The content hash of the raw file bytes
/// identifies a specific template version.
#[derive(Debug)]
pub struct Workbook {
    /// Worksheets in the workbook
    sheets: Vec<Worksheet>,
    /// Hex-encoded hash of the raw file bytes this workbook was parsed from
    content_hash: String,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            sheets: Vec::new(),
            content_hash: String::new(),
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn sheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    /// Get a worksheet by name
    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|ws| ws.name() == name)
    }

    /// Names of all worksheets, in file order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|ws| ws.name()).collect()
    }

    /// Add a worksheet to the workbook
    pub fn add_sheet(&mut self, sheet: Worksheet) -> Result<usize> {
        if self.sheet_by_name(sheet.name()).is_some() {
            return Err(Error::DuplicateSheetName(sheet.name().to_string()));
        }
        let index = self.sheets.len();
        self.sheets.push(sheet);
        Ok(index)
    }

    /// The content hash of the file this workbook was parsed from
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Record the content hash of the source file
    pub fn set_content_hash<S: Into<String>>(&mut self, hash: S) {
        self.content_hash = hash.into();
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::empty()
    }
}
