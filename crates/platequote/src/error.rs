//! Error types for the pricing engine facade

use thiserror::Error;

/// Errors loading a pricing template into memory
///
/// A load failure makes calculation unavailable until resolved, so these are
/// the one class of error `calculate_price` propagates instead of downgrading
/// to a `null` price.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Template download failed
    #[error("cannot load pricing template: {0}")]
    Http(#[from] reqwest::Error),

    /// Template URL returned a non-success status or otherwise misbehaved
    #[error("cannot load pricing template: {0}")]
    Fetch(String),

    /// Bytes were fetched but are not a parseable spreadsheet container
    #[error("cannot load pricing template: {0}")]
    Parse(#[from] platequote_xlsx::XlsxError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors validating a dimension/weight input
///
/// Messages use the canonical Dutch field names; they are shown to the user
/// per field.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Input is not parseable as a number
    #[error("ongeldige waarde voor {field}: '{value}'")]
    NotANumber {
        /// Dutch field name (lengte/breedte/hoogte/gewicht)
        field: &'static str,
        /// The raw input as supplied
        value: String,
    },

    /// Input parsed but is zero, negative, or non-finite
    #[error("waarde voor {field} moet een positief getal zijn")]
    NotPositive {
        /// Dutch field name (lengte/breedte/hoogte/gewicht)
        field: &'static str,
    },
}

/// Errors from the config store and its persistence collaborators
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An update without a file was requested but no template is stored yet
    #[error("no stored template; a template file is required")]
    MissingTemplate,

    /// The row-store collaborator failed
    #[error("config repository error: {0}")]
    Repository(String),

    /// The object-store collaborator failed
    #[error("blob store error: {0}")]
    Storage(String),

    /// IO error (file-backed collaborators)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config record could not be (de)serialized
    #[error("config serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors that abort a price calculation early
///
/// Everything else (bad formulas, missing cells, negative results) is caught
/// and reported through the debug trace with a `None` price.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Template could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Config store round-trip failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}
