//! # platequote
//!
//! Spreadsheet-template pricing engine for metal-coating quotes.
//!
//! A user supplies an Excel workbook whose cells encode their pricing rules,
//! designates four input cells (length, width, height, weight) and one output
//! cell (price), and this crate does the rest: it loads and caches the
//! template, writes part dimensions into a copy of the configured worksheet,
//! evaluates the output cell's formula, and returns the price in euros
//! rounded to cents, together with a diagnostic trace.
//!
//! ## Example
//!
//! ```rust,no_run
//! use platequote::config::{ConfigDraft, ConfigStore, MemoryBlobStore, MemoryRepository, TemplateFile};
//! use platequote::pricing::{PricingSession, QuoteInputs};
//!
//! let store = ConfigStore::new(MemoryRepository::new(), MemoryBlobStore::new());
//! let mut session = PricingSession::new(store);
//!
//! session.config_store().set(
//!     ConfigDraft {
//!         sheet_name: "Prijzen".to_string(),
//!         length_cell: "B1".to_string(),
//!         width_cell: "B2".to_string(),
//!         height_cell: "B3".to_string(),
//!         weight_cell: "B4".to_string(),
//!         price_cell: "D67".to_string(),
//!     },
//!     Some(TemplateFile {
//!         file_name: "prijzen.xlsx".to_string(),
//!         data: std::fs::read("prijzen.xlsx").unwrap(),
//!     }),
//! ).unwrap();
//!
//! let quote = session
//!     .calculate_price(&QuoteInputs::new(250.0, 100.0, 30.0, 1.2))
//!     .unwrap();
//! println!("price: {:?} (trace: {:?})", quote.price, quote.debug);
//! ```

pub mod config;
pub mod inputs;
pub mod loader;
pub mod pricing;

mod error;

pub use error::{ConfigError, LoadError, PricingError, ValidationError};

pub use config::{
    BlobStore, ConfigDraft, ConfigRepository, ConfigStore, FsBlobStore, JsonFileRepository,
    MemoryBlobStore, MemoryRepository, PricingConfig, TemplateFile,
};
pub use inputs::{normalize, validate, InputField};
pub use loader::{content_hash, TemplateLoader, WorkbookSource};
pub use pricing::{CalculationDebugInfo, PriceQuote, PricingSession, QuoteInputs};

// Re-export the data model and formula entry points
pub use platequote_core::{Cell, CellAddress, Workbook, Worksheet};
pub use platequote_formula::{evaluate, parse_formula, Expr, FormulaError};
pub use platequote_xlsx::{XlsxError, XlsxReader};
