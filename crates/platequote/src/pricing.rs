//! Pricing orchestration
//!
//! Wires a configured template, normalized inputs, and the formula evaluator
//! together into a single `calculate_price` call. A calculation never mutates
//! the cached workbook: it clones the configured worksheet, writes the four
//! inputs into the copy, and evaluates the output cell against that copy.
//!
//! A failed automatic calculation must never block manual price entry, so
//! every formula or configuration problem past loading is downgraded to a
//! `None` price plus a debug trace entry. Only template load failures and
//! store round-trip errors propagate as hard errors.

use std::sync::Arc;

use log::debug;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::{BlobStore, ConfigRepository, ConfigStore, PricingConfig};
use crate::error::PricingError;
use crate::inputs::InputField;
use crate::loader::{TemplateLoader, WorkbookSource};
use platequote_core::{CellAddress, Workbook, Worksheet};
use platequote_formula::{evaluate, parse_formula};

/// The four dimension/weight inputs for one calculation
///
/// Each is optional: the caller may intentionally omit a dimension, which
/// yields a `None` price with a "missing inputs" debug entry rather than an
/// error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuoteInputs {
    /// Length in millimeters
    pub length: Option<f64>,
    /// Width in millimeters
    pub width: Option<f64>,
    /// Height in millimeters
    pub height: Option<f64>,
    /// Weight in kilograms
    pub weight: Option<f64>,
}

impl QuoteInputs {
    /// All four inputs present
    pub fn new(length: f64, width: f64, height: f64, weight: f64) -> Self {
        Self {
            length: Some(length),
            width: Some(width),
            height: Some(height),
            weight: Some(weight),
        }
    }

    fn get(&self, field: InputField) -> Option<f64> {
        match field {
            InputField::Length => self.length,
            InputField::Width => self.width,
            InputField::Height => self.height,
            InputField::Weight => self.weight,
        }
    }

    fn missing(&self) -> Vec<InputField> {
        InputField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }
}

/// Per-calculation diagnostic record
///
/// Ephemeral; returned alongside the price so the UI can show why a price
/// came out the way it did (or why it did not come out at all).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationDebugInfo {
    /// Worksheet the calculation used
    pub sheet_name: String,
    /// Address/value pairs actually written into the worksheet copy
    pub inputs_written: Vec<(String, f64)>,
    /// Configured output cell address
    pub output_cell: String,
    /// Raw evaluator result before rounding, if any
    pub output_value: Option<f64>,
    /// Content hash of the workbook used
    pub workbook_hash: String,
    /// Human-readable errors accumulated during the attempt
    pub errors: Vec<String>,
}

/// Result of one price calculation
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    /// Price in euros, rounded to cents; `None` when no price could be
    /// computed
    pub price: Option<f64>,
    /// Diagnostic trace for this calculation
    pub debug: CalculationDebugInfo,
}

impl PriceQuote {
    fn failed(debug: CalculationDebugInfo) -> Self {
        Self { price: None, debug }
    }
}

/// Round to whole cents, half away from zero
fn round_cents(value: f64) -> Option<f64> {
    let decimal = Decimal::from_f64(value)?;
    decimal
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

/// A pricing session: loader cache, config store handle, and nothing shared
///
/// Sessions are independent context objects; two sessions never observe each
/// other's caches. The parsed workbook sits behind an `Arc` and is never
/// mutated, so repeated calculations against it are order-insensitive.
pub struct PricingSession<R: ConfigRepository, B: BlobStore> {
    loader: TemplateLoader,
    store: ConfigStore<R, B>,
}

impl<R: ConfigRepository, B: BlobStore> PricingSession<R, B> {
    /// Create a session over a config store
    pub fn new(store: ConfigStore<R, B>) -> Self {
        Self {
            loader: TemplateLoader::new(),
            store,
        }
    }

    /// The underlying config store
    pub fn config_store(&mut self) -> &mut ConfigStore<R, B> {
        &mut self.store
    }

    /// Drop cached workbooks and the cached config record
    ///
    /// The next calculation reloads both from the collaborators.
    pub fn invalidate(&mut self) {
        self.loader.clear_cache();
        self.store.invalidate();
    }

    /// Calculate a price for the given inputs
    ///
    /// Returns `Ok` with `price: None` for every per-calculation problem
    /// (unconfigured, missing inputs, missing sheet, bad formula, negative
    /// result); returns `Err` only when the template cannot be loaded or the
    /// store fails.
    pub fn calculate_price(&mut self, inputs: &QuoteInputs) -> Result<PriceQuote, PricingError> {
        let mut trace = CalculationDebugInfo::default();

        // Unconfigured: report and stop before any cell access
        let config = match self.store.get()? {
            Some(config) => config.clone(),
            None => {
                trace.errors.push("configuratie niet geladen".to_string());
                return Ok(PriceQuote::failed(trace));
            }
        };
        trace.sheet_name = config.sheet_name.clone();
        trace.output_cell = config.price_cell.clone();
        trace.workbook_hash = config.workbook_hash.clone();

        let missing = inputs.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|f| f.dutch_name()).collect();
            trace
                .errors
                .push(format!("ontbrekende invoer: {}", names.join(", ")));
            return Ok(PriceQuote::failed(trace));
        }

        let workbook = self.workbook(&config)?;
        let Some(original) = workbook.sheet_by_name(&config.sheet_name) else {
            trace
                .errors
                .push(format!("werkblad '{}' niet gevonden", config.sheet_name));
            return Ok(PriceQuote::failed(trace));
        };

        // All writes go to a copy; the cached workbook stays pristine
        let mut sheet = original.clone();
        if !Self::write_inputs(&mut sheet, &config, inputs, &mut trace) {
            return Ok(PriceQuote::failed(trace));
        }

        let output_addr = match config.price_cell.parse::<CellAddress>() {
            Ok(addr) => addr,
            Err(e) => {
                trace.errors.push(format!(
                    "ongeldig celadres '{}' voor prijs: {}",
                    config.price_cell, e
                ));
                return Ok(PriceQuote::failed(trace));
            }
        };

        let raw = Self::resolve_output(&sheet, output_addr, &config, &mut trace);
        trace.output_value = raw;

        let mut price = None;
        if let Some(value) = raw {
            match round_cents(value) {
                Some(rounded) if rounded >= 0.0 => price = Some(rounded),
                Some(rounded) => trace
                    .errors
                    .push(format!("berekende prijs {} is negatief", rounded)),
                None => trace
                    .errors
                    .push(format!("berekende prijs {} is geen geldig bedrag", value)),
            }
        }

        debug!(
            "calculated price {:?} from {}!{}",
            price, trace.sheet_name, trace.output_cell
        );
        Ok(PriceQuote { price, debug: trace })
    }

    /// Write the four inputs into the worksheet copy, recording each write
    ///
    /// Returns `false` when a configured input address does not parse.
    fn write_inputs(
        sheet: &mut Worksheet,
        config: &PricingConfig,
        inputs: &QuoteInputs,
        trace: &mut CalculationDebugInfo,
    ) -> bool {
        let cells = [
            (InputField::Length, &config.length_cell),
            (InputField::Width, &config.width_cell),
            (InputField::Height, &config.height_cell),
            (InputField::Weight, &config.weight_cell),
        ];

        for (field, cell) in cells {
            // Missing inputs were rejected before this point
            let Some(value) = inputs.get(field) else {
                return false;
            };
            match cell.parse::<CellAddress>() {
                Ok(addr) => {
                    sheet.set_numeric(addr, value);
                    trace.inputs_written.push((cell.clone(), value));
                }
                Err(e) => {
                    trace.errors.push(format!(
                        "ongeldig celadres '{}' voor {}: {}",
                        cell,
                        field.dutch_name(),
                        e
                    ));
                    return false;
                }
            }
        }
        true
    }

    /// Evaluate the output cell: formula if present, static value otherwise
    fn resolve_output(
        sheet: &Worksheet,
        addr: CellAddress,
        config: &PricingConfig,
        trace: &mut CalculationDebugInfo,
    ) -> Option<f64> {
        if let Some(text) = sheet.formula(addr) {
            match parse_formula(text).and_then(|expr| evaluate(&expr, sheet)) {
                Ok(value) => Some(value),
                Err(e) => {
                    trace
                        .errors
                        .push(format!("formule '{}' kon niet worden berekend: {}", text, e));
                    None
                }
            }
        } else {
            match sheet.get_numeric(addr) {
                Some(value) => Some(value),
                None => {
                    trace.errors.push(format!(
                        "uitvoercel {} bevat geen formule of numerieke waarde",
                        config.price_cell
                    ));
                    None
                }
            }
        }
    }

    /// The parsed workbook for a config, from cache or the blob store
    fn workbook(&mut self, config: &PricingConfig) -> Result<Arc<Workbook>, PricingError> {
        if let Some(workbook) = self.loader.cached(&config.workbook_hash) {
            return Ok(workbook);
        }
        let data = self.store.workbook_bytes(config)?;
        let workbook = self.loader.load(&WorkbookSource::Bytes {
            name: config.file_name.clone(),
            data,
        })?;
        Ok(workbook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(123.4567), Some(123.46));
        assert_eq!(round_cents(123.454), Some(123.45));
        assert_eq!(round_cents(0.005), Some(0.01)); // half away from zero
        assert_eq!(round_cents(-0.005), Some(-0.01));
        assert_eq!(round_cents(100.0), Some(100.0));
        assert_eq!(round_cents(f64::NAN), None);
    }

    #[test]
    fn test_missing_fields() {
        let inputs = QuoteInputs {
            length: Some(1.0),
            width: None,
            height: None,
            weight: Some(2.0),
        };
        assert_eq!(
            inputs.missing(),
            vec![InputField::Width, InputField::Height]
        );
        assert!(QuoteInputs::new(1.0, 2.0, 3.0, 4.0).missing().is_empty());
    }
}
