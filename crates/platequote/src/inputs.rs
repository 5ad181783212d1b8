//! Input normalization for part dimensions and weight
//!
//! Users type dimensions into a Dutch-locale UI, so values arrive as strings
//! like `"1.234,5"` (thousands point, decimal comma) as often as plain
//! numbers. Normalization converts those to `f64` and rejects anything that
//! is not a positive finite number, naming the failing field in Dutch.

use crate::error::ValidationError;

/// The four semantic input roles of a pricing template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    /// Part length in millimeters
    Length,
    /// Part width in millimeters
    Width,
    /// Part height in millimeters
    Height,
    /// Part weight in kilograms
    Weight,
}

impl InputField {
    /// All fields, in the order they are configured and reported
    pub const ALL: [InputField; 4] = [
        InputField::Length,
        InputField::Width,
        InputField::Height,
        InputField::Weight,
    ];

    /// Canonical Dutch display name, used in user-facing error messages
    pub fn dutch_name(self) -> &'static str {
        match self {
            InputField::Length => "lengte",
            InputField::Width => "breedte",
            InputField::Height => "hoogte",
            InputField::Weight => "gewicht",
        }
    }
}

/// Normalize a raw string input to a validated positive number
///
/// Accepts canonical `12.5` notation as well as Dutch `12,5` and `1.234,5`
/// (thousands point stripped, decimal comma converted). Fails when the value
/// is not a number, not finite, or not strictly positive.
pub fn normalize(raw: &str, field: InputField) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();

    let value = match trimmed.parse::<f64>() {
        Ok(v) => v,
        Err(_) if trimmed.contains(',') => {
            let converted = trimmed.replace('.', "").replace(',', ".");
            converted
                .parse::<f64>()
                .map_err(|_| ValidationError::NotANumber {
                    field: field.dutch_name(),
                    value: raw.to_string(),
                })?
        }
        Err(_) => {
            return Err(ValidationError::NotANumber {
                field: field.dutch_name(),
                value: raw.to_string(),
            })
        }
    };

    validate(value, field)
}

/// Validate an already-numeric input
///
/// Rejects NaN, infinities, zero, and negatives.
pub fn validate(value: f64, field: InputField) -> Result<f64, ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::NotPositive {
            field: field.dutch_name(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_plain_number() {
        assert_eq!(normalize("250", InputField::Length), Ok(250.0));
        assert_eq!(normalize("12.5", InputField::Width), Ok(12.5));
        assert_eq!(normalize(" 7 ", InputField::Height), Ok(7.0));
    }

    #[test]
    fn test_normalize_decimal_comma() {
        assert_eq!(normalize("1234,5", InputField::Length), Ok(1234.5));
        assert_eq!(normalize("1.234,5", InputField::Length), Ok(1234.5));
        assert_eq!(normalize("0,5", InputField::Weight), Ok(0.5));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = normalize("zeven", InputField::Height).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotANumber {
                field: "hoogte",
                value: "zeven".to_string(),
            }
        );
        assert!(err.to_string().contains("hoogte"));
    }

    #[test]
    fn test_normalize_rejects_non_positive() {
        assert!(normalize("0", InputField::Length).is_err());
        assert!(normalize("-5", InputField::Weight).is_err());
        assert!(normalize("NaN", InputField::Width).is_err());
        assert!(normalize("inf", InputField::Width).is_err());
    }

    #[test]
    fn test_error_names_field_in_dutch() {
        let err = normalize("-1", InputField::Weight).unwrap_err();
        assert!(err.to_string().contains("gewicht"));
    }
}
