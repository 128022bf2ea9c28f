//! # Validation Module
//!
//! Authoring-time checks for price tables, product formulas and line inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard editor                                             │
//! │  ├── Field formats (numbers, non-empty ids)                            │
//! │  └── THIS MODULE: formulas resolve and parse before they are saved    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Recalculation (pricing / tax)                                │
//! │  ├── Never fails: bad formula → Blank, missing price → 0              │
//! │  └── Negative totals clamp to zero                                     │
//! │                                                                         │
//! │  A formula that slips past layer 1 prices at zero in layer 2, so the  │
//! │  editor should call validate_formula on every save.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tinsmith_core::types::Settings;
//! use tinsmith_core::validation::{validate_formula, validate_quantity};
//!
//! let settings = Settings::default();
//! assert!(validate_formula("formula", "W*L*COATING", &settings, &[]).is_ok());
//! assert!(validate_formula("formula", "W*X", &settings, &[]).is_err());
//! assert!(validate_quantity(5.0).is_ok());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::formula::{is_formula_char, parse_formula};
use crate::substitution::{price_table_bindings, substitute, TokenBinding};
use crate::types::{Discount, InputFieldValue, Settings};
use crate::{AREA_FORMULA_DIVISOR, MAX_LINE_QUANTITY, TOKEN_COATING, TOKEN_LENGTH, TOKEN_M2, TOKEN_WIDTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Formula Validators
// =============================================================================

/// Stand-in value for tokens whose real value is only known per line.
const SAMPLE_VALUE: &str = "1";

/// Validates a formula as it would be stored on a product.
///
/// ## Rules
/// - Empty is fine (evaluates to 0)
/// - Every name must be a known token: `COATING`, `M2`, a price id, an
///   input-field label, or `W`/`L` when the product has no input fields
/// - What remains must parse as arithmetic
///
/// Tokens are replaced in the same order recalculation uses, so a formula
/// that passes here evaluates during pricing.
///
/// ## Example
/// ```rust
/// use tinsmith_core::error::ValidationError;
/// use tinsmith_core::types::Settings;
/// use tinsmith_core::validation::validate_formula;
///
/// let settings = Settings::default();
/// let err = validate_formula("formula", "W*L+", &settings, &[]).unwrap_err();
/// assert!(matches!(err, ValidationError::InvalidFormula { .. }));
/// ```
pub fn validate_formula(
    field: &str,
    text: &str,
    settings: &Settings,
    input_fields: &[InputFieldValue],
) -> ValidationResult<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let mut bindings = vec![
        TokenBinding::new(TOKEN_COATING, SAMPLE_VALUE),
        TokenBinding::new(TOKEN_M2, format!("({}/{})", SAMPLE_VALUE, AREA_FORMULA_DIVISOR)),
    ];
    bindings.extend(price_table_bindings(settings));
    bindings.extend(
        input_fields
            .iter()
            .map(|field| TokenBinding::new(field.label.as_str(), SAMPLE_VALUE)),
    );
    if input_fields.is_empty() {
        bindings.push(TokenBinding::new(TOKEN_WIDTH, SAMPLE_VALUE));
        bindings.push(TokenBinding::new(TOKEN_LENGTH, SAMPLE_VALUE));
    }

    let resolved = substitute(text, &bindings);

    if let Some(token) = first_unresolved_token(&resolved) {
        return Err(ValidationError::UnresolvedToken {
            field: field.to_string(),
            token,
        });
    }

    parse_formula(&resolved)
        .map(|_| ())
        .map_err(|source| ValidationError::InvalidFormula {
            field: field.to_string(),
            source,
        })
}

/// First run of characters the evaluator would silently drop.
fn first_unresolved_token(text: &str) -> Option<String> {
    let start = text.find(|c: char| !is_formula_char(c))?;
    let token: String = text[start..]
        .chars()
        .take_while(|&c| !is_formula_char(c))
        .collect();
    Some(token)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a VAT percent.
///
/// ## Example
/// ```rust
/// use tinsmith_core::validation::validate_tax_percent;
///
/// assert!(validate_tax_percent(21.0).is_ok());
/// assert!(validate_tax_percent(0.0).is_ok());
/// assert!(validate_tax_percent(121.0).is_err());
/// ```
pub fn validate_tax_percent(percent: f64) -> ValidationResult<()> {
    if !percent.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "tax_percent".to_string(),
        });
    }

    if !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "tax_percent".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be a finite number above zero
/// - Must not exceed MAX_LINE_QUANTITY
///
/// Fractional quantities are allowed (running meters, m²).
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "qty".to_string(),
        });
    }

    if qty <= 0.0 || qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 0.0,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a discount. Text must parse to a percent between 0 and 100.
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    let percent = discount.percent();
    if !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(())
}

// =============================================================================
// Settings Validators
// =============================================================================

/// Validates a settings document before it is saved.
///
/// ## Rules
/// - `tax_percent` between 0 and 100
/// - Every price is a finite number
/// - Price ids are unique (empty ids are not ids)
pub fn validate_settings(settings: &Settings) -> ValidationResult<()> {
    validate_tax_percent(settings.tax_percent)?;

    let mut seen = HashSet::new();
    for entry in &settings.price {
        if !entry.price.is_finite() {
            return Err(ValidationError::NotFinite {
                field: format!("price of {}/{}", entry.parent, entry.title),
            });
        }

        if !entry.id.is_empty() && !seen.insert(entry.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "price id".to_string(),
                value: entry.id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaError;
    use crate::types::{CalcValue, PriceListEntry};

    fn constant(id: &str, price: f64) -> PriceListEntry {
        PriceListEntry {
            id: id.to_string(),
            price,
            ..PriceListEntry::default()
        }
    }

    fn settings() -> Settings {
        Settings {
            price: vec![constant("FOLD", 0.35), constant("CUT", 1.2)],
            tax_percent: 21.0,
            ..Settings::default()
        }
    }

    #[test]
    fn test_validate_formula_known_tokens() {
        let settings = settings();
        assert!(validate_formula("formula", "", &settings, &[]).is_ok());
        assert!(validate_formula("formula", "W*L/1000000*COATING+5", &settings, &[]).is_ok());
        assert!(validate_formula("formula", "M2*COATING+FOLD*2+CUT", &settings, &[]).is_ok());
        assert!(validate_formula("formula", "W>1250 ? 3 : 2", &settings, &[]).is_ok());
    }

    #[test]
    fn test_validate_formula_unknown_token() {
        let err = validate_formula("formula_price", "W*PRICE", &settings(), &[]).unwrap_err();
        match err {
            ValidationError::UnresolvedToken { field, token } => {
                assert_eq!(field, "formula_price");
                assert_eq!(token, "PRICE");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_formula_syntax() {
        let err = validate_formula("formula", "W*(L+1", &settings(), &[]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidFormula {
                source: FormulaError::UnexpectedEnd,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_formula_input_fields_replace_dimensions() {
        let fields = vec![InputFieldValue {
            label: "A".to_string(),
            default_value: CalcValue::Blank,
        }];
        let settings = settings();

        assert!(validate_formula("formula", "A*2", &settings, &fields).is_ok());
        // W is not substituted on lines with input fields.
        let err = validate_formula("formula", "A*W", &settings, &fields).unwrap_err();
        assert!(matches!(err, ValidationError::UnresolvedToken { token, .. } if token == "W"));
    }

    #[test]
    fn test_validate_tax_percent() {
        assert!(validate_tax_percent(21.0).is_ok());
        assert!(validate_tax_percent(100.0).is_ok());
        assert!(validate_tax_percent(-1.0).is_err());
        assert!(matches!(
            validate_tax_percent(f64::NAN),
            Err(ValidationError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1.0).is_ok());
        assert!(validate_quantity(2.5).is_ok());
        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-1.0).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1.0).is_err());
        assert!(validate_quantity(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&Discount::Text("15%".to_string())).is_ok());
        assert!(validate_discount(&Discount::Percent(0.0)).is_ok());
        assert!(validate_discount(&Discount::Percent(120.0)).is_err());
        assert!(validate_discount(&Discount::Text("-5%".to_string())).is_err());
    }

    #[test]
    fn test_validate_settings() {
        assert!(validate_settings(&settings()).is_ok());

        let mut duplicate = settings();
        duplicate.price.push(constant("FOLD", 0.4));
        assert!(matches!(
            validate_settings(&duplicate),
            Err(ValidationError::Duplicate { value, .. }) if value == "FOLD"
        ));

        // Coating rows have no id; many of them are fine.
        let mut coatings = settings();
        coatings.price.push(constant("", 10.0));
        coatings.price.push(constant("", 12.0));
        assert!(validate_settings(&coatings).is_ok());

        let mut bad_price = settings();
        bad_price.price.push(constant("X", f64::NAN));
        assert!(validate_settings(&bad_price).is_err());
    }
}
