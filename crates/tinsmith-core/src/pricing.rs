//! # Price Resolver
//!
//! Resolves the unit price of an order line and recomputes its derived
//! fields.
//!
//! ## Pricing Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         calc_price                                      │
//! │                             │                                           │
//! │            ┌────────────────┴────────────────┐                          │
//! │            ▼                                 ▼                          │
//! │     "variable"                        "formula" (default)               │
//! │  ─────────────────────           ─────────────────────────────────      │
//! │  var_price lookup by             COATING lookup in settings.price       │
//! │  coating + color                 substitute tokens (4 strings)          │
//! │                                  evaluate width / length                │
//! │  price = entry.price             price = round2(f / 1e6 × COATING)      │
//! │  total = price × (qty || 1)            + round2(formula_price)          │
//! │                                  total = price × qty                    │
//! │  width/length passed through                                            │
//! │  unevaluated ("0" if blank)      width/length evaluated (Blank kept)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A coating of `"-"` means [`PAINTED_COATING`](crate::PAINTED_COATING).
//! Missing price points resolve to zero; they never block order entry.

use serde::Serialize;
use tracing::debug;
use ts_rs::TS;

use crate::formula::evaluate;
use crate::money::Money;
use crate::substitution::FormulaSet;
use crate::tax::aggregate_order;
use crate::totals::{area, line_total, price_per_length_unit};
use crate::types::{CalcPrice, CalcValue, Order, OrderLine, OrderTotals, PriceListEntry, Settings};
use crate::{AREA_FORMULA_DIVISOR, PAINTED_COATING};

// =============================================================================
// Price Result
// =============================================================================

/// The priced view of one line.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PriceResult {
    /// Unit price.
    #[ts(type = "number")]
    pub price: Money,

    /// `price × quantity` (before adjustment and discount).
    #[ts(type = "number")]
    pub total: Money,

    /// Substituted formula text (formula mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Substituted add-on price formula text (formula mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_price: Option<String>,

    /// Width template.
    pub formula_width: String,

    /// Length template.
    pub formula_length: String,

    /// Width in mm: evaluated in formula mode, passed through otherwise.
    #[ts(type = "number | string")]
    pub formula_width_calc: CalcValue,

    /// Length in mm: evaluated in formula mode, passed through otherwise.
    #[ts(type = "number | string")]
    pub formula_length_calc: CalcValue,
}

// =============================================================================
// Lookups
// =============================================================================

/// Maps the `"-"` placeholder to the painted coating.
#[inline]
pub fn normalize_coating(coating: &str) -> &str {
    if coating == "-" {
        PAINTED_COATING
    } else {
        coating
    }
}

/// Finds the price point for a coating+color pair.
pub fn find_price_entry<'a>(
    entries: &'a [PriceListEntry],
    coating: &str,
    color: &str,
) -> Option<&'a PriceListEntry> {
    entries.iter().find(|entry| entry.matches(coating, color))
}

/// Coating unit price from the settings price table, zero if not listed.
pub fn coating_price(settings: &Settings, coating: &str, color: &str) -> f64 {
    match find_price_entry(&settings.price, coating, color) {
        Some(entry) => entry.price,
        None => {
            debug!(coating, color, "No coating price, using 0");
            0.0
        }
    }
}

/// Text to evaluate for a dimension: the calc field, else the template, else "0".
fn dimension_seed(calc: &CalcValue, template: &str) -> String {
    if !calc.is_blank() {
        calc.to_formula_text()
    } else if !template.is_empty() {
        template.to_string()
    } else {
        "0".to_string()
    }
}

fn or_zero(text: &str) -> String {
    if text.is_empty() {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn calc_or_zero(calc: &CalcValue) -> CalcValue {
    if calc.is_blank() {
        CalcValue::Text("0".to_string())
    } else {
        calc.clone()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolves the price of a line.
///
/// ## Example
/// ```rust
/// use tinsmith_core::pricing::resolve_price;
/// use tinsmith_core::types::{CalcValue, OrderLine, PriceListEntry, Settings};
///
/// let settings = Settings {
///     price: vec![PriceListEntry {
///         parent: "Polyester".into(),
///         title: "RAL9005".into(),
///         price: 10.0,
///         ..PriceListEntry::default()
///     }],
///     ..Settings::default()
/// };
/// let line = OrderLine {
///     qty: 2.0,
///     coating: "Polyester".into(),
///     color: "RAL9005".into(),
///     formula: "W*L".into(),
///     formula_width_calc: CalcValue::from("300"),
///     formula_length_calc: CalcValue::from("500"),
///     ..OrderLine::default()
/// };
///
/// let result = resolve_price(&settings, &line);
/// assert_eq!(result.price.to_string(), "1.50");
/// assert_eq!(result.total.to_string(), "3.00");
/// ```
pub fn resolve_price(settings: &Settings, line: &OrderLine) -> PriceResult {
    let coating = normalize_coating(&line.coating);

    match line.calc_price {
        CalcPrice::Variable => resolve_variable(line, coating),
        CalcPrice::Formula => resolve_formula(settings, line, coating),
    }
}

fn resolve_variable(line: &OrderLine, coating: &str) -> PriceResult {
    let price = match find_price_entry(&line.var_price, coating, &line.color) {
        Some(entry) => Money::from_amount(entry.price),
        None => {
            debug!(coating, color = %line.color, "No variable price, using 0");
            Money::zero()
        }
    };

    let qty = if line.qty == 0.0 || line.qty.is_nan() {
        1.0
    } else {
        line.qty
    };

    PriceResult {
        price,
        total: price.times(qty),
        formula: None,
        formula_price: None,
        formula_width: or_zero(&line.formula_width),
        formula_length: or_zero(&line.formula_length),
        formula_width_calc: calc_or_zero(&line.formula_width_calc),
        formula_length_calc: calc_or_zero(&line.formula_length_calc),
    }
}

fn resolve_formula(settings: &Settings, line: &OrderLine, coating: &str) -> PriceResult {
    let coating_price = coating_price(settings, coating, &line.color);

    let mut formulas = FormulaSet {
        formula: or_zero(&line.formula),
        formula_price: or_zero(&line.formula_price),
        width: dimension_seed(&line.formula_width_calc, &line.formula_width),
        length: dimension_seed(&line.formula_length_calc, &line.formula_length),
    };
    formulas.bind_line(settings, line, coating_price);

    let width = evaluate(&formulas.width);
    let length = evaluate(&formulas.length);

    let area_part = Money::from_amount(
        evaluate(&formulas.formula).number_or_zero() / AREA_FORMULA_DIVISOR * coating_price,
    );
    let extra_part = Money::from_amount(evaluate(&formulas.formula_price).number_or_zero());
    let price = area_part + extra_part;

    PriceResult {
        price,
        total: price.times(line.qty),
        formula: Some(formulas.formula),
        formula_price: Some(formulas.formula_price),
        formula_width: or_zero(&line.formula_width),
        formula_length: or_zero(&line.formula_length),
        formula_width_calc: width.into(),
        formula_length_calc: length.into(),
    }
}

// =============================================================================
// Recalculation
// =============================================================================

/// Recomputes every derived field of a line in place.
///
/// ## Pipeline
/// ```text
/// resolve_price ──► area ──► price per length ──► line_total
///       │             │              │                 │
///       ▼             ▼              ▼                 ▼
///  price, *_calc     area       price_length         total
/// ```
pub fn recalculate_line(settings: &Settings, line: &mut OrderLine) -> PriceResult {
    let result = resolve_price(settings, line);

    let width = result.formula_width_calc.as_number();
    let length = result.formula_length_calc.as_number();

    line.price = result.price;
    line.formula_width_calc = result.formula_width_calc.clone();
    line.formula_length_calc = result.formula_length_calc.clone();
    line.area = area(width, length);
    line.price_length = price_per_length_unit(result.price, length);
    line.total = line_total(line.qty, result.price, line.adj, &line.discount);

    result
}

/// Recomputes every line, then the live order totals.
pub fn recalculate_order(settings: &Settings, order: &mut Order) -> OrderTotals {
    for line in &mut order.items {
        recalculate_line(settings, line);
    }
    aggregate_order(settings, order)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Discount, InputFieldValue};

    fn entry(parent: &str, title: &str, price: f64) -> PriceListEntry {
        PriceListEntry {
            parent: parent.to_string(),
            title: title.to_string(),
            price,
            ..PriceListEntry::default()
        }
    }

    fn settings() -> Settings {
        Settings {
            price: vec![
                entry("Polyester", "RAL9005", 10.0),
                entry("Painted", "RAL3005", 12.0),
                PriceListEntry {
                    id: "FOLD".to_string(),
                    price: 0.35,
                    ..PriceListEntry::default()
                },
            ],
            tax_percent: 21.0,
            ..Settings::default()
        }
    }

    fn formula_line(formula: &str, width: &str, length: &str) -> OrderLine {
        OrderLine {
            qty: 2.0,
            coating: "Polyester".to_string(),
            color: "RAL9005".to_string(),
            formula: formula.to_string(),
            formula_price: "0".to_string(),
            formula_width_calc: CalcValue::from(width),
            formula_length_calc: CalcValue::from(length),
            ..OrderLine::default()
        }
    }

    #[test]
    fn test_formula_mode_area_price() {
        let result = resolve_price(&settings(), &formula_line("W*L", "300", "500"));

        assert_eq!(result.price.cents(), 150);
        assert_eq!(result.total.cents(), 300);
        assert_eq!(result.formula.as_deref(), Some("300*500"));
        assert_eq!(result.formula_width_calc, CalcValue::Number(300.0));
        assert_eq!(result.formula_length_calc, CalcValue::Number(500.0));
    }

    #[test]
    fn test_formula_price_adds_rounded_extra() {
        let mut line = formula_line("W*L", "300", "500");
        line.formula_price = "FOLD*3".to_string();

        let result = resolve_price(&settings(), &line);

        // 1.50 + round2(1.05)
        assert_eq!(result.price.cents(), 255);
    }

    #[test]
    fn test_dash_coating_is_painted() {
        let mut line = formula_line("W*L", "1000", "1000");
        line.coating = "-".to_string();
        line.color = "RAL3005".to_string();

        assert_eq!(resolve_price(&settings(), &line).price.cents(), 1200);
    }

    #[test]
    fn test_missing_coating_prices_at_zero() {
        let mut line = formula_line("W*L", "300", "500");
        line.color = "RAL0000".to_string();

        let result = resolve_price(&settings(), &line);
        assert!(result.price.is_zero());
        assert_eq!(result.formula_width_calc, CalcValue::Number(300.0));
    }

    #[test]
    fn test_bad_width_formula_stays_blank() {
        let result = resolve_price(&settings(), &formula_line("W*L", "300+*", "500"));

        assert_eq!(result.formula_width_calc, CalcValue::Blank);
        // The substituted formula no longer parses either.
        assert!(result.price.is_zero());
    }

    #[test]
    fn test_width_seeded_from_template() {
        let mut line = formula_line("W*L", "", "500");
        line.formula_width = "200+100".to_string();

        let result = resolve_price(&settings(), &line);
        assert_eq!(result.formula_width_calc, CalcValue::Number(300.0));
        // Substitution is textual: 200+100*500
        assert_eq!(result.formula.as_deref(), Some("200+100*500"));
        assert_eq!(result.price.cents(), 50);
    }

    #[test]
    fn test_blank_dimensions_default_to_zero() {
        let result = resolve_price(&settings(), &formula_line("W*L", "", ""));
        assert_eq!(result.formula_width_calc, CalcValue::Number(0.0));
        assert!(result.price.is_zero());
    }

    #[test]
    fn test_input_fields_substitute_labels() {
        let mut line = formula_line("A*B", "A", "B");
        line.input_fields = vec![
            InputFieldValue {
                label: "A".to_string(),
                default_value: CalcValue::Number(1000.0),
            },
            InputFieldValue {
                label: "B".to_string(),
                default_value: CalcValue::from("250"),
            },
        ];

        let result = resolve_price(&settings(), &line);
        assert_eq!(result.formula_width_calc, CalcValue::Number(1000.0));
        assert_eq!(result.formula_length_calc, CalcValue::Number(250.0));
        assert_eq!(result.price.cents(), 250);
    }

    #[test]
    fn test_variable_mode() {
        let line = OrderLine {
            qty: 3.0,
            coating: "Zinc".to_string(),
            color: "*".to_string(),
            calc_price: CalcPrice::Variable,
            var_price: vec![entry("Zinc", "*", 8.83)],
            formula_width_calc: CalcValue::from("W*2"),
            ..OrderLine::default()
        };

        let result = resolve_price(&settings(), &line);
        assert_eq!(result.price.cents(), 883);
        assert_eq!(result.total.cents(), 2649);
        assert_eq!(result.formula, None);
        assert_eq!(result.formula_width_calc, CalcValue::from("W*2"));
        assert_eq!(result.formula_length_calc, CalcValue::from("0"));
        assert_eq!(result.formula_width, "0");
    }

    #[test]
    fn test_variable_mode_zero_qty_counts_as_one() {
        let line = OrderLine {
            qty: 0.0,
            coating: "Zinc".to_string(),
            color: "*".to_string(),
            calc_price: CalcPrice::Variable,
            var_price: vec![entry("Zinc", "*", 8.83)],
            ..OrderLine::default()
        };

        assert_eq!(resolve_price(&settings(), &line).total.cents(), 883);
    }

    #[test]
    fn test_recalculate_line_writes_derived_fields() {
        let mut line = formula_line("W*L", "300", "2000");
        line.discount = Discount::Text("10%".to_string());

        recalculate_line(&settings(), &mut line);

        // 300 × 2000 / 1e6 × 10 = 6.00
        assert_eq!(line.price.cents(), 600);
        assert_eq!(line.area, CalcValue::Number(0.6));
        assert_eq!(line.price_length, CalcValue::Number(3.0));
        // 2 × 6.00 × 0.9
        assert_eq!(line.total.cents(), 1080);
        assert_eq!(line.formula_width_calc, CalcValue::Number(300.0));
    }

    #[test]
    fn test_recalculate_line_is_idempotent() {
        let mut line = formula_line("W*L*FOLD", "300", "500");
        recalculate_line(&settings(), &mut line);
        let first = line.clone();

        recalculate_line(&settings(), &mut line);
        assert_eq!(line, first);
    }
}
