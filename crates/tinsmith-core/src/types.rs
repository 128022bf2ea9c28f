//! # Domain Types
//!
//! Records exchanged with the order-entry dashboard.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌──────────────────────────────────────┐   │
//! │  │    Settings     │        │              Order                   │   │
//! │  │  ─────────────  │        │  ──────────────────────────────────  │   │
//! │  │  price[] ───────┼──┐     │  items[] ──► OrderLine               │   │
//! │  │  tax_percent    │  │     │  vat_status  "0" | "1"               │   │
//! │  │  tax_display    │  │     │  price ────► OrderTotals (derived)   │   │
//! │  │  var_parent     │  │     └──────────────────────────────────────┘   │
//! │  └─────────────────┘  │                                                 │
//! │                       ▼                                                 │
//! │  ┌─────────────────────────┐   ┌─────────────────────────────────────┐ │
//! │  │    PriceListEntry       │   │  Loosely typed dashboard fields     │ │
//! │  │  id / parent / title    │   │  ─────────────────────────────────  │ │
//! │  │  price / unit / public  │   │  CalcValue: Number | Blank | Text   │ │
//! │  └─────────────────────────┘   │  Discount:  Percent | Text ("15%")  │ │
//! │                                └─────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lenient Input
//! The dashboard hands over whatever its table widget holds: numbers as
//! strings, `null` for untouched cells, booleans as `1`. Every numeric field
//! is read the way the dashboard reads it (`parseFloat(x) || 0`), so a
//! malformed cell prices at zero instead of rejecting the whole order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 2100 bps = 21% (Latvian standard VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from a percentage. Negative or non-finite input
    /// yields a zero rate.
    pub fn from_percentage(pct: f64) -> Self {
        if pct.is_finite() && pct > 0.0 {
            TaxRate((pct * 100.0).round() as u32)
        } else {
            TaxRate::zero()
        }
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Lenient Number Handling
// =============================================================================

/// Parses the leading decimal number of a string, like `parseFloat`.
///
/// ## Example
/// ```rust
/// use tinsmith_core::types::parse_float;
///
/// assert_eq!(parse_float("8.83"), Some(8.83));
/// assert_eq!(parse_float("  15%"), Some(15.0));
/// assert_eq!(parse_float(".5mm"), Some(0.5));
/// assert_eq!(parse_float("1e3"), Some(1000.0));
/// assert_eq!(parse_float("abc"), None);
/// ```
pub fn parse_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].parse().ok();
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Renders a number the way it is spliced into formula text.
///
/// Integers print without a fractional part (`300`), everything else uses
/// the shortest representation that reads back to the same value.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    value.to_string()
}

/// Reads a JSON value as a number the way the dashboard does (`parseFloat(x) || 0`).
pub fn number_from_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float(s),
        _ => None,
    };
    match parsed {
        Some(n) if !n.is_nan() => n,
        _ => 0.0,
    }
}

/// Serde helper: a number, numeric string, or null, read leniently.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(number_from_value).unwrap_or(0.0))
}

/// Serde helper: a string, with null read as empty and numbers stringified.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    })
}

/// Serde helper: `true`, `1`, `"1"` and `"true"` are true.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

// =============================================================================
// CalcValue
// =============================================================================

/// A field that holds either a computed number, nothing, or formula text.
///
/// `formula_width_calc` starts life as text typed by the user (`"300"`,
/// `"A+B"`) and is replaced by the evaluated number after each pass.
/// `Blank` is the "could not be computed" marker: it is NOT zero and
/// must not be silently coerced to zero by callers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CalcValue {
    /// A computed number.
    Number(f64),
    /// Empty, or a formula that failed to evaluate.
    #[default]
    Blank,
    /// Raw formula text not yet evaluated.
    Text(String),
}

impl CalcValue {
    /// Returns the numeric value, parsing text that is a plain number.
    ///
    /// ## Example
    /// ```rust
    /// use tinsmith_core::types::CalcValue;
    ///
    /// assert_eq!(CalcValue::Number(2.5).as_number(), Some(2.5));
    /// assert_eq!(CalcValue::Text(" 300 ".into()).as_number(), Some(300.0));
    /// assert_eq!(CalcValue::Text("W*2".into()).as_number(), None);
    /// assert_eq!(CalcValue::Blank.as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CalcValue::Number(n) => Some(*n),
            CalcValue::Text(s) => s.trim().parse().ok(),
            CalcValue::Blank => None,
        }
    }

    /// Returns the text spliced into formulas for this value.
    pub fn to_formula_text(&self) -> String {
        match self {
            CalcValue::Number(n) => format_number(*n),
            CalcValue::Text(s) => s.clone(),
            CalcValue::Blank => String::new(),
        }
    }

    /// Checks if the value is blank.
    #[inline]
    pub fn is_blank(&self) -> bool {
        matches!(self, CalcValue::Blank)
    }
}

impl From<f64> for CalcValue {
    fn from(n: f64) -> Self {
        CalcValue::Number(n)
    }
}

impl From<&str> for CalcValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CalcValue::Blank
        } else {
            CalcValue::Text(s.to_string())
        }
    }
}

/// Non-finite numbers (a width of `1/0`) are written as `""`, the same
/// marker as [`CalcValue::Blank`], since JSON has no representation for them.
impl Serialize for CalcValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CalcValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CalcValue::Number(_) | CalcValue::Blank => serializer.serialize_str(""),
            CalcValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for CalcValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => CalcValue::Blank,
            Some(Value::Number(n)) => CalcValue::Number(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) => CalcValue::from(s.as_str()),
            Some(other) => CalcValue::Text(other.to_string()),
        })
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A percentage discount as entered: a number or text such as `"15%"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Discount {
    /// Numeric percent.
    Percent(f64),
    /// Text as typed; parsed when used.
    Text(String),
}

impl Discount {
    /// Returns the discount percent; anything unparseable is 0.
    ///
    /// ## Example
    /// ```rust
    /// use tinsmith_core::types::Discount;
    ///
    /// assert_eq!(Discount::Text("15%".into()).percent(), 15.0);
    /// assert_eq!(Discount::Text("12.5 %".into()).percent(), 12.5);
    /// assert_eq!(Discount::Text("none".into()).percent(), 0.0);
    /// assert_eq!(Discount::Percent(10.0).percent(), 10.0);
    /// ```
    pub fn percent(&self) -> f64 {
        let pct = match self {
            Discount::Percent(p) => *p,
            Discount::Text(s) => parse_float(&s.replace('%', "")).unwrap_or(0.0),
        };
        if pct.is_finite() {
            pct
        } else {
            0.0
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::Percent(0.0)
    }
}

impl Serialize for Discount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Discount::Percent(p) => serializer.serialize_f64(*p),
            Discount::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Discount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => Discount::Percent(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) => Discount::Text(s),
            _ => Discount::default(),
        })
    }
}

// =============================================================================
// Pricing Mode
// =============================================================================

/// How a line is priced.
///
/// Anything other than `"variable"` prices by formula, which is what the
/// dashboard does for lines created before the field existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CalcPrice {
    /// Flat per-unit price looked up from the line's own coating+color table.
    Variable,
    /// Unit price evaluated from the product's parametric formula.
    #[default]
    Formula,
}

impl<'de> Deserialize<'de> for CalcPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient_string(deserializer)?;
        Ok(if raw == "variable" {
            CalcPrice::Variable
        } else {
            CalcPrice::Formula
        })
    }
}

// =============================================================================
// VAT Status
// =============================================================================

/// Order-level VAT status of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export)]
pub enum VatStatus {
    /// Not a VAT payer (or not verified): standard VAT applies.
    #[default]
    #[serde(rename = "0")]
    NonPayer,
    /// Valid VAT payer: qualifying lines fall under reverse charge.
    #[serde(rename = "1")]
    Payer,
}

impl VatStatus {
    /// Returns the wire code.
    pub fn code(&self) -> &'static str {
        match self {
            VatStatus::NonPayer => "0",
            VatStatus::Payer => "1",
        }
    }

    /// Returns true for a valid VAT payer.
    #[inline]
    pub fn is_payer(&self) -> bool {
        matches!(self, VatStatus::Payer)
    }
}

impl fmt::Display for VatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for VatStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" | "" => Ok(VatStatus::NonPayer),
            "1" => Ok(VatStatus::Payer),
            other => Err(CoreError::UnknownVatStatus(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for VatStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_string(deserializer)?
            .parse()
            .map_err(<D::Error as serde::de::Error>::custom)
    }
}

// =============================================================================
// Price List
// =============================================================================

/// One price point: a coating+color combination, or a named constant
/// referenced by `id` inside formulas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct PriceListEntry {
    /// Token used inside formulas (may be empty).
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,

    /// Coating / category name (e.g. "Polyester", "Zinc").
    #[serde(deserialize_with = "lenient_string")]
    pub parent: String,

    /// Color / variant name (e.g. "RAL9005", "*").
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,

    /// Unit price.
    #[serde(deserialize_with = "lenient_number")]
    pub price: f64,

    /// Unit label ("m2", "gab.").
    #[serde(deserialize_with = "lenient_string")]
    pub unit: String,

    /// Shown on customer-facing price lists.
    #[serde(deserialize_with = "lenient_bool")]
    pub public: bool,
}

impl PriceListEntry {
    /// Returns true if this entry is the price point for a coating+color pair.
    #[inline]
    pub fn matches(&self, coating: &str, color: &str) -> bool {
        self.parent == coating && self.title == color
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Pricing settings for an editing session. Read-only to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct Settings {
    /// Price table: coating prices and formula constants.
    pub price: Vec<PriceListEntry>,

    /// Standard VAT percent (e.g. 21).
    #[serde(deserialize_with = "lenient_number")]
    pub tax_percent: f64,

    /// Label printed on the VAT line (e.g. "PVN 21%").
    #[serde(deserialize_with = "lenient_string")]
    pub tax_display: String,

    /// Newline-separated coating categories priced in variable mode.
    #[serde(deserialize_with = "lenient_string")]
    pub var_parent: String,
}

impl Settings {
    /// Returns the standard VAT rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_percentage(self.tax_percent)
    }
}

// =============================================================================
// Input Fields
// =============================================================================

/// A named parametric value (e.g. a sketch dimension) substitutable into formulas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct InputFieldValue {
    /// Token as written in formulas.
    #[serde(deserialize_with = "lenient_string")]
    pub label: String,

    /// Value spliced in place of the label.
    #[serde(rename = "default")]
    #[ts(type = "number | string")]
    pub default_value: CalcValue,
}

// =============================================================================
// Order Line
// =============================================================================

/// One order row: a product configuration with its derived prices.
///
/// ## Field Ownership
/// ```text
/// Entered by the user            Derived by tinsmith-core
/// ───────────────────            ────────────────────────
/// qty, coating, color            price, total
/// formula_* templates            area, price_length
/// input_fields, adj, discount    formula_width_calc / formula_length_calc
/// tax_id                           (text in, number or blank out)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct OrderLine {
    #[serde(deserialize_with = "lenient_number")]
    pub qty: f64,

    #[serde(deserialize_with = "lenient_string")]
    pub coating: String,

    #[serde(deserialize_with = "lenient_string")]
    pub color: String,

    pub calc_price: CalcPrice,

    /// Area formula in mm² (multiplied by the coating price).
    #[serde(deserialize_with = "lenient_string")]
    pub formula: String,

    /// Flat price formula added on top.
    #[serde(deserialize_with = "lenient_string")]
    pub formula_price: String,

    /// Width template (may reference input-field labels).
    #[serde(deserialize_with = "lenient_string")]
    pub formula_width: String,

    /// Length template (may reference input-field labels).
    #[serde(deserialize_with = "lenient_string")]
    pub formula_length: String,

    #[ts(type = "number | string")]
    pub formula_width_calc: CalcValue,

    #[ts(type = "number | string")]
    pub formula_length_calc: CalcValue,

    pub input_fields: Vec<InputFieldValue>,

    /// Coating+color table used in variable mode.
    pub var_price: Vec<PriceListEntry>,

    /// Flat adjustment added before the discount.
    #[serde(deserialize_with = "lenient_number")]
    pub adj: f64,

    #[ts(type = "number | string")]
    pub discount: Discount,

    /// Tax-category code.
    #[serde(deserialize_with = "lenient_string")]
    pub tax_id: String,

    #[ts(type = "number")]
    pub price: Money,

    #[ts(type = "number")]
    pub total: Money,

    /// Area in m², blank when width or length is unknown.
    #[ts(type = "number | string")]
    pub area: CalcValue,

    /// Price per running metre, blank when length is unknown.
    #[ts(type = "number | string")]
    pub price_length: CalcValue,
}

// =============================================================================
// Order
// =============================================================================

/// Order-level totals. Replaced wholesale on every aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct OrderTotals {
    /// Whether VAT was added on top of the total.
    #[serde(deserialize_with = "lenient_bool")]
    pub tax_calc: bool,

    #[serde(deserialize_with = "lenient_number")]
    pub tax_percent: f64,

    #[ts(type = "number")]
    pub tax_total: Money,

    #[ts(type = "number")]
    pub total: Money,

    #[ts(type = "number")]
    pub grand_total: Money,
}

/// A customer order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct Order {
    pub items: Vec<OrderLine>,

    pub vat_status: VatStatus,

    /// Derived from `items` and `vat_status`.
    pub price: OrderTotals,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(21.0).bps(), 2100);
        assert_eq!(TaxRate::from_percentage(12.5).bps(), 1250);
        assert!(TaxRate::from_percentage(-5.0).is_zero());
        assert!(TaxRate::from_percentage(f64::NAN).is_zero());
        assert!((TaxRate::from_percentage(21.0).percentage() - 21.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_float_prefixes() {
        assert_eq!(parse_float("42"), Some(42.0));
        assert_eq!(parse_float("-3.5kg"), Some(-3.5));
        assert_eq!(parse_float("7."), Some(7.0));
        assert_eq!(parse_float("2e"), Some(2.0));
        assert_eq!(parse_float("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("-"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(300.0), "300");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(8.83), "8.83");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-12.0), "-12");
    }

    #[test]
    fn test_number_from_value_is_lenient() {
        assert_eq!(number_from_value(&json!(3)), 3.0);
        assert_eq!(number_from_value(&json!("8.83")), 8.83);
        assert_eq!(number_from_value(&json!("n/a")), 0.0);
        assert_eq!(number_from_value(&json!(null)), 0.0);
        assert_eq!(number_from_value(&json!(true)), 0.0);
    }

    #[test]
    fn test_calc_value_serde() {
        let v: CalcValue = serde_json::from_value(json!(300)).unwrap();
        assert_eq!(v, CalcValue::Number(300.0));

        let v: CalcValue = serde_json::from_value(json!("")).unwrap();
        assert_eq!(v, CalcValue::Blank);

        let v: CalcValue = serde_json::from_value(json!("A+B")).unwrap();
        assert_eq!(v, CalcValue::Text("A+B".to_string()));

        assert_eq!(serde_json::to_value(CalcValue::Blank).unwrap(), json!(""));
        assert_eq!(serde_json::to_value(CalcValue::Number(1.5)).unwrap(), json!(1.5));
    }

    #[test]
    fn test_non_finite_calc_value_serializes_as_blank() {
        for n in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let text = serde_json::to_string(&CalcValue::Number(n)).unwrap();
            assert_eq!(text, "\"\"");

            let back: CalcValue = serde_json::from_str(&text).unwrap();
            assert_eq!(back, CalcValue::Blank);
        }
    }

    #[test]
    fn test_discount_serde() {
        let d: Discount = serde_json::from_value(json!("15%")).unwrap();
        assert_eq!(d.percent(), 15.0);

        let d: Discount = serde_json::from_value(json!(20)).unwrap();
        assert_eq!(d, Discount::Percent(20.0));

        let d: Discount = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(d.percent(), 0.0);
    }

    #[test]
    fn test_calc_price_defaults_to_formula() {
        let mode: CalcPrice = serde_json::from_value(json!("variable")).unwrap();
        assert_eq!(mode, CalcPrice::Variable);

        let mode: CalcPrice = serde_json::from_value(json!("formula")).unwrap();
        assert_eq!(mode, CalcPrice::Formula);

        let mode: CalcPrice = serde_json::from_value(json!("")).unwrap();
        assert_eq!(mode, CalcPrice::Formula);
    }

    #[test]
    fn test_vat_status_codes() {
        let status: VatStatus = serde_json::from_value(json!("1")).unwrap();
        assert!(status.is_payer());

        let status: VatStatus = serde_json::from_value(json!(0)).unwrap();
        assert_eq!(status, VatStatus::NonPayer);

        assert!(serde_json::from_value::<VatStatus>(json!("2")).is_err());
        assert_eq!(serde_json::to_value(VatStatus::Payer).unwrap(), json!("1"));
    }

    #[test]
    fn test_order_line_from_dashboard_json() {
        let line: OrderLine = serde_json::from_value(json!({
            "qty": "3",
            "coating": "Zinc",
            "color": "*",
            "calc_price": "variable",
            "var_price": [{ "parent": "Zinc", "title": "*", "price": "8.83" }],
            "discount": "10%",
            "formula": null,
            "tax_id": 21,
            "unknown_widget_field": "ignored"
        }))
        .unwrap();

        assert_eq!(line.qty, 3.0);
        assert_eq!(line.calc_price, CalcPrice::Variable);
        assert_eq!(line.var_price[0].price, 8.83);
        assert_eq!(line.discount.percent(), 10.0);
        assert_eq!(line.formula, "");
        assert_eq!(line.tax_id, "21");
        assert!(line.formula_width_calc.is_blank());
    }

    #[test]
    fn test_input_field_default_key() {
        let field: InputFieldValue =
            serde_json::from_value(json!({ "label": "A", "default": 120 })).unwrap();
        assert_eq!(field.default_value, CalcValue::Number(120.0));

        let back = serde_json::to_value(&field).unwrap();
        assert_eq!(back, json!({ "label": "A", "default": 120.0 }));
    }

    #[test]
    fn test_price_list_entry_public_flag() {
        let entry: PriceListEntry =
            serde_json::from_value(json!({ "id": "P1", "price": 2, "public": "1" })).unwrap();
        assert!(entry.public);
        assert!(!entry.matches("Zinc", "*"));
    }
}
