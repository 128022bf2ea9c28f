//! # Item Totals
//!
//! Per-line derived figures: area, price per running meter, line total.
//!
//! ## Line Total
//! ```text
//! base      = qty × price
//! adjusted  = base + adj
//! final     = adjusted − adjusted × discount% / 100
//! total     = max(0, final)               rounded to cents
//!
//!   qty=1, price=100, adj=0,   discount="15%"  →  85.00
//!   qty=1, price=10,  adj=-50, discount=0      →   0.00   (floor)
//! ```
//!
//! Dimensions are millimetres. Area is reported in m² with the historical
//! two-stage rounding, `round(w×l/1000)/1000`.

use crate::money::Money;
use crate::types::{CalcValue, Discount};

/// Returns `Some(v)` when `v` is finite and nonzero.
#[inline]
fn dimension(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Area in m² from width and length in mm.
///
/// ## Example
/// ```rust
/// use tinsmith_core::totals::area;
/// use tinsmith_core::types::CalcValue;
///
/// assert_eq!(area(Some(300.0), Some(500.0)), CalcValue::Number(0.15));
/// assert_eq!(area(Some(300.0), Some(0.0)), CalcValue::Blank);
/// assert_eq!(area(None, Some(500.0)), CalcValue::Blank);
/// ```
pub fn area(width_mm: Option<f64>, length_mm: Option<f64>) -> CalcValue {
    match (dimension(width_mm), dimension(length_mm)) {
        (Some(width), Some(length)) => {
            let value = (width * length / 1000.0).round() / 1000.0;
            if value.is_nan() {
                CalcValue::Blank
            } else {
                CalcValue::Number(value)
            }
        }
        _ => CalcValue::Blank,
    }
}

/// Unit price per running meter of length, rounded to cents.
///
/// ## Example
/// ```rust
/// use tinsmith_core::money::Money;
/// use tinsmith_core::totals::price_per_length_unit;
/// use tinsmith_core::types::CalcValue;
///
/// let price = Money::from_cents(1500);
/// assert_eq!(price_per_length_unit(price, Some(2000.0)), CalcValue::Number(7.5));
/// assert_eq!(price_per_length_unit(price, Some(0.0)), CalcValue::Blank);
/// ```
pub fn price_per_length_unit(price: Money, length_mm: Option<f64>) -> CalcValue {
    match dimension(length_mm) {
        Some(length) => {
            let per_meter = (price.to_amount() / (length / 1000.0) * 100.0).round() / 100.0;
            CalcValue::Number(per_meter)
        }
        None => CalcValue::Blank,
    }
}

/// Line total after adjustment and percentage discount, floored at zero.
///
/// ## Example
/// ```rust
/// use tinsmith_core::money::Money;
/// use tinsmith_core::totals::line_total;
/// use tinsmith_core::types::Discount;
///
/// let total = line_total(1.0, Money::from_cents(10000), 0.0, &Discount::Text("15%".into()));
/// assert_eq!(total.cents(), 8500);
/// ```
pub fn line_total(qty: f64, price: Money, adj: f64, discount: &Discount) -> Money {
    let base = qty * price.to_amount();
    let adjusted = base + adj;
    let final_amount = adjusted - adjusted * (discount.percent() / 100.0);

    // NaN fails the comparison and lands on zero too.
    if final_amount > 0.0 {
        Money::from_amount(final_amount)
    } else {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
