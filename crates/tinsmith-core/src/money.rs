//! # Money Module
//!
//! Provides the `Money` type and the engine-wide rounding rule.
//!
//! ## Rounding Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  round2(x) = round(x × 100) / 100        (half away from zero)          │
//! │                                                                         │
//! │  Formulas and discounts are evaluated in floating point, then every    │
//! │  monetary result is rounded to whole cents AT THE POINT OF             │
//! │  COMPUTATION and stored as integer cents:                              │
//! │                                                                         │
//! │    evaluate("300*500") / 1e6 × 10 = 1.5   ──► Money(150)               │
//! │    8.83 × 3 = 26.490000000000002          ──► Money(2649)              │
//! │                                                                         │
//! │  Sums of Money are exact: no drift across order lines.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! The dashboard exchanges amounts as decimal numbers (`26.49`), so `Money`
//! serializes as a decimal amount and accepts numbers or numeric strings.
//!
//! ## Usage
//! ```rust
//! use tinsmith_core::money::Money;
//!
//! let price = Money::from_amount(8.83);
//! assert_eq!(price.cents(), 883);
//! assert_eq!(price.times(3.0).to_string(), "26.49");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::types::{lenient_number, TaxRate};

/// Rounds to two decimal places, half away from zero.
///
/// ## Example
/// ```rust
/// use tinsmith_core::money::round2;
///
/// assert_eq!(round2(1.234), 1.23);
/// assert_eq!(round2(-0.125), -0.13);
/// ```
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// PriceListEntry.price ──► coating price ──► OrderLine.price ──► OrderLine.total
///                                                                    │
///               OrderTotals.total ◄── bucket sums ◄──────────────────┘
///                       │
///                       └──► tax_total ──► grand_total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a floating amount, rounding to cents.
    ///
    /// Non-finite input (NaN, ±∞ from a division by zero) becomes zero.
    /// Finite amounts beyond the `i64` range saturate.
    ///
    /// ## Example
    /// ```rust
    /// use tinsmith_core::money::Money;
    ///
    /// assert_eq!(Money::from_amount(1.005).cents(), 100); // 100.49999… cents
    /// assert_eq!(Money::from_amount(0.125).cents(), 13);
    /// assert_eq!(Money::from_amount(f64::NAN).cents(), 0);
    /// assert_eq!(Money::from_amount(f64::INFINITY).cents(), 0);
    /// ```
    #[inline]
    pub fn from_amount(amount: f64) -> Self {
        let cents = (amount * 100.0).round();
        if !cents.is_finite() {
            return Money::zero();
        }
        Money(cents as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal amount (`150` cents → `1.5`).
    #[inline]
    pub fn to_amount(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the whole-units portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a (possibly fractional) quantity, rounding to cents.
    ///
    /// ## Example
    /// ```rust
    /// use tinsmith_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(150);
    /// assert_eq!(unit_price.times(2.0).cents(), 300);
    /// assert_eq!(unit_price.times(0.5).cents(), 75);
    /// ```
    #[inline]
    pub fn times(&self, qty: f64) -> Money {
        Money::from_amount(self.to_amount() * qty)
    }

    /// Calculates tax on this amount.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, the +5000 rounds the
    /// half cent up. Used for order-level VAT where the amount is never
    /// negative (line totals are floored at zero).
    ///
    /// ## Example
    /// ```rust
    /// use tinsmith_core::money::Money;
    /// use tinsmith_core::types::TaxRate;
    ///
    /// let total = Money::from_cents(10000);       // 100.00
    /// let vat = TaxRate::from_percentage(21.0);   // 21%
    /// assert_eq!(total.calculate_tax(vat).cents(), 2100);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal display (`26.49`, `-5.50`). Currency symbols are added by
/// whoever renders the amount.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_amount())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_number(deserializer).map(Money::from_amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.5), 1.5);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(8.83 * 3.0), 26.49);
        assert_eq!(round2(-1.005), -1.0); // -100.49999… cents
    }

    #[test]
    fn test_from_amount_rounds_to_cents() {
        assert_eq!(Money::from_amount(1.5).cents(), 150);
        assert_eq!(Money::from_amount(26.490000000000002).cents(), 2649);
        assert_eq!(Money::from_amount(0.005).cents(), 1);
        assert_eq!(Money::from_amount(-0.005).cents(), -1);
    }

    #[test]
    fn test_non_finite_amounts() {
        assert_eq!(Money::from_amount(f64::NAN), Money::zero());
        assert_eq!(Money::from_amount(f64::INFINITY), Money::zero());
        assert_eq!(Money::from_amount(f64::NEG_INFINITY), Money::zero());
        assert_eq!(Money::from_amount(1e300).cents(), i64::MAX);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_amount(1e300);
        assert_eq!((huge + Money::from_cents(1)).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - Money::from_cents(1)).cents(), i64::MIN);

        let mut total = huge;
        total += huge;
        assert_eq!(total, huge);

        let total: Money = [huge, huge, huge].iter().sum();
        assert_eq!(total, huge);

        let tax = huge.calculate_tax(TaxRate::from_percentage(21.0));
        assert!(tax.is_positive());
        assert_eq!((huge + tax).cents(), i64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2649).to_string(), "26.49");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 1500);
    }

    #[test]
    fn test_times() {
        assert_eq!(Money::from_cents(883).times(3.0).cents(), 2649);
        assert_eq!(Money::from_cents(100).times(0.0), Money::zero());
    }

    #[test]
    fn test_tax_calculation() {
        let rate = TaxRate::from_percentage(21.0);
        assert_eq!(Money::from_cents(10000).calculate_tax(rate).cents(), 2100);
        // 0.50 × 21% = 0.105 → 0.11
        assert_eq!(Money::from_cents(50).calculate_tax(rate).cents(), 11);
        assert_eq!(Money::zero().calculate_tax(rate), Money::zero());
    }

    #[test]
    fn test_serde_as_decimal_amount() {
        let json = serde_json::to_string(&Money::from_cents(150)).unwrap();
        assert_eq!(json, "1.5");

        let parsed: Money = serde_json::from_str("\"8.83\"").unwrap();
        assert_eq!(parsed.cents(), 883);

        let parsed: Money = serde_json::from_str("null").unwrap();
        assert!(parsed.is_zero());
    }
}
