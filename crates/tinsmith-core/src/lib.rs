//! # tinsmith-core: Pricing & Tax Engine for Sheet-Metal Orders
//!
//! This crate prices order lines from catalog formulas and totals orders
//! with VAT and reverse charge. It is pure: no I/O, no global settings.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tinsmith Order Pricing                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard / recalc CLI (hosts)                  │   │
//! │  │    load Settings + Order JSON ──► call engine ──► show totals   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ tinsmith-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐  ┌──────────┐  ┌─────────┐  ┌──────────┐    │   │
//! │  │   │ substitution │─►│ formula  │─►│ pricing │─►│  totals  │    │   │
//! │  │   │ COATING, M2  │  │ evaluate │  │ resolve │  │ area,    │    │   │
//! │  │   │ ids, W, L    │  │ → Blank  │  │ price   │  │ line sum │    │   │
//! │  │   └──────────────┘  └──────────┘  └────┬────┘  └────┬─────┘    │   │
//! │  │                                        └──────┬─────┘          │   │
//! │  │                                          ┌────▼────┐            │   │
//! │  │                                          │   tax   │            │   │
//! │  │                                          │ buckets │            │   │
//! │  │                                          └─────────┘            │   │
//! │  │   types · money · error · validation                            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO GLOBAL STATE • DETERMINISTIC • IDEMPOTENT         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`formula`] - Sanitizing recursive-descent formula evaluator
//! - [`substitution`] - Token replacement (COATING, M2, price ids, labels, W/L)
//! - [`pricing`] - Variable and formula pricing, line recalculation
//! - [`totals`] - Area, price per length, line totals
//! - [`tax`] - Reverse-charge classification, live and document totals
//! - [`types`] - Settings, order lines, orders
//! - [`money`] - Money in integer cents, rounding rule
//! - [`error`] - Domain error types
//! - [`validation`] - Authoring-time checks
//!
//! ## Design Principles
//!
//! 1. **Never fail while pricing**: bad formulas are Blank, missing prices are 0
//! 2. **Settings are a parameter**: passed explicitly, never stored
//! 3. **Cents at the point of computation**: every monetary result is rounded
//!    half away from zero and kept as integer cents
//! 4. **Compatible substitution**: token order and textual replacement match
//!    the formulas already stored in the catalog
//!
//! ## Example Usage
//!
//! ```rust
//! use tinsmith_core::pricing::recalculate_order;
//! use tinsmith_core::types::{CalcValue, Order, OrderLine, PriceListEntry, Settings};
//!
//! let settings = Settings {
//!     price: vec![PriceListEntry {
//!         parent: "Polyester".into(),
//!         title: "RAL9005".into(),
//!         price: 10.0,
//!         ..PriceListEntry::default()
//!     }],
//!     tax_percent: 21.0,
//!     ..Settings::default()
//! };
//!
//! let mut order = Order {
//!     items: vec![OrderLine {
//!         qty: 2.0,
//!         coating: "Polyester".into(),
//!         color: "RAL9005".into(),
//!         formula: "W*L".into(),
//!         formula_width_calc: CalcValue::from("300"),
//!         formula_length_calc: CalcValue::from("500"),
//!         tax_id: "21".into(),
//!         ..OrderLine::default()
//!     }],
//!     ..Order::default()
//! };
//!
//! let totals = recalculate_order(&settings, &mut order);
//!
//! // 300 × 500 mm = 0.15 m² at 10.00 → 1.50 each, two pieces
//! assert_eq!(order.items[0].total.cents(), 300);
//! assert_eq!(totals.grand_total.cents(), 363);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod formula;
pub mod money;
pub mod pricing;
pub mod substitution;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tinsmith_core::Money` instead of
// `use tinsmith_core::money::Money`

pub use error::{CoreError, FormulaError, ValidationError};
pub use formula::{evaluate, Evaluated};
pub use money::Money;
pub use pricing::{recalculate_line, recalculate_order, resolve_price, PriceResult};
pub use tax::{aggregate_for_display, aggregate_order, DisplaySummary, SummaryLabels};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Formula token for the coating unit price.
pub const TOKEN_COATING: &str = "COATING";

/// Formula token for the area in m², built from the width text.
pub const TOKEN_M2: &str = "M2";

/// Formula token for the width in mm.
pub const TOKEN_WIDTH: &str = "W";

/// Formula token for the length in mm.
pub const TOKEN_LENGTH: &str = "L";

/// Coating name that the `"-"` placeholder stands for.
pub const PAINTED_COATING: &str = "Painted";

/// mm² per m². Area formulas are written in mm².
pub const AREA_FORMULA_DIVISOR: f64 = 1_000_000.0;

/// Tax codes of this length or shorter are never reverse-charged.
///
/// ## Business Reason
/// Short codes (`"21"`, `"12"`) are rate markers, not customs or goods codes.
pub const REVERSE_CHARGE_MIN_TAX_ID_LEN: usize = 2;

/// Deepest nesting of parentheses, chained ternaries, unary signs or
/// exponents a formula may use.
pub const MAX_FORMULA_NESTING: usize = 64;

/// Longest formula, in tokens, the parser accepts.
pub const MAX_FORMULA_TOKENS: usize = 1024;

/// Upper bound for a single line quantity in the editor.
///
/// ## Business Reason
/// Catches typos such as 10000 instead of 10 before an order is saved.
pub const MAX_LINE_QUANTITY: f64 = 100_000.0;
