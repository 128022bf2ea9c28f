//! # Order Tax Aggregation
//!
//! Reverse-charge classification and order-level VAT totals.
//!
//! ## Two Aggregation Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  aggregate_order (live summary while editing)                          │
//! │  ─────────────────────────────────────────────                          │
//! │  total = Σ line_total(line)                                             │
//! │  vat_status "1" → no VAT at all          (order-level toggle)           │
//! │  vat_status "0" → total + total × VAT%                                  │
//! │                                                                         │
//! │  aggregate_for_display (printable document)                            │
//! │  ─────────────────────────────────────────────                          │
//! │  per line: classify ──► ReverseCharge ──► item_total_0                  │
//! │                    └──► Standard      ──► item_total_21                 │
//! │  (lines without tax_id are skipped)                                     │
//! │                                                                         │
//! │  item_total_0 │ item_total_21 │ scenario          │ grand total         │
//! │  ─────────────┼───────────────┼───────────────────┼──────────────────── │
//! │       0       │       0       │ Empty             │ 0                   │
//! │       0       │      > 0      │ StandardOnly      │ t21 × (1 + p/100)   │
//! │      > 0      │       0       │ ReverseChargeOnly │ t0                  │
//! │      > 0      │      > 0      │ Mixed             │ t0 + t21 × (1+p/100)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two paths disagree for a VAT payer ordering goods with short tax
//! codes: the live summary shows no VAT, the document charges it. Both are
//! kept as they are until that is settled.

use askama::Template;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::money::{round2, Money};
use crate::totals::line_total;
use crate::types::{format_number, Order, OrderLine, OrderTotals, Settings, VatStatus};
use crate::REVERSE_CHARGE_MIN_TAX_ID_LEN;

// =============================================================================
// Classification
// =============================================================================

/// VAT treatment of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TaxTreatment {
    /// Buyer accounts for the VAT.
    ReverseCharge,
    /// VAT at the standard rate.
    Standard,
}

/// Classifies a line.
///
/// Reverse charge applies only when the client is a VAT payer AND the line
/// carries a tax code longer than two characters.
///
/// ## Example
/// ```rust
/// use tinsmith_core::tax::{classify, TaxTreatment};
/// use tinsmith_core::types::{OrderLine, VatStatus};
///
/// let line = OrderLine { tax_id: "MET1".into(), ..OrderLine::default() };
/// assert_eq!(classify(&line, VatStatus::Payer), TaxTreatment::ReverseCharge);
/// assert_eq!(classify(&line, VatStatus::NonPayer), TaxTreatment::Standard);
///
/// let short = OrderLine { tax_id: "21".into(), ..OrderLine::default() };
/// assert_eq!(classify(&short, VatStatus::Payer), TaxTreatment::Standard);
/// ```
pub fn classify(line: &OrderLine, vat_status: VatStatus) -> TaxTreatment {
    if vat_status.is_payer() && line.tax_id.chars().count() > REVERSE_CHARGE_MIN_TAX_ID_LEN {
        TaxTreatment::ReverseCharge
    } else {
        TaxTreatment::Standard
    }
}

/// Legal basis printed next to a reverse-charge amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ReverseChargeBasis {
    /// All-digit customs code other than `0000`.
    NumericCode,
    /// The `0000` code.
    ZeroCode,
    /// Code containing `MET` (metal goods).
    Metal,
    /// Code containing `DAT` (electronics).
    Data,
}

/// Picks the reverse-charge basis for a tax code. Display only.
///
/// ## Example
/// ```rust
/// use tinsmith_core::tax::{reverse_charge_basis, ReverseChargeBasis};
///
/// assert_eq!(reverse_charge_basis("72104900"), Some(ReverseChargeBasis::NumericCode));
/// assert_eq!(reverse_charge_basis("0000"), Some(ReverseChargeBasis::ZeroCode));
/// assert_eq!(reverse_charge_basis("MET1"), Some(ReverseChargeBasis::Metal));
/// assert_eq!(reverse_charge_basis("XYZ"), None);
/// ```
pub fn reverse_charge_basis(tax_id: &str) -> Option<ReverseChargeBasis> {
    if tax_id == "0000" {
        Some(ReverseChargeBasis::ZeroCode)
    } else if !tax_id.is_empty() && tax_id.chars().all(|c| c.is_ascii_digit()) {
        Some(ReverseChargeBasis::NumericCode)
    } else if tax_id.contains("MET") {
        Some(ReverseChargeBasis::Metal)
    } else if tax_id.contains("DAT") {
        Some(ReverseChargeBasis::Data)
    } else {
        None
    }
}

/// Labels for each reverse-charge basis.
///
/// Defaults are the Latvian VAT law article references the documents have
/// always printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct ReverseChargeLabels {
    pub numeric_code: String,
    pub zero_code: String,
    pub metal: String,
    pub data: String,
}

impl Default for ReverseChargeLabels {
    fn default() -> Self {
        ReverseChargeLabels {
            numeric_code: "§143.4".to_string(),
            zero_code: "§142".to_string(),
            metal: "§143".to_string(),
            data: "§143.1".to_string(),
        }
    }
}

impl ReverseChargeLabels {
    /// Returns the label for a basis.
    pub fn label(&self, basis: ReverseChargeBasis) -> &str {
        match basis {
            ReverseChargeBasis::NumericCode => &self.numeric_code,
            ReverseChargeBasis::ZeroCode => &self.zero_code,
            ReverseChargeBasis::Metal => &self.metal,
            ReverseChargeBasis::Data => &self.data,
        }
    }
}

// =============================================================================
// Live Aggregate
// =============================================================================

/// Recomputes line totals and the order-level VAT summary.
///
/// A VAT payer (`vat_status == "1"`) gets no VAT on the whole order; this
/// path does not look at per-line tax codes. The result is also stored in
/// `order.price`.
///
/// ## Example
/// ```rust
/// use tinsmith_core::money::Money;
/// use tinsmith_core::tax::aggregate_order;
/// use tinsmith_core::types::{Order, OrderLine, Settings};
///
/// let settings = Settings { tax_percent: 21.0, ..Settings::default() };
/// let mut order = Order {
///     items: vec![OrderLine { qty: 2.0, price: Money::from_cents(5000), ..OrderLine::default() }],
///     ..Order::default()
/// };
///
/// let totals = aggregate_order(&settings, &mut order);
/// assert_eq!(totals.total.cents(), 10000);
/// assert_eq!(totals.tax_total.cents(), 2100);
/// assert_eq!(totals.grand_total.cents(), 12100);
/// ```
pub fn aggregate_order(settings: &Settings, order: &mut Order) -> OrderTotals {
    let mut total = Money::zero();
    for line in &mut order.items {
        line.total = line_total(line.qty, line.price, line.adj, &line.discount);
        total += line.total;
    }

    let totals = if order.vat_status.is_payer() {
        OrderTotals {
            tax_calc: false,
            tax_percent: 0.0,
            tax_total: Money::zero(),
            total,
            grand_total: total,
        }
    } else {
        let rate = settings.tax_rate();
        let tax_total = total.calculate_tax(rate);
        OrderTotals {
            tax_calc: true,
            tax_percent: rate.percentage(),
            tax_total,
            total,
            grand_total: total + tax_total,
        }
    };

    debug!(
        lines = order.items.len(),
        total = %totals.total,
        grand_total = %totals.grand_total,
        "Order totals aggregated"
    );
    order.price = totals.clone();
    totals
}

// =============================================================================
// Document Summary
// =============================================================================

/// Which buckets of the document summary hold money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VatScenario {
    Empty,
    StandardOnly,
    ReverseChargeOnly,
    Mixed,
}

impl VatScenario {
    /// Picks the scenario from bucket occupancy.
    pub fn from_buckets(reverse_charge: Money, standard: Money) -> Self {
        match (reverse_charge.is_positive(), standard.is_positive()) {
            (false, false) => VatScenario::Empty,
            (false, true) => VatScenario::StandardOnly,
            (true, false) => VatScenario::ReverseChargeOnly,
            (true, true) => VatScenario::Mixed,
        }
    }
}

/// Texts used in the printable summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct SummaryLabels {
    /// Row label for the standard-rate subtotal.
    pub subtotal: String,
    /// Row label for the reverse-charge subtotal and its VAT line.
    pub reverse_charge: String,
    /// Row label for the grand total.
    pub total: String,
    /// Appended to every amount.
    pub currency_symbol: String,
    pub reverse_charge_basis: ReverseChargeLabels,
}

impl Default for SummaryLabels {
    fn default() -> Self {
        SummaryLabels {
            subtotal: "Subtotal".to_string(),
            reverse_charge: "Reverse charge".to_string(),
            total: "Total".to_string(),
            currency_symbol: "€".to_string(),
            reverse_charge_basis: ReverseChargeLabels::default(),
        }
    }
}

/// One VAT row of the document.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct TaxLine {
    pub treatment: TaxTreatment,
    pub label: String,
    #[ts(type = "number")]
    pub amount: Money,
}

/// Bucketed totals of the printable document.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct DisplayTotals {
    /// Sum of reverse-charge line totals.
    #[ts(type = "number")]
    pub item_total_0: Money,
    /// Sum of standard line totals.
    #[ts(type = "number")]
    pub item_total_21: Money,
    pub scenario: VatScenario,
    pub tax_lines: Vec<TaxLine>,
    #[ts(type = "number")]
    pub tax_total: Money,
    #[ts(type = "number")]
    pub grand_total: Money,
    /// Distinct reverse-charge basis labels, in line order.
    pub reverse_charge_labels: Vec<String>,
}

/// Printable summary: totals plus an HTML table fragment.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct DisplaySummary {
    pub html_summary: String,
    pub price: DisplayTotals,
}

/// Builds the bucketed VAT summary for the printable document.
///
/// Uses each line's stored `total`; run [`crate::pricing::recalculate_order`]
/// first if lines may be stale.
///
/// ## Example
/// ```rust
/// use tinsmith_core::money::Money;
/// use tinsmith_core::tax::{aggregate_for_display, SummaryLabels, VatScenario};
/// use tinsmith_core::types::{Order, OrderLine, Settings, VatStatus};
///
/// let settings = Settings { tax_percent: 21.0, ..Settings::default() };
/// let order = Order {
///     items: vec![
///         OrderLine { tax_id: "MET1".into(), total: Money::from_cents(10000), ..OrderLine::default() },
///         OrderLine { tax_id: "21".into(), total: Money::from_cents(10000), ..OrderLine::default() },
///     ],
///     vat_status: VatStatus::Payer,
///     ..Order::default()
/// };
///
/// let summary = aggregate_for_display(&settings, &order, &SummaryLabels::default());
/// assert_eq!(summary.price.scenario, VatScenario::Mixed);
/// assert_eq!(summary.price.grand_total.cents(), 22100);
/// ```
pub fn aggregate_for_display(
    settings: &Settings,
    order: &Order,
    labels: &SummaryLabels,
) -> DisplaySummary {
    let mut item_total_0 = Money::zero();
    let mut item_total_21 = Money::zero();
    let mut reverse_charge_labels: Vec<String> = Vec::new();

    for line in order.items.iter().filter(|line| !line.tax_id.is_empty()) {
        match classify(line, order.vat_status) {
            TaxTreatment::ReverseCharge => {
                item_total_0 += line.total;
                if let Some(basis) = reverse_charge_basis(&line.tax_id) {
                    let label = labels.reverse_charge_basis.label(basis);
                    if !reverse_charge_labels.iter().any(|l| l == label) {
                        reverse_charge_labels.push(label.to_string());
                    }
                }
            }
            TaxTreatment::Standard => item_total_21 += line.total,
        }
    }

    let percent = settings.tax_percent;
    let t0 = item_total_0.to_amount();
    let t21 = item_total_21.to_amount();
    let scenario = VatScenario::from_buckets(item_total_0, item_total_21);

    let standard_tax = Money::from_amount(round2(t21 * percent) / 100.0);
    let standard_line = TaxLine {
        treatment: TaxTreatment::Standard,
        label: tax_display_label(settings),
        amount: standard_tax,
    };
    let reverse_charge_line = TaxLine {
        treatment: TaxTreatment::ReverseCharge,
        label: reverse_charge_label(labels, &reverse_charge_labels),
        amount: Money::zero(),
    };

    let (tax_lines, grand_total) = match scenario {
        VatScenario::Empty => (Vec::new(), Money::zero()),
        VatScenario::StandardOnly => (
            vec![standard_line],
            Money::from_amount(t21 * (1.0 + percent / 100.0)),
        ),
        VatScenario::ReverseChargeOnly => (vec![reverse_charge_line], item_total_0),
        VatScenario::Mixed => (
            vec![reverse_charge_line, standard_line],
            Money::from_amount(t0 + t21 * (1.0 + percent / 100.0)),
        ),
    };
    let tax_total: Money = tax_lines.iter().map(|line| line.amount).sum();

    debug!(?scenario, %item_total_0, %item_total_21, %grand_total, "Document totals aggregated");

    let price = DisplayTotals {
        item_total_0,
        item_total_21,
        scenario,
        tax_lines,
        tax_total,
        grand_total,
        reverse_charge_labels,
    };

    DisplaySummary {
        html_summary: render_html(&price, labels),
        price,
    }
}

/// VAT row label: the configured display text, else `VAT {p}%`.
fn tax_display_label(settings: &Settings) -> String {
    if settings.tax_display.trim().is_empty() {
        format!("VAT {}%", format_number(settings.tax_percent))
    } else {
        settings.tax_display.clone()
    }
}

fn reverse_charge_label(labels: &SummaryLabels, bases: &[String]) -> String {
    if bases.is_empty() {
        labels.reverse_charge.clone()
    } else {
        format!("{} ({})", labels.reverse_charge, bases.join(", "))
    }
}

// =============================================================================
// HTML Rendering
// =============================================================================

struct SummaryRow {
    label: String,
    amount: String,
}

/// `templates/order_summary.html`, escaped as HTML.
#[derive(Template)]
#[template(path = "order_summary.html")]
struct SummaryTemplate {
    rows: Vec<SummaryRow>,
}

fn format_amount(amount: Money, currency_symbol: &str) -> String {
    if currency_symbol.is_empty() {
        amount.to_string()
    } else {
        format!("{} {}", amount, currency_symbol)
    }
}

/// Renders the summary rows as an HTML table fragment.
///
/// ```text
/// ┌──────────────────────────────────┬────────────┐
/// │ Subtotal (Reverse charge)        │   100.00 € │  if item_total_0 > 0
/// │ Subtotal                         │   100.00 € │  if item_total_21 > 0
/// │ Reverse charge (§143)            │     0.00 € │  tax lines
/// │ PVN 21%                          │    21.00 € │
/// │ Total                            │   221.00 € │
/// └──────────────────────────────────┴────────────┘
/// ```
fn render_html(totals: &DisplayTotals, labels: &SummaryLabels) -> String {
    let mut rows = Vec::new();
    let mut row = |label: String, amount: Money| {
        rows.push(SummaryRow {
            label,
            amount: format_amount(amount, &labels.currency_symbol),
        });
    };

    if totals.item_total_0.is_positive() {
        row(
            format!("{} ({})", labels.subtotal, labels.reverse_charge),
            totals.item_total_0,
        );
    }
    if totals.item_total_21.is_positive() {
        row(labels.subtotal.clone(), totals.item_total_21);
    }
    for line in &totals.tax_lines {
        row(line.label.clone(), line.amount);
    }
    row(labels.total.clone(), totals.grand_total);

    SummaryTemplate { rows }.render().unwrap_or_else(|err| {
        warn!(error = %err, "Order summary did not render");
        String::new()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
