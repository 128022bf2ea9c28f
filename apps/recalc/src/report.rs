//! # Recalculation Report
//!
//! Runs the engine over one order and collects what the caller asked for.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  live      recalculate_order      → order + OrderTotals                 │
//! │  document  recalculate lines,     → order + DisplaySummary (buckets,    │
//! │            aggregate_for_display     scenario, html_summary)            │
//! │  both      all of the above (default)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Lines are always recalculated first, so the document totals never use
//! stale line totals.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use tinsmith_core::pricing::{recalculate_line, recalculate_order};
use tinsmith_core::tax::{aggregate_for_display, DisplaySummary, SummaryLabels};
use tinsmith_core::{Order, OrderTotals, Settings};

use crate::error::RecalcError;

// =============================================================================
// Mode
// =============================================================================

/// Which totals to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// On-screen running summary.
    Live,
    /// Printable document summary.
    Document,
    /// Both summaries.
    #[default]
    Both,
}

impl Mode {
    pub fn wants_live(&self) -> bool {
        matches!(self, Mode::Live | Mode::Both)
    }

    pub fn wants_document(&self) -> bool {
        matches!(self, Mode::Document | Mode::Both)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::Document => write!(f, "document"),
            Mode::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = RecalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" | "screen" => Ok(Mode::Live),
            "document" | "print" => Ok(Mode::Document),
            "both" | "all" => Ok(Mode::Both),
            other => Err(RecalcError::InvalidConfig(format!(
                "Unknown mode: '{}'. Valid options: live, document, both",
                other
            ))),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RecalcReport {
    /// The order with every derived field filled in.
    pub order: Order,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<OrderTotals>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DisplaySummary>,
}

/// Recalculates an order.
pub fn recalculate(
    settings: &Settings,
    mut order: Order,
    mode: Mode,
    labels: &SummaryLabels,
) -> RecalcReport {
    let live = if mode.wants_live() {
        Some(recalculate_order(settings, &mut order))
    } else {
        for line in &mut order.items {
            recalculate_line(settings, line);
        }
        None
    };

    let document = mode
        .wants_document()
        .then(|| aggregate_for_display(settings, &order, labels));

    info!(
        %mode,
        lines = order.items.len(),
        scenario = ?document.as_ref().map(|d| d.price.scenario),
        "Order recalculated"
    );

    RecalcReport {
        order,
        live,
        document,
    }
}
