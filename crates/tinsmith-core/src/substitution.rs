//! # Token Substitution
//!
//! Turns catalog formulas into pure arithmetic by textual replacement.
//!
//! ## Order of Substitution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Applied to all four working strings of a line:                        │
//! │    formula · formula_price · width text · length text                   │
//! │                                                                         │
//! │  1. COATING     → coating unit price                 "10"              │
//! │  2. M2          → (<width text>/1000000)             "(300/1000000)"   │
//! │  3. price ids   → PriceListEntry.price, in order     "4.2"             │
//! │  4. labels      → InputFieldValue.default, in order  "120"             │
//! │  5. W, L        → width / length text                "300", "500"      │
//! │                   only when the line has no input fields               │
//! │                                                                         │
//! │  Each step replaces EVERY occurrence of its token. Later steps see the │
//! │  text produced by earlier ones, so the order is part of the contract   │
//! │  with the formulas already stored in the catalog.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The replacement is plain substring replacement. A price id `L1` and the
//! length token `L` are not distinguished; price ids run first, so `L1` is
//! consumed before `L` is looked at.

use tracing::trace;

use crate::types::{format_number, OrderLine, Settings};
use crate::{AREA_FORMULA_DIVISOR, TOKEN_COATING, TOKEN_LENGTH, TOKEN_M2, TOKEN_WIDTH};

// =============================================================================
// Bindings
// =============================================================================

/// A token and the literal text it is replaced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBinding {
    pub token: String,
    pub value: String,
}

impl TokenBinding {
    /// Creates a binding.
    pub fn new(token: impl Into<String>, value: impl Into<String>) -> Self {
        TokenBinding {
            token: token.into(),
            value: value.into(),
        }
    }

    /// Binds a token to a number, rendered in shortest round-trip form.
    pub fn number(token: impl Into<String>, value: f64) -> Self {
        TokenBinding::new(token, format_number(value))
    }
}

/// Applies bindings left to right, each replacing all occurrences of its
/// token. Empty tokens are ignored.
///
/// ## Example
/// ```rust
/// use tinsmith_core::substitution::{substitute, TokenBinding};
///
/// let bindings = [
///     TokenBinding::number("COATING", 10.0),
///     TokenBinding::new("W", "300"),
/// ];
/// assert_eq!(substitute("W*W*COATING", &bindings), "300*300*10");
/// ```
pub fn substitute(text: &str, bindings: &[TokenBinding]) -> String {
    bindings.iter().fold(text.to_string(), |acc, binding| {
        if binding.token.is_empty() {
            acc
        } else {
            acc.replace(&binding.token, &binding.value)
        }
    })
}

/// Formula-table bindings: every price entry with a non-empty id, in
/// settings order.
pub fn price_table_bindings(settings: &Settings) -> Vec<TokenBinding> {
    settings
        .price
        .iter()
        .filter(|entry| !entry.id.is_empty())
        .map(|entry| TokenBinding::number(entry.id.as_str(), entry.price))
        .collect()
}

/// Input-field bindings, in line order.
pub fn input_field_bindings(line: &OrderLine) -> Vec<TokenBinding> {
    line.input_fields
        .iter()
        .map(|field| TokenBinding::new(field.label.as_str(), field.default_value.to_formula_text()))
        .collect()
}

// =============================================================================
// Formula Set
// =============================================================================

/// The four working strings of a formula-priced line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaSet {
    pub formula: String,
    pub formula_price: String,
    pub width: String,
    pub length: String,
}

impl FormulaSet {
    fn fields_mut(&mut self) -> [&mut String; 4] {
        [
            &mut self.formula,
            &mut self.formula_price,
            &mut self.width,
            &mut self.length,
        ]
    }

    /// Replaces every occurrence of `token` in all four strings.
    pub fn replace_all(&mut self, token: &str, value: &str) {
        if token.is_empty() {
            return;
        }
        for field in self.fields_mut() {
            if field.contains(token) {
                *field = field.replace(token, value);
            }
        }
    }

    /// Applies a binding to all four strings.
    pub fn apply(&mut self, binding: &TokenBinding) {
        self.replace_all(&binding.token, &binding.value);
    }

    /// Runs the full substitution sequence for one line.
    ///
    /// `coating_price` is the resolved COATING value. The width and length
    /// strings must already hold the line's seeded dimension text.
    pub fn bind_line(&mut self, settings: &Settings, line: &OrderLine, coating_price: f64) {
        self.apply(&TokenBinding::number(TOKEN_COATING, coating_price));

        let area = format!("({}/{})", self.width, AREA_FORMULA_DIVISOR);
        self.replace_all(TOKEN_M2, &area);

        for binding in price_table_bindings(settings) {
            self.apply(&binding);
        }
        for binding in input_field_bindings(line) {
            self.apply(&binding);
        }

        if line.input_fields.is_empty() {
            let (width, length) = (self.width.clone(), self.length.clone());
            self.replace_all(TOKEN_WIDTH, &width);
            self.replace_all(TOKEN_LENGTH, &length);
        }

        trace!(
            formula = %self.formula,
            formula_price = %self.formula_price,
            width = %self.width,
            length = %self.length,
            "Tokens substituted"
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
