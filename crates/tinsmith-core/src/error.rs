//! # Error Types
//!
//! Domain-specific error types for tinsmith-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tinsmith-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── FormulaError     - Formula text that does not parse               │
//! │  └── ValidationError  - Authoring-time checks on settings/formulas     │
//! │                                                                         │
//! │  recalc errors (separate crate)                                        │
//! │  └── RecalcError      - I/O, JSON, TOML, configuration                 │
//! │                                                                         │
//! │  Flow: FormulaError → ValidationError → CoreError → RecalcError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Note on the pricing path
//! Recomputing prices NEVER returns these errors. A formula that fails to
//! parse becomes a blank value, a missing price lookup becomes zero. The
//! error types exist for authoring-time validation and for hosts.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A formula failed to parse.
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// VAT status code other than "0" or "1".
    #[error("Unknown VAT status: '{0}'. Valid options: 0, 1")]
    UnknownVatStatus(String),
}

// =============================================================================
// Formula Error
// =============================================================================

/// Reasons a formula string cannot be evaluated.
///
/// Offsets are byte offsets into the text handed to the parser (after
/// sanitization when coming through [`crate::formula::evaluate`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Nothing left to evaluate.
    #[error("formula is empty")]
    Empty,

    /// A character outside the formula alphabet.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    /// A malformed numeric literal such as a lone `.`.
    #[error("invalid number '{literal}' at offset {offset}")]
    InvalidNumber { literal: String, offset: usize },

    /// A token that cannot appear here.
    #[error("unexpected '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    /// Input ended in the middle of an expression.
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// `-2 ** 2` style ambiguity, rejected like the dashboard's script host does.
    #[error("unary operator before '**' at offset {offset} needs parentheses")]
    UnaryBeforeExponent { offset: usize },

    /// Nesting beyond [`crate::MAX_FORMULA_NESTING`].
    #[error("formula nests deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },

    /// More tokens than [`crate::MAX_FORMULA_TOKENS`].
    #[error("formula has {count} tokens, at most {limit} are allowed")]
    TooLong { count: usize, limit: usize },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Authoring-time validation errors.
///
/// Used by the price-list and product editors before data is saved, so a
/// bad formula is reported to the admin instead of silently pricing at zero.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value is not a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Formula does not parse once all known tokens are substituted.
    #[error("{field} has invalid format: {source}")]
    InvalidFormula {
        field: String,
        #[source]
        source: FormulaError,
    },

    /// Formula still contains a name no binding resolves.
    #[error("{field} references unknown token '{token}'")]
    UnresolvedToken { field: String, token: String },

    /// Duplicate value (e.g., duplicate price-table id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_error_messages() {
        let err = FormulaError::UnexpectedToken {
            token: "*".to_string(),
            offset: 2,
        };
        assert_eq!(err.to_string(), "unexpected '*' at offset 2");
        assert_eq!(FormulaError::UnexpectedEnd.to_string(), "unexpected end of formula");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::UnresolvedToken {
            field: "formula".to_string(),
            token: "X".to_string(),
        };
        assert_eq!(err.to_string(), "formula references unknown token 'X'");

        let err = ValidationError::InvalidFormula {
            field: "formula_price".to_string(),
            source: FormulaError::UnexpectedEnd,
        };
        assert_eq!(
            err.to_string(),
            "formula_price has invalid format: unexpected end of formula"
        );
    }

    #[test]
    fn test_errors_convert_to_core_error() {
        let core_err: CoreError = FormulaError::Empty.into();
        assert!(matches!(core_err, CoreError::Formula(_)));

        let core_err: CoreError = ValidationError::Required {
            field: "id".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
