//! # Recalc Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Recalc Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Input          │  │  Configuration  │  │  Engine                 │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Io             │  │  Toml           │  │  Core (settings that    │ │
//! │  │  Json           │  │  InvalidConfig  │  │  fail validation)       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use thiserror::Error;
use tinsmith_core::CoreError;

/// Result type alias for recalc operations.
pub type RecalcResult<T> = Result<T, RecalcError>;

/// Everything that can stop a recalculation run.
#[derive(Debug, Error)]
pub enum RecalcError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Reading an input or config file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the report failed.
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),

    /// Input JSON does not match the expected shape.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Report serialization failed.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Config file is not valid TOML for [`crate::config::RecalcConfig`].
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config parsed but holds unusable values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// Settings rejected by the engine's validation.
    #[error(transparent)]
    Core(#[from] CoreError),
}
