//! # Recalc Configuration
//!
//! Wording and output settings for the command-line host. The engine itself
//! takes everything it needs from the settings document; this file only
//! controls how the results are labelled and printed.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (--mode, --pretty)                                     │
//! │                                                                         │
//! │  2. Environment Variables                                               │
//! │     TINSMITH_MODE=document                                              │
//! │     TINSMITH_CURRENCY_SYMBOL=EUR                                        │
//! │                                                                         │
//! │  3. TOML Config File                                                    │
//! │     ~/.config/pricing/recalc.toml (Linux)                               │
//! │     ~/Library/Application Support/com.tinsmith.pricing/recalc.toml      │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # recalc.toml
//! [tax]
//! numeric_code = "§143.4"
//! zero_code = "§142"
//! metal = "§143"
//! data = "§143.1"
//!
//! [summary]
//! subtotal = "Summa"
//! reverse_charge = "Nodokļa apgrieztā maksāšana"
//! total = "Kopā"
//! currency_symbol = "€"
//!
//! [output]
//! mode = "both"  # live | document | both
//! pretty = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use tinsmith_core::tax::{ReverseChargeLabels, SummaryLabels};

use crate::error::{RecalcError, RecalcResult};
use crate::report::Mode;

// =============================================================================
// Summary Wording
// =============================================================================

/// Row labels of the printable summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub subtotal: String,
    pub reverse_charge: String,
    pub total: String,
    pub currency_symbol: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        let labels = SummaryLabels::default();
        SummaryConfig {
            subtotal: labels.subtotal,
            reverse_charge: labels.reverse_charge,
            total: labels.total,
            currency_symbol: labels.currency_symbol,
        }
    }
}

// =============================================================================
// Output Settings
// =============================================================================

/// How the report is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: Mode,

    /// Pretty-print the JSON report.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            mode: Mode::default(),
            pretty: default_true(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration for the recalc host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalcConfig {
    /// Reverse-charge basis labels.
    #[serde(default)]
    pub tax: ReverseChargeLabels,

    #[serde(default)]
    pub summary: SummaryConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl RecalcConfig {
    /// Loads configuration from file and environment.
    ///
    /// Without an explicit path the platform config directory is tried. A
    /// missing file is not an error.
    pub fn load(config_path: Option<PathBuf>) -> RecalcResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading recalc config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| RecalcError::Io {
                    path: path.clone(),
                    source,
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Rejects labels the summary cannot be printed without.
    pub fn validate(&self) -> RecalcResult<()> {
        let required = [
            ("summary.subtotal", &self.summary.subtotal),
            ("summary.reverse_charge", &self.summary.reverse_charge),
            ("summary.total", &self.summary.total),
            ("tax.numeric_code", &self.tax.numeric_code),
            ("tax.zero_code", &self.tax.zero_code),
            ("tax.metal", &self.tax.metal),
            ("tax.data", &self.tax.data),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(RecalcError::InvalidConfig(format!(
                    "{} must not be empty",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Labels handed to the document aggregation.
    pub fn summary_labels(&self) -> SummaryLabels {
        SummaryLabels {
            subtotal: self.summary.subtotal.clone(),
            reverse_charge: self.summary.reverse_charge.clone(),
            total: self.summary.total.clone(),
            currency_symbol: self.summary.currency_symbol.clone(),
            reverse_charge_basis: self.tax.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(mode) = var("TINSMITH_MODE") {
            match mode.parse::<Mode>() {
                Ok(parsed) => {
                    debug!(%parsed, "Overriding output mode from environment");
                    self.output.mode = parsed;
                }
                Err(e) => warn!(mode = %mode, "Ignoring TINSMITH_MODE: {}", e),
            }
        }

        if let Some(pretty) = var("TINSMITH_PRETTY") {
            match pretty.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.output.pretty = true,
                "0" | "false" | "no" => self.output.pretty = false,
                _ => warn!(pretty = %pretty, "Unknown TINSMITH_PRETTY value"),
            }
        }

        if let Some(symbol) = var("TINSMITH_CURRENCY_SYMBOL") {
            self.summary.currency_symbol = symbol;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tinsmith", "pricing")
            .map(|dirs| dirs.config_dir().join("recalc.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RecalcConfig::default();
        assert_eq!(config.output.mode, Mode::Both);
        assert!(config.output.pretty);
        assert_eq!(config.tax.metal, "§143");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[tax]
metal = "Art. 199a"

[summary]
total = "Kopā"
currency_symbol = "EUR"

[output]
mode = "document"
pretty = false
"#
        )
        .unwrap();

        let config = RecalcConfig::load(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.tax.metal, "Art. 199a");
        assert_eq!(config.tax.data, "§143.1");
        assert_eq!(config.summary.total, "Kopā");
        assert_eq!(config.summary.subtotal, "Subtotal");
        assert_eq!(config.output.mode, Mode::Document);
        assert!(!config.output.pretty);

        let labels = config.summary_labels();
        assert_eq!(labels.currency_symbol, "EUR");
        assert_eq!(labels.reverse_charge_basis.metal, "Art. 199a");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecalcConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.summary, SummaryConfig::default());
    }

    #[test]
    fn test_bad_toml_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nmode = 7").unwrap();

        let err = RecalcConfig::load(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, RecalcError::Toml(_)));
    }

    #[test]
    fn test_empty_label_fails_validation() {
        let mut config = RecalcConfig::default();
        config.summary.total = "  ".to_string();

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: summary.total must not be empty"
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TINSMITH_MODE", "live"),
            ("TINSMITH_PRETTY", "no"),
            ("TINSMITH_CURRENCY_SYMBOL", "EUR"),
        ]
        .into_iter()
        .collect();

        let mut config = RecalcConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.output.mode, Mode::Live);
        assert!(!config.output.pretty);
        assert_eq!(config.summary.currency_symbol, "EUR");
    }

    #[test]
    fn test_unknown_env_mode_is_ignored() {
        let mut config = RecalcConfig::default();
        config.apply_overrides(|key| (key == "TINSMITH_MODE").then(|| "sometimes".to_string()));
        assert_eq!(config.output.mode, Mode::Both);
    }
}
