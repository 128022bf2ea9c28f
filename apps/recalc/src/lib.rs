//! # tinsmith-recalc
//!
//! Command-line host for `tinsmith-core`. Reads a settings document and an
//! order in the dashboard's JSON shape, recalculates every derived field and
//! writes a JSON report to stdout.
//!
//! ## Run Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RecalcConfig::load ──► read settings ──► validate_settings             │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                         read order ──► lint formulas (warn / --strict)  │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                     report::recalculate ──► JSON on stdout              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```text
//! tinsmith-recalc --settings settings.json --order order.json --mode document
//! cat order.json | tinsmith-recalc --settings settings.json --order -
//! ```

pub mod config;
pub mod error;
pub mod report;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use tinsmith_core::validation::{
    validate_discount, validate_formula, validate_quantity, validate_settings,
};
use tinsmith_core::{CalcPrice, CoreError, Order, Settings, ValidationError};

pub use config::RecalcConfig;
pub use error::{RecalcError, RecalcResult};
pub use report::{recalculate, Mode, RecalcReport};

/// Path argument meaning "read from stdin".
pub const STDIN_PATH: &str = "-";

// =============================================================================
// Command Line
// =============================================================================

/// Recalculate prices, line totals and VAT for an order.
#[derive(Debug, Clone, Parser)]
#[command(name = "tinsmith-recalc", version, about)]
pub struct Cli {
    /// Settings document (price table, VAT percent).
    #[arg(long, env = "TINSMITH_SETTINGS")]
    pub settings: PathBuf,

    /// Order document, or `-` for stdin.
    #[arg(long, default_value = STDIN_PATH)]
    pub order: PathBuf,

    /// Which totals to produce. Overrides the config file.
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Config file. Defaults to recalc.toml in the platform config directory.
    #[arg(long, env = "TINSMITH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Single-line JSON output.
    #[arg(long)]
    pub compact: bool,

    /// Fail when a line has a formula, quantity or discount problem.
    #[arg(long)]
    pub strict: bool,
}

// =============================================================================
// Run
// =============================================================================

/// Runs one recalculation and writes the report to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> RecalcResult<()> {
    let config = RecalcConfig::load(cli.config.clone())?;
    let mode = cli.mode.unwrap_or(config.output.mode);
    let pretty = config.output.pretty && !cli.compact;

    let settings: Settings = read_json(&cli.settings)?;
    validate_settings(&settings).map_err(CoreError::from)?;
    debug!(
        prices = settings.price.len(),
        tax_percent = settings.tax_percent,
        "Settings loaded"
    );

    let order: Order = read_json(&cli.order)?;

    let problems = lint_order(&settings, &order);
    for (index, problem) in &problems {
        warn!(line = index, "{}", problem);
    }
    if cli.strict {
        if let Some((_, problem)) = problems.into_iter().next() {
            return Err(CoreError::from(problem).into());
        }
    }

    let report = recalculate(&settings, order, mode, &config.summary_labels());

    if pretty {
        serde_json::to_writer_pretty(&mut *out, &report)?;
    } else {
        serde_json::to_writer(&mut *out, &report)?;
    }
    writeln!(out)?;

    Ok(())
}

/// Authoring problems per line index.
///
/// Formula fields are only checked on formula-priced lines; variable lines
/// never evaluate them.
pub fn lint_order(settings: &Settings, order: &Order) -> Vec<(usize, ValidationError)> {
    let mut problems = Vec::new();

    for (index, line) in order.items.iter().enumerate() {
        if let Err(e) = validate_quantity(line.qty) {
            problems.push((index, e));
        }
        if let Err(e) = validate_discount(&line.discount) {
            problems.push((index, e));
        }

        if line.calc_price == CalcPrice::Formula {
            let fields = [
                ("formula", &line.formula),
                ("formula_price", &line.formula_price),
                ("formula_width", &line.formula_width),
                ("formula_length", &line.formula_length),
            ];
            for (field, text) in fields {
                if let Err(e) = validate_formula(field, text, settings, &line.input_fields) {
                    problems.push((index, e));
                }
            }
        }
    }

    problems
}

fn read_json<T: DeserializeOwned>(path: &Path) -> RecalcResult<T> {
    let io_err = |source| RecalcError::Io {
        path: path.to_path_buf(),
        source,
    };

    let contents = if path == Path::new(STDIN_PATH) {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(io_err)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(io_err)?
    };

    serde_json::from_str(&contents).map_err(|source| RecalcError::Json {
        path: path.to_path_buf(),
        source,
    })
}
