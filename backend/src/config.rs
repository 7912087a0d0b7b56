//! Runtime configuration and logging setup.
//!
//! Settings come from `PLANPIVOT_*` environment variables (a `.env` file is
//! honored by the binary through `dotenvy`). CLI flags override them.
//!
//! | Variable                    | Field           | Default     |
//! |-----------------------------|-----------------|-------------|
//! | `PLANPIVOT_STRICT_STATUS`   | `strict_status` | `false`     |
//! | `PLANPIVOT_STRICT_DATES`    | `strict_dates`  | `false`     |
//! | `PLANPIVOT_DATE_FORMAT`     | `date_format`   | `%Y-%m-%d`  |
//! | `PLANPIVOT_LABELS`          | `labels_path`   | built-in    |
//! | `PLANPIVOT_LOG`             | log filter      | `info`      |

use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Once;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, ConfigResult};
use crate::labels::LabelRegistry;
use crate::parser::ExtractOptions;

pub const ENV_PREFIX: &str = "PLANPIVOT_";
pub const LOG_ENV: &str = "PLANPIVOT_LOG";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

static LOGGING: Once = Once::new();

/// Report settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Fail on statuses other than 0/1 instead of excluding those rows.
    pub strict_status: bool,
    /// Fail when rows carry different `ValueDate`s.
    pub strict_dates: bool,
    /// chrono format used to render the report date in headers.
    pub date_format: String,
    /// JSON file with `[{"id": ..., "label": ...}]` replacing the built-in labels.
    pub labels_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            strict_status: false,
            strict_dates: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            labels_path: None,
        }
    }
}

impl ReportConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(value) = var("STRICT_STATUS") {
            config.strict_status = parse_flag("PLANPIVOT_STRICT_STATUS", &value)?;
        }
        if let Some(value) = var("STRICT_DATES") {
            config.strict_dates = parse_flag("PLANPIVOT_STRICT_DATES", &value)?;
        }
        if let Some(value) = var("DATE_FORMAT") {
            if check_date_format(&value).is_err() {
                return Err(ConfigError::InvalidEnv {
                    key: "PLANPIVOT_DATE_FORMAT".into(),
                    value,
                });
            }
            config.date_format = value;
        }
        if let Some(value) = var("LABELS") {
            if !value.trim().is_empty() {
                config.labels_path = Some(PathBuf::from(value));
            }
        }

        Ok(config)
    }

    /// Reject settings that cannot be applied, such as a bad date format.
    pub fn validate(&self) -> ConfigResult<()> {
        check_date_format(&self.date_format)
    }

    /// Label registry to use: the configured file, or the built-in one.
    pub fn load_labels(&self) -> ConfigResult<LabelRegistry> {
        match &self.labels_path {
            Some(path) => LabelRegistry::from_path(path),
            None => Ok(LabelRegistry::standard().clone()),
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            strict_status: self.strict_status,
            strict_dates: self.strict_dates,
        }
    }
}

/// Accept only chrono formats that render a plain date.
pub fn check_date_format(format: &str) -> ConfigResult<()> {
    let invalid = || ConfigError::InvalidDateFormat(format.to_string());

    if format.trim().is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    // Time and zone fields parse fine but fail on a NaiveDate.
    let sample = NaiveDate::from_ymd_opt(2000, 1, 1).ok_or_else(invalid)?;
    let mut text = String::new();
    write!(text, "{}", sample.format(format)).map_err(|_| invalid())?;
    Ok(())
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Install the global `tracing` subscriber. Safe to call more than once.
///
/// Logs go to stderr so stdout can carry the report.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
