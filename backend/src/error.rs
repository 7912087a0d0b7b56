//! Error types for the Planpivot report pipeline.
//!
//! One error enum per layer:
//!
//! - [`LoadError`] - reading CSV / XLSX input
//! - [`ConfigError`] - configuration and label registry problems
//! - [`ReportError`] - input contract violations found while building the report
//! - [`ExportError`] - JSON / XLSX serialization failures
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while reading the source table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content as {encoding}")]
    Encoding { encoding: String },

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid or unreadable workbook.
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// Workbook has no worksheet to read.
    #[error("Workbook contains no sheets")]
    NoSheets,

    /// Empty file.
    #[error("Input table is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in input table")]
    NoHeaders,
}

impl From<calamine::XlsxError> for LoadError {
    fn from(err: calamine::XlsxError) -> Self {
        LoadError::Workbook(err.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration or a label registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Label registry does not form a valid bijection over the report columns.
    #[error("Invalid label registry: {0}")]
    InvalidLabels(String),

    /// Environment variable holds an unusable value.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },

    /// Header date format that chrono cannot apply to a date.
    #[error("Invalid date format: '{0}'")]
    InvalidDateFormat(String),

    /// IO error.
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Report Errors
// =============================================================================

/// What exactly was wrong with an input row.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidInputKind {
    /// `Status` is neither 0 nor 1 (only raised in strict mode).
    UnknownStatus(String),
    /// `Value` could not be read as a number.
    NonNumericValue(String),
    /// `Value` is NaN or infinite.
    NonFiniteValue,
    /// `ValueDate` differs from the report date (only raised in strict mode).
    MixedDates { expected: String, found: String },
}

impl fmt::Display for InvalidInputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInputKind::UnknownStatus(s) => write!(f, "status '{}' is not 0 or 1", s),
            InvalidInputKind::NonNumericValue(v) => write!(f, "value '{}' is not numeric", v),
            InvalidInputKind::NonFiniteValue => write!(f, "value is not a finite number"),
            InvalidInputKind::MixedDates { expected, found } => {
                write!(f, "date '{}' differs from report date '{}'", found, expected)
            }
        }
    }
}

/// Errors while turning records into a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Input table lacks required fields.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A row violates the input contract.
    ///
    /// `row` is the 1-based data row number (header excluded).
    #[error("Row {row}: {kind}")]
    InvalidInput { row: usize, kind: InvalidInputKind },

    /// A cell reached the serializer with a value JSON cannot carry.
    #[error("Cell '{column}' of row '{block}' is not a finite number")]
    NonFiniteCell { block: String, column: String },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing a finished report.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Spreadsheet writer failed.
    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The report violates a serializer precondition.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::process_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Input contract violation.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Serialization error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Whether the error was caused by the caller's input rather than by us.
    pub fn is_input_error(&self) -> bool {
        matches!(self, PipelineError::Load(_) | PipelineError::Report(_))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for report building.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // LoadError -> PipelineError
        let load_err = LoadError::EmptyFile;
        let pipeline_err: PipelineError = load_err.into();
        assert!(pipeline_err.to_string().contains("empty"));
        assert!(pipeline_err.is_input_error());

        // ReportError -> PipelineError
        let report_err = ReportError::MissingColumns(vec!["Status".into(), "Block_Tag".into()]);
        let pipeline_err: PipelineError = report_err.into();
        assert!(pipeline_err.to_string().contains("Status, Block_Tag"));
    }

    #[test]
    fn test_invalid_input_format() {
        let err = ReportError::InvalidInput {
            row: 7,
            kind: InvalidInputKind::NonNumericValue("abc".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 7"));
        assert!(msg.contains("'abc'"));
    }

    #[test]
    fn test_export_errors_are_not_input_errors() {
        let err: PipelineError = ExportError::Report(ReportError::NonFiniteCell {
            block: "A".into(),
            column: "CA".into(),
        })
        .into();
        assert!(!err.is_input_error());
    }
}
