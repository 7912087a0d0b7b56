//! # Planpivot - baseline vs revised budget plan report
//!
//! Planpivot reads a flat table of plan figures (CSV or XLSX) and produces a
//! three-way comparison per business block: the approved plan, the revised
//! plan and their difference, each broken down by organizational unit.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  CSV / XLSX │──▶│   Parser    │──▶│ Pivot ×2 +   │──▶│  Totals row │──▶│ Nested JSON  │
//! │ (auto-enc)  │   │  (records)  │   │ 3-way merge  │   │             │   │   or XLSX    │
//! └─────────────┘   └─────────────┘   └──────────────┘   └─────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use planpivot::{process_file, ExportMode, ReportConfig};
//!
//! let output = process_file("plan.csv".as_ref(), ExportMode::Json, &ReportConfig::default())?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment configuration and logging setup
//! - [`models`] - Numbers, statuses, dates, input records
//! - [`labels`] - Column id / display label registry
//! - [`table`] - Row-keyed numeric tables
//! - [`parser`] - CSV/XLSX loading with auto-detection
//! - [`transform`] - Pivot, merge, totals and pipeline
//! - [`export`] - Nested JSON view and XLSX writers
//! - [`validation`] - Nested view schema validation
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod labels;
pub mod models;
pub mod table;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ExportError, InvalidInputKind, LoadError, PipelineError, ReportError, ServerError,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{init_logging, ReportConfig};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use labels::{LabelEntry, LabelRegistry};
pub use models::{Number, RawRecord, RecordStatus, ValueDate};
pub use table::{LabeledTable, TableRow};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, extract_records, parse_bytes_auto,
    parse_file_auto, Cell, ExtractOptions, ExtractedRecords, ParseResult, RawTable, SourceFormat,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{append_totals, build_pivot, merge_three_way, MergedTable, Section};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    build_report, build_report_from_table, process_bytes, process_file, process_records, ExportMode,
    Report, ReportOutput, SourceInfo,
};

// =============================================================================
// Re-exports - Export / Validation
// =============================================================================

pub use export::{build_nested_view, to_json, to_json_pretty, write_workbook, NestedView};
pub use validation::{is_valid_nested_view, validate_nested_view};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
