//! High-level pipeline API: input table in, rendered report out.
//!
//! ```text
//! load (CSV/XLSX) → extract records → pivot ×2 → merge → totals → JSON | XLSX
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use planpivot::{process_file, ExportMode, ReportConfig, ReportOutput};
//! use std::path::Path;
//!
//! let config = ReportConfig::default();
//! match process_file(Path::new("plan.csv"), ExportMode::Json, &config)? {
//!     ReportOutput::Json(json) => println!("{}", json),
//!     ReportOutput::Spreadsheet(bytes) => std::fs::write("plan.xlsx", bytes)?,
//! }
//! ```
//!
//! Everything here is synchronous and CPU-bound; the HTTP server runs it on
//! the blocking pool.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::ReportConfig;
use crate::error::{ConfigError, ExportResult, PipelineResult};
use crate::export::{build_nested_view, to_json, to_json_pretty, write_workbook, NestedView};
use crate::labels::LabelRegistry;
use crate::models::{RawRecord, ValueDate};
use crate::parser::{extract_records, parse_bytes_auto, parse_file_auto, ParseResult, SourceFormat};

use super::merge::{merge_three_way, MergedTable};
use super::totals::append_totals;

/// Which serializer to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportMode {
    #[default]
    Json,
    Spreadsheet,
}

impl From<bool> for ExportMode {
    /// `true` asks for a spreadsheet.
    fn from(excel: bool) -> Self {
        if excel {
            ExportMode::Spreadsheet
        } else {
            ExportMode::Json
        }
    }
}

/// A rendered report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutput {
    Json(String),
    Spreadsheet(Vec<u8>),
}

impl ReportOutput {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ReportOutput::Json(json) => json.as_bytes(),
            ReportOutput::Spreadsheet(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ReportOutput::Json(json) => json.into_bytes(),
            ReportOutput::Spreadsheet(bytes) => bytes,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportOutput::Json(_) => "application/json",
            ReportOutput::Spreadsheet(_) => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// Input metadata carried alongside a report.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub format: Option<SourceFormat>,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub row_count: usize,
    pub record_count: usize,
    pub dropped_rows: usize,
}

/// A finished report, ready for either serializer.
#[derive(Debug, Clone)]
pub struct Report {
    /// Merged table with the `Total` row first.
    pub merged: MergedTable,
    /// Date text used in section headers.
    pub date: String,
    pub source: SourceInfo,
}

impl Report {
    pub fn nested_view(&self, labels: &LabelRegistry) -> PipelineResult<NestedView> {
        Ok(build_nested_view(&self.merged, labels, &self.date)?)
    }

    pub fn to_json(&self, labels: &LabelRegistry, pretty: bool) -> PipelineResult<String> {
        let view = self.nested_view(labels)?;
        let json: ExportResult<String> = if pretty {
            to_json_pretty(&view)
        } else {
            to_json(&view)
        };
        Ok(json?)
    }

    pub fn to_xlsx(&self, labels: &LabelRegistry) -> PipelineResult<Vec<u8>> {
        Ok(write_workbook(&self.merged, labels, &self.date)?)
    }

    /// Serialize the report. JSON is compact.
    pub fn render(&self, mode: ExportMode, labels: &LabelRegistry) -> PipelineResult<ReportOutput> {
        let output = match mode {
            ExportMode::Json => ReportOutput::Json(self.to_json(labels, false)?),
            ExportMode::Spreadsheet => ReportOutput::Spreadsheet(self.to_xlsx(labels)?),
        };
        info!(bytes = output.as_bytes().len(), ?mode, "Report rendered");
        Ok(output)
    }
}

/// Build the report from already extracted records.
pub fn build_report(
    records: &[RawRecord],
    report_date: Option<&ValueDate>,
    config: &ReportConfig,
    labels: &LabelRegistry,
) -> PipelineResult<Report> {
    config.validate()?;
    let date = match report_date {
        Some(d) => d
            .display(&config.date_format)
            .map_err(|_| ConfigError::InvalidDateFormat(config.date_format.clone()))?,
        None => String::new(),
    };
    let merged = append_totals(merge_three_way(records, labels));

    Ok(Report {
        merged,
        date,
        source: SourceInfo {
            record_count: records.len(),
            ..Default::default()
        },
    })
}

/// Build a report from a parsed input table.
pub fn build_report_from_table(
    parsed: &ParseResult,
    config: &ReportConfig,
    labels: &LabelRegistry,
) -> PipelineResult<Report> {
    let extracted = extract_records(&parsed.table, config.extract_options())?;
    info!(
        rows = parsed.table.rows.len(),
        records = extracted.records.len(),
        dropped = extracted.dropped,
        "Input loaded"
    );

    let mut report = build_report(
        &extracted.records,
        extracted.report_date.as_ref(),
        config,
        labels,
    )?;
    report.source = SourceInfo {
        format: Some(parsed.format),
        encoding: parsed.encoding.clone(),
        delimiter: parsed.delimiter,
        row_count: parsed.table.rows.len(),
        record_count: extracted.records.len(),
        dropped_rows: extracted.dropped,
    };
    Ok(report)
}

/// Run the whole pipeline over in-memory records.
pub fn process_records(
    records: &[RawRecord],
    report_date: Option<&ValueDate>,
    mode: ExportMode,
    config: &ReportConfig,
) -> PipelineResult<ReportOutput> {
    let labels = config.load_labels()?;
    build_report(records, report_date, config, &labels)?.render(mode, &labels)
}

/// Run the whole pipeline over the bytes of a CSV or XLSX file.
pub fn process_bytes(bytes: &[u8], mode: ExportMode, config: &ReportConfig) -> PipelineResult<ReportOutput> {
    let labels = config.load_labels()?;
    let parsed = parse_bytes_auto(bytes)?;
    build_report_from_table(&parsed, config, &labels)?.render(mode, &labels)
}

/// Run the whole pipeline over a CSV or XLSX file.
pub fn process_file(path: &Path, mode: ExportMode, config: &ReportConfig) -> PipelineResult<ReportOutput> {
    let labels = config.load_labels()?;
    info!(path = %path.display(), "Reading input");
    let parsed = parse_file_auto(path)?;
    build_report_from_table(&parsed, config, &labels)?.render(mode, &labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, ReportError};
    use crate::models::{Number, RecordStatus};
    use serde_json::Value;
    use std::io::Write;

    const CSV: &str = "Status;Value;ValueDate;Org_Tag;Block_Tag\n\
                       0;10;2021-01-01;ЦА;A\n\
                       0;5;2021-01-01;ТБ;A\n\
                       1;20;2021-01-01;ЦА;A\n";

    #[test]
    fn test_export_mode_from_flag() {
        assert_eq!(ExportMode::from(true), ExportMode::Spreadsheet);
        assert_eq!(ExportMode::from(false), ExportMode::Json);
    }

    #[test]
    fn test_process_bytes_json() {
        let output = process_bytes(CSV.as_bytes(), ExportMode::Json, &ReportConfig::default()).unwrap();
        let json = match output {
            ReportOutput::Json(json) => json,
            other => panic!("expected JSON, got {:?}", other.content_type()),
        };
        let view: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(view["rows"][0]["rowValues"][0]["value"], "Total");
        assert_eq!(view["rows"][0]["rowValues"][1]["value"], 15);
        assert_eq!(view["rows"][0]["rowValues"][3]["value"], 5);
        assert_eq!(
            view["headers"][1]["value"],
            "2021-01-01 УТВЕРЖДЁННЫЙ БП (ПЛАН + ПРИКАЗЫ)"
        );
    }

    #[test]
    fn test_process_bytes_spreadsheet() {
        let output =
            process_bytes(CSV.as_bytes(), ExportMode::Spreadsheet, &ReportConfig::default()).unwrap();
        assert!(matches!(output, ReportOutput::Spreadsheet(_)));
        assert!(output.as_bytes().starts_with(b"PK"));
        assert_eq!(
            output.content_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn test_process_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let output = process_file(file.path(), ExportMode::Json, &ReportConfig::default()).unwrap();
        assert!(matches!(output, ReportOutput::Json(_)));
    }

    #[test]
    fn test_date_format_applied() {
        let config = ReportConfig {
            date_format: "%d.%m.%Y".into(),
            ..Default::default()
        };
        let labels = config.load_labels().unwrap();
        let parsed = parse_bytes_auto(CSV.as_bytes()).unwrap();
        let report = build_report_from_table(&parsed, &config, &labels).unwrap();
        assert_eq!(report.date, "01.01.2021");
        assert_eq!(report.source.record_count, 3);
        assert_eq!(report.source.delimiter, Some(';'));
    }

    #[test]
    fn test_missing_columns_is_input_error() {
        let err = process_bytes(b"Status;Value\n0;1\n", ExportMode::Json, &ReportConfig::default())
            .unwrap_err();
        assert!(err.is_input_error());
        assert!(matches!(err, PipelineError::Report(ReportError::MissingColumns(_))));
    }

    #[test]
    fn test_process_records_without_date() {
        let records = vec![RawRecord::new(RecordStatus::Revised, 4, "ДЗО", "B")];
        let output = process_records(&records, None, ExportMode::Json, &ReportConfig::default()).unwrap();
        let json = match output {
            ReportOutput::Json(json) => json,
            ReportOutput::Spreadsheet(_) => panic!("expected JSON"),
        };
        let view: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(view["headers"][1]["value"], " УТВЕРЖДЁННЫЙ БП (ПЛАН + ПРИКАЗЫ)");
        assert_eq!(view["rows"][1]["rowValues"][2]["value"], 4);
        assert_eq!(view["rows"][1]["rowValues"][3]["value"], 4);
    }

    #[test]
    fn test_empty_input_gives_total_only() {
        let labels = LabelRegistry::standard();
        let report = build_report(&[], None, &ReportConfig::default(), labels).unwrap();
        assert_eq!(report.merged.len(), 1);
        assert!(report.merged.rows()[0].values.iter().all(|v| *v == Number::ZERO));
    }

    #[test]
    fn test_bad_date_format_is_config_error() {
        let records = vec![RawRecord::new(RecordStatus::Baseline, 1, "ЦА", "A")];
        let date = ValueDate::parse("2021-01-01");
        let config = ReportConfig {
            date_format: "%Q".into(),
            ..Default::default()
        };

        let err = process_records(&records, date.as_ref(), ExportMode::Json, &config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::InvalidDateFormat(_))
        ));
        assert!(!err.is_input_error());
    }
}
