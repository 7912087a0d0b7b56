//! End-to-end tests of the public pipeline API.

use std::io::{Cursor, Write};

use calamine::{Data, Reader, Xlsx};
use planpivot::{
    process_bytes, process_file, validate_nested_view, ExportMode, InvalidInputKind, PipelineError,
    ReportConfig, ReportError, ReportOutput,
};
use serde_json::Value;

const HEADER: &str = "Status;Value;ValueDate;Org_Tag;Block_Tag";

fn csv(rows: &[&str]) -> String {
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    content
}

fn json_view(output: ReportOutput) -> Value {
    match output {
        ReportOutput::Json(json) => serde_json::from_str(&json).unwrap(),
        ReportOutput::Spreadsheet(_) => panic!("expected a JSON report"),
    }
}

/// Nested cell `id` of section `section` (1 = fact, 2 = staff, 3 = delta) in row `row`.
fn nested(view: &Value, row: usize, section: usize, id: &str) -> Value {
    view["rows"][row]["rowValues"][section]["nested"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == id)
        .map(|c| c["value"].clone())
        .unwrap()
}

#[test]
fn test_two_blocks_full_report() {
    let input = csv(&[
        "0;10;2021-01-01;ЦА;A",
        "0;5;2021-01-01;ТБ;A",
        "1;20;2021-01-01;ЦА;A",
        "0;7;2021-01-01;ДИТ;B",
        "1;3;2021-01-01;ДЗО;B",
        "1;1;2021-01-01;ВСП;B",
    ]);
    let view = json_view(process_bytes(input.as_bytes(), ExportMode::Json, &ReportConfig::default()).unwrap());

    assert_eq!(validate_nested_view(&view), Ok(()));

    let blocks: Vec<&str> = view["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["rowValues"][0]["value"].as_str().unwrap())
        .collect();
    assert_eq!(blocks, vec!["Total", "A", "B"]);

    // Block A
    assert_eq!(nested(&view, 1, 1, "PAO"), 15);
    assert_eq!(nested(&view, 1, 2, "PAO_DZO_DIT"), 20);
    assert_eq!(nested(&view, 1, 3, "TB"), -5);

    // Block B: DIT only in baseline, DZO and VSP only in revised
    assert_eq!(nested(&view, 2, 1, "PAO_DIT"), 7);
    assert_eq!(nested(&view, 2, 1, "PAO"), 0);
    assert_eq!(nested(&view, 2, 2, "PAO"), 1);
    assert_eq!(nested(&view, 2, 2, "PAO_DZO_DIT"), 4);
    assert_eq!(nested(&view, 2, 3, "DIT"), -7);

    // Totals
    assert_eq!(view["rows"][0]["rowValues"][1]["value"], 22);
    assert_eq!(view["rows"][0]["rowValues"][2]["value"], 24);
    assert_eq!(view["rows"][0]["rowValues"][3]["value"], 2);
}

#[test]
fn test_xlsx_input_and_output() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in ["Status", "Value", "ValueDate", "Org_Tag", "Block_Tag"].iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    sheet.write_number(1, 0, 0).unwrap();
    sheet.write_number(1, 1, 4.5).unwrap();
    sheet.write_string(1, 2, "2021-01-01").unwrap();
    sheet.write_string(1, 3, "ПЦП").unwrap();
    sheet.write_string(1, 4, "C").unwrap();
    let input = workbook.save_to_buffer().unwrap();

    let output = process_bytes(&input, ExportMode::Spreadsheet, &ReportConfig::default()).unwrap();
    let bytes = match output {
        ReportOutput::Spreadsheet(bytes) => bytes,
        ReportOutput::Json(_) => panic!("expected a workbook"),
    };

    let mut report: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
    let range = report.worksheet_range_at(0).unwrap().unwrap();
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

    assert_eq!(rows[0][0], Data::String("Блок".into()));
    assert_eq!(rows[2][0], Data::String("Total".into()));
    assert_eq!(rows[3][0], Data::String("C".into()));
    // fact PAO_DZO_DIT, then delta PAO_DZO_DIT
    assert_eq!(rows[3][1], Data::Float(4.5));
    assert_eq!(rows[3][19], Data::Float(-4.5));
}

#[test]
fn test_process_file_with_custom_date_format() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(csv(&["0;1;2021-03-15;ЦА;A"]).as_bytes()).unwrap();

    let config = ReportConfig {
        date_format: "%d.%m.%Y".into(),
        ..Default::default()
    };
    let view = json_view(process_file(file.path(), ExportMode::Json, &config).unwrap());
    assert_eq!(view["headers"][1]["value"], "15.03.2021 УТВЕРЖДЁННЫЙ БП (ПЛАН + ПРИКАЗЫ)");
}

#[test]
fn test_strict_status_rejects_unknown() {
    let input = csv(&["0;1;2021-01-01;ЦА;A", "5;1;2021-01-01;ЦА;A"]);

    let permissive = process_bytes(input.as_bytes(), ExportMode::Json, &ReportConfig::default());
    assert!(permissive.is_ok());

    let config = ReportConfig {
        strict_status: true,
        ..Default::default()
    };
    let err = process_bytes(input.as_bytes(), ExportMode::Json, &config).unwrap_err();
    match err {
        PipelineError::Report(ReportError::InvalidInput { row, kind }) => {
            assert_eq!(row, 2);
            assert_eq!(kind, InvalidInputKind::UnknownStatus("5".into()));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_non_numeric_value_is_input_error() {
    let input = csv(&["0;ten;2021-01-01;ЦА;A"]);
    let err = process_bytes(input.as_bytes(), ExportMode::Json, &ReportConfig::default()).unwrap_err();
    assert!(err.is_input_error());
    assert!(err.to_string().contains("Row 1"));
}

#[test]
fn test_empty_file_is_input_error() {
    let err = process_bytes(b"", ExportMode::Json, &ReportConfig::default()).unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn test_block_with_unknown_units_only_is_zero_row() {
    let input = csv(&["0;1;2021-01-01;ЦА;A", "0;7;2021-01-01;Прочие;B"]);
    let view = json_view(process_bytes(input.as_bytes(), ExportMode::Json, &ReportConfig::default()).unwrap());

    assert_eq!(validate_nested_view(&view), Ok(()));
    assert_eq!(view["rows"][2]["rowValues"][0]["value"], "B");
    assert_eq!(view["rows"][2]["rowValues"][1]["value"], 0);
    assert_eq!(view["rows"][0]["rowValues"][1]["value"], 1);
}

#[test]
fn test_invalid_date_format_is_error_not_panic() {
    let input = csv(&["0;1;2021-01-01;ЦА;A"]);
    let config = ReportConfig {
        date_format: "%Q".into(),
        ..Default::default()
    };
    let err = process_bytes(input.as_bytes(), ExportMode::Spreadsheet, &config).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(!err.is_input_error());
}
