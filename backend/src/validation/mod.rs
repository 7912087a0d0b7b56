//! JSON Schema validation of rendered reports.
//!
//! The nested view schema is embedded at compile time from
//! `schemas/nested-view.json` (draft 7). It pins the document shape the UI
//! table widget relies on:
//!
//! - exactly four headers: `block`, then `fact`, `staff`, `delta` with nine nested columns each
//! - at least one row (the `Total` row), ids `row0`, `row1`, ...
//! - four `rowValues` per row, numeric cells only under the sections
//!
//! # Example
//!
//! ```rust,ignore
//! use planpivot::validation::validate_nested_view;
//!
//! let view: serde_json::Value = serde_json::from_str(&json)?;
//! if let Err(errors) = validate_nested_view(&view) {
//!     for e in errors {
//!         eprintln!("{}", e);
//!     }
//! }
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

const NESTED_VIEW_SCHEMA: &str = include_str!("../../schemas/nested-view.json");

static NESTED_VIEW: Lazy<Result<Value, String>> =
    Lazy::new(|| serde_json::from_str(NESTED_VIEW_SCHEMA).map_err(|e| e.to_string()));

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick yes/no check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// The embedded nested view schema.
pub fn nested_view_schema() -> Result<&'static Value, Vec<String>> {
    NESTED_VIEW
        .as_ref()
        .map_err(|e| vec![format!("Invalid embedded schema: {}", e)])
}

/// Validate a rendered nested view.
pub fn validate_nested_view(data: &Value) -> Result<(), Vec<String>> {
    validate(nested_view_schema()?, data)
}

/// Quick check against the nested view schema.
pub fn is_valid_nested_view(data: &Value) -> bool {
    nested_view_schema()
        .map(|schema| is_valid(schema, data))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{build_nested_view, to_json};
    use crate::labels::LabelRegistry;
    use crate::models::{RawRecord, RecordStatus};
    use crate::transform::{append_totals, merge_three_way};
    use serde_json::json;

    fn rendered(records: &[RawRecord]) -> Value {
        let labels = LabelRegistry::standard();
        let merged = append_totals(merge_three_way(records, labels));
        let view = build_nested_view(&merged, labels, "2021-01-01").unwrap();
        serde_json::from_str(&to_json(&view).unwrap()).unwrap()
    }

    #[test]
    fn test_embedded_schema_parses() {
        assert!(nested_view_schema().is_ok());
    }

    #[test]
    fn test_rendered_view_is_valid() {
        let view = rendered(&[
            RawRecord::new(RecordStatus::Baseline, 10, "ЦА", "A"),
            RawRecord::new(RecordStatus::Revised, 2.5, "ДЗО", "B"),
        ]);
        assert_eq!(validate_nested_view(&view), Ok(()));
    }

    #[test]
    fn test_empty_report_is_valid() {
        let view = rendered(&[]);
        assert!(is_valid_nested_view(&view));
    }

    #[test]
    fn test_missing_section_rejected() {
        let mut view = rendered(&[RawRecord::new(RecordStatus::Baseline, 1, "ЦА", "A")]);
        view["headers"].as_array_mut().unwrap().pop();
        assert!(!is_valid_nested_view(&view));
    }

    #[test]
    fn test_text_cell_in_section_rejected() {
        let mut view = rendered(&[RawRecord::new(RecordStatus::Baseline, 1, "ЦА", "A")]);
        view["rows"][1]["rowValues"][1]["value"] = json!("15");
        let errors = validate_nested_view(&view).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "Блок" })).is_ok());
        assert!(validate(&schema, &json!({ "age": 42 })).is_err());
        assert!(is_valid(&schema, &json!({ "name": "x" })));
    }
}
