//! Nested View Serializer - the JSON document consumed by the UI table widget.
//!
//! # Output Format
//!
//! ```json
//! {
//!   "headers": [
//!     {"id": "block", "value": "Блок"},
//!     {"id": "fact", "value": "<date> УТВЕРЖДЁННЫЙ БП ...", "nested": [{"id": "PAO_DZO_DIT", "value": "ПАО+ДЗО+ДИТ"}, ...]},
//!     {"id": "staff", ...},
//!     {"id": "delta", ...}
//!   ],
//!   "rows": [
//!     {"id": "row0", "rowValues": [
//!       {"id": "block", "value": "Total"},
//!       {"id": "fact", "value": 15, "nested": [{"id": "PAO_DZO_DIT", "value": 15}, ...]},
//!       ...
//!     ]}
//!   ]
//! }
//! ```
//!
//! - Row ids are sequential (`row0`, `row1`, ...) whatever the block label.
//! - A section's collapsed `value` is its `PAO_DZO_DIT` cell.
//! - Integers stay JSON integers, floats stay floats.
//! - Non-ASCII text is written unescaped.

use serde::Serialize;

use crate::error::{ExportResult, ReportError, ReportResult};
use crate::labels::{LabelRegistry, PAO_DZO_DIT};
use crate::models::Number;
use crate::transform::merge::{MergedTable, Section};

use super::{section_title, BLOCK_TITLE};

const BLOCK_ID: &str = "block";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedView {
    pub headers: Vec<HeaderEntry>,
    pub rows: Vec<RowEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderEntry {
    pub id: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<Vec<NestedHeader>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedHeader {
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowEntry {
    pub id: String,
    #[serde(rename = "rowValues")]
    pub row_values: Vec<RowValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowValue {
    pub id: String,
    pub value: CellContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<Vec<NestedCell>>,
}

/// Either the block label or a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellContent {
    Text(String),
    Number(Number),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedCell {
    pub id: String,
    pub value: Number,
}

/// Build the nested view of a merged table (totals row included).
///
/// Fails only if a cell holds NaN or infinity, which JSON cannot carry.
pub fn build_nested_view(
    merged: &MergedTable,
    labels: &LabelRegistry,
    date: &str,
) -> ReportResult<NestedView> {
    let headers = build_headers(labels, date);

    let collapsed = labels.position(PAO_DZO_DIT).unwrap_or(0);
    let mut rows = Vec::with_capacity(merged.len());

    for (i, row) in merged.rows().iter().enumerate() {
        let mut row_values = Vec::with_capacity(1 + Section::ALL.len());
        row_values.push(RowValue {
            id: BLOCK_ID.to_string(),
            value: CellContent::Text(row.key.clone()),
            nested: None,
        });

        for section in Section::ALL {
            let cells = merged.section(row, section);
            let columns = merged.section_columns(section);

            let mut nested = Vec::with_capacity(cells.len());
            for (column, value) in columns.iter().zip(cells) {
                if !value.is_finite() {
                    return Err(ReportError::NonFiniteCell {
                        block: row.key.clone(),
                        column: format!("{}.{}", section.id(), column),
                    });
                }
                nested.push(NestedCell {
                    id: column.clone(),
                    value: *value,
                });
            }

            row_values.push(RowValue {
                id: section.id().to_string(),
                value: CellContent::Number(cells.get(collapsed).copied().unwrap_or(Number::ZERO)),
                nested: Some(nested),
            });
        }

        rows.push(RowEntry {
            id: format!("row{}", i),
            row_values,
        });
    }

    Ok(NestedView { headers, rows })
}

fn build_headers(labels: &LabelRegistry, date: &str) -> Vec<HeaderEntry> {
    let mut headers = vec![HeaderEntry {
        id: BLOCK_ID.to_string(),
        value: BLOCK_TITLE.to_string(),
        nested: None,
    }];

    for section in Section::ALL {
        let nested = labels
            .entries()
            .iter()
            .map(|e| NestedHeader {
                id: e.id.clone(),
                value: e.label.clone(),
            })
            .collect();
        headers.push(HeaderEntry {
            id: section.id().to_string(),
            value: section_title(section, date),
            nested: Some(nested),
        });
    }
    headers
}

/// Compact JSON, as sent to the UI.
pub fn to_json(view: &NestedView) -> ExportResult<String> {
    Ok(serde_json::to_string(view)?)
}

/// Indented JSON, for humans.
pub fn to_json_pretty(view: &NestedView) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(view)?)
}
