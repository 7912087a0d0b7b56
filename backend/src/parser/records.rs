//! Turn a [`RawTable`] into report records.
//!
//! - required columns: `Status`, `Value`, `ValueDate`, `Org_Tag`, `Block_Tag`
//! - rows without `Org_Tag` or `Block_Tag` are dropped
//! - an empty `Value` counts as 0
//! - `Status` outside {0, 1} is kept as [`RecordStatus::Other`] (or rejected in strict mode)
//! - the report date is the `ValueDate` of the first data row

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{Cell, RawTable};
use crate::error::{InvalidInputKind, ReportError, ReportResult};
use crate::models::{Number, RawRecord, RecordStatus, ValueDate};

pub const STATUS: &str = "Status";
pub const VALUE: &str = "Value";
pub const VALUE_DATE: &str = "ValueDate";
pub const ORG_TAG: &str = "Org_Tag";
pub const BLOCK_TAG: &str = "Block_Tag";

pub const REQUIRED_COLUMNS: [&str; 5] = [STATUS, VALUE, VALUE_DATE, ORG_TAG, BLOCK_TAG];

/// How strictly to treat questionable rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Reject statuses other than 0 and 1 instead of excluding them.
    pub strict_status: bool,
    /// Reject rows whose `ValueDate` differs from the first row's.
    pub strict_dates: bool,
}

/// Records ready for pivoting.
#[derive(Debug, Clone, Default)]
pub struct ExtractedRecords {
    pub records: Vec<RawRecord>,
    /// Date of the first data row, used in report headers.
    pub report_date: Option<ValueDate>,
    /// Rows dropped for lacking `Org_Tag` or `Block_Tag`.
    pub dropped: usize,
}

struct Columns {
    status: usize,
    value: usize,
    value_date: usize,
    org_tag: usize,
    block_tag: usize,
}

impl Columns {
    fn locate(table: &RawTable) -> ReportResult<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| table.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::MissingColumns(missing));
        }

        let index = |name: &str| table.column_index(name).unwrap_or_default();
        Ok(Self {
            status: index(STATUS),
            value: index(VALUE),
            value_date: index(VALUE_DATE),
            org_tag: index(ORG_TAG),
            block_tag: index(BLOCK_TAG),
        })
    }
}

/// Normalize every row of the table into a [`RawRecord`].
pub fn extract_records(table: &RawTable, options: ExtractOptions) -> ReportResult<ExtractedRecords> {
    let columns = Columns::locate(table)?;

    let report_date = table
        .rows
        .first()
        .and_then(|row| cell(row, columns.value_date))
        .and_then(to_value_date);

    let mut extracted = ExtractedRecords {
        records: Vec::with_capacity(table.rows.len()),
        report_date,
        dropped: 0,
    };
    let mut distinct_dates: BTreeSet<String> = BTreeSet::new();

    for (i, row) in table.rows.iter().enumerate() {
        let row_number = i + 1;

        let org_tag = cell(row, columns.org_tag).and_then(Cell::as_text);
        let block_tag = cell(row, columns.block_tag).and_then(Cell::as_text);
        let (org_tag, block_tag) = match (org_tag, block_tag) {
            (Some(org), Some(block)) => (org, block),
            _ => {
                extracted.dropped += 1;
                continue;
            }
        };

        let status = to_status(cell(row, columns.status));
        if let RecordStatus::Other(ref raw) = status {
            if options.strict_status {
                return Err(ReportError::InvalidInput {
                    row: row_number,
                    kind: InvalidInputKind::UnknownStatus(raw.clone()),
                });
            }
        }

        let value = to_value(cell(row, columns.value)).map_err(|kind| ReportError::InvalidInput {
            row: row_number,
            kind,
        })?;

        let value_date = cell(row, columns.value_date).and_then(to_value_date);
        if let (Some(date), Some(expected)) = (&value_date, &extracted.report_date) {
            if date != expected {
                if options.strict_dates {
                    return Err(ReportError::InvalidInput {
                        row: row_number,
                        kind: InvalidInputKind::MixedDates {
                            expected: expected.to_string(),
                            found: date.to_string(),
                        },
                    });
                }
                distinct_dates.insert(date.to_string());
            }
        }

        extracted.records.push(RawRecord {
            status,
            value,
            value_date,
            org_tag,
            block_tag,
        });
    }

    if extracted.dropped > 0 {
        warn!(rows = extracted.dropped, "Dropped rows without Org_Tag or Block_Tag");
    }
    if !distinct_dates.is_empty() {
        warn!(
            other_dates = ?distinct_dates,
            "Input mixes several ValueDate values; using the first row's date"
        );
    }
    debug!(records = extracted.records.len(), "Records extracted");

    Ok(extracted)
}

fn cell(row: &[Cell], index: usize) -> Option<&Cell> {
    row.get(index).filter(|c| !c.is_empty())
}

fn to_status(cell: Option<&Cell>) -> RecordStatus {
    match cell {
        None => RecordStatus::Other(String::new()),
        Some(Cell::Number(n)) => RecordStatus::from_number(*n),
        Some(other) => RecordStatus::from_text(&other.as_text().unwrap_or_default()),
    }
}

fn to_value(cell: Option<&Cell>) -> Result<Number, InvalidInputKind> {
    let value = match cell {
        None => Number::ZERO,
        Some(Cell::Number(n)) => *n,
        Some(Cell::Text(text)) => {
            Number::parse(text).ok_or_else(|| InvalidInputKind::NonNumericValue(text.clone()))?
        }
        Some(other) => {
            let text = other.as_text().unwrap_or_default();
            return Err(InvalidInputKind::NonNumericValue(text));
        }
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidInputKind::NonFiniteValue)
    }
}

fn to_value_date(cell: &Cell) -> Option<ValueDate> {
    match cell {
        Cell::Date(date) => Some(ValueDate::Date(*date)),
        other => other.as_text().and_then(|text| ValueDate::parse(&text)),
    }
}
