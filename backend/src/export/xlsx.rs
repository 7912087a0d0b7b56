//! Spreadsheet Exporter.
//!
//! ```text
//! ┌──────┬───────────────────────────┬───────────────────────────┬───────────────────────────┐
//! │      │ <date> УТВЕРЖДЁННЫЙ БП ...│ <date> СКОРР. ПЛАН ...    │ Дельта ...                │
//! │ Блок ├─────────┬───────┬───┬────┼─────────┬───────┬───┬────┼─────────┬───────┬───┬────┤
//! │      │ПАО+ДЗО..│ПАО+ДИТ│...│ДЗО │ПАО+ДЗО..│ПАО+ДИТ│...│ДЗО │ПАО+ДЗО..│ПАО+ДИТ│...│ДЗО │
//! ├──────┼─────────┼───────┼───┼────┼─────────┼───────┼───┼────┼─────────┼───────┼───┼────┤
//! │Total │ ...                                                                             │
//! └──────┴─────────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Column headers are the display labels: ids are translated back through
//! the label registry before writing.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use tracing::debug;

use crate::error::ExportResult;
use crate::labels::LabelRegistry;
use crate::models::Number;
use crate::transform::merge::{MergedTable, Section};

use super::{section_title, BLOCK_TITLE};

const SHEET_NAME: &str = "Report";
const HEADER_ROWS: u32 = 2;
/// Largest magnitude an `f64` sheet cell holds exactly.
const MAX_EXACT_INT: u64 = 1 << 53;

/// Write the merged table (totals row included) as XLSX bytes.
pub fn write_workbook(
    merged: &MergedTable,
    labels: &LabelRegistry,
    date: &str,
) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let total = Format::new().set_bold();

    worksheet.merge_range(0, 0, HEADER_ROWS - 1, 0, BLOCK_TITLE, &header)?;

    let width = merged.section_width() as u16;
    for section in Section::ALL {
        let first_col = 1 + section.index() as u16 * width;
        worksheet.merge_range(
            0,
            first_col,
            0,
            first_col + width - 1,
            &section_title(section, date),
            &header,
        )?;

        for (offset, id) in merged.section_columns(section).iter().enumerate() {
            let label = labels.label_for_id(id).unwrap_or(id.as_str());
            worksheet.write_string_with_format(1, first_col + offset as u16, label, &header)?;
        }
    }

    let mut inexact = 0usize;
    for (i, row) in merged.rows().iter().enumerate() {
        let sheet_row = HEADER_ROWS + i as u32;
        // The totals row is always first.
        if i == 0 {
            worksheet.write_string_with_format(sheet_row, 0, &row.key, &total)?;
        } else {
            worksheet.write_string(sheet_row, 0, &row.key)?;
        }
        for (col, value) in row.values.iter().enumerate() {
            let sheet_col = 1 + col as u16;
            if loses_precision(value) {
                inexact += 1;
            }
            let number = value.as_f64();
            if i == 0 {
                worksheet.write_number_with_format(sheet_row, sheet_col, number, &total)?;
            } else {
                worksheet.write_number(sheet_row, sheet_col, number)?;
            }
        }
    }

    if inexact > 0 {
        debug!(cells = inexact, "Integers beyond 2^53 written as rounded floats");
    }

    worksheet.set_freeze_panes(HEADER_ROWS, 1)?;

    let bytes = workbook.save_to_buffer()?;
    debug!(bytes = bytes.len(), rows = merged.len(), "Workbook written");
    Ok(bytes)
}

/// Sheet cells are `f64`; very large integers get rounded.
fn loses_precision(value: &Number) -> bool {
    matches!(value, Number::Int(n) if n.unsigned_abs() > MAX_EXACT_INT)
}
