//! XLSX input via `calamine`. Only the first worksheet is read; its first
//! row holds the headers.

use std::fmt;
use std::io::{Cursor, Read, Seek};

use calamine::{Data, Reader, Xlsx};

use super::{Cell, RawTable};
use crate::error::{LoadError, LoadResult};
use crate::models::Number;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// XLSX files are zip archives.
pub fn looks_like_xlsx(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Read the first worksheet of an in-memory XLSX file.
pub fn read_xlsx_bytes(bytes: &[u8]) -> LoadResult<RawTable> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;
    read_first_sheet(&mut workbook)
}

fn read_first_sheet<RS, R>(workbook: &mut R) -> LoadResult<RawTable>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoSheets)?
        .map_err(|e| LoadError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| c.to_string().trim().to_string())
            .collect(),
        None => return Err(LoadError::EmptyFile),
    };
    if headers.iter().all(String::is_empty) {
        return Err(LoadError::NoHeaders);
    }

    let table_rows = rows
        .map(|row| row.iter().map(convert_cell).collect::<Vec<Cell>>())
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    Ok(RawTable {
        headers,
        rows: table_rows,
    })
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(Number::from_f64(*f)),
        Data::Int(i) => Cell::Number(Number::Int(*i)),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(e) => Cell::Text(format!("{:?}", e)),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Cell::Date(datetime.date()),
            None => Cell::Number(Number::Float(dt.as_f64())),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
    }
}
