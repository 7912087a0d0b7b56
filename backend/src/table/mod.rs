//! A small in-memory labeled table.
//!
//! An ordered list of column names plus rows keyed by a label (the block
//! tag). Every row has exactly one [`Number`] per column; absent cells are
//! zero, never missing. Column names may repeat, which happens when
//! tables are concatenated side by side.

use std::collections::{BTreeSet, HashMap};

use crate::models::Number;

/// A row label with its cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub key: String,
    pub values: Vec<Number>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabeledTable {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

impl LabeledTable {
    /// An empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }

    /// Append a row. Short rows are zero-padded, long rows truncated.
    pub fn push_row(&mut self, key: impl Into<String>, mut values: Vec<Number>) {
        values.resize(self.columns.len(), Number::ZERO);
        self.rows.push(TableRow {
            key: key.into(),
            values,
        });
    }

    /// Insert a row before all others.
    pub fn prepend_row(&mut self, key: impl Into<String>, mut values: Vec<Number>) {
        values.resize(self.columns.len(), Number::ZERO);
        self.rows.insert(
            0,
            TableRow {
                key: key.into(),
                values,
            },
        );
    }

    /// First row with the given key.
    pub fn row(&self, key: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Position of the first column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell by row key and column name. Absent rows read as zero.
    pub fn get(&self, key: &str, column: &str) -> Option<Number> {
        let col = self.column_index(column)?;
        Some(self.row(key).map(|r| r.values[col]).unwrap_or(Number::ZERO))
    }

    /// Column-wise sums over all rows.
    pub fn column_sums(&self) -> Vec<Number> {
        (0..self.width())
            .map(|col| self.rows.iter().map(|r| r.values[col]).sum())
            .collect()
    }

    /// Element-wise `self - other`, aligned on row keys.
    ///
    /// Both tables must have the same columns. The result holds the sorted
    /// union of row keys; a key missing on one side counts as a zero row.
    pub fn subtract(&self, other: &LabeledTable) -> LabeledTable {
        debug_assert_eq!(self.columns, other.columns);
        let lhs = self.index();
        let rhs = other.index();
        let zeros = vec![Number::ZERO; self.width()];

        let mut result = LabeledTable::new(self.columns.iter().cloned());
        for key in union_keys(&[self, other]) {
            let a = lhs.get(key.as_str()).copied().unwrap_or(&zeros);
            let b = rhs.get(key.as_str()).copied().unwrap_or(&zeros);
            let values = a.iter().zip(b).map(|(x, y)| *x - *y).collect();
            result.push_row(key, values);
        }
        result
    }

    /// Concatenate tables side by side, aligned on row keys.
    ///
    /// Columns keep their order within each part and parts keep the given
    /// order. Rows are the sorted union of all keys, zero-filled.
    pub fn hconcat(parts: &[&LabeledTable]) -> LabeledTable {
        let columns = parts.iter().flat_map(|t| t.columns.iter().cloned());
        let mut result = LabeledTable::new(columns);
        let indexes: Vec<HashMap<&str, &Vec<Number>>> = parts.iter().map(|t| t.index()).collect();

        for key in union_keys(parts) {
            let mut values = Vec::with_capacity(result.width());
            for (part, index) in parts.iter().zip(&indexes) {
                match index.get(key.as_str()) {
                    Some(cells) => values.extend(cells.iter().copied()),
                    None => values.extend(std::iter::repeat(Number::ZERO).take(part.width())),
                }
            }
            result.push_row(key, values);
        }
        result
    }

    fn index(&self) -> HashMap<&str, &Vec<Number>> {
        self.rows
            .iter()
            .map(|r| (r.key.as_str(), &r.values))
            .collect()
    }
}

fn union_keys(tables: &[&LabeledTable]) -> BTreeSet<String> {
    tables
        .iter()
        .flat_map(|t| t.row_keys().map(str::to_string))
        .collect()
}
