//! Three-Way Merger - baseline, revised and their delta in one wide table.
//!
//! ```text
//!          │ baseline (fact) │ revised (staff) │ delta           │
//! Block    │ 9 columns       │ 9 columns       │ revised-baseline│
//! ```
//!
//! Rows are the union of blocks seen in either plan. A block present in
//! only one plan reads as zero in the other.

use serde::Serialize;
use tracing::{info, warn};

use crate::labels::LabelRegistry;
use crate::models::{Number, RawRecord, RecordStatus};
use crate::table::{LabeledTable, TableRow};

use super::pivot::build_pivot;

/// The three column groups of the report, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Approved plan, `Status = 0`.
    Fact,
    /// Revised plan, `Status = 1`.
    Staff,
    /// `Staff - Fact`.
    Delta,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Fact, Section::Staff, Section::Delta];

    /// Id used in the nested view.
    pub fn id(self) -> &'static str {
        match self {
            Section::Fact => "fact",
            Section::Staff => "staff",
            Section::Delta => "delta",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Section::Fact => 0,
            Section::Staff => 1,
            Section::Delta => 2,
        }
    }
}

/// Records split by plan.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub baseline: Vec<&'a RawRecord>,
    pub revised: Vec<&'a RawRecord>,
    /// Records with a status other than 0 or 1.
    pub excluded: usize,
}

/// Split records by status. Unknown statuses are counted, not kept.
pub fn partition(records: &[RawRecord]) -> Partition<'_> {
    let mut parts = Partition::default();
    for record in records {
        match record.status {
            RecordStatus::Baseline => parts.baseline.push(record),
            RecordStatus::Revised => parts.revised.push(record),
            RecordStatus::Other(_) => parts.excluded += 1,
        }
    }
    parts
}

/// The merged report table: three sections of equal width side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    table: LabeledTable,
    section_width: usize,
}

impl MergedTable {
    /// Combine two pivots (same columns) into `[baseline, revised, delta]`.
    pub fn from_pivots(baseline: &LabeledTable, revised: &LabeledTable) -> Self {
        let delta = revised.subtract(baseline);
        Self {
            table: LabeledTable::hconcat(&[baseline, revised, &delta]),
            section_width: baseline.width(),
        }
    }

    pub fn table(&self) -> &LabeledTable {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut LabeledTable {
        &mut self.table
    }

    pub fn section_width(&self) -> usize {
        self.section_width
    }

    pub fn rows(&self) -> &[TableRow] {
        self.table.rows()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The cells of one section of a row.
    pub fn section<'r>(&self, row: &'r TableRow, section: Section) -> &'r [Number] {
        let start = section.index() * self.section_width;
        &row.values[start..start + self.section_width]
    }

    /// Column ids of one section, in order.
    pub fn section_columns(&self, section: Section) -> &[String] {
        let start = section.index() * self.section_width;
        &self.table.columns()[start..start + self.section_width]
    }
}

/// Pivot both plans and merge them.
pub fn merge_three_way(records: &[RawRecord], labels: &LabelRegistry) -> MergedTable {
    let parts = partition(records);

    if parts.excluded > 0 {
        warn!(rows = parts.excluded, "Excluded records with a status other than 0 or 1");
    }
    if parts.baseline.is_empty() {
        warn!("EmptyResultWarning: no baseline (Status = 0) records");
    }
    if parts.revised.is_empty() {
        warn!("EmptyResultWarning: no revised (Status = 1) records");
    }

    let baseline = build_pivot(parts.baseline.iter().copied(), labels);
    let revised = build_pivot(parts.revised.iter().copied(), labels);
    let merged = MergedTable::from_pivots(&baseline, &revised);

    info!(
        baseline_blocks = baseline.len(),
        revised_blocks = revised.len(),
        merged_blocks = merged.len(),
        "Merged baseline and revised plans"
    );
    merged
}
