//! Totals Row Appender.

use tracing::{debug, warn};

use super::merge::MergedTable;

/// Label of the synthetic totals row.
pub const TOTAL_LABEL: &str = "Total";

/// Prepend a `Total` row holding the column-wise sums of all rows.
///
/// Must run before either export so both see the same totals. An input
/// block literally named `Total` is kept, but both exports will show two
/// rows with that label, so it is reported.
pub fn append_totals(mut merged: MergedTable) -> MergedTable {
    if has_total_block(&merged) {
        warn!(
            block = TOTAL_LABEL,
            "Input block has the same name as the totals row"
        );
    }
    let sums = merged.table().column_sums();
    merged.table_mut().prepend_row(TOTAL_LABEL, sums);
    debug!(rows = merged.len(), "Totals row added");
    merged
}

fn has_total_block(merged: &MergedTable) -> bool {
    merged.table().row(TOTAL_LABEL).is_some()
}
