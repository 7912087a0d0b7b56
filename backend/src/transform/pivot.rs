//! Pivot Builder - sum records per block and organizational unit.
//!
//! ```text
//! Block_Tag  Org_Tag  Value          PAO_DZO_DIT PAO_DIT PAO CA PCP TB VSP DIT DZO
//! A          ЦА       10        →  A          15          15      15  10  0   5  0   0   0
//! A          ТБ       5
//! ```
//!
//! The output always carries every column of the label registry, in registry
//! order. Base units absent from the input are zero; the three roll-ups are
//! derived from the base units of the same row.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::labels::{self, LabelRegistry, BASE_UNITS};
use crate::models::{Number, RawRecord};
use crate::table::LabeledTable;

/// Build the pivot table for records of a single status.
///
/// Rows are the distinct `Block_Tag` values in sorted order. `Org_Tag`
/// values that do not name a base unit are ignored with a warning; their
/// block still gets a row.
pub fn build_pivot<'a, I>(records: I, labels: &LabelRegistry) -> LabeledTable
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut grid: BTreeMap<&str, HashMap<&str, Number>> = BTreeMap::new();
    let mut ignored: BTreeSet<&str> = BTreeSet::new();

    for record in records {
        // Every block gets a row, even one whose tags are all ignored.
        let units = grid.entry(record.block_tag.as_str()).or_default();
        let unit = match labels.resolve_tag(&record.org_tag) {
            Some(id) if labels::is_base_unit(id) => id,
            _ => {
                ignored.insert(record.org_tag.as_str());
                continue;
            }
        };
        let cell = units.entry(unit).or_default();
        *cell = *cell + record.value;
    }

    if !ignored.is_empty() {
        warn!(
            tags = ?ignored,
            "Ignoring records whose Org_Tag is not a base organizational unit"
        );
    }

    let mut table = LabeledTable::new(labels.ids());
    for (block, units) in grid {
        let row = derive_row(&units);
        let values = labels
            .ids()
            .map(|id| row.get(id).copied().unwrap_or(Number::ZERO))
            .collect();
        table.push_row(block, values);
    }

    debug!(blocks = table.len(), "Pivot table built");
    table
}

/// Zero-fill the base units and compute the roll-ups, in dependency order.
fn derive_row<'a>(units: &HashMap<&'a str, Number>) -> HashMap<&'a str, Number> {
    let mut row: HashMap<&str, Number> = BASE_UNITS
        .iter()
        .map(|id| (*id, units.get(id).copied().unwrap_or(Number::ZERO)))
        .collect();

    let pao = row[labels::CA] + row[labels::PCP] + row[labels::TB] + row[labels::VSP];
    row.insert(labels::PAO, pao);
    let pao_dit = pao + row[labels::DIT];
    row.insert(labels::PAO_DIT, pao_dit);
    let pao_dzo_dit = pao_dit + row[labels::DZO];
    row.insert(labels::PAO_DZO_DIT, pao_dzo_dit);

    row
}
