//! Property-based tests for the report arithmetic.
//!
//! - Every pivot carries all registry columns in registry order
//! - Roll-up columns equal the sums of their parts
//! - Delta equals revised minus baseline, cell by cell
//! - The `Total` row equals the column sums of the block rows
//! - Merged rows are exactly the union of blocks from both plans

use std::collections::BTreeSet;

use proptest::prelude::*;

use super::merge::{merge_three_way, Section};
use super::pivot::build_pivot;
use super::totals::{append_totals, TOTAL_LABEL};
use crate::labels::{LabelRegistry, CA, DIT, DZO, PAO, PAO_DIT, PAO_DZO_DIT, PCP, TB, VSP};
use crate::models::{Number, RawRecord, RecordStatus};

const ORG_TAGS: [&str; 8] = ["ЦА", "ПЦП", "ТБ", "ВСП", "ДИТ", "ДЗО", "ПАО", "Прочие"];
const BLOCKS: [&str; 5] = ["A", "B", "C", "Розница", "ИТ"];

/// Strategy for a record with a small integer value.
fn record() -> impl Strategy<Value = RawRecord> {
    (0u8..3, -1_000i64..1_000, 0..ORG_TAGS.len(), 0..BLOCKS.len()).prop_map(
        |(status, value, org, block)| {
            let status = match status {
                0 => RecordStatus::Baseline,
                1 => RecordStatus::Revised,
                _ => RecordStatus::Other("2".into()),
            };
            RawRecord::new(status, value, ORG_TAGS[org], BLOCKS[block])
        },
    )
}

fn records() -> impl Strategy<Value = Vec<RawRecord>> {
    prop::collection::vec(record(), 0..60)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_pivot_has_all_columns(records in records()) {
        let labels = LabelRegistry::standard();
        let pivot = build_pivot(&records, labels);
        let ids: Vec<&str> = labels.ids().collect();
        prop_assert_eq!(pivot.columns().iter().map(String::as_str).collect::<Vec<_>>(), ids);
        for row in pivot.rows() {
            prop_assert_eq!(row.values.len(), 9);
        }
    }

    #[test]
    fn prop_rollups_equal_parts(records in records()) {
        let labels = LabelRegistry::standard();
        let pivot = build_pivot(&records, labels);
        for key in pivot.row_keys() {
            let get = |col: &str| pivot.get(key, col).unwrap_or(Number::ZERO);
            prop_assert_eq!(get(PAO), get(CA) + get(PCP) + get(TB) + get(VSP));
            prop_assert_eq!(get(PAO_DIT), get(PAO) + get(DIT));
            prop_assert_eq!(get(PAO_DZO_DIT), get(PAO_DIT) + get(DZO));
        }
    }

    #[test]
    fn prop_delta_is_revised_minus_baseline(records in records()) {
        let merged = merge_three_way(&records, LabelRegistry::standard());
        for row in merged.rows() {
            let fact = merged.section(row, Section::Fact);
            let staff = merged.section(row, Section::Staff);
            let delta = merged.section(row, Section::Delta);
            for i in 0..fact.len() {
                prop_assert_eq!(delta[i], staff[i] - fact[i]);
            }
        }
    }

    #[test]
    fn prop_total_row_is_column_sum(records in records()) {
        let merged = merge_three_way(&records, LabelRegistry::standard());
        let expected = merged.table().column_sums();
        let with_totals = append_totals(merged);

        let total = &with_totals.rows()[0];
        prop_assert_eq!(total.key.as_str(), TOTAL_LABEL);
        prop_assert_eq!(&total.values, &expected);
    }

    #[test]
    fn prop_rows_are_union_of_blocks(records in records()) {
        let merged = merge_three_way(&records, LabelRegistry::standard());
        let expected: BTreeSet<&str> = records
            .iter()
            .filter(|r| !matches!(r.status, RecordStatus::Other(_)))
            .map(|r| r.block_tag.as_str())
            .collect();
        let actual: BTreeSet<&str> = merged.table().row_keys().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_integer_inputs_stay_integer(records in records()) {
        let merged = append_totals(merge_three_way(&records, LabelRegistry::standard()));
        for row in merged.rows() {
            prop_assert!(row.values.iter().all(|v| matches!(v, Number::Int(_))));
        }
    }
}
