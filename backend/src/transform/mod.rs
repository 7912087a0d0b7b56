//! Report transformation.
//!
//! - Pivot: records of one plan to a block × unit table
//! - Merge: baseline, revised and delta side by side
//! - Totals: synthetic `Total` row
//! - Pipeline: end-to-end entry points

pub mod merge;
pub mod pipeline;
pub mod pivot;
pub mod totals;

#[cfg(test)]
mod props;

pub use merge::{merge_three_way, MergedTable, Section};
pub use pipeline::*;
pub use pivot::build_pivot;
pub use totals::{append_totals, TOTAL_LABEL};
