//! Report serializers.
//!
//! - [`nested`] - nested JSON view for the UI table widget
//! - [`xlsx`] - two-level-header spreadsheet
//!
//! Both receive the merged table with its totals row already in place and
//! share the header texts defined here.

pub mod nested;
pub mod xlsx;

use crate::transform::merge::Section;

/// Header of the block column.
pub const BLOCK_TITLE: &str = "Блок";

/// Header text of a section, with the report date filled in.
pub fn section_title(section: Section, date: &str) -> String {
    match section {
        Section::Fact => format!("{date} УТВЕРЖДЁННЫЙ БП (ПЛАН + ПРИКАЗЫ)"),
        Section::Staff => format!(
            "{date} СКОРР. ПЛАН (ПРЕДЛОЖЕНИЯ БЛОКОВ - численность загружена в АС Simplex)"
        ),
        Section::Delta => format!("Дельта {date} СКОРР. ПЛАН - {date} УТВЕРЖДЁННЫЙ БП"),
    }
}

pub use nested::{build_nested_view, to_json, to_json_pretty, NestedView};
pub use xlsx::write_workbook;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_titles_embed_date() {
        assert_eq!(
            section_title(Section::Fact, "2021-01-01"),
            "2021-01-01 УТВЕРЖДЁННЫЙ БП (ПЛАН + ПРИКАЗЫ)"
        );
        assert_eq!(
            section_title(Section::Delta, "D"),
            "Дельта D СКОРР. ПЛАН - D УТВЕРЖДЁННЫЙ БП"
        );
        assert!(section_title(Section::Staff, "D").starts_with("D СКОРР. ПЛАН"));
    }
}
