//! Label Registry - ordered mapping between display labels and column ids.
//!
//! Input tables name organizational units by their source-language label
//! (`ЦА`, `ДИТ`, ...). Internally every column is addressed by a stable
//! transliterated id (`CA`, `DIT`, ...). The registry's entry order is the
//! column order of every table the report produces.
//!
//! ```text
//! PAO_DZO_DIT  ПАО+ДЗО+ДИТ   = PAO_DIT + DZO
//! PAO_DIT      ПАО+ДИТ       = PAO + DIT
//! PAO          ПАО           = CA + PCP + TB + VSP
//! CA           ЦА
//! PCP          ПЦП
//! TB           ТБ
//! VSP          ВСП
//! DIT          ДИТ
//! DZO          ДЗО
//! ```
//!
//! The registry is an immutable value passed explicitly to the pivot builder
//! and the serializers. [`LabelRegistry::standard`] gives the built-in set;
//! [`LabelRegistry::from_json`] loads an alternative (for example with
//! different display labels or a different column order).

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const PAO_DZO_DIT: &str = "PAO_DZO_DIT";
pub const PAO_DIT: &str = "PAO_DIT";
pub const PAO: &str = "PAO";
pub const CA: &str = "CA";
pub const PCP: &str = "PCP";
pub const TB: &str = "TB";
pub const VSP: &str = "VSP";
pub const DIT: &str = "DIT";
pub const DZO: &str = "DZO";

/// Units that come straight from `Org_Tag` values.
pub const BASE_UNITS: [&str; 6] = [CA, PCP, TB, VSP, DIT, DZO];

/// Roll-up columns, in the order they must be computed.
pub const DERIVED_UNITS: [&str; 3] = [PAO, PAO_DIT, PAO_DZO_DIT];

const STANDARD_ENTRIES: [(&str, &str); 9] = [
    (PAO_DZO_DIT, "ПАО+ДЗО+ДИТ"),
    (PAO_DIT, "ПАО+ДИТ"),
    (PAO, "ПАО"),
    (CA, "ЦА"),
    (PCP, "ПЦП"),
    (TB, "ТБ"),
    (VSP, "ВСП"),
    (DIT, "ДИТ"),
    (DZO, "ДЗО"),
];

static STANDARD: Lazy<LabelRegistry> = Lazy::new(|| LabelRegistry {
    entries: STANDARD_ENTRIES
        .iter()
        .map(|(id, label)| LabelEntry::new(*id, *label))
        .collect(),
});

/// One column: stable id plus display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub id: String,
    pub label: String,
}

impl LabelEntry {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Ordered bijection between column ids and display labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelRegistry {
    entries: Vec<LabelEntry>,
}

impl LabelRegistry {
    /// The built-in registry.
    pub fn standard() -> &'static LabelRegistry {
        &STANDARD
    }

    /// Build a registry, checking it covers exactly the report columns.
    ///
    /// Every base and derived id must appear once, and labels must be unique,
    /// so that translation works in both directions.
    pub fn new(entries: Vec<LabelEntry>) -> ConfigResult<Self> {
        let mut ids = HashSet::new();
        let mut labels = HashSet::new();

        for entry in &entries {
            if !ids.insert(entry.id.as_str()) {
                return Err(ConfigError::InvalidLabels(format!("duplicate id '{}'", entry.id)));
            }
            if !labels.insert(entry.label.as_str()) {
                return Err(ConfigError::InvalidLabels(format!(
                    "duplicate label '{}'",
                    entry.label
                )));
            }
        }

        let expected: HashSet<&str> = BASE_UNITS.iter().chain(DERIVED_UNITS.iter()).copied().collect();
        let mut missing: Vec<&str> = expected.difference(&ids).copied().collect();
        let mut unknown: Vec<&str> = ids.difference(&expected).copied().collect();
        if !missing.is_empty() || !unknown.is_empty() {
            missing.sort_unstable();
            unknown.sort_unstable();
            return Err(ConfigError::InvalidLabels(format!(
                "missing ids [{}], unknown ids [{}]",
                missing.join(", "),
                unknown.join(", ")
            )));
        }

        Ok(Self { entries })
    }

    /// Parse a registry from a JSON array of `{ "id", "label" }` objects.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let entries: Vec<LabelEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// Load a registry file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    /// Column ids in canonical order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    /// Display labels in canonical order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Canonical position of a column id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn id_for_label(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.id.as_str())
    }

    pub fn label_for_id(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.label.as_str())
    }

    /// Resolve an `Org_Tag` value, given either as label or as id.
    pub fn resolve_tag(&self, tag: &str) -> Option<&str> {
        let tag = tag.trim();
        self.id_for_label(tag).or_else(|| {
            self.entries
                .iter()
                .find(|e| e.id.eq_ignore_ascii_case(tag))
                .map(|e| e.id.as_str())
        })
    }
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self::standard().clone()
    }
}

pub fn is_base_unit(id: &str) -> bool {
    BASE_UNITS.contains(&id)
}
