//! Domain models for the Planpivot report pipeline.
//!
//! - [`Number`] - a report cell, integer or floating
//! - [`RecordStatus`] - which plan a record belongs to
//! - [`ValueDate`] - the planning date carried by each record
//! - [`RawRecord`] - one normalized input row

use std::fmt::{self, Write};
use std::iter::Sum;
use std::ops::{Add, Sub};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

// =============================================================================
// Numbers
// =============================================================================

/// A numeric report cell.
///
/// Integer inputs stay integers through every sum and difference so that the
/// JSON output carries `15`, not `15.0`. Any floating operand turns the
/// result into a float, and integer overflow promotes to float as well.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub const ZERO: Number = Number::Int(0);

    /// Parse a textual cell. Accepts `,` as decimal separator.
    pub fn parse(text: &str) -> Option<Number> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(Number::Int(i));
        }
        let normalized: String = trimmed
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        if let Ok(i) = normalized.parse::<i64>() {
            return Some(Number::Int(i));
        }
        normalized.parse::<f64>().ok().map(Number::Float)
    }

    /// Build a number from a float, keeping integral values integral.
    pub fn from_f64(value: f64) -> Number {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            Number::Int(value as i64)
        } else {
            Number::Float(value)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(f) => f.is_finite(),
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::ZERO
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 + b as f64)),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 - b as f64)),
            (a, b) => Number::Float(a.as_f64() - b.as_f64()),
        }
    }
}

impl Sum for Number {
    fn sum<I: Iterator<Item = Number>>(iter: I) -> Number {
        iter.fold(Number::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Number> for Number {
    fn sum<I: Iterator<Item = &'a Number>>(iter: I) -> Number {
        iter.copied().sum()
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(i64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Number::Int(i) => serializer.serialize_i64(i),
            Number::Float(f) => serializer.serialize_f64(f),
        }
    }
}

// =============================================================================
// Status
// =============================================================================

/// Plan a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// `Status = 0`: the approved plan.
    Baseline,
    /// `Status = 1`: the revised plan proposed by the blocks.
    Revised,
    /// Anything else. Excluded from both aggregates.
    Other(String),
}

impl RecordStatus {
    /// Coerce a status cell. Accepts `0`, `"0"`, `0.0` and the same for `1`.
    pub fn from_text(text: &str) -> RecordStatus {
        let trimmed = text.trim();
        match Number::parse(trimmed) {
            Some(n) if n == Number::Int(0) || n == Number::Float(0.0) => RecordStatus::Baseline,
            Some(n) if n == Number::Int(1) || n == Number::Float(1.0) => RecordStatus::Revised,
            _ => RecordStatus::Other(trimmed.to_string()),
        }
    }

    pub fn from_number(n: Number) -> RecordStatus {
        match n.as_f64() {
            x if x == 0.0 => RecordStatus::Baseline,
            x if x == 1.0 => RecordStatus::Revised,
            _ => RecordStatus::Other(n.to_string()),
        }
    }
}

// =============================================================================
// Value date
// =============================================================================

/// The planning date of a record, as found in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValueDate {
    Date(NaiveDate),
    Text(String),
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M:%S"];

impl ValueDate {
    /// Interpret a textual date, falling back to the raw text.
    pub fn parse(text: &str) -> Option<ValueDate> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Some(ValueDate::Date(date));
            }
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(ValueDate::Date(dt.date()));
            }
        }
        Some(ValueDate::Text(trimmed.to_string()))
    }

    /// Text used in report headers.
    ///
    /// Fails when `format` is not a valid chrono format for a date.
    pub fn display(&self, format: &str) -> Result<String, fmt::Error> {
        match self {
            ValueDate::Date(date) => {
                let mut text = String::new();
                write!(text, "{}", date.format(format))?;
                Ok(text)
            }
            ValueDate::Text(text) => Ok(text.clone()),
        }
    }
}

impl fmt::Display for ValueDate {
    /// ISO dates, raw text otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueDate::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            ValueDate::Text(text) => f.write_str(text),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// One input row after normalization.
///
/// Rows without `Org_Tag` or `Block_Tag` never become records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub status: RecordStatus,
    pub value: Number,
    pub value_date: Option<ValueDate>,
    pub org_tag: String,
    pub block_tag: String,
}

impl RawRecord {
    pub fn new(
        status: RecordStatus,
        value: impl Into<Number>,
        org_tag: impl Into<String>,
        block_tag: impl Into<String>,
    ) -> Self {
        Self {
            status,
            value: value.into(),
            value_date: None,
            org_tag: org_tag.into(),
            block_tag: block_tag.into(),
        }
    }

    pub fn with_date(mut self, date: ValueDate) -> Self {
        self.value_date = Some(date);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic_stays_integer() {
        let sum = Number::Int(10) + Number::Int(5);
        assert_eq!(sum, Number::Int(15));
        assert_eq!(Number::Int(5) - Number::Int(20), Number::Int(-15));
    }

    #[test]
    fn test_float_operand_makes_float() {
        assert_eq!(Number::Int(1) + Number::Float(0.5), Number::Float(1.5));
        assert_eq!(Number::Float(2.5) - Number::Int(1), Number::Float(1.5));
    }

    #[test]
    fn test_overflow_promotes_to_float() {
        let sum = Number::Int(i64::MAX) + Number::Int(1);
        assert!(matches!(sum, Number::Float(_)));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(Number::parse("42"), Some(Number::Int(42)));
        assert_eq!(Number::parse(" -3 "), Some(Number::Int(-3)));
        assert_eq!(Number::parse("1,5"), Some(Number::Float(1.5)));
        assert_eq!(Number::parse("2.25"), Some(Number::Float(2.25)));
        assert_eq!(Number::parse("1 000"), Some(Number::Int(1000)));
        assert_eq!(Number::parse(""), None);
        assert_eq!(Number::parse("abc"), None);
    }

    #[test]
    fn test_from_f64_keeps_integral_values() {
        assert_eq!(Number::from_f64(3.0), Number::Int(3));
        assert_eq!(Number::from_f64(3.5), Number::Float(3.5));
    }

    #[test]
    fn test_serialize_keeps_kind() {
        assert_eq!(serde_json::to_string(&Number::Int(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Number::Float(7.5)).unwrap(), "7.5");
    }

    #[test]
    fn test_status_coercion() {
        assert_eq!(RecordStatus::from_text("0"), RecordStatus::Baseline);
        assert_eq!(RecordStatus::from_text(" 1 "), RecordStatus::Revised);
        assert_eq!(RecordStatus::from_text("1.0"), RecordStatus::Revised);
        assert_eq!(RecordStatus::from_text("2"), RecordStatus::Other("2".into()));
        assert_eq!(RecordStatus::from_number(Number::Float(0.0)), RecordStatus::Baseline);
        assert_eq!(RecordStatus::from_number(Number::Int(3)), RecordStatus::Other("3".into()));
    }

    #[test]
    fn test_value_date_parsing() {
        let expected = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(ValueDate::parse("2021-01-01"), Some(ValueDate::Date(expected)));
        assert_eq!(ValueDate::parse("01.01.2021"), Some(ValueDate::Date(expected)));
        assert_eq!(ValueDate::parse("2021-01-01 00:00:00"), Some(ValueDate::Date(expected)));
        assert_eq!(ValueDate::parse("Q1 2021"), Some(ValueDate::Text("Q1 2021".into())));
        assert_eq!(ValueDate::parse("  "), None);
    }

    #[test]
    fn test_value_date_display() {
        let date = ValueDate::parse("2021-03-15").unwrap();
        assert_eq!(date.display("%d.%m.%Y").unwrap(), "15.03.2021");
        assert_eq!(date.to_string(), "2021-03-15");
        assert_eq!(ValueDate::Text("Q1".into()).display("%Y").unwrap(), "Q1");
    }

    #[test]
    fn test_value_date_display_rejects_bad_format() {
        let date = ValueDate::parse("2021-03-15").unwrap();
        assert!(date.display("%Q").is_err());
        // time fields do not exist on a plain date
        assert!(date.display("%H:%M").is_err());
    }
}
