// Input coercion for raw form fields
// Form fields arrive either typed or as text; these helpers normalize them into the
// canonical value the schema validates, without applying any bounds themselves
//
// Numan Thabit 2025 Nov

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount as typed into the form: already numeric, or raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl From<f64> for AmountInput {
    fn from(value: f64) -> Self {
        AmountInput::Number(value)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Text(value.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(value: String) -> Self {
        AmountInput::Text(value)
    }
}

/// Date as picked in the form: a calendar date, or raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Text(String),
    Date(NaiveDate),
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Date(value)
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDate(pub String);

impl fmt::Display for InvalidDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unparseable date: {:?}", self.0)
    }
}

impl std::error::Error for InvalidDate {}

/// Text that does not parse as a finite number becomes 0, which the
/// minimum-value rule then rejects.
pub fn coerce_amount(input: &AmountInput) -> f64 {
    match input {
        AmountInput::Number(value) => *value,
        AmountInput::Text(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
    }
}

/// Missing or blank text means "not filled yet" and yields `Ok(None)`.
pub fn coerce_date(input: Option<&DateInput>) -> Result<Option<NaiveDate>, InvalidDate> {
    match input {
        None => Ok(None),
        Some(DateInput::Date(date)) => Ok(Some(*date)),
        Some(DateInput::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            parse_date_text(text)
                .map(Some)
                .ok_or_else(|| InvalidDate(text.to_string()))
        }
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    // Timestamps with an offset are read in the user's local calendar.
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.with_timezone(&Local).date_naive());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|stamp| stamp.date())
}
