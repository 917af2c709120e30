use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rich_text::RichText;
use crate::ModelError;

/// Versioned, JSON-friendly representation of a cell value.
///
/// The enum uses an explicit `{type, value}` tagged layout for stable IPC.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Empty / unset cell value.
    Empty,
    /// Boolean.
    Boolean(bool),
    /// IEEE-754 double precision number. Dates, times and durations are
    /// stored as serial numbers of this kind.
    Number(f64),
    /// Spreadsheet error value.
    Error(ErrorValue),
    /// Plain string.
    Text(String),
    /// Styled text with per-run font overrides.
    RichText(RichText),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// Returns true if the value is [`CellValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The visible text of a plain or rich text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::RichText(rich) => Some(rich.plain_text()),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<ErrorValue> for CellValue {
    fn from(value: ErrorValue) -> Self {
        CellValue::Error(value)
    }
}

impl From<RichText> for CellValue {
    /// Rich text with no font overrides collapses to a plain string, the way
    /// a shared string with a single unformatted run does.
    fn from(value: RichText) -> Self {
        if value.is_plain() && value.phonetic.is_none() {
            CellValue::Text(value.text)
        } else {
            CellValue::RichText(value)
        }
    }
}

/// The spreadsheet error codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorValue {
    Div0,
    Na,
    Name,
    Null,
    Num,
    Ref,
    Value,
}

impl ErrorValue {
    pub const ALL: [ErrorValue; 7] = [
        ErrorValue::Div0,
        ErrorValue::Na,
        ErrorValue::Name,
        ErrorValue::Null,
        ErrorValue::Num,
        ErrorValue::Ref,
        ErrorValue::Value,
    ];

    /// Canonical display code, e.g. `#DIV/0!`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorValue::Div0 => "#DIV/0!",
            ErrorValue::Na => "#N/A",
            ErrorValue::Name => "#NAME?",
            ErrorValue::Null => "#NULL!",
            ErrorValue::Num => "#NUM!",
            ErrorValue::Ref => "#REF!",
            ErrorValue::Value => "#VALUE!",
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ErrorValue {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorValue::ALL
            .into_iter()
            .find(|e| e.code() == s)
            .ok_or_else(|| ModelError::InvalidParameter(format!("unknown error code {s:?}")))
    }
}
