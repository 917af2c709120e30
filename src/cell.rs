use std::sync::OnceLock;

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::reference::{CellReference, MAX_COLUMNS, MAX_ROWS};
use crate::style::NumberFormat;
use crate::value::{CellValue, ErrorValue};
use crate::ModelError;

/// Longest string a cell stores; longer input is truncated.
pub const MAX_STRING_LENGTH: usize = 32_767;

const COLUMN_BITS: u32 = 15; // 1-based columns go up to 16,384 = 1 << 14.
const COLUMN_MASK: u64 = (1u64 << COLUMN_BITS) - 1;

/// Compact key used for sparse cell storage.
///
/// The key is a packed 1-based `(row, column)` pair in a `u64`:
///
/// ```text
/// key = (row << 15) | column
/// ```
///
/// Keys order row-major, so iterating a sorted map walks the sheet top to
/// bottom, left to right. The packed value stays within 36 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct CellKey(u64);

impl CellKey {
    /// Encode a 1-based `(row, column)` coordinate.
    #[inline]
    pub fn new(row: u32, column: u32) -> Self {
        assert!(
            (1..=MAX_ROWS).contains(&row),
            "row out of worksheet bounds: {row}"
        );
        assert!(
            (1..=MAX_COLUMNS).contains(&column),
            "column out of worksheet bounds: {column}"
        );
        Self(((row as u64) << COLUMN_BITS) | (column as u64))
    }

    /// Decode the row component (1-based).
    #[inline]
    pub const fn row(self) -> u32 {
        (self.0 >> COLUMN_BITS) as u32
    }

    /// Decode the column component (1-based).
    #[inline]
    pub const fn column(self) -> u32 {
        (self.0 & COLUMN_MASK) as u32
    }

    /// Raw packed value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Convert to a relative [`CellReference`].
    #[inline]
    pub fn to_reference(self) -> CellReference {
        CellReference {
            column: self.column(),
            row: self.row(),
            column_absolute: false,
            row_absolute: false,
        }
    }
}

impl From<CellKey> for u64 {
    fn from(value: CellKey) -> Self {
        value.0
    }
}

impl From<CellReference> for CellKey {
    fn from(value: CellReference) -> Self {
        Self::new(value.row, value.column)
    }
}

impl<'de> Deserialize<'de> for CellKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u64::deserialize(deserializer)?;
        let row = raw >> COLUMN_BITS;
        let column = raw & COLUMN_MASK;
        if row == 0 || row > MAX_ROWS as u64 {
            return Err(D::Error::custom(format!(
                "cell key row out of worksheet bounds: {row}"
            )));
        }
        if column == 0 || column > MAX_COLUMNS as u64 {
            return Err(D::Error::custom(format!(
                "cell key column out of worksheet bounds: {column}"
            )));
        }
        Ok(CellKey(raw))
    }
}

/// A note attached to a cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// A link attached to a cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Link target (URL or internal reference text).
    pub target: String,
    /// Text shown in the cell, when it differs from the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A single cell record.
///
/// Cells are stored sparsely: a cell with no value, formula, format, comment
/// or hyperlink is "truly empty" and gets dropped from the worksheet map by
/// garbage collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Cell {
    /// The cell's literal value.
    #[serde(default)]
    pub value: CellValue,

    /// Formula text without the leading `=`, if the cell contains a formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Index into the workbook stylesheet's format table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Comment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<Hyperlink>,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Returns true if this cell has no observable content or formatting.
    ///
    /// Such cells should not be stored in the sparse map.
    pub fn is_truly_empty(&self) -> bool {
        self.value == CellValue::Empty
            && self.formula.is_none()
            && self.format_id.is_none()
            && self.comment.is_none()
            && self.hyperlink.is_none()
    }

    /// Set a text value, validating and truncating per [`check_string`].
    pub fn set_text(&mut self, text: &str) -> Result<(), ModelError> {
        self.value = CellValue::Text(check_string(text)?);
        Ok(())
    }

    /// Store formula text. A leading `=` is stripped; empty or
    /// whitespace-only text is a no-op that leaves the formula untouched.
    pub fn set_formula(&mut self, formula: &str) {
        if let Some(body) = normalize_formula(formula) {
            self.formula = Some(body);
        }
    }

    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    pub fn clear_formula(&mut self) {
        self.formula = None;
    }

    /// Set an error value from its display code, e.g. `#DIV/0!`.
    pub fn set_error(&mut self, code: &str) -> Result<(), ModelError> {
        self.value = CellValue::Error(code.parse()?);
        Ok(())
    }

    /// The cell's error value; reading a non-error cell is an attribute error.
    pub fn error(&self) -> Result<ErrorValue, ModelError> {
        match self.value {
            CellValue::Error(e) => Ok(e),
            _ => Err(ModelError::InvalidAttribute(
                "cell does not hold an error value".to_string(),
            )),
        }
    }

    /// Attach a hyperlink. The target must be non-empty.
    pub fn set_hyperlink(&mut self, target: &str) -> Result<(), ModelError> {
        if target.trim().is_empty() {
            return Err(ModelError::InvalidParameter(
                "hyperlink target must be non-empty".to_string(),
            ));
        }
        self.hyperlink = Some(Hyperlink {
            target: target.to_string(),
            display: None,
        });
        Ok(())
    }

    /// Copy another cell's content (value and formula) without touching
    /// formatting, comments or links.
    pub fn copy_value_from(&mut self, other: &Cell) {
        self.value = other.value.clone();
        self.formula = other.formula.clone();
    }
}

/// Validate a string headed for cell storage.
///
/// Control characters below `0x20` other than tab, newline and carriage
/// return are rejected. Strings longer than [`MAX_STRING_LENGTH`] characters
/// are silently truncated.
pub fn check_string(text: &str) -> Result<String, ModelError> {
    for c in text.chars() {
        if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') {
            return Err(ModelError::IllegalCharacter(c as u32));
        }
    }
    if text.chars().count() > MAX_STRING_LENGTH {
        return Ok(text.chars().take(MAX_STRING_LENGTH).collect());
    }
    Ok(text.to_string())
}

fn normalize_formula(formula: &str) -> Option<String> {
    let trimmed = formula.trim();
    let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
    if body.is_empty() {
        return None;
    }
    Some(body.to_string())
}

/// Result of interpreting raw text input the way a formula bar entry works.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedInput {
    pub value: CellValue,
    /// Formula body when the input started with `=` and had more after it.
    pub formula: Option<String>,
    /// Number format implied by the input's shape (`0%` for percentages,
    /// a time format for clock text).
    pub implied_format: Option<NumberFormat>,
}

impl ParsedInput {
    fn value(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            formula: None,
            implied_format: None,
        }
    }
}

fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?(%?)$").unwrap()
    })
}

/// Interpret raw text input, inferring its type.
///
/// The chain runs in order: empty text and a lone `=` stay text, `=…` becomes
/// a formula, then booleans, numbers (including `%` suffix and scientific
/// notation), clock times, error codes, and finally plain text validated by
/// [`check_string`].
pub fn parse_input(text: &str) -> Result<ParsedInput, ModelError> {
    if text.is_empty() || text == "=" {
        return Ok(ParsedInput::value(text));
    }

    if let Some(body) = text.strip_prefix('=') {
        if let Some(formula) = normalize_formula(body) {
            return Ok(ParsedInput {
                value: CellValue::Empty,
                formula: Some(formula),
                implied_format: None,
            });
        }
        // "= " and friends fall back to text like a lone "=".
        return Ok(ParsedInput::value(check_string(text)?));
    }

    if text.eq_ignore_ascii_case("true") {
        return Ok(ParsedInput::value(true));
    }
    if text.eq_ignore_ascii_case("false") {
        return Ok(ParsedInput::value(false));
    }

    if let Some(captures) = number_pattern().captures(text) {
        let percent = !captures[4].is_empty();
        let digits = &text[..text.len() - usize::from(percent)];
        if let Ok(number) = digits.parse::<f64>() {
            return Ok(ParsedInput {
                value: CellValue::Number(if percent { number / 100.0 } else { number }),
                formula: None,
                implied_format: percent.then(NumberFormat::percentage),
            });
        }
    }

    if let Some(time) = crate::datetime::Time::parse(text) {
        return Ok(ParsedInput {
            value: CellValue::Number(time.to_number()),
            formula: None,
            implied_format: Some(NumberFormat::time()),
        });
    }

    if text.starts_with('#') {
        if let Ok(error) = text.parse::<ErrorValue>() {
            return Ok(ParsedInput::value(error));
        }
    }

    Ok(ParsedInput::value(check_string(text)?))
}
