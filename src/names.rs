use serde::{Deserialize, Serialize};

use crate::reference::RangeReference;
use crate::ModelError;

/// Maximum length of a defined name in characters.
pub const DEFINED_NAME_MAX_LEN: usize = 255;

/// Maximum length of a sheet title in characters.
pub const SHEET_TITLE_MAX_LEN: usize = 31;

const SHEET_TITLE_FORBIDDEN: [char; 7] = ['*', ':', '/', '\\', '?', '[', ']'];

/// A named rectangular region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    pub name: String,
    pub target: RangeReference,
}

impl NamedRange {
    /// Construct a named range, validating the name.
    pub fn new(name: impl Into<String>, target: RangeReference) -> Result<Self, ModelError> {
        let name = name.into();
        validate_defined_name(&name)?;
        Ok(Self { name, target })
    }
}

fn looks_like_a1_cell_reference(name: &str) -> bool {
    let bytes = name.as_bytes();

    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }

    // Columns are 1-3 letters.
    if i == 0 || i > 3 {
        return false;
    }

    let digit_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }

    // Must end with digits and contain at least one digit.
    digit_start != i && i == bytes.len()
}

fn looks_like_r1c1_cell_reference(name: &str) -> bool {
    if name.eq_ignore_ascii_case("r") || name.eq_ignore_ascii_case("c") {
        return true;
    }

    let bytes = name.as_bytes();
    if bytes.first().copied().map(|b| b.to_ascii_uppercase()) != Some(b'R') {
        return false;
    }

    let mut i = 1;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }

    if i >= bytes.len() || bytes[i].to_ascii_uppercase() != b'C' {
        return false;
    }

    i += 1;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }

    i == bytes.len()
}

fn looks_like_cell_reference(name: &str) -> bool {
    looks_like_a1_cell_reference(name) || looks_like_r1c1_cell_reference(name)
}

/// Validate a defined (named-range) name.
///
/// Rules:
/// - must not be empty
/// - must be <= [`DEFINED_NAME_MAX_LEN`] characters
/// - must start with a letter, `_`, or `\`
/// - remaining characters may be letters, digits, `_`, or `.`
/// - must not match an A1 or R1C1-style cell reference (e.g. `A1`, `R1C1`)
pub fn validate_defined_name(name: &str) -> Result<(), ModelError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ModelError::InvalidParameter(
            "defined name cannot be empty".to_string(),
        ));
    }

    let len = name.chars().count();
    if len > DEFINED_NAME_MAX_LEN {
        return Err(ModelError::InvalidParameter(format!(
            "defined name is too long ({len} > {DEFINED_NAME_MAX_LEN})"
        )));
    }

    if looks_like_cell_reference(name) {
        return Err(ModelError::InvalidParameter(format!(
            "defined name {name:?} looks like a cell reference"
        )));
    }

    let mut chars = name.chars();
    let first = chars.next().expect("name was checked non-empty");
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err(ModelError::InvalidParameter(format!(
            "invalid first character {first:?} in defined name (must be a letter, '_' or '\\')"
        )));
    }

    for (index, ch) in name.chars().enumerate().skip(1) {
        if !(ch.is_alphabetic() || ch.is_ascii_digit() || ch == '_' || ch == '.') {
            return Err(ModelError::InvalidParameter(format!(
                "invalid character {ch:?} at index {index} in defined name"
            )));
        }
    }

    Ok(())
}

/// Validate a sheet title: non-empty, at most [`SHEET_TITLE_MAX_LEN`]
/// characters, and none of `* : / \ ? [ ]`. Uniqueness is the workbook's
/// concern.
pub fn validate_sheet_title(title: &str) -> Result<(), ModelError> {
    if title.is_empty() {
        return Err(ModelError::InvalidSheetTitle(
            "sheet title cannot be empty".to_string(),
        ));
    }
    let len = title.chars().count();
    if len > SHEET_TITLE_MAX_LEN {
        return Err(ModelError::InvalidSheetTitle(format!(
            "sheet title is too long ({len} > {SHEET_TITLE_MAX_LEN})"
        )));
    }
    if let Some(ch) = title.chars().find(|c| SHEET_TITLE_FORBIDDEN.contains(c)) {
        return Err(ModelError::InvalidSheetTitle(format!(
            "sheet title contains forbidden character {ch:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_name_rules() {
        for name in ["Totals", "_scratch", "\\escape", "region.north", "données"] {
            assert!(validate_defined_name(name).is_ok(), "{name:?}");
        }
        for name in ["", "1abc", "has space", "a-b", "A1", "XFD1048576", "R1C1", "r", "C"] {
            assert!(validate_defined_name(name).is_err(), "{name:?}");
        }
        // Four letters followed by digits is not a column, so it is allowed.
        assert!(validate_defined_name("ABCD1").is_ok());

        let long = "n".repeat(DEFINED_NAME_MAX_LEN + 1);
        assert!(validate_defined_name(&long).is_err());
    }

    #[test]
    fn sheet_title_rules() {
        assert!(validate_sheet_title("Sheet1").is_ok());
        assert!(validate_sheet_title(&"x".repeat(31)).is_ok());

        assert!(validate_sheet_title("").is_err());
        assert!(validate_sheet_title(&"x".repeat(32)).is_err());
        for title in ["a*b", "a:b", "a/b", "a\\b", "a?b", "a[b", "a]b"] {
            assert!(validate_sheet_title(title).is_err(), "{title:?}");
        }
    }
}
