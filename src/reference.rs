use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Maximum rows per worksheet (1,048,576).
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum columns per worksheet (16,384, column `XFD`).
pub const MAX_COLUMNS: u32 = 16_384;

/// Convert 1-based column letters to a 1-based index (`A` = 1, `Z` = 26,
/// `AA` = 27, …, `XFD` = 16384).
///
/// The scheme is bijective base-26 with no zero digit, so
/// [`column_letters_from_index`] is its exact inverse for every valid index.
pub fn column_index_from_letters(letters: &str) -> Result<u32, ModelError> {
    if letters.is_empty() || letters.len() > 3 {
        return Err(ModelError::InvalidCellReference(format!(
            "column must be 1-3 letters, got {letters:?}"
        )));
    }
    let mut index: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(ModelError::InvalidCellReference(format!(
                "invalid column letter in {letters:?}"
            )));
        }
        let digit = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        index = index * 26 + digit;
    }
    if index > MAX_COLUMNS {
        return Err(ModelError::InvalidCellReference(format!(
            "column {letters:?} is beyond XFD"
        )));
    }
    Ok(index)
}

/// Convert a 1-based column index to its letters.
pub fn column_letters_from_index(index: u32) -> Result<String, ModelError> {
    if index == 0 || index > MAX_COLUMNS {
        return Err(ModelError::InvalidCellReference(format!(
            "column index {index} out of range 1..={MAX_COLUMNS}"
        )));
    }
    let mut n = index;
    let mut out = Vec::<u8>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    Ok(String::from_utf8(out).expect("column letters are always valid UTF-8"))
}

/// A reference to a single cell within a worksheet.
///
/// Rows and columns are **1-indexed**, matching A1 notation: `A1` is
/// `(column 1, row 1)`. Each axis carries an independent absolute (`$`) flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellReference {
    /// 1-indexed column (1..=16384).
    pub column: u32,
    /// 1-indexed row (1..=1,048,576).
    pub row: u32,
    /// Column is anchored (`$A1`).
    #[serde(default, skip_serializing_if = "is_false")]
    pub column_absolute: bool,
    /// Row is anchored (`A$1`).
    #[serde(default, skip_serializing_if = "is_false")]
    pub row_absolute: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl CellReference {
    /// Construct a relative reference, validating both coordinates.
    pub fn new(column: u32, row: u32) -> Result<Self, ModelError> {
        if column == 0 || column > MAX_COLUMNS {
            return Err(ModelError::InvalidCellReference(format!(
                "column {column} out of range 1..={MAX_COLUMNS}"
            )));
        }
        if row == 0 || row > MAX_ROWS {
            return Err(ModelError::InvalidCellReference(format!(
                "row {row} out of range 1..={MAX_ROWS}"
            )));
        }
        Ok(Self {
            column,
            row,
            column_absolute: false,
            row_absolute: false,
        })
    }

    /// Parse an A1-style reference: optional `$`, 1-3 letters, optional `$`,
    /// 1+ digits (e.g. `A1`, `$B$2`, `xfd1048576`).
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let malformed =
            || ModelError::InvalidCellReference(format!("malformed cell reference {text:?}"));

        let bytes = text.as_bytes();
        let mut idx = 0usize;

        let column_absolute = bytes.get(idx) == Some(&b'$');
        if column_absolute {
            idx += 1;
        }

        let col_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
            idx += 1;
        }
        if idx == col_start {
            return Err(malformed());
        }
        let column = column_index_from_letters(&text[col_start..idx])?;

        let row_absolute = bytes.get(idx) == Some(&b'$');
        if row_absolute {
            idx += 1;
        }

        let row_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx == row_start || idx != bytes.len() {
            return Err(malformed());
        }
        let row: u32 = text[row_start..].parse().map_err(|_| malformed())?;
        if row == 0 || row > MAX_ROWS {
            return Err(ModelError::InvalidCellReference(format!(
                "row {row} out of range 1..={MAX_ROWS}"
            )));
        }

        Ok(Self {
            column,
            row,
            column_absolute,
            row_absolute,
        })
    }

    /// Column letters for this reference.
    pub fn column_letters(&self) -> String {
        column_letters_from_index(self.column).expect("column index is validated on construction")
    }

    /// A copy of this reference with both absolute flags cleared.
    pub fn to_relative(mut self) -> Self {
        self.column_absolute = false;
        self.row_absolute = false;
        self
    }

    /// A new reference offset by the given signed deltas, bounds-checked.
    pub fn make_offset(&self, column_delta: i64, row_delta: i64) -> Result<Self, ModelError> {
        let column = i64::from(self.column) + column_delta;
        let row = i64::from(self.row) + row_delta;
        if column < 1 || column > i64::from(MAX_COLUMNS) || row < 1 || row > i64::from(MAX_ROWS) {
            return Err(ModelError::OutOfBounds(format!(
                "offset of {self} by ({column_delta}, {row_delta}) leaves the sheet"
            )));
        }
        Ok(Self {
            column: column as u32,
            row: row as u32,
            column_absolute: self.column_absolute,
            row_absolute: self.row_absolute,
        })
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column_absolute {
            f.write_str("$")?;
        }
        f.write_str(&self.column_letters())?;
        if self.row_absolute {
            f.write_str("$")?;
        }
        write!(f, "{}", self.row)
    }
}

/// A rectangular region within a worksheet.
///
/// The range is inclusive and always normalized so that `start` is the
/// top-left corner and `end` the bottom-right corner, regardless of the
/// corner order given at construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeReference {
    pub start: CellReference,
    pub end: CellReference,
}

impl RangeReference {
    /// Construct a new range, normalizing corner order if needed.
    pub fn new(a: CellReference, b: CellReference) -> Self {
        let start = CellReference {
            column: a.column.min(b.column),
            row: a.row.min(b.row),
            column_absolute: false,
            row_absolute: false,
        };
        let end = CellReference {
            column: a.column.max(b.column),
            row: a.row.max(b.row),
            column_absolute: false,
            row_absolute: false,
        };
        Self { start, end }
    }

    /// A single-cell range.
    pub fn single(cell: CellReference) -> Self {
        Self::new(cell, cell)
    }

    /// Parse `A1:B2` or a single-cell reference like `C3`.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        match text.split_once(':') {
            None => {
                let cell = CellReference::parse(text)?;
                Ok(Self::new(cell, cell))
            }
            Some((a, b)) => Ok(Self::new(
                CellReference::parse(a)?,
                CellReference::parse(b)?,
            )),
        }
    }

    /// Returns true if `cell` lies within this range.
    pub fn contains(&self, cell: CellReference) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.column >= self.start.column
            && cell.column <= self.end.column
    }

    /// Number of columns in the range.
    pub fn width(&self) -> u32 {
        self.end.column - self.start.column + 1
    }

    /// Number of rows in the range.
    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Returns true if the range is exactly one cell.
    pub fn is_single_cell(&self) -> bool {
        self.start.column == self.end.column && self.start.row == self.end.row
    }

    /// Returns true if this range shares at least one cell with `other`.
    pub fn overlaps(&self, other: &RangeReference) -> bool {
        self.start.column <= other.end.column
            && other.start.column <= self.end.column
            && self.start.row <= other.end.row
            && other.start.row <= self.end.row
    }
}

impl fmt::Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.to_relative(), self.end.to_relative())
    }
}

/// Shift a 1-based coordinate for an insertion of `count` units before
/// index `before`.
pub(crate) fn shift_for_insert(coordinate: u32, before: u32, count: u32) -> u32 {
    if coordinate >= before {
        coordinate + count
    } else {
        coordinate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_conversion_is_a_bijection() {
        for (letters, index) in [("A", 1), ("Z", 26), ("AA", 27), ("AZ", 52), ("XFD", 16_384)] {
            assert_eq!(column_index_from_letters(letters).unwrap(), index);
            assert_eq!(column_letters_from_index(index).unwrap(), letters);
        }
        for index in 1..=MAX_COLUMNS {
            let letters = column_letters_from_index(index).unwrap();
            assert_eq!(column_index_from_letters(&letters).unwrap(), index);
        }
    }

    #[test]
    fn column_conversion_rejects_out_of_range() {
        assert!(column_index_from_letters("").is_err());
        assert!(column_index_from_letters("XFE").is_err());
        assert!(column_index_from_letters("AAAA").is_err());
        assert!(column_index_from_letters("A1").is_err());
        assert!(column_letters_from_index(0).is_err());
        assert!(column_letters_from_index(MAX_COLUMNS + 1).is_err());
    }

    #[test]
    fn parse_display_round_trip() {
        for text in ["A1", "$A1", "A$1", "$A$1", "BC32", "XFD1048576"] {
            let parsed = CellReference::parse(text).unwrap();
            assert_eq!(parsed.to_string(), text);
            assert_eq!(CellReference::parse(&parsed.to_string()).unwrap(), parsed);
        }
        assert_eq!(
            CellReference::parse("bc32").unwrap().to_relative(),
            CellReference::new(55, 32).unwrap()
        );
    }

    #[test]
    fn parse_rejects_malformed_text() {
        for text in ["", "A", "1", "A0", "$$A1", "A1A", "A 1", "A1:", "XFE1", "A1048577"] {
            assert!(
                matches!(
                    CellReference::parse(text),
                    Err(ModelError::InvalidCellReference(_))
                ),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn ranges_normalize_corner_order() {
        let a = CellReference::parse("C3").unwrap();
        let b = CellReference::parse("A1").unwrap();
        let range = RangeReference::new(a, b);
        assert_eq!(range.to_string(), "A1:C3");
        assert_eq!(range, RangeReference::parse("A1:C3").unwrap());
        assert_eq!(range, RangeReference::parse("C3:A1").unwrap());
        assert_eq!(range.width(), 3);
        assert_eq!(range.height(), 3);
        assert!(!range.is_single_cell());
        assert!(RangeReference::parse("B2").unwrap().is_single_cell());
    }

    #[test]
    fn range_containment_and_overlap() {
        let range = RangeReference::parse("B2:D4").unwrap();
        assert!(range.contains(CellReference::parse("B2").unwrap()));
        assert!(range.contains(CellReference::parse("C3").unwrap()));
        assert!(!range.contains(CellReference::parse("A2").unwrap()));
        assert!(!range.contains(CellReference::parse("B5").unwrap()));

        assert!(range.overlaps(&RangeReference::parse("D4:E5").unwrap()));
        assert!(!range.overlaps(&RangeReference::parse("E2:F4").unwrap()));
    }

    #[test]
    fn offsets_are_bounds_checked() {
        let cell = CellReference::parse("B2").unwrap();
        assert_eq!(cell.make_offset(1, 2).unwrap().to_string(), "C4");
        assert!(cell.make_offset(-2, 0).is_err());
        assert!(cell.make_offset(0, i64::from(MAX_ROWS)).is_err());
    }
}
