use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellKey};
use crate::names::{validate_defined_name, NamedRange};
use crate::reference::{shift_for_insert, CellReference, RangeReference, MAX_COLUMNS, MAX_ROWS};
use crate::value::CellValue;
use crate::view::SheetView;
use crate::ModelError;

/// Identifier for a worksheet, unique within a workbook for its lifetime.
pub type WorksheetId = u32;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Explicit settings for one row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct RowProperties {
    /// Height in points, when set explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// The height was set by the user rather than computed.
    #[serde(default, skip_serializing_if = "is_false")]
    pub custom_height: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

/// Explicit settings for one column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ColumnProperties {
    /// Width in character units, when set explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// The width was set by the user rather than computed.
    #[serde(default, skip_serializing_if = "is_false")]
    pub custom_width: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub best_fit: bool,
}

/// A single sheet: a sparse cell grid plus row/column settings, merges,
/// sheet-scoped named ranges and view state.
///
/// Cells are keyed by packed coordinates in a sorted map, so iteration is
/// row-major without extra bookkeeping. Structural edits validate all bounds
/// before touching anything; a returned error means the sheet is unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    id: WorksheetId,
    title: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    cells: BTreeMap<CellKey, Cell>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    row_properties: BTreeMap<u32, RowProperties>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    column_properties: BTreeMap<u32, ColumnProperties>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    merges: Vec<RangeReference>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    named_ranges: BTreeMap<String, RangeReference>,
    #[serde(default)]
    pub view: SheetView,
}

impl Worksheet {
    pub(crate) fn new(id: WorksheetId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            cells: BTreeMap::new(),
            row_properties: BTreeMap::new(),
            column_properties: BTreeMap::new(),
            merges: Vec::new(),
            named_ranges: BTreeMap::new(),
            view: SheetView::default(),
        }
    }

    pub fn id(&self) -> WorksheetId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: WorksheetId) {
        self.id = id;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    // ---- cell access ----

    pub fn cell(&self, reference: CellReference) -> Option<&Cell> {
        self.cells.get(&CellKey::from(reference))
    }

    /// The cell at `reference`, materializing an empty record if absent.
    pub fn cell_mut(&mut self, reference: CellReference) -> &mut Cell {
        self.cells.entry(CellKey::from(reference)).or_default()
    }

    pub fn has_cell(&self, reference: CellReference) -> bool {
        self.cells.contains_key(&CellKey::from(reference))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Set a cell value. Text is validated and truncated per
    /// [`crate::check_string`].
    pub fn set_value(
        &mut self,
        reference: CellReference,
        value: impl Into<CellValue>,
    ) -> Result<(), ModelError> {
        let value = match value.into() {
            CellValue::Text(text) => CellValue::Text(crate::cell::check_string(&text)?),
            CellValue::RichText(rich) => {
                crate::cell::check_string(rich.plain_text())?;
                CellValue::RichText(rich)
            }
            other => other,
        };
        self.cell_mut(reference).value = value;
        Ok(())
    }

    /// The stored value at `reference`; unset cells read as empty.
    pub fn value(&self, reference: CellReference) -> CellValue {
        self.cell(reference)
            .map(|cell| cell.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Remove the cell record entirely, including formatting and notes.
    pub fn clear_cell(&mut self, reference: CellReference) {
        self.cells.remove(&CellKey::from(reference));
    }

    /// All stored cells in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellReference, &Cell)> {
        self.cells.iter().map(|(key, cell)| (key.to_reference(), cell))
    }

    /// All stored cells in column-major order.
    pub fn iter_cells_by_column(&self) -> impl Iterator<Item = (CellReference, &Cell)> {
        let mut entries: Vec<_> = self.cells.iter().collect();
        entries.sort_by_key(|(key, _)| (key.column(), key.row()));
        entries
            .into_iter()
            .map(|(key, cell)| (key.to_reference(), cell))
    }

    /// Drop cell records that carry no content or formatting.
    pub fn garbage_collect(&mut self) {
        self.cells.retain(|_, cell| !cell.is_truly_empty());
    }

    pub(crate) fn bound_format_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.values().filter_map(|cell| cell.format_id)
    }

    // ---- row and column properties ----

    pub fn row_properties(&self, row: u32) -> Option<&RowProperties> {
        self.row_properties.get(&row)
    }

    pub fn row_properties_mut(&mut self, row: u32) -> Result<&mut RowProperties, ModelError> {
        if row == 0 || row > MAX_ROWS {
            return Err(ModelError::InvalidParameter(format!(
                "row {row} out of range 1..={MAX_ROWS}"
            )));
        }
        Ok(self.row_properties.entry(row).or_default())
    }

    pub fn column_properties(&self, column: u32) -> Option<&ColumnProperties> {
        self.column_properties.get(&column)
    }

    pub fn column_properties_mut(
        &mut self,
        column: u32,
    ) -> Result<&mut ColumnProperties, ModelError> {
        if column == 0 || column > MAX_COLUMNS {
            return Err(ModelError::InvalidParameter(format!(
                "column {column} out of range 1..={MAX_COLUMNS}"
            )));
        }
        Ok(self.column_properties.entry(column).or_default())
    }

    // ---- merges ----

    /// Record a merged region. The top-left cell is the anchor; every other
    /// covered cell has its value and formula cleared. Overlapping an
    /// existing merge is rejected.
    pub fn merge_cells(&mut self, range: RangeReference) -> Result<(), ModelError> {
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(ModelError::InvalidParameter(format!(
                "range {range} overlaps existing merge {existing}"
            )));
        }
        let anchor = range.start;
        for row in range.start.row..=range.end.row {
            for column in range.start.column..=range.end.column {
                if row == anchor.row && column == anchor.column {
                    continue;
                }
                if let Some(cell) = self.cells.get_mut(&CellKey::new(row, column)) {
                    cell.value = CellValue::Empty;
                    cell.formula = None;
                }
            }
        }
        self.merges.push(range);
        Ok(())
    }

    /// Remove a previously recorded merge. The exact range must exist.
    pub fn unmerge_cells(&mut self, range: RangeReference) -> Result<(), ModelError> {
        match self.merges.iter().position(|m| *m == range) {
            Some(index) => {
                self.merges.remove(index);
                Ok(())
            }
            None => Err(ModelError::KeyNotFound(format!("merged range {range}"))),
        }
    }

    pub fn merged_ranges(&self) -> &[RangeReference] {
        &self.merges
    }

    /// The merge covering `reference`, if any.
    pub fn merge_containing(&self, reference: CellReference) -> Option<&RangeReference> {
        self.merges.iter().find(|m| m.contains(reference))
    }

    // ---- named ranges (sheet scope) ----

    pub fn create_named_range(
        &mut self,
        name: &str,
        target: RangeReference,
    ) -> Result<(), ModelError> {
        validate_defined_name(name)?;
        if self.named_ranges.contains_key(name) {
            return Err(ModelError::InvalidParameter(format!(
                "named range {name:?} already exists on sheet {:?}",
                self.title
            )));
        }
        self.named_ranges.insert(name.to_string(), target);
        Ok(())
    }

    pub fn named_range(&self, name: &str) -> Result<RangeReference, ModelError> {
        self.named_ranges
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::KeyNotFound(format!("named range {name:?}")))
    }

    pub fn has_named_range(&self, name: &str) -> bool {
        self.named_ranges.contains_key(name)
    }

    pub fn remove_named_range(&mut self, name: &str) -> Result<(), ModelError> {
        self.named_ranges
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ModelError::KeyNotFound(format!("named range {name:?}")))
    }

    pub fn named_ranges(&self) -> impl Iterator<Item = NamedRange> + '_ {
        self.named_ranges.iter().map(|(name, target)| NamedRange {
            name: name.clone(),
            target: *target,
        })
    }

    // ---- structural editing ----

    /// Insert `count` blank rows before row `before`. Everything at or below
    /// `before` moves down; merges and named ranges move or expand with their
    /// content.
    pub fn insert_rows(&mut self, before: u32, count: u32) -> Result<(), ModelError> {
        if count == 0 {
            return Ok(());
        }
        self.validate_row_insert(before, count)?;

        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .map(|(key, cell)| {
                let row = shift_for_insert(key.row(), before, count);
                (CellKey::new(row, key.column()), cell)
            })
            .collect();

        let rows = std::mem::take(&mut self.row_properties);
        self.row_properties = rows
            .into_iter()
            .map(|(row, props)| (shift_for_insert(row, before, count), props))
            .collect();

        for merge in &mut self.merges {
            merge.start.row = shift_for_insert(merge.start.row, before, count);
            merge.end.row = shift_for_insert(merge.end.row, before, count);
        }
        for target in self.named_ranges.values_mut() {
            target.start.row = shift_for_insert(target.start.row, before, count);
            target.end.row = shift_for_insert(target.end.row, before, count);
        }
        Ok(())
    }

    /// Insert `count` blank columns before column `before`.
    pub fn insert_columns(&mut self, before: u32, count: u32) -> Result<(), ModelError> {
        if count == 0 {
            return Ok(());
        }
        self.validate_column_insert(before, count)?;

        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .map(|(key, cell)| {
                let column = shift_for_insert(key.column(), before, count);
                (CellKey::new(key.row(), column), cell)
            })
            .collect();

        let columns = std::mem::take(&mut self.column_properties);
        self.column_properties = columns
            .into_iter()
            .map(|(column, props)| (shift_for_insert(column, before, count), props))
            .collect();

        for merge in &mut self.merges {
            merge.start.column = shift_for_insert(merge.start.column, before, count);
            merge.end.column = shift_for_insert(merge.end.column, before, count);
        }
        for target in self.named_ranges.values_mut() {
            target.start.column = shift_for_insert(target.start.column, before, count);
            target.end.column = shift_for_insert(target.end.column, before, count);
        }
        Ok(())
    }

    /// Delete `count` rows starting at row `start`. Content below the band
    /// moves up; merges and named ranges shrink, move, or disappear when
    /// fully contained in the band.
    pub fn delete_rows(&mut self, start: u32, count: u32) -> Result<(), ModelError> {
        if count == 0 {
            return Ok(());
        }
        validate_band(start, count, MAX_ROWS, "row")?;
        let end = start + count;

        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .filter(|(key, _)| !(start..end).contains(&key.row()))
            .map(|(key, cell)| {
                let row = shift_for_delete(key.row(), start, count);
                (CellKey::new(row, key.column()), cell)
            })
            .collect();

        let rows = std::mem::take(&mut self.row_properties);
        self.row_properties = rows
            .into_iter()
            .filter(|(row, _)| !(start..end).contains(row))
            .map(|(row, props)| (shift_for_delete(row, start, count), props))
            .collect();

        self.merges.retain_mut(|merge| {
            collapse_band(&mut merge.start.row, &mut merge.end.row, start, count)
        });
        self.named_ranges.retain(|_, target| {
            collapse_band(&mut target.start.row, &mut target.end.row, start, count)
        });
        Ok(())
    }

    /// Delete `count` columns starting at column `start`.
    pub fn delete_columns(&mut self, start: u32, count: u32) -> Result<(), ModelError> {
        if count == 0 {
            return Ok(());
        }
        validate_band(start, count, MAX_COLUMNS, "column")?;
        let end = start + count;

        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .filter(|(key, _)| !(start..end).contains(&key.column()))
            .map(|(key, cell)| {
                let column = shift_for_delete(key.column(), start, count);
                (CellKey::new(key.row(), column), cell)
            })
            .collect();

        let columns = std::mem::take(&mut self.column_properties);
        self.column_properties = columns
            .into_iter()
            .filter(|(column, _)| !(start..end).contains(column))
            .map(|(column, props)| (shift_for_delete(column, start, count), props))
            .collect();

        self.merges.retain_mut(|merge| {
            collapse_band(&mut merge.start.column, &mut merge.end.column, start, count)
        });
        self.named_ranges.retain(|_, target| {
            collapse_band(&mut target.start.column, &mut target.end.column, start, count)
        });
        Ok(())
    }

    fn validate_row_insert(&self, before: u32, count: u32) -> Result<(), ModelError> {
        if before == 0 || before > MAX_ROWS {
            return Err(ModelError::InvalidParameter(format!(
                "row {before} out of range 1..={MAX_ROWS}"
            )));
        }
        if count > MAX_ROWS {
            return Err(ModelError::OutOfBounds(format!(
                "cannot insert {count} rows"
            )));
        }
        let limit = MAX_ROWS - count;
        let shifted_past_limit = self
            .cells
            .keys()
            .map(|key| key.row())
            .chain(self.row_properties.keys().copied())
            .chain(self.merges.iter().map(|m| m.end.row))
            .chain(self.named_ranges.values().map(|t| t.end.row))
            .any(|row| row >= before && row > limit);
        if shifted_past_limit {
            return Err(ModelError::OutOfBounds(format!(
                "inserting {count} rows before row {before} would push content past row {MAX_ROWS}"
            )));
        }
        Ok(())
    }

    fn validate_column_insert(&self, before: u32, count: u32) -> Result<(), ModelError> {
        if before == 0 || before > MAX_COLUMNS {
            return Err(ModelError::InvalidParameter(format!(
                "column {before} out of range 1..={MAX_COLUMNS}"
            )));
        }
        if count > MAX_COLUMNS {
            return Err(ModelError::OutOfBounds(format!(
                "cannot insert {count} columns"
            )));
        }
        let limit = MAX_COLUMNS - count;
        let shifted_past_limit = self
            .cells
            .keys()
            .map(|key| key.column())
            .chain(self.column_properties.keys().copied())
            .chain(self.merges.iter().map(|m| m.end.column))
            .chain(self.named_ranges.values().map(|t| t.end.column))
            .any(|column| column >= before && column > limit);
        if shifted_past_limit {
            return Err(ModelError::OutOfBounds(format!(
                "inserting {count} columns before column {before} would push content past column {MAX_COLUMNS}"
            )));
        }
        Ok(())
    }

    // ---- dimension ----

    /// The sheet's occupied region.
    ///
    /// With `skip_empty` set, this is the bounding box of cells holding a
    /// non-empty value (or `A1:A1` for a blank sheet). Without it, the
    /// region is anchored at `A1` and extends to the highest stored cell or
    /// row/column setting, mirroring how the dimension is persisted.
    pub fn calculate_dimension(&self, skip_empty: bool) -> RangeReference {
        let a1 = CellReference {
            column: 1,
            row: 1,
            column_absolute: false,
            row_absolute: false,
        };
        if skip_empty {
            let mut bounds: Option<(u32, u32, u32, u32)> = None;
            for (key, cell) in &self.cells {
                if cell.value.is_empty() && cell.formula.is_none() {
                    continue;
                }
                let (row, column) = (key.row(), key.column());
                bounds = Some(match bounds {
                    None => (row, row, column, column),
                    Some((top, bottom, left, right)) => (
                        top.min(row),
                        bottom.max(row),
                        left.min(column),
                        right.max(column),
                    ),
                });
            }
            return match bounds {
                None => RangeReference::single(a1),
                Some((top, bottom, left, right)) => RangeReference {
                    start: CellReference {
                        column: left,
                        row: top,
                        ..a1
                    },
                    end: CellReference {
                        column: right,
                        row: bottom,
                        ..a1
                    },
                },
            };
        }

        let mut bottom = 1;
        let mut right = 1;
        for key in self.cells.keys() {
            bottom = bottom.max(key.row());
            right = right.max(key.column());
        }
        if let Some(row) = self.row_properties.keys().next_back() {
            bottom = bottom.max(*row);
        }
        if let Some(column) = self.column_properties.keys().next_back() {
            right = right.max(*column);
        }
        RangeReference {
            start: a1,
            end: CellReference {
                column: right,
                row: bottom,
                ..a1
            },
        }
    }
}

/// Shift a 1-based coordinate after deleting `count` units at `start`.
/// Coordinates inside the band clamp to `start` (callers that need the
/// end-corner clamp of `start - 1` use [`collapse_band`]).
fn shift_for_delete(coordinate: u32, start: u32, count: u32) -> u32 {
    if coordinate < start {
        coordinate
    } else if coordinate >= start + count {
        coordinate - count
    } else {
        start
    }
}

/// Transform one axis of an inclusive range for a band deletion. Returns
/// false when the range lay entirely within the band and should be dropped.
fn collapse_band(low: &mut u32, high: &mut u32, start: u32, count: u32) -> bool {
    let end = start + count;
    let new_low = shift_for_delete(*low, start, count);
    let new_high = if *high < start {
        *high
    } else if *high >= end {
        *high - count
    } else {
        start - 1
    };
    if new_high < new_low {
        return false;
    }
    *low = new_low;
    *high = new_high;
    true
}

fn validate_band(start: u32, count: u32, max: u32, axis: &str) -> Result<(), ModelError> {
    if start == 0 || start > max {
        return Err(ModelError::InvalidParameter(format!(
            "{axis} {start} out of range 1..={max}"
        )));
    }
    if count > max - start + 1 {
        return Err(ModelError::OutOfBounds(format!(
            "cannot delete {count} {axis}s starting at {axis} {start}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Worksheet {
        Worksheet::new(1, "Sheet1")
    }

    fn r(text: &str) -> CellReference {
        CellReference::parse(text).unwrap()
    }

    fn range(text: &str) -> RangeReference {
        RangeReference::parse(text).unwrap()
    }

    #[test]
    fn sparse_cell_access() {
        let mut ws = sheet();
        assert!(!ws.has_cell(r("B2")));
        assert_eq!(ws.value(r("B2")), CellValue::Empty);

        ws.set_value(r("B2"), 4.5).unwrap();
        assert!(ws.has_cell(r("B2")));
        assert_eq!(ws.value(r("B2")), CellValue::Number(4.5));

        ws.clear_cell(r("B2"));
        assert!(!ws.has_cell(r("B2")));
    }

    #[test]
    fn iteration_orders() {
        let mut ws = sheet();
        for text in ["B1", "A2", "C1", "A1"] {
            ws.set_value(r(text), text).unwrap();
        }
        let row_major: Vec<String> = ws.iter_cells().map(|(c, _)| c.to_string()).collect();
        assert_eq!(row_major, ["A1", "B1", "C1", "A2"]);

        let column_major: Vec<String> =
            ws.iter_cells_by_column().map(|(c, _)| c.to_string()).collect();
        assert_eq!(column_major, ["A1", "A2", "B1", "C1"]);
    }

    #[test]
    fn garbage_collect_drops_only_truly_empty_cells() {
        let mut ws = sheet();
        ws.set_value(r("A1"), "kept").unwrap();
        ws.cell_mut(r("A2")); // materialized but empty
        ws.cell_mut(r("A3")).format_id = Some(2);
        assert_eq!(ws.cell_count(), 3);

        ws.garbage_collect();
        assert_eq!(ws.cell_count(), 2);
        assert!(ws.has_cell(r("A1")));
        assert!(!ws.has_cell(r("A2")));
        assert!(ws.has_cell(r("A3")));
    }

    #[test]
    fn merge_clears_covered_cells_but_not_anchor() {
        let mut ws = sheet();
        ws.set_value(r("A1"), "anchor").unwrap();
        ws.set_value(r("B2"), "covered").unwrap();
        ws.cell_mut(r("B2")).format_id = Some(7);

        ws.merge_cells(range("A1:B2")).unwrap();
        assert_eq!(ws.value(r("A1")), CellValue::Text("anchor".to_string()));
        assert_eq!(ws.value(r("B2")), CellValue::Empty);
        assert_eq!(ws.cell(r("B2")).unwrap().format_id, Some(7));
        assert_eq!(ws.merge_containing(r("B1")), Some(&range("A1:B2")));
    }

    #[test]
    fn overlapping_merges_are_rejected() {
        let mut ws = sheet();
        ws.merge_cells(range("A1:B2")).unwrap();
        assert!(matches!(
            ws.merge_cells(range("B2:C3")),
            Err(ModelError::InvalidParameter(_))
        ));
        assert_eq!(ws.merged_ranges().len(), 1);

        ws.merge_cells(range("C3:D4")).unwrap();
        assert_eq!(ws.merged_ranges().len(), 2);
    }

    #[test]
    fn unmerge_requires_exact_range() {
        let mut ws = sheet();
        ws.merge_cells(range("A1:B2")).unwrap();
        assert!(matches!(
            ws.unmerge_cells(range("A1:B3")),
            Err(ModelError::KeyNotFound(_))
        ));
        ws.unmerge_cells(range("A1:B2")).unwrap();
        assert!(ws.merged_ranges().is_empty());
    }

    #[test]
    fn insert_rows_shifts_cells_and_properties() {
        let mut ws = sheet();
        ws.set_value(r("A1"), 1.0).unwrap();
        ws.set_value(r("A5"), 5.0).unwrap();
        ws.row_properties_mut(5).unwrap().height = Some(20.0);

        ws.insert_rows(2, 3).unwrap();
        assert_eq!(ws.value(r("A1")), CellValue::Number(1.0));
        assert_eq!(ws.value(r("A5")), CellValue::Empty);
        assert_eq!(ws.value(r("A8")), CellValue::Number(5.0));
        assert_eq!(ws.row_properties(8).unwrap().height, Some(20.0));
        assert!(ws.row_properties(5).is_none());
    }

    #[test]
    fn delete_columns_removes_band_and_shifts() {
        let mut ws = sheet();
        ws.set_value(r("A1"), "a").unwrap();
        ws.set_value(r("B1"), "b").unwrap();
        ws.set_value(r("D1"), "d").unwrap();
        ws.column_properties_mut(4).unwrap().width = Some(15.0);

        ws.delete_columns(2, 2).unwrap();
        assert_eq!(ws.value(r("A1")), CellValue::Text("a".to_string()));
        assert_eq!(ws.value(r("B1")), CellValue::Text("d".to_string()));
        assert!(!ws.has_cell(r("D1")));
        assert_eq!(ws.column_properties(2).unwrap().width, Some(15.0));
    }

    #[test]
    fn structural_edits_validate_before_applying() {
        let mut ws = sheet();
        ws.set_value(r("A1"), 1.0).unwrap();
        ws.set_value(r("B3"), 2.0).unwrap();

        // Shifting B3 past the bottom of the sheet must fail and leave
        // everything in place.
        assert!(matches!(
            ws.insert_rows(2, MAX_ROWS),
            Err(ModelError::OutOfBounds(_))
        ));
        assert!(matches!(
            ws.insert_rows(2, MAX_ROWS - 2),
            Err(ModelError::OutOfBounds(_))
        ));
        assert_eq!(ws.value(r("B3")), CellValue::Number(2.0));

        assert!(ws.insert_rows(4, MAX_ROWS - 4).is_ok());

        assert!(matches!(
            ws.delete_rows(0, 1),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            ws.delete_rows(MAX_ROWS, 2),
            Err(ModelError::OutOfBounds(_))
        ));
        assert!(matches!(
            ws.insert_columns(MAX_COLUMNS + 1, 1),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn named_ranges_follow_structural_edits() {
        let mut ws = sheet();
        ws.create_named_range("data", range("B2:C4")).unwrap();
        assert!(matches!(
            ws.create_named_range("data", range("A1:A2")),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(ws.create_named_range("A1", range("A1:A2")).is_err());

        ws.insert_rows(3, 2).unwrap();
        assert_eq!(ws.named_range("data").unwrap(), range("B2:C6"));

        ws.delete_columns(2, 2).unwrap();
        assert!(!ws.has_named_range("data"), "band swallowed the range");

        ws.create_named_range("gone", range("D4:D6")).unwrap();
        ws.delete_rows(3, 10).unwrap();
        assert!(!ws.has_named_range("gone"));
        assert!(matches!(
            ws.named_range("gone"),
            Err(ModelError::KeyNotFound(_))
        ));
    }

    #[test]
    fn dimension_modes() {
        let mut ws = sheet();
        assert_eq!(ws.calculate_dimension(true), range("A1:A1"));
        assert_eq!(ws.calculate_dimension(false), range("A1:A1"));

        ws.set_value(r("B3"), 1.0).unwrap();
        ws.set_value(r("D7"), 2.0).unwrap();
        ws.cell_mut(r("F9")); // stored but empty
        ws.row_properties_mut(12).unwrap().height = Some(10.0);

        assert_eq!(ws.calculate_dimension(true), range("B3:D7"));
        assert_eq!(ws.calculate_dimension(false), range("A1:F12"));
    }
}
