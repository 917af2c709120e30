use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::cell::parse_input;
use crate::datetime::{Calendar, Date, DateTime, Time, Timedelta};
use crate::format::Format;
use crate::names::{validate_defined_name, validate_sheet_title};
use crate::reference::{CellReference, RangeReference};
use crate::style::NumberFormat;
use crate::stylesheet::Stylesheet;
use crate::value::CellValue;
use crate::worksheet::{Worksheet, WorksheetId};
use crate::ModelError;

fn default_schema_version() -> u32 {
    crate::SCHEMA_VERSION
}

/// A workbook-scoped named range target: a sheet plus a region on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookRange {
    pub sheet_id: WorksheetId,
    pub target: RangeReference,
}

/// A document: worksheets plus the shared style store, the serial-date
/// calendar and workbook-scoped named ranges.
///
/// A workbook always contains at least one sheet. Cell formatting is bound
/// through the workbook so the stylesheet's format reference counts stay
/// consistent with what cells actually use.
#[derive(Clone, Debug, Serialize)]
pub struct Workbook {
    /// Serialization schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Calendar used to interpret serial date numbers.
    #[serde(default)]
    calendar: Calendar,

    /// Worksheets in tab order.
    sheets: Vec<Worksheet>,

    /// Shared style store (deduplicated).
    #[serde(default)]
    stylesheet: Stylesheet,

    /// Workbook-scoped named ranges.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    named_ranges: BTreeMap<String, WorkbookRange>,

    /// Id of the sheet shown on open.
    active_sheet: WorksheetId,

    /// Next worksheet id to allocate (runtime-only).
    #[serde(skip)]
    next_sheet_id: WorksheetId,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

fn titles_equal(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl Workbook {
    /// Create a workbook with a single empty sheet titled `Sheet1`.
    pub fn new() -> Self {
        Self {
            schema_version: crate::SCHEMA_VERSION,
            calendar: Calendar::default(),
            sheets: vec![Worksheet::new(1, "Sheet1")],
            stylesheet: Stylesheet::new(),
            named_ranges: BTreeMap::new(),
            active_sheet: 1,
            next_sheet_id: 2,
        }
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn set_calendar(&mut self, calendar: Calendar) {
        self.calendar = calendar;
    }

    // ---- sheet lifecycle ----

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet(&self, id: WorksheetId) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.id() == id)
    }

    pub fn sheet_mut(&mut self, id: WorksheetId) -> Option<&mut Worksheet> {
        self.sheets.iter_mut().find(|s| s.id() == id)
    }

    pub fn sheet_by_title(&self, title: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| titles_equal(s.title(), title))
    }

    pub fn sheet_by_title_mut(&mut self, title: &str) -> Option<&mut Worksheet> {
        self.sheets
            .iter_mut()
            .find(|s| titles_equal(s.title(), title))
    }

    pub fn sheet_titles(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.title())
    }

    /// Tab position of a sheet. Positions shift on removal; ids never do.
    pub fn index_of(&self, id: WorksheetId) -> Option<usize> {
        self.sheets.iter().position(|s| s.id() == id)
    }

    fn existing_sheet_mut(&mut self, id: WorksheetId) -> Result<&mut Worksheet, ModelError> {
        self.sheets
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or_else(|| ModelError::KeyNotFound(format!("sheet id {id}")))
    }

    fn existing_sheet(&self, id: WorksheetId) -> Result<&Worksheet, ModelError> {
        self.sheet(id)
            .ok_or_else(|| ModelError::KeyNotFound(format!("sheet id {id}")))
    }

    fn check_title_free(&self, title: &str, except: Option<WorksheetId>) -> Result<(), ModelError> {
        let taken = self
            .sheets
            .iter()
            .any(|s| Some(s.id()) != except && titles_equal(s.title(), title));
        if taken {
            return Err(ModelError::InvalidSheetTitle(format!(
                "sheet title {title:?} already in use"
            )));
        }
        Ok(())
    }

    /// Append a sheet with a generated `SheetN` title, returning its id.
    pub fn create_sheet(&mut self) -> WorksheetId {
        let mut n = self.sheets.len() + 1;
        let title = loop {
            let candidate = format!("Sheet{n}");
            if self.sheet_by_title(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };
        self.create_sheet_titled(&title)
            .expect("generated sheet title is always valid and unique")
    }

    /// Append a sheet with the given title, returning its id.
    pub fn create_sheet_titled(&mut self, title: &str) -> Result<WorksheetId, ModelError> {
        validate_sheet_title(title)?;
        self.check_title_free(title, None)?;
        let id = self.next_sheet_id;
        self.next_sheet_id = self.next_sheet_id.wrapping_add(1);
        self.sheets.push(Worksheet::new(id, title));
        Ok(id)
    }

    /// Duplicate a sheet, giving the copy a derived unique title.
    pub fn copy_sheet(&mut self, id: WorksheetId) -> Result<WorksheetId, ModelError> {
        let source = self.existing_sheet(id)?;
        let mut copy = source.clone();

        let base = format!("{} Copy", source.title());
        let mut title = base.clone();
        let mut n = 2;
        while self.sheet_by_title(&title).is_some() || validate_sheet_title(&title).is_err() {
            title = format!("{base} {n}");
            n += 1;
            if let Err(err) = validate_sheet_title(&title) {
                return Err(err);
            }
        }

        let new_id = self.next_sheet_id;
        self.next_sheet_id = self.next_sheet_id.wrapping_add(1);
        copy.set_id(new_id);
        copy.set_title(title);
        self.sheets.push(copy);
        self.rebuild_format_references();
        Ok(new_id)
    }

    /// Remove a sheet. The last remaining sheet cannot be removed.
    /// Workbook-scoped named ranges targeting the sheet are dropped.
    pub fn remove_sheet(&mut self, id: WorksheetId) -> Result<(), ModelError> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| ModelError::KeyNotFound(format!("sheet id {id}")))?;
        if self.sheets.len() == 1 {
            return Err(ModelError::InvalidParameter(
                "cannot remove the last sheet".to_string(),
            ));
        }
        self.sheets.remove(index);
        self.named_ranges.retain(|_, r| r.sheet_id != id);
        if self.active_sheet == id {
            self.active_sheet = self.sheets[0].id();
        }
        self.rebuild_format_references();
        Ok(())
    }

    /// Rename a sheet. Renaming a sheet to its own title is a no-op.
    pub fn rename_sheet(&mut self, id: WorksheetId, title: &str) -> Result<(), ModelError> {
        validate_sheet_title(title)?;
        let current = self.existing_sheet(id)?.title();
        if current == title {
            return Ok(());
        }
        self.check_title_free(title, Some(id))?;
        self.existing_sheet_mut(id)?.set_title(title);
        Ok(())
    }

    pub fn active_sheet(&self) -> &Worksheet {
        self.sheet(self.active_sheet)
            .unwrap_or(&self.sheets[0])
    }

    pub fn active_sheet_mut(&mut self) -> &mut Worksheet {
        let id = self.active_sheet;
        if self.sheet(id).is_some() {
            return self.sheet_mut(id).expect("sheet just looked up");
        }
        &mut self.sheets[0]
    }

    pub fn set_active_sheet(&mut self, id: WorksheetId) -> Result<(), ModelError> {
        self.existing_sheet(id)?;
        self.active_sheet = id;
        Ok(())
    }

    // ---- styles ----

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    pub fn stylesheet_mut(&mut self) -> &mut Stylesheet {
        &mut self.stylesheet
    }

    /// Bind a format to a cell, keeping reference counts in step.
    pub fn set_cell_format(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        format_id: u32,
    ) -> Result<(), ModelError> {
        if self.stylesheet.format(format_id).is_none() {
            return Err(ModelError::KeyNotFound(format!("format id {format_id}")));
        }
        let sheet = self.existing_sheet_mut(sheet_id)?;
        let previous = sheet.cell_mut(reference).format_id.replace(format_id);
        if let Some(old) = previous {
            if old != format_id {
                self.stylesheet.release_format_reference(old)?;
            }
        }
        if previous != Some(format_id) {
            self.stylesheet.add_format_reference(format_id)?;
        }
        Ok(())
    }

    /// Unbind a cell's format, if any.
    pub fn clear_cell_format(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
    ) -> Result<(), ModelError> {
        let sheet = self.existing_sheet_mut(sheet_id)?;
        let previous = match sheet.cell(reference) {
            Some(cell) => cell.format_id,
            None => return Ok(()),
        };
        if let Some(old) = previous {
            sheet.cell_mut(reference).format_id = None;
            self.stylesheet.release_format_reference(old)?;
        }
        Ok(())
    }

    /// Bind a named style's current template format to a cell.
    pub fn apply_cell_style(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        style_name: &str,
    ) -> Result<(), ModelError> {
        let format_id = self.stylesheet.style(style_name)?;
        self.set_cell_format(sheet_id, reference, format_id)
    }

    /// The format record bound to a cell, if any.
    pub fn cell_format(&self, sheet_id: WorksheetId, reference: CellReference) -> Option<&Format> {
        let cell = self.sheet(sheet_id)?.cell(reference)?;
        self.stylesheet.format(cell.format_id?)
    }

    /// The named style a cell's format belongs to; unstyled cells are an
    /// attribute error.
    pub fn cell_style_name(
        &self,
        sheet_id: WorksheetId,
        reference: CellReference,
    ) -> Result<&str, ModelError> {
        self.cell_format(sheet_id, reference)
            .and_then(|format| format.style.as_deref())
            .ok_or_else(|| {
                ModelError::InvalidAttribute(format!("cell {reference} has no named style"))
            })
    }

    /// The number format a cell resolves to, if any is applied.
    pub fn cell_number_format(
        &self,
        sheet_id: WorksheetId,
        reference: CellReference,
    ) -> Option<&NumberFormat> {
        let cell = self.sheet(sheet_id)?.cell(reference)?;
        self.stylesheet.format_number_format(cell.format_id?)
    }

    // ---- values ----

    /// Set a typed cell value. Text is validated and truncated the same way
    /// direct input is.
    pub fn set_cell_value(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        value: impl Into<CellValue>,
    ) -> Result<(), ModelError> {
        self.existing_sheet_mut(sheet_id)?.set_value(reference, value)
    }

    /// Interpret raw text the way a formula bar entry works: formulas,
    /// booleans, numbers, percentages, clock times and error codes are
    /// recognized; anything else stays text. Formats implied by the input's
    /// shape (`0%`, a time format) are bound to the cell.
    pub fn set_cell_value_inferred(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        text: &str,
    ) -> Result<(), ModelError> {
        let parsed = parse_input(text)?;
        {
            let sheet = self.existing_sheet_mut(sheet_id)?;
            let cell = sheet.cell_mut(reference);
            cell.value = parsed.value;
            cell.formula = parsed.formula;
        }
        if let Some(number_format) = parsed.implied_format {
            self.bind_number_format(sheet_id, reference, number_format)?;
        }
        Ok(())
    }

    /// Store a date as its serial number and bind a date format.
    pub fn set_cell_date(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        date: Date,
    ) -> Result<(), ModelError> {
        let serial = date.to_number(self.calendar)? as f64;
        self.existing_sheet_mut(sheet_id)?.set_value(reference, serial)?;
        self.bind_number_format(sheet_id, reference, NumberFormat::date())
    }

    /// Store a date-time as its serial number and bind a date-time format.
    pub fn set_cell_datetime(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        datetime: DateTime,
    ) -> Result<(), ModelError> {
        let serial = datetime.to_number(self.calendar)?;
        self.existing_sheet_mut(sheet_id)?.set_value(reference, serial)?;
        self.bind_number_format(sheet_id, reference, NumberFormat::date_time())
    }

    /// Store a time of day as a day fraction and bind a time format.
    pub fn set_cell_time(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        time: Time,
    ) -> Result<(), ModelError> {
        self.existing_sheet_mut(sheet_id)?
            .set_value(reference, time.to_number())?;
        self.bind_number_format(sheet_id, reference, NumberFormat::time())
    }

    /// Store a duration as a day count and bind an elapsed-hours format.
    pub fn set_cell_timedelta(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        delta: Timedelta,
    ) -> Result<(), ModelError> {
        self.existing_sheet_mut(sheet_id)?
            .set_value(reference, delta.to_number())?;
        self.bind_number_format(sheet_id, reference, NumberFormat::duration())
    }

    fn bind_number_format(
        &mut self,
        sheet_id: WorksheetId,
        reference: CellReference,
        number_format: NumberFormat,
    ) -> Result<(), ModelError> {
        let base = {
            let sheet = self.existing_sheet_mut(sheet_id)?;
            sheet.cell_mut(reference).format_id
        };
        let base = match base {
            Some(id) => id,
            None => self.stylesheet.create_format(),
        };
        let format_id = self
            .stylesheet
            .format_with_number_format(base, number_format)?;
        self.set_cell_format(sheet_id, reference, format_id)
    }

    /// Whether the cell holds a serial number rendered as a date or time.
    pub fn cell_is_date(&self, sheet_id: WorksheetId, reference: CellReference) -> bool {
        let is_number = self
            .sheet(sheet_id)
            .and_then(|s| s.cell(reference))
            .map_or(false, |cell| matches!(cell.value, CellValue::Number(_)));
        is_number
            && self
                .cell_number_format(sheet_id, reference)
                .is_some_and(NumberFormat::is_date_format)
    }

    /// Read a cell's serial number back as a date-time in this workbook's
    /// calendar. Reading a non-number cell is an attribute error.
    pub fn cell_as_datetime(
        &self,
        sheet_id: WorksheetId,
        reference: CellReference,
    ) -> Result<DateTime, ModelError> {
        let cell = self
            .existing_sheet(sheet_id)?
            .cell(reference)
            .ok_or_else(|| {
                ModelError::InvalidAttribute(format!("cell {reference} is not set"))
            })?;
        match cell.value {
            CellValue::Number(serial) => DateTime::from_number(serial, self.calendar),
            _ => Err(ModelError::InvalidAttribute(format!(
                "cell {reference} does not hold a number"
            ))),
        }
    }

    // ---- structural edits ----

    pub fn insert_rows(
        &mut self,
        sheet_id: WorksheetId,
        before: u32,
        count: u32,
    ) -> Result<(), ModelError> {
        self.existing_sheet_mut(sheet_id)?.insert_rows(before, count)
    }

    pub fn insert_columns(
        &mut self,
        sheet_id: WorksheetId,
        before: u32,
        count: u32,
    ) -> Result<(), ModelError> {
        self.existing_sheet_mut(sheet_id)?
            .insert_columns(before, count)
    }

    /// Delete rows on a sheet. Removed cells release their format bindings.
    pub fn delete_rows(
        &mut self,
        sheet_id: WorksheetId,
        start: u32,
        count: u32,
    ) -> Result<(), ModelError> {
        self.existing_sheet_mut(sheet_id)?.delete_rows(start, count)?;
        self.rebuild_format_references();
        Ok(())
    }

    /// Delete columns on a sheet. Removed cells release their format bindings.
    pub fn delete_columns(
        &mut self,
        sheet_id: WorksheetId,
        start: u32,
        count: u32,
    ) -> Result<(), ModelError> {
        self.existing_sheet_mut(sheet_id)?
            .delete_columns(start, count)?;
        self.rebuild_format_references();
        Ok(())
    }

    // ---- workbook-scoped named ranges ----

    pub fn create_named_range(
        &mut self,
        name: &str,
        sheet_id: WorksheetId,
        target: RangeReference,
    ) -> Result<(), ModelError> {
        validate_defined_name(name)?;
        self.existing_sheet(sheet_id)?;
        if self.named_ranges.contains_key(name) {
            return Err(ModelError::InvalidParameter(format!(
                "named range {name:?} already exists in the workbook"
            )));
        }
        self.named_ranges
            .insert(name.to_string(), WorkbookRange { sheet_id, target });
        Ok(())
    }

    pub fn named_range(&self, name: &str) -> Result<WorkbookRange, ModelError> {
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

    pub fn named_range_names(&self) -> impl Iterator<Item = &str> {
        self.named_ranges.keys().map(String::as_str)
    }

    // ---- maintenance ----

    /// Recompute the stylesheet's format reference counts from the cells.
    /// Bulk operations (sheet removal or copy, deserialization, band
    /// deletions) use this instead of tracking each binding individually.
    pub fn rebuild_format_references(&mut self) {
        let bound: Vec<u32> = self
            .sheets
            .iter()
            .flat_map(|sheet| sheet.bound_format_ids())
            .collect();
        self.stylesheet.recount_format_references(bound);
    }

    /// Drop truly-empty cell records on every sheet.
    pub fn garbage_collect(&mut self) {
        for sheet in &mut self.sheets {
            sheet.garbage_collect();
        }
        self.rebuild_format_references();
    }
}

impl<'de> Deserialize<'de> for Workbook {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(default = "default_schema_version")]
            schema_version: u32,
            #[serde(default)]
            calendar: Calendar,
            #[serde(default)]
            sheets: Vec<Worksheet>,
            #[serde(default)]
            stylesheet: Stylesheet,
            #[serde(default)]
            named_ranges: BTreeMap<String, WorkbookRange>,
            #[serde(default)]
            active_sheet: WorksheetId,
        }

        let helper = Helper::deserialize(deserializer)?;

        if helper.schema_version > crate::SCHEMA_VERSION {
            return Err(D::Error::custom(format!(
                "unsupported schema_version {} (max supported: {})",
                helper.schema_version,
                crate::SCHEMA_VERSION
            )));
        }

        if helper.sheets.is_empty() {
            return Err(D::Error::custom("workbook must contain at least one sheet"));
        }
        for (i, sheet) in helper.sheets.iter().enumerate() {
            for other in &helper.sheets[i + 1..] {
                if sheet.id() == other.id() {
                    return Err(D::Error::custom(format!(
                        "duplicate sheet id {}",
                        sheet.id()
                    )));
                }
                if titles_equal(sheet.title(), other.title()) {
                    return Err(D::Error::custom(format!(
                        "duplicate sheet title {:?}",
                        sheet.title()
                    )));
                }
            }
        }

        let next_sheet_id = helper
            .sheets
            .iter()
            .map(|s| s.id())
            .max()
            .unwrap_or(0)
            .wrapping_add(1);

        let active_sheet = if helper.sheets.iter().any(|s| s.id() == helper.active_sheet) {
            helper.active_sheet
        } else {
            helper.sheets[0].id()
        };

        let mut workbook = Workbook {
            schema_version: helper.schema_version,
            calendar: helper.calendar,
            sheets: helper.sheets,
            stylesheet: helper.stylesheet,
            named_ranges: helper.named_ranges,
            active_sheet,
            next_sheet_id,
        };
        workbook.rebuild_format_references();
        Ok(workbook)
    }
}
