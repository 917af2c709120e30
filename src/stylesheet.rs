use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Deserializer, Serialize};

use crate::format::{ComponentBinding, Format};
use crate::{Alignment, Border, Fill, Font, ModelError, NumberFormat, Protection};

/// Deduplicated table of structurally-interned records.
///
/// Submitting a record returns the index of an existing structurally-equal
/// record or appends and returns a new index; two equal records are never
/// stored twice. Ids are stable for the life of the table.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct InternTable<T>
where
    T: Clone + Eq + Hash,
{
    records: Vec<T>,
    #[serde(skip)]
    index: HashMap<T, u32>,
}

impl<T> Default for InternTable<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InternTable<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert (or reuse) a record, returning its id.
    pub fn intern(&mut self, record: T) -> u32 {
        if let Some(id) = self.index.get(&record) {
            return *id;
        }
        let id = self.records.len() as u32;
        self.records.push(record.clone());
        self.index.insert(record, id);
        id
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.records.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in id order, for the serializer boundary.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, record) in self.records.iter().cloned().enumerate() {
            self.index.insert(record, i as u32);
        }
    }
}

impl<'de, T> Deserialize<'de> for InternTable<T>
where
    T: Clone + Eq + Hash + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let records = Vec::<T>::deserialize(deserializer)?;
        let mut table = InternTable {
            records,
            index: HashMap::new(),
        };
        table.rebuild_index();
        Ok(table)
    }
}

/// The workbook's shared style store.
///
/// Each component category has its own interning table; composite [`Format`]
/// records are interned the same way, with a side table of reference counts
/// tracking live cell bindings. Named styles map a name onto a format id.
///
/// Zero-reference formats are retained: interned ids stay valid for the life
/// of the stylesheet.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Stylesheet {
    alignments: InternTable<Alignment>,
    borders: InternTable<Border>,
    fills: InternTable<Fill>,
    fonts: InternTable<Font>,
    number_formats: InternTable<NumberFormat>,
    protections: InternTable<Protection>,
    formats: InternTable<Format>,
    /// Named style templates: name → format id.
    styles: BTreeMap<String, u32>,
    /// Live cell bindings per format id (runtime-only).
    #[serde(skip)]
    format_references: Vec<u32>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a format with no components bound.
    ///
    /// Formats are deduplicated, so repeated calls return the same id.
    pub fn create_format(&mut self) -> u32 {
        self.intern_format(Format::default())
    }

    pub fn format(&self, id: u32) -> Option<&Format> {
        self.formats.get(id)
    }

    pub fn formats(&self) -> &[Format] {
        self.formats.records()
    }

    fn intern_format(&mut self, format: Format) -> u32 {
        let id = self.formats.intern(format);
        if self.format_references.len() < self.formats.len() {
            self.format_references.resize(self.formats.len(), 0);
        }
        id
    }

    fn existing_format(&self, id: u32) -> Result<Format, ModelError> {
        self.formats
            .get(id)
            .cloned()
            .ok_or_else(|| ModelError::KeyNotFound(format!("format id {id}")))
    }

    /// Copy-on-write setter: returns the id of a format equal to `format_id`
    /// but with the given alignment bound and applied.
    pub fn format_with_alignment(
        &mut self,
        format_id: u32,
        alignment: Alignment,
    ) -> Result<u32, ModelError> {
        let mut format = self.existing_format(format_id)?;
        format.alignment = Some(ComponentBinding::applied(self.alignments.intern(alignment)));
        Ok(self.intern_format(format))
    }

    pub fn format_with_border(&mut self, format_id: u32, border: Border) -> Result<u32, ModelError> {
        let mut format = self.existing_format(format_id)?;
        format.border = Some(ComponentBinding::applied(self.borders.intern(border)));
        Ok(self.intern_format(format))
    }

    pub fn format_with_fill(&mut self, format_id: u32, fill: Fill) -> Result<u32, ModelError> {
        let mut format = self.existing_format(format_id)?;
        format.fill = Some(ComponentBinding::applied(self.fills.intern(fill)));
        Ok(self.intern_format(format))
    }

    pub fn format_with_font(&mut self, format_id: u32, font: Font) -> Result<u32, ModelError> {
        let mut format = self.existing_format(format_id)?;
        format.font = Some(ComponentBinding::applied(self.fonts.intern(font)));
        Ok(self.intern_format(format))
    }

    pub fn format_with_number_format(
        &mut self,
        format_id: u32,
        number_format: NumberFormat,
    ) -> Result<u32, ModelError> {
        let mut format = self.existing_format(format_id)?;
        format.number_format = Some(ComponentBinding::applied(
            self.number_formats.intern(number_format),
        ));
        Ok(self.intern_format(format))
    }

    pub fn format_with_protection(
        &mut self,
        format_id: u32,
        protection: Protection,
    ) -> Result<u32, ModelError> {
        let mut format = self.existing_format(format_id)?;
        format.protection = Some(ComponentBinding::applied(self.protections.intern(protection)));
        Ok(self.intern_format(format))
    }

    /// Component accessors by interned id.
    pub fn alignment(&self, id: u32) -> Option<&Alignment> {
        self.alignments.get(id)
    }

    pub fn border(&self, id: u32) -> Option<&Border> {
        self.borders.get(id)
    }

    pub fn fill(&self, id: u32) -> Option<&Fill> {
        self.fills.get(id)
    }

    pub fn font(&self, id: u32) -> Option<&Font> {
        self.fonts.get(id)
    }

    pub fn number_format(&self, id: u32) -> Option<&NumberFormat> {
        self.number_formats.get(id)
    }

    pub fn protection(&self, id: u32) -> Option<&Protection> {
        self.protections.get(id)
    }

    /// Resolve the applied number format of a format, if any.
    pub fn format_number_format(&self, format_id: u32) -> Option<&NumberFormat> {
        let binding = self.format(format_id)?.number_format?;
        if !binding.applied {
            return None;
        }
        self.number_format(binding.id)
    }

    /// Component table dumps for the serializer boundary, in id order.
    pub fn alignments(&self) -> &[Alignment] {
        self.alignments.records()
    }

    pub fn borders(&self) -> &[Border] {
        self.borders.records()
    }

    pub fn fills(&self) -> &[Fill] {
        self.fills.records()
    }

    pub fn fonts(&self) -> &[Font] {
        self.fonts.records()
    }

    pub fn number_formats(&self) -> &[NumberFormat] {
        self.number_formats.records()
    }

    pub fn protections(&self) -> &[Protection] {
        self.protections.records()
    }

    /// Register a named style template with no components bound.
    pub fn create_style(&mut self, name: impl Into<String>) -> Result<u32, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::InvalidParameter("empty style name".to_string()));
        }
        if self.styles.contains_key(&name) {
            return Err(ModelError::InvalidParameter(format!(
                "style {name:?} already exists"
            )));
        }
        let id = self.intern_format(Format {
            style: Some(name.clone()),
            ..Default::default()
        });
        self.styles.insert(name, id);
        Ok(id)
    }

    /// Format id of a named style.
    pub fn style(&self, name: &str) -> Result<u32, ModelError> {
        self.styles
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::KeyNotFound(format!("style {name:?}")))
    }

    pub fn has_style(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    pub fn style_names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    /// Point a named style at a new template format.
    ///
    /// The format must exist and carry the style's name, which the
    /// copy-on-write setters preserve:
    ///
    /// ```
    /// # use sheet_model::{NumberFormat, Stylesheet};
    /// let mut sheet = Stylesheet::new();
    /// sheet.create_style("percent").unwrap();
    /// let id = sheet.style("percent").unwrap();
    /// let id = sheet
    ///     .format_with_number_format(id, NumberFormat::percentage())
    ///     .unwrap();
    /// sheet.restyle("percent", id).unwrap();
    /// ```
    pub fn restyle(&mut self, name: &str, format_id: u32) -> Result<(), ModelError> {
        if !self.styles.contains_key(name) {
            return Err(ModelError::KeyNotFound(format!("style {name:?}")));
        }
        let format = self.existing_format(format_id)?;
        if format.style.as_deref() != Some(name) {
            return Err(ModelError::InvalidParameter(format!(
                "format {format_id} does not belong to style {name:?}"
            )));
        }
        self.styles.insert(name.to_string(), format_id);
        Ok(())
    }

    /// Record one more live cell binding of `format_id`.
    pub fn add_format_reference(&mut self, format_id: u32) -> Result<(), ModelError> {
        let slot = self
            .format_references
            .get_mut(format_id as usize)
            .ok_or_else(|| ModelError::KeyNotFound(format!("format id {format_id}")))?;
        *slot += 1;
        Ok(())
    }

    /// Drop one live cell binding of `format_id`. Never underflows.
    pub fn release_format_reference(&mut self, format_id: u32) -> Result<(), ModelError> {
        let slot = self
            .format_references
            .get_mut(format_id as usize)
            .ok_or_else(|| ModelError::KeyNotFound(format!("format id {format_id}")))?;
        if *slot == 0 {
            return Err(ModelError::InvalidParameter(format!(
                "format id {format_id} has no live references"
            )));
        }
        *slot -= 1;
        Ok(())
    }

    pub fn format_reference_count(&self, format_id: u32) -> u32 {
        self.format_references
            .get(format_id as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Recompute reference counts from the set of live cell bindings.
    pub(crate) fn recount_format_references<I>(&mut self, bound: I)
    where
        I: IntoIterator<Item = u32>,
    {
        self.format_references.clear();
        self.format_references.resize(self.formats.len(), 0);
        for id in bound {
            if let Some(slot) = self.format_references.get_mut(id as usize) {
                *slot += 1;
            }
        }
    }
}

impl<'de> Deserialize<'de> for Stylesheet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(default)]
            alignments: InternTable<Alignment>,
            #[serde(default)]
            borders: InternTable<Border>,
            #[serde(default)]
            fills: InternTable<Fill>,
            #[serde(default)]
            fonts: InternTable<Font>,
            #[serde(default)]
            number_formats: InternTable<NumberFormat>,
            #[serde(default)]
            protections: InternTable<Protection>,
            #[serde(default)]
            formats: InternTable<Format>,
            #[serde(default)]
            styles: BTreeMap<String, u32>,
        }

        let helper = Helper::deserialize(deserializer)?;
        let format_references = vec![0; helper.formats.len()];
        Ok(Stylesheet {
            alignments: helper.alignments,
            borders: helper.borders,
            fills: helper.fills,
            fonts: helper.fonts,
            number_formats: helper.number_formats,
            protections: helper.protections,
            formats: helper.formats,
            styles: helper.styles,
            format_references,
        })
    }
}
