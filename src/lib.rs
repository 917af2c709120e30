//! `sheet-model` defines an in-memory spreadsheet document model.
//!
//! The crate is intentionally self-contained so it can sit under:
//! - file format import/export layers
//! - a calculation engine
//! - IPC and WASM boundaries via `serde` (JSON-safe schema)
//!
//! It covers A1-style coordinate and range algebra, a deduplicating style
//! store, sparse worksheets with structural editing (row/column insertion and
//! deletion that carries merges and named ranges along), typed cell values
//! with formula-bar input inference, and serial date conversion in both the
//! 1900 (Lotus leap-bug compatible) and 1904 calendars.

mod cell;
mod datetime;
mod error;
mod format;
mod names;
mod reference;
mod rich_text;
mod style;
mod stylesheet;
mod value;
mod view;
mod workbook;
mod worksheet;

pub use cell::{check_string, parse_input, Cell, CellKey, Comment, Hyperlink, ParsedInput, MAX_STRING_LENGTH};
pub use datetime::{Calendar, Date, DateTime, Time, Timedelta};
pub use error::ModelError;
pub use format::{ComponentBinding, Format};
pub use names::{
    validate_defined_name, validate_sheet_title, NamedRange, DEFINED_NAME_MAX_LEN,
    SHEET_TITLE_MAX_LEN,
};
pub use reference::{
    column_index_from_letters, column_letters_from_index, CellReference, RangeReference,
    MAX_COLUMNS, MAX_ROWS,
};
pub use rich_text::{RichText, TextRun};
pub use style::{
    Alignment, Border, BorderSide, BorderStyle, Color, Fill, FillPattern, Font,
    HorizontalAlignment, NumberFormat, Protection, VerticalAlignment,
};
pub use stylesheet::{InternTable, Stylesheet};
pub use value::{CellValue, ErrorValue};
pub use view::SheetView;
pub use workbook::{Workbook, WorkbookRange};
pub use worksheet::{ColumnProperties, RowProperties, Worksheet, WorksheetId};

/// Current serialization schema version.
///
/// This is embedded into [`Workbook`] to enable forward-compatible payloads.
pub const SCHEMA_VERSION: u32 = 1;
