use serde::{Deserialize, Serialize};

use crate::reference::{CellReference, RangeReference};

fn default_zoom() -> u16 {
    100
}

fn is_default_zoom(z: &u16) -> bool {
    *z == 100
}

/// Per-sheet view state: frozen panes, cursor and zoom.
///
/// View state is presentation-only; it never affects values, formats or
/// structural edits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetView {
    /// Top-left cell of the scrollable area. `B2` freezes row 1 and
    /// column A; `None` means no frozen panes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen: Option<CellReference>,
    /// The focused cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_cell: Option<CellReference>,
    /// The selected region, which contains the active cell by convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<RangeReference>,
    /// Zoom percentage (100 = normal).
    #[serde(default = "default_zoom", skip_serializing_if = "is_default_zoom")]
    pub zoom_scale: u16,
}

impl Default for SheetView {
    fn default() -> Self {
        Self {
            frozen: None,
            active_cell: None,
            selection: None,
            zoom_scale: 100,
        }
    }
}

impl SheetView {
    pub fn has_frozen_panes(&self) -> bool {
        self.frozen.is_some()
    }

    /// Number of fully frozen rows above the scrollable area.
    pub fn frozen_rows(&self) -> u32 {
        self.frozen.map_or(0, |cell| cell.row - 1)
    }

    /// Number of fully frozen columns left of the scrollable area.
    pub fn frozen_columns(&self) -> u32 {
        self.frozen.map_or(0, |cell| cell.column - 1)
    }
}
