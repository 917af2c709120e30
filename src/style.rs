use core::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An ARGB color.
///
/// Serialized as a `#AARRGGBB` hex string for schema friendliness.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub argb: u32,
}

impl Color {
    pub const fn new_argb(argb: u32) -> Self {
        Self { argb }
    }

    pub const fn black() -> Self {
        Self { argb: 0xFF000000 }
    }

    pub const fn white() -> Self {
        Self { argb: 0xFFFFFFFF }
    }

    pub const fn red() -> Self {
        Self { argb: 0xFFFF0000 }
    }

    fn to_hex(self) -> String {
        format!("#{:08X}", self.argb)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        let hex = s.strip_prefix('#').ok_or_else(|| {
            D::Error::custom("color must be a #AARRGGBB hex string (missing '#')")
        })?;
        if hex.len() != 8 {
            return Err(D::Error::custom(
                "color must be a #AARRGGBB hex string (8 hex digits)",
            ));
        }
        let argb = u32::from_str_radix(hex, 16).map_err(|_| D::Error::custom("invalid hex"))?;
        Ok(Color { argb })
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero_i16(v: &i16) -> bool {
    *v == 0
}

/// Font formatting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Font {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Font size in 1/100 points (e.g. 1100 = 11pt).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_100pt: Option<u16>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Font {
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Fill pattern kind (subset of the OOXML pattern table).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPattern {
    None,
    Solid,
    Gray125,
}

impl Default for FillPattern {
    fn default() -> Self {
        FillPattern::None
    }
}

/// Fill (background) formatting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Fill {
    #[serde(default)]
    pub pattern: FillPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

impl Fill {
    pub fn solid(foreground: Color) -> Self {
        Self {
            pattern: FillPattern::Solid,
            foreground: Some(foreground),
            background: None,
        }
    }
}

/// Border line style.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    None,
    Hair,
    Thin,
    Medium,
    Thick,
    Double,
    Dashed,
    Dotted,
}

impl Default for BorderStyle {
    fn default() -> Self {
        BorderStyle::None
    }
}

/// One edge of a cell border.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BorderSide {
    #[serde(default)]
    pub style: BorderStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Border formatting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Border {
    #[serde(default)]
    pub top: BorderSide,
    #[serde(default)]
    pub bottom: BorderSide,
    #[serde(default)]
    pub left: BorderSide,
    #[serde(default)]
    pub right: BorderSide,
    #[serde(default)]
    pub diagonal: BorderSide,
}

/// Horizontal alignment options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
}

/// Vertical alignment options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
    Justify,
}

/// Alignment formatting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Alignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<HorizontalAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalAlignment>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub wrap_text: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shrink_to_fit: bool,
    /// Text rotation in degrees (`-90..=90`; `255` is vertical stacked text).
    #[serde(default, skip_serializing_if = "is_zero_i16")]
    pub text_rotation: i16,
    #[serde(default, skip_serializing_if = "is_zero_i16")]
    pub indent: i16,
}

/// Cell protection flags.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Protection {
    pub locked: bool,
    pub hidden: bool,
}

impl Default for Protection {
    fn default() -> Self {
        Self {
            locked: true,
            hidden: false,
        }
    }
}

/// A number format code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumberFormat {
    pub code: String,
}

impl NumberFormat {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn general() -> Self {
        Self::new("General")
    }

    pub fn percentage() -> Self {
        Self::new("0%")
    }

    /// Format bound to bare date values.
    pub fn date() -> Self {
        Self::new("yyyy-mm-dd")
    }

    /// Format bound to combined date-time values.
    pub fn date_time() -> Self {
        Self::new("yyyy-mm-dd h:mm:ss")
    }

    /// Format bound to time-of-day values.
    pub fn time() -> Self {
        Self::new("h:mm:ss")
    }

    /// Elapsed-hours format bound to duration values. Not a date format.
    pub fn duration() -> Self {
        Self::new("[hh]:mm:ss")
    }

    /// Whether the code renders its value as a calendar date or time of day.
    ///
    /// Date/time tokens (`y m d h s`) are recognized outside quoted literals
    /// and bracket sections; a leading elapsed-time token (`[hh]`, `[mm]`,
    /// `[ss]`) marks a duration, which is not a date format.
    pub fn is_date_format(&self) -> bool {
        let mut saw_date_token = false;
        let mut in_quotes = false;
        let mut chars = self.code.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => in_quotes = !in_quotes,
                '\\' if !in_quotes => {
                    chars.next();
                }
                '[' if !in_quotes => {
                    let mut first_in_section = None;
                    for inner in chars.by_ref() {
                        if inner == ']' {
                            break;
                        }
                        if first_in_section.is_none() {
                            first_in_section = Some(inner);
                        }
                    }
                    if first_in_section
                        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's'))
                    {
                        return false;
                    }
                }
                'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' if !in_quotes => {
                    saw_date_token = true;
                }
                _ => {}
            }
        }
        saw_date_token
    }
}
