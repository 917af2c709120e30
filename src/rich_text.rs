use serde::{Deserialize, Serialize};

use crate::style::Font;

/// Multi-style (rich) text for a single cell.
///
/// `text` holds the full visible string; `runs` carry font overrides for
/// ranges of it. Run `start`/`end` offsets are **Unicode scalar value**
/// (`char`) indices into `text`, not UTF-8 byte offsets, so they survive
/// re-encoding but do not correspond to user-perceived grapheme clusters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RichText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<TextRun>,
    /// Phonetic reading hint (furigana), carried for the serializer boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
}

impl RichText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
            phonetic: None,
        }
    }

    /// The visible string without formatting.
    pub fn plain_text(&self) -> &str {
        &self.text
    }

    /// Returns true if no run carries a font override.
    pub fn is_plain(&self) -> bool {
        self.runs.iter().all(|run| run.font.is_none())
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Build rich text from consecutive styled segments.
    pub fn from_segments(segments: impl IntoIterator<Item = (String, Option<Font>)>) -> Self {
        let mut text = String::new();
        let mut runs = Vec::new();
        let mut cursor = 0usize;

        for (segment, font) in segments {
            let start = cursor;
            cursor += segment.chars().count();
            text.push_str(&segment);
            runs.push(TextRun {
                start,
                end: cursor,
                font,
            });
        }

        Self {
            text,
            runs,
            phonetic: None,
        }
    }

    /// The slice of `text` a run covers.
    pub fn run_text(&self, run: &TextRun) -> &str {
        slice_by_char_range(&self.text, run.start, run.end)
    }
}

impl PartialEq for RichText {
    fn eq(&self, other: &Self) -> bool {
        // Visible text and style runs only; the phonetic hint is carried
        // alongside without taking part in equality.
        self.text == other.text && self.runs == other.runs
    }
}

impl From<&str> for RichText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RichText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A font override over a `char` range of the text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

fn slice_by_char_range(text: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let mut start_byte = None;
    let mut end_byte = None;
    for (i, (byte_idx, _)) in text.char_indices().enumerate() {
        if i == start {
            start_byte = Some(byte_idx);
        }
        if i == end {
            end_byte = Some(byte_idx);
            break;
        }
    }
    let start_byte = start_byte.unwrap_or(text.len());
    let end_byte = end_byte.unwrap_or(text.len());
    &text[start_byte..end_byte]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    fn green_cambria() -> Font {
        Font {
            name: Some("Cambria".to_string()),
            size_100pt: Some(4000),
            color: Some(Color::new_argb(0xFF00FF00)),
            ..Default::default()
        }
    }

    #[test]
    fn equality_covers_text_and_runs() {
        let mut a = RichText::default();
        let b = RichText::default();
        assert_eq!(a, b);

        a.runs.push(TextRun::default());
        assert_ne!(a, b);
        let mut b = RichText::default();
        b.runs.push(TextRun::default());
        assert_eq!(a, b);

        let formatted = RichText::from_segments([("x".to_string(), Some(green_cambria()))]);

        let mut color_differs = green_cambria();
        color_differs.color = Some(Color::red());
        assert_ne!(
            formatted,
            RichText::from_segments([("x".to_string(), Some(color_differs))])
        );

        let mut name_differs = green_cambria();
        name_differs.name = Some("Calibri".to_string());
        assert_ne!(
            formatted,
            RichText::from_segments([("x".to_string(), Some(name_differs))])
        );

        let mut size_differs = green_cambria();
        size_differs.size_100pt = Some(4100);
        assert_ne!(
            formatted,
            RichText::from_segments([("x".to_string(), Some(size_differs))])
        );
    }

    #[test]
    fn phonetic_hint_does_not_affect_equality() {
        let mut a = RichText::new("取引");
        let b = RichText::new("取引");
        a.phonetic = Some("トリヒキ".to_string());
        assert_eq!(a, b);
        assert_eq!(a.phonetic.as_deref(), Some("トリヒキ"));
    }

    #[test]
    fn segments_build_char_indexed_runs() {
        let rich = RichText::from_segments([
            ("Hi ".to_string(), None),
            (
                "世界".to_string(),
                Some(Font::default().with_bold(true)),
            ),
        ]);

        assert_eq!(rich.plain_text(), "Hi 世界");
        assert_eq!(rich.char_len(), 5);
        assert_eq!(rich.runs.len(), 2);
        assert_eq!((rich.runs[0].start, rich.runs[0].end), (0, 3));
        assert_eq!((rich.runs[1].start, rich.runs[1].end), (3, 5));
        assert_eq!(rich.run_text(&rich.runs[1]), "世界");
        assert!(!rich.is_plain());
    }

    #[test]
    fn unstyled_runs_are_plain() {
        assert!(RichText::new("just text").is_plain());
        assert!(RichText::from_segments([("a".to_string(), None)]).is_plain());
    }
}
