//! Headline layout: width-budgeted word wrapping, shrink-to-fit sizing and
//! highlight span scanning.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};

/// Line height is a fixed multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Measuring context for a single line of text at a given font size.
///
/// The compositor supplies a real font-backed implementation; tests can use
/// a fixed-advance mock to keep layout decisions deterministic.
pub trait TextMeasure {
    fn line_width(&self, text: &str, size: f32) -> f32;
}

/// `TextMeasure` backed by an `ab_glyph` font (advances plus kerning).
pub struct FontMeasure<'a> {
    font: &'a FontVec,
}

impl<'a> FontMeasure<'a> {
    pub fn new(font: &'a FontVec) -> Self {
        Self { font }
    }
}

impl TextMeasure for FontMeasure<'_> {
    fn line_width(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let glyph = scaled.glyph_id(ch);
            if let Some(previous) = previous {
                width += scaled.kern(previous, glyph);
            }
            width += scaled.h_advance(glyph);
            previous = Some(glyph);
        }
        width
    }
}

pub fn line_height(size: f32) -> f32 {
    size * LINE_HEIGHT_FACTOR
}

/// Wraps `text` so that no line's measured width exceeds `max_width`,
/// breaking only at word boundaries. A single word wider than the budget
/// stays alone on its own overflowing line. The trailing line is always
/// emitted, even for empty input.
pub fn wrap_text(measure: &dyn TextMeasure, text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if current.is_empty() || measure.line_width(&candidate, size) <= max_width {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }

    lines.push(current);
    lines
}

/// A headline block after shrink-to-fit sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedBlock {
    pub font_size: f32,
    pub lines: Vec<String>,
}

impl FittedBlock {
    pub fn line_height(&self) -> f32 {
        line_height(self.font_size)
    }

    pub fn block_height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height()
    }
}

/// Shrinks the font size from `max_size` in `step` decrements until the
/// wrapped block fits `max_height`, stopping at `min_size`. The floor size is
/// accepted even if the block still overflows.
pub fn fit_block(
    measure: &dyn TextMeasure,
    text: &str,
    max_width: f32,
    max_height: f32,
    max_size: f32,
    min_size: f32,
    step: f32,
) -> FittedBlock {
    let mut size = max_size;
    loop {
        let lines = wrap_text(measure, text, size, max_width);
        let block_height = lines.len() as f32 * line_height(size);
        if block_height <= max_height || size <= min_size {
            return FittedBlock {
                font_size: size,
                lines,
            };
        }
        size = (size - step).max(min_size);
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Finds every case-insensitive occurrence of `phrase` in `line` by a
/// left-to-right scan that advances one character past each match start.
/// Returns char-index spans `(start, end)`.
pub fn phrase_spans(line: &str, phrase: &str) -> Vec<(usize, usize)> {
    let hay: Vec<char> = line.chars().map(fold).collect();
    let needle: Vec<char> = phrase.chars().map(fold).collect();
    if needle.is_empty() || needle.len() > hay.len() {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut start = 0;
    while start + needle.len() <= hay.len() {
        if hay[start..start + needle.len()] == needle[..] {
            spans.push((start, start + needle.len()));
        }
        start += 1;
    }
    spans
}

/// Slices `line` by char indices (as produced by [`phrase_spans`]).
pub fn char_slice(line: &str, start: usize, end: usize) -> &str {
    let mut indices = line.char_indices().map(|(i, _)| i);
    let byte_start = indices.clone().nth(start).unwrap_or(line.len());
    let byte_end = indices.nth(end).unwrap_or(line.len());
    &line[byte_start..byte_end]
}
