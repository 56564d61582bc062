//! Font loading and text measurement using `ttf-parser`.
//!
//! Text shaping is not the engine's job: controls only need word-wrapped
//! line breaks and the resulting box size, which is what [`TextMeasurer`]
//! provides. [`FontManager`] is the default implementation; it measures glyph
//! advances from loaded TTF/OTF bytes, or falls back to Helvetica-like
//! heuristic metrics when no font file is available.

use std::collections::HashMap;

use crate::error::{LayoutError, Result};
use crate::geometry::Size;
use crate::style::TextStyle;

/// Word-wrap measurement consumed by text-bearing controls.
pub trait TextMeasurer {
    /// Width in pixels of a single unwrapped line.
    fn text_width(&self, style: &TextStyle, dpi: f32, text: &str) -> f32;

    /// Distance between consecutive baselines, in pixels.
    fn line_height(&self, style: &TextStyle, dpi: f32) -> f32;

    /// Distance from the top of a line box to its baseline, in pixels.
    fn ascent(&self, style: &TextStyle, dpi: f32) -> f32;

    /// Break `text` into lines no wider than `max_width` where possible.
    /// Words wider than `max_width` overflow on a line of their own.
    fn wrap(&self, style: &TextStyle, dpi: f32, text: &str, max_width: f32) -> Vec<String> {
        wrap_text(text, max_width, |candidate| {
            self.text_width(style, dpi, candidate)
        })
    }

    /// Size of `text` after wrapping at `max_width`.
    fn measure(&self, style: &TextStyle, dpi: f32, text: &str, max_width: f32) -> Size {
        let lines = self.wrap(style, dpi, text, max_width);
        let width = lines
            .iter()
            .map(|l| self.text_width(style, dpi, l))
            .fold(0.0f32, f32::max);
        Size::new(width, lines.len() as f32 * self.line_height(style, dpi))
    }
}

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

impl FontData {
    fn synthetic() -> Self {
        Self {
            bytes: Vec::new(),
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
            line_gap: 0.0,
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn for_style(style: &TextStyle) -> Self {
        Self {
            family: style.family.clone(),
            bold: style.bold,
            italic: style.italic,
        }
    }
}

/// Manages loaded fonts.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    /// Fallback metrics if no font is loaded for a key.
    default_key: FontKey,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey {
                family: "Helvetica".to_string(),
                bold: false,
                italic: false,
            },
        }
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(&mut self, family: &str, bold: bool, italic: bool, bytes: Vec<u8>) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| LayoutError::Render(format!("failed to parse font {family:?}: {e}")))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        };

        let key = FontKey {
            family: family.to_string(),
            bold,
            italic,
        };

        if self.fonts.values().all(|d| d.bytes.is_empty()) {
            self.default_key = key.clone();
        }
        log::debug!("loaded font {key:?} ({} units/em)", data.units_per_em);
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Register builtin Helvetica (regular and bold) with synthetic metrics,
    /// for when no TTF is available.
    pub fn ensure_default(&mut self) {
        if self.fonts.is_empty() {
            for bold in [false, true] {
                self.fonts.insert(
                    FontKey {
                        family: "Helvetica".to_string(),
                        bold,
                        italic: false,
                    },
                    FontData::synthetic(),
                );
            }
        }
    }

    /// Font data for a key, falling back to the default face.
    pub fn get(&self, key: &FontKey) -> Option<&FontData> {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&self.default_key))
    }

    /// Measure the width of a string at a given font size (in px).
    /// If we have actual font bytes, we parse glyph advances. Otherwise we
    /// use an average character width heuristic (0.5 × font_size per char).
    pub fn measure_text_width(&self, text: &str, font_size: f32, key: &FontKey) -> f32 {
        let heuristic = || {
            // Bold is ~10 % wider.
            let avg = if key.bold { 0.55 } else { 0.5 };
            text.chars().count() as f32 * font_size * avg
        };

        let Some(data) = self.get(key).filter(|d| !d.bytes.is_empty()) else {
            return heuristic();
        };

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        // Fallback for missing glyph
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => heuristic(),
        }
    }

    /// Get the ascender in px for the given font.
    pub fn ascender_px(&self, font_size: f32, key: &FontKey) -> f32 {
        match self.get(key) {
            Some(data) => data.ascender * font_size / data.units_per_em,
            None => font_size * 0.75,
        }
    }

    /// Get font bytes for embedding or outlining.
    pub fn font_bytes(&self, key: &FontKey) -> Option<&[u8]> {
        self.get(key).and_then(|d| {
            if d.bytes.is_empty() {
                None
            } else {
                Some(d.bytes.as_slice())
            }
        })
    }
}

impl Default for FontManager {
    fn default() -> Self {
        let mut mgr = Self::new();
        mgr.ensure_default();
        mgr
    }
}

impl TextMeasurer for FontManager {
    fn text_width(&self, style: &TextStyle, dpi: f32, text: &str) -> f32 {
        self.measure_text_width(text, style.size_px(dpi), &FontKey::for_style(style))
    }

    fn line_height(&self, style: &TextStyle, dpi: f32) -> f32 {
        style.size_px(dpi) * style.line_height
    }

    fn ascent(&self, style: &TextStyle, dpi: f32) -> f32 {
        self.ascender_px(style.size_px(dpi), &FontKey::for_style(style))
    }
}

/// Word-wrap text to fit within `max_width` pixels. Returns a vec of lines.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    // Split on existing newlines first
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            if measure(&candidate) > max_width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = word.to_string();
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
