//! Layout config – the frozen page representation between pagination and the
//! output backends. Every command carries page-absolute pixel coordinates and
//! the clip rectangle that was active when it was drawn, so a backend can
//! render a page without knowing anything about controls or zones.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A complete paginated document ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Page width in pixels at `dpi`.
    pub page_width: f32,
    /// Page height in pixels at `dpi`.
    pub page_height: f32,
    pub dpi: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One physical page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub commands: Vec<PageCommand>,
}

/// `[left, top, width, height]` in page pixels.
pub type ClipRect = [f32; 4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    /// Size in points.
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeSpec {
    pub width: f32,
    pub color: [f32; 4],
}

/// A single draw operation on a physical page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PageCommand {
    Text {
        x: f32,
        /// Top of the line box.
        y: f32,
        /// Absolute y of the baseline.
        baseline: f32,
        /// Measured advance width of `text`.
        width: f32,
        text: String,
        font: FontSpec,
        color: [f32; 4],
        clip: ClipRect,
    },
    Line {
        from: [f32; 2],
        to: [f32; 2],
        stroke: StrokeSpec,
        clip: ClipRect,
    },
    Rect {
        rect: [f32; 4],
        fill: Option<[f32; 4]>,
        stroke: Option<StrokeSpec>,
        clip: ClipRect,
    },
    Image {
        rect: [f32; 4],
        src: String,
        clip: ClipRect,
    },
}

impl PageCommand {
    pub fn clip(&self) -> ClipRect {
        match self {
            PageCommand::Text { clip, .. }
            | PageCommand::Line { clip, .. }
            | PageCommand::Rect { clip, .. }
            | PageCommand::Image { clip, .. } => *clip,
        }
    }
}

impl LayoutConfig {
    pub fn new(page_width: f32, page_height: f32, dpi: f32) -> Self {
        Self {
            title: Self::default_title(),
            page_width,
            page_height,
            dpi,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "folio output".to_string()
    }

    /// Pixels to PDF points at this config's DPI.
    pub fn to_pt(&self, px: f32) -> f32 {
        px * 72.0 / self.dpi
    }

    pub fn page_width_pt(&self) -> f32 {
        self.to_pt(self.page_width)
    }

    pub fn page_height_pt(&self) -> f32 {
        self.to_pt(self.page_height)
    }

    /// Every text run on `page`, in drawing order.
    pub fn texts(&self, page: usize) -> Vec<&str> {
        self.pages
            .get(page)
            .map(|p| {
                p.commands
                    .iter()
                    .filter_map(|c| match c {
                        PageCommand::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
