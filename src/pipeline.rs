//! Pipeline – ties together description parsing, tree building, pagination,
//! and rendering into a single function call.

use crate::control::Culture;
use crate::description::DocumentDescription;
use crate::document::Document;
use crate::fonts::FontManager;
use crate::geometry::{Length, Size, Thickness};
use crate::layout_config::LayoutConfig;
use crate::pagination::Generator;
use crate::raster::render_png_pages;
use crate::render::render_pdf;

use crate::error::Result;

const MM_PER_INCH: f32 = 25.4;

/// Page orientation for the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width and height swapped.
    Landscape,
}

/// Configuration for the generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata (default: "folio output").
    pub title: String,
    /// Layout DPI; all geometry is in pixels at this resolution.
    pub dpi: f32,
    /// Page width in millimetres (default: A4 = 210).
    pub page_width_mm: f32,
    /// Page height in millimetres (default: A4 = 297).
    pub page_height_mm: f32,
    /// Printable-area inset (default: 10mm all round).
    pub margin: Thickness,
    /// Page orientation; swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
    /// Number formatting for page numbers.
    pub culture: Culture,
    /// PNG output DPI; `None` uses `dpi`.
    pub raster_dpi: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "folio output".to_string(),
            dpi: 96.0,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin: Thickness::uniform(Length::mm(10.0)),
            orientation: PageOrientation::Portrait,
            culture: Culture::default(),
            raster_dpi: None,
        }
    }
}

impl PipelineConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width_mm(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width_mm,
            PageOrientation::Landscape => self.page_height_mm,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height_mm(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height_mm,
            PageOrientation::Landscape => self.page_width_mm,
        }
    }

    /// Physical page in pixels at `dpi`.
    pub fn page_size_px(&self) -> Size {
        let px = |mm: f32| mm / MM_PER_INCH * self.dpi;
        Size::new(px(self.effective_width_mm()), px(self.effective_height_mm()))
    }

    /// Page minus margins, in pixels.
    pub fn printable_size_px(&self) -> Size {
        let page = self.page_size_px();
        page.deflate(self.margin.to_rectangle(page, self.dpi))
    }

    /// Create an A4 landscape config.
    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    fn generator<'a>(&self, fonts: &'a FontManager) -> Generator<'a> {
        Generator::new(fonts, self.dpi, self.page_size_px(), self.margin)
            .with_culture(self.culture.clone())
    }
}

/// Paginate an already-built document.
pub fn layout_document(
    document: &mut Document,
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<LayoutConfig> {
    let mut layout = config.generator(fonts).generate(document)?;
    layout.title = config.title.clone();
    Ok(layout)
}

/// Generate only the layout config (no rendering) from a JSON description.
pub fn compute_layout_config(json: &str, config: &PipelineConfig) -> Result<LayoutConfig> {
    let mut document = DocumentDescription::from_json(json)?.build()?;
    layout_document(&mut document, config, &FontManager::default())
}

/// Full pipeline: JSON description → PDF bytes.
///
/// Returns `(pdf_bytes, layout_config)`.
pub fn generate_pdf(json: &str, config: &PipelineConfig) -> Result<(Vec<u8>, LayoutConfig)> {
    let layout = compute_layout_config(json, config)?;
    let bytes = render_pdf(&layout)?;
    Ok((bytes, layout))
}

/// Full pipeline: JSON description → one PNG per page.
pub fn generate_png_pages(json: &str, config: &PipelineConfig) -> Result<Vec<Vec<u8>>> {
    let fonts = FontManager::default();
    let mut document = DocumentDescription::from_json(json)?.build()?;
    let layout = layout_document(&mut document, config, &fonts)?;
    render_png_pages(&layout, &fonts, config.raster_dpi.unwrap_or(config.dpi))
}
