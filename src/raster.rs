//! PNG renderer – rasterises a [`LayoutConfig`] with `tiny-skia`, one PNG per
//! page.
//!
//! Text is drawn from glyph outlines when the [`FontManager`] holds real font
//! bytes for the run's face. With synthetic metrics only, each glyph is
//! greeked as a filled block of its measured advance so the page still shows
//! where text sits.

use std::collections::HashMap;

use tiny_skia::{
    FillRule, FilterQuality, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};
use ttf_parser::OutlineBuilder;

use crate::control::image::decode_data_uri;
use crate::error::{LayoutError, Result};
use crate::fonts::{FontKey, FontManager};
use crate::layout_config::{ClipRect, FontSpec, LayoutConfig, PageCommand, StrokeSpec};

/// Render every page of `config` to PNG bytes at `raster_dpi`.
pub fn render_png_pages(config: &LayoutConfig, fonts: &FontManager, raster_dpi: f32) -> Result<Vec<Vec<u8>>> {
    if !(raster_dpi > 0.0 && config.dpi > 0.0) {
        return Err(LayoutError::InvalidConfiguration(format!(
            "raster dpi {raster_dpi} / layout dpi {} must be positive",
            config.dpi
        )));
    }
    let scale = raster_dpi / config.dpi;
    let width_px = (config.page_width * scale).round().max(1.0) as u32;
    let height_px = (config.page_height * scale).round().max(1.0) as u32;
    let transform = Transform::from_scale(scale, scale);

    let mut images: HashMap<&str, Option<Pixmap>> = HashMap::new();
    let mut pngs = Vec::with_capacity(config.pages.len());

    for page in &config.pages {
        let mut pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
            LayoutError::InvalidConfiguration(format!(
                "invalid raster size {width_px}x{height_px} at {raster_dpi} DPI"
            ))
        })?;
        pixmap.fill(tiny_skia::Color::WHITE);

        let mut masks: HashMap<[u32; 4], Option<Mask>> = HashMap::new();
        for command in &page.commands {
            let clip = command.clip();
            let mask = masks
                .entry(clip.map(f32::to_bits))
                .or_insert_with(|| clip_mask(clip, transform, width_px, height_px));
            let mut surface = Surface {
                pixmap: &mut pixmap,
                transform,
                mask: mask.as_ref(),
            };
            match command {
                PageCommand::Rect {
                    rect, fill, stroke, ..
                } => surface.rect(*rect, *fill, *stroke),
                PageCommand::Line { from, to, stroke, .. } => surface.line(*from, *to, *stroke),
                PageCommand::Text {
                    x,
                    baseline,
                    width,
                    text,
                    font,
                    color,
                    ..
                } => surface.text(fonts, *x, *baseline, *width, text, font, *color, config.dpi),
                PageCommand::Image { rect, src, .. } => {
                    let image = images.entry(src.as_str()).or_insert_with(|| load_pixmap(src));
                    if let Some(image) = image.as_ref() {
                        surface.image(*rect, image);
                    }
                }
            }
        }

        let png = pixmap
            .encode_png()
            .map_err(|e| LayoutError::Render(format!("png encode failed: {e}")))?;
        pngs.push(png);
    }

    log::debug!("rasterised {} page(s) at {raster_dpi} dpi", pngs.len());
    Ok(pngs)
}

/// Coverage mask for `clip`. An empty clip leaves the mask empty, which
/// hides everything drawn through it.
fn clip_mask(clip: ClipRect, transform: Transform, width: u32, height: u32) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    if let Some(rect) = Rect::from_xywh(clip[0], clip[1], clip[2], clip[3]) {
        let path = PathBuilder::from_rect(rect);
        mask.fill_path(&path, FillRule::Winding, true, transform);
    }
    Some(mask)
}

fn load_pixmap(src: &str) -> Option<Pixmap> {
    let bytes = decode_data_uri(src)
        .map_err(|e| log::warn!("skipping image: {e}"))
        .ok()?;
    let decoded = ::image::load_from_memory(&bytes)
        .map_err(|e| log::warn!("skipping image: decode error: {e}"))
        .ok()?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (src_px, dst_px) in rgba.as_raw().chunks_exact(4).zip(pixmap.data_mut().chunks_exact_mut(4)) {
        let a = src_px[3];
        dst_px[0] = premul_u8(src_px[0], a);
        dst_px[1] = premul_u8(src_px[1], a);
        dst_px[2] = premul_u8(src_px[2], a);
        dst_px[3] = a;
    }
    Some(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

fn paint(color: [f32; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(tiny_skia::Color::from_rgba(
        color[0].clamp(0.0, 1.0),
        color[1].clamp(0.0, 1.0),
        color[2].clamp(0.0, 1.0),
        color[3].clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK));
    paint.anti_alias = true;
    paint
}

struct Surface<'p, 'm> {
    pixmap: &'p mut Pixmap,
    transform: Transform,
    mask: Option<&'m Mask>,
}

impl Surface<'_, '_> {
    fn fill(&mut self, path: &Path, color: [f32; 4]) {
        self.pixmap
            .fill_path(path, &paint(color), FillRule::Winding, self.transform, self.mask);
    }

    fn stroke(&mut self, path: &Path, stroke: StrokeSpec) {
        let style = Stroke {
            width: stroke.width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint(stroke.color), &style, self.transform, self.mask);
    }

    fn rect(&mut self, rect: [f32; 4], fill: Option<[f32; 4]>, stroke: Option<StrokeSpec>) {
        let Some(r) = Rect::from_xywh(rect[0], rect[1], rect[2], rect[3]) else {
            return;
        };
        let path = PathBuilder::from_rect(r);
        if let Some(fill) = fill {
            self.fill(&path, fill);
        }
        if let Some(stroke) = stroke {
            self.stroke(&path, stroke);
        }
    }

    fn line(&mut self, from: [f32; 2], to: [f32; 2], stroke: StrokeSpec) {
        let mut builder = PathBuilder::new();
        builder.move_to(from[0], from[1]);
        builder.line_to(to[0], to[1]);
        if let Some(path) = builder.finish() {
            self.stroke(&path, stroke);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        fonts: &FontManager,
        x: f32,
        baseline: f32,
        width: f32,
        text: &str,
        font: &FontSpec,
        color: [f32; 4],
        dpi: f32,
    ) {
        let key = FontKey {
            family: font.family.clone(),
            bold: font.bold,
            italic: font.italic,
        };
        let size_px = font.size * dpi / 72.0;
        let outlined = fonts
            .font_bytes(&key)
            .and_then(|bytes| ttf_parser::Face::parse(bytes, 0).ok())
            .and_then(|face| outline_text(&face, text, x, baseline, size_px));
        match outlined {
            Some(path) => self.fill(&path, color),
            None => self.greek(fonts, &key, x, baseline, width, text, size_px, color),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn greek(
        &mut self,
        fonts: &FontManager,
        key: &FontKey,
        x: f32,
        baseline: f32,
        width: f32,
        text: &str,
        size_px: f32,
        color: [f32; 4],
    ) {
        let glyphs = text.chars().count().max(1) as f32;
        let advance = width / glyphs;
        let height = fonts.ascender_px(size_px, key) * 0.7;
        let mut builder = PathBuilder::new();
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = x + i as f32 * advance + advance * 0.1;
            if let Some(r) = Rect::from_xywh(left, baseline - height, advance * 0.8, height) {
                builder.push_rect(r);
            }
        }
        if let Some(path) = builder.finish() {
            self.fill(&path, color);
        }
    }

    fn image(&mut self, rect: [f32; 4], image: &Pixmap) {
        let (src_w, src_h) = (image.width() as f32, image.height() as f32);
        if src_w <= 0.0 || src_h <= 0.0 {
            return;
        }
        let placement = Transform::from_row(rect[2] / src_w, 0.0, 0.0, rect[3] / src_h, rect[0], rect[1]);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            self.transform.pre_concat(placement),
            self.mask,
        );
    }
}

fn outline_text(face: &ttf_parser::Face<'_>, text: &str, x: f32, baseline: f32, size_px: f32) -> Option<Path> {
    let scale = size_px / face.units_per_em() as f32;
    let mut builder = GlyphPathBuilder {
        builder: PathBuilder::new(),
        origin_x: x,
        origin_y: baseline,
        scale,
    };
    for ch in text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            builder.origin_x += size_px * 0.5;
            continue;
        };
        face.outline_glyph(gid, &mut builder);
        builder.origin_x += face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
    }
    builder.builder.finish()
}

/// Glyph outline sink; font units are y-up, pages are y-down.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::PageLayout;

    fn page_with(commands: Vec<PageCommand>) -> LayoutConfig {
        let mut config = LayoutConfig::new(100.0, 50.0, 96.0);
        config.pages.push(PageLayout {
            page_index: 0,
            commands,
        });
        config
    }

    fn pixel(png: &[u8], x: u32, y: u32) -> [u8; 4] {
        let img = ::image::load_from_memory(png).unwrap().to_rgba8();
        img.get_pixel(x, y).0
    }

    #[test]
    fn fills_respect_the_clip() {
        let config = page_with(vec![PageCommand::Rect {
            rect: [0.0, 0.0, 100.0, 50.0],
            fill: Some([1.0, 0.0, 0.0, 1.0]),
            stroke: None,
            clip: [0.0, 0.0, 50.0, 50.0],
        }]);
        let pngs = render_png_pages(&config, &FontManager::default(), 96.0).unwrap();
        assert_eq!(pngs.len(), 1);
        assert_eq!(pixel(&pngs[0], 10, 10), [255, 0, 0, 255]);
        assert_eq!(pixel(&pngs[0], 80, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn raster_dpi_scales_the_page() {
        let config = page_with(Vec::new());
        let pngs = render_png_pages(&config, &FontManager::default(), 192.0).unwrap();
        let img = ::image::load_from_memory(&pngs[0]).unwrap();
        assert_eq!((img.width(), img.height()), (200, 100));
    }

    #[test]
    fn synthetic_text_is_greeked() {
        let config = page_with(vec![PageCommand::Text {
            x: 0.0,
            y: 0.0,
            baseline: 20.0,
            width: 60.0,
            text: "MMMMMM".into(),
            font: FontSpec {
                family: "Helvetica".into(),
                size: 18.0,
                bold: false,
                italic: false,
            },
            color: [0.0, 0.0, 0.0, 1.0],
            clip: [0.0, 0.0, 100.0, 50.0],
        }]);
        let pngs = render_png_pages(&config, &FontManager::default(), 96.0).unwrap();
        assert_eq!(pixel(&pngs[0], 5, 15), [0, 0, 0, 255]);
        assert_eq!(pixel(&pngs[0], 90, 15), [255, 255, 255, 255]);
    }

    #[test]
    fn bad_dpi_is_rejected() {
        let config = page_with(Vec::new());
        assert!(render_png_pages(&config, &FontManager::default(), 0.0).is_err());
    }
}
