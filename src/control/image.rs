use std::any::Any;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::canvas::Canvas;
use crate::error::{LayoutError, Result};
use crate::geometry::{HorizontalAlignment, Length, Rectangle, Size, REFERENCE_DPI};

use super::{BoxModel, Control, ControlId, ControlKind, LayoutContext};

/// Decode a `data:<mime>;base64,<data>` URI into raw bytes.
pub fn decode_data_uri(src: &str) -> Result<Vec<u8>> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(LayoutError::Render(format!(
            "image source must be a base64 data URI (e.g. `data:image/png;base64,...`), got {preview:?}"
        )));
    };
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| LayoutError::Render("data URI is missing the `,` separator".into()))?;
    if !header.contains(";base64") {
        return Err(LayoutError::Render(
            "only base64-encoded data URIs are supported".into(),
        ));
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| LayoutError::Render(format!("base64 decode error: {e}")))
}

/// Pixel dimensions of the encoded image in `src`.
pub fn probe_dimensions(src: &str) -> Result<(u32, u32)> {
    let bytes = decode_data_uri(src)?;
    let img = ::image::load_from_memory(&bytes)
        .map_err(|e| LayoutError::Render(format!("image decode error: {e}")))?;
    Ok((img.width(), img.height()))
}

/// A bitmap from a data URI.
///
/// Without an explicit size the image takes its pixel dimensions (at
/// 96 dpi); with one explicit side the other follows the aspect ratio.
pub struct Image {
    id: ControlId,
    pub layout: BoxModel,
    pub src: String,
    pixels: Option<(u32, u32)>,
    content: Size,
}

impl Image {
    pub fn new(src: impl Into<String>) -> Self {
        let src = src.into();
        let pixels = match probe_dimensions(&src) {
            Ok(dims) => Some(dims),
            Err(e) => {
                log::warn!("image has no usable intrinsic size: {e}");
                None
            }
        };
        Self {
            id: ControlId::next(),
            layout: BoxModel::new().with_horizontal(HorizontalAlignment::Left),
            src,
            pixels,
            content: Size::ZERO,
        }
    }

    pub fn with_layout(mut self, layout: BoxModel) -> Self {
        self.layout = layout;
        self
    }

    /// Decoded pixel dimensions, if the source could be read.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        self.pixels
    }
}

fn explicit(length: Option<Length>) -> bool {
    length.is_some_and(|l| !l.is_auto())
}

impl Control for Image {
    fn id(&self) -> ControlId {
        self.id
    }

    fn kind(&self) -> ControlKind {
        ControlKind::Image
    }

    fn measure(&mut self, ctx: &LayoutContext<'_>, _framed: Size, remaining: Size) -> Result<Size> {
        let known = (explicit(self.layout.width), explicit(self.layout.height));
        let pixels = self.pixels;
        let content = &mut self.content;
        self.layout.measure(ctx, remaining, |available| {
            let size = match (pixels, known) {
                (_, (true, true)) => available,
                (None, _) => Size::ZERO,
                (Some((w, h)), (true, false)) if w > 0 => {
                    Size::new(available.width, available.width * h as f32 / w as f32)
                }
                (Some((w, h)), (false, true)) if h > 0 => {
                    Size::new(available.height * w as f32 / h as f32, available.height)
                }
                (Some((w, h)), _) => {
                    let scale = ctx.dpi / REFERENCE_DPI;
                    Size::new(w as f32 * scale, h as f32 * scale)
                }
            };
            *content = size;
            Ok(size)
        })
    }

    fn arrange(&mut self, ctx: &LayoutContext<'_>, _framed: Size, remaining: Size) -> Result<Size> {
        let content = self.content;
        self.layout
            .arrange(ctx, remaining, |slot| Ok(Size::new(slot.width, content.height)))
    }

    fn render(&self, canvas: &mut dyn Canvas, _ctx: &LayoutContext<'_>, _parent: Size) -> Result<Size> {
        self.layout.render(canvas, |c, inner| {
            if !inner.is_empty() {
                c.draw_bitmap(inner, &self.src);
            }
            Ok(Size::ZERO)
        })
    }

    fn desired_size(&self) -> Size {
        self.layout.desired()
    }

    fn arrangement(&self) -> Rectangle {
        self.layout.arrangement()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Culture;
    use crate::fonts::FontManager;

    /// A 4×2 PNG encoded on the fly.
    fn png_uri() -> String {
        let img = ::image::RgbaImage::from_pixel(4, 2, ::image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            ::image::ImageFormat::Png,
        )
        .unwrap();
        format!("data:image/png;base64,{}", BASE64_STD.encode(&bytes))
    }

    #[test]
    fn data_uri_errors() {
        assert!(decode_data_uri("http://example.com/a.png").is_err());
        assert!(decode_data_uri("data:image/png,abc").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert_eq!(decode_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
    }

    #[test]
    fn intrinsic_and_aspect_sizes() {
        let culture = Culture::default();
        let fonts = FontManager::default();
        let ctx = LayoutContext {
            dpi: 96.0,
            full_page: Size::new(500.0, 500.0),
            culture: &culture,
            text: &fonts,
        };
        let mut img = Image::new(png_uri());
        assert_eq!(img.pixel_size(), Some((4, 2)));
        let desired = img.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        assert_eq!(desired, Size::new(4.0, 2.0));

        let mut wide = Image::new(png_uri());
        wide.layout.width = Some(Length::px(40.0));
        let desired = wide.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        assert_eq!(desired, Size::new(40.0, 20.0));
    }

    #[test]
    fn unreadable_source_measures_empty() {
        let culture = Culture::default();
        let fonts = FontManager::default();
        let ctx = LayoutContext {
            dpi: 96.0,
            full_page: Size::new(500.0, 500.0),
            culture: &culture,
            text: &fonts,
        };
        let mut img = Image::new("not-a-uri");
        assert!(img.pixel_size().is_none());
        let desired = img.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        assert_eq!(desired, Size::ZERO);
    }
}
