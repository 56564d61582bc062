//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Commands arrive in page pixels with the clip rectangle that was active
//! when they were drawn. Rectangles and lines are clipped geometrically;
//! text runs and images are kept only when their centre lies inside the clip.

use std::collections::{HashMap, HashSet};

use printpdf::*;

use crate::control::image::decode_data_uri;
use crate::error::{LayoutError, Result};
use crate::layout_config::{ClipRect, FontSpec, LayoutConfig, PageCommand, StrokeSpec};

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Page pixels to PDF user space (points, origin bottom-left).
struct PageSpace {
    scale: f32,
    height_pt: f32,
}

impl PageSpace {
    fn new(config: &LayoutConfig) -> Self {
        Self {
            scale: 72.0 / config.dpi,
            height_pt: config.page_height_pt(),
        }
    }

    fn len(&self, px: f32) -> Pt {
        Pt(px * self.scale)
    }

    fn point(&self, x: f32, y: f32) -> Point {
        Point {
            x: Pt(x * self.scale),
            y: Pt(self.height_pt - y * self.scale),
        }
    }
}

/// Render a LayoutConfig into PDF bytes.
///
/// Images whose `src` is not a base64 data URI, or whose bytes cannot be
/// decoded, are skipped with a `log::warn`.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>> {
    if !(config.dpi > 0.0) {
        return Err(LayoutError::Render(format!("invalid dpi {}", config.dpi)));
    }
    let page_w = Mm(config.page_width_pt() * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt() * 0.352778);
    let space = PageSpace::new(config);

    let mut doc = PdfDocument::new(&config.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let all_srcs: HashSet<&str> = config
        .pages
        .iter()
        .flat_map(|p| &p.commands)
        .filter_map(|c| match c {
            PageCommand::Image { src, .. } => Some(src.as_str()),
            _ => None,
        })
        .collect();

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in all_srcs {
        let bytes = match decode_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("skipping image: {e}");
                continue;
            }
        };
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("skipping image: decode error: {e}");
                continue;
            }
        };
        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping image: PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);
        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width: dyn_img.width(),
                px_height: dyn_img.height(),
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page| {
            let mut ops = Vec::new();
            for command in &page.commands {
                render_command(&mut ops, command, &space, &image_resources);
            }
            PdfPage::new(page_w, page_h, ops)
        })
        .collect();

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    log::debug!("rendered {} page(s) into {} PDF bytes", config.pages.len(), bytes.len());
    Ok(bytes)
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn builtin_font(font: &FontSpec) -> BuiltinFont {
    let family = font.family.to_ascii_lowercase();
    if family.contains("times") || (family.contains("serif") && !family.contains("sans")) {
        match (font.bold, font.italic) {
            (true, true) => BuiltinFont::TimesBoldItalic,
            (true, false) => BuiltinFont::TimesBold,
            (false, true) => BuiltinFont::TimesItalic,
            (false, false) => BuiltinFont::TimesRoman,
        }
    } else if family.contains("courier") || family.contains("mono") {
        match (font.bold, font.italic) {
            (true, true) => BuiltinFont::CourierBoldOblique,
            (true, false) => BuiltinFont::CourierBold,
            (false, true) => BuiltinFont::CourierOblique,
            (false, false) => BuiltinFont::Courier,
        }
    } else {
        match (font.bold, font.italic) {
            (true, true) => BuiltinFont::HelveticaBoldOblique,
            (true, false) => BuiltinFont::HelveticaBold,
            (false, true) => BuiltinFont::HelveticaOblique,
            (false, false) => BuiltinFont::Helvetica,
        }
    }
}

/// ASCII spellings of U+00C0..=U+00FF.
const LATIN1_FOLD: [&str; 64] = [
    "A", "A", "A", "A", "A", "A", "AE", "C", "E", "E", "E", "E", "I", "I", "I", "I",
    "D", "N", "O", "O", "O", "O", "O", "x", "O", "U", "U", "U", "U", "Y", "Th", "ss",
    "a", "a", "a", "a", "a", "a", "ae", "c", "e", "e", "e", "e", "i", "i", "i", "i",
    "d", "n", "o", "o", "o", "o", "o", "/", "o", "u", "u", "u", "u", "y", "th", "y",
];

/// Fold text to printable ASCII for the builtin fonts.
///
/// printpdf writes builtin-font strings byte for byte under WinAnsiEncoding,
/// so only the ASCII subset of UTF-8 comes out as the same glyphs. Accented
/// Latin-1 letters lose their accent and common typographic marks get their
/// plain spelling; anything else becomes `?`.
fn to_builtin_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ' '..='~' => out.push(c),
            '\t' | '\u{00A0}' | '\u{202F}' => out.push(' '),
            '\u{00C0}'..='\u{00FF}' => out.push_str(LATIN1_FOLD[c as usize - 0xC0]),
            '\u{20AC}' => out.push_str("EUR"),
            '\u{00A3}' => out.push_str("GBP"),
            '\u{00A9}' => out.push_str("(c)"),
            '\u{00AE}' => out.push_str("(R)"),
            '\u{2122}' => out.push_str("TM"),
            '\u{2026}' => out.push_str("..."),
            '\u{2018}' | '\u{2019}' | '\u{201A}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{00B7}' => out.push('*'),
            _ => out.push('?'),
        }
    }
    out
}

/// `[left, top, width, height]` intersected with `clip`, or `None` if empty.
fn clip_rect(rect: [f32; 4], clip: ClipRect) -> Option<[f32; 4]> {
    let left = rect[0].max(clip[0]);
    let top = rect[1].max(clip[1]);
    let right = (rect[0] + rect[2]).min(clip[0] + clip[2]);
    let bottom = (rect[1] + rect[3]).min(clip[1] + clip[3]);
    (right > left && bottom > top).then(|| [left, top, right - left, bottom - top])
}

/// Liang–Barsky: the part of the segment `from → to` inside `clip`.
fn clip_segment(from: [f32; 2], to: [f32; 2], clip: ClipRect) -> Option<([f32; 2], [f32; 2])> {
    let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
    let checks = [
        (-dx, from[0] - clip[0]),
        (dx, clip[0] + clip[2] - from[0]),
        (-dy, from[1] - clip[1]),
        (dy, clip[1] + clip[3] - from[1]),
    ];
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        [from[0] + t0 * dx, from[1] + t0 * dy],
        [from[0] + t1 * dx, from[1] + t1 * dy],
    ))
}

fn centre_inside(rect: [f32; 4], clip: ClipRect) -> bool {
    let (cx, cy) = (rect[0] + rect[2] / 2.0, rect[1] + rect[3] / 2.0);
    cx >= clip[0] && cx <= clip[0] + clip[2] && cy >= clip[1] && cy <= clip[1] + clip[3]
}

fn line_points(space: &PageSpace, points: &[[f32; 2]]) -> Vec<LinePoint> {
    points
        .iter()
        .map(|p| LinePoint {
            p: space.point(p[0], p[1]),
            bezier: false,
        })
        .collect()
}

fn stroke_segment(ops: &mut Vec<Op>, space: &PageSpace, from: [f32; 2], to: [f32; 2], stroke: StrokeSpec) {
    ops.push(Op::SetOutlineColor {
        col: rgb(stroke.color),
    });
    ops.push(Op::SetOutlineThickness {
        pt: space.len(stroke.width),
    });
    ops.push(Op::DrawLine {
        line: Line {
            points: line_points(space, &[from, to]),
            is_closed: false,
        },
    });
}

fn render_command(
    ops: &mut Vec<Op>,
    command: &PageCommand,
    space: &PageSpace,
    images: &HashMap<String, ImageResource>,
) {
    match command {
        PageCommand::Rect {
            rect,
            fill,
            stroke,
            clip,
        } => {
            if let (Some(fill), Some(visible)) = (fill, clip_rect(*rect, *clip)) {
                let [x, y, w, h] = visible;
                ops.push(Op::SetFillColor { col: rgb(*fill) });
                ops.push(Op::DrawPolygon {
                    polygon: Polygon {
                        rings: vec![PolygonRing {
                            points: line_points(
                                space,
                                &[[x, y + h], [x + w, y + h], [x + w, y], [x, y]],
                            ),
                        }],
                        mode: PaintMode::Fill,
                        winding_order: WindingOrder::NonZero,
                    },
                });
            }
            if let Some(stroke) = stroke {
                let [x, y, w, h] = *rect;
                let corners = [[x, y], [x + w, y], [x + w, y + h], [x, y + h]];
                for i in 0..4 {
                    if let Some((a, b)) = clip_segment(corners[i], corners[(i + 1) % 4], *clip) {
                        stroke_segment(ops, space, a, b, *stroke);
                    }
                }
            }
        }
        PageCommand::Line {
            from,
            to,
            stroke,
            clip,
        } => {
            if let Some((a, b)) = clip_segment(*from, *to, *clip) {
                stroke_segment(ops, space, a, b, *stroke);
            }
        }
        PageCommand::Text {
            x,
            y,
            baseline,
            width,
            text,
            font,
            color,
            clip,
        } => {
            let height = (baseline - y) * 2.0;
            if text.is_empty() || !centre_inside([*x, *y, *width, height], *clip) {
                return;
            }
            let builtin = builtin_font(font);
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: space.point(*x, *baseline),
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(font.size),
                font: builtin,
            });
            ops.push(Op::SetFillColor { col: rgb(*color) });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_builtin_text(text))],
                font: builtin,
            });
            ops.push(Op::EndTextSection);
        }
        PageCommand::Image { rect, src, clip } => {
            if !centre_inside(*rect, *clip) {
                return;
            }
            let Some(res) = images.get(src) else { return };
            let [x, y, w, h] = *rect;
            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                space.len(w).0 / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                space.len(h).0 / res.px_height as f32
            } else {
                1.0
            };
            let bottom_left = space.point(x, y + h);
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(bottom_left.x),
                    translate_y: Some(bottom_left.y),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::PageLayout;

    #[test]
    fn render_empty_config_still_has_a_page() {
        let config = LayoutConfig::new(794.0, 1123.0, 96.0);
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn renders_every_command_kind() {
        let clip = [0.0, 0.0, 794.0, 1123.0];
        let mut config = LayoutConfig::new(794.0, 1123.0, 96.0);
        config.pages.push(PageLayout {
            page_index: 0,
            commands: vec![
                PageCommand::Rect {
                    rect: [10.0, 10.0, 100.0, 40.0],
                    fill: Some([0.9, 0.9, 0.9, 1.0]),
                    stroke: Some(StrokeSpec {
                        width: 1.0,
                        color: [0.0, 0.0, 0.0, 1.0],
                    }),
                    clip,
                },
                PageCommand::Line {
                    from: [0.0, 60.0],
                    to: [794.0, 60.0],
                    stroke: StrokeSpec {
                        width: 1.0,
                        color: [0.0, 0.0, 0.0, 1.0],
                    },
                    clip,
                },
                PageCommand::Text {
                    x: 10.0,
                    y: 70.0,
                    baseline: 80.0,
                    width: 40.0,
                    text: "Grüße €".into(),
                    font: FontSpec {
                        family: "Helvetica".into(),
                        size: 10.0,
                        bold: true,
                        italic: false,
                    },
                    color: [0.0, 0.0, 0.0, 1.0],
                    clip,
                },
                PageCommand::Image {
                    rect: [10.0, 100.0, 20.0, 20.0],
                    src: "not-a-data-uri".into(),
                    clip,
                },
            ],
        });
        let bytes = render_pdf(&config).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn rectangles_are_cut_to_the_clip() {
        assert_eq!(
            clip_rect([0.0, -40.0, 200.0, 60.0], [0.0, 0.0, 200.0, 100.0]),
            Some([0.0, 0.0, 200.0, 20.0])
        );
        assert_eq!(clip_rect([0.0, 120.0, 10.0, 10.0], [0.0, 0.0, 200.0, 100.0]), None);
    }

    #[test]
    fn segments_are_cut_to_the_clip() {
        let clip = [0.0, 0.0, 100.0, 100.0];
        assert_eq!(
            clip_segment([-50.0, 50.0], [150.0, 50.0], clip),
            Some(([0.0, 50.0], [100.0, 50.0]))
        );
        assert_eq!(clip_segment([0.0, 150.0], [100.0, 150.0], clip), None);
    }

    #[test]
    fn font_families_map_to_builtins() {
        let spec = |family: &str| FontSpec {
            family: family.into(),
            size: 10.0,
            bold: false,
            italic: true,
        };
        assert_eq!(builtin_font(&spec("Times New Roman")), BuiltinFont::TimesItalic);
        assert_eq!(builtin_font(&spec("Courier")), BuiltinFont::CourierOblique);
        assert_eq!(builtin_font(&spec("Arial")), BuiltinFont::HelveticaOblique);
    }

    #[test]
    fn builtin_text_stays_ascii() {
        assert_eq!(to_builtin_text("Caf\u{e9} \u{20AC}5\u{00A0}\u{2013} \u{201C}ok\u{201D}"), "Cafe EUR5 - \"ok\"");
        assert_eq!(to_builtin_text("Stra\u{df}e \u{00C6}on"), "Strasse AEon");
        assert_eq!(to_builtin_text("\u{4e2d}"), "?");
        assert!(to_builtin_text("\u{00FF}\u{00C0}").is_ascii());
    }

    #[test]
    fn accented_text_renders() {
        let mut config = LayoutConfig::new(200.0, 100.0, 96.0);
        config.pages.push(PageLayout {
            page_index: 0,
            commands: vec![PageCommand::Text {
                x: 10.0,
                y: 10.0,
                baseline: 20.0,
                width: 40.0,
                text: "Caf\u{e9} cr\u{e8}me \u{20AC}".into(),
                font: FontSpec {
                    family: "Helvetica".into(),
                    size: 12.0,
                    bold: false,
                    italic: false,
                },
                color: [0.0, 0.0, 0.0, 1.0],
                clip: [0.0, 0.0, 200.0, 100.0],
            }],
        });
        let bytes = render_pdf(&config).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }
}
