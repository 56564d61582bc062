//! Pagination – lays a [`Document`] out once and replays it across pages.
//!
//! Handles:
//! - Header/footer zones capped at a quarter of the printable height each
//! - One Measure/Arrange/Render pass per generation, painted into a
//!   [`VirtualCanvas`] per zone
//! - Scrolling the body canvas through as many pages as it needs
//! - Deferred draws (page numbers) flushed with the final page count

use crate::canvas::{with_saved, Canvas, DeferredDraw, PageInfo, VirtualCanvas};
use crate::control::{remaining_on_page, Control, Culture, LayoutContext};
use crate::document::{Document, Zone};
use crate::error::{LayoutError, Result};
use crate::fonts::{FontKey, TextMeasurer};
use crate::geometry::{Point, Rectangle, Size, Thickness};
use crate::layout_config::{
    ClipRect, FontSpec, LayoutConfig, PageCommand, PageLayout, StrokeSpec,
};
use crate::style::{Color, Stroke, TextStyle};

/// Largest share of the printable height a header or footer may take.
pub const ZONE_CAP: f32 = 0.25;

const EPSILON: f32 = 0.01;

/// Number of pages needed to show `total` pixels of body at `zone` pixels per
/// page. Never less than one.
pub fn page_count(total: f32, zone: f32) -> usize {
    if zone <= 0.0 || total <= EPSILON {
        return 1;
    }
    (((total - EPSILON) / zone).ceil() as usize).max(1)
}

/// Zone heights of one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zones {
    pub header: f32,
    pub body: f32,
    pub footer: f32,
}

/// Drives one document generation.
pub struct Generator<'a> {
    text: &'a dyn TextMeasurer,
    culture: Culture,
    dpi: f32,
    page: Size,
    margin: Thickness,
}

impl<'a> Generator<'a> {
    /// `page` is the physical page in pixels at `dpi`.
    pub fn new(text: &'a dyn TextMeasurer, dpi: f32, page: Size, margin: Thickness) -> Self {
        Self {
            text,
            culture: Culture::default(),
            dpi,
            page,
            margin,
        }
    }

    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = culture;
        self
    }

    pub fn page(&self) -> Size {
        self.page
    }

    /// Page margins resolved to pixel insets.
    pub fn margin_insets(&self) -> Rectangle {
        self.margin.to_rectangle(self.page, self.dpi)
    }

    fn validate(&self) -> Result<Size> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(LayoutError::InvalidConfiguration(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        let printable = self.page.deflate(self.margin_insets());
        if printable.width <= 0.0 || printable.height <= 0.0 {
            return Err(LayoutError::InvalidConfiguration(format!(
                "page {}x{}px leaves no printable area inside the margins",
                self.page.width, self.page.height
            )));
        }
        Ok(printable)
    }

    /// Measure, arrange and render `document` once, painting each zone into
    /// its own virtual canvas.
    pub fn paint(&self, document: &mut Document) -> Result<PaintedDocument> {
        let printable = self.validate()?;
        let ctx = LayoutContext {
            dpi: self.dpi,
            full_page: printable,
            culture: &self.culture,
            text: self.text,
        };
        let cap = printable.height * ZONE_CAP;
        let zone_slot = Size::new(printable.width, cap);

        for zone in [Zone::Header, Zone::Footer] {
            for control in document.zone_mut(zone).iter_mut() {
                control.measure(&ctx, zone_slot, zone_slot)?;
            }
        }
        for control in document.body.iter_mut() {
            control.measure(&ctx, printable, printable)?;
        }

        let (header_tops, header_total) = arrange_fixed(&ctx, &mut document.header, zone_slot)?;
        let (footer_tops, footer_total) = arrange_fixed(&ctx, &mut document.footer, zone_slot)?;
        let header = header_total.min(cap);
        let footer = footer_total.min(cap);
        let body = printable.height - header - footer;
        if body <= EPSILON {
            return Err(LayoutError::InvalidConfiguration(
                "header and footer leave no room for the body".into(),
            ));
        }
        let zones = Zones { header, body, footer };

        let mut body_tops = Vec::with_capacity(document.body.len());
        let mut cursor = 0.0f32;
        let body_frame = Size::new(printable.width, body);
        for control in document.body.iter_mut() {
            let left = remaining_on_page(body, cursor, body);
            let used = control.arrange(&ctx, body_frame, Size::new(printable.width, left))?;
            body_tops.push(cursor);
            cursor += used.height;
        }

        let header_canvas = paint_zone(&ctx, &document.header, &header_tops, Size::new(printable.width, header))?;
        let footer_canvas = paint_zone(&ctx, &document.footer, &footer_tops, Size::new(printable.width, footer))?;
        let (body_canvas, extra) = paint_flow(&ctx, &document.body, &body_tops, body_frame)?;
        let total = cursor + extra;

        let pages = page_count(total, body);
        log::debug!(
            "zones header={header:.1} body={body:.1} footer={footer:.1}; body height {total:.1} over {pages} page(s)"
        );

        let margin = self.margin_insets();
        Ok(PaintedDocument {
            page: self.page,
            origin: Point::new(margin.left, margin.top),
            printable,
            zones,
            body_height: total,
            page_count: pages,
            header: header_canvas,
            body: body_canvas,
            footer: footer_canvas,
        })
    }

    /// Paint `document` and replay it into a frozen [`LayoutConfig`].
    pub fn generate(&self, document: &mut Document) -> Result<LayoutConfig> {
        let painted = self.paint(document)?;
        let mut config = LayoutConfig::new(self.page.width, self.page.height, self.dpi);
        for index in 0..painted.page_count() {
            let mut surface = PageSurface::new(self.text, self.dpi, self.page);
            painted.replay_page(index, &mut surface);
            config.pages.push(PageLayout {
                page_index: index,
                commands: surface.into_commands(),
            });
        }
        Ok(config)
    }
}

/// Stack a header/footer list inside `slot`. Returns each control's top and
/// the summed height.
fn arrange_fixed(
    ctx: &LayoutContext<'_>,
    controls: &mut [Box<dyn Control>],
    slot: Size,
) -> Result<(Vec<f32>, f32)> {
    let mut tops = Vec::with_capacity(controls.len());
    let mut cursor = 0.0f32;
    for control in controls.iter_mut() {
        let left = Size::new(slot.width, (slot.height - cursor).max(0.0));
        let used = control.arrange(ctx, slot, left)?;
        tops.push(cursor);
        cursor += used.height;
    }
    Ok((tops, cursor))
}

fn paint_zone(
    ctx: &LayoutContext<'_>,
    controls: &[Box<dyn Control>],
    tops: &[f32],
    zone: Size,
) -> Result<VirtualCanvas> {
    Ok(paint_flow(ctx, controls, tops, zone)?.0)
}

/// Render `controls` at their tops; extra size reported by a control pushes
/// the rest down.
fn paint_flow(
    ctx: &LayoutContext<'_>,
    controls: &[Box<dyn Control>],
    tops: &[f32],
    zone: Size,
) -> Result<(VirtualCanvas, f32)> {
    let mut canvas = VirtualCanvas::new();
    let mut extra = 0.0f32;
    for (control, top) in controls.iter().zip(tops) {
        let more = with_saved(&mut canvas, |c| {
            c.translate(0.0, top + extra);
            control.render(c, ctx, zone)
        })?;
        extra += more.height;
    }
    Ok((canvas, extra))
}

/// The painted zones of one generation, ready to be replayed page by page.
#[derive(Debug)]
pub struct PaintedDocument {
    page: Size,
    origin: Point,
    printable: Size,
    zones: Zones,
    body_height: f32,
    page_count: usize,
    header: VirtualCanvas,
    body: VirtualCanvas,
    footer: VirtualCanvas,
}

impl PaintedDocument {
    pub fn zones(&self) -> Zones {
        self.zones
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Total arranged body height.
    pub fn body_height(&self) -> f32 {
        self.body_height
    }

    pub fn page_size(&self) -> Size {
        self.page
    }

    pub fn zone_canvas(&self, zone: Zone) -> &VirtualCanvas {
        match zone {
            Zone::Header => &self.header,
            Zone::Body => &self.body,
            Zone::Footer => &self.footer,
        }
    }

    /// Flush all three zones onto `target` for physical page `index`.
    /// The body is scrolled up by `index` body heights.
    pub fn replay_page(&self, index: usize, target: &mut dyn Canvas) {
        let info = PageInfo::new(index, self.page_count);
        let width = self.printable.width;
        let Zones { header, body, footer } = self.zones;

        with_saved(target, |t| {
            t.translate(self.origin.x, self.origin.y);
            if header > 0.0 {
                with_saved(t, |t| {
                    t.clip(Rectangle::new(0.0, 0.0, width, header));
                    self.header.replay(t, info);
                });
            }
            with_saved(t, |t| {
                t.translate(0.0, header);
                t.clip(Rectangle::new(0.0, 0.0, width, body));
                t.translate(0.0, -(index as f32 * body));
                self.body.replay(t, info);
            });
            if footer > 0.0 {
                with_saved(t, |t| {
                    t.translate(0.0, self.printable.height - footer);
                    t.clip(Rectangle::new(0.0, 0.0, width, footer));
                    self.footer.replay(t, info);
                });
            }
        });
    }
}

#[derive(Debug, Clone, Copy)]
struct SurfaceState {
    offset: Point,
    clip: Rectangle,
}

/// A physical page: resolves translations and clips into page-absolute
/// [`PageCommand`]s, dropping anything entirely outside the active clip.
pub struct PageSurface<'a> {
    text: &'a dyn TextMeasurer,
    dpi: f32,
    state: SurfaceState,
    stack: Vec<SurfaceState>,
    commands: Vec<PageCommand>,
}

impl<'a> PageSurface<'a> {
    pub fn new(text: &'a dyn TextMeasurer, dpi: f32, page: Size) -> Self {
        Self {
            text,
            dpi,
            state: SurfaceState {
                offset: Point::ORIGIN,
                clip: Rectangle::from_size(page),
            },
            stack: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn into_commands(self) -> Vec<PageCommand> {
        self.commands
    }

    fn absolute(&self, rect: Rectangle) -> Rectangle {
        rect.offset(self.state.offset.x, self.state.offset.y)
    }

    fn clip_rect(&self) -> ClipRect {
        let c = self.state.clip;
        [c.left, c.top, c.width, c.height]
    }

    fn visible(&self, bounds: Rectangle) -> bool {
        let clip = self.state.clip;
        if clip.is_empty() {
            return false;
        }
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            // Hairlines have no area; test their extent instead.
            return bounds.left <= clip.right()
                && bounds.right() >= clip.left
                && bounds.top <= clip.bottom()
                && bounds.bottom() >= clip.top;
        }
        bounds.intersects(&clip)
    }
}

fn stroke_spec(stroke: Stroke) -> StrokeSpec {
    StrokeSpec {
        width: stroke.width,
        color: stroke.color.to_array(),
    }
}

impl Canvas for PageSurface<'_> {
    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        } else {
            log::warn!("unbalanced restore on page surface");
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.offset = self.state.offset.offset(dx, dy);
    }

    fn clip(&mut self, rect: Rectangle) {
        let absolute = self.absolute(rect);
        self.state.clip = self.state.clip.intersect(&absolute);
    }

    fn draw_text(&mut self, origin: Point, text: &str, style: &TextStyle, color: Color) {
        if text.is_empty() || color.is_transparent() {
            return;
        }
        let width = self.text.text_width(style, self.dpi, text);
        let height = self.text.line_height(style, self.dpi);
        let bounds = self.absolute(Rectangle::new(origin.x, origin.y, width, height));
        if !self.visible(bounds) {
            return;
        }
        let key = FontKey::for_style(style);
        self.commands.push(PageCommand::Text {
            x: bounds.left,
            y: bounds.top,
            baseline: bounds.top + self.text.ascent(style, self.dpi),
            width,
            text: text.to_string(),
            font: FontSpec {
                family: key.family,
                size: style.size,
                bold: key.bold,
                italic: key.italic,
            },
            color: color.to_array(),
            clip: self.clip_rect(),
        });
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        if stroke.width <= 0.0 || stroke.color.is_transparent() {
            return;
        }
        let (dx, dy) = (self.state.offset.x, self.state.offset.y);
        let (a, b) = (from.offset(dx, dy), to.offset(dx, dy));
        let bounds = Rectangle::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        );
        if !self.visible(bounds) {
            return;
        }
        self.commands.push(PageCommand::Line {
            from: [a.x, a.y],
            to: [b.x, b.y],
            stroke: stroke_spec(stroke),
            clip: self.clip_rect(),
        });
    }

    fn draw_rect(&mut self, rect: Rectangle, fill: Option<Color>, stroke: Option<Stroke>) {
        let fill = fill.filter(|c| !c.is_transparent());
        let stroke = stroke.filter(|s| s.width > 0.0 && !s.color.is_transparent());
        if fill.is_none() && stroke.is_none() {
            return;
        }
        let bounds = self.absolute(rect);
        if !self.visible(bounds) {
            return;
        }
        self.commands.push(PageCommand::Rect {
            rect: [bounds.left, bounds.top, bounds.width, bounds.height],
            fill: fill.map(Color::to_array),
            stroke: stroke.map(stroke_spec),
            clip: self.clip_rect(),
        });
    }

    fn draw_bitmap(&mut self, rect: Rectangle, src: &str) {
        let bounds = self.absolute(rect);
        if !self.visible(bounds) {
            return;
        }
        self.commands.push(PageCommand::Image {
            rect: [bounds.left, bounds.top, bounds.width, bounds.height],
            src: src.to_string(),
            clip: self.clip_rect(),
        });
    }

    fn defer(&mut self, _draw: DeferredDraw) {
        // Resolved by `VirtualCanvas::replay`; nothing to wait for here.
        log::warn!("deferred draw reached a page surface without page info");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawCommand;
    use crate::control::{Border, PageNumber, TextBlock};
    use crate::fonts::FontManager;
    use crate::geometry::Length;

    fn fixed_block(height: f32) -> Border {
        let mut border = Border::new();
        border.layout.height = Some(Length::px(height));
        border.background = Some(Color::BLACK);
        border
    }

    fn generator(fonts: &FontManager, height: f32) -> Generator<'_> {
        Generator::new(fonts, 96.0, Size::new(200.0, height), Thickness::default())
    }

    #[test]
    fn page_count_rounds_up_and_never_drops_to_zero() {
        assert_eq!(page_count(0.0, 100.0), 1);
        assert_eq!(page_count(100.0, 100.0), 1);
        assert_eq!(page_count(100.5, 100.0), 2);
        assert_eq!(page_count(250.0, 100.0), 3);
    }

    #[test]
    fn smaller_zones_never_mean_fewer_pages() {
        let mut previous = 0;
        for zone in (10..=200).rev().map(|z| z as f32) {
            let pages = page_count(1234.0, zone);
            assert!(pages >= previous, "zone {zone}: {pages} < {previous}");
            previous = pages;
        }
    }

    #[test]
    fn zones_are_capped_at_a_quarter() {
        let fonts = FontManager::default();
        let mut doc = Document::new();
        doc.push(Zone::Header, fixed_block(80.0))
            .push(Zone::Footer, fixed_block(10.0))
            .push(Zone::Body, fixed_block(10.0));
        let painted = generator(&fonts, 200.0).paint(&mut doc).unwrap();
        assert_eq!(
            painted.zones(),
            Zones {
                header: 50.0,
                body: 140.0,
                footer: 10.0
            }
        );
    }

    #[test]
    fn empty_document_has_one_page() {
        let fonts = FontManager::default();
        let mut doc = Document::new();
        let painted = generator(&fonts, 200.0).paint(&mut doc).unwrap();
        assert_eq!(painted.zones().header, 0.0);
        assert_eq!(painted.zones().body, 200.0);
        assert_eq!(painted.page_count(), 1);
        assert!(painted.zone_canvas(Zone::Body).is_empty());
    }

    #[test]
    fn body_flows_across_pages() {
        let fonts = FontManager::default();
        let mut doc = Document::new();
        for _ in 0..5 {
            doc.push(Zone::Body, fixed_block(60.0));
        }
        let config = generator(&fonts, 100.0).generate(&mut doc).unwrap();
        assert_eq!(config.pages.len(), 3);

        // Page 2 shows blocks 2 and 3 (offset 100..200) and the tail of 1.
        let rects: Vec<[f32; 4]> = config.pages[1]
            .commands
            .iter()
            .filter_map(|c| match c {
                PageCommand::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(
            rects,
            vec![
                [0.0, -40.0, 200.0, 60.0],
                [0.0, 20.0, 200.0, 60.0],
                [0.0, 80.0, 200.0, 60.0],
            ]
        );
        assert!(config.pages[1]
            .commands
            .iter()
            .all(|c| c.clip() == [0.0, 0.0, 200.0, 100.0]));
    }

    #[test]
    fn header_repeats_and_page_numbers_resolve() {
        let fonts = FontManager::default();
        let mut doc = Document::new();
        doc.push(Zone::Header, TextBlock::new("Title"));
        doc.push(Zone::Footer, PageNumber::new());
        for _ in 0..4 {
            doc.push(Zone::Body, fixed_block(50.0));
        }
        let config = generator(&fonts, 200.0).generate(&mut doc).unwrap();
        let pages = config.pages.len();
        assert!(pages >= 2);
        for page in 0..pages {
            let texts = config.texts(page);
            assert!(texts.contains(&"Title"), "page {page}: {texts:?}");
            let expected = format!("Page {} of {}", page + 1, pages);
            assert!(texts.contains(&expected.as_str()), "page {page}: {texts:?}");
        }
    }

    #[test]
    fn replay_scrolls_the_body() {
        let fonts = FontManager::default();
        let mut doc = Document::new();
        doc.push(Zone::Body, fixed_block(150.0));
        let painted = generator(&fonts, 100.0).paint(&mut doc).unwrap();
        assert_eq!(painted.page_count(), 2);

        let mut page = VirtualCanvas::new();
        painted.replay_page(1, &mut page);
        assert!(page
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Translate { dy, .. } if *dy == -100.0)));
    }

    #[test]
    fn rejects_bad_configuration() {
        let fonts = FontManager::default();
        let mut doc = Document::new();
        let bad_dpi = Generator::new(&fonts, 0.0, Size::new(100.0, 100.0), Thickness::default());
        assert!(matches!(
            bad_dpi.paint(&mut doc),
            Err(LayoutError::InvalidConfiguration(_))
        ));
        let no_room = Generator::new(
            &fonts,
            96.0,
            Size::new(100.0, 100.0),
            Thickness::uniform(Length::px(50.0)),
        );
        assert!(no_room.paint(&mut doc).is_err());
    }

    #[test]
    fn measuring_twice_is_idempotent() {
        let fonts = FontManager::default();
        let culture = Culture::default();
        let ctx = LayoutContext {
            dpi: 96.0,
            full_page: Size::new(200.0, 200.0),
            culture: &culture,
            text: &fonts,
        };
        let mut block = fixed_block(30.0);
        let first = block.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        let second = block.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn table_measure_and_generate_are_repeatable() {
        use crate::control::{Table, TableCell, TableRow};

        let fonts = FontManager::default();
        let culture = Culture::default();
        let ctx = LayoutContext {
            dpi: 96.0,
            full_page: Size::new(200.0, 200.0),
            culture: &culture,
            text: &fonts,
        };
        let text_cell = |text: &str| TableCell::new().child(TextBlock::new(text)).unwrap();
        let table = || {
            Table::new()
                .row(TableRow::header().cell(text_cell("Name")).cell(text_cell("Notes")))
                .row(
                    TableRow::new()
                        .cell(text_cell("short"))
                        .cell(text_cell("a much longer description that has to wrap inside its column")),
                )
                .row(TableRow::new().cell(text_cell("x")).cell(text_cell("y")))
        };

        let mut measured = table();
        let first = measured.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        let second = measured.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        assert_eq!(first, second);
        measured.arrange(&ctx, ctx.full_page, ctx.full_page).unwrap();
        let widths = measured.column_widths().to_vec();
        measured.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        measured.arrange(&ctx, ctx.full_page, ctx.full_page).unwrap();
        assert_eq!(measured.column_widths(), widths.as_slice());

        let mut doc = Document::new();
        doc.push(Zone::Body, table());
        let once = generator(&fonts, 120.0).generate(&mut doc).unwrap();
        let twice = generator(&fonts, 120.0).generate(&mut doc).unwrap();
        assert_eq!(once, twice);
    }
}
