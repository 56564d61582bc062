use std::any::Any;
use std::rc::Rc;

use crate::canvas::{Canvas, PageInfo};
use crate::control::Culture;
use crate::error::Result;
use crate::geometry::{Point, Rectangle, Size};
use crate::style::{Color, TextStyle};

use super::{BoxModel, Control, ControlId, ControlKind, LayoutContext, TextAlign};

/// Placeholder used to reserve room for a number before the page count is
/// known.
const RESERVED_NUMBER: &str = "999";

/// Text with `{page}` and `{pages}` placeholders, filled in once the page it
/// lands on is known.
pub struct PageNumber {
    id: ControlId,
    pub layout: BoxModel,
    pub format: String,
    pub style: TextStyle,
    pub color: Color,
    pub align: TextAlign,
}

impl PageNumber {
    pub const DEFAULT_FORMAT: &'static str = "Page {page} of {pages}";

    pub fn new() -> Self {
        Self::with_format(Self::DEFAULT_FORMAT)
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            id: ControlId::next(),
            layout: BoxModel::default(),
            format: format.into(),
            style: TextStyle::default(),
            color: Color::BLACK,
            align: TextAlign::Left,
        }
    }

    /// The label for `page`, numbers formatted for `culture`.
    pub fn label(&self, culture: &Culture, page: PageInfo) -> String {
        expand(&self.format, culture, page)
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::new()
    }
}

fn expand(format: &str, culture: &Culture, page: PageInfo) -> String {
    format
        .replace("{page}", &culture.format_integer(page.number()))
        .replace("{pages}", &culture.format_integer(page.count))
}

impl Control for PageNumber {
    fn id(&self) -> ControlId {
        self.id
    }

    fn kind(&self) -> ControlKind {
        ControlKind::PageNumber
    }

    fn measure(&mut self, ctx: &LayoutContext<'_>, _framed: Size, remaining: Size) -> Result<Size> {
        let sample = self
            .format
            .replace("{page}", RESERVED_NUMBER)
            .replace("{pages}", RESERVED_NUMBER);
        let style = &self.style;
        self.layout.measure(ctx, remaining, |_| {
            Ok(Size::new(
                ctx.text.text_width(style, ctx.dpi, &sample),
                ctx.text.line_height(style, ctx.dpi),
            ))
        })
    }

    fn arrange(&mut self, ctx: &LayoutContext<'_>, _framed: Size, remaining: Size) -> Result<Size> {
        let line_height = ctx.text.line_height(&self.style, ctx.dpi);
        self.layout
            .arrange(ctx, remaining, |slot| Ok(Size::new(slot.width, line_height)))
    }

    /// Defers the actual text. The label width is estimated from the width of
    /// a digit, which holds for fonts with tabular figures.
    fn render(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>, _parent: Size) -> Result<Size> {
        let digit = ctx.text.text_width(&self.style, ctx.dpi, "0");
        let culture = ctx.culture.clone();
        let style = self.style.clone();
        let format = self.format.clone();
        let (color, align) = (self.color, self.align);
        let fixed = ctx.text.text_width(
            &style,
            ctx.dpi,
            &format.replace("{page}", "").replace("{pages}", ""),
        );

        self.layout.render(canvas, |c, inner| {
            c.defer(Rc::new(move |target: &mut dyn Canvas, page: PageInfo| {
                let text = expand(&format, &culture, page);
                let numbers = culture.format_integer(page.number()).chars().count()
                    * format.matches("{page}").count()
                    + culture.format_integer(page.count).chars().count()
                        * format.matches("{pages}").count();
                let width = fixed + numbers as f32 * digit;
                let origin = Point::new(inner.left + align.offset(inner.width, width), inner.top);
                target.draw_text(origin, &text, &style, color);
            }));
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
    use crate::canvas::{DrawCommand, VirtualCanvas};
    use crate::fonts::FontManager;

    #[test]
    fn label_uses_culture() {
        let n = PageNumber::with_format("{page}/{pages}");
        assert_eq!(n.label(&Culture::default(), PageInfo::new(0, 1200)), "1/1,200");
        assert_eq!(
            PageNumber::new().label(&Culture::invariant(), PageInfo::new(2, 5)),
            "Page 3 of 5"
        );
    }

    #[test]
    fn renders_deferred_until_replay() {
        let culture = Culture::default();
        let fonts = FontManager::default();
        let ctx = LayoutContext {
            dpi: 72.0,
            full_page: Size::new(400.0, 400.0),
            culture: &culture,
            text: &fonts,
        };
        let mut n = PageNumber::with_format("{page}");
        n.align = TextAlign::Right;
        n.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        n.arrange(&ctx, ctx.full_page, Size::new(100.0, 400.0)).unwrap();

        let mut recorded = VirtualCanvas::new();
        n.render(&mut recorded, &ctx, Size::new(100.0, 400.0)).unwrap();
        assert!(recorded
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Deferred(_))));

        let mut page = VirtualCanvas::new();
        recorded.replay(&mut page, PageInfo::new(11, 20));
        let text = page.commands().iter().find_map(|c| match c {
            DrawCommand::Text { origin, text, .. } => Some((*origin, text.clone())),
            _ => None,
        });
        // Two digits at 5px each, right-aligned in 100px.
        assert_eq!(text, Some((Point::new(90.0, 0.0), "12".to_string())));
    }
}
