use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::Result;
use crate::geometry::{Point, Rectangle, Size};
use crate::style::{Color, Stroke, TextStyle};

use super::{BoxModel, Control, ControlId, ControlKind, LayoutContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Offset of a line of `line_width` inside `box_width`.
    pub fn offset(self, box_width: f32, line_width: f32) -> f32 {
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => ((box_width - line_width) / 2.0).max(0.0),
            TextAlign::Right => (box_width - line_width).max(0.0),
        }
    }
}

/// A word-wrapped run of text.
pub struct TextBlock {
    id: ControlId,
    pub layout: BoxModel,
    pub text: String,
    pub style: TextStyle,
    pub color: Color,
    pub align: TextAlign,
    lines: Vec<String>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ControlId::next(),
            layout: BoxModel::default(),
            text: text.into(),
            style: TextStyle::default(),
            color: Color::BLACK,
            align: TextAlign::Left,
            lines: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_layout(mut self, layout: BoxModel) -> Self {
        self.layout = layout;
        self
    }

    /// Lines produced by the last arrange.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Control for TextBlock {
    fn id(&self) -> ControlId {
        self.id
    }

    fn kind(&self) -> ControlKind {
        ControlKind::TextBlock
    }

    fn measure(&mut self, ctx: &LayoutContext<'_>, _framed: Size, remaining: Size) -> Result<Size> {
        self.layout.measure(ctx, remaining, |available| {
            Ok(ctx.text.measure(&self.style, ctx.dpi, &self.text, available.width))
        })
    }

    fn arrange(&mut self, ctx: &LayoutContext<'_>, _framed: Size, remaining: Size) -> Result<Size> {
        self.layout.arrange(ctx, remaining, |slot| {
            self.lines = ctx.text.wrap(&self.style, ctx.dpi, &self.text, slot.width);
            let width = self
                .lines
                .iter()
                .map(|l| ctx.text.text_width(&self.style, ctx.dpi, l))
                .fold(0.0f32, f32::max);
            let height = self.lines.len() as f32 * ctx.text.line_height(&self.style, ctx.dpi);
            Ok(Size::new(width, height))
        })
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>, _parent: Size) -> Result<Size> {
        self.layout.render(canvas, |c, inner| {
            let line_height = ctx.text.line_height(&self.style, ctx.dpi);
            for (i, line) in self.lines.iter().enumerate() {
                let width = ctx.text.text_width(&self.style, ctx.dpi, line);
                let origin = Point::new(
                    inner.left + self.align.offset(inner.width, width),
                    inner.top + i as f32 * line_height,
                );
                c.draw_text(origin, line, &self.style, self.color);
                if self.style.underline {
                    let y = origin.y + ctx.text.ascent(&self.style, ctx.dpi) + 1.0;
                    c.draw_line(
                        Point::new(origin.x, y),
                        Point::new(origin.x + width, y),
                        Stroke::new((self.style.size_px(ctx.dpi) / 14.0).max(0.5), self.color),
                    );
                }
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
