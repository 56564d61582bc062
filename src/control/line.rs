use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::Result;
use crate::geometry::{Length, Point, Rectangle, Size};
use crate::style::{Color, Stroke};

use super::{BoxModel, Control, ControlId, ControlKind, LayoutContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// A straight rule. An `auto` length contributes nothing to the desired size
/// and fills whatever the box is arranged to.
pub struct Line {
    id: ControlId,
    pub layout: BoxModel,
    pub orientation: Orientation,
    pub length: Length,
    pub thickness: Length,
    pub color: Color,
}

impl Line {
    pub fn new(orientation: Orientation, length: Length) -> Self {
        Self {
            id: ControlId::next(),
            layout: BoxModel::default(),
            orientation,
            length,
            thickness: Length::px(1.0),
            color: Color::BLACK,
        }
    }

    pub fn horizontal(length: Length) -> Self {
        Self::new(Orientation::Horizontal, length)
    }

    pub fn vertical(length: Length) -> Self {
        Self::new(Orientation::Vertical, length)
    }
}

fn extent(orientation: Orientation, length: Length, thickness: f32, dpi: f32, available: Size) -> Size {
    match orientation {
        Orientation::Horizontal => {
            Size::new(length.to_pixels_or_zero(available.width, dpi), thickness)
        }
        Orientation::Vertical => {
            Size::new(thickness, length.to_pixels_or_zero(available.height, dpi))
        }
    }
}

impl Control for Line {
    fn id(&self) -> ControlId {
        self.id
    }

    fn kind(&self) -> ControlKind {
        ControlKind::Line
    }

    fn measure(&mut self, ctx: &LayoutContext<'_>, _framed: Size, remaining: Size) -> Result<Size> {
        let (orientation, length) = (self.orientation, self.length);
        let thickness = self.thickness.to_pixels_or_zero(0.0, ctx.dpi);
        self.layout.measure(ctx, remaining, |available| {
            Ok(extent(orientation, length, thickness, ctx.dpi, available))
        })
    }

    fn arrange(&mut self, ctx: &LayoutContext<'_>, _framed: Size, remaining: Size) -> Result<Size> {
        let auto = self.length.is_auto();
        let orientation = self.orientation;
        let measured = self.layout.intrinsic();
        self.layout.arrange(ctx, remaining, |slot| {
            Ok(match (orientation, auto) {
                (Orientation::Vertical, true) => Size::new(measured.width, slot.height),
                _ => measured.min(slot).with_height(measured.height),
            })
        })
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>, _parent: Size) -> Result<Size> {
        let thickness = self.thickness.to_pixels_or_zero(0.0, ctx.dpi);
        self.layout.render(canvas, |c, inner| {
            let stroke = Stroke::new(thickness, self.color);
            match self.orientation {
                Orientation::Horizontal => {
                    let y = inner.top + thickness / 2.0;
                    c.draw_line(Point::new(inner.left, y), Point::new(inner.right(), y), stroke);
                }
                Orientation::Vertical => {
                    let x = inner.left + thickness / 2.0;
                    c.draw_line(Point::new(x, inner.top), Point::new(x, inner.bottom()), stroke);
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
