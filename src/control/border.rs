use std::any::Any;

use crate::canvas::Canvas;
use crate::error::Result;
use crate::geometry::{Length, Point, Rectangle, Size};
use crate::style::{Color, Stroke};

use super::stack::Stack;
use super::{
    check_general_child, BoxModel, ContentContainer, Control, ControlId, ControlKind,
    LayoutContext,
};

/// A general-purpose container: children stacked vertically inside an
/// optional background and outline.
pub struct Border {
    id: ControlId,
    pub layout: BoxModel,
    pub background: Option<Color>,
    /// Outline width; drawn inside the box and added to the padding.
    pub thickness: Length,
    pub color: Color,
    children: Stack,
}

impl Border {
    pub fn new() -> Self {
        Self {
            id: ControlId::next(),
            layout: BoxModel::default(),
            background: None,
            thickness: Length::ZERO,
            color: Color::BLACK,
            children: Stack::new(),
        }
    }

    pub fn with_layout(mut self, layout: BoxModel) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_outline(mut self, thickness: Length, color: Color) -> Self {
        self.thickness = thickness;
        self.color = color;
        self
    }

    /// Builder form of [`ContentContainer::add`].
    pub fn child(mut self, child: impl Control + 'static) -> Result<Self> {
        self.add(Box::new(child))?;
        Ok(self)
    }

    fn outline(&self, dpi: f32) -> f32 {
        self.thickness.to_pixels_or_zero(0.0, dpi)
    }

    /// Offset of each child from the content top, from the last arrange.
    pub fn child_offsets(&self) -> &[f32] {
        self.children.offsets()
    }
}

impl Default for Border {
    fn default() -> Self {
        Self::new()
    }
}

impl Control for Border {
    fn id(&self) -> ControlId {
        self.id
    }

    fn kind(&self) -> ControlKind {
        ControlKind::Border
    }

    fn measure(&mut self, ctx: &LayoutContext<'_>, framed: Size, remaining: Size) -> Result<Size> {
        let edge = self.outline(ctx.dpi) * 2.0;
        let frame = Size::new(framed.width - edge, framed.height);
        let children = &mut self.children;
        self.layout.measure(ctx, remaining, |available| {
            let inner = Size::new(available.width - edge, available.height - edge).max(Size::ZERO);
            let content = children.measure(ctx, frame, inner)?;
            Ok(Size::new(content.width + edge, content.height + edge))
        })
    }

    fn arrange(&mut self, ctx: &LayoutContext<'_>, framed: Size, remaining: Size) -> Result<Size> {
        let edge = self.outline(ctx.dpi) * 2.0;
        let frame = Size::new(framed.width - edge, framed.height);
        let children = &mut self.children;
        self.layout.arrange(ctx, remaining, |slot| {
            let inner = Size::new(slot.width - edge, slot.height - edge).max(Size::ZERO);
            let content = children.arrange(ctx, frame, inner)?;
            Ok(Size::new(content.width + edge, content.height + edge))
        })
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>, _parent: Size) -> Result<Size> {
        let outline = self.outline(ctx.dpi);
        let arranged = self.layout.arrangement();
        self.layout.render(canvas, |c, inner| {
            let stroke = (outline > 0.0).then(|| Stroke::new(outline, self.color));
            let fill = self.background.filter(|b| !b.is_transparent());
            if fill.is_some() || stroke.is_some() {
                let half = outline / 2.0;
                let rect = Rectangle::new(
                    arranged.left + half,
                    arranged.top + half,
                    (arranged.width - outline).max(0.0),
                    (arranged.height - outline).max(0.0),
                );
                c.draw_rect(rect, fill, stroke);
            }
            let origin = Point::new(inner.left + outline, inner.top + outline);
            let slot = Size::new(inner.width - 2.0 * outline, inner.height - 2.0 * outline);
            self.children.render(c, ctx, origin, slot.max(Size::ZERO))
        })
    }

    fn desired_size(&self) -> Size {
        self.layout.desired()
    }

    fn arrangement(&self) -> Rectangle {
        self.layout.arrangement()
    }

    fn as_container(&self) -> Option<&dyn ContentContainer> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn ContentContainer> {
        Some(self)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl ContentContainer for Border {
    fn can_add(&self, kind: ControlKind) -> bool {
        !kind.is_table_part()
    }

    fn children(&self) -> Vec<&dyn Control> {
        self.children.children()
    }

    fn add(&mut self, child: Box<dyn Control>) -> Result<()> {
        check_general_child(ControlKind::Border, child.as_ref(), self.children.len())?;
        self.children.push(child);
        Ok(())
    }

    fn remove(&mut self, id: ControlId) -> Result<Box<dyn Control>> {
        self.children.remove(ControlKind::Border, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, VirtualCanvas};
    use crate::control::{Culture, TableCell, TableRow, TextBlock};
    use crate::error::LayoutError;
    use crate::fonts::FontManager;

    #[test]
    fn rejects_rows_and_cells() {
        let mut border = Border::new();
        border.add(Box::new(TextBlock::new("ok"))).unwrap();
        let err = border.add(Box::new(TableRow::new())).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::StructuralViolation {
                parent: ControlKind::Border,
                child: ControlKind::TableRow,
                position: 1
            }
        ));
        assert!(border.add(Box::new(TableCell::new())).is_err());
        assert_eq!(border.children().len(), 1);
    }

    #[test]
    fn remove_hands_child_back() {
        let mut border = Border::new();
        let text = TextBlock::new("x");
        let id = text.id();
        border.add(Box::new(text)).unwrap();
        let removed = border.remove(id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(matches!(
            border.remove(id),
            Err(LayoutError::UnknownChild { .. })
        ));
    }

    #[test]
    fn stacks_children_inside_outline() {
        let culture = Culture::default();
        let fonts = FontManager::default();
        let ctx = LayoutContext {
            dpi: 72.0,
            full_page: Size::new(200.0, 500.0),
            culture: &culture,
            text: &fonts,
        };
        let mut border = Border::new()
            .with_outline(Length::px(2.0), Color::BLACK)
            .child(TextBlock::new("one"))
            .unwrap()
            .child(TextBlock::new("two"))
            .unwrap();
        border.background = Some(Color::WHITE);

        let desired = border.measure(&ctx, ctx.full_page, ctx.full_page).unwrap();
        assert_eq!(desired, Size::new(19.0, 28.0));
        let used = border.arrange(&ctx, ctx.full_page, ctx.full_page).unwrap();
        assert_eq!(used, Size::new(200.0, 28.0));
        assert_eq!(border.child_offsets(), [0.0, 12.0]);

        let mut canvas = VirtualCanvas::new();
        border.render(&mut canvas, &ctx, used).unwrap();
        let rects: Vec<Rectangle> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects, vec![Rectangle::new(1.0, 1.0, 198.0, 26.0)]);
    }
}
