use std::any::Any;

use crate::canvas::Canvas;
use crate::control::stack::Stack;
use crate::control::{
    check_general_child, BoxModel, ContentContainer, Control, ControlId, ControlKind,
    LayoutContext,
};
use crate::error::Result;
use crate::geometry::{ColumnLength, Point, Rectangle, Size, VerticalAlignment};
use crate::style::Color;

/// One cell of a [`TableRow`](super::TableRow). Children stack vertically.
///
/// A span of zero removes the cell from layout entirely: it proposes no
/// width, gets no slot and is not rendered.
pub struct TableCell {
    id: ControlId,
    pub layout: BoxModel,
    pub column_span: u32,
    /// Declared width of the spanned columns.
    pub width: ColumnLength,
    pub background: Option<Color>,
    children: Stack,
}

impl TableCell {
    pub fn new() -> Self {
        Self {
            id: ControlId::next(),
            layout: BoxModel::new().with_vertical(VerticalAlignment::Stretch),
            column_span: 1,
            width: ColumnLength::default(),
            background: None,
            children: Stack::new(),
        }
    }

    pub fn with_span(mut self, span: u32) -> Self {
        self.column_span = span;
        self
    }

    pub fn with_width(mut self, width: ColumnLength) -> Self {
        self.width = width;
        self
    }

    pub fn with_layout(mut self, layout: BoxModel) -> Self {
        self.layout = layout;
        self
    }

    /// Builder form of [`ContentContainer::add`].
    pub fn child(mut self, child: impl Control + 'static) -> Result<Self> {
        self.add(Box::new(child))?;
        Ok(self)
    }

    /// Whether the cell takes part in layout.
    pub fn is_laid_out(&self) -> bool {
        self.column_span > 0
    }
}

impl Default for TableCell {
    fn default() -> Self {
        Self::new()
    }
}

impl Control for TableCell {
    fn id(&self) -> ControlId {
        self.id
    }

    fn kind(&self) -> ControlKind {
        ControlKind::TableCell
    }

    fn measure(&mut self, ctx: &LayoutContext<'_>, framed: Size, remaining: Size) -> Result<Size> {
        let children = &mut self.children;
        self.layout
            .measure(ctx, remaining, |available| children.measure(ctx, framed, available))
    }

    fn arrange(&mut self, ctx: &LayoutContext<'_>, framed: Size, remaining: Size) -> Result<Size> {
        let children = &mut self.children;
        self.layout
            .arrange(ctx, remaining, |slot| children.arrange(ctx, framed, slot))
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>, _parent: Size) -> Result<Size> {
        if let Some(fill) = self.background.filter(|b| !b.is_transparent()) {
            canvas.draw_rect(self.layout.arrangement(), Some(fill), None);
        }
        self.layout.render(canvas, |c, inner| {
            self.children
                .render(c, ctx, Point::new(inner.left, inner.top), inner.size())
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

impl ContentContainer for TableCell {
    fn can_add(&self, kind: ControlKind) -> bool {
        !kind.is_table_part()
    }

    fn children(&self) -> Vec<&dyn Control> {
        self.children.children()
    }

    fn add(&mut self, child: Box<dyn Control>) -> Result<()> {
        check_general_child(ControlKind::TableCell, child.as_ref(), self.children.len())?;
        self.children.push(child);
        Ok(())
    }

    fn remove(&mut self, id: ControlId) -> Result<Box<dyn Control>> {
        self.children.remove(ControlKind::TableCell, id)
    }
}
