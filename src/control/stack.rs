//! Vertical flow of general-purpose children, shared by [`Border`] and
//! [`TableCell`].
//!
//! [`Border`]: super::Border
//! [`TableCell`]: super::TableCell

use crate::canvas::{with_saved, Canvas};
use crate::error::{LayoutError, Result};
use crate::geometry::{Point, Size};

use super::{remaining_on_page, Control, ControlId, ControlKind, LayoutContext};

/// Children stacked top to bottom, each taking the full content width.
#[derive(Default)]
pub struct Stack {
    children: Vec<Box<dyn Control>>,
    tops: Vec<f32>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> Vec<&dyn Control> {
        self.children.iter().map(|c| c.as_ref()).collect()
    }

    pub fn push(&mut self, child: Box<dyn Control>) {
        self.children.push(child);
    }

    pub fn remove(&mut self, parent: ControlKind, id: ControlId) -> Result<Box<dyn Control>> {
        let index = self
            .children
            .iter()
            .position(|c| c.id() == id)
            .ok_or(LayoutError::UnknownChild { parent, id })?;
        self.tops.clear();
        Ok(self.children.remove(index))
    }

    /// Offsets of each child from the content top, from the last arrange.
    pub fn offsets(&self) -> &[f32] {
        &self.tops
    }

    pub fn measure(&mut self, ctx: &LayoutContext<'_>, framed: Size, available: Size) -> Result<Size> {
        let mut size = Size::ZERO;
        for child in &mut self.children {
            let slot = Size::new(available.width, (available.height - size.height).max(0.0));
            let desired = child.measure(ctx, framed, slot)?;
            size.width = size.width.max(desired.width);
            size.height += desired.height;
        }
        Ok(size)
    }

    pub fn arrange(&mut self, ctx: &LayoutContext<'_>, framed: Size, available: Size) -> Result<Size> {
        self.tops.clear();
        let mut size = Size::ZERO;
        for child in &mut self.children {
            let left_on_page = remaining_on_page(available.height, size.height, framed.height);
            let used = child.arrange(ctx, framed, Size::new(available.width, left_on_page))?;
            self.tops.push(size.height);
            size.width = size.width.max(used.width);
            size.height += used.height;
        }
        Ok(size)
    }

    /// Render each child at its offset below `origin`. Extra size reported
    /// by a child pushes the following siblings down.
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        ctx: &LayoutContext<'_>,
        origin: Point,
        parent: Size,
    ) -> Result<Size> {
        let mut extra = 0.0;
        for (child, top) in self.children.iter().zip(&self.tops) {
            let more = with_saved(canvas, |c| {
                c.translate(origin.x, origin.y + top + extra);
                child.render(c, ctx, parent)
            })?;
            extra += more.height;
        }
        Ok(Size::new(0.0, extra))
    }
}
