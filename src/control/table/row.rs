use std::any::Any;

use crate::canvas::{with_saved, Canvas};
use crate::control::{ContentContainer, Control, ControlId, ControlKind, LayoutContext};
use crate::error::{LayoutError, Result};
use crate::geometry::{Rectangle, Size};
use crate::style::Color;

use super::{ColumnNegotiation, TableCell, MAX_ROW_PASSES};

const EPSILON: f32 = 0.01;

/// A row of cells. Rows are laid out by their owning [`Table`](super::Table),
/// which shares one [`ColumnNegotiation`] between all of them; measuring or
/// arranging a row directly fails with [`LayoutError::DetachedRow`].
///
/// Header rows are repeated at the top of every page the table continues on.
pub struct TableRow {
    id: ControlId,
    header: bool,
    pub background: Option<Color>,
    cells: Vec<TableCell>,
    owner: Option<ControlId>,
    slots: Vec<Option<Rectangle>>,
    desired: Size,
    size: Size,
    passes: usize,
}

impl TableRow {
    pub fn new() -> Self {
        Self {
            id: ControlId::next(),
            header: false,
            background: None,
            cells: Vec::new(),
            owner: None,
            slots: Vec::new(),
            desired: Size::ZERO,
            size: Size::ZERO,
            passes: 0,
        }
    }

    /// A row repeated at the top of each continuation page.
    pub fn header() -> Self {
        Self {
            header: true,
            ..Self::new()
        }
    }

    pub fn is_header(&self) -> bool {
        self.header
    }

    /// The table this row belongs to.
    pub fn owner(&self) -> Option<ControlId> {
        self.owner
    }

    pub(crate) fn attach(&mut self, table: ControlId) {
        self.owner = Some(table);
    }

    pub(crate) fn detach(&mut self) {
        self.owner = None;
    }

    /// Builder form of [`TableRow::push_cell`].
    pub fn cell(mut self, cell: TableCell) -> Self {
        self.push_cell(cell);
        self
    }

    pub fn push_cell(&mut self, cell: TableCell) {
        self.cells.push(cell);
    }

    pub fn cells(&self) -> &[TableCell] {
        &self.cells
    }

    /// Slot of each cell in row coordinates from the last arrange; `None`
    /// for cells with a zero span.
    pub fn cell_bounds(&self) -> &[Option<Rectangle>] {
        &self.slots
    }

    /// Measure/arrange passes used by the last arrange.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    /// Measure every cell and propose its width to `columns`.
    pub(crate) fn measure_columns(
        &mut self,
        ctx: &LayoutContext<'_>,
        framed: Size,
        remaining: Size,
        columns: &mut ColumnNegotiation,
    ) -> Result<Size> {
        let mut column = 0;
        let mut desired = Size::ZERO;
        for cell in self.cells.iter_mut().filter(|c| c.is_laid_out()) {
            let size = cell.measure(ctx, framed, remaining)?;
            columns.propose(column, cell.column_span, size.width, cell.width);
            column += cell.column_span as usize;
            desired.width += size.width;
            desired.height = desired.height.max(size.height);
        }
        self.desired = desired;
        Ok(desired)
    }

    /// Fit every cell to its finalized columns. Cells are re-measured at
    /// their column width and re-arranged until the row height settles or
    /// [`MAX_ROW_PASSES`] is reached, then stretched to the row height.
    pub(crate) fn arrange_columns(
        &mut self,
        ctx: &LayoutContext<'_>,
        framed: Size,
        remaining: Size,
        columns: &ColumnNegotiation,
    ) -> Result<Size> {
        let mut column = 0;
        self.slots = self
            .cells
            .iter()
            .map(|cell| {
                cell.is_laid_out().then(|| {
                    let slot = Rectangle::new(
                        columns.offset(column),
                        0.0,
                        columns.spanned(column, cell.column_span),
                        0.0,
                    );
                    column += cell.column_span as usize;
                    slot
                })
            })
            .collect();

        let mut height = self.desired.height;
        self.passes = 0;
        while self.passes < MAX_ROW_PASSES {
            self.passes += 1;
            let mut tallest = 0.0f32;
            for (cell, slot) in self.cells.iter_mut().zip(&self.slots) {
                let Some(slot) = slot else { continue };
                let frame = Size::new(slot.width, framed.height);
                let desired = cell.measure(ctx, frame, Size::new(slot.width, remaining.height))?;
                let used = cell.arrange(ctx, frame, Size::new(slot.width, desired.height))?;
                tallest = tallest.max(used.height);
            }
            let settled = (tallest - height).abs() < EPSILON;
            height = tallest;
            if settled {
                break;
            }
        }

        for (cell, slot) in self.cells.iter_mut().zip(self.slots.iter_mut()) {
            let Some(slot) = slot else { continue };
            slot.height = height;
            cell.arrange(ctx, Size::new(slot.width, framed.height), slot.size())?;
        }

        self.size = Size::new(columns.widths().iter().sum(), height);
        log::trace!("row {} arranged to {:?} in {} passes", self.id, self.size, self.passes);
        Ok(self.size)
    }

    /// Paint the row with the canvas origin at the row's top-left.
    pub(crate) fn render_cells(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>) -> Result<()> {
        if let Some(fill) = self.background.filter(|b| !b.is_transparent()) {
            canvas.draw_rect(Rectangle::from_size(self.size), Some(fill), None);
        }
        for (cell, slot) in self.cells.iter().zip(&self.slots) {
            let Some(slot) = slot else { continue };
            with_saved(canvas, |c| {
                c.translate(slot.left, slot.top);
                c.clip(Rectangle::from_size(slot.size()));
                cell.render(c, ctx, slot.size())
            })?;
        }
        Ok(())
    }

    fn detached(&self) -> LayoutError {
        LayoutError::DetachedRow { row: self.id }
    }
}

impl Default for TableRow {
    fn default() -> Self {
        Self::new()
    }
}

impl Control for TableRow {
    fn id(&self) -> ControlId {
        self.id
    }

    fn kind(&self) -> ControlKind {
        if self.header {
            ControlKind::TableHeader
        } else {
            ControlKind::TableRow
        }
    }

    fn measure(&mut self, _ctx: &LayoutContext<'_>, _framed: Size, _remaining: Size) -> Result<Size> {
        Err(self.detached())
    }

    fn arrange(&mut self, _ctx: &LayoutContext<'_>, _framed: Size, _remaining: Size) -> Result<Size> {
        Err(self.detached())
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>, _parent: Size) -> Result<Size> {
        if self.owner.is_none() {
            return Err(self.detached());
        }
        self.render_cells(canvas, ctx)?;
        Ok(Size::ZERO)
    }

    fn desired_size(&self) -> Size {
        self.desired
    }

    fn arrangement(&self) -> Rectangle {
        Rectangle::from_size(self.size)
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

impl ContentContainer for TableRow {
    fn can_add(&self, kind: ControlKind) -> bool {
        kind == ControlKind::TableCell
    }

    fn children(&self) -> Vec<&dyn Control> {
        self.cells.iter().map(|c| c as &dyn Control).collect()
    }

    fn add(&mut self, child: Box<dyn Control>) -> Result<()> {
        let violation = LayoutError::StructuralViolation {
            parent: self.kind(),
            child: child.kind(),
            position: self.cells.len(),
        };
        if !self.can_add(child.kind()) {
            return Err(violation);
        }
        let cell = child.into_any().downcast::<TableCell>().map_err(|_| violation)?;
        self.cells.push(*cell);
        Ok(())
    }

    fn remove(&mut self, id: ControlId) -> Result<Box<dyn Control>> {
        let index = self
            .cells
            .iter()
            .position(|c| c.id() == id)
            .ok_or(LayoutError::UnknownChild {
                parent: self.kind(),
                id,
            })?;
        Ok(Box::new(self.cells.remove(index)))
    }
}
