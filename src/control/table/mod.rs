//! Tables: rows of cells whose column widths are negotiated across all rows.
//!
//! Measure lets every row propose per-column widths into one shared
//! [`ColumnNegotiation`]. Arrange finalizes the columns against the table's
//! width, fits each row to them, then lays the rows out top to bottom. Rows
//! flagged as headers are repeated after every page break that falls inside
//! the table.

use std::any::Any;

use crate::canvas::{with_saved, Canvas};
use crate::error::{LayoutError, Result};
use crate::geometry::{Rectangle, Size};

use super::{BoxModel, ContentContainer, Control, ControlId, ControlKind, LayoutContext};

mod cell;
mod columns;
mod row;

pub use cell::TableCell;
pub use columns::{ColumnNegotiation, ColumnRequest};
pub use row::TableRow;

/// Upper bound on measure/arrange passes per row while its height settles.
pub const MAX_ROW_PASSES: usize = 2;

const EPSILON: f32 = 0.01;

/// Where a row ended up, relative to the table's content top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPlacement {
    /// Index into [`Table::rows`].
    pub row: usize,
    pub top: f32,
    /// A header row drawn again on a continuation page.
    pub repeated: bool,
}

pub struct Table {
    id: ControlId,
    pub layout: BoxModel,
    /// Minimum column count, honoured even when rows are short or missing.
    pub columns: usize,
    rows: Vec<TableRow>,
    negotiation: ColumnNegotiation,
    placements: Vec<RowPlacement>,
}

impl Table {
    pub fn new() -> Self {
        Self {
            id: ControlId::next(),
            layout: BoxModel::default(),
            columns: 0,
            rows: Vec::new(),
            negotiation: ColumnNegotiation::default(),
            placements: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_layout(mut self, layout: BoxModel) -> Self {
        self.layout = layout;
        self
    }

    /// Builder form of [`Table::add_row`].
    pub fn row(mut self, row: TableRow) -> Self {
        self.add_row(row);
        self
    }

    /// Take ownership of `row` and append it.
    pub fn add_row(&mut self, mut row: TableRow) {
        row.attach(self.id);
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Column widths from the last arrange.
    pub fn column_widths(&self) -> &[f32] {
        self.negotiation.widths()
    }

    pub fn negotiation(&self) -> &ColumnNegotiation {
        &self.negotiation
    }

    /// Row positions from the last arrange, repeated headers included.
    pub fn placements(&self) -> &[RowPlacement] {
        &self.placements
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack rows of the given `(height, is_header)` top to bottom.
///
/// `first_page` is the space left on the page where the table starts and
/// `page_height` the height of each following page. When a body row would
/// cross a page boundary after at least one body row has been placed since
/// the headers, the row moves to the next page and the headers are repeated
/// above it. Rows that cannot fit under the headers on a fresh page are
/// left to flow across the boundary.
///
/// Returns the placements and the total height, gaps included.
pub fn plan_rows(rows: &[(f32, bool)], first_page: f32, page_height: f32) -> (Vec<RowPlacement>, f32) {
    let headers: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, (_, header))| *header)
        .map(|(i, _)| i)
        .collect();
    let header_height: f32 = headers.iter().map(|&i| rows[i].0).sum();
    let paged = page_height.is_finite() && page_height > 0.0;
    let start = if paged {
        (page_height - first_page).clamp(0.0, page_height)
    } else {
        0.0
    };

    let mut placements = Vec::with_capacity(rows.len());
    let mut top = 0.0f32;
    let mut fresh = true;
    for (index, &(height, header)) in rows.iter().enumerate() {
        if header {
            placements.push(RowPlacement {
                row: index,
                top,
                repeated: false,
            });
            top += height;
            fresh = true;
            continue;
        }

        if paged && !fresh && !headers.is_empty() {
            let position = (start + top) % page_height;
            let crosses = position + height > page_height + EPSILON;
            let fits_fresh = header_height + height <= page_height + EPSILON;
            if crosses && fits_fresh {
                top += page_height - position;
                for &h in &headers {
                    placements.push(RowPlacement {
                        row: h,
                        top,
                        repeated: true,
                    });
                    top += rows[h].0;
                }
                log::debug!("repeating {} header rows at {top}", headers.len());
            }
        }

        placements.push(RowPlacement {
            row: index,
            top,
            repeated: false,
        });
        top += height;
        fresh = false;
    }
    (placements, top)
}

impl Control for Table {
    fn id(&self) -> ControlId {
        self.id
    }

    fn kind(&self) -> ControlKind {
        ControlKind::Table
    }

    fn measure(&mut self, ctx: &LayoutContext<'_>, framed: Size, remaining: Size) -> Result<Size> {
        let min_columns = self.columns;
        let rows = &mut self.rows;
        let negotiation = &mut self.negotiation;
        self.layout.measure(ctx, remaining, |available| {
            *negotiation = ColumnNegotiation::new(min_columns, available.width, ctx.dpi);
            let mut height = 0.0;
            for row in rows.iter_mut() {
                height += row
                    .measure_columns(ctx, framed, available, negotiation)?
                    .height;
            }
            Ok(Size::new(
                negotiation.desired_total().min(available.width),
                height,
            ))
        })
    }

    fn arrange(&mut self, ctx: &LayoutContext<'_>, framed: Size, remaining: Size) -> Result<Size> {
        let rows = &mut self.rows;
        let negotiation = &mut self.negotiation;
        let placements = &mut self.placements;
        self.layout.arrange(ctx, remaining, |slot| {
            negotiation.finalize(slot.width);
            let frame = Size::new(slot.width, framed.height);
            let mut heights = Vec::with_capacity(rows.len());
            for row in rows.iter_mut() {
                let size = row.arrange_columns(ctx, frame, slot, negotiation)?;
                heights.push((size.height, row.is_header()));
            }
            let (plan, height) = plan_rows(&heights, slot.height, framed.height);
            *placements = plan;
            Ok(Size::new(slot.width, height))
        })
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>, _parent: Size) -> Result<Size> {
        self.layout.render(canvas, |c, inner| {
            for placement in &self.placements {
                let Some(row) = self.rows.get(placement.row) else {
                    continue;
                };
                with_saved(c, |c| {
                    c.translate(inner.left, inner.top + placement.top);
                    row.render_cells(c, ctx)
                })?;
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

impl ContentContainer for Table {
    fn can_add(&self, kind: ControlKind) -> bool {
        kind.is_row()
    }

    fn children(&self) -> Vec<&dyn Control> {
        self.rows.iter().map(|r| r as &dyn Control).collect()
    }

    fn add(&mut self, child: Box<dyn Control>) -> Result<()> {
        let violation = LayoutError::StructuralViolation {
            parent: ControlKind::Table,
            child: child.kind(),
            position: self.rows.len(),
        };
        if !self.can_add(child.kind()) {
            return Err(violation);
        }
        let row = child.into_any().downcast::<TableRow>().map_err(|_| violation)?;
        self.add_row(*row);
        Ok(())
    }

    fn remove(&mut self, id: ControlId) -> Result<Box<dyn Control>> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or(LayoutError::UnknownChild {
                parent: ControlKind::Table,
                id,
            })?;
        let mut row = self.rows.remove(index);
        row.detach();
        self.placements.clear();
        Ok(Box::new(row))
    }
}
