//! The control protocol – the Measure/Arrange/Render contract shared by every
//! visual element, and the container protocol layered on top of it.
//!
//! A generation walks the tree exactly once through each phase:
//!
//! 1. **Measure** – compute the desired size. It may exceed the remaining
//!    space; overflow is resolved by pagination, not here.
//! 2. **Arrange** – fix the final size and position inside the slot the
//!    parent offers. The width never exceeds the offered width unless the
//!    control stretches. The vertical axis is the flow axis, so arranged
//!    height may run past the end of the current page.
//! 3. **Render** – paint at the arranged position, bracketing any translate
//!    or clip in save/restore.
//!
//! Slots are expressed as `remaining` sizes whose height is the space left on
//! the current page. `framed` is the page as seen by the nearest ancestor:
//! ancestors shrink its width by their insets but its height stays the zone
//! height, which is the period at which the flow wraps onto a new page.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::canvas::Canvas;
use crate::error::{LayoutError, Result};
use crate::fonts::TextMeasurer;
use crate::geometry::{Rectangle, Size};

pub mod border;
pub mod box_model;
pub mod image;
pub mod line;
pub mod page_number;
pub mod stack;
pub mod table;
pub mod text;

pub use border::Border;
pub use box_model::BoxModel;
pub use image::Image;
pub use line::{Line, Orientation};
pub use page_number::PageNumber;
pub use table::{ColumnNegotiation, RowPlacement, Table, TableCell, TableRow, MAX_ROW_PASSES};
pub use text::{TextAlign, TextBlock};

static NEXT_CONTROL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a control instance, used for container membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

impl ControlId {
    pub fn next() -> Self {
        ControlId(NEXT_CONTROL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The fixed set of control types. Structural checks (`can_add`) are
/// decided on this, not on concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    TextBlock,
    Line,
    Image,
    PageNumber,
    Border,
    Table,
    TableHeader,
    TableRow,
    TableCell,
}

impl ControlKind {
    /// Rows and cells only live inside their dedicated parents.
    pub fn is_table_part(&self) -> bool {
        matches!(
            self,
            ControlKind::TableHeader | ControlKind::TableRow | ControlKind::TableCell
        )
    }

    pub fn is_row(&self) -> bool {
        matches!(self, ControlKind::TableHeader | ControlKind::TableRow)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Number formatting conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct Culture {
    pub name: String,
    /// Thousands separator; `None` disables grouping.
    pub group_separator: Option<char>,
}

impl Default for Culture {
    fn default() -> Self {
        Self {
            name: "en-US".to_string(),
            group_separator: Some(','),
        }
    }
}

impl Culture {
    pub fn invariant() -> Self {
        Self {
            name: String::new(),
            group_separator: None,
        }
    }

    /// A handful of well-known tags; anything else falls back to `en-US`
    /// grouping under the given name.
    pub fn from_name(name: &str) -> Self {
        let group_separator = match name {
            "" => None,
            "de-DE" | "nl-NL" | "it-IT" | "es-ES" | "pt-BR" => Some('.'),
            "fr-FR" | "ru-RU" | "pl-PL" | "sv-SE" => Some('\u{a0}'),
            "de-CH" => Some('\''),
            _ => Some(','),
        };
        Self {
            name: name.to_string(),
            group_separator,
        }
    }

    pub fn format_integer(&self, value: usize) -> String {
        let digits = value.to_string();
        let Some(sep) = self.group_separator else {
            return digits;
        };
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(sep);
            }
            out.push(ch);
        }
        out
    }
}

/// Inputs shared by every control during one generation.
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    pub dpi: f32,
    /// The printable area of a page.
    pub full_page: Size,
    pub culture: &'a Culture,
    pub text: &'a dyn TextMeasurer,
}

/// A node of the document tree.
pub trait Control {
    fn id(&self) -> ControlId;

    fn kind(&self) -> ControlKind;

    /// Compute and remember the desired size.
    fn measure(&mut self, ctx: &LayoutContext<'_>, framed: Size, remaining: Size) -> Result<Size>;

    /// Fix the final size and position within a slot of `remaining`, and
    /// return the extent consumed from the slot origin.
    fn arrange(&mut self, ctx: &LayoutContext<'_>, framed: Size, remaining: Size) -> Result<Size>;

    /// Paint with the canvas origin at the slot origin. Returns additional
    /// size consumed beyond the arranged extent (usually zero).
    fn render(&self, canvas: &mut dyn Canvas, ctx: &LayoutContext<'_>, parent: Size) -> Result<Size>;

    /// Last measured size, margins included.
    fn desired_size(&self) -> Size;

    /// Last arranged box relative to the slot origin, margins excluded.
    fn arrangement(&self) -> Rectangle;

    fn as_container(&self) -> Option<&dyn ContentContainer> {
        None
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn ContentContainer> {
        None
    }

    /// Owned downcasting for containers that store concrete child types.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A control that holds an ordered list of children.
pub trait ContentContainer {
    /// Whether a child of `kind` may be added.
    fn can_add(&self, kind: ControlKind) -> bool;

    fn children(&self) -> Vec<&dyn Control>;

    /// Append `child`. Fails with `StructuralViolation` when `can_add`
    /// refuses it.
    fn add(&mut self, child: Box<dyn Control>) -> Result<()>;

    /// Detach the child with `id` and hand it back.
    fn remove(&mut self, id: ControlId) -> Result<Box<dyn Control>>;
}

/// Add `child` to `parent`, failing with `UnsupportedChild` when `parent` is
/// a leaf.
pub fn add_child(parent: &mut dyn Control, child: Box<dyn Control>) -> Result<()> {
    let kind = parent.kind();
    match parent.as_container_mut() {
        Some(container) => container.add(child),
        None => Err(LayoutError::UnsupportedChild {
            control: kind,
            child: child.kind(),
        }),
    }
}

/// Space left on the current page after `used` pixels of flow, when the
/// slot started with `remaining` and pages are `page_height` tall.
pub fn remaining_on_page(remaining: f32, used: f32, page_height: f32) -> f32 {
    if used < remaining {
        return remaining - used;
    }
    if page_height <= 0.0 || !page_height.is_finite() {
        return 0.0;
    }
    page_height - (used - remaining) % page_height
}

/// Checks shared by the general-purpose containers: anything but rows and
/// cells.
pub(crate) fn check_general_child(
    parent: ControlKind,
    child: &dyn Control,
    position: usize,
) -> Result<()> {
    if child.kind().is_table_part() {
        return Err(LayoutError::StructuralViolation {
            parent,
            child: child.kind(),
            position,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ControlId::next();
        let b = ControlId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn culture_groups_digits() {
        let en = Culture::default();
        assert_eq!(en.format_integer(7), "7");
        assert_eq!(en.format_integer(1234), "1,234");
        assert_eq!(en.format_integer(1234567), "1,234,567");
        assert_eq!(Culture::from_name("de-DE").format_integer(1234), "1.234");
        assert_eq!(Culture::invariant().format_integer(1234), "1234");
    }

    #[test]
    fn remaining_wraps_onto_following_pages() {
        assert_eq!(remaining_on_page(40.0, 10.0, 100.0), 30.0);
        assert_eq!(remaining_on_page(40.0, 40.0, 100.0), 100.0);
        assert_eq!(remaining_on_page(40.0, 65.0, 100.0), 75.0);
        assert_eq!(remaining_on_page(40.0, 65.0, f32::INFINITY), 0.0);
    }

    #[test]
    fn leaves_reject_children() {
        let mut leaf = TextBlock::new("leaf");
        let err = add_child(&mut leaf, Box::new(TextBlock::new("child"))).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::UnsupportedChild {
                control: ControlKind::TextBlock,
                child: ControlKind::TextBlock
            }
        ));
    }
}
