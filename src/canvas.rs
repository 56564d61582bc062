//! Drawing surface abstraction and the replayable virtual canvas.
//!
//! Controls paint through the [`Canvas`] trait. During generation they paint
//! into a [`VirtualCanvas`], which records a list of [`DrawCommand`]s instead
//! of touching a real surface. The pagination driver then replays that
//! buffer once per physical page, which is how one Render pass can cover any
//! number of pages, and how [`DrawCommand::Deferred`] entries get to see the
//! final page index and page count.

use std::fmt;
use std::rc::Rc;

use crate::geometry::{Point, Rectangle};
use crate::style::{Color, Stroke, TextStyle};

/// Position of a physical page within the finished document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Zero-based page index.
    pub index: usize,
    /// Total number of physical pages.
    pub count: usize,
}

impl PageInfo {
    pub fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }

    /// One-based page number, as printed.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Draw callback whose output depends on the physical page it lands on.
pub type DeferredDraw = Rc<dyn Fn(&mut dyn Canvas, PageInfo)>;

/// Primitive drawing operations. Coordinates are pixels relative to the
/// current translation; text origins are the top-left of the line box.
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    /// Intersect the current clip with `rect`.
    fn clip(&mut self, rect: Rectangle);
    fn draw_text(&mut self, origin: Point, text: &str, style: &TextStyle, color: Color);
    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke);
    fn draw_rect(&mut self, rect: Rectangle, fill: Option<Color>, stroke: Option<Stroke>);
    /// Draw an image identified by its source (a data URI).
    fn draw_bitmap(&mut self, rect: Rectangle, src: &str);
    /// Paint `draw` once the physical page is known.
    fn defer(&mut self, draw: DeferredDraw);
}

/// Run `f` between `save` and `restore`, so translations and clips made
/// inside do not leak to siblings.
pub fn with_saved<R>(canvas: &mut dyn Canvas, f: impl FnOnce(&mut dyn Canvas) -> R) -> R {
    canvas.save();
    let result = f(&mut *canvas);
    canvas.restore();
    result
}

/// One recorded canvas operation.
#[derive(Clone)]
pub enum DrawCommand {
    Save,
    Restore,
    Translate {
        dx: f32,
        dy: f32,
    },
    Clip(Rectangle),
    Text {
        origin: Point,
        text: String,
        style: TextStyle,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Rect {
        rect: Rectangle,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Bitmap {
        rect: Rectangle,
        src: String,
    },
    Deferred(DeferredDraw),
}

impl fmt::Debug for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawCommand::Save => f.write_str("Save"),
            DrawCommand::Restore => f.write_str("Restore"),
            DrawCommand::Translate { dx, dy } => write!(f, "Translate({dx}, {dy})"),
            DrawCommand::Clip(r) => f.debug_tuple("Clip").field(r).finish(),
            DrawCommand::Text { origin, text, .. } => f
                .debug_struct("Text")
                .field("origin", origin)
                .field("text", text)
                .finish_non_exhaustive(),
            DrawCommand::Line { from, to, .. } => f
                .debug_struct("Line")
                .field("from", from)
                .field("to", to)
                .finish_non_exhaustive(),
            DrawCommand::Rect { rect, .. } => f
                .debug_struct("Rect")
                .field("rect", rect)
                .finish_non_exhaustive(),
            DrawCommand::Bitmap { rect, .. } => f
                .debug_struct("Bitmap")
                .field("rect", rect)
                .finish_non_exhaustive(),
            DrawCommand::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A canvas that records instead of painting.
#[derive(Debug, Default, Clone)]
pub struct VirtualCanvas {
    commands: Vec<DrawCommand>,
}

impl VirtualCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Paint the recorded commands onto `target`. Deferred commands are
    /// invoked here, with `page`, inside their own save/restore.
    pub fn replay(&self, target: &mut dyn Canvas, page: PageInfo) {
        for command in &self.commands {
            match command {
                DrawCommand::Save => target.save(),
                DrawCommand::Restore => target.restore(),
                DrawCommand::Translate { dx, dy } => target.translate(*dx, *dy),
                DrawCommand::Clip(rect) => target.clip(*rect),
                DrawCommand::Text {
                    origin,
                    text,
                    style,
                    color,
                } => target.draw_text(*origin, text, style, *color),
                DrawCommand::Line { from, to, stroke } => target.draw_line(*from, *to, *stroke),
                DrawCommand::Rect { rect, fill, stroke } => target.draw_rect(*rect, *fill, *stroke),
                DrawCommand::Bitmap { rect, src } => target.draw_bitmap(*rect, src),
                DrawCommand::Deferred(draw) => with_saved(&mut *target, |t| draw(t, page)),
            }
        }
    }
}

impl Canvas for VirtualCanvas {
    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.commands.push(DrawCommand::Translate { dx, dy });
    }

    fn clip(&mut self, rect: Rectangle) {
        self.commands.push(DrawCommand::Clip(rect));
    }

    fn draw_text(&mut self, origin: Point, text: &str, style: &TextStyle, color: Color) {
        self.commands.push(DrawCommand::Text {
            origin,
            text: text.to_string(),
            style: style.clone(),
            color,
        });
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.commands.push(DrawCommand::Line { from, to, stroke });
    }

    fn draw_rect(&mut self, rect: Rectangle, fill: Option<Color>, stroke: Option<Stroke>) {
        self.commands.push(DrawCommand::Rect { rect, fill, stroke });
    }

    fn draw_bitmap(&mut self, rect: Rectangle, src: &str) {
        self.commands.push(DrawCommand::Bitmap {
            rect,
            src: src.to_string(),
        });
    }

    fn defer(&mut self, draw: DeferredDraw) {
        self.commands.push(DrawCommand::Deferred(draw));
    }
}
