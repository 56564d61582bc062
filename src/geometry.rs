//! Geometry primitives – sizes, rectangles, unit-carrying lengths, thickness
//! insets and table column lengths.
//!
//! All layout math happens in pixels at the document DPI. [`Length`] is the
//! only type that knows about physical units; it is resolved with
//! [`Length::to_pixels`] as late as possible, against whatever bound the
//! caller has at hand (percentages are relative to that bound).

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// DPI used when lengths are compared with each other.
pub const REFERENCE_DPI: f32 = 96.0;

/// Bound used when lengths are compared with each other (100×100 px box).
pub const REFERENCE_BOUND: f32 = 100.0;

/// TeX points per inch, used for the `pt` unit.
pub const POINTS_PER_INCH: f32 = 72.272;

const MM_PER_INCH: f32 = 25.4;
const CM_PER_INCH: f32 = 2.54;

// ---------------------------------------------------------------------------
// Size / Point / Rectangle
// ---------------------------------------------------------------------------

/// A width/height pair in pixels. Callers never construct negative sizes;
/// subtraction saturates at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn with_height(self, height: f32) -> Self {
        Self { height, ..self }
    }

    pub fn with_width(self, width: f32) -> Self {
        Self { width, ..self }
    }

    /// Component-wise maximum.
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum.
    pub fn min(self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }

    /// Remove the insets described by `insets` (see [`Thickness::to_rectangle`]).
    pub fn deflate(self, insets: Rectangle) -> Size {
        self - Size::new(insets.width, insets.height)
    }

    /// Add the insets described by `insets` (see [`Thickness::to_rectangle`]).
    pub fn inflate(self, insets: Rectangle) -> Size {
        self + Size::new(insets.width, insets.height)
    }
}

impl Add for Size {
    type Output = Size;
    fn add(self, rhs: Size) -> Size {
        Size::new(self.width + rhs.width, self.height + rhs.height)
    }
}

impl AddAssign for Size {
    fn add_assign(&mut self, rhs: Size) {
        *self = *self + rhs;
    }
}

impl Sub for Size {
    type Output = Size;
    fn sub(self, rhs: Size) -> Size {
        Size::new(
            (self.width - rhs.width).max(0.0),
            (self.height - rhs.height).max(0.0),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// An axis-aligned rectangle, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::from_point_size(Point::ORIGIN, size)
    }

    pub fn from_point_size(location: Point, size: Size) -> Self {
        Self::new(location.x, location.y, size.width, size.height)
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn location(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Shrink by the insets described by `insets`.
    pub fn deflate(self, insets: Rectangle) -> Self {
        Self::new(
            self.left + insets.left,
            self.top + insets.top,
            (self.width - insets.width).max(0.0),
            (self.height - insets.height).max(0.0),
        )
    }

    /// Overlapping part of two rectangles; empty (zero-sized) when disjoint.
    pub fn intersect(&self, other: &Rectangle) -> Rectangle {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rectangle::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }
}

impl From<Size> for Rectangle {
    fn from(size: Size) -> Self {
        Rectangle::from_size(size)
    }
}

impl From<Rectangle> for Size {
    fn from(rect: Rectangle) -> Self {
        rect.size()
    }
}

impl From<Rectangle> for Point {
    fn from(rect: Rectangle) -> Self {
        rect.location()
    }
}

// ---------------------------------------------------------------------------
// Length
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    Auto,
    Pixel,
    /// Stored pre-divided by 100 (`50%` is `0.5`).
    Percent,
    Points,
    Millimeters,
    Centimeters,
    Inches,
}

/// A value with a unit, resolved to pixels against a bound and a DPI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Length {
    value: f32,
    unit: Unit,
}

impl Length {
    pub const AUTO: Length = Length {
        value: 0.0,
        unit: Unit::Auto,
    };

    pub const ZERO: Length = Length {
        value: 0.0,
        unit: Unit::Pixel,
    };

    pub fn new(value: f32, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn px(value: f32) -> Self {
        Self::new(value, Unit::Pixel)
    }

    /// `percent(50.0)` is half of the bound.
    pub fn percent(value: f32) -> Self {
        Self::new(value / 100.0, Unit::Percent)
    }

    pub fn pt(value: f32) -> Self {
        Self::new(value, Unit::Points)
    }

    pub fn mm(value: f32) -> Self {
        Self::new(value, Unit::Millimeters)
    }

    pub fn cm(value: f32) -> Self {
        Self::new(value, Unit::Centimeters)
    }

    pub fn inches(value: f32) -> Self {
        Self::new(value, Unit::Inches)
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn is_auto(&self) -> bool {
        self.unit == Unit::Auto
    }

    /// Resolve to pixels. `Auto` takes the whole bound.
    pub fn to_pixels(&self, bound: f32, dpi: f32) -> f32 {
        match self.unit {
            Unit::Auto => bound,
            Unit::Pixel => self.value,
            Unit::Percent => self.value * bound,
            Unit::Points => self.value * dpi / POINTS_PER_INCH,
            Unit::Millimeters => self.value * dpi / MM_PER_INCH,
            Unit::Centimeters => self.value * dpi / CM_PER_INCH,
            Unit::Inches => self.value * dpi,
        }
    }

    /// Like [`Length::to_pixels`], but `Auto` resolves to zero. Used for
    /// insets, where "auto" means "nothing".
    pub fn to_pixels_or_zero(&self, bound: f32, dpi: f32) -> f32 {
        if self.is_auto() {
            0.0
        } else {
            self.to_pixels(bound, dpi)
        }
    }

    /// Split the length evenly over `parts`, keeping the unit.
    pub fn divided_by(&self, parts: u32) -> Length {
        if parts <= 1 || self.is_auto() {
            return *self;
        }
        Length::new(self.value / parts as f32, self.unit)
    }

    fn reference_pixels(&self) -> f32 {
        self.to_pixels(REFERENCE_BOUND, REFERENCE_DPI)
    }
}

impl PartialEq for Length {
    fn eq(&self, other: &Self) -> bool {
        self.reference_pixels() == other.reference_pixels()
    }
}

impl PartialOrd for Length {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.reference_pixels().partial_cmp(&other.reference_pixels())
    }
}

impl FromStr for Length {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            return Ok(Length::AUTO);
        }
        let (number, unit) = if let Some(n) = s.strip_suffix('%') {
            (n, Unit::Percent)
        } else if let Some(n) = s.strip_suffix("px") {
            (n, Unit::Pixel)
        } else if let Some(n) = s.strip_suffix("pt") {
            (n, Unit::Points)
        } else if let Some(n) = s.strip_suffix("mm") {
            (n, Unit::Millimeters)
        } else if let Some(n) = s.strip_suffix("cm") {
            (n, Unit::Centimeters)
        } else if let Some(n) = s.strip_suffix("in") {
            (n, Unit::Inches)
        } else {
            (s, Unit::Pixel)
        };
        let value: f32 = number
            .trim()
            .parse()
            .map_err(|_| LayoutError::InvalidLength(s.to_string()))?;
        if !value.is_finite() {
            return Err(LayoutError::InvalidLength(s.to_string()));
        }
        Ok(match unit {
            Unit::Percent => Length::percent(value),
            unit => Length::new(value, unit),
        })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Unit::Auto => write!(f, "auto"),
            Unit::Pixel => write!(f, "{}px", self.value),
            Unit::Percent => write!(f, "{}%", self.value * 100.0),
            Unit::Points => write!(f, "{}pt", self.value),
            Unit::Millimeters => write!(f, "{}mm", self.value),
            Unit::Centimeters => write!(f, "{}cm", self.value),
            Unit::Inches => write!(f, "{}in", self.value),
        }
    }
}

impl TryFrom<String> for Length {
    type Error = LayoutError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Length> for String {
    fn from(value: Length) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Thickness
// ---------------------------------------------------------------------------

/// Four insets (margin, padding or border width).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Thickness {
    pub left: Length,
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
}

impl Default for Thickness {
    fn default() -> Self {
        Self::uniform(Length::ZERO)
    }
}

impl Thickness {
    pub fn new(left: Length, top: Length, right: Length, bottom: Length) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn uniform(all: Length) -> Self {
        Self::new(all, all, all, all)
    }

    /// Resolve to pixel insets. The returned rectangle carries the leading
    /// insets in `left`/`top` and the total horizontal/vertical inset in
    /// `width`/`height`, so it can be fed directly to [`Rectangle::deflate`]
    /// and [`Size::deflate`]. Horizontal insets resolve against the bound's
    /// width, vertical ones against its height.
    pub fn to_rectangle(&self, bounds: Size, dpi: f32) -> Rectangle {
        let left = self.left.to_pixels_or_zero(bounds.width, dpi);
        let right = self.right.to_pixels_or_zero(bounds.width, dpi);
        let top = self.top.to_pixels_or_zero(bounds.height, dpi);
        let bottom = self.bottom.to_pixels_or_zero(bounds.height, dpi);
        Rectangle::new(left, top, left + right, top + bottom)
    }
}

impl FromStr for Thickness {
    type Err = LayoutError;

    /// One value (all sides), two values (horizontal vertical) or four values
    /// (left top right bottom), separated by whitespace or commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(str::parse::<Length>)
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [] => Ok(Thickness::default()),
            [all] => Ok(Thickness::uniform(*all)),
            [h, v] => Ok(Thickness::new(*h, *v, *h, *v)),
            [l, t, r, b] => Ok(Thickness::new(*l, *t, *r, *b)),
            _ => Err(LayoutError::InvalidLength(format!(
                "thickness needs 1, 2 or 4 values: {s:?}"
            ))),
        }
    }
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.left, self.top, self.right, self.bottom)
    }
}

impl TryFrom<String> for Thickness {
    type Error = LayoutError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Thickness> for String {
    fn from(value: Thickness) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// ColumnLength
// ---------------------------------------------------------------------------

/// Declared width of a table column: a proportional weight (`2*`) or a plain
/// length (`120px`, `25%`, `auto`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnLength {
    Parts(f32),
    Fixed(Length),
}

impl Default for ColumnLength {
    fn default() -> Self {
        ColumnLength::Fixed(Length::AUTO)
    }
}

impl ColumnLength {
    pub fn is_auto(&self) -> bool {
        matches!(self, ColumnLength::Fixed(l) if l.is_auto())
    }

    /// Share of this declaration that one column of a `span`-wide cell gets.
    pub fn divided_by(&self, span: u32) -> ColumnLength {
        match self {
            ColumnLength::Parts(p) if span > 1 => ColumnLength::Parts(p / span as f32),
            ColumnLength::Parts(p) => ColumnLength::Parts(*p),
            ColumnLength::Fixed(l) => ColumnLength::Fixed(l.divided_by(span)),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ColumnLength::Fixed(l) if l.is_auto() => 0,
            ColumnLength::Parts(_) => 1,
            ColumnLength::Fixed(_) => 2,
        }
    }

    /// The larger of two declarations. An explicit length beats a weight,
    /// which beats `auto`; within a kind the larger pixel value wins.
    pub fn max_of(self, other: ColumnLength, bound: f32, dpi: f32) -> ColumnLength {
        match (self, other) {
            (ColumnLength::Parts(a), ColumnLength::Parts(b)) => ColumnLength::Parts(a.max(b)),
            (ColumnLength::Fixed(a), ColumnLength::Fixed(b))
                if !a.is_auto() && !b.is_auto() =>
            {
                if b.to_pixels(bound, dpi) > a.to_pixels(bound, dpi) {
                    other
                } else {
                    self
                }
            }
            _ if other.rank() > self.rank() => other,
            _ => self,
        }
    }
}

impl FromStr for ColumnLength {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(weight) = s.strip_suffix('*') {
            let weight = weight.trim();
            if weight.is_empty() {
                return Ok(ColumnLength::Parts(1.0));
            }
            return weight
                .parse::<f32>()
                .ok()
                .filter(|w| w.is_finite() && *w >= 0.0)
                .map(ColumnLength::Parts)
                .ok_or_else(|| LayoutError::InvalidLength(s.to_string()));
        }
        s.parse().map(ColumnLength::Fixed)
    }
}

impl fmt::Display for ColumnLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLength::Parts(p) => write!(f, "{p}*"),
            ColumnLength::Fixed(l) => write!(f, "{l}"),
        }
    }
}

impl TryFrom<String> for ColumnLength {
    type Error = LayoutError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnLength> for String {
    fn from(value: ColumnLength) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
    #[default]
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
    Stretch,
}
