//! The alignable box shared by every concrete control: margin, padding,
//! alignment, explicit size and clipping, plus the arithmetic that turns a
//! content size into the control's desired and arranged boxes.

use crate::canvas::{with_saved, Canvas};
use crate::error::Result;
use crate::geometry::{
    HorizontalAlignment, Length, Rectangle, Size, Thickness, VerticalAlignment,
};

use super::LayoutContext;

/// Box parameters plus the state computed by the last measure/arrange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxModel {
    pub margin: Thickness,
    pub padding: Thickness,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    /// Explicit width; `None` or `auto` sizes to content.
    pub width: Option<Length>,
    pub height: Option<Length>,
    /// Clip rendering to the arranged box.
    pub clip: bool,

    desired: Size,
    intrinsic: Size,
    arrangement: Rectangle,
    inner: Rectangle,
}

impl BoxModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_margin(mut self, margin: Thickness) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_padding(mut self, padding: Thickness) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_alignment(mut self, horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    pub fn with_horizontal(mut self, horizontal: HorizontalAlignment) -> Self {
        self.horizontal = horizontal;
        self
    }

    pub fn with_vertical(mut self, vertical: VerticalAlignment) -> Self {
        self.vertical = vertical;
        self
    }

    pub fn with_size(mut self, width: Option<Length>, height: Option<Length>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Desired size including margins.
    pub fn desired(&self) -> Size {
        self.desired
    }

    /// Desired size of the box itself (content plus padding).
    pub fn intrinsic(&self) -> Size {
        self.intrinsic
    }

    /// Arranged box relative to the slot origin.
    pub fn arrangement(&self) -> Rectangle {
        self.arrangement
    }

    /// Arranged content area (box minus padding) relative to the slot origin.
    pub fn inner(&self) -> Rectangle {
        self.inner
    }

    fn explicit(&self, length: Option<Length>, bound: f32, dpi: f32) -> Option<f32> {
        length
            .filter(|l| !l.is_auto())
            .map(|l| l.to_pixels(bound, dpi))
    }

    /// Measure: `content` receives the space available to the content and
    /// returns the content's desired size.
    pub fn measure(
        &mut self,
        ctx: &LayoutContext<'_>,
        remaining: Size,
        content: impl FnOnce(Size) -> Result<Size>,
    ) -> Result<Size> {
        let margin = self.margin.to_rectangle(remaining, ctx.dpi);
        let outer = remaining.deflate(margin);
        let padding = self.padding.to_rectangle(outer, ctx.dpi);
        let width = self.explicit(self.width, outer.width, ctx.dpi);
        let height = self.explicit(self.height, outer.height, ctx.dpi);

        let available = Size::new(
            width.unwrap_or(outer.width),
            height.unwrap_or(outer.height),
        )
        .deflate(padding);
        let mut boxed = content(available)?.inflate(padding);
        if let Some(w) = width {
            boxed.width = w;
        }
        if let Some(h) = height {
            boxed.height = h;
        }

        self.intrinsic = boxed;
        self.desired = boxed.inflate(margin);
        Ok(self.desired)
    }

    /// Arrange inside a slot of `remaining`. `content` receives the content
    /// area (its height is the page space left at the content's top) and
    /// returns the size the content actually occupies.
    ///
    /// A stretching axis takes `max(intrinsic, available)`; any other
    /// alignment takes `min(intrinsic, available)` horizontally and the
    /// content's arranged height vertically. Returns the extent consumed
    /// from the slot origin, trailing margin included.
    pub fn arrange(
        &mut self,
        ctx: &LayoutContext<'_>,
        remaining: Size,
        content: impl FnOnce(Size) -> Result<Size>,
    ) -> Result<Size> {
        let margin = self.margin.to_rectangle(remaining, ctx.dpi);
        let available = remaining.deflate(margin);
        let padding = self.padding.to_rectangle(available, ctx.dpi);
        let explicit_width = self.explicit(self.width, available.width, ctx.dpi);
        let explicit_height = self.explicit(self.height, available.height, ctx.dpi);

        let width = explicit_width.unwrap_or(match self.horizontal {
            HorizontalAlignment::Stretch => self.intrinsic.width.max(available.width),
            _ => self.intrinsic.width.min(available.width),
        });

        let content_slot = Size::new(
            width,
            explicit_height.unwrap_or(available.height),
        )
        .deflate(padding);
        let arranged = content(content_slot)?;

        let height = explicit_height.unwrap_or_else(|| {
            let natural = arranged.height + padding.height;
            match self.vertical {
                VerticalAlignment::Stretch => {
                    natural.max(self.intrinsic.height).max(available.height)
                }
                _ => natural,
            }
        });

        let dx = match self.horizontal {
            HorizontalAlignment::Left | HorizontalAlignment::Stretch => 0.0,
            HorizontalAlignment::Center => ((available.width - width) / 2.0).max(0.0),
            HorizontalAlignment::Right => (available.width - width).max(0.0),
        };
        let dy = match self.vertical {
            VerticalAlignment::Top | VerticalAlignment::Stretch => 0.0,
            VerticalAlignment::Center => ((available.height - height) / 2.0).max(0.0),
            VerticalAlignment::Bottom => (available.height - height).max(0.0),
        };

        self.arrangement = Rectangle::new(margin.left + dx, margin.top + dy, width, height);
        self.inner = self.arrangement.deflate(padding);

        Ok(Size::new(
            self.arrangement.right() + (margin.width - margin.left),
            self.arrangement.bottom() + (margin.height - margin.top),
        ))
    }

    /// Render inside save/restore, clipped to the arranged box when `clip`
    /// is set. `content` receives the arranged content area.
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        content: impl FnOnce(&mut dyn Canvas, Rectangle) -> Result<Size>,
    ) -> Result<Size> {
        with_saved(canvas, |c| {
            if self.clip {
                c.clip(self.arrangement);
            }
            content(c, self.inner)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Culture;
    use crate::fonts::FontManager;

    fn with_ctx<R>(f: impl FnOnce(&LayoutContext<'_>) -> R) -> R {
        let culture = Culture::default();
        let fonts = FontManager::default();
        let ctx = LayoutContext {
            dpi: 96.0,
            full_page: Size::new(500.0, 500.0),
            culture: &culture,
            text: &fonts,
        };
        f(&ctx)
    }

    fn sized(content: Size) -> impl FnOnce(Size) -> Result<Size> {
        move |_| Ok(content)
    }

    #[test]
    fn stretch_fills_available_space() {
        with_ctx(|ctx| {
            let mut b = BoxModel::new()
                .with_alignment(HorizontalAlignment::Stretch, VerticalAlignment::Stretch);
            b.measure(ctx, Size::new(300.0, 300.0), sized(Size::new(40.0, 20.0)))
                .unwrap();
            let used = b
                .arrange(ctx, Size::new(200.0, 100.0), sized(Size::new(40.0, 20.0)))
                .unwrap();
            assert_eq!(used, Size::new(200.0, 100.0));
            assert_eq!(b.arrangement(), Rectangle::new(0.0, 0.0, 200.0, 100.0));
        });
    }

    #[test]
    fn stretch_never_shrinks_below_intrinsic() {
        with_ctx(|ctx| {
            let mut b = BoxModel::new()
                .with_alignment(HorizontalAlignment::Stretch, VerticalAlignment::Stretch);
            b.measure(ctx, Size::new(300.0, 300.0), sized(Size::new(250.0, 150.0)))
                .unwrap();
            let used = b
                .arrange(ctx, Size::new(200.0, 100.0), sized(Size::new(250.0, 150.0)))
                .unwrap();
            assert_eq!(used, Size::new(250.0, 150.0));
        });
    }

    #[test]
    fn non_stretch_width_is_capped_and_aligned() {
        with_ctx(|ctx| {
            let mut b = BoxModel::new()
                .with_alignment(HorizontalAlignment::Right, VerticalAlignment::Top);
            b.measure(ctx, Size::new(200.0, 100.0), sized(Size::new(50.0, 10.0)))
                .unwrap();
            b.arrange(ctx, Size::new(200.0, 100.0), sized(Size::new(50.0, 10.0)))
                .unwrap();
            assert_eq!(b.arrangement(), Rectangle::new(150.0, 0.0, 50.0, 10.0));

            let mut wide = BoxModel::new()
                .with_alignment(HorizontalAlignment::Center, VerticalAlignment::Top);
            wide.measure(ctx, Size::new(300.0, 100.0), sized(Size::new(300.0, 10.0)))
                .unwrap();
            wide.arrange(ctx, Size::new(120.0, 100.0), sized(Size::new(300.0, 10.0)))
                .unwrap();
            assert_eq!(wide.arrangement().width, 120.0);
        });
    }

    #[test]
    fn margin_and_padding_wrap_content() {
        with_ctx(|ctx| {
            let mut b = BoxModel::new()
                .with_margin(Thickness::uniform(Length::px(5.0)))
                .with_padding(Thickness::uniform(Length::px(3.0)))
                .with_alignment(HorizontalAlignment::Left, VerticalAlignment::Top);
            let desired = b
                .measure(ctx, Size::new(200.0, 200.0), |avail| {
                    assert_eq!(avail, Size::new(184.0, 184.0));
                    Ok(Size::new(20.0, 10.0))
                })
                .unwrap();
            assert_eq!(desired, Size::new(36.0, 26.0));
            assert_eq!(b.intrinsic(), Size::new(26.0, 16.0));

            let used = b
                .arrange(ctx, Size::new(200.0, 200.0), sized(Size::new(20.0, 10.0)))
                .unwrap();
            assert_eq!(used, Size::new(36.0, 26.0));
            assert_eq!(b.arrangement(), Rectangle::new(5.0, 5.0, 26.0, 16.0));
            assert_eq!(b.inner(), Rectangle::new(8.0, 8.0, 20.0, 10.0));
        });
    }

    #[test]
    fn explicit_size_overrides_content() {
        with_ctx(|ctx| {
            let mut b = BoxModel::new()
                .with_size(Some(Length::px(100.0)), Some(Length::percent(50.0)));
            let desired = b
                .measure(ctx, Size::new(400.0, 300.0), sized(Size::new(10.0, 10.0)))
                .unwrap();
            assert_eq!(desired, Size::new(100.0, 150.0));
            let used = b
                .arrange(ctx, Size::new(400.0, 300.0), sized(Size::new(10.0, 10.0)))
                .unwrap();
            assert_eq!(used, Size::new(100.0, 150.0));
        });
    }

    #[test]
    fn alignment_builders_keep_other_parameters() {
        let b = BoxModel::new()
            .with_padding(Thickness::uniform(Length::px(2.0)))
            .with_vertical(VerticalAlignment::Stretch)
            .with_horizontal(HorizontalAlignment::Right);
        assert_eq!(b.vertical, VerticalAlignment::Stretch);
        assert_eq!(b.horizontal, HorizontalAlignment::Right);
        assert_eq!(b.padding, Thickness::uniform(Length::px(2.0)));
    }

    #[test]
    fn clip_brackets_render() {
        use crate::canvas::{DrawCommand, VirtualCanvas};
        let mut b = BoxModel::new();
        b.clip = true;
        let mut canvas = VirtualCanvas::new();
        b.render(&mut canvas, |_, _| Ok(Size::ZERO)).unwrap();
        let cmds = canvas.commands();
        assert!(matches!(cmds[0], DrawCommand::Save));
        assert!(matches!(cmds[1], DrawCommand::Clip(_)));
        assert!(matches!(cmds[2], DrawCommand::Restore));
    }
}
