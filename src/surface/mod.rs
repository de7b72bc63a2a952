//! # Drawing Surfaces
//!
//! The render sequencer never talks to a concrete canvas. It drives a
//! [`DrawingSurface`], which can be resized and hands out a [`DrawContext`]
//! with the usual 2D-canvas capabilities: fill rectangles, fill and stroke
//! text, draw scaled images, plus settable font/alignment/colour/line-width
//! and shadow state.
//!
//! ```text
//! render sequencer ──► DrawingSurface::resize / context_2d
//!                            │
//!                            ▼
//!                      DrawContext ──► RasterSurface   (pixels, PNG/JPEG)
//!                                  └─► RecordingSurface (draw-call log)
//! ```
//!
//! Text measurement is split into its own [`TextMeasurer`] trait so the
//! layout engine can size the title sidebar without needing a full context.

mod color;
pub mod raster;
pub mod recording;

pub use color::Color;
pub use raster::RasterSurface;
pub use recording::{DrawCall, RecordingSurface};

use image::DynamicImage;
use serde::Serialize;

/// CSS points to pixels.
const PX_PER_PT: f32 = 4.0 / 3.0;

/// Font selection: size in points plus a family name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSpec {
    pub size_pt: f32,
    pub family: String,
}

impl FontSpec {
    pub fn new(size_pt: f32, family: impl Into<String>) -> Self {
        Self {
            size_pt,
            family: family.into(),
        }
    }

    /// Size in pixels (CSS: 1pt = 4/3 px).
    pub fn pixel_size(&self) -> f32 {
        self.size_pt * PX_PER_PT
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(10.0, "monospace")
    }
}

/// Horizontal anchor for `fill_text`/`stroke_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Drop shadow applied to subsequent text draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shadow {
    pub color: Color,
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
}

/// Anything that can report the rendered width of a string.
pub trait TextMeasurer {
    fn measure_text(&self, text: &str, font: &FontSpec) -> f32;
}

/// Stateful 2D drawing context.
///
/// Text is positioned on its alphabetic baseline; `x` is interpreted through
/// the current [`TextAlign`].
pub trait DrawContext: TextMeasurer {
    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color);
    fn set_line_width(&mut self, width: f32);
    fn set_font(&mut self, font: &FontSpec);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
    fn stroke_text(&mut self, text: &str, x: f32, y: f32);

    /// Draw `image` scaled to `width` x `height` with its top-left at `(x, y)`.
    fn draw_image(&mut self, image: &DynamicImage, x: i32, y: i32, width: u32, height: u32);
}

/// A resizable canvas that hands out a drawing context.
pub trait DrawingSurface {
    /// Resize to `width` x `height`. Existing pixels are discarded.
    fn resize(&mut self, width: u32, height: u32);

    /// The 2D context, or `None` if this surface cannot draw.
    fn context_2d(&mut self) -> Option<&mut dyn DrawContext>;
}
