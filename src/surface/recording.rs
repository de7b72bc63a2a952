//! Draw-call recorder.
//!
//! A [`DrawingSurface`] that keeps no pixels and instead logs every call it
//! receives, together with the style state active at the time. Tests use it
//! to assert draw order and geometry; callers can use it to inspect what a
//! render would do without paying for rasterization.

use image::DynamicImage;
use serde::Serialize;

use super::{Color, DrawContext, DrawingSurface, FontSpec, Shadow, TextAlign, TextMeasurer};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCall {
    Resize {
        width: u32,
        height: u32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        color: Color,
        font: FontSpec,
        align: TextAlign,
        shadow: Option<Shadow>,
    },
    StrokeText {
        text: String,
        x: f32,
        y: f32,
        color: Color,
        line_width: f32,
        font: FontSpec,
        align: TextAlign,
    },
    DrawImage {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        /// Natural size of the drawn image.
        source_width: u32,
        source_height: u32,
    },
}

/// Surface that records instead of drawing.
#[derive(Debug)]
pub struct RecordingSurface {
    calls: Vec<DrawCall>,
    width: u32,
    height: u32,
    /// Fixed advance used by `measure_text`.
    advance: f32,
    has_context: bool,
    fill: Color,
    stroke: Color,
    line_width: f32,
    font: FontSpec,
    align: TextAlign,
    shadow: Option<Shadow>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    /// Recorder that measures every character as 10px wide.
    pub fn new() -> Self {
        Self::with_advance(10.0)
    }

    pub fn with_advance(advance: f32) -> Self {
        Self {
            calls: Vec::new(),
            width: 0,
            height: 0,
            advance,
            has_context: true,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            font: FontSpec::default(),
            align: TextAlign::Left,
            shadow: None,
        }
    }

    /// Recorder whose `context_2d` always fails.
    pub fn without_context() -> Self {
        Self {
            has_context: false,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<DrawCall> {
        self.calls
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Only the `DrawImage` calls, in order.
    pub fn image_draws(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::DrawImage { .. }))
            .collect()
    }
}

impl TextMeasurer for RecordingSurface {
    fn measure_text(&self, text: &str, _font: &FontSpec) -> f32 {
        text.chars().count() as f32 * self.advance
    }
}

impl DrawContext for RecordingSurface {
    fn set_fill_style(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.stroke = color;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.font = font.clone();
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.align = align;
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.shadow = shadow;
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.calls.push(DrawCall::FillRect {
            x,
            y,
            width,
            height,
            color: self.fill,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.calls.push(DrawCall::FillText {
            text: text.to_string(),
            x,
            y,
            color: self.fill,
            font: self.font.clone(),
            align: self.align,
            shadow: self.shadow,
        });
    }

    fn stroke_text(&mut self, text: &str, x: f32, y: f32) {
        self.calls.push(DrawCall::StrokeText {
            text: text.to_string(),
            x,
            y,
            color: self.stroke,
            line_width: self.line_width,
            font: self.font.clone(),
            align: self.align,
        });
    }

    fn draw_image(&mut self, image: &DynamicImage, x: i32, y: i32, width: u32, height: u32) {
        self.calls.push(DrawCall::DrawImage {
            x,
            y,
            width,
            height,
            source_width: image.width(),
            source_height: image.height(),
        });
    }
}

impl DrawingSurface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.calls.push(DrawCall::Resize { width, height });
    }

    fn context_2d(&mut self) -> Option<&mut dyn DrawContext> {
        if self.has_context { Some(self) } else { None }
    }
}
