//! # Raster Surface
//!
//! Headless [`DrawingSurface`] backed by an `image::RgbaImage`. This is the
//! server-side canvas: charts rendered here can be encoded straight to PNG
//! or JPEG.
//!
//! Text uses a TTF font when the requested family was registered through
//! [`crate::fonts`], and otherwise the built-in Spleen 12x24 bitmap font,
//! scaled by an integer factor to approximate the requested size.

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage, imageops::FilterType};
use spleen_font::{FONT_12X24, PSF2Font};
use std::io::Cursor;
use std::path::Path;

use super::{Color, DrawContext, DrawingSurface, FontSpec, Shadow, TextAlign, TextMeasurer};
use crate::error::{Result, TopsterError};
use crate::fonts;

const BITMAP_W: usize = 12;
const BITMAP_H: usize = 24;
/// Baseline row inside a 12x24 Spleen cell.
const BITMAP_ASCENT: usize = 19;

/// Anti-aliased coverage mask for one string.
struct TextMask {
    width: usize,
    height: usize,
    ascent: f32,
    data: Vec<f32>,
}

impl TextMask {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            ascent: 0.0,
            data: Vec::new(),
        }
    }

    /// Grow every inked pixel by `radius` (used for outlines).
    fn dilate(&self, radius: usize) -> TextMask {
        let width = self.width + radius * 2;
        let height = self.height + radius * 2;
        let mut data = vec![0.0f32; width * height];
        let r = radius as i32;

        for y in 0..self.height {
            for x in 0..self.width {
                let v = self.data[y * self.width + x];
                if v <= 0.0 {
                    continue;
                }
                for dy in -r..=r {
                    for dx in -r..=r {
                        let tx = (x as i32 + r + dx) as usize;
                        let ty = (y as i32 + r + dy) as usize;
                        let idx = ty * width + tx;
                        data[idx] = data[idx].max(v);
                    }
                }
            }
        }

        TextMask {
            width,
            height,
            ascent: self.ascent + radius as f32,
            data,
        }
    }

    /// Gaussian-blurred copy padded by `2 * sigma` on each side.
    fn blurred(&self, sigma: f32) -> TextMask {
        if sigma <= 0.0 {
            return TextMask {
                width: self.width,
                height: self.height,
                ascent: self.ascent,
                data: self.data.clone(),
            };
        }

        let pad = (sigma * 2.0).ceil() as usize;
        let width = self.width + pad * 2;
        let height = self.height + pad * 2;
        let mut gray = GrayImage::new(width as u32, height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let v = (self.data[y * self.width + x] * 255.0).round() as u8;
                gray.put_pixel((x + pad) as u32, (y + pad) as u32, Luma([v]));
            }
        }

        let blurred = image::imageops::blur(&gray, sigma);
        let data = blurred.pixels().map(|p| p[0] as f32 / 255.0).collect();

        TextMask {
            width,
            height,
            ascent: self.ascent + pad as f32,
            data,
        }
    }
}

/// In-memory RGBA canvas.
pub struct RasterSurface {
    image: RgbaImage,
    fill: Color,
    stroke: Color,
    line_width: f32,
    font: FontSpec,
    align: TextAlign,
    shadow: Option<Shadow>,
}

impl RasterSurface {
    /// Transparent canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            font: FontSpec::default(),
            align: TextAlign::Left,
            shadow: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Encode the canvas. JPEG drops the alpha channel.
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>> {
        let image = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(self.image.clone()).to_rgb8()),
            _ => DynamicImage::ImageRgba8(self.image.clone()),
        };

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .map_err(|e| TopsterError::Image(format!("Encoding failed: {}", e)))?;
        Ok(bytes)
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        self.encode(ImageFormat::Png)
    }

    /// Write the canvas to `path`, picking the format from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path)
            .map_err(|e| TopsterError::Image(format!("Unsupported output {}: {}", path.display(), e)))?;
        let bytes = self.encode(format)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn bitmap_scale(font: &FontSpec) -> usize {
        ((font.pixel_size() / BITMAP_H as f32).round() as usize).max(1)
    }

    fn text_mask(&self, text: &str) -> TextMask {
        if text.is_empty() {
            return TextMask::empty();
        }

        if let Some(font) = fonts::lookup(&self.font.family) {
            let rendered = fonts::render_ttf_text(&font, text, self.font.pixel_size());
            return TextMask {
                width: rendered.width,
                height: rendered.height,
                ascent: rendered.ascent,
                data: rendered.data,
            };
        }

        let mut font = match PSF2Font::new(FONT_12X24) {
            Ok(font) => font,
            Err(_) => return TextMask::empty(),
        };
        let scale = Self::bitmap_scale(&self.font);
        let width = text.chars().count() * BITMAP_W * scale;
        let height = BITMAP_H * scale;
        let mut data = vec![0.0f32; width * height];

        for (i, ch) in text.chars().enumerate() {
            let utf8 = ch.to_string();
            let Some(glyph) = font.glyph_for_utf8(utf8.as_bytes()) else {
                continue;
            };
            let origin_x = i * BITMAP_W * scale;
            for (row_y, row) in glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if !on {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            let x = origin_x + col_x * scale + sx;
                            let y = row_y * scale + sy;
                            if x < width && y < height {
                                data[y * width + x] = 1.0;
                            }
                        }
                    }
                }
            }
        }

        TextMask {
            width,
            height,
            ascent: (BITMAP_ASCENT * scale) as f32,
            data,
        }
    }

    /// Top-left corner for a mask anchored at `(x, baseline)`.
    fn mask_origin(&self, mask: &TextMask, x: f32, baseline: f32) -> (i32, i32) {
        let left = match self.align {
            TextAlign::Left => x,
            TextAlign::Center => x - mask.width as f32 / 2.0,
            TextAlign::Right => x - mask.width as f32,
        };
        (left.round() as i32, (baseline - mask.ascent).round() as i32)
    }

    /// Left shift, in multiples of the outline radius, that keeps a dilated
    /// mask centred on the undilated glyphs under the current alignment.
    fn align_shift(&self) -> f32 {
        match self.align {
            TextAlign::Left => 1.0,
            TextAlign::Center => 0.0,
            TextAlign::Right => -1.0,
        }
    }

    fn composite_mask(&mut self, mask: &TextMask, left: i32, top: i32, color: Color, opacity: f32) {
        let (cw, ch) = (self.image.width() as i32, self.image.height() as i32);
        let base_alpha = opacity * color.a as f32 / 255.0;
        if base_alpha <= 0.0 {
            return;
        }

        for my in 0..mask.height {
            let py = top + my as i32;
            if py < 0 || py >= ch {
                continue;
            }
            for mx in 0..mask.width {
                let px = left + mx as i32;
                if px < 0 || px >= cw {
                    continue;
                }
                let coverage = mask.data[my * mask.width + mx];
                if coverage <= 0.0 {
                    continue;
                }
                let pixel = self.image.get_pixel_mut(px as u32, py as u32);
                blend_pixel(pixel, color, coverage * base_alpha);
            }
        }
    }

    fn draw_text_mask(&mut self, mask: &TextMask, x: f32, y: f32, color: Color, opacity: f32) {
        if mask.width == 0 {
            return;
        }

        if let Some(shadow) = self.shadow {
            let shadow_mask = mask.blurred(shadow.blur / 2.0);
            let (left, top) = self.mask_origin(mask, x + shadow.offset_x, y + shadow.offset_y);
            let pad_x = (shadow_mask.width - mask.width) as i32 / 2;
            let pad_y = (shadow_mask.height - mask.height) as i32 / 2;
            self.composite_mask(&shadow_mask, left - pad_x, top - pad_y, shadow.color, opacity);
        }

        let (left, top) = self.mask_origin(mask, x, y);
        self.composite_mask(mask, left, top, color, opacity);
    }
}

/// Canvas-clipped part of `[start, start + len)` as `(start, len)`.
fn visible_span(start: i32, len: u32, canvas: u32) -> Option<(i64, u32)> {
    let lo = (start as i64).max(0);
    let hi = (start as i64 + len as i64).min(canvas as i64);
    (hi > lo).then(|| (lo, (hi - lo) as u32))
}

/// Source pixels covering `len` destination pixels starting `offset` into a
/// `scaled`-wide draw of a `natural`-wide image.
fn source_span(offset: i64, len: u32, scaled: u32, natural: u32) -> (u32, u32) {
    let ratio = natural as f64 / scaled as f64;
    let lo = ((offset as f64 * ratio).floor() as u32).min(natural - 1);
    let hi = (((offset + len as i64) as f64 * ratio).ceil() as u32).clamp(lo + 1, natural);
    (lo, hi - lo)
}

/// Source-over blend of `color` at `alpha` onto `dst` (straight alpha).
fn blend_pixel(dst: &mut Rgba<u8>, color: Color, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha >= 1.0 {
        *dst = Rgba([color.r, color.g, color.b, 255]);
        return;
    }

    let dst_a = dst[3] as f32 / 255.0;
    let out_a = alpha + dst_a * (1.0 - alpha);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    let mix = |src: u8, dst_c: u8| -> u8 {
        let v = (src as f32 * alpha + dst_c as f32 * dst_a * (1.0 - alpha)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };

    *dst = Rgba([
        mix(color.r, dst[0]),
        mix(color.g, dst[1]),
        mix(color.b, dst[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

impl TextMeasurer for RasterSurface {
    fn measure_text(&self, text: &str, font: &FontSpec) -> f32 {
        match fonts::lookup(&font.family) {
            Some(ttf) => fonts::measure_ttf_text(&ttf, text, font.pixel_size()),
            None => (text.chars().count() * BITMAP_W * Self::bitmap_scale(font)) as f32,
        }
    }
}

impl DrawContext for RasterSurface {
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
        let x0 = x.max(0.0).round() as u32;
        let y0 = y.max(0.0).round() as u32;
        let x1 = ((x + width).round().max(0.0) as u32).min(self.image.width());
        let y1 = ((y + height).round().max(0.0) as u32).min(self.image.height());
        let color = self.fill;
        let alpha = color.a as f32 / 255.0;

        for py in y0..y1 {
            for px in x0..x1 {
                blend_pixel(self.image.get_pixel_mut(px, py), color, alpha);
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        let mask = self.text_mask(text);
        self.draw_text_mask(&mask, x, y, self.fill, 1.0);
    }

    fn stroke_text(&mut self, text: &str, x: f32, y: f32) {
        if self.line_width <= 0.0 {
            return;
        }
        let radius = ((self.line_width / 2.0).ceil() as usize).max(1);
        let mask = self.text_mask(text);
        if mask.width == 0 {
            return;
        }
        let outline = mask.dilate(radius);
        self.draw_text_mask(&outline, x - radius as f32 * self.align_shift(), y, self.stroke, self.line_width.min(1.0));
    }

    fn draw_image(&mut self, image: &DynamicImage, x: i32, y: i32, width: u32, height: u32) {
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            return;
        }

        if image.width() == width && image.height() == height {
            image::imageops::overlay(&mut self.image, &image.to_rgba8(), x as i64, y as i64);
            return;
        }

        let (Some((dx, dw)), Some((dy, dh))) = (
            visible_span(x, width, self.image.width()),
            visible_span(y, height, self.image.height()),
        ) else {
            return;
        };

        // Only resample the part of the source that lands on the canvas
        let scaled = if dw == width && dh == height {
            image.resize_exact(width, height, FilterType::Lanczos3)
        } else {
            let (sx, sw) = source_span(dx - x as i64, dw, width, image.width());
            let (sy, sh) = source_span(dy - y as i64, dh, height, image.height());
            image.crop_imm(sx, sy, sw, sh).resize_exact(dw, dh, FilterType::Lanczos3)
        };
        image::imageops::overlay(&mut self.image, &scaled.to_rgba8(), dx, dy);
    }
}

impl DrawingSurface for RasterSurface {
    fn resize(&mut self, width: u32, height: u32) {
        *self = RasterSurface::new(width, height);
    }

    fn context_2d(&mut self) -> Option<&mut dyn DrawContext> {
        Some(self)
    }
}
