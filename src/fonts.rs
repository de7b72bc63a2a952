//! Process-wide TTF font registry.
//!
//! Fonts are registered explicitly, once, before rendering:
//!
//! ```no_run
//! topster::fonts::register_font("fonts/UbuntuMono-Regular.ttf", "Ubuntu Mono")?;
//! # Ok::<(), topster::TopsterError>(())
//! ```
//!
//! Registering the same family again is a no-op. Families that were never
//! registered fall back to the built-in bitmap font in the raster surface.

use ab_glyph::{Font, FontArc, ScaleFont};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{OnceLock, RwLock};

use crate::error::{Result, TopsterError};

static REGISTRY: OnceLock<RwLock<HashMap<String, FontArc>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, FontArc>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn normalize(family: &str) -> String {
    family.trim().trim_matches('"').to_ascii_lowercase()
}

/// Load a TTF/OTF file and register it under `family`.
pub fn register_font(path: impl AsRef<Path>, family: &str) -> Result<()> {
    let key = normalize(family);
    if is_registered(&key) {
        return Ok(());
    }

    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let font = FontArc::try_from_vec(bytes)
        .map_err(|e| TopsterError::Font(format!("Failed to parse {}: {}", path.display(), e)))?;

    register_font_arc(family, font)?;
    tracing::info!(family, path = %path.display(), "registered font");
    Ok(())
}

/// Register an already parsed font (e.g. one embedded by the caller).
pub fn register_font_arc(family: &str, font: FontArc) -> Result<()> {
    let mut fonts = registry()
        .write()
        .map_err(|_| TopsterError::Font("font registry poisoned".to_string()))?;
    fonts.entry(normalize(family)).or_insert(font);
    Ok(())
}

/// Whether a family has been registered.
pub fn is_registered(family: &str) -> bool {
    registry()
        .read()
        .map(|fonts| fonts.contains_key(&normalize(family)))
        .unwrap_or(false)
}

/// Look up a registered family.
pub fn lookup(family: &str) -> Option<FontArc> {
    registry()
        .read()
        .ok()
        .and_then(|fonts| fonts.get(&normalize(family)).cloned())
}

/// Rendered TTF text as an anti-aliased coverage mask.
pub struct TtfRender {
    pub width: usize,
    pub height: usize,
    /// Distance from the top of the mask to the baseline.
    pub ascent: f32,
    /// Coverage values: 0.0 = empty, 1.0 = fully inked.
    pub data: Vec<f32>,
}

/// Advance width of `text` at `pixel_height`.
pub fn measure_ttf_text(font: &FontArc, text: &str, pixel_height: f32) -> f32 {
    let scaled = font.as_scaled(pixel_height);
    text.chars()
        .map(|ch| scaled.h_advance(font.glyph_id(ch)))
        .sum()
}

/// Rasterize `text` into a coverage mask.
pub fn render_ttf_text(font: &FontArc, text: &str, pixel_height: f32) -> TtfRender {
    let scaled = font.as_scaled(pixel_height);

    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        glyphs.push((glyph_id, caret_x));
        caret_x += scaled.h_advance(glyph_id);
    }

    let width = (caret_x.ceil() as usize).max(1);
    let ascent = scaled.ascent();
    let height = ((ascent - scaled.descent()).ceil() as usize).max(1);

    let mut data = vec![0.0f32; width * height];

    for &(glyph_id, glyph_x) in &glyphs {
        let glyph = glyph_id.with_scale_and_position(pixel_height, ab_glyph::point(glyph_x, ascent));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;

                if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                    let idx = y as usize * width + x as usize;
                    data[idx] = (data[idx] + coverage).min(1.0);
                }
            });
        }
    }

    TtfRender {
        width,
        height,
        ascent,
        data,
    }
}
