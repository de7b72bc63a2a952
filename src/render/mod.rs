//! # Render Sequencer
//!
//! Drives a [`DrawingSurface`] through one fixed pipeline per render:
//!
//! ```text
//! Sizing ──► Background ──► Chart title ──► Cover pass ──► Title pass
//!   │                                          │               │
//!   │ layout::compute_canvas_info              │ one draw per  │ flowing list,
//!   │ surface.resize                           │ populated cell│ stroke then fill
//! ```
//!
//! Titles are drawn after every cover so no cover can overlap them.
//!
//! Two entry points share the pipeline:
//!
//! - [`render_chart`] expects every cover to be decoded already (the
//!   browser-style path). A cover that is still a reference is an error.
//! - [`render_chart_async`] resolves references through an [`ImageLoader`],
//!   strictly one cover at a time in grid order, so draw order (and the
//!   resulting pixels) never depends on network timing.
//!
//! ## Failure policy
//!
//! A surface without a context aborts before anything is drawn. A cover that
//! cannot be loaded aborts the render. Everything else (bad text colour,
//! unparseable background colour, background image not available) falls back
//! to a default and the render continues.

pub mod style;

use image::DynamicImage;
use std::sync::Arc;

use crate::chart::{Background, Chart, ImageSource};
use crate::error::{Result, TopsterError};
use crate::layout::{self, CanvasInfo, DEFAULT_CELL_SIZE};
use crate::loader::ImageLoader;
use crate::surface::{Color, DrawContext, DrawingSurface, TextAlign};

/// Knobs that are not part of the chart itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Side of one square cell in pixels.
    pub cell_size: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

/// Render a chart whose covers are all decoded.
///
/// A background image that is still a reference counts as "not loaded" and
/// is skipped.
pub fn render_chart<S>(surface: &mut S, chart: &Chart, options: &RenderOptions) -> Result<CanvasInfo>
where
    S: DrawingSurface + ?Sized,
{
    let info = setup(surface, chart, options)?;
    let ctx = context(surface)?;

    let background = match &chart.background {
        Background::Image(source) => source.decoded().cloned(),
        Background::Color(_) => None,
    };
    draw_background(ctx, &chart.background, background.as_deref(), &info);
    draw_title(ctx, chart, &info);

    let mut drawn = 0usize;
    for (index, item) in layout::items_in_scope(chart) {
        let image = item
            .cover
            .decoded()
            .ok_or_else(|| TopsterError::UnresolvedImage(item.cover.describe()))?;
        draw_cover(ctx, image, index, chart, &info);
        drawn += 1;
    }

    if chart.show_titles {
        insert_titles(ctx, chart, &info);
    }

    tracing::debug!(covers = drawn, width = info.width, height = info.height, "rendered chart");
    Ok(info)
}

/// Render a chart, loading referenced images through `loader`.
///
/// Each cover is loaded and drawn before the next load starts. A background
/// reference is loaded up front; if that fails the background stays blank.
pub async fn render_chart_async<S, L>(
    surface: &mut S,
    chart: &Chart,
    options: &RenderOptions,
    loader: &L,
) -> Result<CanvasInfo>
where
    S: DrawingSurface + Send + ?Sized,
    L: ImageLoader + ?Sized,
{
    let background = match &chart.background {
        Background::Image(ImageSource::Decoded(image)) => Some(image.clone()),
        Background::Image(ImageSource::Reference(source)) => match loader.load(source).await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "background image unavailable, leaving it blank");
                None
            }
        },
        Background::Color(_) => None,
    };

    let info = setup(surface, chart, options)?;
    {
        let ctx = context(surface)?;
        draw_background(ctx, &chart.background, background.as_deref(), &info);
        draw_title(ctx, chart, &info);
    }

    let mut drawn = 0usize;
    for (index, item) in layout::items_in_scope(chart) {
        let image: Arc<DynamicImage> = match &item.cover {
            ImageSource::Decoded(image) => image.clone(),
            ImageSource::Reference(source) => loader.load(source).await?,
        };
        let ctx = context(surface)?;
        draw_cover(ctx, &image, index, chart, &info);
        drawn += 1;
    }

    if chart.show_titles {
        let ctx = context(surface)?;
        insert_titles(ctx, chart, &info);
    }

    tracing::debug!(covers = drawn, width = info.width, height = info.height, "rendered chart");
    Ok(info)
}

fn context<S: DrawingSurface + ?Sized>(surface: &mut S) -> Result<&mut dyn DrawContext> {
    surface.context_2d().ok_or(TopsterError::MissingContext)
}

/// Sizing step: measure, compute the layout, resize the surface.
fn setup<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    chart: &Chart,
    options: &RenderOptions,
) -> Result<CanvasInfo> {
    let info = {
        let ctx = context(surface)?;
        layout::compute_canvas_info(chart, options.cell_size, &*ctx)
    };
    surface.resize(info.width, info.height);
    Ok(info)
}

fn draw_background(
    ctx: &mut dyn DrawContext,
    background: &Background,
    loaded: Option<&DynamicImage>,
    info: &CanvasInfo,
) {
    match background {
        Background::Color(value) => {
            ctx.set_fill_style(style::resolve_background_color(value));
            ctx.fill_rect(0.0, 0.0, info.width as f32, info.height as f32);
        }
        Background::Image(source) => {
            let Some(image) = loaded else {
                tracing::debug!(source = %source.describe(), "background image not loaded, skipping");
                return;
            };
            let Some(placement) =
                layout::compute_background_cover(image.width(), image.height(), info.width, info.height)
            else {
                return;
            };
            ctx.draw_image(image, placement.x, placement.y, placement.width, placement.height);
        }
    }
}

fn draw_title(ctx: &mut dyn DrawContext, chart: &Chart, info: &CanvasInfo) {
    if chart.title.is_empty() {
        return;
    }

    ctx.set_font(&layout::chart_title_font(chart));
    ctx.set_fill_style(style::resolve_text_color(chart));
    ctx.set_text_align(TextAlign::Center);
    ctx.set_line_width(style::CHART_TITLE_LINE_WIDTH);
    ctx.set_stroke_style(Color::BLACK);
    ctx.set_shadow(style::text_shadow(chart));

    let (x, y) = layout::chart_title_anchor(chart, info);
    ctx.fill_text(&chart.title, x, y);
    ctx.stroke_text(&chart.title, x, y);

    ctx.set_shadow(None);
}

fn draw_cover(ctx: &mut dyn DrawContext, image: &DynamicImage, index: usize, chart: &Chart, info: &CanvasInfo) {
    let placement = layout::compute_cover_placement(index, image.width(), image.height(), chart, info);
    tracing::trace!(
        index,
        x = placement.x,
        y = placement.y,
        width = placement.width,
        height = placement.height,
        "draw cover"
    );
    ctx.draw_image(
        image,
        placement.x as i32,
        placement.y as i32,
        placement.width,
        placement.height,
    );
}

/// Title pass: one flowing list down the sidebar, outline first.
fn insert_titles(ctx: &mut dyn DrawContext, chart: &Chart, info: &CanvasInfo) {
    ctx.set_font(&layout::item_title_font(chart));
    ctx.set_text_align(TextAlign::Left);
    ctx.set_line_width(style::ITEM_TITLE_LINE_WIDTH);
    ctx.set_stroke_style(Color::BLACK);
    ctx.set_fill_style(style::resolve_text_color(chart));
    ctx.set_shadow(style::text_shadow(chart));

    let x = info.title_x() as f32;
    for (index, y) in layout::compute_title_baselines(chart, info.chart_title_margin) {
        let Some(title) = info.titles.get(&index) else {
            continue;
        };
        ctx.stroke_text(title, x, y as f32);
        ctx.fill_text(title, x, y as f32);
    }

    ctx.set_shadow(None);
}
