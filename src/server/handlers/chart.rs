//! Chart preview and layout handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::chart::Chart;
use crate::error::TopsterError;
use crate::layout::{self, CanvasInfo};
use crate::render::{RenderOptions, render_chart_async};
use crate::surface::RasterSurface;

use super::super::state::AppState;

/// Largest accepted column or row count.
pub const MAX_GRID_SIDE: u32 = 50;
/// Largest accepted cell size in pixels.
pub const MAX_CELL_SIZE: u32 = 1024;
/// Largest accepted gap in pixels.
pub const MAX_GAP: u32 = 256;
/// Largest canvas side the server will allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Query parameters shared by the chart endpoints.
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    /// Overrides the server's default cell size.
    #[serde(default)]
    pub cell_size: Option<u32>,
}

fn options(state: &AppState, query: &ChartQuery) -> RenderOptions {
    RenderOptions {
        cell_size: query.cell_size.unwrap_or(state.config.cell_size),
    }
}

fn bad_request(message: String) -> (StatusCode, String) {
    tracing::warn!(%message, "rejected chart");
    (StatusCode::BAD_REQUEST, message)
}

/// Reject charts the layout arithmetic or the canvas allocation cannot take,
/// then lay the chart out.
fn checked_layout(chart: &Chart, options: &RenderOptions) -> Result<CanvasInfo, (StatusCode, String)> {
    if chart.size.columns > MAX_GRID_SIDE || chart.size.rows > MAX_GRID_SIDE {
        return Err(bad_request(format!(
            "Grid {}x{} exceeds {}x{}",
            chart.size.columns, chart.size.rows, MAX_GRID_SIDE, MAX_GRID_SIDE
        )));
    }
    if options.cell_size > MAX_CELL_SIZE {
        return Err(bad_request(format!(
            "Cell size {} exceeds {}",
            options.cell_size, MAX_CELL_SIZE
        )));
    }
    if chart.gap > MAX_GAP {
        return Err(bad_request(format!("Gap {} exceeds {}", chart.gap, MAX_GAP)));
    }

    // The raster surface supplies the same text metrics a preview would use
    let measurer = RasterSurface::new(0, 0);
    let info = layout::compute_canvas_info(chart, options.cell_size, &measurer);
    if info.width > MAX_CANVAS_SIDE || info.height > MAX_CANVAS_SIDE {
        return Err(bad_request(format!(
            "Canvas {}x{} exceeds {}px per side",
            info.width, info.height, MAX_CANVAS_SIDE
        )));
    }

    Ok(info)
}

/// Map a render error to a response without echoing loader internals.
fn error_response(e: TopsterError) -> (StatusCode, String) {
    match e {
        TopsterError::ImageLoad { source_ref, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Failed to load image {}", source_ref),
        ),
        TopsterError::UnresolvedImage(source_ref) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Image not loaded: {}", source_ref),
        ),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// POST /api/chart/preview - render a chart as PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
    Json(chart): Json<Chart>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let options = options(&state, &query);
    checked_layout(&chart, &options)?;
    let mut surface = RasterSurface::new(0, 0);

    render_chart_async(&mut surface, &chart, &options, &state.loader)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "chart render failed");
            error_response(e)
        })?;

    // PNG encoding is CPU-bound; keep it off the async workers
    let png_bytes = tokio::task::spawn_blocking(move || surface.to_png())
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Task error: {}", e),
            )
        })?
        .map_err(error_response)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// POST /api/chart/layout - compute the canvas layout without drawing.
pub async fn layout(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
    Json(chart): Json<Chart>,
) -> Result<Json<CanvasInfo>, (StatusCode, String)> {
    let options = options(&state, &query);
    checked_layout(&chart, &options).map(Json)
}
