//! # Layout Engine
//!
//! Pure geometry for a chart: canvas size, cell origins, cover fit and
//! centering, title sidebar width, and the flowing title list. Nothing here
//! draws or performs I/O; given the same chart and text metrics every
//! function returns the same numbers.
//!
//! ## Canvas anatomy
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────────┐
//! │                chart title (60px)            │                  │
//! ├─gap─┬──────┬─gap─┬──────┬─gap─ ...           │  1. A - Album    │
//! │     │ cell │     │ cell │                    │  2. B - X        │
//! │     │260x260     │      │                    │                  │
//! ├─gap─┴──────┴─────┴──────┴─── ...             │  3. ...          │
//! │                                              │                  │
//! └──────────────────────────────────────────────┴──────────────────┘
//!            columns * (cell + gap) + gap          longest title + 20 + gap
//! ```
//!
//! Grid index `i` always maps to `(i % columns, i / columns)`. Items at or
//! beyond `columns * rows` are ignored everywhere.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::chart::{Chart, ChartItem};
use crate::surface::{FontSpec, TextMeasurer};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Side of one square cell, in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 260;
/// Vertical space reserved above the grid when the chart has a title.
pub const CHART_TITLE_MARGIN: u32 = 60;
/// Height of one line in the title list; also the extra gap between rows.
pub const TITLE_LINE_HEIGHT: u32 = 25;
/// Added to the longest title so text never touches the canvas edge.
pub const TITLE_SIDEBAR_MARGIN: u32 = 20;
/// Inset of the title text from the left edge of the sidebar.
pub const TITLE_SIDEBAR_PADDING: u32 = 10;

pub const ITEM_TITLE_FONT_PT: f32 = 16.0;
pub const CHART_TITLE_FONT_PT: f32 = 38.0;

/// Font used for the title list.
pub fn item_title_font(chart: &Chart) -> FontSpec {
    FontSpec::new(ITEM_TITLE_FONT_PT, chart.font_family())
}

/// Font used for the chart title.
pub fn chart_title_font(chart: &Chart) -> FontSpec {
    FontSpec::new(CHART_TITLE_FONT_PT, chart.font_family())
}

// ============================================================================
// COVER GEOMETRY
// ============================================================================

/// Scaled cover size inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageFit {
    pub width: u32,
    pub height: u32,
}

/// Scale a cover into a `cell_size` square, keeping its aspect ratio.
///
/// One factor is chosen and applied to both axes, then each axis is floored:
///
/// | natural size                  | factor                          |
/// |-------------------------------|---------------------------------|
/// | both sides > cell             | `min(cell/w, cell/h)`           |
/// | only width > cell             | `cell/w`                        |
/// | only height > cell            | `cell/h`                        |
/// | both sides < cell             | `min(cell/w, cell/h)` (upscale) |
/// | anything else (a side = cell) | `1`                             |
pub fn compute_image_fit(natural_width: u32, natural_height: u32, cell_size: u32) -> ImageFit {
    let w = natural_width as f64;
    let h = natural_height as f64;
    let cell = cell_size as f64;

    let factor = if natural_width > cell_size && natural_height > cell_size {
        (cell / w).min(cell / h)
    } else if natural_width > cell_size {
        cell / w
    } else if natural_height > cell_size {
        cell / h
    } else if natural_width < cell_size && natural_height < cell_size {
        (cell / w).min(cell / h)
    } else {
        1.0
    };

    ImageFit {
        width: (w * factor).floor() as u32,
        height: (h * factor).floor() as u32,
    }
}

/// Margin that centers a scaled dimension inside its cell.
pub fn compute_centering_offset(scaled: u32, cell_size: u32) -> u32 {
    if scaled < cell_size {
        (cell_size - scaled) / 2
    } else {
        0
    }
}

/// Top-left pixel of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellOrigin {
    pub x: u32,
    pub y: u32,
}

pub fn compute_cell_origin(
    column: u32,
    row: u32,
    cell_size: u32,
    gap: u32,
    chart_title_margin: u32,
) -> CellOrigin {
    CellOrigin {
        x: column * (cell_size + gap) + gap,
        y: row * (cell_size + gap) + gap + chart_title_margin,
    }
}

/// `(column, row)` of a grid index.
pub fn grid_position(index: usize, columns: u32) -> (u32, u32) {
    let columns = columns as usize;
    ((index % columns) as u32, (index / columns) as u32)
}

/// Where and how large a cover is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverPlacement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Full placement of a cover at grid `index`: cell origin plus centering.
pub fn compute_cover_placement(
    index: usize,
    natural_width: u32,
    natural_height: u32,
    chart: &Chart,
    info: &CanvasInfo,
) -> CoverPlacement {
    let (column, row) = grid_position(index, chart.size.columns);
    let fit = compute_image_fit(natural_width, natural_height, info.cell_size);
    let origin = compute_cell_origin(column, row, info.cell_size, chart.gap, info.chart_title_margin);

    CoverPlacement {
        x: origin.x + compute_centering_offset(fit.width, info.cell_size),
        y: origin.y + compute_centering_offset(fit.height, info.cell_size),
        width: fit.width,
        height: fit.height,
    }
}

// ============================================================================
// BACKGROUND
// ============================================================================

/// Placement of a background image scaled to cover the whole canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackgroundPlacement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Scale an image to cover a canvas without distortion, centering the
/// overflowing axis. Returns `None` when either size is empty.
pub fn compute_background_cover(
    image_width: u32,
    image_height: u32,
    canvas_width: u32,
    canvas_height: u32,
) -> Option<BackgroundPlacement> {
    if image_width == 0 || image_height == 0 || canvas_width == 0 || canvas_height == 0 {
        return None;
    }

    let image_ratio = image_height as f64 / image_width as f64;
    let canvas_ratio = canvas_height as f64 / canvas_width as f64;
    let cw = canvas_width as f64;
    let ch = canvas_height as f64;

    let placement = if image_ratio > canvas_ratio {
        let height = cw * image_ratio;
        BackgroundPlacement {
            x: 0,
            y: ((ch - height) / 2.0).floor() as i32,
            width: canvas_width,
            height: height.ceil() as u32,
        }
    } else {
        let width = cw * canvas_ratio / image_ratio;
        BackgroundPlacement {
            x: ((cw - width) / 2.0).floor() as i32,
            y: 0,
            width: width.ceil() as u32,
            height: canvas_height,
        }
    };

    Some(placement)
}

// ============================================================================
// TITLES
// ============================================================================

/// Non-empty slots within grid capacity, with their grid index.
pub fn items_in_scope(chart: &Chart) -> impl Iterator<Item = (usize, &ChartItem)> {
    chart
        .items
        .iter()
        .take(chart.size.capacity())
        .enumerate()
        .filter_map(|(index, slot)| slot.as_ref().map(|item| (index, item)))
}

/// Display string for every in-scope item, keyed by grid index.
///
/// With `show_numbers`, each label is prefixed by its 1-based rank among
/// populated cells (empty cells do not consume a number).
pub fn build_titles(chart: &Chart) -> BTreeMap<usize, String> {
    items_in_scope(chart)
        .enumerate()
        .map(|(rank, (index, item))| {
            let label = item.label();
            let title = if chart.show_numbers {
                format!("{}. {}", rank + 1, label)
            } else {
                label
            };
            (index, title)
        })
        .collect()
}

fn widest_title<M: TextMeasurer + ?Sized>(
    chart: &Chart,
    titles: &BTreeMap<usize, String>,
    measurer: &M,
) -> u32 {
    let font = item_title_font(chart);
    let widest = titles
        .values()
        .map(|title| measurer.measure_text(title, &font))
        .fold(0.0f32, f32::max);

    widest.ceil() as u32 + TITLE_SIDEBAR_MARGIN + chart.gap
}

/// Width of the title sidebar: the longest measured title plus margins.
/// Zero when titles are hidden.
///
/// The measured width is rounded up to a whole pixel before the margins are
/// added, so the result is `ceil(widest) + TITLE_SIDEBAR_MARGIN + gap`. With a
/// measurer that returns whole pixels (the bitmap font) this is exactly
/// `widest + 20 + gap`; fractional TTF advances gain at most one pixel.
pub fn compute_max_title_width<M: TextMeasurer + ?Sized>(chart: &Chart, measurer: &M) -> u32 {
    if !chart.show_titles {
        return 0;
    }
    widest_title(chart, &build_titles(chart), measurer)
}

/// Height the title list needs so its last line is not clipped.
pub fn compute_minimum_canvas_height(chart: &Chart, title_margin: u32) -> u32 {
    let columns = chart.size.columns as usize;
    let mut height = chart.gap * 2 + title_margin;

    for (index, slot) in chart.items.iter().take(chart.size.capacity()).enumerate() {
        if slot.is_some() {
            height += TITLE_LINE_HEIGHT;
            if index % columns == 0 && index != 0 {
                height += TITLE_LINE_HEIGHT;
            }
        }
    }

    height
}

/// Baseline of each title in the flowing list, as `(grid index, y)`.
///
/// The list does not line up with cells. It advances one line per title and
/// one extra line whenever a new grid row starts, empty cells included.
pub fn compute_title_baselines(chart: &Chart, chart_title_margin: u32) -> Vec<(usize, u32)> {
    let columns = chart.size.columns as usize;
    let mut current = chart_title_margin + chart.gap;
    let mut baselines = Vec::new();

    for (index, slot) in chart.items.iter().take(chart.size.capacity()).enumerate() {
        if index % columns == 0 && index != 0 {
            current += TITLE_LINE_HEIGHT;
        }
        if slot.is_none() {
            continue;
        }
        current += TITLE_LINE_HEIGHT;
        baselines.push((index, current));
    }

    baselines
}

// ============================================================================
// CANVAS
// ============================================================================

/// Chart-title reservation: 0 without a title, else [`CHART_TITLE_MARGIN`].
pub fn chart_title_margin(chart: &Chart) -> u32 {
    if chart.title.is_empty() {
        0
    } else {
        CHART_TITLE_MARGIN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

pub fn compute_canvas_size(
    chart: &Chart,
    cell_size: u32,
    max_title_width: u32,
    chart_title_margin: u32,
) -> CanvasSize {
    let gap = chart.gap;
    let width = chart.size.columns * (cell_size + gap) + gap + max_title_width;
    let grid_height = chart.size.rows * (cell_size + gap) + gap + chart_title_margin;

    let height = if chart.show_titles {
        grid_height.max(compute_minimum_canvas_height(chart, chart_title_margin))
    } else {
        grid_height
    };

    CanvasSize { width, height }
}

/// Everything the render sequencer needs to know about the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasInfo {
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
    pub chart_title_margin: u32,
    pub max_item_title_width: u32,
    /// Title per grid index; empty unless `show_titles`.
    pub titles: BTreeMap<usize, String>,
}

impl CanvasInfo {
    /// Left edge of the title text inside the sidebar.
    pub fn title_x(&self) -> u32 {
        self.width - self.max_item_title_width + TITLE_SIDEBAR_PADDING
    }
}

/// Compute the full canvas geometry for one render.
pub fn compute_canvas_info<M: TextMeasurer + ?Sized>(
    chart: &Chart,
    cell_size: u32,
    measurer: &M,
) -> CanvasInfo {
    let (titles, max_item_title_width) = if chart.show_titles {
        let titles = build_titles(chart);
        let width = widest_title(chart, &titles, measurer);
        (titles, width)
    } else {
        (BTreeMap::new(), 0)
    };

    let margin = chart_title_margin(chart);
    let size = compute_canvas_size(chart, cell_size, max_item_title_width, margin);

    tracing::debug!(
        width = size.width,
        height = size.height,
        cell_size,
        titles = titles.len(),
        sidebar = max_item_title_width,
        "computed canvas layout"
    );

    CanvasInfo {
        width: size.width,
        height: size.height,
        cell_size,
        chart_title_margin: margin,
        max_item_title_width,
        titles,
    }
}

/// Anchor for the centered chart title: `(width / 2, (gap + 90) / 2)`.
pub fn chart_title_anchor(chart: &Chart, info: &CanvasInfo) -> (f32, f32) {
    (info.width as f32 / 2.0, (chart.gap + 90) as f32 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartItem, ChartSize};
    use crate::surface::RecordingSurface;

    fn item(title: &str) -> Option<ChartItem> {
        Some(ChartItem::new(title, "cover.png"))
    }

    fn chart(columns: u32, rows: u32, items: Vec<Option<ChartItem>>) -> Chart {
        Chart {
            size: ChartSize::new(columns, rows),
            items,
            ..Default::default()
        }
    }

    // ========================================================================
    // compute_image_fit
    // ========================================================================

    #[test]
    fn test_fit_both_larger_uses_smaller_factor() {
        assert_eq!(compute_image_fit(520, 1040, 260), ImageFit { width: 130, height: 260 });
        assert_eq!(compute_image_fit(1040, 520, 260), ImageFit { width: 260, height: 130 });
    }

    #[test]
    fn test_fit_only_width_larger() {
        assert_eq!(compute_image_fit(520, 100, 260), ImageFit { width: 260, height: 50 });
    }

    #[test]
    fn test_fit_only_height_larger() {
        assert_eq!(compute_image_fit(100, 520, 260), ImageFit { width: 50, height: 260 });
    }

    #[test]
    fn test_fit_both_smaller_scales_up() {
        assert_eq!(compute_image_fit(100, 50, 260), ImageFit { width: 260, height: 130 });
        assert_eq!(compute_image_fit(130, 130, 260), ImageFit { width: 260, height: 260 });
    }

    #[test]
    fn test_fit_one_side_equal_is_unscaled() {
        assert_eq!(compute_image_fit(260, 100, 260), ImageFit { width: 260, height: 100 });
        assert_eq!(compute_image_fit(100, 260, 260), ImageFit { width: 100, height: 260 });
        assert_eq!(compute_image_fit(260, 260, 260), ImageFit { width: 260, height: 260 });
    }

    #[test]
    fn test_fit_floors_each_axis() {
        // 260/300 = 0.8666..: 300 → 260, 299 → 259.13.. → 259
        assert_eq!(compute_image_fit(300, 299, 260), ImageFit { width: 260, height: 259 });
    }

    // ========================================================================
    // offsets and origins
    // ========================================================================

    #[test]
    fn test_centering_offset() {
        assert_eq!(compute_centering_offset(130, 260), 65);
        assert_eq!(compute_centering_offset(259, 260), 0);
        assert_eq!(compute_centering_offset(257, 260), 1);
        assert_eq!(compute_centering_offset(260, 260), 0);
        assert_eq!(compute_centering_offset(300, 260), 0);
    }

    #[test]
    fn test_cell_origin() {
        assert_eq!(compute_cell_origin(0, 0, 260, 10, 0), CellOrigin { x: 10, y: 10 });
        assert_eq!(compute_cell_origin(2, 1, 260, 10, 60), CellOrigin { x: 550, y: 340 });
    }

    #[test]
    fn test_grid_position() {
        assert_eq!(grid_position(0, 3), (0, 0));
        assert_eq!(grid_position(4, 3), (1, 1));
        assert_eq!(grid_position(8, 3), (2, 2));
    }

    #[test]
    fn test_cover_placement_centers_wide_cover() {
        let chart = chart(2, 2, vec![item("a")]);
        let info = compute_canvas_info(&chart, 260, &RecordingSurface::new());
        let placement = compute_cover_placement(3, 1040, 520, &chart, &info);
        assert_eq!(
            placement,
            CoverPlacement { x: 280, y: 280 + 65, width: 260, height: 130 }
        );
    }

    // ========================================================================
    // background
    // ========================================================================

    #[test]
    fn test_background_taller_image_overflows_vertically() {
        let placement = compute_background_cover(100, 200, 500, 500).unwrap();
        assert_eq!(placement, BackgroundPlacement { x: 0, y: -250, width: 500, height: 1000 });
    }

    #[test]
    fn test_background_wider_image_overflows_horizontally() {
        let placement = compute_background_cover(200, 100, 500, 500).unwrap();
        assert_eq!(placement, BackgroundPlacement { x: -250, y: 0, width: 1000, height: 500 });
    }

    #[test]
    fn test_background_same_ratio_fills_exactly() {
        let placement = compute_background_cover(50, 50, 500, 500).unwrap();
        assert_eq!(placement, BackgroundPlacement { x: 0, y: 0, width: 500, height: 500 });
    }

    #[test]
    fn test_background_empty_image() {
        assert!(compute_background_cover(0, 10, 500, 500).is_none());
    }

    // ========================================================================
    // titles
    // ========================================================================

    #[test]
    fn test_build_titles_numbers_skip_empty_cells() {
        let mut c = chart(
            3,
            1,
            vec![
                Some(ChartItem::new("Album One", "a").with_creator("Artist A")),
                None,
                item("X"),
                item("beyond capacity"),
            ],
        );
        c.show_numbers = true;

        let titles = build_titles(&c);
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[&0], "1. Artist A - Album One");
        assert_eq!(titles[&2], "2. X");
        assert!(!titles.contains_key(&1));
        assert!(!titles.contains_key(&3));
    }

    #[test]
    fn test_max_title_width_hidden_titles() {
        let c = chart(2, 1, vec![item("Long title here")]);
        assert_eq!(compute_max_title_width(&c, &RecordingSurface::new()), 0);
    }

    #[test]
    fn test_max_title_width_no_items_still_has_margin() {
        let mut c = chart(2, 1, vec![]);
        c.show_titles = true;
        assert_eq!(compute_max_title_width(&c, &RecordingSurface::new()), 30);
    }

    #[test]
    fn test_max_title_width_rounds_fractional_measure_up() {
        let mut c = chart(2, 1, vec![item("abc"), item("de")]);
        c.show_titles = true;
        // Whole-pixel measure: exactly widest + 20 + gap
        assert_eq!(compute_max_title_width(&c, &RecordingSurface::with_advance(10.0)), 30 + 30);
        // 3 * 10.25 = 30.75 rounds up to 31
        assert_eq!(compute_max_title_width(&c, &RecordingSurface::with_advance(10.25)), 31 + 30);
    }

    #[test]
    fn test_minimum_height_counts_titles_and_row_breaks() {
        let mut c = chart(2, 2, vec![item("a"), item("b"), item("c"), None, item("ignored")]);
        c.gap = 10;
        // 20 + 3 titles * 25 + one row break (index 2) * 25
        assert_eq!(compute_minimum_canvas_height(&c, 0), 20 + 75 + 25);
        assert_eq!(compute_minimum_canvas_height(&c, 60), 180);
    }

    #[test]
    fn test_minimum_height_row_break_only_counted_for_populated_slot() {
        let c = chart(1, 3, vec![item("a"), None, item("c")]);
        // index 1 is empty: no title, no row increment; index 2 adds both
        assert_eq!(compute_minimum_canvas_height(&c, 0), 20 + 25 + 50);
    }

    #[test]
    fn test_title_baselines_flow_down_the_sidebar() {
        let c = chart(2, 2, vec![item("a"), None, item("c"), item("d")]);
        let baselines = compute_title_baselines(&c, 60);
        // start 70; a: 95; row break at 2 → 120, c: 145; d: 170
        assert_eq!(baselines, vec![(0, 95), (2, 145), (3, 170)]);
    }

    #[test]
    fn test_title_baselines_row_break_counts_empty_cells() {
        let c = chart(1, 3, vec![item("a"), None, item("c")]);
        // start 10; a: 35; break at 1 → 60 (empty); break at 2 → 85, c: 110
        assert_eq!(compute_title_baselines(&c, 0), vec![(0, 35), (2, 110)]);
    }

    // ========================================================================
    // canvas
    // ========================================================================

    #[test]
    fn test_canvas_size_grid_only() {
        let c = chart(3, 2, vec![]);
        assert_eq!(compute_canvas_size(&c, 260, 0, 0), CanvasSize { width: 820, height: 550 });
    }

    #[test]
    fn test_canvas_size_with_title_margin_and_sidebar() {
        let mut c = chart(3, 2, vec![]);
        c.title = "Chart".to_string();
        let margin = chart_title_margin(&c);
        assert_eq!(margin, 60);
        assert_eq!(compute_canvas_size(&c, 260, 200, margin), CanvasSize { width: 1020, height: 610 });
    }

    #[test]
    fn test_canvas_height_grows_for_long_title_list() {
        let items = (0..10).map(|i| item(&format!("t{}", i))).collect();
        let mut c = chart(10, 1, items);
        c.show_titles = true;
        c.gap = 0;
        // grid: 260; titles: 10 * 25 = 250 → grid wins
        assert_eq!(compute_canvas_size(&c, 260, 0, 0).height, 260);
        // with a tiny cell the title list wins
        assert_eq!(compute_canvas_size(&c, 20, 0, 0).height, 250);
    }

    #[test]
    fn test_canvas_info_is_deterministic() {
        let mut c = chart(2, 2, vec![item("a"), None, item("ccc")]);
        c.show_titles = true;
        c.title = "Best of".to_string();
        let measurer = RecordingSurface::new();

        let first = compute_canvas_info(&c, DEFAULT_CELL_SIZE, &measurer);
        let second = compute_canvas_info(&c, DEFAULT_CELL_SIZE, &measurer);
        assert_eq!(first, second);
        assert_eq!(first.max_item_title_width, 30 + 30);
        assert_eq!(first.width, 2 * 270 + 10 + 60);
        assert_eq!(first.title_x(), first.width - 60 + 10);
    }

    #[test]
    fn test_chart_title_anchor() {
        let mut c = chart(1, 1, vec![]);
        c.gap = 15;
        c.title = "t".to_string();
        let info = compute_canvas_info(&c, 260, &RecordingSurface::new());
        assert_eq!(chart_title_anchor(&c, &info), (info.width as f32 / 2.0, 52.5));
    }
}
