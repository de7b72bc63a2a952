use proptest::prelude::*;
use topster::chart::{Chart, ChartItem, ChartSize};
use topster::layout::{
    self, compute_canvas_info, compute_cell_origin, compute_centering_offset, compute_image_fit,
};
use topster::surface::RecordingSurface;

fn chart_with(columns: u32, rows: u32, gap: u32, slots: &[bool], show_titles: bool) -> Chart {
    Chart {
        size: ChartSize::new(columns, rows),
        gap,
        show_titles,
        items: slots
            .iter()
            .enumerate()
            .map(|(i, filled)| filled.then(|| ChartItem::new(format!("Album {}", i), "cover.png")))
            .collect(),
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn image_fit_stays_inside_cell_and_keeps_aspect(
        width in 1u32..4_000,
        height in 1u32..4_000,
        cell in 16u32..600
    ) {
        let fit = compute_image_fit(width, height, cell);

        prop_assert!(fit.width <= cell);
        prop_assert!(fit.height <= cell);

        // One scale factor on both axes, floored: aspect drifts by at most a pixel.
        let expected_height = fit.width as f64 * height as f64 / width as f64;
        prop_assert!((fit.height as f64 - expected_height).abs() <= 1.0 + height as f64 / width as f64);
    }

    #[test]
    fn centered_cover_stays_inside_cell(scaled in 0u32..600, cell in 1u32..600) {
        let offset = compute_centering_offset(scaled, cell);
        if scaled < cell {
            prop_assert!(offset + scaled <= cell);
            prop_assert!(cell - (offset + scaled) - offset <= 1);
        } else {
            prop_assert_eq!(offset, 0);
        }
    }

    #[test]
    fn cell_origins_are_strictly_increasing(
        column in 0u32..50,
        row in 0u32..50,
        cell in 1u32..500,
        gap in 0u32..50,
        margin in prop::sample::select(vec![0u32, 60])
    ) {
        let origin = compute_cell_origin(column, row, cell, gap, margin);
        let right = compute_cell_origin(column + 1, row, cell, gap, margin);
        let below = compute_cell_origin(column, row + 1, cell, gap, margin);

        prop_assert_eq!(right.x - origin.x, cell + gap);
        prop_assert_eq!(right.y, origin.y);
        prop_assert_eq!(below.y - origin.y, cell + gap);
        prop_assert_eq!(below.x, origin.x);
    }

    #[test]
    fn canvas_info_is_deterministic(
        columns in 1u32..8,
        rows in 1u32..8,
        gap in 0u32..40,
        slots in prop::collection::vec(any::<bool>(), 0..80),
        show_titles in any::<bool>()
    ) {
        let chart = chart_with(columns, rows, gap, &slots, show_titles);
        let measurer = RecordingSurface::new();

        let first = compute_canvas_info(&chart, 260, &measurer);
        let second = compute_canvas_info(&chart, 260, &measurer);
        prop_assert_eq!(&first, &second);

        if show_titles {
            // Exactly the populated slots inside the grid
            let expected: Vec<usize> = slots
                .iter()
                .take(chart.size.capacity())
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(|(index, _)| index)
                .collect();
            let keys: Vec<usize> = first.titles.keys().copied().collect();
            prop_assert_eq!(keys, expected);
        } else {
            prop_assert!(first.titles.is_empty());
            prop_assert_eq!(first.max_item_title_width, 0);
        }
    }

    #[test]
    fn canvas_grows_with_grid_and_gap(
        columns in 1u32..8,
        rows in 1u32..8,
        gap in 0u32..40,
        slots in prop::collection::vec(any::<bool>(), 0..40),
        show_titles in any::<bool>()
    ) {
        let measurer = RecordingSurface::new();
        let base = compute_canvas_info(&chart_with(columns, rows, gap, &slots, show_titles), 100, &measurer);
        let wider = compute_canvas_info(&chart_with(columns + 1, rows, gap, &slots, show_titles), 100, &measurer);
        let taller = compute_canvas_info(&chart_with(columns, rows + 1, gap, &slots, show_titles), 100, &measurer);
        let looser = compute_canvas_info(&chart_with(columns, rows, gap + 1, &slots, show_titles), 100, &measurer);

        prop_assert!(wider.width > base.width);
        // A long title list can already be taller than the extra row.
        prop_assert!(taller.height >= base.height);
        if !show_titles {
            prop_assert!(taller.height > base.height);
        }
        prop_assert!(looser.width > base.width);
        prop_assert!(looser.height >= base.height);
    }

    #[test]
    fn title_baselines_increase_down_the_sidebar(
        columns in 1u32..6,
        rows in 1u32..6,
        slots in prop::collection::vec(any::<bool>(), 0..40)
    ) {
        let chart = chart_with(columns, rows, 10, &slots, true);
        let baselines = layout::compute_title_baselines(&chart, layout::chart_title_margin(&chart));
        let info = compute_canvas_info(&chart, 260, &RecordingSurface::new());

        prop_assert_eq!(baselines.len(), info.titles.len());
        for pair in baselines.windows(2) {
            prop_assert!(pair[1].1 >= pair[0].1 + layout::TITLE_LINE_HEIGHT);
        }
        if let Some(&(_, last)) = baselines.last() {
            prop_assert!(last <= info.height);
        }
    }
}
