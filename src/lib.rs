//! # Topster - Cover-Art Chart Renderer
//!
//! Topster lays out a grid of album (or book, film, game...) covers with an
//! optional chart title, a title list in a sidebar, and a colour or image
//! background, then draws it onto a 2D surface.
//!
//! - **Layout engine**: pure, deterministic geometry ([`layout`])
//! - **Render sequencer**: fixed draw order against any surface ([`render`])
//! - **Surfaces**: headless raster canvas and a draw-call recorder ([`surface`])
//! - **Loading**: async cover fetching over HTTP or from disk ([`loader`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use topster::{
//!     chart::{Chart, ChartItem, ChartSize},
//!     loader::HttpImageLoader,
//!     render::{render_chart_async, RenderOptions},
//!     surface::RasterSurface,
//! };
//!
//! # async fn example() -> Result<(), topster::TopsterError> {
//! let chart = Chart {
//!     title: "Favourites".to_string(),
//!     size: ChartSize::new(3, 3),
//!     items: vec![
//!         Some(ChartItem::new("Album One", "https://example.com/one.jpg").with_creator("Artist A")),
//!         None,
//!         Some(ChartItem::new("X", "covers/x.png").with_creator("B")),
//!     ],
//!     show_titles: true,
//!     ..Default::default()
//! };
//!
//! let loader = HttpImageLoader::with_default_client()?;
//! let mut surface = RasterSurface::new(0, 0);
//! render_chart_async(&mut surface, &chart, &RenderOptions::default(), &loader).await?;
//! surface.save("chart.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`chart`] | Chart data model (JSON-deserializable) |
//! | [`layout`] | Canvas geometry |
//! | [`render`] | Render sequencer |
//! | [`surface`] | Drawing surface traits and implementations |
//! | [`fonts`] | Explicit TTF font registration |
//! | [`loader`] | Image loading |
//! | [`server`] | HTTP entry point |
//! | [`error`] | Error types |

pub mod chart;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod loader;
pub mod render;
pub mod server;
pub mod surface;
pub mod telemetry;

// Re-exports for convenience
pub use chart::{Background, Chart, ChartItem, ChartSize, ImageSource};
pub use error::TopsterError;
pub use layout::CanvasInfo;
pub use render::{RenderOptions, render_chart, render_chart_async};
