//! Chart data model.
//!
//! The same types serve Rust callers building a chart in code and JSON
//! payloads coming from the CLI or the HTTP server. Image slots accept either
//! an already decoded image or a reference (URL or file path) that an
//! [`ImageLoader`](crate::loader::ImageLoader) resolves at render time.

use image::DynamicImage;
use serde::Deserialize;
use std::sync::Arc;

fn default_gap() -> u32 {
    10
}

/// Where the pixels for a cover or background come from.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "String")]
pub enum ImageSource {
    /// Decoded and ready to draw.
    Decoded(Arc<DynamicImage>),
    /// URL or path that still has to be fetched.
    Reference(String),
}

impl ImageSource {
    /// The decoded image, if this source has already been loaded.
    pub fn decoded(&self) -> Option<&Arc<DynamicImage>> {
        match self {
            ImageSource::Decoded(image) => Some(image),
            ImageSource::Reference(_) => None,
        }
    }

    /// Short description used in logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Decoded(image) => format!("<decoded {}x{}>", image.width(), image.height()),
            ImageSource::Reference(reference) => reference.clone(),
        }
    }
}

impl From<String> for ImageSource {
    fn from(reference: String) -> Self {
        ImageSource::Reference(reference)
    }
}

impl From<&str> for ImageSource {
    fn from(reference: &str) -> Self {
        ImageSource::Reference(reference.to_string())
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        ImageSource::Decoded(Arc::new(image))
    }
}

impl From<Arc<DynamicImage>> for ImageSource {
    fn from(image: Arc<DynamicImage>) -> Self {
        ImageSource::Decoded(image)
    }
}

/// One populated cell of the grid.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartItem {
    pub title: String,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(alias = "cover_url")]
    pub cover: ImageSource,
}

impl ChartItem {
    pub fn new(title: impl Into<String>, cover: impl Into<ImageSource>) -> Self {
        Self {
            title: title.into(),
            creator: None,
            cover: cover.into(),
        }
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// `"{creator} - {title}"`, or just the title when there is no creator.
    pub fn label(&self) -> String {
        match self.creator.as_deref() {
            Some(creator) if !creator.is_empty() => format!("{} - {}", creator, self.title),
            _ => self.title.clone(),
        }
    }
}

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChartSize {
    #[serde(alias = "x")]
    pub columns: u32,
    #[serde(alias = "y")]
    pub rows: u32,
}

impl ChartSize {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of cells; items at or beyond this index are never laid out.
    pub fn capacity(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

impl Default for ChartSize {
    fn default() -> Self {
        Self::new(5, 5)
    }
}

/// Canvas background: a flat colour or an image scaled to cover the canvas.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Background {
    Color(String),
    Image(ImageSource),
}

impl Default for Background {
    fn default() -> Self {
        Background::Color("#000000".to_string())
    }
}

/// Root aggregate handed to the render sequencer.
#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    /// Empty string means no title and no title margin.
    #[serde(default)]
    pub title: String,
    /// Reading order: left to right, top to bottom. `None` is an empty cell.
    #[serde(default)]
    pub items: Vec<Option<ChartItem>>,
    #[serde(default)]
    pub size: ChartSize,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub show_titles: bool,
    #[serde(default)]
    pub show_numbers: bool,
    #[serde(default = "default_gap")]
    pub gap: u32,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub shadows: Option<bool>,
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            title: String::new(),
            items: Vec::new(),
            size: ChartSize::default(),
            background: Background::default(),
            show_titles: false,
            show_numbers: false,
            gap: default_gap(),
            font: None,
            text_color: None,
            shadows: None,
        }
    }
}

impl Chart {
    /// Font family used for every piece of text on the chart.
    pub fn font_family(&self) -> &str {
        match self.font.as_deref() {
            Some(font) if !font.is_empty() => font,
            _ => "monospace",
        }
    }

    /// Shadows are on unless explicitly disabled.
    pub fn shadows_enabled(&self) -> bool {
        self.shadows != Some(false)
    }
}
