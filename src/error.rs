//! # Error Types
//!
//! This module defines error types used throughout the topster library.
//!
//! Only two conditions abort a render: a surface that cannot hand out a
//! drawing context, and a cover image that cannot be acquired. Everything
//! else (bad text colour, missing creator, background not loaded) degrades
//! to a visual default inside the render sequencer.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, TopsterError>;

/// Main error type for topster operations
#[derive(Debug, Error)]
pub enum TopsterError {
    /// The drawing surface could not produce a 2D context
    #[error("Rendering context not found")]
    MissingContext,

    /// A cover (or background) image failed to load
    #[error("Failed to load image {source_ref}: {message}")]
    ImageLoad { source_ref: String, message: String },

    /// A cover was referenced by URL/path in a render that cannot fetch images
    #[error("Image not loaded: {0}")]
    UnresolvedImage(String),

    /// Font registration or lookup error
    #[error("Font error: {0}")]
    Font(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Chart or layout JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TopsterError {
    pub(crate) fn image_load(source_ref: &str, message: impl Into<String>) -> Self {
        Self::ImageLoad {
            source_ref: source_ref.to_string(),
            message: message.into(),
        }
    }
}
