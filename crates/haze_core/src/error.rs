//! Error types for haze_core

use thiserror::Error;

use crate::geometry::Rect;

/// Errors that can occur while building a haze effect
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HazeError {
    /// A region with zero or negative width or height reached the region builder
    #[error("cannot build a region filter for empty rect {0:?}")]
    EmptyRegion(Rect),

    /// Blur radius is negative, NaN or infinite
    #[error("invalid blur radius: {0}")]
    InvalidBlurRadius(f32),

    /// Pixel density is not a positive finite number
    #[error("invalid pixel density: {0}")]
    InvalidDensity(f32),
}

/// Errors produced while compiling the region shader program
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// WGSL front end rejected the source
    #[error("WGSL parse error: {0}")]
    Parse(String),

    /// Module failed naga validation
    #[error("shader validation failed: {0}")]
    Validation(String),

    /// Module does not expose the expected bindings or uniform layout
    #[error("shader interface mismatch: {0}")]
    Interface(String),
}

/// Result type for haze_core operations
pub type Result<T> = std::result::Result<T, HazeError>;
