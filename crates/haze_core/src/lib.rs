//! Haze Core
//!
//! Frosted-glass ("haze") effect construction for rectangular regions of a
//! rendered layer.
//!
//! # Features
//!
//! - **Regions**: Rounded rectangles with four independent corner radii
//! - **Blur**: Gaussian blur kernel derived from a radius and display density
//! - **Noise**: Shared fractal noise field that adds a subtle grain
//! - **Region Filters**: Per-region uniforms for the WGSL region program
//! - **Compositing**: Zero, one or many region filters merged into one effect
//! - **CPU Reference**: Every effect can be evaluated on a [`Pixmap`]
//!
//! # Example
//!
//! ```rust
//! use haze_core::{build_effect, Color, HazeParams, Rect, RoundedRect};
//!
//! let params = HazeParams::new(Color::WHITE)
//!     .with_regions([
//!         RoundedRect::new(Rect::new(0.0, 0.0, 200.0, 48.0), 12.0),
//!         RoundedRect::new(Rect::new(0.0, 600.0, 200.0, 648.0), 12.0),
//!     ])
//!     .with_blur_radius(20.0)
//!     .with_density(2.0);
//!
//! let effect = build_effect(&params).unwrap();
//! assert_eq!(effect.len(), 2);
//! ```

pub mod blur;
pub mod color;
pub mod composite;
pub mod error;
pub mod geometry;
pub mod node;
pub mod noise;
pub mod pixmap;
pub mod region;
pub mod shader;

pub use blur::{
    compute_gaussian_kernel, convert_radius_to_sigma, BlurFilter, Dp, EdgeMode, MAX_BLUR_SIGMA,
};
pub use color::Color;
pub use composite::{compose, CompositeEffect, MergedEffect};
pub use error::{HazeError, Result, ShaderError};
pub use geometry::{box_sdf, Rect, RoundedRect, Vec2};
pub use node::{
    build_effect, build_effect_or_empty, HazeNode, HazeParams, DEFAULT_BLUR_RADIUS,
    DEFAULT_TINT_ALPHA,
};
pub use noise::NoiseField;
pub use pixmap::Pixmap;
pub use region::{RegionFilter, RegionUniforms};
pub use shader::{RegionProgram, REGION_SHADER};
