//! Blur kernel derivation and the shared blur filter handle
//!
//! A physical blur radius is converted to pixels with the display density,
//! then to a Gaussian standard deviation with a fixed relation:
//!
//! ```text
//! sigma = 0.57735 * radius_px + 0.5   (radius_px > 0)
//! sigma = 0                           (otherwise)
//! ```
//!
//! `0.57735` is `1 / sqrt(3)`, the conventional radius-to-sigma scale used by
//! 2D graphics libraries, and the half pixel keeps small radii visible.
//! The resulting filter is separable and treats content outside the source
//! as transparent (decal edges). Sigma is capped at [`MAX_BLUR_SIGMA`], which
//! bounds the kernel at `2 * ceil(3 * MAX_BLUR_SIGMA) + 1` taps.

use crate::pixmap::Pixmap;

/// Scale from blur radius in pixels to Gaussian sigma
pub const BLUR_SIGMA_SCALE: f32 = 0.57735;

/// Largest Gaussian sigma in pixels; larger blurs are clamped to it
pub const MAX_BLUR_SIGMA: f32 = 256.0;

/// A length in density-independent units
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Dp(pub f32);

impl Dp {
    /// Convert to physical pixels
    pub fn to_px(self, density: f32) -> f32 {
        self.0 * density
    }
}

impl From<f32> for Dp {
    fn from(value: f32) -> Self {
        Dp(value)
    }
}

/// How samples outside the source image are resolved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeMode {
    /// Outside samples are transparent
    #[default]
    Decal,
    /// Outside samples repeat the nearest edge pixel
    Clamp,
}

/// Convert a blur radius in pixels to a Gaussian standard deviation
pub fn convert_radius_to_sigma(radius_px: f32) -> f32 {
    if radius_px > 0.0 {
        BLUR_SIGMA_SCALE * radius_px + 0.5
    } else {
        0.0
    }
}

/// Separable Gaussian blur filter
///
/// Immutable once built. A build pass creates one and shares it between all
/// of its region filters through an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct BlurFilter {
    sigma_x: f32,
    sigma_y: f32,
    edge_mode: EdgeMode,
    kernel_x: Vec<f32>,
    kernel_y: Vec<f32>,
}

impl BlurFilter {
    /// Build the blur for a physical radius at the given density
    pub fn new(radius: Dp, density: f32) -> Self {
        let radius_px = radius.to_px(density);
        let sigma = convert_radius_to_sigma(radius_px);
        tracing::debug!(radius = radius.0, density, radius_px, sigma, "building blur filter");
        Self::from_sigma(sigma, sigma)
    }

    /// Build a blur directly from standard deviations
    ///
    /// Each sigma is clamped to `0..=MAX_BLUR_SIGMA`; NaN becomes zero.
    pub fn from_sigma(sigma_x: f32, sigma_y: f32) -> Self {
        let sigma_x = sanitize_sigma(sigma_x);
        let sigma_y = sanitize_sigma(sigma_y);
        Self {
            sigma_x,
            sigma_y,
            edge_mode: EdgeMode::Decal,
            kernel_x: compute_gaussian_kernel(sigma_x),
            kernel_y: compute_gaussian_kernel(sigma_y),
        }
    }

    /// Replace the edge mode (decal by default)
    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }

    /// Standard deviation pair (x, y)
    pub fn sigma(&self) -> (f32, f32) {
        (self.sigma_x, self.sigma_y)
    }

    pub fn edge_mode(&self) -> EdgeMode {
        self.edge_mode
    }

    /// Whether applying this filter leaves content unchanged
    pub fn is_identity(&self) -> bool {
        self.sigma_x == 0.0 && self.sigma_y == 0.0
    }

    /// Normalized horizontal weights, center tap in the middle
    pub fn kernel_x(&self) -> &[f32] {
        &self.kernel_x
    }

    /// Normalized vertical weights, center tap in the middle
    pub fn kernel_y(&self) -> &[f32] {
        &self.kernel_y
    }

    /// Blur a pixmap on the CPU
    pub fn apply(&self, src: &Pixmap) -> Pixmap {
        if self.is_identity() {
            return src.clone();
        }
        let horizontal = convolve(src, &self.kernel_x, self.edge_mode, Axis::X);
        convolve(&horizontal, &self.kernel_y, self.edge_mode, Axis::Y)
    }
}

impl Default for BlurFilter {
    fn default() -> Self {
        Self::from_sigma(0.0, 0.0)
    }
}

fn sanitize_sigma(sigma: f32) -> f32 {
    if sigma.is_nan() {
        0.0
    } else {
        sigma.clamp(0.0, MAX_BLUR_SIGMA)
    }
}

/// 1D Gaussian weights normalized to sum to one
///
/// Radius is `ceil(3 * sigma)` with sigma clamped to [`MAX_BLUR_SIGMA`]; a
/// zero or NaN sigma yields the single tap `[1.0]`.
pub fn compute_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let sigma = sanitize_sigma(sigma);
    if sigma == 0.0 {
        return vec![1.0];
    }

    let radius = (3.0 * sigma).ceil() as i32;
    let denominator = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| {
            let x = i as f32;
            (-(x * x) / denominator).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for weight in kernel.iter_mut() {
        *weight /= sum;
    }
    kernel
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn convolve(src: &Pixmap, kernel: &[f32], edge_mode: EdgeMode, axis: Axis) -> Pixmap {
    let radius = (kernel.len() / 2) as i64;
    let (width, height) = (src.width() as i64, src.height() as i64);

    Pixmap::from_fn(src.width(), src.height(), |x, y| {
        let mut acc = [0.0f32; 4];
        for (k, weight) in kernel.iter().enumerate() {
            let offset = k as i64 - radius;
            let (sx, sy) = match axis {
                Axis::X => (x as i64 + offset, y as i64),
                Axis::Y => (x as i64, y as i64 + offset),
            };
            let sample = match edge_mode {
                EdgeMode::Decal => src.sample_decal(sx, sy),
                EdgeMode::Clamp => src.sample_decal(sx.clamp(0, width - 1), sy.clamp(0, height - 1)),
            };
            for (a, s) in acc.iter_mut().zip(sample) {
                *a += s * weight;
            }
        }
        acc
    })
}
