//! Per-region haze filters
//!
//! A [`RegionFilter`] is one instance of the region program: the packed
//! uniforms for a single rounded rect, bound to the blur of the current build
//! pass, the shared noise field and the shared compiled program.

use std::mem::offset_of;
use std::sync::Arc;

use crate::blur::BlurFilter;
use crate::color::Color;
use crate::error::{HazeError, Result};
use crate::geometry::{Rect, RoundedRect, Vec2};
use crate::noise::NoiseField;
use crate::pixmap::Pixmap;
use crate::shader::RegionProgram;

/// Perceptual luminance weights (Rec. 709)
pub const LUMINANCE_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Upper bound of the additive noise brightening
pub const NOISE_STRENGTH: f32 = 0.1;

/// Uniforms of the region program (matches shader `RegionUniforms` struct)
///
/// Memory layout:
/// - rectangle: `vec4<f32>`                  (16 bytes) - (left, top, right, bottom)
/// - top_left_corner_radius: `vec2<f32>`     (8 bytes)
/// - top_right_corner_radius: `vec2<f32>`    (8 bytes)
/// - bottom_right_corner_radius: `vec2<f32>` (8 bytes)
/// - bottom_left_corner_radius: `vec2<f32>`  (8 bytes)
/// - color: `vec4<f32>`                      (16 bytes) - tint rgb, alpha 1
/// - color_shift: `f32`                      (4 bytes)  - tint alpha
/// - _padding: `[f32; 3]`                    (12 bytes)
/// Total: 80 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RegionUniforms {
    pub rectangle: [f32; 4],
    pub top_left_corner_radius: [f32; 2],
    pub top_right_corner_radius: [f32; 2],
    pub bottom_right_corner_radius: [f32; 2],
    pub bottom_left_corner_radius: [f32; 2],
    pub color: [f32; 4],
    pub color_shift: f32,
    pub _padding: [f32; 3],
}

/// Uniform names in declaration order with their byte offsets
pub const UNIFORM_LAYOUT: [(&str, usize); 7] = [
    ("rectangle", offset_of!(RegionUniforms, rectangle)),
    (
        "top_left_corner_radius",
        offset_of!(RegionUniforms, top_left_corner_radius),
    ),
    (
        "top_right_corner_radius",
        offset_of!(RegionUniforms, top_right_corner_radius),
    ),
    (
        "bottom_right_corner_radius",
        offset_of!(RegionUniforms, bottom_right_corner_radius),
    ),
    (
        "bottom_left_corner_radius",
        offset_of!(RegionUniforms, bottom_left_corner_radius),
    ),
    ("color", offset_of!(RegionUniforms, color)),
    ("color_shift", offset_of!(RegionUniforms, color_shift)),
];

impl RegionUniforms {
    /// Pack a region and its tint
    pub fn new(region: &RoundedRect, tint: Color) -> Self {
        Self {
            rectangle: region.rect.to_array(),
            top_left_corner_radius: region.top_left.to_array(),
            top_right_corner_radius: region.top_right.to_array(),
            bottom_right_corner_radius: region.bottom_right.to_array(),
            bottom_left_corner_radius: region.bottom_left.to_array(),
            color: [tint.r, tint.g, tint.b, 1.0],
            color_shift: tint.a,
            _padding: [0.0; 3],
        }
    }

    /// The rounded rect these uniforms describe
    pub fn region(&self) -> RoundedRect {
        let [left, top, right, bottom] = self.rectangle;
        RoundedRect::with_radii(
            Rect::new(left, top, right, bottom),
            self.top_left_corner_radius.into(),
            self.top_right_corner_radius.into(),
            self.bottom_right_corner_radius.into(),
            self.bottom_left_corner_radius.into(),
        )
    }
}

/// Additive noise term for a noise sample
pub fn noise_factor(noise: [f32; 4]) -> f32 {
    let luminance = noise[0] * LUMINANCE_WEIGHTS[0]
        + noise[1] * LUMINANCE_WEIGHTS[1]
        + noise[2] * LUMINANCE_WEIGHTS[2];
    luminance.min(1.0) * NOISE_STRENGTH
}

/// Blend a blurred sample towards `color` by `color_shift` and add noise
///
/// Not an alpha composite: no premultiplication and no clamping, channels
/// may leave `[0, 1]`.
pub fn blend(blurred: [f32; 4], noise: [f32; 4], color: [f32; 4], color_shift: f32) -> [f32; 4] {
    let n = noise_factor(noise);
    std::array::from_fn(|i| blurred[i] + n + (color[i] - blurred[i]) * color_shift)
}

/// One parameterized instance of the region program
#[derive(Clone, Debug)]
pub struct RegionFilter {
    uniforms: RegionUniforms,
    blur: Arc<BlurFilter>,
    noise: &'static NoiseField,
    program: &'static RegionProgram,
}

impl RegionFilter {
    /// Build the filter for one region
    ///
    /// Empty regions are rejected; callers filter them out beforehand.
    pub fn new(region: &RoundedRect, tint: Color, blur: Arc<BlurFilter>) -> Result<Self> {
        if region.is_empty() {
            return Err(HazeError::EmptyRegion(region.rect));
        }

        tracing::trace!(rect = ?region.rect, "building region filter");

        Ok(Self {
            uniforms: RegionUniforms::new(region, tint),
            blur,
            noise: NoiseField::shared(),
            program: RegionProgram::shared(),
        })
    }

    pub fn uniforms(&self) -> &RegionUniforms {
        &self.uniforms
    }

    /// Uniform bytes ready for a GPU buffer upload
    pub fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }

    pub fn region(&self) -> RoundedRect {
        self.uniforms.region()
    }

    pub fn blur(&self) -> &Arc<BlurFilter> {
        &self.blur
    }

    pub fn noise(&self) -> &'static NoiseField {
        self.noise
    }

    pub fn program(&self) -> &'static RegionProgram {
        self.program
    }

    /// Whether the haze covers `coord`
    pub fn covers(&self, coord: Vec2) -> bool {
        self.region().contains(coord)
    }

    /// Evaluate the program at `coord` given the three input images
    pub fn eval(&self, coord: Vec2, content: &Pixmap, blurred: &Pixmap) -> [f32; 4] {
        if !self.covers(coord) {
            return content.eval(coord);
        }
        self.eval_inside(coord, blurred)
    }

    pub(crate) fn eval_inside(&self, coord: Vec2, blurred: &Pixmap) -> [f32; 4] {
        blend(
            blurred.eval(coord),
            self.noise.sample(coord),
            self.uniforms.color,
            self.uniforms.color_shift,
        )
    }

    /// Run this filter alone over `content` on the CPU
    pub fn apply(&self, content: &Pixmap) -> Pixmap {
        let blurred = self.blur.apply(content);
        Pixmap::from_fn(content.width(), content.height(), |x, y| {
            self.eval(Pixmap::pixel_center(x, y), content, &blurred)
        })
    }
}

impl PartialEq for RegionFilter {
    /// Filters are equal when they pack the same uniforms and share the same
    /// blur, noise field and program.
    fn eq(&self, other: &Self) -> bool {
        self.uniforms == other.uniforms
            && Arc::ptr_eq(&self.blur, &other.blur)
            && std::ptr::eq(self.noise, other.noise)
            && std::ptr::eq(self.program, other.program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blur::Dp;

    fn region() -> RoundedRect {
        RoundedRect::with_radii(
            Rect::new(10.0, 20.0, 110.0, 70.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(3.0, 4.0),
            Vec2::new(5.0, 6.0),
            Vec2::new(7.0, 8.0),
        )
    }

    #[test]
    fn test_uniform_packing() {
        let tint = Color::rgba(0.1, 0.2, 0.3, 0.4);
        let uniforms = RegionUniforms::new(&region(), tint);

        assert_eq!(uniforms.rectangle, [10.0, 20.0, 110.0, 70.0]);
        assert_eq!(uniforms.top_left_corner_radius, [1.0, 2.0]);
        assert_eq!(uniforms.top_right_corner_radius, [3.0, 4.0]);
        assert_eq!(uniforms.bottom_right_corner_radius, [5.0, 6.0]);
        assert_eq!(uniforms.bottom_left_corner_radius, [7.0, 8.0]);
        assert_eq!(uniforms.color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(uniforms.color_shift, 0.4);
        assert_eq!(uniforms.region(), region());
    }

    #[test]
    fn test_uniform_size_matches_wgsl() {
        assert_eq!(std::mem::size_of::<RegionUniforms>(), 80);
        assert_eq!(UNIFORM_LAYOUT[5], ("color", 48));
        assert_eq!(UNIFORM_LAYOUT[6], ("color_shift", 64));
    }

    #[test]
    fn test_blend_example() {
        // Noise with luminance 0.5 (equal channels sum the weights to 1.0)
        let noise = [0.5, 0.5, 0.5, 1.0];
        assert!((noise_factor(noise) - 0.05).abs() < 1e-6);

        let tint = RegionUniforms::new(&region(), Color::rgba(1.0, 0.0, 0.0, 0.5));
        let result = blend([0.2, 0.2, 0.2, 1.0], noise, tint.color, tint.color_shift);

        assert!((result[0] - 0.65).abs() < 1e-6);
        assert!((result[1] - (0.2 + 0.05 - 0.1)).abs() < 1e-6);
        assert!((result[3] - 1.05).abs() < 1e-6);
    }

    #[test]
    fn test_noise_factor_capped() {
        assert!((noise_factor([4.0, 4.0, 4.0, 1.0]) - 0.1).abs() < 1e-6);
        assert_eq!(noise_factor([0.0; 4]), 0.0);
    }

    #[test]
    fn test_empty_region_rejected() {
        let blur = Arc::new(BlurFilter::new(Dp(10.0), 1.0));
        let empty = RoundedRect::from_rect(Rect::new(5.0, 5.0, 5.0, 50.0));
        let err = RegionFilter::new(&empty, Color::WHITE, blur).unwrap_err();
        assert_eq!(err, HazeError::EmptyRegion(empty.rect));
    }

    #[test]
    fn test_outside_passes_content_through() {
        let blur = Arc::new(BlurFilter::new(Dp(4.0), 1.0));
        let filter = RegionFilter::new(
            &RoundedRect::from_rect(Rect::new(4.0, 4.0, 12.0, 12.0)),
            Color::rgba(1.0, 0.0, 0.0, 0.5),
            blur,
        )
        .unwrap();

        let content = Pixmap::from_fn(16, 16, |x, y| [x as f32 / 16.0, y as f32 / 16.0, 0.5, 1.0]);
        let output = filter.apply(&content);

        assert_eq!(output.pixel(0, 0), content.pixel(0, 0));
        assert_eq!(output.pixel(15, 8), content.pixel(15, 8));
        assert_ne!(output.pixel(8, 8), content.pixel(8, 8));
    }

    #[test]
    fn test_inside_matches_blend_formula() {
        let blur = Arc::new(BlurFilter::new(Dp(0.0), 1.0));
        let tint = Color::rgba(0.0, 0.0, 1.0, 0.25);
        let filter = RegionFilter::new(
            &RoundedRect::new(Rect::new(0.0, 0.0, 8.0, 8.0), 2.0),
            tint,
            blur,
        )
        .unwrap();

        let content = Pixmap::filled(8, 8, Color::GRAY);
        let output = filter.apply(&content);

        let coord = Pixmap::pixel_center(4, 4);
        let expected = blend(
            Color::GRAY.to_array(),
            NoiseField::shared().sample(coord),
            [0.0, 0.0, 1.0, 1.0],
            0.25,
        );
        assert_eq!(output.pixel(4, 4), expected);
    }

    #[test]
    fn test_deterministic_uniform_bytes() {
        let tint = Color::rgba(0.3, 0.6, 0.9, 0.7);
        let a = RegionFilter::new(&region(), tint, Arc::new(BlurFilter::new(Dp(8.0), 2.0))).unwrap();
        let b = RegionFilter::new(&region(), tint, Arc::new(BlurFilter::new(Dp(8.0), 2.0))).unwrap();

        assert_eq!(a.uniform_bytes(), b.uniform_bytes());
        assert_eq!(a.blur().as_ref(), b.blur().as_ref());
        assert!(std::ptr::eq(a.noise(), b.noise()));
        assert!(std::ptr::eq(a.program(), b.program()));
    }
}
