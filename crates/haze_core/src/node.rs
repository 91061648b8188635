//! Effect construction entry points
//!
//! [`build_effect`] runs the whole pipeline for one set of inputs:
//! blur kernel, one region filter per non-empty region, then the merge.
//! [`HazeNode`] keeps the current inputs and effect for a host that rebuilds
//! whenever its regions, colors, radius or density change.

use std::sync::Arc;

use crate::blur::{BlurFilter, Dp};
use crate::color::Color;
use crate::composite::{compose, CompositeEffect};
use crate::error::{HazeError, Result};
use crate::geometry::RoundedRect;
use crate::region::RegionFilter;

/// Default blur radius
pub const DEFAULT_BLUR_RADIUS: Dp = Dp(20.0);

/// Default alpha applied to the background color to derive the tint
pub const DEFAULT_TINT_ALPHA: f32 = 0.7;

/// Inputs of one effect build
#[derive(Clone, Debug, PartialEq)]
pub struct HazeParams {
    /// Regions to haze, in draw order
    pub regions: Vec<RoundedRect>,
    /// Background color. Carried for the host; the blend does not read it.
    pub background: Color,
    /// Tint color. Its alpha is the strength of the shift towards the tint.
    pub tint: Color,
    /// Blur radius in density-independent units
    pub blur_radius: Dp,
    /// Pixels per density-independent unit
    pub density: f32,
}

impl Default for HazeParams {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

impl HazeParams {
    /// Params with default radius and a tint derived from `background`
    pub fn new(background: Color) -> Self {
        Self {
            regions: Vec::new(),
            background,
            tint: background.with_alpha(DEFAULT_TINT_ALPHA),
            blur_radius: DEFAULT_BLUR_RADIUS,
            density: 1.0,
        }
    }

    pub fn with_regions(mut self, regions: impl IntoIterator<Item = RoundedRect>) -> Self {
        self.regions = regions.into_iter().collect();
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_blur_radius(mut self, blur_radius: impl Into<Dp>) -> Self {
        self.blur_radius = blur_radius.into();
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Reject inputs the blur kernel cannot be derived from
    pub fn validate(&self) -> Result<()> {
        let radius = self.blur_radius.0;
        if !radius.is_finite() || radius < 0.0 {
            return Err(HazeError::InvalidBlurRadius(radius));
        }
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(HazeError::InvalidDensity(self.density));
        }
        Ok(())
    }
}

/// Build the composite effect for `params`
pub fn build_effect(params: &HazeParams) -> Result<CompositeEffect> {
    params.validate()?;
    let blur = Arc::new(BlurFilter::new(params.blur_radius, params.density));
    build_with_blur(params, blur)
}

/// Like [`build_effect`], but falls back to no effect on invalid input
pub fn build_effect_or_empty(params: &HazeParams) -> CompositeEffect {
    build_effect(params).unwrap_or_else(|err| {
        tracing::warn!("haze disabled for this frame: {err}");
        CompositeEffect::Empty
    })
}

fn build_with_blur(params: &HazeParams, blur: Arc<BlurFilter>) -> Result<CompositeEffect> {
    let filters = params
        .regions
        .iter()
        .filter(|region| !region.is_empty())
        .map(|region| RegionFilter::new(region, params.tint, blur.clone()))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        regions = params.regions.len(),
        filters = filters.len(),
        "built haze effect"
    );
    Ok(compose(filters))
}

/// Current haze inputs and the effect built from them
///
/// Updates build the new effect completely before replacing the installed
/// one, so a failed update leaves the previous effect in place.
#[derive(Clone, Debug)]
pub struct HazeNode {
    params: HazeParams,
    blur: Arc<BlurFilter>,
    effect: CompositeEffect,
}

impl HazeNode {
    pub fn new(params: HazeParams) -> Result<Self> {
        let (blur, effect) = Self::build(&params)?;
        Ok(Self {
            params,
            blur,
            effect,
        })
    }

    /// Replace the inputs and rebuild
    pub fn update(&mut self, params: HazeParams) -> Result<()> {
        let (blur, effect) = Self::build(&params)?;
        self.params = params;
        self.blur = blur;
        self.effect = effect;
        Ok(())
    }

    pub fn params(&self) -> &HazeParams {
        &self.params
    }

    /// Blur filter of the current build pass
    pub fn blur_filter(&self) -> &Arc<BlurFilter> {
        &self.blur
    }

    /// Effect to attach to the render layer
    pub fn effect(&self) -> &CompositeEffect {
        &self.effect
    }

    fn build(params: &HazeParams) -> Result<(Arc<BlurFilter>, CompositeEffect)> {
        params.validate()?;
        let blur = Arc::new(BlurFilter::new(params.blur_radius, params.density));
        let effect = build_with_blur(params, blur.clone())?;
        Ok((blur, effect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Vec2};
    use crate::pixmap::Pixmap;

    fn regions() -> Vec<RoundedRect> {
        vec![
            RoundedRect::new(Rect::new(0.0, 0.0, 40.0, 20.0), 6.0),
            RoundedRect::from_rect(Rect::new(50.0, 50.0, 50.0, 80.0)),
            RoundedRect::with_radii(
                Rect::new(0.0, 30.0, 40.0, 60.0),
                Vec2::splat(2.0),
                Vec2::splat(4.0),
                Vec2::new(6.0, 3.0),
                Vec2::ZERO,
            ),
            RoundedRect::from_rect(Rect::new(10.0, 10.0, 5.0, 5.0)),
        ]
    }

    fn params() -> HazeParams {
        HazeParams::new(Color::from_hex(0x202030))
            .with_regions(regions())
            .with_blur_radius(12.0)
            .with_density(2.0)
    }

    #[test]
    fn test_defaults() {
        let params = HazeParams::new(Color::BLUE);
        assert_eq!(params.blur_radius, Dp(20.0));
        assert_eq!(params.tint, Color::rgba(0.0, 0.0, 1.0, 0.7));
        assert_eq!(params.density, 1.0);
        assert!(params.regions.is_empty());
    }

    #[test]
    fn test_empty_regions_excluded() {
        let params = params();
        let effect = build_effect(&params).unwrap();

        let non_empty: Vec<RoundedRect> = regions().into_iter().filter(|r| !r.is_empty()).collect();
        let expected = build_effect(&params.clone().with_regions(non_empty.clone())).unwrap();

        assert_eq!(effect.len(), 2);
        let built: Vec<RoundedRect> = effect.filters().iter().map(RegionFilter::region).collect();
        assert_eq!(built, non_empty);

        let bytes = |e: &CompositeEffect| -> Vec<Vec<u8>> {
            e.filters().iter().map(|f| f.uniform_bytes().to_vec()).collect()
        };
        assert_eq!(bytes(&effect), bytes(&expected));
    }

    #[test]
    fn test_no_regions_yields_no_effect() {
        let effect = build_effect(&HazeParams::default()).unwrap();
        assert!(effect.is_empty());

        let only_empty = HazeParams::default()
            .with_regions([RoundedRect::from_rect(Rect::new(5.0, 5.0, 0.0, 10.0))]);
        assert!(build_effect(&only_empty).unwrap().is_empty());
    }

    #[test]
    fn test_single_region_collapses() {
        let params = HazeParams::default()
            .with_regions([RoundedRect::new(Rect::new(0.0, 0.0, 10.0, 10.0), 2.0)]);
        assert!(matches!(
            build_effect(&params).unwrap(),
            CompositeEffect::Single(_)
        ));
    }

    #[test]
    fn test_filters_share_one_blur() {
        let effect = build_effect(&params()).unwrap();
        let filters = effect.filters();
        assert!(Arc::ptr_eq(filters[0].blur(), filters[1].blur()));

        let expected_sigma = 0.57735 * 24.0 + 0.5;
        assert!((filters[0].blur().sigma().0 - expected_sigma).abs() < 1e-4);
    }

    #[test]
    fn test_builds_are_deterministic() {
        let a = build_effect(&params()).unwrap();
        let b = build_effect(&params()).unwrap();

        for (fa, fb) in a.filters().iter().zip(b.filters()) {
            assert_eq!(fa.uniform_bytes(), fb.uniform_bytes());
            assert_eq!(fa.blur().as_ref(), fb.blur().as_ref());
            assert!(std::ptr::eq(fa.noise(), fb.noise()));
        }

        let content = Pixmap::from_fn(48, 64, |x, y| [x as f32 / 48.0, y as f32 / 64.0, 0.3, 1.0]);
        assert_eq!(a.apply(&content), b.apply(&content));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let negative = params().with_blur_radius(-1.0);
        assert_eq!(
            build_effect(&negative).unwrap_err(),
            HazeError::InvalidBlurRadius(-1.0)
        );

        let nan = params().with_blur_radius(f32::NAN);
        assert!(matches!(
            build_effect(&nan),
            Err(HazeError::InvalidBlurRadius(_))
        ));

        let zero_density = params().with_density(0.0);
        assert_eq!(
            build_effect(&zero_density).unwrap_err(),
            HazeError::InvalidDensity(0.0)
        );

        assert!(build_effect_or_empty(&zero_density).is_empty());
    }

    #[test]
    fn test_zero_radius_builds_identity_blur() {
        let node = HazeNode::new(params().with_blur_radius(0.0)).unwrap();
        assert!(node.blur_filter().is_identity());
        assert_eq!(node.effect().len(), 2);
    }

    #[test]
    fn test_node_update_swaps_effect() {
        let mut node = HazeNode::new(params()).unwrap();
        let first_blur = node.blur_filter().clone();

        let moved = params().with_regions([RoundedRect::new(Rect::new(5.0, 5.0, 25.0, 25.0), 4.0)]);
        node.update(moved.clone()).unwrap();

        assert_eq!(node.params(), &moved);
        assert_eq!(node.effect().len(), 1);
        assert!(!Arc::ptr_eq(&first_blur, node.blur_filter()));
        assert!(Arc::ptr_eq(node.blur_filter(), node.effect().filters()[0].blur()));
    }

    #[test]
    fn test_node_keeps_effect_on_failed_update() {
        let mut node = HazeNode::new(params()).unwrap();
        let before = node.effect().clone();

        let err = node.update(params().with_density(f32::INFINITY)).unwrap_err();
        assert_eq!(err, HazeError::InvalidDensity(f32::INFINITY));
        assert_eq!(node.effect(), &before);
        assert_eq!(node.params(), &params());
    }
}
