//! Geometry for haze regions
//!
//! Regions are rounded rectangles in pixel space with four independent,
//! possibly elliptical, corner radii. The signed distance evaluation here is
//! the CPU mirror of `box_sdf` in the region shader and must stay in sync
//! with it.

// ─────────────────────────────────────────────────────────────────────────────
// Core Geometry Types
// ─────────────────────────────────────────────────────────────────────────────

/// 2D vector, also used for points and corner radii
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Circular radius (same value on both axes)
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn abs(&self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Component-wise maximum with a scalar
    pub fn max_scalar(&self, v: f32) -> Self {
        Self::new(self.x.max(v), self.y.max(v))
    }

    pub fn to_array(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl From<[f32; 2]> for Vec2 {
    fn from([x, y]: [f32; 2]) -> Self {
        Vec2::new(x, y)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle stored as edges (left, top, right, bottom)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rect from an origin and a size
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// A rect is empty when it has zero or negative width or height
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}

/// Rounded rectangle with four elliptical corner radii
///
/// Radii are stored clockwise from the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RoundedRect {
    pub rect: Rect,
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_right: Vec2,
    pub bottom_left: Vec2,
}

impl RoundedRect {
    /// Rounded rect with the same circular radius on every corner
    pub fn new(rect: Rect, radius: f32) -> Self {
        let r = Vec2::splat(radius);
        Self::with_radii(rect, r, r, r, r)
    }

    /// Rounded rect with square corners
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect, 0.0)
    }

    /// Rounded rect with an individual radius per corner.
    /// Order: top_left, top_right, bottom_right, bottom_left
    pub fn with_radii(
        rect: Rect,
        top_left: Vec2,
        top_right: Vec2,
        bottom_right: Vec2,
        bottom_left: Vec2,
    ) -> Self {
        Self {
            rect,
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }

    /// Half extent of the rect
    pub fn half_size(&self) -> Vec2 {
        Vec2::new(self.rect.width() / 2.0, self.rect.height() / 2.0)
    }

    /// Radius of the corner whose quadrant contains `point`
    ///
    /// Points exactly on the vertical (horizontal) center line belong to the
    /// left (top) side.
    pub fn corner_radius_at(&self, point: Vec2) -> Vec2 {
        let half = self.half_size();
        let local = point - self.rect.top_left();

        match (local.x > half.x, local.y > half.y) {
            (true, true) => self.bottom_right,
            (true, false) => self.top_right,
            (false, true) => self.bottom_left,
            (false, false) => self.top_left,
        }
    }

    /// Signed distance from `point` to the rounded border
    ///
    /// Negative inside, zero on the border, positive outside.
    pub fn signed_distance(&self, point: Vec2) -> f32 {
        let half = self.half_size();
        let local = point - self.rect.top_left();
        box_sdf(local - half, half, self.corner_radius_at(point))
    }

    /// Whether the haze applies at `point`. The border itself is inside.
    pub fn contains(&self, point: Vec2) -> bool {
        self.signed_distance(point) <= 0.0
    }
}

/// Rounded box SDF centered at the origin
///
/// Elliptical radii are approximated by their larger axis.
pub fn box_sdf(position: Vec2, half_box: Vec2, radius: Vec2) -> f32 {
    let corner = radius.x.max(radius.y);
    let q = Vec2::new(
        position.x.abs() - half_box.x + corner,
        position.y.abs() - half_box.y + corner,
    );
    q.max_scalar(0.0).length() + q.x.max(q.y).min(0.0) - corner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distinct_corners() -> RoundedRect {
        RoundedRect::with_radii(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Vec2::splat(5.0),
            Vec2::splat(20.0),
            Vec2::splat(30.0),
            Vec2::splat(40.0),
        )
    }

    #[test]
    fn test_empty_rects() {
        assert!(Rect::new(10.0, 10.0, 10.0, 50.0).is_empty());
        assert!(Rect::new(10.0, 10.0, 50.0, 5.0).is_empty());
        assert!(Rect::ZERO.is_empty());
        assert!(!Rect::from_xywh(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_sdf_center_is_negative_half_extent() {
        let h = 10.0;
        let region = RoundedRect::from_rect(Rect::new(-h, -h, h, h));
        assert_eq!(region.signed_distance(Vec2::ZERO), -h);
    }

    #[test]
    fn test_sdf_outside_along_axis() {
        let h = 10.0;
        let region = RoundedRect::from_rect(Rect::new(-h, -h, h, h));

        for d in [10.5, 12.0, 50.0] {
            assert!(region.signed_distance(Vec2::new(d, 0.0)) > 0.0);
            assert!(region.signed_distance(Vec2::new(-d, 0.0)) > 0.0);
            assert!(region.signed_distance(Vec2::new(0.0, d)) > 0.0);
            assert!(region.signed_distance(Vec2::new(0.0, -d)) > 0.0);
        }

        // On the border counts as inside
        assert_eq!(region.signed_distance(Vec2::new(h, 0.0)), 0.0);
        assert!(region.contains(Vec2::new(h, 0.0)));
    }

    #[test]
    fn test_corner_selection_by_quadrant() {
        let region = distinct_corners();

        assert_eq!(region.corner_radius_at(Vec2::new(10.0, 10.0)), Vec2::splat(5.0));
        assert_eq!(region.corner_radius_at(Vec2::new(90.0, 10.0)), Vec2::splat(20.0));
        assert_eq!(region.corner_radius_at(Vec2::new(90.0, 90.0)), Vec2::splat(30.0));
        assert_eq!(region.corner_radius_at(Vec2::new(10.0, 90.0)), Vec2::splat(40.0));
    }

    #[test]
    fn test_top_right_curvature() {
        let region = distinct_corners();

        // Point 3px in from both edges of the top-right corner: cut off by
        // the 20px radius, but would be inside a 5px (top-left) radius.
        let p = Vec2::new(97.0, 3.0);
        assert!(region.signed_distance(p) > 0.0);
        assert!(!region.contains(p));

        // The same offset at the top-left corner is inside the 5px rounding
        assert!(region.contains(Vec2::new(3.0, 3.0)));

        // Distance to the top-right arc: center (80, 20), radius 20
        let expected = Vec2::new(97.0 - 80.0, 3.0 - 20.0).length() - 20.0;
        assert!((region.signed_distance(p) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_elliptical_radius_uses_larger_axis() {
        let sdf_ellipse = box_sdf(Vec2::new(9.0, 9.0), Vec2::splat(10.0), Vec2::new(2.0, 6.0));
        let sdf_circle = box_sdf(Vec2::new(9.0, 9.0), Vec2::splat(10.0), Vec2::splat(6.0));
        assert_eq!(sdf_ellipse, sdf_circle);
    }
}
