//! CPU pixel buffer used by the reference evaluator
//!
//! Pixels are unclamped RGBA `f32` in row-major order. Pixel `(x, y)` is
//! evaluated at its center `(x + 0.5, y + 0.5)`, matching fragment
//! coordinates on the GPU.

use crate::color::Color;
use crate::geometry::Vec2;

/// RGBA `f32` image
#[derive(Clone, Debug, PartialEq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Pixmap {
    /// Create a transparent pixmap
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    /// Create a pixmap filled with a single color
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color.to_array(); width as usize * height as usize],
        }
    }

    /// Create a pixmap by evaluating `f` at every pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[self.index(x, y)]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: [f32; 4]) {
        let idx = self.index(x, y);
        self.pixels[idx] = value;
    }

    /// Sample with decal edges: anything outside the image is transparent
    pub fn sample_decal(&self, x: i64, y: i64) -> [f32; 4] {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return [0.0; 4];
        }
        self.pixel(x as u32, y as u32)
    }

    /// Sample the pixel containing `coord`
    pub fn eval(&self, coord: Vec2) -> [f32; 4] {
        self.sample_decal(coord.x.floor() as i64, coord.y.floor() as i64)
    }

    /// Center of pixel `(x, y)` in pixel space
    pub fn pixel_center(x: u32, y: u32) -> Vec2 {
        Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decal_sampling() {
        let pixmap = Pixmap::filled(4, 4, Color::WHITE);
        assert_eq!(pixmap.sample_decal(0, 0), [1.0; 4]);
        assert_eq!(pixmap.sample_decal(-1, 0), [0.0; 4]);
        assert_eq!(pixmap.sample_decal(0, 4), [0.0; 4]);
    }

    #[test]
    fn test_from_fn_row_major() {
        let pixmap = Pixmap::from_fn(3, 2, |x, y| [x as f32, y as f32, 0.0, 1.0]);
        assert_eq!(pixmap.pixel(2, 1), [2.0, 1.0, 0.0, 1.0]);
        assert_eq!(pixmap.pixels()[5], [2.0, 1.0, 0.0, 1.0]);
        assert_eq!(pixmap.eval(Pixmap::pixel_center(1, 0)), [1.0, 0.0, 0.0, 1.0]);
    }
}
