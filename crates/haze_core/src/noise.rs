//! Procedural noise for the frosted texture
//!
//! Implements the fractal-noise variant of the SVG `feTurbulence` filter
//! primitive: four channels of lattice gradient noise seeded by the
//! Park-Miller generator, summed over octaves and remapped to `[0, 1]`.
//!
//! The haze uses one fixed field for every region and every rebuild, see
//! [`NoiseField::shared`].

use std::sync::LazyLock;

use crate::geometry::Vec2;

/// Base frequency of the shared noise field on both axes
pub const BASE_FREQUENCY: f32 = 0.45;

/// Number of octaves of the shared noise field
pub const OCTAVES: u32 = 4;

/// Seed of the shared noise field
pub const SEED: f32 = 2.0;

const B_SIZE: usize = 0x100;
const B_MASK: usize = 0xff;
const LATTICE_LEN: usize = B_SIZE + B_SIZE + 2;
const PERLIN_N: f32 = 4096.0;

// Park-Miller minimal standard generator
const RAND_M: i64 = 2_147_483_647;
const RAND_A: i64 = 16_807;
const RAND_Q: i64 = 127_773;
const RAND_R: i64 = 2_836;

static NOISE_FIELD: LazyLock<NoiseField> =
    LazyLock::new(|| NoiseField::new(BASE_FREQUENCY, BASE_FREQUENCY, OCTAVES, SEED));

/// Deterministic fractal noise generator
///
/// Stateless from the caller's side: [`NoiseField::sample`] is a pure
/// function of the pixel coordinate.
#[derive(Clone, Debug)]
pub struct NoiseField {
    base_frequency: Vec2,
    octaves: u32,
    seed: f32,
    lattice: [usize; LATTICE_LEN],
    gradients: [[[f32; 2]; LATTICE_LEN]; 4],
}

impl NoiseField {
    /// Build the lattice and gradient tables for the given parameters
    pub fn new(base_frequency_x: f32, base_frequency_y: f32, octaves: u32, seed: f32) -> Self {
        let mut lattice = [0usize; LATTICE_LEN];
        let mut gradients = [[[0.0f32; 2]; LATTICE_LEN]; 4];

        let mut state = setup_seed(seed.round() as i64);

        for channel in gradients.iter_mut() {
            for (i, gradient) in channel.iter_mut().take(B_SIZE).enumerate() {
                lattice[i] = i;
                for component in gradient.iter_mut() {
                    state = random(state);
                    *component = ((state % (B_SIZE + B_SIZE) as i64) - B_SIZE as i64) as f32
                        / B_SIZE as f32;
                }
                let len = (gradient[0] * gradient[0] + gradient[1] * gradient[1]).sqrt();
                if len > 0.0 {
                    gradient[0] /= len;
                    gradient[1] /= len;
                }
            }
        }

        for i in (1..B_SIZE).rev() {
            state = random(state);
            let j = (state % B_SIZE as i64) as usize;
            lattice.swap(i, j);
        }

        for i in 0..B_SIZE + 2 {
            lattice[B_SIZE + i] = lattice[i];
            for channel in gradients.iter_mut() {
                channel[B_SIZE + i] = channel[i];
            }
        }

        tracing::trace!(octaves, seed, "noise field tables built");

        Self {
            base_frequency: Vec2::new(base_frequency_x, base_frequency_y),
            octaves,
            seed,
            lattice,
            gradients,
        }
    }

    /// The process-wide noise field, created on first use
    pub fn shared() -> &'static NoiseField {
        &NOISE_FIELD
    }

    pub fn base_frequency(&self) -> Vec2 {
        self.base_frequency
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    pub fn seed(&self) -> f32 {
        self.seed
    }

    /// Premultiplied RGBA noise at `coord`, each channel in `[0, 1]`
    pub fn sample(&self, coord: Vec2) -> [f32; 4] {
        let mut rgba = [0.0f32; 4];
        for (channel, value) in rgba.iter_mut().enumerate() {
            let sum = self.fractal_sum(channel, coord);
            *value = ((sum + 1.0) / 2.0).clamp(0.0, 1.0);
        }

        let alpha = rgba[3];
        [rgba[0] * alpha, rgba[1] * alpha, rgba[2] * alpha, alpha]
    }

    /// Rasterize the field at pixel centers into tightly packed RGBA8 rows
    pub fn rasterize(&self, width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let sample = self.sample(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                bytes.extend(sample.iter().map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8));
            }
        }
        bytes
    }

    fn fractal_sum(&self, channel: usize, coord: Vec2) -> f32 {
        let mut x = coord.x * self.base_frequency.x;
        let mut y = coord.y * self.base_frequency.y;
        let mut ratio = 1.0;
        let mut sum = 0.0;

        for _ in 0..self.octaves {
            sum += self.noise2(channel, x, y) / ratio;
            x *= 2.0;
            y *= 2.0;
            ratio *= 2.0;
        }
        sum
    }

    fn noise2(&self, channel: usize, x: f32, y: f32) -> f32 {
        let (bx0, bx1, rx0, rx1) = lattice_coords(x);
        let (by0, by1, ry0, ry1) = lattice_coords(y);

        let i = self.lattice[bx0];
        let j = self.lattice[bx1];
        let b00 = self.lattice[i + by0];
        let b10 = self.lattice[j + by0];
        let b01 = self.lattice[i + by1];
        let b11 = self.lattice[j + by1];

        let sx = s_curve(rx0);
        let sy = s_curve(ry0);
        let g = &self.gradients[channel];

        let u = rx0 * g[b00][0] + ry0 * g[b00][1];
        let v = rx1 * g[b10][0] + ry0 * g[b10][1];
        let a = lerp(sx, u, v);

        let u = rx0 * g[b01][0] + ry1 * g[b01][1];
        let v = rx1 * g[b11][0] + ry1 * g[b11][1];
        let b = lerp(sx, u, v);

        lerp(sy, a, b)
    }
}

fn setup_seed(seed: i64) -> i64 {
    let mut seed = seed;
    if seed <= 0 {
        seed = -(seed % (RAND_M - 1)) + 1;
    }
    if seed > RAND_M - 1 {
        seed = RAND_M - 1;
    }
    seed
}

fn random(seed: i64) -> i64 {
    let next = RAND_A * (seed % RAND_Q) - RAND_R * (seed / RAND_Q);
    if next <= 0 {
        next + RAND_M
    } else {
        next
    }
}

fn lattice_coords(v: f32) -> (usize, usize, f32, f32) {
    let t = v + PERLIN_N;
    let whole = t.trunc();
    let b0 = (whole as i64 as usize) & B_MASK;
    let b1 = (b0 + 1) & B_MASK;
    let r0 = t - whole;
    (b0, b1, r0, r0 - 1.0)
}

fn s_curve(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}
