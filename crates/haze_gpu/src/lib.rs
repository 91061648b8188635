//! Haze GPU Renderer
//!
//! Executes haze composite effects using wgpu.
//!
//! # Features
//!
//! - **Blur Passes**: Separable Gaussian blur with decal edges
//! - **Noise Texture**: The shared noise field, uploaded once per target size
//! - **Region Draws**: One full-screen draw per region filter, scissored after the first

pub mod renderer;
pub mod shaders;

pub use renderer::{HazeRenderer, RendererConfig, RendererError};
pub use shaders::{BLUR_SHADER, REGION_SHADER};
