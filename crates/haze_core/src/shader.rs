//! Region shader program
//!
//! The haze is drawn by a single WGSL program parameterized per region.
//! The source is parsed and validated with naga once per process; the
//! reflected interface is checked against the Rust-side uniform layout so a
//! renamed or reordered uniform fails at startup instead of at draw time.

use std::sync::LazyLock;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, ShaderStage, TypeInner};

use crate::error::ShaderError;
use crate::region::UNIFORM_LAYOUT;

/// Bind group slot of the `RegionUniforms` buffer
pub const UNIFORM_BINDING: u32 = 0;
/// Bind group slot of the original, unblurred content
pub const CONTENT_BINDING: u32 = 1;
/// Bind group slot of the blurred content
pub const BLURRED_BINDING: u32 = 2;
/// Bind group slot of the rasterized noise field
pub const NOISE_BINDING: u32 = 3;

/// Named shader inputs and the slots they are bound to
pub const SHADER_INPUTS: [(&str, u32); 3] = [
    ("content", CONTENT_BINDING),
    ("blurred", BLURRED_BINDING),
    ("noise", NOISE_BINDING),
];

pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry that copies the original content
pub const CONTENT_ENTRY: &str = "fs_content";
/// Fragment entry that hazes one region and discards everything outside it
pub const REGION_ENTRY: &str = "fs_region";

/// Per-region haze program
///
/// Outside the region's rounded border the original content passes through
/// unchanged: `fs_content` writes it once for the whole target and
/// `fs_region` discards those pixels. Inside the border, the blurred content
/// is shifted towards `color` by `color_shift` and brightened by up to 10% of
/// the noise luminance.
pub const REGION_SHADER: &str = r#"
// ============================================================================
// Haze Region Shader
// ============================================================================

struct RegionUniforms {
    // (left, top, right, bottom)
    rectangle: vec4<f32>,
    top_left_corner_radius: vec2<f32>,
    top_right_corner_radius: vec2<f32>,
    bottom_right_corner_radius: vec2<f32>,
    bottom_left_corner_radius: vec2<f32>,
    // Tint rgb, alpha forced to 1
    color: vec4<f32>,
    // Tint alpha
    color_shift: f32,
}

@group(0) @binding(0) var<uniform> region: RegionUniforms;
@group(0) @binding(1) var content: texture_2d<f32>;
@group(0) @binding(2) var blurred: texture_2d<f32>;
@group(0) @binding(3) var noise: texture_2d<f32>;

// Full-screen triangle
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> @builtin(position) vec4<f32> {
    let uv = vec2<f32>(f32((vertex_index << 1u) & 2u), f32(vertex_index & 2u));
    return vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
}

fn box_sdf(position: vec2<f32>, half_box: vec2<f32>, radius: vec2<f32>) -> f32 {
    let corner_radius = max(radius.x, radius.y);
    let q = abs(position) - half_box + vec2<f32>(corner_radius);
    return length(max(q, vec2<f32>(0.0))) + min(max(q.x, q.y), 0.0) - corner_radius;
}

fn edge_distance(coord: vec2<f32>) -> f32 {
    let shift_rect = (region.rectangle.zw - region.rectangle.xy) / 2.0;
    let shift_coord = coord - region.rectangle.xy;

    var corner_radius: vec2<f32>;
    if shift_coord.x > shift_rect.x {
        if shift_coord.y > shift_rect.y {
            corner_radius = region.bottom_right_corner_radius;
        } else {
            corner_radius = region.top_right_corner_radius;
        }
    } else {
        if shift_coord.y > shift_rect.y {
            corner_radius = region.bottom_left_corner_radius;
        } else {
            corner_radius = region.top_left_corner_radius;
        }
    }
    return box_sdf(shift_coord - shift_rect, shift_rect, corner_radius);
}

@fragment
fn fs_content(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    return textureLoad(content, vec2<i32>(floor(position.xy)), 0);
}

@fragment
fn fs_region(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    let coord = position.xy;
    if edge_distance(coord) > 0.0 {
        discard;
    }

    let pixel = vec2<i32>(floor(coord));
    let b = textureLoad(blurred, pixel, 0);
    let n = textureLoad(noise, pixel, 0);

    let noise_luminance = dot(n.rgb, vec3<f32>(0.2126, 0.7152, 0.0722));
    let noise_factor = min(1.0, noise_luminance) * 0.1;

    return b + noise_factor + ((region.color - b) * region.color_shift);
}
"#;

static REGION_PROGRAM: LazyLock<RegionProgram> = LazyLock::new(|| {
    RegionProgram::compile(REGION_SHADER)
        .unwrap_or_else(|err| panic!("built-in region shader failed to compile: {err}"))
});

/// A validated region shader module
#[derive(Debug)]
pub struct RegionProgram {
    source: String,
    module: naga::Module,
}

impl RegionProgram {
    /// Parse, validate and check the interface of a region program
    pub fn compile(source: &str) -> Result<Self, ShaderError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|err| ShaderError::Parse(err.emit_to_string(source)))?;

        Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .map_err(|err| ShaderError::Validation(err.to_string()))?;

        check_entry_points(&module)?;
        check_uniforms(&module)?;
        check_inputs(&module)?;

        tracing::debug!("region shader compiled");
        Ok(Self {
            source: source.to_owned(),
            module,
        })
    }

    /// The built-in program, compiled on first use
    ///
    /// # Panics
    ///
    /// Panics if [`REGION_SHADER`] does not compile. That is a build defect,
    /// not a runtime condition.
    pub fn shared() -> &'static RegionProgram {
        &REGION_PROGRAM
    }

    /// WGSL source of the program
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn module(&self) -> &naga::Module {
        &self.module
    }
}

fn check_entry_points(module: &naga::Module) -> Result<(), ShaderError> {
    for (name, stage) in [
        (VERTEX_ENTRY, ShaderStage::Vertex),
        (CONTENT_ENTRY, ShaderStage::Fragment),
        (REGION_ENTRY, ShaderStage::Fragment),
    ] {
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.name == name && ep.stage == stage);
        if !found {
            return Err(ShaderError::Interface(format!(
                "missing {stage:?} entry point `{name}`"
            )));
        }
    }
    Ok(())
}

fn check_uniforms(module: &naga::Module) -> Result<(), ShaderError> {
    let uniform = module
        .global_variables
        .iter()
        .map(|(_, var)| var)
        .find(|var| var.space == AddressSpace::Uniform)
        .ok_or_else(|| ShaderError::Interface("no uniform buffer declared".into()))?;

    if uniform.binding.as_ref().map(|b| (b.group, b.binding)) != Some((0, UNIFORM_BINDING)) {
        return Err(ShaderError::Interface(format!(
            "uniform buffer must be bound at @group(0) @binding({UNIFORM_BINDING})"
        )));
    }

    let TypeInner::Struct { members, .. } = &module.types[uniform.ty].inner else {
        return Err(ShaderError::Interface("uniform buffer is not a struct".into()));
    };

    let reflected: Vec<(&str, usize)> = members
        .iter()
        .map(|m| (m.name.as_deref().unwrap_or(""), m.offset as usize))
        .collect();

    if reflected != UNIFORM_LAYOUT {
        return Err(ShaderError::Interface(format!(
            "uniform layout {reflected:?} does not match {UNIFORM_LAYOUT:?}"
        )));
    }
    Ok(())
}

fn check_inputs(module: &naga::Module) -> Result<(), ShaderError> {
    for (name, slot) in SHADER_INPUTS {
        let var = module
            .global_variables
            .iter()
            .map(|(_, var)| var)
            .find(|var| var.name.as_deref() == Some(name))
            .ok_or_else(|| ShaderError::Interface(format!("missing shader input `{name}`")))?;

        let is_texture = matches!(module.types[var.ty].inner, TypeInner::Image { .. });
        let bound_at = var.binding.as_ref().map(|b| (b.group, b.binding));
        if !is_texture || bound_at != Some((0, slot)) {
            return Err(ShaderError::Interface(format!(
                "shader input `{name}` must be a texture at @group(0) @binding({slot})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_program_compiles() {
        let program = RegionProgram::shared();
        assert_eq!(program.source(), REGION_SHADER);
        let entry_points: Vec<&str> = program
            .module()
            .entry_points
            .iter()
            .map(|ep| ep.name.as_str())
            .collect();
        assert_eq!(entry_points, [VERTEX_ENTRY, CONTENT_ENTRY, REGION_ENTRY]);
    }

    #[test]
    fn test_shared_program_is_singleton() {
        assert!(std::ptr::eq(RegionProgram::shared(), RegionProgram::shared()));
    }

    #[test]
    fn test_parse_error() {
        let err = RegionProgram::compile("fn broken( {").unwrap_err();
        assert!(matches!(err, ShaderError::Parse(_)));
    }

    #[test]
    fn test_uniform_typo_rejected() {
        const TYPO: &str = r#"
struct RegionUniforms {
    rectangle: vec4<f32>,
    top_left_corner_radius: vec2<f32>,
    top_right_corner_radius: vec2<f32>,
    bottom_right_corner_radius: vec2<f32>,
    bottom_left_corner_radius: vec2<f32>,
    colour: vec4<f32>,
    color_shift: f32,
}
@group(0) @binding(0) var<uniform> region: RegionUniforms;
@group(0) @binding(1) var content: texture_2d<f32>;
@group(0) @binding(2) var blurred: texture_2d<f32>;
@group(0) @binding(3) var noise: texture_2d<f32>;

@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(f32(i), 0.0, 0.0, 1.0);
}

@fragment
fn fs_content(@builtin(position) p: vec4<f32>) -> @location(0) vec4<f32> {
    return textureLoad(content, vec2<i32>(p.xy), 0);
}

@fragment
fn fs_region(@builtin(position) p: vec4<f32>) -> @location(0) vec4<f32> {
    let px = vec2<i32>(p.xy);
    return textureLoad(blurred, px, 0) + textureLoad(noise, px, 0)
        + region.colour * region.color_shift;
}
"#;
        let err = RegionProgram::compile(TYPO).unwrap_err();
        assert!(matches!(err, ShaderError::Interface(_)), "{err}");
    }

    #[test]
    fn test_missing_input_rejected() {
        let without_noise = REGION_SHADER
            .replace("@group(0) @binding(3) var noise: texture_2d<f32>;", "")
            .replace("textureLoad(noise, pixel, 0)", "vec4<f32>(0.0)");

        let err = RegionProgram::compile(&without_noise).unwrap_err();
        assert_eq!(
            err,
            ShaderError::Interface("missing shader input `noise`".into())
        );
    }
}
