//! WGSL shaders used by the haze renderer
//!
//! The region program lives in `haze_core` so it can be validated without a
//! device; it is re-exported here next to the blur program.

pub use haze_core::shader::REGION_SHADER;

/// Fragment entry of [`BLUR_SHADER`]
pub const BLUR_ENTRY: &str = "fs_main";

/// Separable Gaussian blur, one axis per pass
///
/// Weights are the normalized kernel computed on the CPU. Taps outside the
/// source are transparent in decal mode and repeat the edge in clamp mode.
pub const BLUR_SHADER: &str = r#"
// ============================================================================
// Haze Blur Shader
// ============================================================================

struct BlurUniforms {
    // (1, 0) for the horizontal pass, (0, 1) for the vertical pass
    direction: vec2<i32>,
    // Kernel radius in taps, the kernel has 2 * radius + 1 weights
    radius: i32,
    // 0 = decal, 1 = clamp
    edge_mode: u32,
}

@group(0) @binding(0) var<uniform> params: BlurUniforms;
@group(0) @binding(1) var<storage, read> weights: array<f32>;
@group(0) @binding(2) var source: texture_2d<f32>;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> @builtin(position) vec4<f32> {
    let uv = vec2<f32>(f32((vertex_index << 1u) & 2u), f32(vertex_index & 2u));
    return vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    let pixel = vec2<i32>(floor(position.xy));
    let size = vec2<i32>(textureDimensions(source));

    var acc = vec4<f32>(0.0);
    for (var i = -params.radius; i <= params.radius; i++) {
        var tap = pixel + params.direction * i;
        if params.edge_mode == 1u {
            tap = clamp(tap, vec2<i32>(0), size - vec2<i32>(1));
        } else if any(tap < vec2<i32>(0)) || any(tap >= size) {
            continue;
        }
        acc += textureLoad(source, tap, 0) * weights[i + params.radius];
    }
    return acc;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|err| panic!("{}", err.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .expect("shader should validate");
        module
    }

    #[test]
    fn test_blur_shader_validates() {
        let module = validate(BLUR_SHADER);
        let entry_points: Vec<&str> = module.entry_points.iter().map(|ep| ep.name.as_str()).collect();
        assert_eq!(entry_points, ["vs_main", BLUR_ENTRY]);
    }

    #[test]
    fn test_region_shader_validates() {
        validate(REGION_SHADER);
    }
}
