//! Billboard shader and its uniform block.

use std::f64::consts::TAU;

use bytemuck::{Pod, Zeroable};

use crate::lifecycle::Frame;

/// Uniform block shared by every instance in a draw.
///
/// Matches `Uniforms` in [`RENDER_SHADER`]. Time rides in `camera_right.w`
/// and intensity in `camera_up.w`.
///
/// The shader only reads time through `sin(t * 3.0)`, so the clock is
/// wrapped to that period before it is narrowed to `f32`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    pub burst: f32,
    pub point_scale: f32,
    pub _pad: [f32; 2],
}

impl Uniforms {
    pub fn from_frame(frame: &Frame<'_>, point_scale: f32) -> Self {
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            camera_right: frame.camera_right.extend(shimmer_time(frame.elapsed)).to_array(),
            camera_up: frame.camera_up.extend(frame.params.intensity).to_array(),
            burst: frame.burst,
            point_scale,
            _pad: [0.0; 2],
        }
    }
}

/// Scene time folded into one period of the shader's shimmer.
pub fn shimmer_time(elapsed: f64) -> f32 {
    ((elapsed * 3.0).rem_euclid(TAU) / 3.0) as f32
}

/// Camera-facing quads, one per [`Instance`](crate::scene::Instance),
/// drawn as soft round points.
pub const RENDER_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    burst: f32,
    point_scale: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position_size: vec4<f32>,
    @location(1) color_alpha: vec4<f32>,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = quad_vertices[vertex_index];

    let size = position_size.w * uniforms.point_scale;
    let offset = uniforms.camera_right.xyz * corner.x + uniforms.camera_up.xyz * corner.y;
    let world = position_size.xyz + offset * size;

    let intensity = uniforms.camera_up.w;
    let shimmer = 0.9 + 0.1 * sin(uniforms.camera_right.w * 3.0 + position_size.x * 7.0);
    let glow = (1.0 + uniforms.burst * 0.6 + intensity * 0.3) * shimmer;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(world, 1.0);
    out.color = vec4<f32>(color_alpha.rgb * glow, color_alpha.a);
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv);
    if dist > 1.0 {
        discard;
    }
    let falloff = 1.0 - smoothstep(0.2, 1.0, dist);
    return vec4<f32>(in.color.rgb, in.color.a * falloff);
}
"#;
