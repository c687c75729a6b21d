//! WGSL sources for the field's two passes.
//!
//! Both shaders share the utilities in [`crate::shader_utils`] and bind the
//! same uniform buffer at `@group(0) @binding(0)`.

use crate::rays;
use crate::shader_utils::{all_utils_wgsl, wgsl_vec3, UNIFORMS_WGSL};
use crate::visuals::{palette, Footprint};

/// Interference ring radii in world units.
pub const INNER_RADIUS: f32 = 80.0;
pub const MIDDLE_RADIUS: f32 = 150.0;
pub const OUTER_RADIUS: f32 = 250.0;

/// Vertices per particle instance (two triangles).
pub const VERTICES_PER_INSTANCE: u32 = 6;

/// Instanced particle shader for the given footprint.
///
/// Vertex input is one [`Particle`](crate::grid::Particle) per instance at
/// locations 0..=3. The vertex stage displaces the anchor; the fragment stage
/// colours the footprint.
pub fn particle_shader(footprint: Footprint) -> String {
    format!(
        r#"{utils}

const INNER_RADIUS: f32 = {inner:?};
const MIDDLE_RADIUS: f32 = {middle:?};
const OUTER_RADIUS: f32 = {outer:?};

const BASE_COLOR = {base};
const HIGHLIGHT_COLOR = {highlight};
const FOREST_COLOR = {forest};

struct InstanceInput {{
    @location(0) position: vec3<f32>,
    @location(1) scale: f32,
    @location(2) seed: f32,
    @location(3) angle: f32,
}};

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) distance: f32,
    @location(2) opacity: f32,
    @location(3) highlight: f32,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    instance: InstanceInput,
) -> VertexOutput {{
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let quad = corners[vertex_index];

    var pos = instance.position;
    let time = field_time();
    let mouse_active = uniforms.mouse_active;

    // Organic wave, deeper and faster while scrolling
    let wave_amplitude = 40.0 + uniforms.scroll * 20.0 + uniforms.scroll_velocity * 2.0;
    let wave = fbm(vec3<f32>(pos.x * 0.015, pos.y * 0.015, time * 0.3)) * wave_amplitude;
    let wave2 = snoise(vec3<f32>(pos.x * 0.008 + time * 0.1, pos.y * 0.008, time * 0.15)) * 25.0;
    pos.z += wave + wave2;

    // Interference rings around the pointer
    let mouse_world = uniforms.mouse * uniforms.resolution * 0.5;
    let dist = length(pos.xy - mouse_world);

    let inner = 1.0 - smoothstep(0.0, INNER_RADIUS, dist);
    let interference = sin(dist * 0.05 - time * 3.0) * inner * 30.0 * mouse_active;

    let middle = smoothstep(INNER_RADIUS, MIDDLE_RADIUS, dist)
        * (1.0 - smoothstep(MIDDLE_RADIUS, OUTER_RADIUS, dist));
    let middle_wave = sin(dist * 0.03 - time * 2.0) * middle * 20.0 * mouse_active;

    let outer = smoothstep(MIDDLE_RADIUS, OUTER_RADIUS, dist)
        * (1.0 - smoothstep(OUTER_RADIUS, OUTER_RADIUS + 100.0, dist));
    let outer_ripple = sin(dist * 0.02 - time * 1.5) * outer * 10.0 * mouse_active;

    let tunneling = inner * sin(time * 5.0 + instance.seed * 6.28) * 15.0 * mouse_active;
    pos.z += interference + middle_wave + outer_ripple + tunneling;

    // Parallax: deeper particles move further with scroll
    pos.y += uniforms.scroll * 200.0 * ((pos.z + 50.0) / 100.0);

    let mv_position = uniforms.view * vec4<f32>(pos, 1.0);
    var clip_pos = uniforms.view_proj * vec4<f32>(pos, 1.0);
    let screen = clip_pos.xy / clip_pos.w;
    let edge_fade = (1.0 - smoothstep(0.85, 1.0, abs(screen.x)))
        * (1.0 - smoothstep(0.85, 1.0, abs(screen.y)));

    let scale_pulse = 1.0 + inner * 0.5 * sin(time * 4.0) * mouse_active;
    let final_scale = instance.scale * scale_pulse;
    let point_size = clamp(final_scale * (300.0 / -mv_position.z), 1.0, 8.0);

{geometry}

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.uv = quad * 0.5 + 0.5;
    out.distance = dist;
    out.opacity = edge_fade * (0.4 + instance.seed * 0.4);
    out.highlight = (1.0 - smoothstep(0.0, OUTER_RADIUS, dist)) * mouse_active;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
{coverage}
    if alpha < 0.01 {{
        discard;
    }}

    let highlight_mix = in.highlight * uniforms.mouse_active;
    let forest_mix = smoothstep(0.3, 0.6, in.highlight) * 0.3 * uniforms.mouse_active;

    var color = BASE_COLOR;
    color = mix(color, FOREST_COLOR, forest_mix);
    color = mix(color, HIGHLIGHT_COLOR, highlight_mix);

    let center_falloff = 1.0 - length(in.uv - vec2<f32>(0.5)) * 2.0;
    color += HIGHLIGHT_COLOR * highlight_mix * max(center_falloff, 0.0) * 0.5;

    let time = field_time();
    color *= sin(time * 2.0 + in.distance * 0.01) * 0.05 + 1.0;

    let final_alpha = clamp(alpha * in.opacity * (1.0 + highlight_mix * 0.5), 0.0, 1.0);
    return vec4<f32>(color, final_alpha);
}}
"#,
        utils = all_utils_wgsl(),
        inner = INNER_RADIUS,
        middle = MIDDLE_RADIUS,
        outer = OUTER_RADIUS,
        base = wgsl_vec3(palette::BASE),
        highlight = wgsl_vec3(palette::HIGHLIGHT),
        forest = wgsl_vec3(palette::FOREST),
        geometry = footprint.to_wgsl_geometry(),
        coverage = footprint.to_wgsl_coverage(),
    )
}

/// Full-screen ray overlay shader.
///
/// Draws one oversized triangle with no vertex buffers.
pub fn rays_shader() -> String {
    format!(
        r#"{uniforms}

const BASE_ANGLE: f32 = {base_angle:?};
const CORE_COLOR = {core};
const EDGE_COLOR = {edge};

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {{
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );

    var out: VertexOutput;
    let p = positions[vertex_index];
    out.clip_position = vec4<f32>(p, 0.0, 1.0);
    // Origin at the bottom-left corner
    out.uv = (p + 1.0) * 0.5;
    return out;
}}

fn ray(uv: vec2<f32>, source: vec2<f32>, angle: f32, width: f32, falloff: f32) -> f32 {{
    let dir = vec2<f32>(cos(angle), sin(angle));
    let to_pixel = uv - source;

    let along = dot(to_pixel, dir);
    if along < 0.0 {{
        return 0.0;
    }}

    let perp = abs(dot(to_pixel, vec2<f32>(-dir.y, dir.x)));
    let w = width * (1.0 + along * 0.5);
    let intensity = 1.0 - smoothstep(w * 0.3, w, perp);
    return intensity * exp(-along * falloff);
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let aspect = uniforms.resolution.x / max(uniforms.resolution.y, 1.0);
    let uv = vec2<f32>(in.uv.x * aspect, in.uv.y);
    let time = field_time();
    let source = vec2<f32>({source_x:?} * aspect, {source_y:?});

{accumulate}
    let ray_color = mix(EDGE_COLOR, CORE_COLOR, smoothstep(0.0, 0.5, rays));

    let glow = pow(max(1.0 - length(in.uv - vec2<f32>({glow_x:?}, {glow_y:?})) * 1.2, 0.0), 3.0) * 0.15;
    let total = clamp(rays * 0.15 + glow, 0.0, {max_intensity:?});

    return vec4<f32>(ray_color, total);
}}
"#,
        uniforms = UNIFORMS_WGSL,
        base_angle = rays::BASE_ANGLE,
        core = wgsl_vec3(rays::CORE_COLOR),
        edge = wgsl_vec3(rays::EDGE_COLOR),
        source_x = rays::SOURCE.x,
        source_y = rays::SOURCE.y,
        accumulate = rays::to_wgsl_accumulation(),
        glow_x = rays::GLOW_CENTER.x,
        glow_y = rays::GLOW_CENTER.y,
        max_intensity = rays::MAX_INTENSITY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_point_shader_is_valid() {
        let src = particle_shader(Footprint::Point);
        assert!(src.contains("discard"));
        validate_wgsl(&src).expect("point shader should be valid");
    }

    #[test]
    fn test_line_shader_is_valid() {
        let src = particle_shader(Footprint::Line);
        assert!(src.contains("instance.angle"));
        validate_wgsl(&src).expect("line shader should be valid");
    }

    #[test]
    fn test_rays_shader_is_valid() {
        validate_wgsl(&rays_shader()).expect("rays shader should be valid");
    }

    #[test]
    fn test_ring_radii_are_inlined() {
        let src = particle_shader(Footprint::Point);
        assert!(src.contains("const INNER_RADIUS: f32 = 80.0;"));
        assert!(src.contains("const OUTER_RADIUS: f32 = 250.0;"));
    }
}
