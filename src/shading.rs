//! CPU reference for the particle shader.
//!
//! These functions compute the same values as the WGSL emitted by
//! [`crate::shaders::particle_shader`], one particle or one fragment at a
//! time. The renderer never calls them; they exist so the shading rules can
//! be checked and benchmarked without a GPU.

use glam::{Vec2, Vec3, Vec4};

use crate::gpu::Camera;
use crate::grid::Particle;
use crate::shaders::{INNER_RADIUS, MIDDLE_RADIUS, OUTER_RADIUS};
use crate::uniforms::UniformState;
use crate::visuals::{palette, smoothstep, Footprint};

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + Vec4::ONE) * x)
}

fn taylor_inv_sqrt(r: Vec4) -> Vec4 {
    Vec4::splat(1.792_842_9) - r * 0.853_734_7
}

/// GLSL `step(edge, x)` per component.
fn step3(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::select(x.cmplt(edge), Vec3::ZERO, Vec3::ONE)
}

fn step4(edge: Vec4, x: Vec4) -> Vec4 {
    Vec4::select(x.cmplt(edge), Vec4::ZERO, Vec4::ONE)
}

/// 3D simplex noise, roughly in [-1, 1].
pub fn snoise(v: Vec3) -> f32 {
    const C: Vec2 = Vec2::new(1.0 / 6.0, 1.0 / 3.0);

    // First corner
    let mut i = (v + Vec3::splat(v.dot(Vec3::splat(C.y)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(C.x)));

    // Other corners
    let g = step3(Vec3::new(x0.y, x0.z, x0.x), x0);
    let l = Vec3::ONE - g;
    let l_zxy = Vec3::new(l.z, l.x, l.y);
    let i1 = g.min(l_zxy);
    let i2 = g.max(l_zxy);

    let x1 = x0 - i1 + Vec3::splat(C.x);
    let x2 = x0 - i2 + Vec3::splat(C.y);
    let x3 = x0 - Vec3::splat(0.5);

    // Permutations
    i = mod289_3(i);
    let p = permute(
        permute(
            permute(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + Vec4::splat(i.y)
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + Vec4::splat(i.x)
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients
    let n_ = 0.142_857_15_f32;
    let ns = Vec3::new(2.0 * n_, 0.5 * n_ - 1.0, n_);

    let j = p - (p * ns.z * ns.z).floor() * 49.0;

    let x_ = (j * ns.z).floor();
    let y_ = (j - x_ * 7.0).floor();

    let x = x_ * ns.x + Vec4::splat(ns.y);
    let y = y_ * ns.x + Vec4::splat(ns.y);
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + Vec4::ONE;
    let s1 = b1.floor() * 2.0 + Vec4::ONE;
    let sh = -step4(h, Vec4::ZERO);

    let a0 = Vec4::new(b0.x, b0.z, b0.y, b0.w) + Vec4::new(s0.x, s0.z, s0.y, s0.w) * Vec4::new(sh.x, sh.x, sh.y, sh.y);
    let a1 = Vec4::new(b1.x, b1.z, b1.y, b1.w) + Vec4::new(s1.x, s1.z, s1.y, s1.w) * Vec4::new(sh.z, sh.z, sh.w, sh.w);

    let mut p0 = Vec3::new(a0.x, a0.y, h.x);
    let mut p1 = Vec3::new(a0.z, a0.w, h.y);
    let mut p2 = Vec3::new(a1.x, a1.y, h.z);
    let mut p3 = Vec3::new(a1.z, a1.w, h.w);

    let norm = taylor_inv_sqrt(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    let m = (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3))).max(Vec4::ZERO);
    let m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

/// Three octaves of [`snoise`], halving amplitude and doubling frequency.
pub fn fbm(p: Vec3) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    for _ in 0..3 {
        value += amplitude * snoise(p * frequency);
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    value
}

/// Weights of the three interference rings at distance `dist`.
pub fn ring_influence(dist: f32) -> (f32, f32, f32) {
    let inner = 1.0 - smoothstep(0.0, INNER_RADIUS, dist);
    let middle = smoothstep(INNER_RADIUS, MIDDLE_RADIUS, dist) * (1.0 - smoothstep(MIDDLE_RADIUS, OUTER_RADIUS, dist));
    let outer = smoothstep(MIDDLE_RADIUS, OUTER_RADIUS, dist) * (1.0 - smoothstep(OUTER_RADIUS, OUTER_RADIUS + 100.0, dist));
    (inner, middle, outer)
}

/// Z displacement from the pointer rings and tunneling jitter.
///
/// Every term is scaled by `mouse_active`, so the sum is zero when the
/// pointer is inactive.
pub fn mouse_interference(dist: f32, seed: f32, time: f32, mouse_active: f32) -> f32 {
    let (inner, middle, outer) = ring_influence(dist);

    let interference = (dist * 0.05 - time * 3.0).sin() * inner * 30.0 * mouse_active;
    let middle_wave = (dist * 0.03 - time * 2.0).sin() * middle * 20.0 * mouse_active;
    let outer_ripple = (dist * 0.02 - time * 1.5).sin() * outer * 10.0 * mouse_active;
    let tunneling = inner * (time * 5.0 + seed * 6.28).sin() * 15.0 * mouse_active;

    interference + middle_wave + outer_ripple + tunneling
}

/// Per-vertex outputs of the displacement stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displaced {
    /// World position after waves, rings and parallax.
    pub position: Vec3,
    /// Clip-space position of the particle center.
    pub clip: Vec4,
    /// Distance to the pointer in world units.
    pub distance: f32,
    /// Pointer highlight, 1 at the pointer and 0 beyond the outer ring.
    pub highlight: f32,
    /// Edge fade times per-particle opacity.
    pub opacity: f32,
    /// Scale including the pulse near the pointer.
    pub scale: f32,
    /// Sprite size in pixels (point footprint).
    pub point_size: f32,
}

impl Displaced {
    /// Values the colour stage interpolates.
    pub fn varyings(&self) -> Varyings {
        Varyings {
            distance: self.distance,
            opacity: self.opacity,
            highlight: self.highlight,
        }
    }
}

/// Displacement stage for one particle.
pub fn displace(particle: &Particle, state: &UniformState, camera: &Camera) -> Displaced {
    let mut pos = particle.position;
    let time = state.shader_time();
    let mouse_active = state.mouse_active;

    let wave_amplitude = 40.0 + state.scroll * 20.0 + state.scroll_velocity * 2.0;
    let wave = fbm(Vec3::new(pos.x * 0.015, pos.y * 0.015, time * 0.3)) * wave_amplitude;
    let wave2 = snoise(Vec3::new(pos.x * 0.008 + time * 0.1, pos.y * 0.008, time * 0.15)) * 25.0;
    pos.z += wave + wave2;

    let mouse_world = state.mouse * state.resolution * 0.5;
    let dist = (pos.truncate() - mouse_world).length();
    pos.z += mouse_interference(dist, particle.seed, time, mouse_active);

    pos.y += state.scroll * 200.0 * ((pos.z + 50.0) / 100.0);

    let aspect = state.aspect();
    let mv = camera.view_matrix() * pos.extend(1.0);
    let clip = camera.view_proj(aspect) * pos.extend(1.0);
    let screen = clip.truncate().truncate() / clip.w;
    let edge_fade = (1.0 - smoothstep(0.85, 1.0, screen.x.abs())) * (1.0 - smoothstep(0.85, 1.0, screen.y.abs()));

    let (inner, _, _) = ring_influence(dist);
    let scale = particle.scale * (1.0 + inner * 0.5 * (time * 4.0).sin() * mouse_active);
    let point_size = (scale * (300.0 / -mv.z)).clamp(1.0, 8.0);

    Displaced {
        position: pos,
        clip,
        distance: dist,
        highlight: (1.0 - smoothstep(0.0, OUTER_RADIUS, dist)) * mouse_active,
        opacity: edge_fade * (0.4 + particle.seed * 0.4),
        scale,
        point_size,
    }
}

/// Interpolated inputs of the colour stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varyings {
    pub distance: f32,
    pub opacity: f32,
    pub highlight: f32,
}

/// Colour stage for one fragment at quad coordinate `uv`.
///
/// Returns `None` where the fragment is discarded.
pub fn shade_fragment(footprint: Footprint, uv: Vec2, varyings: &Varyings, state: &UniformState) -> Option<Vec4> {
    let alpha = footprint.coverage(uv);
    if alpha < 0.01 {
        return None;
    }

    let highlight_mix = varyings.highlight * state.mouse_active;
    let forest_mix = smoothstep(0.3, 0.6, varyings.highlight) * 0.3 * state.mouse_active;

    let mut color = palette::BASE;
    color = color.lerp(palette::FOREST, forest_mix);
    color = color.lerp(palette::HIGHLIGHT, highlight_mix);

    let center_falloff = 1.0 - (uv - Vec2::splat(0.5)).length() * 2.0;
    color += palette::HIGHLIGHT * highlight_mix * center_falloff.max(0.0) * 0.5;

    let time = state.shader_time();
    color *= (time * 2.0 + varyings.distance * 0.01).sin() * 0.05 + 1.0;

    let final_alpha = (alpha * varyings.opacity * (1.0 + highlight_mix * 0.5)).clamp(0.0, 1.0);
    Some(color.extend(final_alpha))
}
