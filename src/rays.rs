//! Ambient light rays drawn behind the particle layer.
//!
//! A fixed set of soft stripes fan out from a source just beyond the upper
//! right corner. Each stripe widens with distance from the source and decays
//! exponentially along its length. Two of them drift slowly, and the whole
//! set pulses; both freeze under reduced motion.
//!
//! UV coordinates here have their origin at the bottom-left corner.
//! [`shade`] is the CPU reference for the fragment stage that
//! [`to_wgsl_accumulation`] emits.

use glam::{Vec2, Vec3, Vec4};

use crate::visuals::smoothstep;

/// Direction the rays point, roughly 225 degrees (down and to the left).
pub const BASE_ANGLE: f32 = 3.926;
/// Source position; x is multiplied by the aspect ratio.
pub const SOURCE: Vec2 = Vec2::new(0.9, 1.1);
/// Center of the glow around the source, in unscaled UV.
pub const GLOW_CENTER: Vec2 = Vec2::new(0.9, 1.0);
/// Ceiling on the overlay alpha.
pub const MAX_INTENSITY: f32 = 0.25;

/// Warm golden core, rgb(255, 200, 100).
pub const CORE_COLOR: Vec3 = Vec3::new(1.0, 0.78, 0.4);
/// Deeper amber edge, rgb(255, 160, 60).
pub const EDGE_COLOR: Vec3 = Vec3::new(1.0, 0.63, 0.24);

/// One static ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySpec {
    /// Offset from [`BASE_ANGLE`] in radians.
    pub angle_offset: f32,
    /// Half-width at the source, in UV units.
    pub width: f32,
    /// Exponential decay per UV unit along the ray.
    pub falloff: f32,
    /// Contribution to the accumulated intensity.
    pub weight: f32,
}

const fn spec(angle_offset: f32, width: f32, falloff: f32, weight: f32) -> RaySpec {
    RaySpec {
        angle_offset,
        width,
        falloff,
        weight,
    }
}

/// Five prominent rays followed by three wide soft ones.
pub const STATIC_RAYS: [RaySpec; 8] = [
    spec(-0.15, 0.025, 0.8, 1.0),
    spec(0.10, 0.020, 0.9, 0.8),
    spec(0.35, 0.018, 1.0, 0.6),
    spec(-0.40, 0.022, 0.85, 0.7),
    spec(0.60, 0.015, 1.1, 0.5),
    spec(0.05, 0.08, 0.5, 0.3),
    spec(-0.25, 0.10, 0.4, 0.25),
    spec(0.45, 0.07, 0.55, 0.2),
];

/// Intensity of a single ray at `uv`.
pub fn ray(uv: Vec2, source: Vec2, angle: f32, width: f32, falloff: f32) -> f32 {
    let dir = Vec2::new(angle.cos(), angle.sin());
    let to_pixel = uv - source;

    let along = to_pixel.dot(dir);
    if along < 0.0 {
        return 0.0;
    }

    let perp = to_pixel.dot(Vec2::new(-dir.y, dir.x)).abs();
    let w = width * (1.0 + along * 0.5);
    let intensity = 1.0 - smoothstep(w * 0.3, w, perp);

    intensity * (-along * falloff).exp()
}

/// Angular drift of the two moving rays.
pub fn drift(time: f32) -> f32 {
    (time * 0.15).sin() * 0.02
}

/// Global intensity pulse.
pub fn pulse(time: f32) -> f32 {
    1.0 + (time * 0.3).sin() * 0.08
}

/// Accumulated ray intensity at aspect-scaled `uv`, pulse included.
pub fn accumulate(uv: Vec2, aspect: f32, time: f32) -> f32 {
    let source = Vec2::new(SOURCE.x * aspect, SOURCE.y);

    let mut rays: f32 = STATIC_RAYS
        .iter()
        .map(|r| ray(uv, source, BASE_ANGLE + r.angle_offset, r.width, r.falloff) * r.weight)
        .sum();

    let d = drift(time);
    rays += ray(uv, source, BASE_ANGLE + d, 0.03, 0.7) * 0.4;
    rays += ray(uv, source, BASE_ANGLE + 0.25 - d * 0.5, 0.025, 0.75) * 0.35;

    rays * pulse(time)
}

/// Overlay colour and alpha at `uv` (origin bottom-left).
pub fn shade(uv: Vec2, time: f32, reduced_motion: bool, resolution: Vec2) -> Vec4 {
    let aspect = if resolution.y > 0.0 {
        resolution.x / resolution.y
    } else {
        1.0
    };
    let time = if reduced_motion { 0.0 } else { time };

    let rays = accumulate(Vec2::new(uv.x * aspect, uv.y), aspect, time);
    let color = EDGE_COLOR.lerp(CORE_COLOR, smoothstep(0.0, 0.5, rays));

    let glow = (1.0 - (uv - GLOW_CENTER).length() * 1.2).max(0.0).powi(3) * 0.15;
    let total = (rays * 0.15 + glow).clamp(0.0, MAX_INTENSITY);

    color.extend(total)
}

/// WGSL statements accumulating `rays` from `uv`, `source` and `time`.
pub fn to_wgsl_accumulation() -> String {
    let mut code = String::from("    var rays = 0.0;\n");
    for r in &STATIC_RAYS {
        code.push_str(&format!(
            "    rays += ray(uv, source, BASE_ANGLE + {:?}, {:?}, {:?}) * {:?};\n",
            r.angle_offset, r.width, r.falloff, r.weight
        ));
    }
    code.push_str(
        r#"    let drift = sin(time * 0.15) * 0.02;
    rays += ray(uv, source, BASE_ANGLE + drift, 0.03, 0.7) * 0.4;
    rays += ray(uv, source, BASE_ANGLE + 0.25 - drift * 0.5, 0.025, 0.75) * 0.35;
    rays *= 1.0 + sin(time * 0.3) * 0.08;
"#,
    );
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    const RES: Vec2 = Vec2::new(1920.0, 1080.0);

    #[test]
    fn test_ray_is_zero_behind_source() {
        // pointing down-left, so anything up-right of the source is behind it
        let source = Vec2::new(1.0, 1.0);
        assert_eq!(ray(Vec2::new(1.5, 1.5), source, BASE_ANGLE, 0.05, 0.8), 0.0);
        assert!(ray(Vec2::new(0.7, 0.7), source, BASE_ANGLE, 0.05, 0.8) > 0.0);
    }

    #[test]
    fn test_ray_decays_along_length() {
        let source = Vec2::ZERO;
        let near = ray(Vec2::new(0.1, 0.0), source, 0.0, 0.05, 0.8);
        let far = ray(Vec2::new(1.0, 0.0), source, 0.0, 0.05, 0.8);
        assert!(near > far);
    }

    #[test]
    fn test_intensity_never_exceeds_ceiling() {
        for y in 0..=20 {
            for x in 0..=20 {
                let uv = Vec2::new(x as f32 / 20.0, y as f32 / 20.0);
                for t in [0.0, 3.7, 41.0] {
                    let c = shade(uv, t, false, RES);
                    assert!(c.w >= 0.0 && c.w <= MAX_INTENSITY);
                }
            }
        }
    }

    #[test]
    fn test_reduced_motion_freezes_overlay() {
        let uv = Vec2::new(0.6, 0.7);
        let a = shade(uv, 1.0, true, RES);
        let b = shade(uv, 99.0, true, RES);
        assert_eq!(a, b);
        assert_eq!(a, shade(uv, 0.0, false, RES));
    }

    #[test]
    fn test_upper_right_brighter_than_lower_left() {
        let near_source = shade(Vec2::new(0.9, 0.95), 0.0, false, RES);
        let far_corner = shade(Vec2::new(0.02, 0.02), 0.0, false, RES);
        assert!(near_source.w > far_corner.w);
    }

    #[test]
    fn test_wgsl_lists_every_ray() {
        let code = to_wgsl_accumulation();
        assert_eq!(code.matches("rays += ray(").count(), STATIC_RAYS.len() + 2);
    }
}
