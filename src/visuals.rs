//! Visual configuration for the particle field.
//!
//! This module holds what decides how particles *look*, separate from how
//! they move: the footprint shape each particle covers, the colour palette,
//! the blend mode, and the static gradient used when no GPU is available.
//!
//! # Footprints
//!
//! ```ignore
//! let config = FieldConfig::default().with_footprint(Footprint::Line);
//! ```
//!
//! Both footprints share the grid generator and the displacement stage; they
//! differ only in instance geometry and in the coverage test of the colour
//! stage.

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Length of a line particle in world units (before scale).
pub const LINE_LENGTH: f32 = 6.0;
/// Width of a line particle in world units (before scale).
pub const LINE_WIDTH: f32 = 0.8;

/// Shape covered by a single particle.
///
/// All footprints use the UV coordinate system where (0, 0) is one corner of
/// the particle quad and (1, 1) the opposite one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Footprint {
    /// Camera-facing round sprite sized in pixels (default).
    #[default]
    Point,
    /// Thin world-space rectangle oriented by the particle angle.
    Line,
}

impl Footprint {
    /// Whether generated particles carry an orientation angle.
    pub fn is_oriented(&self) -> bool {
        matches!(self, Footprint::Line)
    }

    /// The other footprint, for toggling at runtime.
    pub fn toggled(&self) -> Self {
        match self {
            Footprint::Point => Footprint::Line,
            Footprint::Line => Footprint::Point,
        }
    }

    /// Soft coverage of the footprint at `uv`.
    ///
    /// Returns 0.0 for any point outside the footprint. Mirrors
    /// [`Footprint::to_wgsl_coverage`].
    pub fn coverage(&self, uv: Vec2) -> f32 {
        match self {
            Footprint::Point => {
                let dist = (uv - Vec2::splat(0.5)).length() * 2.0;
                if dist > 1.0 {
                    return 0.0;
                }
                1.0 - smoothstep(0.5, 1.0, dist)
            }
            Footprint::Line => {
                let edge_x = 1.0 - smoothstep(0.3, 0.5, (uv.x - 0.5).abs());
                let edge_y = 1.0 - smoothstep(0.35, 0.5, (uv.y - 0.5).abs());
                edge_x * edge_y
            }
        }
    }

    /// WGSL statements computing `alpha` from `in.uv`, discarding outside pixels.
    pub fn to_wgsl_coverage(&self) -> &'static str {
        match self {
            Footprint::Point => r#"    let dist = length(in.uv - vec2<f32>(0.5)) * 2.0;
    if dist > 1.0 {
        discard;
    }
    let alpha = 1.0 - smoothstep(0.5, 1.0, dist);"#,

            Footprint::Line => r#"    // x runs across the line, y along it
    let edge_x = 1.0 - smoothstep(0.3, 0.5, abs(in.uv.x - 0.5));
    let edge_y = 1.0 - smoothstep(0.35, 0.5, abs(in.uv.y - 0.5));
    let alpha = edge_x * edge_y;"#,
        }
    }

    /// WGSL statements placing the quad corner `quad` (in [-1, 1]) around the
    /// displaced particle.
    ///
    /// Inputs in scope: `pos` (displaced world position), `clip_pos`,
    /// `final_scale`, `point_size`, `instance.angle`, `uniforms`.
    /// Output: reassigns `clip_pos`.
    pub fn to_wgsl_geometry(&self) -> String {
        match self {
            Footprint::Point => r#"    // Pixel-sized sprite: half extent in NDC is size / resolution
    let half_ndc = vec2<f32>(point_size) / max(uniforms.resolution, vec2<f32>(1.0));
    clip_pos = vec4<f32>(clip_pos.xy + quad * half_ndc * clip_pos.w, clip_pos.zw);"#
                .to_string(),

            Footprint::Line => format!(
                r#"    // World-space rectangle rotated by the particle angle
    let along = vec2<f32>(cos(instance.angle), sin(instance.angle));
    let across = vec2<f32>(-along.y, along.x);
    let offset = along * quad.y * {half_len:?} * final_scale + across * quad.x * {half_width:?} * final_scale;
    clip_pos = uniforms.view_proj * vec4<f32>(pos.xy + offset, pos.z, 1.0);"#,
                half_len = LINE_LENGTH * 0.5,
                half_width = LINE_WIDTH * 0.5,
            ),
        }
    }
}

/// Additive blending shared by the particle and ray passes. Overlapping
/// particles glow brighter; nothing is ever darkened.
pub const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Particle colours.
pub mod palette {
    use glam::Vec3;

    /// Cool silver-gray, rgb(180, 190, 200).
    pub const BASE: Vec3 = Vec3::new(0.71, 0.75, 0.78);
    /// Quantum cyan, rgb(64, 224, 208).
    pub const HIGHLIGHT: Vec3 = Vec3::new(0.25, 0.88, 0.82);
    /// Forest green, rgb(45, 106, 79).
    pub const FOREST: Vec3 = Vec3::new(0.18, 0.42, 0.31);

    /// Void deep, #050508.
    pub const VOID_DEEP: Vec3 = Vec3::new(5.0 / 255.0, 5.0 / 255.0, 8.0 / 255.0);
    /// Void surface, #0a0b0f.
    pub const VOID_SURFACE: Vec3 = Vec3::new(10.0 / 255.0, 11.0 / 255.0, 15.0 / 255.0);
}

/// GLSL-style smoothstep, also valid for reversed edges.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Radial tint of the static backdrop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialTint {
    /// Ellipse center in UV (origin top-left).
    pub center: Vec2,
    /// Straight RGB colour.
    pub color: Vec3,
    /// Alpha at the center, fading to zero at half the ellipse radius.
    pub alpha: f32,
}

impl RadialTint {
    fn alpha_at(&self, uv: Vec2) -> f32 {
        // Ellipse reaching the farthest corner, as a CSS radial gradient does
        let radii = Vec2::new(self.center.x.max(1.0 - self.center.x), self.center.y.max(1.0 - self.center.y))
            * std::f32::consts::SQRT_2;
        let d = ((uv - self.center) / radii).length();
        self.alpha * (1.0 - (d / 0.5).clamp(0.0, 1.0))
    }
}

/// Static two-stop gradient drawn when the GPU path is unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticGradient {
    /// Colour at the top edge.
    pub top: Vec3,
    /// Colour at the bottom edge.
    pub bottom: Vec3,
    /// Tints drawn over the gradient; earlier entries are on top.
    pub tints: Vec<RadialTint>,
}

impl Default for StaticGradient {
    fn default() -> Self {
        Self {
            top: palette::VOID_DEEP,
            bottom: palette::VOID_SURFACE,
            tints: vec![
                RadialTint {
                    center: Vec2::new(0.3, 0.4),
                    color: Vec3::new(64.0, 224.0, 208.0) / 255.0,
                    alpha: 0.05,
                },
                RadialTint {
                    center: Vec2::new(0.7, 0.6),
                    color: Vec3::new(45.0, 106.0, 79.0) / 255.0,
                    alpha: 0.05,
                },
            ],
        }
    }
}

impl StaticGradient {
    /// Opaque colour at `uv` (origin top-left, both axes in [0, 1]).
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let t = uv.y.clamp(0.0, 1.0);
        let mut color = self.top.lerp(self.bottom, t);
        for tint in self.tints.iter().rev() {
            let a = tint.alpha_at(uv);
            color = color.lerp(tint.color, a);
        }
        color.extend(1.0)
    }

    /// Render the gradient into an image of the given size.
    pub fn rasterize(&self, width: u32, height: u32) -> RgbaImage {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        RgbaImage::from_fn(width, height, |x, y| {
            let uv = Vec2::new((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
            let c = self.sample(uv);
            Rgba([
                (c.x * 255.0).round() as u8,
                (c.y * 255.0).round() as u8,
                (c.z * 255.0).round() as u8,
                255,
            ])
        })
    }
}
