//! Fixed perspective camera looking down the -Z axis at the particle plane.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera for the particle field.
///
/// The camera sits on the +Z axis at `distance` and looks at the origin, so
/// the particle plane (z = 0) fills the view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Distance from the particle plane.
    pub distance: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl Camera {
    /// Create a camera with the default backdrop framing.
    pub fn new() -> Self {
        Self {
            fov_degrees: 75.0,
            distance: 500.0,
            near: 1.0,
            far: 2000.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    /// Projection matrix for the given viewport aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// Combined view-projection matrix.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// World-space height visible at z = 0.
    pub fn visible_height(&self) -> f32 {
        2.0 * (self.fov_degrees.to_radians() / 2.0).tan() * self.distance
    }

    /// World-space width visible at z = 0 for the given aspect ratio.
    pub fn visible_width(&self, aspect: f32) -> f32 {
        self.visible_height() * aspect
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_height_matches_fov() {
        let camera = Camera {
            fov_degrees: 90.0,
            distance: 100.0,
            ..Camera::new()
        };
        // tan(45°) = 1, so the visible height is twice the distance
        assert!((camera.visible_height() - 200.0).abs() < 1e-3);
        assert!((camera.visible_width(2.0) - 400.0).abs() < 1e-2);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let camera = Camera::new();
        let clip = camera.view_proj(16.0 / 9.0) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_visible_edge_projects_to_ndc_one() {
        let camera = Camera::new();
        let aspect = 1024.0 / 768.0;
        let half_h = camera.visible_height() / 2.0;
        let half_w = camera.visible_width(aspect) / 2.0;
        let clip = camera.view_proj(aspect) * glam::Vec4::new(half_w, half_h, 0.0, 1.0);
        assert!((clip.x / clip.w - 1.0).abs() < 1e-4);
        assert!((clip.y / clip.w - 1.0).abs() < 1e-4);
    }
}
