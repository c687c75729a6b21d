//! Field configuration.
//!
//! A [`FieldConfig`] is built in code with the `with_*` methods or loaded
//! from JSON. Missing JSON keys take their default values.
//!
//! ```ignore
//! let config = FieldConfig::from_json_str(r#"{ "base_particle_count": 8000, "footprint": "line" }"#)?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gpu::Camera;
use crate::visuals::Footprint;

/// Upper bound on either configured particle count.
pub const MAX_PARTICLE_COUNT: u32 = 1_000_000;

/// Configuration for one mounted particle field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Particle count before device scaling.
    pub base_particle_count: u32,
    /// Particle count used instead when reduced motion is preferred.
    pub reduced_motion_particle_count: u32,
    /// Halve the count on narrow (mobile) viewports.
    pub mobile_optimized: bool,
    /// Shape drawn for each particle.
    pub footprint: Footprint,
    /// Camera framing the particle plane.
    pub camera: Camera,
    /// Fraction of the remaining distance the pointer closes per tick.
    pub pointer_smoothing: f32,
    /// Scroll offset (logical pixels) past which the page counts as scrolled.
    pub scroll_threshold: f32,
    /// Draw the ambient light rays behind the particles.
    pub rays: bool,
    /// Length of the emulated page, in viewport heights.
    pub page_height_screens: f32,
    /// Make the host window transparent to pointer input.
    ///
    /// Off by default: a native window only sees the pointer while it takes
    /// pointer events, so with this on the layer gets no cursor events and
    /// the host must feed pointer signals to [`Renderer::handle_event`]
    /// itself. Turn it on when the field sits behind other windows that
    /// must stay interactive.
    ///
    /// [`Renderer::handle_event`]: crate::field::Renderer::handle_event
    pub click_through: bool,
    /// Seed for grid generation. Unseeded grids differ on every mount.
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            base_particle_count: 15_000,
            reduced_motion_particle_count: 5_000,
            mobile_optimized: true,
            footprint: Footprint::Point,
            camera: Camera::new(),
            pointer_smoothing: 0.08,
            scroll_threshold: 60.0,
            rays: true,
            page_height_screens: 4.0,
            click_through: false,
            seed: None,
        }
    }
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_particle_count(mut self, count: u32) -> Self {
        self.base_particle_count = count;
        self
    }

    pub fn with_reduced_motion_particle_count(mut self, count: u32) -> Self {
        self.reduced_motion_particle_count = count;
        self
    }

    pub fn with_mobile_optimized(mut self, enabled: bool) -> Self {
        self.mobile_optimized = enabled;
        self
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_pointer_smoothing(mut self, smoothing: f32) -> Self {
        self.pointer_smoothing = smoothing;
        self
    }

    pub fn with_rays(mut self, enabled: bool) -> Self {
        self.rays = enabled;
        self
    }

    pub fn with_click_through(mut self, enabled: bool) -> Self {
        self.click_through = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Base count for the current motion preference.
    pub fn base_count_for(&self, reduced_motion: bool) -> u32 {
        if reduced_motion {
            self.reduced_motion_particle_count
        } else {
            self.base_particle_count
        }
    }

    /// Parse a config from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: FieldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, count) in [
            ("base_particle_count", self.base_particle_count),
            ("reduced_motion_particle_count", self.reduced_motion_particle_count),
        ] {
            if count > MAX_PARTICLE_COUNT {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be at most {MAX_PARTICLE_COUNT}, got {count}"
                )));
            }
        }
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.distance must be positive, got {}",
                camera.distance
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if !(self.pointer_smoothing > 0.0 && self.pointer_smoothing <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "pointer_smoothing must be in (0, 1], got {}",
                self.pointer_smoothing
            )));
        }
        if !(self.page_height_screens >= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "page_height_screens must be at least 1, got {}",
                self.page_height_screens
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FieldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_particle_count, 15_000);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.camera.distance, 500.0);
        assert!(!config.click_through);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FieldConfig::from_json_str(
            r#"{ "base_particle_count": 8000, "footprint": "line", "camera": { "fov_degrees": 60.0 } }"#,
        )
        .expect("valid config");
        assert_eq!(config.base_particle_count, 8000);
        assert_eq!(config.footprint, Footprint::Line);
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.distance, 500.0);
        assert!(config.mobile_optimized);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = FieldConfig::from_json_str(r#"{ "pointer_smoothing": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = FieldConfig::from_json_str(r#"{ "camera": { "distance": -1.0 } }"#).unwrap_err();
        assert!(err.to_string().contains("camera.distance"));

        let err = FieldConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_oversized_counts() {
        let err = FieldConfig::from_json_str(r#"{ "base_particle_count": 20000000 }"#).unwrap_err();
        assert!(err.to_string().contains("base_particle_count"));

        let err = FieldConfig::default()
            .with_reduced_motion_particle_count(MAX_PARTICLE_COUNT + 1)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("reduced_motion_particle_count"));

        assert!(FieldConfig::default()
            .with_base_particle_count(MAX_PARTICLE_COUNT)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_reduced_motion_count() {
        let config = FieldConfig::default();
        assert_eq!(config.base_count_for(false), 15_000);
        assert_eq!(config.base_count_for(true), 5_000);
    }
}
