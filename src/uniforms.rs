//! Per-frame uniform state shared by the particle and ray passes.
//!
//! [`UniformState`] is the frame context: it is advanced exactly once per
//! rendered frame from a [`FrameInputs`] snapshot, then packed into
//! [`GpuUniforms`] and handed to the passes read-only.
//!
//! # Example
//!
//! ```ignore
//! let mut state = UniformState::new(viewport, motion.is_reduced());
//!
//! // In the render loop:
//! state.advance(&signals.snapshot(), clock.tick());
//! queue.write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&state.to_gpu(&camera)));
//! ```

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::gpu::Camera;
use crate::input::{FrameInputs, Viewport};

/// Rate used for every eased uniform.
pub const EASE_RATE: f32 = 0.1;

/// Lower bound on the scrollable height when normalizing scroll.
const SCROLL_EPSILON: f32 = 1e-3;

/// Single-pole filter step: move `current` a fraction `rate` toward `target`.
///
/// For `rate` in (0, 1] this never overshoots.
#[inline]
pub fn ease(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}

/// Uniform values for one mounted field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformState {
    /// Animation time in seconds. Held while reduced motion is active.
    pub time: f32,
    /// Smoothed pointer position in NDC.
    pub mouse: Vec2,
    /// Eased 0-1 pointer activity.
    pub mouse_active: f32,
    /// Fraction of the page scrolled.
    pub scroll: f32,
    /// Eased magnitude of recent scroll deltas, in logical pixels per frame.
    pub scroll_velocity: f32,
    /// Drawing buffer size in physical pixels.
    pub resolution: Vec2,
    /// Device pixel ratio, capped.
    pub pixel_ratio: f32,
    pub reduced_motion: bool,
    previous_scroll_y: f32,
}

impl UniformState {
    pub fn new(viewport: Viewport, reduced_motion: bool) -> Self {
        Self {
            time: 0.0,
            mouse: Vec2::ZERO,
            mouse_active: 0.0,
            scroll: 0.0,
            scroll_velocity: 0.0,
            resolution: viewport.resolution(),
            pixel_ratio: viewport.pixel_ratio(),
            reduced_motion,
            previous_scroll_y: 0.0,
        }
    }

    /// Fold one frame's signals into the uniforms.
    ///
    /// `dt` is the measured frame delta in seconds.
    pub fn advance(&mut self, inputs: &FrameInputs, dt: f32) {
        if !inputs.reduced_motion {
            self.time += dt.max(0.0);
        }

        self.mouse = inputs.mouse;

        let target_active = if inputs.pointer_active { 1.0 } else { 0.0 };
        self.mouse_active = ease(self.mouse_active, target_active, EASE_RATE);

        let scroll_delta = inputs.scroll_y - self.previous_scroll_y;
        self.scroll_velocity = ease(self.scroll_velocity, scroll_delta.abs(), EASE_RATE);
        self.previous_scroll_y = inputs.scroll_y;

        self.scroll = if inputs.scrollable_height > 0.0 {
            inputs.scroll_y / inputs.scrollable_height.max(SCROLL_EPSILON)
        } else {
            0.0
        };

        self.resolution = inputs.viewport.resolution();
        self.pixel_ratio = inputs.viewport.pixel_ratio();
        self.reduced_motion = inputs.reduced_motion;
    }

    /// Return to the mount-time state, keeping the viewport.
    pub fn reset(&mut self) {
        let resolution = self.resolution;
        let pixel_ratio = self.pixel_ratio;
        let reduced_motion = self.reduced_motion;
        *self = Self {
            resolution,
            pixel_ratio,
            reduced_motion,
            ..Self::new(Viewport::default(), reduced_motion)
        };
    }

    /// Time as the shaders see it: zero under reduced motion.
    pub fn shader_time(&self) -> f32 {
        if self.reduced_motion {
            0.0
        } else {
            self.time
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.resolution.y > 0.0 {
            self.resolution.x / self.resolution.y
        } else {
            1.0
        }
    }

    /// Pack for upload.
    pub fn to_gpu(&self, camera: &Camera) -> GpuUniforms {
        let aspect = self.aspect();
        GpuUniforms {
            view_proj: camera.view_proj(aspect).to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            mouse: self.mouse.to_array(),
            resolution: self.resolution.to_array(),
            time: self.time,
            mouse_active: self.mouse_active,
            scroll: self.scroll,
            scroll_velocity: self.scroll_velocity,
            pixel_ratio: self.pixel_ratio,
            reduced_motion: if self.reduced_motion { 1.0 } else { 0.0 },
            aspect,
            _pad: 0.0,
        }
    }
}

impl Default for UniformState {
    fn default() -> Self {
        Self::new(Viewport::default(), false)
    }
}

/// Uniform buffer contents. Matches `Uniforms` in [`crate::shader_utils::UNIFORMS_WGSL`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub mouse: [f32; 2],
    pub resolution: [f32; 2],
    pub time: f32,
    pub mouse_active: f32,
    pub scroll: f32,
    pub scroll_velocity: f32,
    pub pixel_ratio: f32,
    pub reduced_motion: f32,
    pub aspect: f32,
    pub _pad: f32,
}
