//! # Quantum Field
//!
//! A GPU-rendered ambient backdrop: a jittered grid of particles whose depth
//! ripples with fractal noise, reacts to the pointer with interference
//! rings and drifts with page scroll, over a layer of soft light rays.
//!
//! ## Quick Start
//!
//! ```ignore
//! use quantum_field::prelude::*;
//!
//! fn main() -> Result<(), FieldError> {
//!     env_logger::init();
//!     ParticleField::new(FieldConfig::default()).run()
//! }
//! ```
//!
//! ## Pipeline
//!
//! Each frame flows through four stages:
//!
//! 1. **Signals** ([`input`]) - pointer, scroll, viewport and motion
//!    preference, each updated from window events.
//! 2. **Uniforms** ([`uniforms`]) - the signals folded into one
//!    [`UniformState`] with eased pointer activity and scroll velocity.
//! 3. **Grid** ([`grid`]) - particle anchors, generated once per viewport
//!    and device class and uploaded as an instance buffer.
//! 4. **Shading** ([`shaders`]) - the displacement and colour stages on the
//!    GPU, drawn over the ray overlay ([`rays`]).
//!
//! [`shading`] and [`rays::shade`] compute the same values on the CPU.
//!
//! ## Footprints
//!
//! Particles are drawn as round point sprites (the default) or as thin
//! oriented lines. See [`Footprint`].
//!
//! ## Reduced motion
//!
//! With reduced motion on, animation time stops and the particle count drops
//! to [`FieldConfig::reduced_motion_particle_count`]. The preference is read
//! from the `QUANTUM_FIELD_REDUCED_MOTION` environment variable and can be
//! toggled at runtime.
//!
//! ## Fallback
//!
//! When no GPU adapter is available the mount degrades to a
//! [`StaticGradient`] instead of failing.

pub mod config;
pub mod error;
pub mod field;
pub mod gpu;
pub mod grid;
pub mod input;
pub mod rays;
pub mod shader_utils;
pub mod shaders;
pub mod shading;
pub mod time;
pub mod uniforms;
pub mod visuals;

pub use bytemuck;
pub use config::FieldConfig;
pub use error::{ConfigError, FieldError, GpuError};
pub use field::{Backdrop, ParticleField, Renderer};
pub use glam::{Vec2, Vec3, Vec4};
pub use gpu::Camera;
pub use grid::{generate_grid, particle_budget, GridLayout, Particle, ParticleGrid};
pub use input::{CapabilityProbe, FrameInputs, MotionPreference, Signals, Viewport};
pub use uniforms::{GpuUniforms, UniformState};
pub use visuals::{Footprint, StaticGradient};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use quantum_field::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::FieldConfig;
    pub use crate::error::FieldError;
    pub use crate::field::{Backdrop, ParticleField, Renderer};
    pub use crate::gpu::Camera;
    pub use crate::input::{MotionPreference, Viewport};
    pub use crate::time::FrameClock;
    pub use crate::visuals::{Footprint, StaticGradient};
    pub use crate::{Vec2, Vec3, Vec4};
}
