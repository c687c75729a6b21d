//! Frame timing for the render loop.
//!
//! [`FrameClock`] measures the wall-clock delta between rendered frames. It
//! does not own the animation time; the uniform pipeline accumulates the
//! deltas and decides whether to advance (see reduced motion).
//!
//! # Example
//!
//! ```ignore
//! use quantum_field::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // Once per redraw:
//! let dt = clock.tick();
//! uniforms.advance(&signals.snapshot(), dt);
//! ```

use std::time::{Duration, Instant};

/// Largest delta a single frame may report, in seconds.
///
/// A window that was hidden or suspended resumes with one bounded step
/// instead of a jump of however long it was away.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Wall-clock frame timing.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    /// Time since last frame in seconds, after clamping.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

/// Clamp a measured frame delta into `[0, MAX_FRAME_DELTA]`.
#[inline]
pub fn clamp_delta(raw: f32) -> f32 {
    raw.clamp(0.0, MAX_FRAME_DELTA)
}

impl FrameClock {
    /// Create a clock whose first tick measures from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Measure one frame. Returns the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = clamp_delta(raw_delta);
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            log::trace!("{:.1} fps", self.fps);
        }

        self.delta_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
