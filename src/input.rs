//! Signal providers feeding the uniform pipeline.
//!
//! Each provider owns its own state and is written by window events (or by
//! its own per-tick smoothing). The uniform pipeline reads a snapshot of all
//! of them once per rendered frame through [`Signals::snapshot`].
//!
//! # Usage
//!
//! ```ignore
//! let mut signals = Signals::new(&config, viewport, MotionPreference::from_env());
//!
//! // From the event loop:
//! signals.handle_event(&event);
//!
//! // Once per animation tick, independent of rendering:
//! signals.tick();
//!
//! // Once per rendered frame:
//! let inputs = signals.snapshot();
//! ```

use glam::Vec2;
use winit::event::{MouseScrollDelta, Touch, TouchPhase, WindowEvent};

use crate::config::FieldConfig;

/// Viewport width (logical pixels) below which a device counts as mobile.
pub const MOBILE_BREAKPOINT: f32 = 768.0;
/// Device pixel ratio below which a display counts as low density.
pub const LOW_DPI_THRESHOLD: f32 = 1.5;
/// Upper bound on the pixel ratio handed to the shaders.
pub const MAX_PIXEL_RATIO: f32 = 2.0;
/// Pixels scrolled per wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

/// Viewport dimensions in logical pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Build from a physical window size and scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let dpr = scale_factor.max(f64::EPSILON) as f32;
        Self::new(width as f32 / dpr, height as f32 / dpr, dpr)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn is_mobile(&self) -> bool {
        self.width < MOBILE_BREAKPOINT
    }

    pub fn is_low_dpi(&self) -> bool {
        self.device_pixel_ratio < LOW_DPI_THRESHOLD
    }

    /// Zero or negative area; nothing can be laid out or rendered.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Pixel ratio capped for GPU cost.
    pub fn pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio.min(MAX_PIXEL_RATIO)
    }

    /// Framebuffer resolution in physical pixels.
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * self.device_pixel_ratio
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

/// Smoothed pointer position in normalized device coordinates.
///
/// Raw positions from mouse or single-touch input become a *target*; every
/// [`tick`](PointerTracker::tick) moves the reported position a fixed fraction
/// toward it.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    smoothing: f32,
    target: Vec2,
    current: Vec2,
    target_client: Vec2,
    current_client: Vec2,
    active: bool,
    attached: bool,
    /// Finger that drives the pointer while any touch is down.
    touch_id: Option<u64>,
}

impl PointerTracker {
    pub fn new(smoothing: f32) -> Self {
        Self {
            smoothing,
            target: Vec2::ZERO,
            current: Vec2::ZERO,
            target_client: Vec2::ZERO,
            current_client: Vec2::ZERO,
            active: false,
            attached: true,
            touch_id: None,
        }
    }

    /// Pointer moved to logical pixel position `(x, y)` within `viewport`.
    pub fn on_moved(&mut self, x: f32, y: f32, viewport: &Viewport) {
        if !self.attached || viewport.is_degenerate() {
            return;
        }
        self.target = Vec2::new(
            (x / viewport.width) * 2.0 - 1.0,
            -(y / viewport.height) * 2.0 + 1.0, // Y up
        );
        self.target_client = Vec2::new(x, y);
    }

    pub fn on_entered(&mut self) {
        if self.attached {
            self.active = true;
        }
    }

    pub fn on_left(&mut self) {
        if self.attached {
            self.active = false;
        }
    }

    /// Touch `id` started or moved. The first finger down claims the
    /// pointer; other fingers are ignored until it lifts.
    pub fn on_touch_moved(&mut self, id: u64, x: f32, y: f32, viewport: &Viewport) {
        if !self.attached {
            return;
        }
        match self.touch_id {
            Some(tracked) if tracked != id => return,
            _ => self.touch_id = Some(id),
        }
        self.on_moved(x, y, viewport);
        self.on_entered();
    }

    /// Touch `id` ended or was cancelled.
    pub fn on_touch_ended(&mut self, id: u64) {
        if self.touch_id == Some(id) {
            self.touch_id = None;
            self.on_left();
        }
    }

    /// Advance smoothing by one animation tick.
    pub fn tick(&mut self) {
        if !self.attached {
            return;
        }
        self.current += (self.target - self.current) * self.smoothing;
        self.current_client += (self.target_client - self.current_client) * self.smoothing;
    }

    /// Stop reacting to events and ticks.
    pub fn detach(&mut self) {
        self.attached = false;
        self.active = false;
        self.touch_id = None;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Smoothed position in [-1, 1] x [-1, 1].
    pub fn position(&self) -> Vec2 {
        self.current
    }

    /// Smoothed position in logical pixels.
    pub fn client_position(&self) -> Vec2 {
        self.current_client
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Page scroll offset and the "scrolled past threshold" flag.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    threshold: f32,
    scroll_x: f32,
    scroll_y: f32,
    is_scrolled: bool,
    page_height: f32,
    attached: bool,
}

impl ScrollTracker {
    pub fn new(threshold: f32) -> Self {
        let mut tracker = Self {
            threshold,
            scroll_x: 0.0,
            scroll_y: 0.0,
            is_scrolled: false,
            page_height: 0.0,
            attached: true,
        };
        tracker.set_scroll(0.0, 0.0);
        tracker
    }

    /// Record a new scroll offset, recomputing the threshold flag.
    pub fn set_scroll(&mut self, y: f32, x: f32) {
        if !self.attached {
            return;
        }
        self.scroll_y = y;
        self.scroll_x = x;
        self.is_scrolled = y > self.threshold;
    }

    /// Total document height in logical pixels.
    pub fn set_page_height(&mut self, height: f32) {
        self.page_height = height.max(0.0);
    }

    /// Distance the page can scroll for a viewport of height `viewport_height`.
    pub fn scrollable_height(&self, viewport_height: f32) -> f32 {
        (self.page_height - viewport_height).max(0.0)
    }

    /// Scroll by `delta` pixels, staying within the scrollable range.
    pub fn scroll_by(&mut self, delta: f32, viewport_height: f32) {
        let max = self.scrollable_height(viewport_height);
        let y = (self.scroll_y + delta).clamp(0.0, max);
        self.set_scroll(y, self.scroll_x);
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn scroll_x(&self) -> f32 {
        self.scroll_x
    }

    pub fn is_scrolled(&self) -> bool {
        self.is_scrolled
    }

    pub fn page_height(&self) -> f32 {
        self.page_height
    }
}

/// The environment's reduced-motion accessibility preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionPreference {
    reduced: bool,
}

impl MotionPreference {
    /// Environment variable consulted by [`MotionPreference::from_env`].
    pub const ENV_VAR: &'static str = "QUANTUM_FIELD_REDUCED_MOTION";

    pub fn new(reduced: bool) -> Self {
        Self { reduced }
    }

    /// Read the preference from [`Self::ENV_VAR`] (`1` or `true`).
    pub fn from_env() -> Self {
        let reduced = std::env::var(Self::ENV_VAR)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self { reduced }
    }

    pub fn is_reduced(&self) -> bool {
        self.reduced
    }

    pub fn set_reduced(&mut self, reduced: bool) {
        self.reduced = reduced;
    }
}

/// Detects whether the GPU rendering path can be used.
pub trait CapabilityProbe {
    fn rendering_available(&self) -> bool;
}

impl CapabilityProbe for bool {
    fn rendering_available(&self) -> bool {
        *self
    }
}

/// Everything the uniform pipeline reads in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    pub mouse: Vec2,
    pub pointer_active: bool,
    pub scroll_y: f32,
    pub scrollable_height: f32,
    pub viewport: Viewport,
    pub reduced_motion: bool,
}

impl Default for FrameInputs {
    fn default() -> Self {
        Self {
            mouse: Vec2::ZERO,
            pointer_active: false,
            scroll_y: 0.0,
            scrollable_height: 0.0,
            viewport: Viewport::default(),
            reduced_motion: false,
        }
    }
}

/// All signal providers for one mounted field.
#[derive(Debug, Clone)]
pub struct Signals {
    pub pointer: PointerTracker,
    pub scroll: ScrollTracker,
    pub motion: MotionPreference,
    viewport: Viewport,
    page_height_screens: f32,
}

impl Signals {
    pub fn new(config: &FieldConfig, viewport: Viewport, motion: MotionPreference) -> Self {
        let mut scroll = ScrollTracker::new(config.scroll_threshold);
        scroll.set_page_height(viewport.height * config.page_height_screens);
        Self {
            pointer: PointerTracker::new(config.pointer_smoothing),
            scroll,
            motion,
            viewport,
            page_height_screens: config.page_height_screens,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Update the viewport; the virtual page keeps its length in screens.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.scroll.set_page_height(viewport.height * self.page_height_screens);
        let max = self.scroll.scrollable_height(viewport.height);
        if self.scroll.scroll_y() > max {
            self.scroll.set_scroll(max, self.scroll.scroll_x());
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let dpr = self.viewport.device_pixel_ratio;
                self.pointer
                    .on_moved(position.x as f32 / dpr, position.y as f32 / dpr, &self.viewport);
                // Some platforms skip CursorEntered for a window opened under the cursor
                self.pointer.on_entered();
            }
            WindowEvent::CursorEntered { .. } => self.pointer.on_entered(),
            WindowEvent::CursorLeft { .. } => self.pointer.on_left(),
            WindowEvent::Touch(Touch { phase, location, id, .. }) => match phase {
                TouchPhase::Started | TouchPhase::Moved => {
                    let dpr = self.viewport.device_pixel_ratio;
                    self.pointer.on_touch_moved(
                        *id,
                        location.x as f32 / dpr,
                        location.y as f32 / dpr,
                        &self.viewport,
                    );
                }
                TouchPhase::Ended | TouchPhase::Cancelled => self.pointer.on_touch_ended(*id),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let pixels = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * PIXELS_PER_LINE,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / self.viewport.device_pixel_ratio,
                };
                // Wheel up scrolls toward the top of the page
                self.scroll.scroll_by(-pixels, self.viewport.height);
            }
            _ => {}
        }
    }

    /// One animation tick of the providers' own smoothing.
    pub fn tick(&mut self) {
        self.pointer.tick();
    }

    /// Current values of every provider.
    pub fn snapshot(&self) -> FrameInputs {
        FrameInputs {
            mouse: self.pointer.position(),
            pointer_active: self.pointer.is_active(),
            scroll_y: self.scroll.scroll_y(),
            scrollable_height: self.scroll.scrollable_height(self.viewport.height),
            viewport: self.viewport,
            reduced_motion: self.motion.is_reduced(),
        }
    }

    /// Tear down: no further events or ticks are applied.
    pub fn detach(&mut self) {
        self.pointer.detach();
        self.scroll.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_ndc_inverts_y() {
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        let mut pointer = PointerTracker::new(1.0);
        pointer.on_moved(0.0, 0.0, &viewport);
        pointer.tick();
        assert_eq!(pointer.position(), Vec2::new(-1.0, 1.0));

        pointer.on_moved(400.0, 300.0, &viewport);
        pointer.tick();
        assert!(pointer.position().length() < 1e-6);
    }

    #[test]
    fn test_pointer_smoothing_lags_target() {
        let viewport = Viewport::new(100.0, 100.0, 1.0);
        let mut pointer = PointerTracker::new(0.1);
        pointer.on_moved(100.0, 50.0, &viewport);
        pointer.tick();
        assert!((pointer.position().x - 0.1).abs() < 1e-6);
        for _ in 0..200 {
            pointer.tick();
        }
        assert!((pointer.position().x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_pointer_detach_ignores_events() {
        let viewport = Viewport::new(100.0, 100.0, 1.0);
        let mut pointer = PointerTracker::new(0.5);
        pointer.on_entered();
        pointer.detach();
        assert!(!pointer.is_active());

        pointer.on_moved(100.0, 0.0, &viewport);
        pointer.on_entered();
        pointer.tick();
        assert!(!pointer.is_active());
        assert_eq!(pointer.position(), Vec2::ZERO);
    }

    #[test]
    fn test_touch_activates_and_releases() {
        let viewport = Viewport::new(100.0, 100.0, 1.0);
        let mut pointer = PointerTracker::new(0.1);
        pointer.on_touch_moved(0, 10.0, 10.0, &viewport);
        assert!(pointer.is_active());
        pointer.on_touch_ended(0);
        assert!(!pointer.is_active());
    }

    #[test]
    fn test_first_touch_owns_pointer() {
        let viewport = Viewport::new(100.0, 100.0, 1.0);
        let mut pointer = PointerTracker::new(1.0);

        pointer.on_touch_moved(7, 0.0, 0.0, &viewport);
        pointer.on_touch_moved(8, 100.0, 100.0, &viewport);
        pointer.tick();
        assert_eq!(pointer.position(), Vec2::new(-1.0, 1.0));

        // second finger lifting leaves the first one in control
        pointer.on_touch_ended(8);
        assert!(pointer.is_active());

        pointer.on_touch_ended(7);
        assert!(!pointer.is_active());

        // with the first finger gone, the next touch takes over
        pointer.on_touch_moved(8, 100.0, 100.0, &viewport);
        pointer.tick();
        assert!(pointer.is_active());
        assert_eq!(pointer.position(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_scroll_threshold() {
        let mut scroll = ScrollTracker::new(60.0);
        assert!(!scroll.is_scrolled());
        scroll.set_scroll(60.0, 0.0);
        assert!(!scroll.is_scrolled());
        scroll.set_scroll(61.0, 0.0);
        assert!(scroll.is_scrolled());
    }

    #[test]
    fn test_scroll_by_clamps_to_page() {
        let mut scroll = ScrollTracker::new(60.0);
        scroll.set_page_height(2000.0);
        scroll.scroll_by(5000.0, 800.0);
        assert_eq!(scroll.scroll_y(), 1200.0);
        scroll.scroll_by(-9000.0, 800.0);
        assert_eq!(scroll.scroll_y(), 0.0);
    }

    #[test]
    fn test_viewport_classification() {
        let phone = Viewport::new(390.0, 844.0, 3.0);
        assert!(phone.is_mobile());
        assert!(!phone.is_low_dpi());
        assert_eq!(phone.pixel_ratio(), 2.0);

        let desktop = Viewport::from_physical(1920, 1080, 1.0);
        assert!(!desktop.is_mobile());
        assert!(desktop.is_low_dpi());
        assert_eq!(desktop.resolution(), Vec2::new(1920.0, 1080.0));

        assert!(Viewport::new(0.0, 100.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_snapshot_reflects_providers() {
        let config = FieldConfig::default();
        let viewport = Viewport::new(1000.0, 500.0, 1.0);
        let mut signals = Signals::new(&config, viewport, MotionPreference::new(true));
        signals.scroll.set_scroll(250.0, 0.0);
        signals.pointer.on_entered();

        let inputs = signals.snapshot();
        assert!(inputs.reduced_motion);
        assert!(inputs.pointer_active);
        assert_eq!(inputs.scroll_y, 250.0);
        assert_eq!(inputs.scrollable_height, 500.0 * config.page_height_screens - 500.0);
    }
}
