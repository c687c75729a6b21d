//! Mounting a particle field.
//!
//! [`ParticleField`] hosts a field in its own transparent window and blocks
//! until it closes. Hosts with their own event loop create a [`Backdrop`]
//! for their window instead and forward events to it.
//!
//! # Example
//!
//! ```ignore
//! use quantum_field::prelude::*;
//!
//! ParticleField::new(FieldConfig::default().with_footprint(Footprint::Line))
//!     .run()?;
//! ```
//!
//! # Controls
//!
//! | Input | Action |
//! |-------|--------|
//! | Mouse wheel | Scroll the virtual page |
//! | M | Toggle reduced motion |
//! | L | Toggle point / line footprint |
//! | Esc | Quit |
//!
//! # Pointer transparency
//!
//! The hosted window takes pointer events by default so the field can see
//! the cursor. With [`FieldConfig::click_through`] set, the window is
//! transparent to clicks and receives no cursor events; the embedding host
//! must then forward pointer events to [`Renderer::handle_event`] itself.

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::FieldConfig;
use crate::error::{FieldError, GpuError};
use crate::gpu::{AdapterProbe, GpuState};
use crate::grid::{fits_buffer, generate_grid, instance_bytes, particle_budget, GridKey};
use crate::input::{CapabilityProbe, MotionPreference, Signals, Viewport};
use crate::time::FrameClock;
use crate::uniforms::UniformState;
use crate::visuals::{Footprint, StaticGradient};

/// A mounted, animated field bound to one window.
///
/// Owns the GPU resources, the uniform state and the signal providers for
/// the lifetime of the mount.
pub struct Renderer {
    window: Arc<Window>,
    gpu: GpuState,
    config: FieldConfig,
    signals: Signals,
    uniforms: UniformState,
    clock: FrameClock,
    grid_key: Option<GridKey>,
    rng: SmallRng,
    mounted: bool,
}

impl Renderer {
    pub fn new(window: Arc<Window>, config: FieldConfig, motion: MotionPreference) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());

        let gpu = pollster::block_on(GpuState::new(window.clone(), config.footprint, config.rays))?;

        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut renderer = Self {
            window,
            gpu,
            signals: Signals::new(&config, viewport, motion),
            uniforms: UniformState::new(viewport, motion.is_reduced()),
            clock: FrameClock::new(),
            grid_key: None,
            rng,
            mounted: true,
            config,
        };
        renderer.regenerate_if_needed()?;
        Ok(renderer)
    }

    /// Feed a window event to the signal providers.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if !self.mounted {
            return;
        }
        self.signals.handle_event(event);
        match event {
            WindowEvent::Resized(size) => self.resize(*size),
            WindowEvent::ScaleFactorChanged { .. } => self.resize(self.window.inner_size()),
            _ => {}
        }
    }

    pub fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        let viewport = Viewport::from_physical(size.width, size.height, self.window.scale_factor());
        self.signals.set_viewport(viewport);
        self.gpu.resize(size);
    }

    /// Reconfigure the surface after it was lost or became outdated.
    pub fn reconfigure(&mut self) {
        self.gpu.resize(self.window.inner_size());
    }

    /// Advance the providers' own smoothing by one animation tick.
    pub fn tick_signals(&mut self) {
        if self.mounted {
            self.signals.tick();
        }
    }

    /// Advance the uniforms and draw one frame.
    ///
    /// Surface errors are returned as [`GpuError::Surface`]; the caller
    /// decides whether to reconfigure or give up on the field.
    pub fn frame(&mut self) -> Result<(), GpuError> {
        if !self.mounted {
            return Ok(());
        }

        let dt = self.clock.tick();
        if self.signals.viewport().is_degenerate() {
            return Ok(());
        }

        self.regenerate_if_needed()?;
        self.uniforms.advance(&self.signals.snapshot(), dt);
        self.gpu.render(&self.uniforms.to_gpu(&self.config.camera))?;
        Ok(())
    }

    /// Rebuild the grid if the viewport, device class, motion preference or
    /// footprint changed since the last build.
    fn regenerate_if_needed(&mut self) -> Result<bool, GpuError> {
        let viewport = self.signals.viewport();
        let Some(key) = plan_grid(
            &self.config,
            &viewport,
            self.signals.motion.is_reduced(),
            self.gpu.footprint(),
        ) else {
            return Ok(false);
        };
        if self.grid_key == Some(key) {
            return Ok(false);
        }
        self.grid_key = Some(key);

        let (count, footprint) = (key.count(), key.footprint());
        let limit = self.gpu.max_buffer_size();
        if !fits_buffer(count, limit) {
            self.gpu.release_instances();
            return Err(GpuError::BufferTooLarge {
                requested: instance_bytes(count),
                limit,
            });
        }

        let grid = generate_grid(count, &viewport, &self.config.camera, footprint, &mut self.rng);
        self.gpu.upload_grid(&grid)?;

        log::info!(
            "particle grid rebuilt: {} {:?} particles for {}x{} @{}x",
            grid.len(),
            footprint,
            viewport.width,
            viewport.height,
            viewport.device_pixel_ratio
        );
        Ok(true)
    }

    pub fn reduced_motion(&self) -> bool {
        self.signals.motion.is_reduced()
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.signals.motion.set_reduced(reduced);
    }

    /// Switch between point and line particles. The grid is rebuilt on the
    /// next frame.
    pub fn toggle_footprint(&mut self) -> Footprint {
        let footprint = self.gpu.footprint().toggled();
        self.gpu.set_footprint(footprint);
        self.config.footprint = footprint;
        footprint
    }

    pub fn uniforms(&self) -> &UniformState {
        &self.uniforms
    }

    pub fn particle_count(&self) -> u32 {
        self.gpu.instance_count()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Release GPU buffers, reset the uniforms and detach the providers.
    ///
    /// Later calls to [`frame`](Self::frame) draw nothing.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.gpu.release_instances();
        self.uniforms.reset();
        self.signals.detach();
        self.grid_key = None;
        self.mounted = false;
        log::debug!("field unmounted");
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// The grid a field should show for the current signals, or `None` while the
/// viewport has no area.
///
/// Two calls return equal keys exactly when the grid can be kept: any change
/// in size, pixel ratio, device class, motion preference or footprint
/// yields a new key.
pub fn plan_grid(
    config: &FieldConfig,
    viewport: &Viewport,
    reduced_motion: bool,
    footprint: Footprint,
) -> Option<GridKey> {
    if viewport.is_degenerate() {
        return None;
    }
    let base = config.base_count_for(reduced_motion);
    let count = particle_budget(base, viewport, config.mobile_optimized);
    Some(GridKey::new(viewport, count, footprint))
}

/// What a mount ended up showing.
pub enum Backdrop {
    /// The GPU field.
    Animated(Box<Renderer>),
    /// Rendering is unavailable; show the static gradient.
    Static(StaticGradient),
    /// GPU setup failed mid-way. Nothing is drawn and nothing is retried.
    Failed,
}

impl Backdrop {
    /// Mount a field on `window`, degrading when rendering is unavailable.
    pub fn mount(
        window: Arc<Window>,
        config: FieldConfig,
        motion: MotionPreference,
        probe: &dyn CapabilityProbe,
    ) -> Self {
        if !probe.rendering_available() {
            log::warn!("rendering unavailable, using static backdrop");
            return Backdrop::Static(StaticGradient::default());
        }

        match Renderer::new(window, config, motion) {
            Ok(renderer) => Backdrop::Animated(Box::new(renderer)),
            Err(e @ (GpuError::NoAdapter | GpuError::SurfaceCreation(_))) => {
                log::warn!("{e}, using static backdrop");
                Backdrop::Static(StaticGradient::default())
            }
            Err(e) => {
                log::error!("particle field disabled: {e}");
                Backdrop::Failed
            }
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Backdrop::Animated(_))
    }

    /// How the host loop should wait: only the animated field draws every
    /// frame, the others redraw on window events alone.
    pub fn control_flow(&self) -> ControlFlow {
        match self {
            Backdrop::Animated(_) => ControlFlow::Poll,
            Backdrop::Static(_) | Backdrop::Failed => ControlFlow::Wait,
        }
    }

    pub fn renderer_mut(&mut self) -> Option<&mut Renderer> {
        match self {
            Backdrop::Animated(renderer) => Some(renderer.as_mut()),
            _ => None,
        }
    }
}

/// A particle field hosted in its own window.
pub struct ParticleField {
    config: FieldConfig,
    motion: MotionPreference,
    probe: Box<dyn CapabilityProbe>,
    fallback_image: Option<PathBuf>,
}

impl ParticleField {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            config,
            motion: MotionPreference::from_env(),
            probe: Box::new(AdapterProbe),
            fallback_image: None,
        }
    }

    pub fn with_motion_preference(mut self, motion: MotionPreference) -> Self {
        self.motion = motion;
        self
    }

    /// Replace the adapter check, e.g. with `false` to force the static backdrop.
    pub fn with_probe(mut self, probe: impl CapabilityProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Write the static backdrop to `path` as an image if it is used.
    pub fn with_fallback_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_image = Some(path.into());
        self
    }

    /// Run the field. This blocks until the window is closed.
    pub fn run(self) -> Result<(), FieldError> {
        self.config.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = FieldApp::new(self);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct FieldApp {
    field: ParticleField,
    window: Option<Arc<Window>>,
    backdrop: Option<Backdrop>,
    error: Option<FieldError>,
}

impl FieldApp {
    fn new(field: ParticleField) -> Self {
        Self {
            field,
            window: None,
            backdrop: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: FieldError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn write_fallback_image(&self, gradient: &StaticGradient, window: &Window) -> Result<(), FieldError> {
        if let Some(path) = &self.field.fallback_image {
            let size = window.inner_size();
            gradient.rasterize(size.width.max(1), size.height.max(1)).save(path)?;
            log::info!("static backdrop written to {}", path.display());
        }
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.backdrop.as_mut().and_then(Backdrop::renderer_mut) {
            renderer.unmount();
        }
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        if code == KeyCode::Escape {
            self.shutdown(event_loop);
            return;
        }

        let Some(renderer) = self.backdrop.as_mut().and_then(Backdrop::renderer_mut) else {
            return;
        };
        match code {
            KeyCode::KeyM => {
                let reduced = !renderer.reduced_motion();
                renderer.set_reduced_motion(reduced);
                log::info!("reduced motion {}", if reduced { "on" } else { "off" });
            }
            KeyCode::KeyL => {
                let footprint = renderer.toggle_footprint();
                log::info!("footprint: {footprint:?}");
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for FieldApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Quantum Field")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .with_transparent(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        if self.field.config.click_through {
            if let Err(e) = window.set_cursor_hittest(false) {
                log::warn!("click-through not supported: {e}");
            }
        }

        let backdrop = Backdrop::mount(
            window.clone(),
            self.field.config.clone(),
            self.field.motion,
            self.field.probe.as_ref(),
        );

        if let Backdrop::Static(gradient) = &backdrop {
            if let Err(e) = self.write_fallback_image(gradient, &window) {
                return self.fail(event_loop, e);
            }
        }

        event_loop.set_control_flow(backdrop.control_flow());
        window.request_redraw();
        self.window = Some(window);
        self.backdrop = Some(backdrop);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),
            WindowEvent::RedrawRequested => {
                let Some(backdrop) = self.backdrop.as_mut() else {
                    return;
                };
                let Some(renderer) = backdrop.renderer_mut() else {
                    return;
                };
                match renderer.frame() {
                    Ok(()) => {}
                    Err(GpuError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                        renderer.reconfigure()
                    }
                    Err(GpuError::Surface(wgpu::SurfaceError::Timeout)) => {
                        log::warn!("surface timeout, skipping frame")
                    }
                    Err(e) => {
                        log::error!("particle field disabled: {e}");
                        renderer.unmount();
                        *backdrop = Backdrop::Failed;
                        event_loop.set_control_flow(backdrop.control_flow());
                    }
                }
            }
            other => {
                if let Some(renderer) = self.backdrop.as_mut().and_then(Backdrop::renderer_mut) {
                    renderer.handle_event(&other);
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(backdrop) = self.backdrop.as_mut() else {
            return;
        };
        event_loop.set_control_flow(backdrop.control_flow());
        if let Some(renderer) = backdrop.renderer_mut() {
            renderer.tick_signals();
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> Viewport {
        Viewport::new(1440.0, 900.0, 2.0)
    }

    #[test]
    fn test_plan_skips_degenerate_viewport() {
        let config = FieldConfig::default();
        assert!(plan_grid(&config, &Viewport::new(0.0, 900.0, 2.0), false, Footprint::Point).is_none());
        assert!(plan_grid(&config, &Viewport::new(1440.0, 0.0, 2.0), false, Footprint::Point).is_none());
    }

    #[test]
    fn test_plan_stable_for_same_signals() {
        let config = FieldConfig::default();
        let a = plan_grid(&config, &desktop(), false, Footprint::Point);
        let b = plan_grid(&config, &desktop(), false, Footprint::Point);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_reduced_motion_swaps_count() {
        let config = FieldConfig::default();
        let full = plan_grid(&config, &desktop(), false, Footprint::Point).map(|k| k.count());
        let reduced = plan_grid(&config, &desktop(), true, Footprint::Point).map(|k| k.count());
        assert_eq!(full, Some(15_000));
        assert_eq!(reduced, Some(5_000));
    }

    #[test]
    fn test_footprint_toggle_forces_regeneration() {
        let config = FieldConfig::default();
        let point = plan_grid(&config, &desktop(), false, Footprint::Point);
        let line = plan_grid(&config, &desktop(), false, Footprint::Line);
        assert_ne!(point, line);
        assert_eq!(point.map(|k| k.count()), line.map(|k| k.count()));
    }

    #[test]
    fn test_device_changes_force_regeneration() {
        let config = FieldConfig::default();
        let base = plan_grid(&config, &desktop(), false, Footprint::Point);

        // dropping below 1.5x density switches to the low-DPI budget
        let low_dpi = plan_grid(&config, &Viewport::new(1440.0, 900.0, 1.0), false, Footprint::Point);
        assert_eq!(low_dpi.map(|k| k.count()), Some(10_500));
        assert_ne!(base, low_dpi);

        // a resize keeps the count but still rebuilds the lattice
        let resized = plan_grid(&config, &Viewport::new(1280.0, 900.0, 2.0), false, Footprint::Point);
        assert_eq!(resized.map(|k| k.count()), Some(15_000));
        assert_ne!(base, resized);

        let mobile = plan_grid(&config, &Viewport::new(375.0, 667.0, 2.0), false, Footprint::Point);
        assert_eq!(mobile.map(|k| k.count()), Some(7_500));

        let unoptimized = config.clone().with_mobile_optimized(false);
        let full_mobile = plan_grid(&unoptimized, &Viewport::new(375.0, 667.0, 2.0), false, Footprint::Point);
        assert_eq!(full_mobile.map(|k| k.count()), Some(15_000));
    }

    #[test]
    fn test_fallbacks_wait_for_events() {
        assert_eq!(Backdrop::Static(StaticGradient::default()).control_flow(), ControlFlow::Wait);
        assert_eq!(Backdrop::Failed.control_flow(), ControlFlow::Wait);
        assert!(Backdrop::Failed.renderer_mut().is_none());
        assert!(!Backdrop::Static(StaticGradient::default()).is_animated());
    }
}
