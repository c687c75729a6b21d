//! Grid generation for the particle field.
//!
//! Particles are laid out on a jittered lattice that covers 1.5x the area the
//! camera can see at z = 0, so parallax and wave motion never reveal the edge
//! of the field. Every per-particle attribute is drawn once here and never
//! changes; a viewport or device-class change throws the whole grid away and
//! builds a new one.
//!
//! # Example
//!
//! ```ignore
//! let viewport = Viewport::new(1024.0, 768.0, 2.0);
//! let count = particle_budget(15_000, &viewport, true);
//! let mut rng = SmallRng::seed_from_u64(7);
//! let grid = generate_grid(count, &viewport, &Camera::new(), Footprint::Point, &mut rng);
//! assert_eq!(grid.len(), count as usize);
//! ```

use std::f32::consts::{FRAC_PI_2, PI};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use rand::Rng;

use crate::gpu::Camera;
use crate::input::Viewport;
use crate::visuals::Footprint;

/// Coverage of the lattice relative to the visible area, per axis.
pub const COVERAGE_MULTIPLIER: f32 = 1.5;
/// Maximum jitter as a fraction of cell spacing, per axis.
pub const JITTER_FRACTION: f32 = 0.25;
/// Range of per-particle scale.
pub const SCALE_RANGE: (f32, f32) = (0.5, 1.5);
/// Maximum deviation of a line particle from vertical.
pub const ANGLE_VARIATION: f32 = PI / 12.0;

/// One particle anchor, laid out exactly as the GPU instance buffer expects.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Anchor in world space; z is always 0 and animated in the shader.
    pub position: Vec3,
    /// Size multiplier in [0.5, 1.5).
    pub scale: f32,
    /// Per-particle random value in [0, 1), drives shimmer phase and opacity.
    pub seed: f32,
    /// Orientation in radians. Fixed at π/2 for the point footprint.
    pub angle: f32,
    pub _pad: [f32; 2],
}

/// Size in bytes of the instance buffer for `count` particles.
pub fn instance_bytes(count: u32) -> u64 {
    count as u64 * std::mem::size_of::<Particle>() as u64
}

/// Whether an instance buffer for `count` particles fits in `max_buffer_size`.
pub fn fits_buffer(count: u32, max_buffer_size: u64) -> bool {
    instance_bytes(count) <= max_buffer_size
}

/// Number of particles to draw for a device.
///
/// Mobile-optimized narrow viewports get half the base count, low-density
/// displays 70%; both are floored.
pub fn particle_budget(base: u32, viewport: &Viewport, mobile_optimized: bool) -> u32 {
    let base = base as u64;
    let scaled = if mobile_optimized && viewport.is_mobile() {
        base / 2
    } else if viewport.is_low_dpi() {
        base * 7 / 10
    } else {
        base
    };
    scaled as u32
}

/// Lattice dimensions for a particle count and viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// World-space size visible at z = 0.
    pub visible: Vec2,
    /// World-space size covered by the lattice.
    pub coverage: Vec2,
    /// Lattice cells along x.
    pub per_row: u32,
    /// Lattice cells along y.
    pub per_col: u32,
    /// World-space size of one cell.
    pub spacing: Vec2,
}

impl GridLayout {
    /// Compute the lattice for `count` particles.
    ///
    /// A zero count or a degenerate viewport yields an all-zero lattice.
    pub fn compute(count: u32, viewport: &Viewport, camera: &Camera) -> Self {
        if count == 0 || viewport.is_degenerate() {
            return Self {
                visible: Vec2::ZERO,
                coverage: Vec2::ZERO,
                per_row: 0,
                per_col: 0,
                spacing: Vec2::ZERO,
            };
        }

        let aspect = viewport.aspect();
        let visible = Vec2::new(camera.visible_width(aspect), camera.visible_height());
        let coverage = visible * COVERAGE_MULTIPLIER;

        let per_row = ((count as f64 * aspect as f64).sqrt().ceil() as u32).max(1);
        let per_col = count.div_ceil(per_row).max(1);
        let spacing = coverage / Vec2::new(per_row as f32, per_col as f32);

        Self {
            visible,
            coverage,
            per_row,
            per_col,
            spacing,
        }
    }

    /// Unjittered center of lattice cell `(i, j)`.
    pub fn cell_center(&self, i: u32, j: u32) -> Vec3 {
        Vec3::new(
            (i as f32 + 0.5 - self.per_row as f32 / 2.0) * self.spacing.x,
            (j as f32 + 0.5 - self.per_col as f32 / 2.0) * self.spacing.y,
            0.0,
        )
    }
}

/// Identity of a generated grid; any change requires regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridKey {
    width_bits: u32,
    height_bits: u32,
    dpr_bits: u32,
    count: u32,
    footprint: Footprint,
}

impl GridKey {
    pub fn new(viewport: &Viewport, count: u32, footprint: Footprint) -> Self {
        Self {
            width_bits: viewport.width.to_bits(),
            height_bits: viewport.height.to_bits(),
            dpr_bits: viewport.device_pixel_ratio.to_bits(),
            count,
            footprint,
        }
    }

    /// Particle count the grid is built with.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }
}

/// The full particle set for one mounted field.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleGrid {
    particles: Vec<Particle>,
    layout: GridLayout,
    footprint: Footprint,
}

impl ParticleGrid {
    /// A grid with nothing to draw.
    pub fn empty(footprint: Footprint) -> Self {
        Self {
            particles: Vec::new(),
            layout: GridLayout::compute(0, &Viewport::default(), &Camera::new()),
            footprint,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Instance buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }
}

/// Lay out `count` particles over the camera's oversized view.
pub fn generate_grid<R: Rng + ?Sized>(
    count: u32,
    viewport: &Viewport,
    camera: &Camera,
    footprint: Footprint,
    rng: &mut R,
) -> ParticleGrid {
    let layout = GridLayout::compute(count, viewport, camera);
    if layout.per_row == 0 {
        return ParticleGrid {
            particles: Vec::new(),
            layout,
            footprint,
        };
    }

    let jitter = layout.spacing * (JITTER_FRACTION * 2.0);
    let mut particles = Vec::with_capacity(count as usize);

    'lattice: for i in 0..layout.per_row {
        for j in 0..layout.per_col {
            if particles.len() == count as usize {
                break 'lattice;
            }

            let center = layout.cell_center(i, j);
            let offset = Vec3::new(
                (rng.gen::<f32>() - 0.5) * jitter.x,
                (rng.gen::<f32>() - 0.5) * jitter.y,
                0.0,
            );
            let scale = SCALE_RANGE.0 + rng.gen::<f32>() * (SCALE_RANGE.1 - SCALE_RANGE.0);
            let seed = rng.gen::<f32>();
            let angle = if footprint.is_oriented() {
                FRAC_PI_2 + rng.gen_range(-ANGLE_VARIATION..=ANGLE_VARIATION)
            } else {
                FRAC_PI_2
            };

            particles.push(Particle {
                position: center + offset,
                scale,
                seed,
                angle,
                _pad: [0.0; 2],
            });
        }
    }

    log::debug!(
        "generated {} particles on a {}x{} lattice (spacing {:.2} x {:.2})",
        particles.len(),
        layout.per_row,
        layout.per_col,
        layout.spacing.x,
        layout.spacing.y
    );

    ParticleGrid {
        particles,
        layout,
        footprint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_budget_examples() {
        let phone = Viewport::new(390.0, 844.0, 3.0);
        let low_dpi = Viewport::new(1280.0, 720.0, 1.0);
        let retina = Viewport::new(1440.0, 900.0, 2.0);

        assert_eq!(particle_budget(15_000, &phone, true), 7_500);
        assert_eq!(particle_budget(15_000, &low_dpi, true), 10_500);
        assert_eq!(particle_budget(15_000, &retina, true), 15_000);
        // without mobile optimization a high-dpi phone keeps the full count
        assert_eq!(particle_budget(15_000, &phone, false), 15_000);
    }

    #[test]
    fn test_budget_floors() {
        let phone = Viewport::new(390.0, 844.0, 1.0);
        let low_dpi = Viewport::new(1280.0, 720.0, 1.0);
        assert_eq!(particle_budget(15, &phone, true), 7);
        assert_eq!(particle_budget(15, &low_dpi, true), 10);
    }

    #[test]
    fn test_zero_count_is_empty() {
        let mut rng = SmallRng::seed_from_u64(1);
        let grid = generate_grid(0, &Viewport::default(), &Camera::new(), Footprint::Point, &mut rng);
        assert!(grid.is_empty());
        assert_eq!(grid.layout().per_row, 0);
        assert_eq!(grid.layout().spacing, Vec2::ZERO);
    }

    #[test]
    fn test_degenerate_viewport_is_empty() {
        let mut rng = SmallRng::seed_from_u64(1);
        let viewport = Viewport::new(800.0, 0.0, 1.0);
        let grid = generate_grid(100, &viewport, &Camera::new(), Footprint::Point, &mut rng);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_single_particle() {
        let mut rng = SmallRng::seed_from_u64(3);
        let grid = generate_grid(1, &Viewport::new(1000.0, 1000.0, 2.0), &Camera::new(), Footprint::Point, &mut rng);
        assert_eq!(grid.len(), 1);
        let layout = grid.layout();
        assert_eq!((layout.per_row, layout.per_col), (1, 1));
        let p = grid.particles()[0].position;
        assert!(p.x.abs() <= layout.spacing.x * JITTER_FRACTION);
        assert!(p.y.abs() <= layout.spacing.y * JITTER_FRACTION);
    }

    #[test]
    fn test_point_footprint_has_fixed_angle() {
        let mut rng = SmallRng::seed_from_u64(11);
        let grid = generate_grid(50, &Viewport::default(), &Camera::new(), Footprint::Point, &mut rng);
        assert!(grid.particles().iter().all(|p| p.angle == FRAC_PI_2));
    }

    #[test]
    fn test_line_angles_within_variation() {
        let mut rng = SmallRng::seed_from_u64(12);
        let grid = generate_grid(500, &Viewport::default(), &Camera::new(), Footprint::Line, &mut rng);
        assert!(grid
            .particles()
            .iter()
            .all(|p| (p.angle - FRAC_PI_2).abs() <= ANGLE_VARIATION + 1e-6));
        // not all identical
        assert!(grid.particles().iter().any(|p| (p.angle - FRAC_PI_2).abs() > 0.01));
    }

    #[test]
    fn test_same_seed_same_grid() {
        let viewport = Viewport::new(1024.0, 768.0, 2.0);
        let a = generate_grid(200, &viewport, &Camera::new(), Footprint::Line, &mut SmallRng::seed_from_u64(99));
        let b = generate_grid(200, &viewport, &Camera::new(), Footprint::Line, &mut SmallRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_instance_stride() {
        assert_eq!(std::mem::size_of::<Particle>(), 32);
    }

    #[test]
    fn test_buffer_fit_against_webgl2_limit() {
        // downlevel_webgl2_defaults().max_buffer_size
        let limit = 256 << 20;
        assert_eq!(instance_bytes(20_000_000), 640_000_000);
        assert!(!fits_buffer(20_000_000, limit));
        assert!(fits_buffer(15_000, limit));
        assert!(fits_buffer(limit as u32 / 32, limit));
        assert!(!fits_buffer(limit as u32 / 32 + 1, limit));
    }

    #[test]
    fn test_grid_key_changes_with_dpr() {
        let a = GridKey::new(&Viewport::new(800.0, 600.0, 1.0), 100, Footprint::Point);
        let b = GridKey::new(&Viewport::new(800.0, 600.0, 2.0), 100, Footprint::Point);
        let c = GridKey::new(&Viewport::new(800.0, 600.0, 1.0), 100, Footprint::Point);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
