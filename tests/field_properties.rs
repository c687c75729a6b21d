//! Integration tests for the field pipeline: grid generation, uniform
//! easing, shading and the generated WGSL.

use glam::{Vec2, Vec3};
use quantum_field::grid::{GridLayout, JITTER_FRACTION};
use quantum_field::input::{FrameInputs, Viewport};
use quantum_field::shading::{displace, mouse_interference, shade_fragment, Varyings};
use quantum_field::uniforms::{ease, UniformState, EASE_RATE};
use quantum_field::{generate_grid, particle_budget, shaders, Camera, Footprint};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn validate_wgsl(code: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(())
}

// ============================================================================
// Grid generation
// ============================================================================

#[test]
fn test_exact_count_and_attribute_ranges() {
    let camera = Camera::new();
    let viewports = [
        Viewport::new(1024.0, 768.0, 1.0),
        Viewport::new(390.0, 844.0, 3.0),
        Viewport::new(2560.0, 1080.0, 2.0),
    ];

    for (v, viewport) in viewports.iter().enumerate() {
        for count in [0u32, 1, 2, 7, 99, 100, 1001, 4096] {
            let mut rng = SmallRng::seed_from_u64(v as u64 * 1000 + count as u64);
            let grid = generate_grid(count, viewport, &camera, Footprint::Line, &mut rng);

            assert_eq!(grid.len(), count as usize, "count {count} on {viewport:?}");
            for p in grid.particles() {
                assert!(p.scale >= 0.5 && p.scale <= 1.5);
                assert!(p.seed >= 0.0 && p.seed < 1.0);
                assert_eq!(p.position.z, 0.0);
            }
        }
    }
}

#[test]
fn test_anchors_inside_coverage_rectangle() {
    let camera = Camera::new();
    let viewport = Viewport::new(1440.0, 900.0, 2.0);
    let mut rng = SmallRng::seed_from_u64(5);
    let grid = generate_grid(5000, &viewport, &camera, Footprint::Point, &mut rng);

    let layout = grid.layout();
    let half = layout.coverage * 0.5;
    assert!((layout.coverage.x - layout.visible.x * 1.5).abs() < 1e-2);
    assert!((layout.coverage.y - layout.visible.y * 1.5).abs() < 1e-2);

    for p in grid.particles() {
        assert!(p.position.x.abs() <= half.x, "x out of coverage: {:?}", p.position);
        assert!(p.position.y.abs() <= half.y, "y out of coverage: {:?}", p.position);
    }
}

#[test]
fn test_lattice_covers_count_with_aspect_ratio() {
    let camera = Camera::new();
    for (w, h) in [(1920.0, 1080.0), (768.0, 1024.0), (1000.0, 1000.0)] {
        let viewport = Viewport::new(w, h, 2.0);
        let layout = GridLayout::compute(15_000, &viewport, &camera);
        assert!(layout.per_row * layout.per_col >= 15_000);
        let ratio = layout.per_row as f32 / layout.per_col as f32;
        let aspect = w / h;
        assert!((ratio / aspect - 1.0).abs() < 0.05, "ratio {ratio} vs aspect {aspect}");
    }
}

#[test]
fn test_device_budgets() {
    let mobile = Viewport::new(375.0, 667.0, 2.0);
    let low_dpi = Viewport::new(1366.0, 768.0, 1.0);
    let standard = Viewport::new(1366.0, 768.0, 2.0);

    assert_eq!(particle_budget(15_000, &mobile, true), 7_500);
    assert_eq!(particle_budget(15_000, &low_dpi, true), 10_500);
    assert_eq!(particle_budget(15_000, &standard, true), 15_000);

    for base in [0u32, 1, 3, 999, 15_001] {
        assert_eq!(particle_budget(base, &mobile, true), (base as f64 * 0.5).floor() as u32);
        assert_eq!(particle_budget(base, &low_dpi, true), (base as f64 * 0.7).floor() as u32);
        assert_eq!(particle_budget(base, &standard, true), base);
    }
}

#[test]
fn test_scenario_hundred_particles_on_desktop() {
    let viewport = Viewport::new(1024.0, 768.0, 2.0);
    let camera = Camera::new();

    let count = particle_budget(100, &viewport, true);
    assert_eq!(count, 100);

    let mut rng = SmallRng::seed_from_u64(2024);
    let grid = generate_grid(count, &viewport, &camera, Footprint::Point, &mut rng);
    assert_eq!(grid.len(), 100);

    let layout = grid.layout();
    let expected_per_row = (100.0_f64 * 1024.0 / 768.0).sqrt().ceil() as u32;
    assert_eq!(layout.per_row, expected_per_row);
    assert_eq!(layout.per_col, 100_u32.div_ceil(expected_per_row));

    // every particle sits within ±25% of a cell spacing from its cell center
    let bound = layout.spacing * JITTER_FRACTION + Vec2::splat(1e-3);
    let mut index = 0;
    'outer: for i in 0..layout.per_row {
        for j in 0..layout.per_col {
            if index == grid.len() {
                break 'outer;
            }
            let offset = grid.particles()[index].position - layout.cell_center(i, j);
            assert!(offset.x.abs() <= bound.x && offset.y.abs() <= bound.y, "particle {index}: {offset:?}");
            index += 1;
        }
    }
}

// ============================================================================
// Uniform pipeline
// ============================================================================

#[test]
fn test_ease_converges_monotonically_without_overshoot() {
    for start in [0.0f32, 0.2, 0.9, 1.0] {
        for target in [0.0f32, 0.5, 1.0] {
            let mut value = start;
            let mut previous_gap = (target - value).abs();
            for _ in 0..200 {
                value = ease(value, target, EASE_RATE);
                let gap = (target - value).abs();
                assert!(gap <= previous_gap);
                // never crosses the target
                assert!((value - target) * (start - target) >= 0.0);
                previous_gap = gap;
            }
            assert!(previous_gap < 1e-6);
        }
    }
}

#[test]
fn test_mouse_active_follows_pointer() {
    let mut state = UniformState::default();
    let over = FrameInputs {
        pointer_active: true,
        ..FrameInputs::default()
    };
    let mut last = state.mouse_active;
    for _ in 0..60 {
        state.advance(&over, 1.0 / 60.0);
        assert!(state.mouse_active > last && state.mouse_active <= 1.0);
        last = state.mouse_active;
    }

    let away = FrameInputs::default();
    for _ in 0..60 {
        state.advance(&away, 1.0 / 60.0);
        assert!(state.mouse_active < last && state.mouse_active >= 0.0);
        last = state.mouse_active;
    }
}

#[test]
fn test_reduced_motion_freezes_time_across_ticks() {
    let mut state = UniformState::default();
    state.advance(&FrameInputs::default(), 0.5);

    let reduced = FrameInputs {
        reduced_motion: true,
        ..FrameInputs::default()
    };
    state.advance(&reduced, 0.016);
    let first = state.time;
    state.advance(&reduced, 10.0);
    assert_eq!(state.time, first);
}

// ============================================================================
// Shading
// ============================================================================

#[test]
fn test_interference_zero_when_pointer_inactive() {
    for i in 0..100 {
        let dist = i as f32 * 5.0;
        assert_eq!(mouse_interference(dist, 0.42, 3.3, 0.0), 0.0);
    }
}

#[test]
fn test_inactive_pointer_leaves_displacement_unchanged() {
    let camera = Camera::new();
    let particle = quantum_field::Particle {
        position: Vec3::new(12.0, -40.0, 0.0),
        scale: 1.0,
        seed: 0.3,
        angle: std::f32::consts::FRAC_PI_2,
        _pad: [0.0; 2],
    };

    let mut near = UniformState::default();
    near.mouse = Vec2::ZERO;
    let mut far = near;
    far.mouse = Vec2::new(0.9, -0.9);

    // with mouse_active = 0 the pointer position has no effect
    let a = displace(&particle, &near, &camera);
    let b = displace(&particle, &far, &camera);
    assert_eq!(a.position, b.position);
    assert_eq!(a.highlight, 0.0);
}

#[test]
fn test_color_stage_discards_outside_footprint() {
    let state = UniformState::default();
    let varyings = Varyings {
        distance: 10.0,
        opacity: 0.8,
        highlight: 0.5,
    };

    for i in 0..=20 {
        for j in 0..=20 {
            let uv = Vec2::new(i as f32 / 20.0, j as f32 / 20.0);
            let point = shade_fragment(Footprint::Point, uv, &varyings, &state);
            if (uv - Vec2::splat(0.5)).length() * 2.0 > 1.0 {
                assert!(point.is_none(), "point footprint covered {uv:?}");
            }
            if let Some(c) = point {
                assert!(c.w >= 0.0 && c.w <= 1.0);
            }
        }
    }

    // line ends and sides have no coverage
    assert!(shade_fragment(Footprint::Line, Vec2::new(0.5, 1.0), &varyings, &state).is_none());
    assert!(shade_fragment(Footprint::Line, Vec2::new(0.0, 0.5), &varyings, &state).is_none());
    assert!(shade_fragment(Footprint::Line, Vec2::new(0.5, 0.5), &varyings, &state).is_some());
}

// ============================================================================
// Shader sources
// ============================================================================

#[test]
fn test_all_shaders_validate() {
    for footprint in [Footprint::Point, Footprint::Line] {
        validate_wgsl(&shaders::particle_shader(footprint))
            .unwrap_or_else(|e| panic!("{footprint:?} shader invalid: {e}"));
    }
    validate_wgsl(&shaders::rays_shader()).expect("rays shader should be valid");
}
