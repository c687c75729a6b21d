//! GPU state for the field: surface, uniform buffer, particle pipeline and
//! the optional ray pass.

pub mod camera;
mod overlay;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;
use overlay::RayPass;

use crate::error::GpuError;
use crate::grid::{fits_buffer, instance_bytes, Particle, ParticleGrid};
use crate::input::CapabilityProbe;
use crate::shaders;
use crate::uniforms::GpuUniforms;
use crate::visuals::{palette, Footprint, ADDITIVE_BLEND};

const PARTICLE_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32,
    2 => Float32,
    3 => Float32,
];

/// Instance buffer for one generated grid.
struct InstanceBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

/// Checks for a usable adapter without opening a window.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdapterProbe;

impl CapabilityProbe for AdapterProbe {
    fn rendering_available(&self) -> bool {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }));
        match adapter {
            Ok(adapter) => {
                log::debug!("adapter available: {}", adapter.get_info().name);
                true
            }
            Err(e) => {
                log::debug!("no adapter: {e}");
                false
            }
        }
    }
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group_layout: wgpu::BindGroupLayout,
    uniform_bind_group: wgpu::BindGroup,
    particle_pipeline: wgpu::RenderPipeline,
    footprint: Footprint,
    instances: Option<InstanceBuffer>,
    rays: Option<RayPass>,
    clear_color: wgpu::Color,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, footprint: Footprint, rays: bool) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;
        log::info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Field Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are authored in sRGB already
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::NoAdapter)?;

        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|m| surface_caps.alpha_modes.contains(m))
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        // A transparent layer clears to nothing; an opaque one to the void colour
        let clear_color = if alpha_mode == wgpu::CompositeAlphaMode::Auto {
            let c = palette::VOID_DEEP;
            wgpu::Color {
                r: c.x as f64,
                g: c.y as f64,
                b: c.z as f64,
                a: 1.0,
            }
        } else {
            wgpu::Color::TRANSPARENT
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Field Uniform Buffer"),
            contents: bytemuck::bytes_of(&<GpuUniforms as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Field Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let particle_pipeline =
            create_particle_pipeline(&device, &uniform_bind_group_layout, surface_format, footprint);

        let rays = rays.then(|| RayPass::new(&device, &uniform_bind_group_layout, surface_format));

        Ok(Self {
            surface,
            device,
            queue,
            config,
            uniform_buffer,
            uniform_bind_group_layout,
            uniform_bind_group,
            particle_pipeline,
            footprint,
            instances: None,
            rays,
            clear_color,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Rebuild the particle pipeline for another footprint.
    pub fn set_footprint(&mut self, footprint: Footprint) {
        if footprint != self.footprint {
            self.particle_pipeline = create_particle_pipeline(
                &self.device,
                &self.uniform_bind_group_layout,
                self.config.format,
                footprint,
            );
            self.footprint = footprint;
        }
    }

    /// Largest buffer the device accepts, in bytes.
    pub fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    /// Replace the instance buffer with a freshly generated grid.
    ///
    /// The old buffer is released even when the new grid is rejected.
    pub fn upload_grid(&mut self, grid: &ParticleGrid) -> Result<(), GpuError> {
        self.release_instances();
        if grid.is_empty() {
            return Ok(());
        }

        let count = grid.len() as u32;
        let limit = self.max_buffer_size();
        if !fits_buffer(count, limit) {
            return Err(GpuError::BufferTooLarge {
                requested: instance_bytes(count),
                limit,
            });
        }

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Instance Buffer"),
            contents: grid.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.instances = Some(InstanceBuffer { buffer, count });
        Ok(())
    }

    /// Free the instance buffer; nothing is drawn until the next upload.
    pub fn release_instances(&mut self) {
        if let Some(old) = self.instances.take() {
            old.buffer.destroy();
        }
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.as_ref().map_or(0, |i| i.count)
    }

    pub fn render(&mut self, uniforms: &GpuUniforms) -> Result<(), wgpu::SurfaceError> {
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Field Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Field Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Rays sit behind the particles
            if let Some(rays) = &self.rays {
                rays.draw(&mut render_pass);
            }

            if let Some(instances) = &self.instances {
                render_pass.set_pipeline(&self.particle_pipeline);
                render_pass.set_vertex_buffer(0, instances.buffer.slice(..));
                render_pass.draw(0..shaders::VERTICES_PER_INSTANCE, 0..instances.count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_particle_pipeline(
    device: &wgpu::Device,
    uniform_bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    footprint: Footprint,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Particle Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::particle_shader(footprint).into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Particle Pipeline Layout"),
        bind_group_layouts: &[uniform_bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Particle Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Particle>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &PARTICLE_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(ADDITIVE_BLEND),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
