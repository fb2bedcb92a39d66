//! Gallery Viewport - wgpu renderer for the gallery scene.
//!
//! [`Renderer`] owns the surface, device and pipelines. [`GpuScene`] mirrors
//! the core scene graph on the GPU, and [`GalleryView`] ties both to the
//! camera, the orbit controls and the egui overlay for one mounted gallery.

pub mod gpu_scene;
pub mod lights;
pub mod overlay;
pub mod shadows;
pub mod view;

use anyhow::Result;
use gallery_math::{Camera, Vec3};
use wgpu::util::DeviceExt;
use wgpu::{Device, Instance, Queue, Surface, SurfaceConfiguration};

pub use gpu_scene::{GpuScene, SyncReport, Vertex};
pub use lights::LightsUniform;
pub use overlay::{Overlay, OverlayResponse, OverlayStatus};
pub use shadows::ShadowMaps;
pub use view::GalleryView;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Renderer settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererConfig {
    /// Exposure fed into the ACES filmic curve
    pub exposure: f32,
    pub shadows: bool,
    pub shadow_map_size: u32,
    /// Clear color when no scene is mounted (linear RGB)
    pub clear_color: Vec3,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            exposure: 1.2,
            shadows: true,
            shadow_map_size: 1024,
            clear_color: Vec3::ONE,
        }
    }
}

/// Per-frame uniform data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    /// xyz = camera position, w = exposure
    camera: [f32; 4],
}

impl FrameUniform {
    fn new(camera: &Camera, exposure: f32) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera: camera.position.extend(exposure).to_array(),
        }
    }
}

/// Core renderer managing wgpu state
pub struct Renderer {
    pub surface: Surface<'static>,
    pub device: Device,
    pub queue: Queue,
    pub config: SurfaceConfiguration,
    pub size: (u32, u32),
    settings: RendererConfig,
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    shadows: ShadowMaps,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    // egui state
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_scene_pipeline(
    device: &Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    transparent: bool,
) -> wgpu::RenderPipeline {
    let (label, blend) = if transparent {
        ("Transparent Pipeline", wgpu::BlendState::ALPHA_BLENDING)
    } else {
        ("Opaque Pipeline", wgpu::BlendState::REPLACE)
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None, // Back faces are shaded with a flipped normal
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: !transparent,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

impl Renderer {
    /// Create a depth texture for the given size
    fn create_depth_texture(device: &Device, size: (u32, u32)) -> (wgpu::Texture, wgpu::TextureView) {
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        (depth_texture, depth_view)
    }

    /// Create a new renderer for the given window
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        settings: RendererConfig,
    ) -> Result<Self> {
        let inner = window.inner_size();
        let size = (inner.width.max(1), inner.height.max(1));

        // Create wgpu instance
        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Gallery Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let Some(fallback_format) = surface_caps.formats.first().copied() else {
            anyhow::bail!("Surface reports no supported formats");
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(fallback_format);
        if !surface_format.is_srgb() {
            log::warn!("No sRGB surface format; colors will look dark");
        }

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        // Group 0: frame, lights, shadow maps
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        // Group 1: per-node uniform, base color map, sampler
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shadows = ShadowMaps::new(
            &device,
            &object_layout,
            settings.shadows,
            settings.shadow_map_size,
        );

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Buffer"),
            contents: bytemuck::cast_slice(&[FrameUniform::new(
                &Camera::gallery_entry(size.0 as f32 / size.1 as f32),
                settings.exposure,
            )]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Buffer"),
            contents: bytemuck::cast_slice(&[LightsUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(shadows.array_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(shadows.sampler()),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline =
            create_scene_pipeline(&device, &pipeline_layout, &shader, config.format, false);
        let transparent_pipeline =
            create_scene_pipeline(&device, &pipeline_layout, &shader, config.format, true);

        let (depth_texture, depth_view) = Self::create_depth_texture(&device, size);

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None, // max_texture_side (use default)
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            config.format,
            None, // No depth testing for egui
            1,
            false, // allow_srgb_render_target
        );

        log::info!(
            "Renderer initialized: {}x{}, {:?}, exposure {:.2}",
            size.0,
            size.1,
            config.format,
            settings.exposure
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            settings,
            opaque_pipeline,
            transparent_pipeline,
            frame_buffer,
            lights_buffer,
            frame_bind_group,
            object_layout,
            shadows,
            depth_texture,
            depth_view,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn settings(&self) -> &RendererConfig {
        &self.settings
    }

    pub fn shadows_enabled(&self) -> bool {
        self.shadows.is_enabled()
    }

    pub(crate) fn object_layout(&self) -> &wgpu::BindGroupLayout {
        &self.object_layout
    }

    /// Upload a new light set and the matching shadow matrices.
    pub fn set_lights(&mut self, lights: &LightsUniform) {
        self.queue
            .write_buffer(&self.lights_buffer, 0, bytemuck::cast_slice(&[*lights]));
        self.shadows.update(&self.queue, lights);
        log::debug!(
            "Lights: {} point, {} spot, {} shadowed",
            lights.point_count(),
            lights.spot_count(),
            self.shadows.active_layers()
        );
    }

    /// Handle window resize
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.size = new_size;
            self.config.width = new_size.0;
            self.config.height = new_size.1;
            self.surface.configure(&self.device, &self.config);

            // Recreate depth texture with new size
            self.depth_texture.destroy();
            let (depth_texture, depth_view) = Self::create_depth_texture(&self.device, new_size);
            self.depth_texture = depth_texture;
            self.depth_view = depth_view;
        }
    }

    /// Handle egui window event - returns true if event was consumed by egui
    pub fn handle_egui_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        response.consumed
    }

    /// Render one frame of `scene` from `camera`, with `run_ui` drawing the
    /// egui overlay on top.
    pub fn render(
        &mut self,
        window: &winit::window::Window,
        scene: &GpuScene,
        camera: &Camera,
        run_ui: impl FnMut(&egui::Context),
    ) -> Result<()> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::cast_slice(&[FrameUniform::new(camera, self.settings.exposure)]),
        );

        // Prepare egui UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.size.0, self.size.1],
            pixels_per_point: window.scale_factor() as f32,
        };

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Upload egui textures
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        self.shadows.render(&mut encoder, scene);

        let background = scene.background().unwrap_or(self.settings.clear_color);
        let clear_color = wgpu::Color {
            r: background.x as f64,
            g: background.y as f64,
            b: background.z as f64,
            a: 1.0,
        };

        // Main render pass: opaque nodes, then transparent labels
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (pipeline, transparent) in [
                (&self.opaque_pipeline, false),
                (&self.transparent_pipeline, true),
            ] {
                render_pass.set_pipeline(pipeline);
                for node in scene.nodes().iter().filter(|node| node.transparent == transparent) {
                    let mesh = scene.mesh(node.mesh);
                    render_pass.set_bind_group(1, &node.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
                }
            }
        }

        // Render egui on top
        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime(); // Need 'static lifetime for egui renderer

            self.egui_renderer
                .render(&mut egui_pass, &paint_jobs, &screen_descriptor);
        }

        // Free egui textures
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RendererConfig::default();
        assert_eq!(config.exposure, 1.2);
        assert!(config.shadows);
        assert_eq!(config.shadow_map_size, 1024);
        assert_eq!(config.clear_color, Vec3::ONE);
    }

    #[test]
    fn test_frame_uniform() {
        let camera = Camera::gallery_entry(16.0 / 9.0);
        let uniform = FrameUniform::new(&camera, 1.2);
        assert_eq!(uniform.camera, [0.0, 1.6, 5.0, 1.2]);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 80);
    }
}
