//! Spot light shadow maps: one depth layer per shadow-casting spot.

use wgpu::util::DeviceExt;

use crate::gpu_scene::{GpuScene, Vertex};
use crate::lights::{LightsUniform, MAX_SHADOW_LAYERS};

pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct ShadowMaps {
    texture: wgpu::Texture,
    array_view: wgpu::TextureView,
    layer_views: Vec<wgpu::TextureView>,
    sampler: wgpu::Sampler,
    layer_buffers: Vec<wgpu::Buffer>,
    layer_bind_groups: Vec<wgpu::BindGroup>,
    pipeline: wgpu::RenderPipeline,
    active_layers: usize,
    enabled: bool,
}

impl ShadowMaps {
    /// With shadows disabled a 1x1 map is still created so the scene bind
    /// group layout stays the same.
    pub fn new(
        device: &wgpu::Device,
        object_layout: &wgpu::BindGroupLayout,
        enabled: bool,
        map_size: u32,
    ) -> Self {
        let side = if enabled { map_size.max(1) } else { 1 };
        let layers = if enabled { MAX_SHADOW_LAYERS } else { 1 };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Maps"),
            size: wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: layers as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Shadow Map Array"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let layer_views = (0..layers as u32)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Shadow Map Layer"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Light Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let identity = gallery_math::Mat4::IDENTITY.to_cols_array_2d();
        let layer_buffers: Vec<wgpu::Buffer> = (0..layers)
            .map(|_| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Shadow Light Buffer"),
                    contents: bytemuck::cast_slice(&[identity]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                })
            })
            .collect();

        let layer_bind_groups = layer_buffers
            .iter()
            .map(|buffer| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Shadow Light Bind Group"),
                    layout: &light_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                })
            })
            .collect();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&light_layout, object_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // Planes are single-sided
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SHADOW_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        log::info!(
            "Shadow maps: {} layers of {}x{} ({})",
            layers,
            side,
            side,
            if enabled { "enabled" } else { "disabled" }
        );

        Self {
            texture,
            array_view,
            layer_views,
            sampler,
            layer_buffers,
            layer_bind_groups,
            pipeline,
            active_layers: 0,
            enabled,
        }
    }

    pub fn array_view(&self) -> &wgpu::TextureView {
        &self.array_view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn active_layers(&self) -> usize {
        self.active_layers
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Write each shadow layer's light matrix.
    pub fn update(&mut self, queue: &wgpu::Queue, lights: &LightsUniform) {
        if !self.enabled {
            self.active_layers = 0;
            return;
        }
        let matrices = lights.shadow_matrices();
        for (buffer, matrix) in self.layer_buffers.iter().zip(&matrices) {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*matrix]));
        }
        self.active_layers = matrices.len().min(self.layer_buffers.len());
    }

    /// Render shadow casters into every active layer.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, scene: &GpuScene) {
        for layer in 0..self.active_layers {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.layer_views[layer],
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.layer_bind_groups[layer], &[]);
            for node in scene.nodes().iter().filter(|node| node.cast_shadow) {
                let mesh = scene.mesh(node.mesh);
                pass.set_bind_group(1, &node.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
            }
        }
    }
}

impl Drop for ShadowMaps {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}
