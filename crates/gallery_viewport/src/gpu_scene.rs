//! GPU-resident copy of a [`SceneGraph`].
//!
//! Groups are uploaded incrementally: the scene graph only ever grows while
//! mounted (paintings arrive as their textures resolve), so `sync` uploads
//! the groups added since the last call. Meshes and textures shared between
//! nodes through `Arc` are uploaded once.

use std::collections::HashMap;
use std::sync::Arc;

use gallery_core::{Mesh, Node, ReleaseStats, SceneGraph, TextureImage};
use gallery_math::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::lights::LightsUniform;
use crate::Renderer;

/// Vertex data for rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    pub fn from_mesh(mesh: &Mesh) -> Vec<Self> {
        mesh.positions
            .iter()
            .zip(&mesh.normals)
            .zip(&mesh.uvs)
            .map(|((position, normal), uv)| Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: *uv,
            })
            .collect()
    }
}

/// Per-node uniform: transforms plus material parameters.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    /// roughness, metalness, unlit, receive shadow
    pub params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(world: Mat4, node: &Node) -> Self {
        let material = &node.material;
        let normal = if world.determinant().abs() > 1e-8 {
            world.inverse().transpose()
        } else {
            world
        };
        let flag = |value: bool| if value { 1.0 } else { 0.0 };

        Self {
            model: world.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            color: material.color.extend(1.0).to_array(),
            emissive: (material.emissive * material.emissive_intensity)
                .extend(0.0)
                .to_array(),
            params: [
                material.roughness,
                material.metalness,
                flag(material.unlit),
                flag(node.receive_shadow),
            ],
        }
    }
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    _source: Arc<Mesh>,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    _source: Option<Arc<TextureImage>>,
}

pub struct GpuNode {
    pub mesh: usize,
    pub bind_group: wgpu::BindGroup,
    pub transparent: bool,
    pub cast_shadow: bool,
    uniform_buffer: wgpu::Buffer,
}

/// What one `sync` call uploaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub groups: usize,
    pub nodes: usize,
    pub lights_changed: bool,
}

pub struct GpuScene {
    meshes: Vec<GpuMesh>,
    mesh_lookup: HashMap<usize, usize>,
    textures: HashMap<usize, GpuTexture>,
    nodes: Vec<GpuNode>,
    white: GpuTexture,
    sampler: wgpu::Sampler,
    uploaded_groups: usize,
    uploaded_lights: usize,
    background: Option<Vec3>,
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &TextureImage,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

impl GpuScene {
    pub fn new(renderer: &Renderer) -> Self {
        let white_image = TextureImage::solid_color([255, 255, 255, 255]);
        let (texture, view) =
            create_texture(&renderer.device, &renderer.queue, &white_image, "White Texture");

        let sampler = renderer.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            meshes: Vec::new(),
            mesh_lookup: HashMap::new(),
            textures: HashMap::new(),
            nodes: Vec::new(),
            white: GpuTexture {
                texture,
                view,
                _source: None,
            },
            sampler,
            uploaded_groups: 0,
            uploaded_lights: 0,
            background: None,
        }
    }

    pub fn nodes(&self) -> &[GpuNode] {
        &self.nodes
    }

    pub fn mesh(&self, index: usize) -> &GpuMesh {
        &self.meshes[index]
    }

    pub fn uploaded_groups(&self) -> usize {
        self.uploaded_groups
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Clear color of the synced scene, if any.
    pub fn background(&self) -> Option<Vec3> {
        self.background
    }

    /// Upload groups and lights added to `scene` since the last call.
    pub fn sync(&mut self, renderer: &mut Renderer, scene: &SceneGraph) -> SyncReport {
        let mut report = SyncReport::default();
        if scene.is_disposed() {
            return report;
        }
        if scene.groups().len() < self.uploaded_groups {
            log::warn!("Scene graph shrank under the GPU copy; re-uploading");
            self.dispose();
        }

        self.background = Some(scene.background);

        for group in &scene.groups()[self.uploaded_groups..] {
            let parent = group.transform.to_matrix();
            for node in &group.nodes {
                let world = parent * node.transform.to_matrix();
                let gpu_node = self.upload_node(renderer, world, node);
                self.nodes.push(gpu_node);
                report.nodes += 1;
            }
            log::debug!("Uploaded group '{}' ({} nodes)", group.name, group.nodes.len());
            report.groups += 1;
        }
        self.uploaded_groups = scene.groups().len();

        if scene.lights().len() != self.uploaded_lights {
            let lights = LightsUniform::from_lights(scene.lights(), renderer.shadows_enabled());
            renderer.set_lights(&lights);
            self.uploaded_lights = scene.lights().len();
            report.lights_changed = true;
        }

        report
    }

    fn upload_mesh(&mut self, device: &wgpu::Device, mesh: &Arc<Mesh>) -> usize {
        let key = Arc::as_ptr(mesh) as usize;
        if let Some(index) = self.mesh_lookup.get(&key) {
            return *index;
        }

        let vertices = Vertex::from_mesh(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            num_indices: mesh.indices.len() as u32,
            _source: mesh.clone(),
        });
        let index = self.meshes.len() - 1;
        self.mesh_lookup.insert(key, index);
        index
    }

    /// Upload `image` on first use and return its cache key. Images larger
    /// than the device allows are skipped and render white.
    fn upload_texture(&mut self, renderer: &Renderer, image: &Arc<TextureImage>) -> Option<usize> {
        let key = Arc::as_ptr(image) as usize;
        let max_side = renderer.device.limits().max_texture_dimension_2d;
        if image.width > max_side || image.height > max_side {
            log::warn!(
                "Texture {} is {}x{}, above the device limit of {}",
                image.source,
                image.width,
                image.height,
                max_side
            );
            return None;
        }

        self.textures.entry(key).or_insert_with(|| {
            let (texture, view) =
                create_texture(&renderer.device, &renderer.queue, image, &image.source);
            GpuTexture {
                texture,
                view,
                _source: Some(image.clone()),
            }
        });
        Some(key)
    }

    fn upload_node(&mut self, renderer: &Renderer, world: Mat4, node: &Node) -> GpuNode {
        let mesh = self.upload_mesh(&renderer.device, &node.mesh);

        let uniform = ObjectUniform::new(world, node);
        let uniform_buffer = renderer
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&node.name),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let texture = node
            .material
            .map
            .as_ref()
            .and_then(|image| self.upload_texture(renderer, image));
        let view = texture
            .and_then(|key| self.textures.get(&key))
            .map_or(&self.white.view, |texture| &texture.view);
        let bind_group = renderer.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&node.name),
            layout: renderer.object_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        GpuNode {
            mesh,
            bind_group,
            transparent: node.material.transparent,
            cast_shadow: node.cast_shadow,
            uniform_buffer,
        }
    }

    /// Destroy every uploaded buffer and texture. Safe to call repeatedly;
    /// the shared white texture and sampler stay alive for the next mount.
    pub fn dispose(&mut self) -> ReleaseStats {
        let stats = ReleaseStats {
            geometries: self.meshes.len(),
            materials: self.nodes.len(),
            textures: self.textures.len(),
            lights: self.uploaded_lights,
        };

        for mesh in self.meshes.drain(..) {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
        for node in self.nodes.drain(..) {
            node.uniform_buffer.destroy();
        }
        for (_, texture) in self.textures.drain() {
            texture.texture.destroy();
        }
        self.mesh_lookup.clear();
        self.uploaded_groups = 0;
        self.uploaded_lights = 0;
        self.background = None;

        stats
    }
}

impl Drop for GpuScene {
    fn drop(&mut self) {
        self.dispose();
        self.white.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_core::{Material, Transform};
    use gallery_math::{Quat, Vec4};

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 176);
    }

    #[test]
    fn test_vertices_from_mesh() {
        let mesh = Mesh::plane(2.0, 1.0);
        let vertices = Vertex::from_mesh(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert!(vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_object_uniform_material_params() {
        let material = Arc::new(
            Material::standard("gold", 0xffd700, 0.3, 0.8).with_emissive(0x332200, 0.5),
        );
        let node = Node::new("frame", Mesh::cuboid(1.0, 1.0, 1.0), material, Transform::default())
            .with_shadows(true, true);
        let uniform = ObjectUniform::new(Mat4::IDENTITY, &node);

        assert_eq!(uniform.params, [0.3, 0.8, 0.0, 1.0]);
        assert_eq!(uniform.color[3], 1.0);
        assert!(uniform.emissive[0] > 0.0);
    }

    #[test]
    fn test_normal_matrix_follows_rotation() {
        let material = Arc::new(Material::default());
        let node = Node::new("wall", Mesh::plane(1.0, 1.0), material, Transform::default());
        let world = Mat4::from_rotation_translation(
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::new(-4.9, 1.5, 0.0),
        );
        let uniform = ObjectUniform::new(world, &node);
        let normal = Mat4::from_cols_array_2d(&uniform.normal) * Vec4::new(0.0, 0.0, 1.0, 0.0);
        assert!((normal.truncate() - Vec3::X).length() < 1e-5);
    }
}
