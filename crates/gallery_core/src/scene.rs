//! Scene graph types for the gallery.
//!
//! The graph is renderer-agnostic: groups of mesh nodes with PBR-ish
//! materials, plus a flat list of lights. A viewport walks it to build GPU
//! resources; tests walk it to check what was built.

use std::collections::HashSet;
use std::sync::Arc;

use gallery_math::{Mat4, Quat, Vec3};

use crate::mesh::Mesh;
use crate::texture::{srgb_to_linear, TextureImage};

/// Convert a 0xRRGGBB sRGB color into linear RGB.
pub fn color_hex(hex: u32) -> Vec3 {
    Vec3::new(
        srgb_to_linear(((hex >> 16) & 0xff) as u8),
        srgb_to_linear(((hex >> 8) & 0xff) as u8),
        srgb_to_linear((hex & 0xff) as u8),
    )
}

/// Surface description for one node.
///
/// Lit materials follow the metal/roughness model. `unlit` materials show
/// their color (times map) as-is and ignore lights; labels use them.
#[derive(Clone, Debug)]
pub struct Material {
    /// Material name (for debugging)
    pub name: String,

    /// Base color (linear RGB)
    pub color: Vec3,

    /// Roughness factor (0=smooth, 1=rough)
    pub roughness: f32,

    /// Metallic factor (0=dielectric, 1=metal)
    pub metalness: f32,

    /// Emissive color (linear RGB), scaled by `emissive_intensity`
    pub emissive: Vec3,

    pub emissive_intensity: f32,

    /// Color map multiplied into `color`
    pub map: Option<Arc<TextureImage>>,

    /// Skip lighting entirely
    pub unlit: bool,

    /// Alpha blend against what is behind
    pub transparent: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Vec3::ONE,
            roughness: 1.0,
            metalness: 0.0,
            emissive: Vec3::ZERO,
            emissive_intensity: 1.0,
            map: None,
            unlit: false,
            transparent: false,
        }
    }
}

impl Material {
    /// Lit material from an sRGB hex color.
    pub fn standard(name: impl Into<String>, hex: u32, roughness: f32, metalness: f32) -> Self {
        Self {
            name: name.into(),
            color: color_hex(hex),
            roughness,
            metalness,
            ..Default::default()
        }
    }

    /// Unlit, alpha-blended material showing `map` as-is.
    pub fn label(name: impl Into<String>, map: Arc<TextureImage>) -> Self {
        Self {
            name: name.into(),
            map: Some(map),
            unlit: true,
            transparent: true,
            ..Default::default()
        }
    }

    pub fn with_emissive(mut self, hex: u32, intensity: f32) -> Self {
        self.emissive = color_hex(hex);
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_map(mut self, map: Arc<TextureImage>) -> Self {
        self.map = Some(map);
        self
    }

    /// Check if this material is emissive.
    pub fn is_emissive(&self) -> bool {
        self.emissive.length_squared() > 0.0 && self.emissive_intensity > 0.0
    }
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            ..Default::default()
        }
    }

    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// A drawable mesh with its material and local transform.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub mesh: Arc<Mesh>,
    pub material: Arc<Material>,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        mesh: Mesh,
        material: Arc<Material>,
        transform: Transform,
    ) -> Self {
        Self {
            name: name.into(),
            mesh: Arc::new(mesh),
            material,
            transform,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }
}

/// What a group represents in the gallery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    /// Floor, walls, ceiling, track and fixtures
    Room,
    /// Artwork (loaded or error texture) in a frame
    Painting,
    /// Empty-slot frame
    Placeholder,
}

/// Nodes sharing one parent transform.
#[derive(Clone, Debug)]
pub struct Group {
    pub name: String,
    pub kind: GroupKind,
    pub transform: Transform,
    pub nodes: Vec<Node>,
}

impl Group {
    pub fn new(name: impl Into<String>, kind: GroupKind, transform: Transform) -> Self {
        Self {
            name: name.into(),
            kind,
            transform,
            nodes: Vec::new(),
        }
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn find(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Textures referenced by this group's materials.
    pub fn textures(&self) -> impl Iterator<Item = &Arc<TextureImage>> {
        self.nodes.iter().filter_map(|node| node.material.map.as_ref())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Cutoff range; 0 means unlimited
    pub distance: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self {
            position,
            color: Vec3::ONE,
            intensity,
            distance: 0.0,
            decay: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Half-angle of the cone in radians
    pub angle: f32,
    /// Fraction of the cone that fades (0 = hard edge)
    pub penumbra: f32,
    pub decay: f32,
    /// Cutoff range; 0 means unlimited
    pub distance: f32,
    pub cast_shadow: bool,
    pub shadow_bias: f32,
}

impl SpotLight {
    pub fn new(position: Vec3, target: Vec3, intensity: f32) -> Self {
        Self {
            position,
            target,
            color: Vec3::ONE,
            intensity,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            decay: 2.0,
            distance: 0.0,
            cast_shadow: false,
            shadow_bias: 0.0,
        }
    }

    /// Unit vector from the light to its target.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }
}

/// Scene light sources.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Ambient { color: Vec3, intensity: f32 },
    Hemisphere { sky: Vec3, ground: Vec3, intensity: f32 },
    Point(PointLight),
    Spot(SpotLight),
}

/// Counts of resources handed back by [`SceneGraph::dispose`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReleaseStats {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
    pub lights: usize,
}

impl ReleaseStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The whole gallery scene: groups of nodes plus lights.
#[derive(Debug)]
pub struct SceneGraph {
    /// Clear color (linear RGB)
    pub background: Vec3,
    groups: Vec<Group>,
    lights: Vec<Light>,
    disposed: bool,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            background: Vec3::ONE,
            groups: Vec::new(),
            lights: Vec::new(),
            disposed: false,
        }
    }

    /// Add a group and return its index. Ignored once the graph is disposed.
    pub fn add_group(&mut self, group: Group) -> Option<usize> {
        if self.disposed {
            log::debug!("Dropping group '{}' added after dispose", group.name);
            return None;
        }
        self.groups.push(group);
        Some(self.groups.len() - 1)
    }

    pub fn add_light(&mut self, light: Light) {
        if self.disposed {
            log::debug!("Dropping light added after dispose");
            return;
        }
        self.lights.push(light);
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn groups_of(&self, kind: GroupKind) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(move |group| group.kind == kind)
    }

    pub fn spot_lights(&self) -> impl Iterator<Item = &SpotLight> {
        self.lights.iter().filter_map(|light| match light {
            Light::Spot(spot) => Some(spot),
            _ => None,
        })
    }

    /// Every node with its world matrix.
    pub fn drawables(&self) -> impl Iterator<Item = (Mat4, &Node)> {
        self.groups.iter().flat_map(|group| {
            let parent = group.transform.to_matrix();
            group
                .nodes
                .iter()
                .map(move |node| (parent * node.transform.to_matrix(), node))
        })
    }

    pub fn node_count(&self) -> usize {
        self.groups.iter().map(|group| group.nodes.len()).sum()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release every geometry, material and texture once.
    ///
    /// Shared `Arc`s are counted once. A second call releases nothing.
    pub fn dispose(&mut self) -> ReleaseStats {
        if self.disposed {
            return ReleaseStats::default();
        }
        self.disposed = true;

        let mut geometries = HashSet::new();
        let mut materials = HashSet::new();
        let mut textures = HashSet::new();

        for node in self.groups.iter().flat_map(|group| group.nodes.iter()) {
            geometries.insert(Arc::as_ptr(&node.mesh));
            materials.insert(Arc::as_ptr(&node.material));
            if let Some(map) = &node.material.map {
                textures.insert(Arc::as_ptr(map));
            }
        }

        let stats = ReleaseStats {
            geometries: geometries.len(),
            materials: materials.len(),
            textures: textures.len(),
            lights: self.lights.len(),
        };

        self.groups.clear();
        self.lights.clear();

        log::debug!(
            "Released {} geometries, {} materials, {} textures, {} lights",
            stats.geometries,
            stats.materials,
            stats.textures,
            stats.lights
        );
        stats
    }
}
