//! Painting factory: framed artwork and empty-slot frames.
//!
//! Both variants share one builder that lays out a picture panel, four
//! border beams and the labels; they differ only in materials, label
//! artwork and what the panel shows. Groups are built at the origin facing
//! +Z; the caller places them with the slot transform.

use std::f32::consts::PI;
use std::sync::Arc;

use gallery_math::Vec3;

use crate::label::{hex_rgba, FontWeight, LabelCanvas};
use crate::mesh::Mesh;
use crate::scene::{color_hex, Group, GroupKind, Material, Node, SpotLight, Transform};
use crate::slots::SlotTransform;
use crate::texture::TextureImage;

const FRAME_DEPTH: f32 = 0.05;
const FRAME_BORDER: f32 = 0.1;
const CANVAS_THICKNESS: f32 = 0.01;

/// What the frame holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameVariant {
    /// An artwork (or the error texture standing in for one)
    Filled,
    /// Nothing yet; shows the "available" panel
    Placeholder,
}

/// Materials and proportions of one variant × featured combination.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStyle {
    pub variant: FrameVariant,
    pub featured: bool,
    pub border: f32,
    pub depth: f32,
    pub frame_color: u32,
    pub frame_roughness: f32,
    pub frame_metalness: f32,
    pub frame_emissive: u32,
    pub frame_emissive_intensity: f32,
}

impl FrameStyle {
    pub fn new(variant: FrameVariant, featured: bool) -> Self {
        // Featured frames get double border and double depth
        let scale = if featured { 2.0 } else { 1.0 };
        let (color, roughness, metalness, emissive, emissive_intensity) =
            match (variant, featured) {
                (FrameVariant::Filled, true) => (0xffd700, 0.2, 0.9, 0x996515, 0.4),
                (FrameVariant::Filled, false) => (0xd4af37, 0.3, 0.7, 0x553311, 0.2),
                (FrameVariant::Placeholder, true) => (0xb0b0b0, 0.4, 0.6, 0x555555, 0.2),
                (FrameVariant::Placeholder, false) => (0x909090, 0.4, 0.6, 0x333333, 0.2),
            };

        Self {
            variant,
            featured,
            border: FRAME_BORDER * scale,
            depth: FRAME_DEPTH * scale,
            frame_color: color,
            frame_roughness: roughness,
            frame_metalness: metalness,
            frame_emissive: emissive,
            frame_emissive_intensity: emissive_intensity,
        }
    }

    fn frame_material(&self) -> Material {
        let name = match self.variant {
            FrameVariant::Filled => "frame",
            FrameVariant::Placeholder => "placeholder_frame",
        };
        Material::standard(name, self.frame_color, self.frame_roughness, self.frame_metalness)
            .with_emissive(self.frame_emissive, self.frame_emissive_intensity)
    }
}

/// Source tag given to generated label textures.
pub fn label_source(text: &str) -> String {
    format!("<label:{text}>")
}

/// Lay out the four border beams around a `width`×`height` picture.
fn push_border(group: &mut Group, width: f32, height: f32, style: &FrameStyle) {
    let material = Arc::new(style.frame_material());
    let b = style.border;
    let d = style.depth;

    let beams = [
        ("frame_top", (width + b * 2.0, b), Vec3::new(0.0, height / 2.0 + b / 2.0, 0.0)),
        ("frame_bottom", (width + b * 2.0, b), Vec3::new(0.0, -height / 2.0 - b / 2.0, 0.0)),
        ("frame_left", (b, height + b * 2.0), Vec3::new(-width / 2.0 - b / 2.0, 0.0, 0.0)),
        ("frame_right", (b, height + b * 2.0), Vec3::new(width / 2.0 + b / 2.0, 0.0, 0.0)),
    ];
    for (name, (w, h), position) in beams {
        group.push(Node::new(
            name,
            Mesh::cuboid(w, h, d),
            material.clone(),
            Transform::from_translation(position),
        ));
    }
}

fn push_label(
    group: &mut Group,
    name: &str,
    texture: TextureImage,
    size: (f32, f32),
    position: Vec3,
) {
    let material = Material::label(name, Arc::new(texture));
    group.push(Node::new(
        name,
        Mesh::plane(size.0, size.1),
        Arc::new(material),
        Transform::from_translation(position),
    ));
}

/// 256×64 dark tag with white text, used for uploader ids.
pub fn user_label_texture(text: &str) -> TextureImage {
    let mut canvas = LabelCanvas::new(256, 64);
    canvas.fill_rect(0, 0, 256, 64, hex_rgba(0x333333));
    canvas.fill_text_or_warn(text, 128.0, 32.0, 24.0, FontWeight::Regular, hex_rgba(0xffffff));
    canvas.into_texture(label_source(text))
}

/// 512×128 gold "FEATURED" banner.
pub fn featured_label_texture() -> TextureImage {
    let mut canvas = LabelCanvas::new(512, 128);
    canvas.fill_rect(0, 0, 512, 128, hex_rgba(0xffd700));
    canvas.fill_text_or_warn("FEATURED", 256.0, 64.0, 48.0, FontWeight::Bold, hex_rgba(0x000000));
    canvas.into_texture(label_source("FEATURED"))
}

/// 512×128 gradient card for an empty frame.
pub fn available_label_texture(featured: bool) -> TextureImage {
    let (top, bottom, stroke, ink, size, text) = if featured {
        (0xf0f0f0, 0xd0d0d0, 0x888888, 0x555555, 40.0, "FEATURED FRAME")
    } else {
        (0xe0e0e0, 0xc0c0c0, 0x666666, 0x444444, 32.0, "AVAILABLE FRAME")
    };

    let mut canvas = LabelCanvas::new(512, 128);
    canvas.fill_vertical_gradient(hex_rgba(top), hex_rgba(bottom));
    canvas.stroke_rect(10, 10, 492, 108, 10, hex_rgba(stroke));
    canvas.fill_text_or_warn(text, 256.0, 64.0, size, FontWeight::Bold, hex_rgba(ink));
    canvas.into_texture(label_source(text))
}

/// Framed artwork of the given (already aspect-fitted) size.
pub fn build(
    width: f32,
    height: f32,
    texture: Arc<TextureImage>,
    featured: bool,
    user_id: &str,
) -> Group {
    let style = FrameStyle::new(FrameVariant::Filled, featured);
    let mut group = Group::new("painting", GroupKind::Painting, Transform::default());

    let (emissive, emissive_intensity) = if featured {
        (0x555555, 0.4)
    } else {
        (0x333333, 0.2)
    };
    let canvas_material = Material {
        name: "canvas".into(),
        ..Material::default()
    }
    .with_map(texture)
    .with_emissive(emissive, emissive_intensity);

    group.push(
        Node::new(
            "canvas",
            Mesh::cuboid(width, height, CANVAS_THICKNESS),
            Arc::new(canvas_material),
            Transform::from_translation(Vec3::new(0.0, 0.0, FRAME_DEPTH / 2.0)),
        )
        .with_shadows(true, true),
    );

    push_border(&mut group, width, height, &style);

    let b = style.border;
    let front = style.depth / 2.0;
    let below = Vec3::new(0.0, -height / 2.0 - b - 0.1, front);
    if featured {
        push_label(
            &mut group,
            "label_featured",
            featured_label_texture(),
            (0.8, 0.2),
            Vec3::new(0.0, height / 2.0 + b + 0.15, front),
        );
        push_label(
            &mut group,
            "label_user",
            user_label_texture(&format!("By: {user_id}")),
            (0.4, 0.1),
            below,
        );
    } else {
        push_label(&mut group, "label_user", user_label_texture(user_id), (0.4, 0.1), below);
    }

    group
}

/// Empty frame placed at `slot`, at the slot's nominal size.
pub fn build_placeholder(slot: &SlotTransform, featured: bool) -> Group {
    let style = FrameStyle::new(FrameVariant::Placeholder, featured);
    let mut group = Group::new(
        "placeholder",
        GroupKind::Placeholder,
        Transform::from_translation_rotation(slot.position(), slot.rotation()),
    );

    let (width, height) = (slot.width, slot.height);
    group.push(Node::new(
        "panel",
        Mesh::plane(width, height),
        Arc::new(Material::standard("placeholder_panel", 0xf5f5f5, 0.9, 0.1)),
        Transform::from_translation(Vec3::new(0.0, 0.0, style.depth / 2.0 - 0.01)),
    ));

    push_border(&mut group, width, height, &style);

    let size = if featured { (1.2, 0.3) } else { (0.8, 0.2) };
    push_label(
        &mut group,
        "label_available",
        available_label_texture(featured),
        size,
        Vec3::new(0.0, 0.0, style.depth / 2.0 + 0.01),
    );

    group
}

/// Spot that lights a hung painting from in front and slightly above.
pub fn painting_spotlight(slot: &SlotTransform, featured: bool) -> SpotLight {
    let target = slot.position();
    let position = target + slot.normal() * 1.5 + Vec3::new(0.0, 0.5, 0.0);
    let (color, intensity) = if featured {
        (color_hex(0xfffaf0), 2.5)
    } else {
        (Vec3::ONE, 1.5)
    };

    SpotLight {
        color,
        angle: PI / 8.0,
        penumbra: 0.5,
        decay: 1.5,
        distance: 5.0,
        ..SpotLight::new(position, target, intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::resolve;

    fn white() -> Arc<TextureImage> {
        Arc::new(TextureImage::solid_color([255; 4]))
    }

    fn label_text(group: &Group, name: &str) -> Option<String> {
        group
            .find(name)
            .and_then(|node| node.material.map.as_ref())
            .map(|map| map.source.clone())
    }

    #[test]
    fn test_styles_cover_all_variants() {
        let filled = FrameStyle::new(FrameVariant::Filled, false);
        let featured = FrameStyle::new(FrameVariant::Filled, true);
        assert_eq!(filled.border, 0.1);
        assert_eq!(featured.border, 0.2);
        assert_eq!(featured.depth, filled.depth * 2.0);
        assert_eq!(featured.frame_color, 0xffd700);

        let empty = FrameStyle::new(FrameVariant::Placeholder, false);
        let empty_featured = FrameStyle::new(FrameVariant::Placeholder, true);
        assert_eq!(empty.frame_color, 0x909090);
        assert_eq!(empty_featured.frame_color, 0xb0b0b0);
        assert_eq!(empty_featured.border, featured.border);
    }

    #[test]
    fn test_standard_painting() {
        let group = build(1.5, 1.0, white(), false, "abc123");
        assert_eq!(group.kind, GroupKind::Painting);
        // canvas + 4 beams + user label
        assert_eq!(group.nodes.len(), 6);
        assert_eq!(label_text(&group, "label_user").unwrap(), "<label:abc123>");
        assert!(group.find("label_featured").is_none());

        let canvas = group.find("canvas").unwrap();
        assert!(canvas.cast_shadow && canvas.receive_shadow);
        let (min, max) = canvas.mesh.bounds();
        assert!((max.x - min.x - 1.5).abs() < 1e-6);
        assert!((max.y - min.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_featured_painting_labels() {
        let group = build(2.5, 2.5, white(), true, "abc123");
        assert_eq!(group.nodes.len(), 7);
        assert_eq!(label_text(&group, "label_featured").unwrap(), "<label:FEATURED>");
        assert_eq!(label_text(&group, "label_user").unwrap(), "<label:By: abc123>");

        let banner = group.find("label_featured").unwrap();
        assert!(banner.transform.translation.y > 2.5 / 2.0);
        let by = group.find("label_user").unwrap();
        assert!(by.transform.translation.y < -2.5 / 2.0);
        assert!(banner.material.unlit && banner.material.transparent);
    }

    #[test]
    fn test_border_beams_enclose_picture() {
        let group = build(1.0, 2.0, white(), false, "u");
        let top = group.find("frame_top").unwrap();
        let right = group.find("frame_right").unwrap();

        assert!((top.transform.translation.y - 1.05).abs() < 1e-6);
        assert!((right.transform.translation.x - 0.55).abs() < 1e-6);
        let (min, max) = top.mesh.bounds();
        assert!((max.x - min.x - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_placeholder_uses_slot_transform() {
        let slot = resolve("leftWall1");
        let group = build_placeholder(&slot, false);
        assert_eq!(group.kind, GroupKind::Placeholder);
        assert_eq!(group.transform.translation, slot.position());
        assert_eq!(
            label_text(&group, "label_available").unwrap(),
            "<label:AVAILABLE FRAME>"
        );

        let featured = build_placeholder(&resolve("center"), true);
        assert_eq!(
            label_text(&featured, "label_available").unwrap(),
            "<label:FEATURED FRAME>"
        );
        let panel = featured.find("panel").unwrap();
        let (min, max) = panel.mesh.bounds();
        assert!((max.x - min.x - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_painting_spotlight_faces_picture() {
        let slot = resolve("rightWall2");
        let spot = painting_spotlight(&slot, false);
        assert_eq!(spot.intensity, 1.5);
        assert_eq!(spot.target, slot.position());
        // In front of the right wall, i.e. toward -X
        assert!(spot.position.x < slot.x);
        assert!((spot.position.y - 2.0).abs() < 1e-6);

        let featured = painting_spotlight(&resolve("center"), true);
        assert_eq!(featured.intensity, 2.5);
        assert!((featured.position.z - (-4.95 + 1.5)).abs() < 1e-5);
    }
}
