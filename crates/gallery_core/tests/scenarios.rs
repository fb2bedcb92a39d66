//! End-to-end gallery scenarios against the CPU scene graph.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gallery_core::scene::color_hex;
use gallery_core::texture::TextureError;
use gallery_core::{
    default_frame_slots, resolve, GalleryData, GalleryImage, GalleryScene, Group, GroupKind,
    ImageFetcher, Light, LoadState, TextureResult,
};

struct MemoryFetcher(HashMap<String, Vec<u8>>);

impl MemoryFetcher {
    fn new() -> Self {
        Self(HashMap::new())
    }

    fn with_png(mut self, url: &str, width: u32, height: u32) -> Self {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([90, 60, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();
        self.0.insert(url.to_string(), bytes.into_inner());
        self
    }
}

impl ImageFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> TextureResult<Vec<u8>> {
        self.0.get(url).cloned().ok_or_else(|| TextureError::Fetch {
            url: url.to_string(),
            reason: "connection refused".into(),
        })
    }
}

const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn group<'a>(gallery: &'a GalleryScene, name: &str) -> &'a Group {
    gallery
        .scene()
        .groups()
        .iter()
        .find(|group| group.name == name)
        .unwrap_or_else(|| panic!("no group named {name}"))
}

fn texture_source(group: &Group, node: &str) -> String {
    group
        .find(node)
        .and_then(|node| node.material.map.as_ref())
        .map(|map| map.source.clone())
        .unwrap_or_default()
}

fn painting_spots(gallery: &GalleryScene) -> usize {
    // Room lights carry exactly one non-shadow spot (the featured wall spot)
    gallery
        .scene()
        .lights()
        .iter()
        .filter(|light| matches!(light, Light::Spot(spot) if !spot.cast_shadow))
        .count()
        - 1
}

#[test]
fn test_empty_gallery_shows_seven_placeholders() {
    init_logging();
    let data = GalleryData::new(vec![], default_frame_slots());
    let mut gallery = GalleryScene::mount(&data, Arc::new(MemoryFetcher::new()));

    assert!(gallery.wait_for_loads(LOAD_TIMEOUT));
    let counts = gallery.counts();
    assert_eq!(counts.placeholders, 7);
    assert_eq!(counts.paintings, 0);

    let center = group(&gallery, "placeholder:center");
    assert_eq!(texture_source(center, "label_available"), "<label:FEATURED FRAME>");
    assert_eq!(
        center.find("frame_top").unwrap().material.color,
        color_hex(0xb0b0b0)
    );

    let featured_styled = gallery
        .scene()
        .groups_of(GroupKind::Placeholder)
        .filter(|group| texture_source(group, "label_available") == "<label:FEATURED FRAME>")
        .count();
    assert_eq!(featured_styled, 1);
}

#[test]
fn test_one_image_on_left_wall() {
    init_logging();
    let data = GalleryData::new(
        vec![GalleryImage::new("ok.png", false, "abc123", "leftWall1")],
        default_frame_slots(),
    );
    let fetcher = MemoryFetcher::new().with_png("ok.png", 300, 400);
    let mut gallery = GalleryScene::mount(&data, Arc::new(fetcher));

    // Placeholders are up before the texture resolves
    assert_eq!(gallery.counts().placeholders, 6);

    assert!(gallery.wait_for_loads(LOAD_TIMEOUT));
    let counts = gallery.counts();
    assert_eq!(counts.placeholders, 6);
    assert_eq!(counts.paintings, 1);
    assert_eq!(counts.textured, 1);
    assert!(gallery
        .scene()
        .groups()
        .iter()
        .all(|group| group.name != "placeholder:leftWall1"));

    let slot = resolve("leftWall1");
    let painting = group(&gallery, "painting:leftWall1");
    assert_eq!(painting.transform.translation, slot.position());
    assert_eq!(painting.transform.rotation, slot.rotation());
    assert_eq!(texture_source(painting, "label_user"), "<label:abc123>");
    assert_eq!(texture_source(painting, "canvas"), "ok.png");

    // 3:4 portrait keeps the nominal height of 2.0
    let (min, max) = painting.find("canvas").unwrap().mesh.bounds();
    assert!((max.y - min.y - 2.0).abs() < 1e-5);
    assert!((max.x - min.x - 1.5).abs() < 1e-5);

    assert_eq!(painting_spots(&gallery), 1);
    assert!(matches!(gallery.load_state(0), Some(LoadState::Textured(_))));
}

#[test]
fn test_unreachable_featured_image_shows_error_frame() {
    init_logging();
    let data = GalleryData::new(
        vec![GalleryImage::new(
            "https://unreachable.invalid/a.png",
            true,
            "abc123",
            "center",
        )],
        default_frame_slots(),
    );
    let mut gallery = GalleryScene::mount(&data, Arc::new(MemoryFetcher::new()));

    assert!(gallery.wait_for_loads(LOAD_TIMEOUT));
    let counts = gallery.counts();
    assert_eq!(counts.paintings, 1);
    assert_eq!(counts.errored, 1);
    assert_eq!(counts.placeholders, 6);

    let painting = group(&gallery, "painting:center");
    assert_eq!(texture_source(painting, "canvas"), "<error:abc123>");
    assert_eq!(texture_source(painting, "label_featured"), "<label:FEATURED>");
    assert_eq!(
        painting.find("frame_top").unwrap().material.color,
        color_hex(0xffd700)
    );

    // Error texture is square
    let (min, max) = painting.find("canvas").unwrap().mesh.bounds();
    assert!((max.x - min.x - (max.y - min.y)).abs() < 1e-5);

    // Failed loads get no spotlight
    assert_eq!(painting_spots(&gallery), 0);
}

#[test]
fn test_unknown_frame_id_gets_one_visual() {
    init_logging();
    let data = GalleryData::new(
        vec![GalleryImage::new("ok.png", false, "u9", "attic")],
        default_frame_slots(),
    );
    let fetcher = MemoryFetcher::new().with_png("ok.png", 8, 8);
    let mut gallery = GalleryScene::mount(&data, Arc::new(fetcher));

    assert!(gallery.wait_for_loads(LOAD_TIMEOUT));
    assert_eq!(gallery.counts().paintings, 1);
    assert_eq!(gallery.counts().placeholders, 7);
}

#[test]
fn test_mixed_loads_each_produce_one_painting() {
    init_logging();
    let data = GalleryData::new(
        vec![
            GalleryImage::new("wide.png", false, "u1", "backLeft"),
            GalleryImage::new("missing.png", false, "u2", "backRight"),
            GalleryImage::new("tall.png", false, "u3", "rightWall2"),
        ],
        default_frame_slots(),
    );
    let fetcher = MemoryFetcher::new()
        .with_png("wide.png", 40, 20)
        .with_png("tall.png", 10, 40);
    let mut gallery = GalleryScene::mount(&data, Arc::new(fetcher));

    assert!(gallery.wait_for_loads(LOAD_TIMEOUT));
    let counts = gallery.counts();
    assert_eq!(counts.paintings, 3);
    assert_eq!(counts.textured, 2);
    assert_eq!(counts.errored, 1);
    assert_eq!(counts.placeholders, 4);

    // Settled loads stay settled
    assert_eq!(gallery.poll(), 0);
    assert_eq!(gallery.counts().paintings, 3);

    let wide = group(&gallery, "painting:backLeft");
    let (min, max) = wide.find("canvas").unwrap().mesh.bounds();
    assert!((max.x - min.x - 1.5).abs() < 1e-5);
    assert!((max.y - min.y - 0.75).abs() < 1e-5);
}

#[test]
fn test_backend_error_renders_empty_room() {
    init_logging();
    let mut gallery = GalleryScene::mount(&GalleryData::default(), Arc::new(MemoryFetcher::new()));

    assert!(gallery.wait_for_loads(LOAD_TIMEOUT));
    assert_eq!(gallery.counts().placeholders, 0);
    assert_eq!(gallery.scene().groups_of(GroupKind::Room).count(), 1);
}

#[test]
fn test_unmount_twice_releases_once() {
    init_logging();
    let data = GalleryData::new(
        vec![GalleryImage::new("ok.png", true, "abc123", "center")],
        default_frame_slots(),
    );
    let fetcher = MemoryFetcher::new().with_png("ok.png", 16, 16);
    let mut gallery = GalleryScene::mount(&data, Arc::new(fetcher));
    assert!(gallery.wait_for_loads(LOAD_TIMEOUT));

    let first = gallery.unmount();
    assert!(first.geometries > 0);
    assert!(first.materials > 0);
    // artwork + FEATURED + By: label, plus 6 placeholder labels
    assert_eq!(first.textures, 9);

    let second = gallery.unmount();
    assert!(second.is_empty());
    assert!(!gallery.is_mounted());
    assert_eq!(gallery.scene().node_count(), 0);
}

#[test]
fn test_unmount_before_loads_finish() {
    init_logging();
    let data = GalleryData::new(
        vec![GalleryImage::new("ok.png", false, "u1", "backLeft")],
        default_frame_slots(),
    );
    let fetcher = MemoryFetcher::new().with_png("ok.png", 16, 16);
    let mut gallery = GalleryScene::mount(&data, Arc::new(fetcher));

    gallery.unmount();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(gallery.poll(), 0);
    assert_eq!(gallery.scene().node_count(), 0);
}
