//! Gallery Core - GPU-agnostic scene building for the virtual gallery.
//!
//! This crate provides:
//!
//! - **Data model**: `GalleryData`, `GalleryImage`, `FrameSlot`
//! - **Slot resolver**: fixed wall placements for the canonical slot ids
//! - **Scene graph**: meshes, materials, lights and idempotent disposal
//! - **Painting factory**: framed artwork, placeholders and their labels
//! - **Texture pipeline**: background fetch + decode with an error stand-in
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gallery_core::{GalleryData, GalleryScene, UrlFetcher};
//!
//! let data = GalleryData::from_json(&payload)?;
//! let mut gallery = GalleryScene::mount(&data, Arc::new(UrlFetcher::new()));
//! // each frame:
//! gallery.poll();
//! // on teardown:
//! gallery.unmount();
//! ```

pub mod gallery;
pub mod label;
pub mod loader;
pub mod mesh;
pub mod model;
pub mod painting;
pub mod room;
pub mod scene;
pub mod slots;
pub mod texture;

// Re-export commonly used types
pub use gallery::{plan_gallery, GalleryPlan, GalleryScene, VisualCounts};
pub use loader::{ImageFetcher, LoadOutcome, LoadState, TextureLoader, UrlFetcher};
pub use mesh::Mesh;
pub use model::{default_frame_slots, FrameSlot, GalleryData, GalleryImage, Wall};
pub use scene::{Group, GroupKind, Light, Material, Node, ReleaseStats, SceneGraph, Transform};
pub use slots::{resolve, SlotTransform};
pub use texture::{TextureError, TextureImage, TextureResult};
