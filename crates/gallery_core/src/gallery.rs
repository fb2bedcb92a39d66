//! Gallery planning and the mounted-scene lifecycle.
//!
//! [`plan_gallery`] decides which visuals a gallery needs. [`GalleryScene`]
//! owns the scene graph built from a plan: room and placeholders go in at
//! mount, paintings go in as their textures resolve, and `unmount` releases
//! everything exactly once.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::loader::{ImageFetcher, LoadOutcome, LoadState, TextureLoader};
use crate::model::{FrameSlot, GalleryData, GalleryImage, FEATURED_SLOT_ID};
use crate::painting::{build, build_placeholder, painting_spotlight};
use crate::room::build_room;
use crate::scene::{GroupKind, Light, ReleaseStats, SceneGraph, Transform};
use crate::slots::{lookup, SlotTransform};
use crate::texture::{error_texture, fit_to_aspect, TextureImage};

/// An image and where it hangs.
#[derive(Clone, Debug, PartialEq)]
pub struct FilledPlacement {
    pub image: GalleryImage,
    pub slot: SlotTransform,
    /// False when the frame id matched no canonical slot
    pub known_slot: bool,
}

/// An unreferenced slot that gets an empty frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceholderPlacement {
    pub slot_id: String,
    pub slot: SlotTransform,
    pub featured: bool,
}

/// Every visual a gallery needs, before any texture is loaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GalleryPlan {
    pub filled: Vec<FilledPlacement>,
    pub placeholders: Vec<PlaceholderPlacement>,
}

impl GalleryPlan {
    /// Images whose frame id did not resolve to a canonical slot.
    pub fn unknown_slots(&self) -> impl Iterator<Item = &FilledPlacement> {
        self.filled.iter().filter(|placement| !placement.known_slot)
    }

    pub fn visual_count(&self) -> usize {
        self.filled.len() + self.placeholders.len()
    }
}

fn resolve_logged(slot_id: &str, context: &str) -> (SlotTransform, bool) {
    match lookup(slot_id) {
        Some(slot) => (slot, true),
        None => {
            log::warn!(
                "Unknown frame id '{}' on {}; hanging it at the fallback position",
                slot_id,
                context
            );
            (SlotTransform::FALLBACK, false)
        }
    }
}

/// One painting per image, one placeholder per unreferenced slot id.
pub fn plan_gallery(images: &[GalleryImage], slots: &[FrameSlot]) -> GalleryPlan {
    let filled = images
        .iter()
        .map(|image| {
            let (slot, known_slot) = resolve_logged(&image.frame_id, &image.url);
            FilledPlacement {
                image: image.clone(),
                slot,
                known_slot,
            }
        })
        .collect();

    let taken: HashSet<&str> = images.iter().map(|image| image.frame_id.as_str()).collect();
    let mut seen = HashSet::new();
    let placeholders = slots
        .iter()
        .filter(|slot| !taken.contains(slot.id.as_str()))
        .filter(|slot| seen.insert(slot.id.as_str()))
        .map(|slot| {
            let (transform, _) = resolve_logged(&slot.id, &slot.name);
            PlaceholderPlacement {
                slot_id: slot.id.clone(),
                slot: transform,
                featured: slot.id == FEATURED_SLOT_ID,
            }
        })
        .collect();

    GalleryPlan {
        filled,
        placeholders,
    }
}

/// Visual and load tallies for a mounted gallery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisualCounts {
    pub paintings: usize,
    pub placeholders: usize,
    pub pending: usize,
    pub textured: usize,
    pub errored: usize,
}

impl VisualCounts {
    pub fn loads_total(&self) -> usize {
        self.pending + self.textured + self.errored
    }

    pub fn loads_done(&self) -> usize {
        self.textured + self.errored
    }
}

struct ImageLoad {
    placement: FilledPlacement,
    state: LoadState,
}

/// A mounted gallery: the scene graph plus the loads feeding it.
pub struct GalleryScene {
    scene: SceneGraph,
    loads: Vec<ImageLoad>,
    loader: TextureLoader,
    mounted: bool,
}

impl GalleryScene {
    /// Build the room and placeholders and start every image load.
    pub fn mount(data: &GalleryData, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let plan = plan_gallery(&data.images, &data.frame_positions);

        let mut scene = SceneGraph::new();
        build_room(&mut scene);

        for placement in &plan.placeholders {
            let mut group = build_placeholder(&placement.slot, placement.featured);
            group.name = format!("placeholder:{}", placement.slot_id);
            scene.add_group(group);
        }

        let mut loader = TextureLoader::new(fetcher);
        let loads: Vec<ImageLoad> = plan
            .filled
            .into_iter()
            .map(|placement| ImageLoad {
                placement,
                state: LoadState::Pending,
            })
            .collect();
        for (index, load) in loads.iter().enumerate() {
            loader.request(index, &load.placement.image.url);
        }

        log::info!(
            "Mounted gallery: {} images loading, {} placeholders",
            loads.len(),
            plan.placeholders.len()
        );

        Self {
            scene,
            loads,
            loader,
            mounted: true,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn load_state(&self, index: usize) -> Option<&LoadState> {
        self.loads.get(index).map(|load| &load.state)
    }

    /// Apply every outcome that has arrived. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        if !self.mounted {
            return 0;
        }
        let mut applied = 0;
        for outcome in self.loader.poll() {
            if self.apply(outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every load has settled or `timeout` passes.
    ///
    /// Returns true when nothing is left pending.
    pub fn wait_for_loads(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.mounted && self.loads.iter().any(|load| load.state.is_pending()) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.loader.wait(remaining) {
                Some(outcome) => {
                    self.apply(outcome);
                }
                None => return false,
            }
        }
        true
    }

    /// Transition one load out of `Pending` and hang its painting.
    ///
    /// Outcomes for settled loads or after unmount are ignored.
    pub fn apply(&mut self, outcome: LoadOutcome) -> bool {
        if !self.mounted {
            return false;
        }
        let Some(load) = self.loads.get_mut(outcome.index) else {
            log::warn!("Load outcome for unknown request {}", outcome.index);
            return false;
        };
        if !load.state.is_pending() {
            return false;
        }

        let placement = load.placement.clone();
        let image = &placement.image;
        let slot = placement.slot;

        let (texture, loaded) = match outcome.result {
            Ok(texture) => {
                log::info!(
                    "Loaded {} for frame '{}' ({}x{})",
                    image.url,
                    image.frame_id,
                    texture.width,
                    texture.height
                );
                let texture = Arc::new(texture);
                load.state = LoadState::Textured(texture.clone());
                (texture, true)
            }
            Err(e) => {
                log::warn!(
                    "Failed to load {} for frame '{}': {}",
                    image.url,
                    image.frame_id,
                    e
                );
                load.state = LoadState::Errored(e.to_string());
                (Arc::new(error_texture(&image.user_id)), false)
            }
        };

        self.hang(&placement, texture);
        if loaded {
            self.scene
                .add_light(Light::Spot(painting_spotlight(&slot, image.featured)));
        }
        true
    }

    fn hang(&mut self, placement: &FilledPlacement, texture: Arc<TextureImage>) {
        let slot = &placement.slot;
        let image = &placement.image;
        let (width, height) = fit_to_aspect(slot.width, slot.height, texture.aspect_ratio());

        let mut group = build(width, height, texture, image.featured, &image.user_id);
        group.name = format!("painting:{}", image.frame_id);
        group.transform = Transform::from_translation_rotation(slot.position(), slot.rotation());
        self.scene.add_group(group);
    }

    pub fn counts(&self) -> VisualCounts {
        let mut counts = VisualCounts {
            paintings: self.scene.groups_of(GroupKind::Painting).count(),
            placeholders: self.scene.groups_of(GroupKind::Placeholder).count(),
            ..Default::default()
        };
        for load in &self.loads {
            match load.state {
                LoadState::Pending => counts.pending += 1,
                LoadState::Textured(_) => counts.textured += 1,
                LoadState::Errored(_) => counts.errored += 1,
            }
        }
        counts
    }

    /// Release the scene. Safe to call more than once.
    pub fn unmount(&mut self) -> ReleaseStats {
        if !self.mounted {
            log::debug!("Gallery already unmounted");
            return ReleaseStats::default();
        }
        self.mounted = false;
        self.loader.abandon();

        let counts = self.counts();
        let stats = self.scene.dispose();
        log::info!(
            "Unmounted gallery: {} paintings, {} placeholders; released {} geometries, {} materials, {} textures",
            counts.paintings,
            counts.placeholders,
            stats.geometries,
            stats.materials,
            stats.textures
        );
        stats
    }
}

impl Drop for GalleryScene {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_frame_slots;

    #[test]
    fn test_plan_empty_gallery() {
        let plan = plan_gallery(&[], &default_frame_slots());
        assert!(plan.filled.is_empty());
        assert_eq!(plan.placeholders.len(), 7);
        assert_eq!(plan.placeholders.iter().filter(|p| p.featured).count(), 1);
        assert!(plan.placeholders[0].featured);
        assert_eq!(plan.placeholders[0].slot_id, "center");
    }

    #[test]
    fn test_plan_referenced_slots_get_no_placeholder() {
        let images = vec![
            GalleryImage::new("a.png", false, "u1", "leftWall1"),
            GalleryImage::new("b.png", false, "u2", "backRight"),
        ];
        let plan = plan_gallery(&images, &default_frame_slots());

        assert_eq!(plan.filled.len(), 2);
        assert_eq!(plan.placeholders.len(), 5);
        assert!(plan
            .placeholders
            .iter()
            .all(|p| p.slot_id != "leftWall1" && p.slot_id != "backRight"));
        assert_eq!(plan.visual_count(), 7);
    }

    #[test]
    fn test_plan_unknown_frame_id_still_hangs() {
        let images = vec![GalleryImage::new("a.png", false, "u1", "attic")];
        let plan = plan_gallery(&images, &default_frame_slots());

        assert_eq!(plan.filled.len(), 1);
        assert!(!plan.filled[0].known_slot);
        assert_eq!(plan.filled[0].slot, SlotTransform::FALLBACK);
        assert_eq!(plan.unknown_slots().count(), 1);
        assert_eq!(plan.placeholders.len(), 7);
    }

    #[test]
    fn test_plan_duplicate_slots_yield_one_placeholder() {
        let mut slots = default_frame_slots();
        slots.push(slots[1].clone());
        let plan = plan_gallery(&[], &slots);
        assert_eq!(plan.placeholders.len(), 7);
    }

    #[test]
    fn test_plan_featured_placeholder_only_for_center() {
        let slots = default_frame_slots();
        let images = vec![GalleryImage::new("a.png", true, "u1", "center")];
        let plan = plan_gallery(&images, &slots);
        assert!(plan.placeholders.iter().all(|p| !p.featured));
    }

    #[test]
    fn test_visual_counts_totals() {
        let counts = VisualCounts {
            pending: 1,
            textured: 2,
            errored: 3,
            ..Default::default()
        };
        assert_eq!(counts.loads_total(), 6);
        assert_eq!(counts.loads_done(), 5);
    }
}
