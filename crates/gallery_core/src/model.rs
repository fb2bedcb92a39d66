//! Gallery records as delivered by the gallery-data endpoint.
//!
//! Field names follow the wire format (`userId`, `frameId`,
//! `framePositions`), so payloads deserialize without translation.

use serde::{Deserialize, Serialize};

/// Slot id of the distinguished, larger and brighter frame.
pub const FEATURED_SLOT_ID: &str = "center";

/// One uploaded artwork.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// Public URL of the stored image
    pub url: String,

    /// Display hint, conventionally only set for the featured slot
    #[serde(default)]
    pub featured: bool,

    /// Uploader id shown on the frame label
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Slot the image hangs in; may be empty or unknown in bad data
    #[serde(rename = "frameId", default)]
    pub frame_id: String,
}

impl GalleryImage {
    pub fn new(
        url: impl Into<String>,
        featured: bool,
        user_id: impl Into<String>,
        frame_id: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            featured,
            user_id: user_id.into(),
            frame_id: frame_id.into(),
        }
    }
}

/// Wall a frame slot hangs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wall {
    Back,
    Left,
    Right,
}

/// A named wall position that can hold one artwork.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSlot {
    pub id: String,
    pub name: String,
    pub wall: Wall,
    pub position: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl FrameSlot {
    fn canonical(id: &str, name: &str, wall: Wall, position: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            wall,
            position: position.to_string(),
            created_at: None,
        }
    }

    pub fn is_featured(&self) -> bool {
        self.id == FEATURED_SLOT_ID
    }
}

/// The seven slots the room is built around.
pub fn default_frame_slots() -> Vec<FrameSlot> {
    vec![
        FrameSlot::canonical("center", "Featured Center", Wall::Back, "center"),
        FrameSlot::canonical("backLeft", "Back Wall Left", Wall::Back, "left"),
        FrameSlot::canonical("backRight", "Back Wall Right", Wall::Back, "right"),
        FrameSlot::canonical("leftWall1", "Left Wall Front", Wall::Left, "front"),
        FrameSlot::canonical("leftWall2", "Left Wall Back", Wall::Left, "back"),
        FrameSlot::canonical("rightWall1", "Right Wall Front", Wall::Right, "front"),
        FrameSlot::canonical("rightWall2", "Right Wall Back", Wall::Right, "back"),
    ]
}

/// Payload of the gallery-data endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryData {
    #[serde(default)]
    pub images: Vec<GalleryImage>,

    #[serde(rename = "framePositions", default)]
    pub frame_positions: Vec<FrameSlot>,
}

impl GalleryData {
    pub fn new(images: Vec<GalleryImage>, frame_positions: Vec<FrameSlot>) -> Self {
        Self {
            images,
            frame_positions,
        }
    }

    /// Parse a payload; missing arrays become empty lists.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Slots that no image references yet.
    pub fn available_slots(&self) -> Vec<&FrameSlot> {
        self.frame_positions
            .iter()
            .filter(|slot| !self.images.iter().any(|image| image.frame_id == slot.id))
            .collect()
    }

    /// Whether an image already occupies the slot.
    pub fn is_occupied(&self, slot_id: &str) -> bool {
        self.images.iter().any(|image| image.frame_id == slot_id)
    }
}
