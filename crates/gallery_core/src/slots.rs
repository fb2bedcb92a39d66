//! Slot id → wall placement lookup.

use std::f32::consts::FRAC_PI_2;

use gallery_math::{Mat4, Quat, Vec3};

/// Slot ids with a fixed placement in the room, featured slot first.
pub const CANONICAL_SLOT_IDS: [&str; 7] = [
    "center",
    "backLeft",
    "backRight",
    "leftWall1",
    "leftWall2",
    "rightWall1",
    "rightWall2",
];

/// Frames hang slightly proud of the wall planes at ±5.
const WALL_INSET: f32 = 4.95;
const HANG_HEIGHT: f32 = 1.5;

const STANDARD_SIZE: (f32, f32) = (1.5, 2.0);
const FEATURED_SIZE: (f32, f32) = (2.5, 2.5);

/// Which way a hung picture faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    /// On the back wall, facing the entrance (+Z)
    Front,
    /// On the left wall, facing +X
    LeftWall,
    /// On the right wall, facing -X
    RightWall,
}

/// Placement and nominal frame size of a slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotTransform {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Rotation about +Y applied to a +Z facing picture
    pub rotation_y: f32,
    pub width: f32,
    pub height: f32,
}

impl SlotTransform {
    const fn new(x: f32, z: f32, rotation_y: f32, size: (f32, f32)) -> Self {
        Self {
            x,
            y: HANG_HEIGHT,
            z,
            rotation_y,
            width: size.0,
            height: size.1,
        }
    }

    /// Placement used for ids that match no canonical slot: the featured
    /// wall position at standard size.
    pub const FALLBACK: SlotTransform = SlotTransform::new(0.0, -WALL_INSET, 0.0, STANDARD_SIZE);

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation_y)
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position())
    }

    /// Unit vector pointing from the wall into the room.
    pub fn normal(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }

    pub fn facing(&self) -> Facing {
        if self.rotation_y > 0.0 {
            Facing::LeftWall
        } else if self.rotation_y < 0.0 {
            Facing::RightWall
        } else {
            Facing::Front
        }
    }
}

/// Strict lookup: `None` for ids outside the canonical set.
pub fn lookup(slot_id: &str) -> Option<SlotTransform> {
    let transform = match slot_id {
        "center" => SlotTransform::new(0.0, -WALL_INSET, 0.0, FEATURED_SIZE),
        "backLeft" => SlotTransform::new(-3.0, -WALL_INSET, 0.0, STANDARD_SIZE),
        "backRight" => SlotTransform::new(3.0, -WALL_INSET, 0.0, STANDARD_SIZE),
        "leftWall1" => SlotTransform::new(-WALL_INSET, -3.0, FRAC_PI_2, STANDARD_SIZE),
        "leftWall2" => SlotTransform::new(-WALL_INSET, 0.0, FRAC_PI_2, STANDARD_SIZE),
        "rightWall1" => SlotTransform::new(WALL_INSET, -3.0, -FRAC_PI_2, STANDARD_SIZE),
        "rightWall2" => SlotTransform::new(WALL_INSET, 0.0, -FRAC_PI_2, STANDARD_SIZE),
        _ => return None,
    };
    Some(transform)
}

/// Lenient lookup: unknown ids resolve to [`SlotTransform::FALLBACK`].
pub fn resolve(slot_id: &str) -> SlotTransform {
    lookup(slot_id).unwrap_or(SlotTransform::FALLBACK)
}

pub fn is_known_slot(slot_id: &str) -> bool {
    lookup(slot_id).is_some()
}
