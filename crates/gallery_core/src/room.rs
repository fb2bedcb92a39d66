//! Static room geometry and lighting.
//!
//! A 10×10×3 white room centered on the origin with the entrance in the
//! +Z wall, a ceiling track carrying eight fixtures, and the fill lights.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use gallery_math::{Quat, Vec3};

use crate::mesh::Mesh;
use crate::scene::{
    color_hex, Group, GroupKind, Light, Material, Node, PointLight, SceneGraph, SpotLight,
    Transform,
};

pub const ROOM_SIZE: f32 = 10.0;
pub const ROOM_HEIGHT: f32 = 3.0;

/// Fixture x positions along the track.
pub const FIXTURE_POSITIONS: [f32; 8] = [-3.5, -2.5, -1.5, -0.5, 0.5, 1.5, 2.5, 3.5];

const TRACK_Y: f32 = 2.95;
const FIXTURE_Y: f32 = 2.8;

/// Build the room group and add it plus all fixed lights to `scene`.
pub fn build_room(scene: &mut SceneGraph) {
    scene.background = color_hex(0xffffff);
    scene.add_group(room_group());
    for light in room_lights() {
        scene.add_light(light);
    }
}

/// Floor, ceiling, walls, track and fixtures.
pub fn room_group() -> Group {
    let mut room = Group::new("room", GroupKind::Room, Transform::default());

    let half = ROOM_SIZE * 0.5;
    let wall_y = ROOM_HEIGHT * 0.5;

    let floor = Arc::new(Material::standard("floor", 0xfafafa, 0.1, 0.05));
    room.push(
        Node::new(
            "floor",
            Mesh::plane(ROOM_SIZE, ROOM_SIZE),
            floor,
            Transform::from_translation_rotation(Vec3::ZERO, Quat::from_rotation_x(-FRAC_PI_2)),
        )
        .with_shadows(false, true),
    );

    let ceiling = Arc::new(Material::standard("ceiling", 0xffffff, 0.1, 0.05));
    room.push(Node::new(
        "ceiling",
        Mesh::plane(ROOM_SIZE, ROOM_SIZE),
        ceiling,
        Transform::from_translation_rotation(
            Vec3::new(0.0, ROOM_HEIGHT, 0.0),
            Quat::from_rotation_x(FRAC_PI_2),
        ),
    ));

    let wall = Arc::new(Material::standard("wall", 0xffffff, 0.05, 0.02));
    // Entrance panels reach the corners and leave a 4-unit opening
    let walls = [
        ("back_wall", ROOM_SIZE, Vec3::new(0.0, wall_y, -half), 0.0),
        ("front_wall_left", 3.0, Vec3::new(-3.5, wall_y, half), PI),
        ("front_wall_right", 3.0, Vec3::new(3.5, wall_y, half), PI),
        ("left_wall", ROOM_SIZE, Vec3::new(-half, wall_y, 0.0), FRAC_PI_2),
        ("right_wall", ROOM_SIZE, Vec3::new(half, wall_y, 0.0), -FRAC_PI_2),
    ];
    for (name, width, position, rotation_y) in walls {
        room.push(Node::new(
            name,
            Mesh::plane(width, ROOM_HEIGHT),
            wall.clone(),
            Transform::from_translation_rotation(position, Quat::from_rotation_y(rotation_y)),
        ));
    }

    let track = Arc::new(Material::standard("track", 0x000000, 0.2, 0.8));
    room.push(Node::new(
        "track",
        Mesh::cuboid(8.0, 0.08, 0.08),
        track,
        Transform::from_translation(Vec3::new(0.0, TRACK_Y, 0.0)),
    ));

    let fixture = Arc::new(Material::standard("fixture", 0x333333, 0.2, 0.8));
    for (i, x) in FIXTURE_POSITIONS.iter().enumerate() {
        room.push(Node::new(
            format!("fixture_{i}"),
            Mesh::cylinder(0.05, 0.08, 0.2, 16),
            fixture.clone(),
            Transform::from_translation(Vec3::new(*x, FIXTURE_Y, 0.0)),
        ));
    }

    room
}

/// Shadow-casting track spot.
fn track_spot(position: Vec3, target: Vec3) -> SpotLight {
    SpotLight {
        angle: PI / 6.0,
        penumbra: 0.3,
        decay: 1.5,
        distance: 15.0,
        cast_shadow: true,
        shadow_bias: -0.0001,
        ..SpotLight::new(position, target, 1.5)
    }
}

/// Spots for one fixture, aimed by the wall region it hangs over.
pub fn fixture_spots(x: f32) -> Vec<SpotLight> {
    if x < -1.0 {
        vec![track_spot(
            Vec3::new(x, FIXTURE_Y, 0.0),
            Vec3::new(-4.9, 1.5, x * 1.3),
        )]
    } else if x > 1.0 {
        vec![track_spot(
            Vec3::new(x, FIXTURE_Y, 0.0),
            Vec3::new(4.9, 1.5, -x * 1.3),
        )]
    } else {
        vec![
            track_spot(
                Vec3::new(x - 0.5, FIXTURE_Y, 0.0),
                Vec3::new(x - 1.0, 1.5, -4.9),
            ),
            track_spot(
                Vec3::new(x + 0.5, FIXTURE_Y, 0.0),
                Vec3::new(x + 1.0, 1.5, -4.9),
            ),
        ]
    }
}

/// Ambient, hemisphere, track spots, point fills and the featured spot.
pub fn room_lights() -> Vec<Light> {
    let mut lights = vec![
        Light::Ambient {
            color: Vec3::ONE,
            intensity: 0.7,
        },
        Light::Hemisphere {
            sky: color_hex(0xffffff),
            ground: color_hex(0xf0f0f0),
            intensity: 0.6,
        },
    ];

    lights.extend(
        FIXTURE_POSITIONS
            .iter()
            .flat_map(|x| fixture_spots(*x))
            .map(Light::Spot),
    );

    lights.push(Light::Point(PointLight::new(Vec3::new(0.0, 2.0, 0.0), 0.8)));
    lights.push(Light::Point(PointLight::new(Vec3::new(-3.0, 2.0, -3.0), 0.5)));
    lights.push(Light::Point(PointLight::new(Vec3::new(3.0, 2.0, -3.0), 0.5)));

    lights.push(Light::Spot(SpotLight {
        angle: PI / 5.0,
        penumbra: 0.2,
        decay: 1.0,
        distance: 10.0,
        ..SpotLight::new(Vec3::new(0.0, 2.8, -2.0), Vec3::new(0.0, 1.5, -4.95), 2.0)
    }));

    lights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_surfaces() {
        let room = room_group();
        // floor + ceiling + 5 wall panels + track + 8 fixtures
        assert_eq!(room.nodes.len(), 16);

        let floor = room.find("floor").unwrap();
        assert!(floor.receive_shadow);
        let up = floor.transform.rotation * Vec3::Z;
        assert!((up - Vec3::Y).length() < 1e-5);

        let ceiling = room.find("ceiling").unwrap();
        assert_eq!(ceiling.transform.translation.y, 3.0);
        assert!((ceiling.transform.rotation * Vec3::Z - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_walls_face_inward() {
        let room = room_group();
        for name in [
            "back_wall",
            "front_wall_left",
            "front_wall_right",
            "left_wall",
            "right_wall",
        ] {
            let wall = room.find(name).unwrap();
            let normal = wall.transform.rotation * Vec3::Z;
            let t = wall.transform.translation;
            let to_center = -Vec3::new(t.x, 0.0, t.z).normalize();
            assert!(normal.dot(to_center) > 0.5, "{name} faces outward");
        }
    }

    #[test]
    fn test_entrance_gap() {
        let room = room_group();
        let left = room.find("front_wall_left").unwrap();
        let right = room.find("front_wall_right").unwrap();
        // Panels meet the side walls, so the opening is what remains of 10 units
        let left_outer = left.transform.translation.x - 1.5;
        let right_outer = right.transform.translation.x + 1.5;
        assert!((left_outer + ROOM_SIZE / 2.0).abs() < 1e-6);
        assert!((right_outer - ROOM_SIZE / 2.0).abs() < 1e-6);

        let gap = (right.transform.translation.x - 1.5) - (left.transform.translation.x + 1.5);
        assert!((gap - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_fixture_spot_targets() {
        let left = fixture_spots(-3.5);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].target.x, -4.9);

        let right = fixture_spots(2.5);
        assert_eq!(right.len(), 1);
        assert_eq!(right[0].target.x, 4.9);

        let middle = fixture_spots(0.5);
        assert_eq!(middle.len(), 2);
        assert!(middle.iter().all(|spot| spot.target.z == -4.9));
    }

    #[test]
    fn test_room_lights() {
        let lights = room_lights();
        let spots: Vec<_> = lights
            .iter()
            .filter_map(|light| match light {
                Light::Spot(spot) => Some(spot),
                _ => None,
            })
            .collect();
        let points = lights
            .iter()
            .filter(|light| matches!(light, Light::Point(_)))
            .count();

        // 10 track spots + featured spot
        assert_eq!(spots.len(), 11);
        assert_eq!(spots.iter().filter(|spot| spot.cast_shadow).count(), 10);
        assert_eq!(points, 3);

        let featured = spots.last().unwrap();
        assert!(featured.intensity > spots[0].intensity);
        assert_eq!(featured.target, Vec3::new(0.0, 1.5, -4.95));
    }

    #[test]
    fn test_build_room() {
        let mut scene = SceneGraph::new();
        build_room(&mut scene);
        assert_eq!(scene.groups().len(), 1);
        assert_eq!(scene.lights().len(), room_lights().len());
        assert_eq!(scene.background, Vec3::ONE);
    }
}
