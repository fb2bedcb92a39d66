//! GPU layout of the scene lights.
//!
//! Mirrors the `Lights` struct in `shaders/scene.wgsl`. Every member is
//! 16-byte aligned so the Rust and WGSL layouts agree without padding.

use gallery_core::scene::{PointLight, SpotLight};
use gallery_core::Light;
use gallery_math::{Mat4, Vec3};

pub const MAX_POINT_LIGHTS: usize = 8;
/// Room fixtures plus one spot per painting, for galleries of a few dozen images
pub const MAX_SPOT_LIGHTS: usize = 64;
/// Layers in the spot shadow map array
pub const MAX_SHADOW_LAYERS: usize = 12;

const SHADOW_NEAR: f32 = 0.1;
const SHADOW_FAR_UNLIMITED: f32 = 30.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuPointLight {
    pub position: [f32; 3],
    pub distance: f32,
    /// Color premultiplied by intensity
    pub color: [f32; 3],
    pub decay: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSpotLight {
    pub position: [f32; 3],
    pub distance: f32,
    pub direction: [f32; 3],
    pub decay: f32,
    pub color: [f32; 3],
    pub cos_outer: f32,
    pub cos_inner: f32,
    /// Shadow map layer, or -1
    pub shadow_layer: i32,
    pub shadow_bias: f32,
    pub _padding: f32,
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    /// x = points, y = spots, z = shadow layers in use
    pub counts: [u32; 4],
    pub points: [GpuPointLight; MAX_POINT_LIGHTS],
    pub spots: [GpuSpotLight; MAX_SPOT_LIGHTS],
}

impl Default for LightsUniform {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

fn premultiplied(color: Vec3, intensity: f32) -> [f32; 3] {
    (color * intensity).to_array()
}

/// Perspective view-projection covering a spot's cone.
pub fn spot_view_projection(spot: &SpotLight) -> Mat4 {
    let direction = spot.direction();
    let up = if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let far = if spot.distance > 0.0 {
        spot.distance
    } else {
        SHADOW_FAR_UNLIMITED
    };
    let fov = (spot.angle * 2.0).clamp(0.01, std::f32::consts::PI - 0.01);
    let view = Mat4::look_at_rh(spot.position, spot.position + direction, up);
    Mat4::perspective_rh(fov, 1.0, SHADOW_NEAR, far) * view
}

impl GpuPointLight {
    fn from_light(light: &PointLight) -> Self {
        Self {
            position: light.position.to_array(),
            distance: light.distance,
            color: premultiplied(light.color, light.intensity),
            decay: light.decay,
        }
    }
}

impl GpuSpotLight {
    fn from_light(spot: &SpotLight, shadow_layer: Option<usize>) -> Self {
        let inner = spot.angle * (1.0 - spot.penumbra.clamp(0.0, 1.0));
        Self {
            position: spot.position.to_array(),
            distance: spot.distance,
            direction: spot.direction().to_array(),
            decay: spot.decay,
            color: premultiplied(spot.color, spot.intensity),
            cos_outer: spot.angle.cos(),
            // Hard-edged cones still need distinct smoothstep edges
            cos_inner: inner.cos().max(spot.angle.cos() + 1e-4),
            shadow_layer: shadow_layer.map_or(-1, |layer| layer as i32),
            shadow_bias: spot.shadow_bias,
            _padding: 0.0,
            view_proj: spot_view_projection(spot).to_cols_array_2d(),
        }
    }
}

impl LightsUniform {
    /// Pack scene lights. Ambient and hemisphere lights accumulate; point and
    /// spot lights beyond the fixed capacity are dropped with a warning.
    pub fn from_lights(lights: &[Light], shadows: bool) -> Self {
        let mut uniform = Self::default();
        let mut ambient = Vec3::ZERO;
        let mut sky = Vec3::ZERO;
        let mut ground = Vec3::ZERO;
        let mut points = 0;
        let mut spots = 0;
        let mut layers = 0;
        let mut dropped = 0;

        for light in lights {
            match light {
                Light::Ambient { color, intensity } => ambient += *color * *intensity,
                Light::Hemisphere {
                    sky: sky_color,
                    ground: ground_color,
                    intensity,
                } => {
                    sky += *sky_color * *intensity;
                    ground += *ground_color * *intensity;
                }
                Light::Point(point) if points < MAX_POINT_LIGHTS => {
                    uniform.points[points] = GpuPointLight::from_light(point);
                    points += 1;
                }
                Light::Spot(spot) if spots < MAX_SPOT_LIGHTS => {
                    let layer = (shadows && spot.cast_shadow && layers < MAX_SHADOW_LAYERS)
                        .then(|| {
                            layers += 1;
                            layers - 1
                        });
                    uniform.spots[spots] = GpuSpotLight::from_light(spot, layer);
                    spots += 1;
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            log::warn!("{} lights exceed the renderer capacity and were skipped", dropped);
        }

        uniform.ambient = ambient.extend(1.0).to_array();
        uniform.sky = sky.extend(1.0).to_array();
        uniform.ground = ground.extend(1.0).to_array();
        uniform.counts = [points as u32, spots as u32, layers as u32, 0];
        uniform
    }

    pub fn point_count(&self) -> usize {
        self.counts[0] as usize
    }

    pub fn spot_count(&self) -> usize {
        self.counts[1] as usize
    }

    pub fn shadow_layers(&self) -> usize {
        self.counts[2] as usize
    }

    /// View-projection of each shadow layer, in layer order.
    pub fn shadow_matrices(&self) -> Vec<[[f32; 4]; 4]> {
        let mut matrices = vec![Mat4::IDENTITY.to_cols_array_2d(); self.shadow_layers()];
        for spot in &self.spots[..self.spot_count()] {
            if let Ok(layer) = usize::try_from(spot.shadow_layer) {
                if let Some(slot) = matrices.get_mut(layer) {
                    *slot = spot.view_proj;
                }
            }
        }
        matrices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_core::room::room_lights;
    use gallery_math::Vec4;
    use std::f32::consts::PI;

    #[test]
    fn test_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<GpuPointLight>(), 32);
        assert_eq!(std::mem::size_of::<GpuSpotLight>(), 128);
        assert_eq!(
            std::mem::size_of::<LightsUniform>(),
            64 + 32 * MAX_POINT_LIGHTS + 128 * MAX_SPOT_LIGHTS
        );
    }

    #[test]
    fn test_room_lights_pack() {
        let uniform = LightsUniform::from_lights(&room_lights(), true);
        assert_eq!(uniform.point_count(), 3);
        assert_eq!(uniform.spot_count(), 11);
        assert_eq!(uniform.shadow_layers(), 10);
        assert!((uniform.ambient[0] - 0.7).abs() < 1e-6);

        // The featured spot is the only one without a shadow layer
        assert_eq!(uniform.spots[10].shadow_layer, -1);
        assert_eq!(uniform.shadow_matrices().len(), 10);
    }

    #[test]
    fn test_shadows_disabled() {
        let uniform = LightsUniform::from_lights(&room_lights(), false);
        assert_eq!(uniform.shadow_layers(), 0);
        assert!(uniform.spots[..11].iter().all(|spot| spot.shadow_layer == -1));
    }

    #[test]
    fn test_cone_cosines() {
        let spot = SpotLight {
            angle: PI / 4.0,
            penumbra: 0.5,
            ..SpotLight::new(Vec3::Y, Vec3::ZERO, 1.0)
        };
        let uniform = LightsUniform::from_lights(&[Light::Spot(spot)], true);
        let gpu = uniform.spots[0];
        assert!((gpu.cos_outer - (PI / 4.0).cos()).abs() < 1e-6);
        assert!((gpu.cos_inner - (PI / 8.0).cos()).abs() < 1e-6);
        assert!(gpu.cos_inner > gpu.cos_outer);
        assert_eq!(gpu.direction, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_capacity_overflow_is_dropped() {
        let lights: Vec<Light> = (0..MAX_POINT_LIGHTS + 3)
            .map(|i| Light::Point(PointLight::new(Vec3::splat(i as f32), 1.0)))
            .collect();
        let uniform = LightsUniform::from_lights(&lights, true);
        assert_eq!(uniform.point_count(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn test_dozens_of_painting_spots_fit() {
        let mut lights = room_lights();
        lights.extend((0..48).map(|i| {
            let x = i as f32 * 0.1;
            Light::Spot(SpotLight::new(Vec3::new(x, 2.9, 0.0), Vec3::new(x, 1.5, -4.9), 1.5))
        }));
        let uniform = LightsUniform::from_lights(&lights, true);
        assert_eq!(uniform.spot_count(), 11 + 48);
        assert_eq!(uniform.shadow_layers(), 10);
    }

    #[test]
    fn test_spot_projection_centers_target() {
        let spot = SpotLight::new(Vec3::new(1.0, 2.9, 0.0), Vec3::new(-4.9, 1.5, -1.0), 1.0);
        let clip = spot_view_projection(&spot) * spot.target.extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);

        // Straight-down spots still get a valid basis
        let down = SpotLight::new(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, 1.0);
        let m = spot_view_projection(&down);
        assert!(m.is_finite());
        let clip: Vec4 = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-4);
    }
}
