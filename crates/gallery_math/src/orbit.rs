//! Orbit/pan/zoom camera navigation around a fixed look-at target.
//!
//! The controller never owns the camera. Input handlers accumulate deltas
//! (or apply discrete steps directly) and `update` advances the damping
//! state once per frame, re-applying the camera's look-at.

use std::f32::consts::PI;

use glam::Vec3;

use crate::Camera;

const EPS: f32 = 1e-6;

/// Spherical coordinates around a target, Y up.
///
/// `phi` is the polar angle measured from +Y, `theta` the azimuth measured
/// from +Z towards +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < EPS {
            return Self { radius: 0.0, phi: 0.0, theta: 0.0 };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep phi away from the poles where the view direction degenerates
    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

/// Discrete keyboard navigation commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKey {
    RotateLeft,
    RotateRight,
    RotateUp,
    RotateDown,
    ZoomIn,
    ZoomOut,
    Reset,
}

/// Damped orbit controls in the style of a turntable viewer.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,

    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    pub enable_damping: bool,
    pub damping_factor: f32,

    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    pub auto_rotate: bool,
    /// Speed 1.0 is one full turn per minute
    pub auto_rotate_speed: f32,

    /// Radians per arrow-key press
    pub key_rotate_step: f32,
    /// World units per +/- key press or trackpad pinch tick
    pub key_zoom_step: f32,

    home_position: Vec3,
    home_target: Vec3,

    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl OrbitControls {
    /// Controls configured for the gallery room, homed on the given camera.
    pub fn new(camera: &Camera) -> Self {
        Self {
            target: camera.target,
            min_distance: 1.5,
            max_distance: 15.0,
            min_polar_angle: PI / 6.0,
            max_polar_angle: PI / 1.5,
            enable_damping: true,
            damping_factor: 0.1,
            rotate_speed: 1.0,
            zoom_speed: 1.5,
            pan_speed: 1.0,
            auto_rotate: true,
            auto_rotate_speed: 0.3,
            key_rotate_step: 0.1,
            key_zoom_step: 0.2,
            home_position: camera.position,
            home_target: camera.target,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }

    /// Cancel auto-rotation; it stays off until toggled back on.
    pub fn stop_auto_rotate(&mut self) {
        if self.auto_rotate {
            log::debug!("Auto-rotate cancelled by user input");
        }
        self.auto_rotate = false;
    }

    /// Flip auto-rotation, returning the new state.
    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        self.auto_rotate
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Shrink the orbit radius by `factor` (below 1 moves closer).
    pub fn dolly_in(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    pub fn dolly_out(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale /= factor;
        }
    }

    fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    /// Left-drag (or one-finger drag) by a pixel delta.
    pub fn orbit_drag(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
    }

    /// Right-drag (or two-finger drag) by a pixel delta, in screen space.
    pub fn pan_drag(&mut self, camera: &Camera, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let target_distance = (camera.position - self.target).length() * (camera.fov_y * 0.5).tan();

        let world = camera.view_matrix().inverse();
        let right = world.x_axis.truncate();
        let up = world.y_axis.truncate();

        let left_amount = 2.0 * dx * target_distance / height * self.pan_speed;
        let up_amount = 2.0 * dy * target_distance / height * self.pan_speed;

        self.pan_offset += right * -left_amount + up * up_amount;
    }

    /// Plain scroll wheel. Positive `delta_y` scrolls away (zoom out).
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y < 0.0 {
            self.dolly_in(self.zoom_scale());
        } else if delta_y > 0.0 {
            self.dolly_out(self.zoom_scale());
        }
    }

    /// Touch pinch, given the ratio of new to previous finger spread.
    pub fn pinch_spread(&mut self, spread_ratio: f32) {
        // Fingers moving apart (ratio > 1) zoom in
        if spread_ratio.is_finite() && spread_ratio > 0.0 {
            self.dolly_out(spread_ratio);
        }
    }

    /// Trackpad pinch (modifier-qualified wheel). Moves the camera a fixed
    /// step along the view axis instead of scaling the orbit distance.
    pub fn trackpad_pinch(&mut self, camera: &mut Camera, delta: f32) {
        if delta > 0.0 {
            self.step_distance(camera, self.key_zoom_step);
        } else if delta < 0.0 {
            self.step_distance(camera, -self.key_zoom_step);
        }
    }

    /// Discrete keyboard steps.
    pub fn handle_key(&mut self, camera: &mut Camera, key: NavigationKey) {
        self.stop_auto_rotate();

        match key {
            NavigationKey::RotateLeft => self.rotate_left(self.key_rotate_step),
            NavigationKey::RotateRight => self.rotate_left(-self.key_rotate_step),
            NavigationKey::RotateUp => self.rotate_up(self.key_rotate_step),
            NavigationKey::RotateDown => self.rotate_up(-self.key_rotate_step),
            NavigationKey::ZoomIn => self.step_distance(camera, -self.key_zoom_step),
            NavigationKey::ZoomOut => self.step_distance(camera, self.key_zoom_step),
            NavigationKey::Reset => self.reset(camera),
        }

        camera.target = self.target;
    }

    fn step_distance(&mut self, camera: &mut Camera, amount: f32) {
        let offset = camera.position - self.target;
        let distance = offset.length();
        if distance < EPS {
            return;
        }
        let new_distance = (distance + amount).clamp(self.min_distance, self.max_distance);
        camera.position = self.target + offset / distance * new_distance;
    }

    /// Return camera and target to where the controls were created.
    pub fn reset(&mut self, camera: &mut Camera) {
        self.target = self.home_target;
        camera.position = self.home_position;
        camera.target = self.home_target;
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;
    }

    fn auto_rotation_angle(&self, delta_time: f32) -> f32 {
        2.0 * PI / 60.0 * self.auto_rotate_speed * delta_time
    }

    /// Advance damping, apply clamps and re-aim the camera at the target.
    /// Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut Camera, delta_time: f32) -> bool {
        let previous = camera.position;
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        if self.auto_rotate {
            self.rotate_left(self.auto_rotation_angle(delta_time));
        }

        if self.enable_damping {
            spherical.theta += self.theta_delta * self.damping_factor;
            spherical.phi += self.phi_delta * self.damping_factor;
        } else {
            spherical.theta += self.theta_delta;
            spherical.phi += self.phi_delta;
        }

        spherical.phi = spherical.phi.clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        camera.position = self.target + spherical.to_offset();
        camera.target = self.target;

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.theta_delta *= keep;
            self.phi_delta *= keep;
            self.pan_offset *= keep;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        (camera.position - previous).length_squared() > EPS * EPS
    }

    /// Distance from the camera to the orbit target
    pub fn distance(&self, camera: &Camera) -> f32 {
        (camera.position - self.target).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(controls: &mut OrbitControls, camera: &mut Camera) {
        for _ in 0..400 {
            controls.update(camera, 1.0 / 60.0);
        }
    }

    #[test]
    fn test_spherical_roundtrip() {
        let offset = Vec3::new(1.0, 2.0, -3.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-5);
    }

    #[test]
    fn test_first_update_clamps_and_aims() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);
        controls.auto_rotate = false;

        controls.update(&mut camera, 0.0);

        assert_eq!(camera.target, Vec3::new(0.0, 1.2, 0.0));
        let distance = controls.distance(&camera);
        assert!((1.5..=15.0).contains(&distance));
    }

    #[test]
    fn test_distance_is_clamped() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);
        controls.auto_rotate = false;

        for _ in 0..200 {
            controls.wheel(-1.0);
            controls.update(&mut camera, 1.0 / 60.0);
        }
        assert!((controls.distance(&camera) - 1.5).abs() < 1e-3);

        for _ in 0..400 {
            controls.wheel(1.0);
            controls.update(&mut camera, 1.0 / 60.0);
        }
        assert!((controls.distance(&camera) - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_scroll_up_zooms_in() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);
        controls.auto_rotate = false;
        controls.update(&mut camera, 0.0);
        let start = controls.distance(&camera);

        controls.wheel(-100.0);
        controls.update(&mut camera, 1.0 / 60.0);
        let closer = controls.distance(&camera);
        assert!(closer < start, "scroll up: {start} -> {closer}");

        controls.wheel(100.0);
        controls.update(&mut camera, 1.0 / 60.0);
        assert!(controls.distance(&camera) > closer);
    }

    #[test]
    fn test_pinch_spread_direction() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);
        controls.auto_rotate = false;
        controls.update(&mut camera, 0.0);
        let start = controls.distance(&camera);

        controls.pinch_spread(1.25);
        controls.update(&mut camera, 1.0 / 60.0);
        let closer = controls.distance(&camera);
        assert!(closer < start);

        controls.pinch_spread(0.8);
        controls.update(&mut camera, 1.0 / 60.0);
        assert!(controls.distance(&camera) > closer);
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);
        controls.auto_rotate = false;

        controls.orbit_drag(0.0, 10_000.0, 600.0);
        settle(&mut controls, &mut camera);
        let phi = Spherical::from_offset(camera.position - controls.target).phi;
        assert!(phi >= PI / 6.0 - 1e-4);

        controls.orbit_drag(0.0, -20_000.0, 600.0);
        settle(&mut controls, &mut camera);
        let phi = Spherical::from_offset(camera.position - controls.target).phi;
        assert!(phi <= PI / 1.5 + 1e-4);
    }

    #[test]
    fn test_auto_rotate_moves_camera_until_stopped() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);
        controls.update(&mut camera, 0.0);
        settle(&mut controls, &mut camera);

        let before = camera.position;
        controls.update(&mut camera, 1.0);
        assert!((camera.position - before).length() > 1e-4);

        controls.stop_auto_rotate();
        settle(&mut controls, &mut camera);
        let parked = camera.position;
        controls.update(&mut camera, 1.0);
        assert!((camera.position - parked).length() < 1e-4);

        assert!(controls.toggle_auto_rotate());
        assert!(controls.auto_rotate);
    }

    #[test]
    fn test_key_step_stops_auto_rotate() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);

        controls.handle_key(&mut camera, NavigationKey::RotateLeft);
        assert!(!controls.auto_rotate);
    }

    #[test]
    fn test_zoom_keys_change_distance() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);
        let start = controls.distance(&camera);

        controls.handle_key(&mut camera, NavigationKey::ZoomIn);
        assert!((controls.distance(&camera) - (start - 0.2)).abs() < 1e-4);

        controls.handle_key(&mut camera, NavigationKey::ZoomOut);
        controls.handle_key(&mut camera, NavigationKey::ZoomOut);
        assert!((controls.distance(&camera) - (start + 0.2)).abs() < 1e-4);
    }

    #[test]
    fn test_trackpad_pinch_steps() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);
        let start = controls.distance(&camera);

        controls.trackpad_pinch(&mut camera, -3.0);
        assert!((controls.distance(&camera) - (start - 0.2)).abs() < 1e-4);
    }

    #[test]
    fn test_reset_restores_home() {
        let mut camera = Camera::gallery_entry(1.0);
        let mut controls = OrbitControls::new(&camera);

        controls.pan_drag(&camera, 120.0, -40.0, 600.0);
        controls.orbit_drag(300.0, 50.0, 600.0);
        settle(&mut controls, &mut camera);
        assert!(controls.target != Vec3::new(0.0, 1.2, 0.0));

        controls.handle_key(&mut camera, NavigationKey::Reset);
        assert_eq!(camera.position, Vec3::new(0.0, 1.6, 5.0));
        assert_eq!(controls.target, Vec3::new(0.0, 1.2, 0.0));
        assert_eq!(camera.target, Vec3::new(0.0, 1.2, 0.0));
    }
}
