use glam::{Mat4, Vec3};

/// Perspective camera for the gallery room
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Eye height a visitor enters the room at
    pub const ENTRY_POSITION: Vec3 = Vec3::new(0.0, 1.6, 5.0);

    /// Point the camera orbits around (middle of the room, slightly below eye level)
    pub const LOOK_AT: Vec3 = Vec3::new(0.0, 1.2, 0.0);

    /// Create a new camera
    pub fn new(position: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov_y: 75.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Camera standing at the room entrance, looking at the room center
    pub fn gallery_entry(aspect: f32) -> Self {
        Self::new(Self::ENTRY_POSITION, Self::LOOK_AT, aspect)
    }

    /// Get the view matrix (world → camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get the projection matrix (camera → clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio (e.g., on window resize)
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Update aspect ratio from a surface size in pixels
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.set_aspect(width as f32 / height as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallery_entry_defaults() {
        let camera = Camera::gallery_entry(16.0 / 9.0);

        assert_eq!(camera.position, Vec3::new(0.0, 1.6, 5.0));
        assert_eq!(camera.target, Vec3::new(0.0, 1.2, 0.0));
        assert!((camera.fov_y.to_degrees() - 75.0).abs() < 1e-4);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);

        let view = camera.view_matrix();
        // View matrix should translate camera to origin
        assert!(view.w_axis.z < 0.0);
    }

    #[test]
    fn test_viewport_size_updates_aspect() {
        let mut camera = Camera::gallery_entry(1.0);

        camera.set_viewport_size(1920, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);

        // Minimized windows report zero-sized surfaces
        camera.set_viewport_size(0, 0);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    }
}
