// Re-export glam for convenience
pub use glam::*;

// Gallery math types
mod camera;
mod orbit;
pub use camera::Camera;
pub use orbit::{NavigationKey, OrbitControls, Spherical};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }
}
