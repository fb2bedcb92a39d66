//! Procedural mesh geometry for the gallery scene graph.
//!
//! Meshes are GPU-agnostic: positions, normals, UVs and triangle indices
//! with counter-clockwise front faces. The viewport converts them to
//! vertex buffers. UV (0, 0) is the top-left of a texture.

use std::f32::consts::TAU;

use gallery_math::Vec3;

/// A triangle mesh with per-vertex normals and UVs.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals, same length as `positions`
    pub normals: Vec<Vec3>,

    /// UV coordinates, same length as `positions`
    pub uvs: Vec<[f32; 2]>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,
}

impl Mesh {
    fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    /// Append one quad with corners ordered (-u,-v), (+u,-v), (+u,+v), (-u,+v).
    fn push_quad(&mut self, center: Vec3, u: Vec3, v: Vec3, normal: Vec3) {
        let base = self.push_vertex(center - u - v, normal, [0.0, 1.0]);
        self.push_vertex(center + u - v, normal, [1.0, 1.0]);
        self.push_vertex(center + u + v, normal, [1.0, 0.0]);
        self.push_vertex(center - u + v, normal, [0.0, 0.0]);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Single-sided rectangle in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let mut mesh = Self::with_capacity(4, 6);
        mesh.push_quad(
            Vec3::ZERO,
            Vec3::new(width * 0.5, 0.0, 0.0),
            Vec3::new(0.0, height * 0.5, 0.0),
            Vec3::Z,
        );
        mesh
    }

    /// Axis-aligned box centered on the origin, textured on every face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;
        let mut mesh = Self::with_capacity(24, 36);

        // (normal, u axis, v axis) with u × v = normal
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];

        for (normal, u, v) in faces {
            mesh.push_quad(normal * half, u * half, v * half, normal);
        }
        mesh
    }

    /// Capped (possibly tapered) cylinder along Y, centered on the origin.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half_height = height * 0.5;
        let ring = segments as usize + 1;
        let mut mesh = Self::with_capacity(ring * 4 + 2, segments as usize * 12);

        let slope = (radius_bottom - radius_top) / height.max(f32::EPSILON);

        // Sides
        let side_start = mesh.positions.len() as u32;
        for i in 0..=segments {
            let u = i as f32 / segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin, slope, cos).normalize();
            mesh.push_vertex(
                Vec3::new(radius_bottom * sin, -half_height, radius_bottom * cos),
                normal,
                [u, 1.0],
            );
            mesh.push_vertex(
                Vec3::new(radius_top * sin, half_height, radius_top * cos),
                normal,
                [u, 0.0],
            );
        }
        for i in 0..segments {
            let bottom = side_start + i * 2;
            let top = bottom + 1;
            let next_bottom = bottom + 2;
            let next_top = bottom + 3;
            mesh.indices
                .extend_from_slice(&[bottom, next_bottom, next_top, bottom, next_top, top]);
        }

        // Caps
        for (y, radius, normal) in [
            (half_height, radius_top, Vec3::Y),
            (-half_height, radius_bottom, Vec3::NEG_Y),
        ] {
            let center = mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal, [0.5, 0.5]);
            let ring_start = mesh.positions.len() as u32;
            for i in 0..=segments {
                let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
                mesh.push_vertex(
                    Vec3::new(radius * sin, y, radius * cos),
                    normal,
                    [0.5 + sin * 0.5, 0.5 - cos * 0.5],
                );
            }
            for i in 0..segments {
                let a = ring_start + i;
                let b = a + 1;
                if normal.y > 0.0 {
                    mesh.indices.extend_from_slice(&[center, a, b]);
                } else {
                    mesh.indices.extend_from_slice(&[center, b, a]);
                }
            }
        }

        mesh
    }

    /// Get number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        if self.positions.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for pos in &self.positions {
            min = min.min(*pos);
            max = max.max(*pos);
        }
        (min, max)
    }
}
