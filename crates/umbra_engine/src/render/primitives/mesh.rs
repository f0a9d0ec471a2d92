//! Mesh representation for 3D models
//!
//! Pure vertex and index data with no backend dependencies. `Vertex` is `Pod`
//! so vertex arrays can be uploaded or written to disk as raw bytes.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;
use crate::scene::bounds::AABB;

/// Vertex data structure with position, normal, and texture coordinates
///
/// Implements Hash and Eq over the float bit patterns so identical vertices
/// can be deduplicated while loading models. NaN components are not expected.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for value in self.position.iter().chain(&self.normal).chain(&self.tex_coord) {
            value.to_bits().hash(state);
        }
    }
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Triangle mesh: vertices plus three indices per triangle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Unit cube centered at the origin with vertices at ±1.0 on each axis
    pub fn cube() -> Self {
        let vertices = vec![
            // Front face
            Vertex::new([-1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([-1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            // Back face
            Vertex::new([-1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 0.0]),
            Vertex::new([-1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
            Vertex::new([1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 1.0]),
            Vertex::new([1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
        ];

        let indices = vec![
            // Front
            0, 1, 2, 2, 3, 0,
            // Back
            4, 5, 6, 6, 7, 4,
            // Left
            4, 0, 3, 3, 5, 4,
            // Right
            1, 7, 6, 6, 2, 1,
            // Top
            3, 2, 6, 6, 5, 3,
            // Bottom
            4, 7, 1, 1, 0, 4,
        ];

        Self::new(vertices, indices)
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<AABB> {
        let positions: Vec<Vec3> = self.vertices.iter().map(|v| Vec3::from(v.position)).collect();
        AABB::from_points(&positions)
    }

    /// Whether the index list forms whole triangles that reference existing vertices
    pub fn is_valid(&self) -> bool {
        self.indices.len() % 3 == 0 && self.indices.iter().all(|&i| (i as usize) < self.vertices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let vertex = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5]);
        let bytes = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytemuck::cast_slice::<u8, f32>(bytes)[..3], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cube_bounds() {
        let cube = Mesh::cube();
        assert!(cube.is_valid());
        assert_eq!(cube.triangle_count(), 12);

        let bounds = cube.bounds().expect("cube has vertices");
        assert_relative_eq!(bounds.min, Vec3::repeat(-1.0));
        assert_relative_eq!(bounds.max, Vec3::repeat(1.0));
        assert!(Mesh::default().bounds().is_none());
    }

    #[test]
    fn test_invalid_indices_detected() {
        let mesh = Mesh::new(vec![Vertex::default(); 2], vec![0, 1, 2]);
        assert!(!mesh.is_valid());
    }
}
