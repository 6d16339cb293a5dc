//! Resident triangle meshes.

use super::{MaterialGrid, Primitive, Triangle};
use lux_math::{Mat4, Vec2, Vec3};
use std::sync::Arc;

/// Vertex and face arrays for a triangle mesh.
///
/// Faces index into `positions` (and `uvs`, when present). Triangles built
/// from a mesh share it through an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    positions: Vec<Vec3>,
    uvs: Option<Vec<Vec2>>,
    faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            uvs: None,
            faces,
        }
    }

    /// Attach per-vertex UVs. A UV array that does not match the vertex
    /// count is ignored.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        if uvs.len() == self.positions.len() {
            self.uvs = Some(uvs);
        } else {
            log::warn!(
                "mesh has {} vertices but {} uvs; ignoring uvs",
                self.positions.len(),
                uvs.len()
            );
        }
        self
    }

    /// Copy of the mesh with every vertex transformed by `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            positions: self
                .positions
                .iter()
                .map(|p| matrix.transform_point3(*p))
                .collect(),
            uvs: self.uvs.clone(),
            faces: self.faces.clone(),
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Corner positions of a face.
    pub fn vertices(&self, face: usize) -> [Vec3; 3] {
        let [a, b, c] = self.faces[face];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Corner UVs of a face, defaulting to the barycentric corners.
    pub fn uvs(&self, face: usize) -> [Vec2; 3] {
        match &self.uvs {
            Some(uvs) => {
                let [a, b, c] = self.faces[face];
                [uvs[a as usize], uvs[b as usize], uvs[c as usize]]
            }
            None => [Vec2::ZERO, Vec2::X, Vec2::Y],
        }
    }

    /// One triangle primitive per valid face. Faces with out-of-range
    /// indices are skipped.
    pub fn triangles(self: &Arc<Self>, surface: Arc<MaterialGrid>) -> Vec<Primitive> {
        let n = self.positions.len();
        let mut skipped = 0usize;
        let triangles: Vec<Primitive> = (0..self.faces.len())
            .filter(|&face| {
                let valid = self.faces[face].iter().all(|&i| (i as usize) < n);
                if !valid {
                    skipped += 1;
                }
                valid
            })
            .map(|face| Triangle::new(self.clone(), face, surface.clone()).into())
            .collect();
        if skipped > 0 {
            log::warn!("skipped {skipped} mesh faces with out-of-range vertex indices");
        }
        triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Material;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_transformed_moves_vertices() {
        let moved = quad().transformed(&Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)));
        assert!(moved.positions().iter().all(|p| (p.z + 3.0).abs() < 1e-6));
        assert_eq!(moved.face_count(), 2);
    }

    #[test]
    fn test_triangles_skip_bad_faces() {
        let mut mesh = quad();
        mesh.faces.push([0, 1, 9]);
        let mesh = Arc::new(mesh);
        let surface = Arc::new(MaterialGrid::uniform(Arc::new(Material::new())));

        assert_eq!(mesh.triangles(surface).len(), 2);
    }

    #[test]
    fn test_mismatched_uvs_are_ignored() {
        let mesh = quad().with_uvs(vec![Vec2::ZERO; 3]);
        assert_eq!(mesh.uvs(0), [Vec2::ZERO, Vec2::X, Vec2::Y]);

        let mesh = quad().with_uvs(vec![Vec2::ONE; 4]);
        assert_eq!(mesh.uvs(1), [Vec2::ONE; 3]);
    }
}
