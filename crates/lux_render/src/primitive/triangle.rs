//! Triangle primitive.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use super::{MaterialGrid, Mesh};
use crate::{Hit, Ray, EPSILON};
use lux_math::{Aabb, Vec2, Vec3};
use std::sync::Arc;

/// Barycentric slack so rays through a shared edge hit at least one side.
const BARYCENTRIC_EPSILON: f32 = 1e-6;

/// A triangle primitive referencing one face of a shared mesh.
#[derive(Debug, Clone)]
pub struct Triangle {
    mesh: Arc<Mesh>,
    face: usize,
    surface: Arc<MaterialGrid>,
}

impl Triangle {
    pub fn new(mesh: Arc<Mesh>, face: usize, surface: Arc<MaterialGrid>) -> Self {
        Self {
            mesh,
            face,
            surface,
        }
    }

    /// Stand-alone triangle from three vertices.
    pub fn from_vertices(v0: Vec3, v1: Vec3, v2: Vec3, surface: Arc<MaterialGrid>) -> Self {
        let mesh = Arc::new(Mesh::new(vec![v0, v1, v2], vec![[0, 1, 2]]));
        Self::new(mesh, 0, surface)
    }

    pub fn surface(&self) -> &MaterialGrid {
        &self.surface
    }

    pub fn bounds(&self) -> Aabb {
        let [v0, v1, v2] = self.mesh.vertices(self.face);
        Aabb::from_points(v0.min(v1).min(v2), v0.max(v1).max(v2))
    }

    /// Möller-Trumbore ray-triangle intersection.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let [v0, v1, v2] = self.mesh.vertices(self.face);
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to the triangle, or the triangle is degenerate
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - v0;
        let u = f * s.dot(h);
        if u < -BARYCENTRIC_EPSILON || u > 1.0 + BARYCENTRIC_EPSILON {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);
        if v < -BARYCENTRIC_EPSILON || u + v > 1.0 + BARYCENTRIC_EPSILON {
            return None;
        }

        let t = f * edge2.dot(q);
        if t <= EPSILON {
            return None;
        }

        // Clamp back into the triangle before interpolating
        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0 - u);
        let [uv0, uv1, uv2] = self.mesh.uvs(self.face);
        let uv: Vec2 = uv0 * (1.0 - u - v) + uv1 * u + uv2 * v;

        let material = self.surface.lookup(uv)?;
        let normal = edge1.cross(edge2).normalize();
        Some(Hit::new(ray, t, normal, material, uv))
    }
}
