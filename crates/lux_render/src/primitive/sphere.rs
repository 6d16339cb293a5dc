//! Sphere primitive.

use super::MaterialGrid;
use crate::{Hit, Material, Ray, EPSILON};
use lux_math::{Aabb, Vec2, Vec3};
use std::f32::consts::PI;
use std::sync::Arc;

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    surface: Arc<MaterialGrid>,
}

impl Sphere {
    /// Create a new sphere with a single material.
    pub fn new(center: Vec3, radius: f32, material: Arc<Material>) -> Self {
        Self::with_surface(center, radius, Arc::new(MaterialGrid::uniform(material)))
    }

    /// Create a sphere whose material is looked up by spherical UV.
    pub fn with_surface(center: Vec3, radius: f32, surface: Arc<MaterialGrid>) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            surface,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn surface(&self) -> &MaterialGrid {
        &self.surface
    }

    pub fn bounds(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb::from_points(self.center - r, self.center + r)
    }

    /// UV coordinates for a point on the unit sphere.
    fn sphere_uv(p: Vec3) -> Vec2 {
        // theta: angle down from +Y, phi: angle around Y from +X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }

    /// Projected-distance solve.
    ///
    /// The near root is used when it lies in front of the origin, otherwise
    /// the far root (origin inside the sphere). A hole in the surface at the
    /// near root lets the ray continue to the far root.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let oc = self.center - ray.origin();
        let tca = oc.dot(ray.direction());
        let d2 = oc.length_squared() - tca * tca;
        let r2 = self.radius * self.radius;
        if d2 > r2 {
            return None;
        }
        let thc = (r2 - d2).sqrt();

        for t in [tca - thc, tca + thc] {
            if t <= EPSILON {
                continue;
            }
            let outward_normal = (ray.at(t) - self.center) / self.radius;
            let uv = Self::sphere_uv(outward_normal);
            if let Some(material) = self.surface.lookup(uv) {
                return Some(Hit::new(ray, t, outward_normal, material, uv));
            }
        }
        None
    }
}
