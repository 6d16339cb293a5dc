//! Ray-surface intersection record.

use crate::{Material, Ray};
use lux_math::{Vec2, Vec3};

/// Distance continuation rays are pushed off a surface.
const SURFACE_OFFSET: f32 = 1e-4;

/// Record of a ray-surface intersection.
///
/// Produced fresh by every successful intersection test and owned by the
/// caller; the material is borrowed from the scene.
#[derive(Clone, Copy)]
pub struct Hit<'a> {
    /// Point of intersection
    pub point: Vec3,
    /// Distance along the (unit) ray direction
    pub distance: f32,
    /// Unit surface normal, always facing against the incoming ray
    pub normal: Vec3,
    /// Material bound at the intersection point
    pub material: &'a Material,
    /// Whether the ray crosses into the surface (hit its front face)
    pub entering: bool,
    /// Surface parameterization at the hit, where the primitive has one
    pub uv: Vec2,
}

impl<'a> Hit<'a> {
    /// Build a hit from the geometric (outward) normal.
    ///
    /// The stored normal is flipped to face the ray and `entering` records
    /// which side was hit.
    pub fn new(ray: &Ray, distance: f32, outward_normal: Vec3, material: &'a Material, uv: Vec2) -> Self {
        let entering = ray.direction().dot(outward_normal) < 0.0;
        Self {
            point: ray.at(distance),
            distance,
            normal: if entering { outward_normal } else { -outward_normal },
            material,
            entering,
            uv,
        }
    }

    /// Origin for a continuation ray leaving in `direction`, nudged off the
    /// surface to the side the direction points to.
    #[inline]
    pub fn offset_origin(&self, direction: Vec3) -> Vec3 {
        if direction.dot(self.normal) >= 0.0 {
            self.point + self.normal * SURFACE_OFFSET
        } else {
            self.point - self.normal * SURFACE_OFFSET
        }
    }
}

impl std::fmt::Debug for Hit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hit")
            .field("point", &self.point)
            .field("distance", &self.distance)
            .field("normal", &self.normal)
            .field("entering", &self.entering)
            .field("uv", &self.uv)
            .finish()
    }
}
