//! Intersectable primitives.
//!
//! Every primitive answers the same question: the nearest hit along a ray at a
//! distance greater than [`EPSILON`](crate::EPSILON), or `None`. Primitives
//! are immutable after construction and borrow their materials into each
//! [`Hit`].

mod grid;
mod mesh;
mod plane;
mod sphere;
mod triangle;

pub use grid::MaterialGrid;
pub use mesh::Mesh;
pub use plane::{Plane, UvPlane};
pub use sphere::Sphere;
pub use triangle::Triangle;

use crate::{Hit, Ray};
use lux_math::Aabb;

/// Closed set of scene primitives.
#[derive(Debug, Clone)]
pub enum Primitive {
    Plane(Plane),
    UvPlane(UvPlane),
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Primitive {
    /// Nearest intersection in front of the ray origin.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        match self {
            Primitive::Plane(p) => p.intersect(ray),
            Primitive::UvPlane(p) => p.intersect(ray),
            Primitive::Sphere(s) => s.intersect(ray),
            Primitive::Triangle(t) => t.intersect(ray),
        }
    }

    /// Bounding box, or `None` for unbounded primitives.
    pub fn bounds(&self) -> Option<Aabb> {
        match self {
            Primitive::Plane(_) => None,
            Primitive::UvPlane(p) => p.bounds(),
            Primitive::Sphere(s) => Some(s.bounds()),
            Primitive::Triangle(t) => Some(t.bounds()),
        }
    }

    /// Brightest emission channel over every material this primitive binds.
    pub fn max_emission(&self) -> f32 {
        match self {
            Primitive::Plane(p) => p.material().emission().max_element(),
            Primitive::UvPlane(p) => p.surface().max_emission(),
            Primitive::Sphere(s) => s.surface().max_emission(),
            Primitive::Triangle(t) => t.surface().max_emission(),
        }
    }
}

impl From<Plane> for Primitive {
    fn from(p: Plane) -> Self {
        Primitive::Plane(p)
    }
}

impl From<UvPlane> for Primitive {
    fn from(p: UvPlane) -> Self {
        Primitive::UvPlane(p)
    }
}

impl From<Sphere> for Primitive {
    fn from(s: Sphere) -> Self {
        Primitive::Sphere(s)
    }
}

impl From<Triangle> for Primitive {
    fn from(t: Triangle) -> Self {
        Primitive::Triangle(t)
    }
}
