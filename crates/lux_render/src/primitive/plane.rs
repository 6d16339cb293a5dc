//! Infinite and UV-mapped planes.

use super::MaterialGrid;
use crate::{Aperture, Hit, Material, Ray, EPSILON};
use lux_math::{Aabb, Vec2, Vec3};
use std::sync::Arc;

/// Rays closer to parallel than this never hit a plane.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Distance along `ray` to the plane `normal . x = offset`.
fn plane_distance(normal: Vec3, offset: f32, ray: &Ray) -> Option<f32> {
    let denom = normal.dot(ray.direction());
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (offset - normal.dot(ray.origin())) / denom;
    (t > EPSILON).then_some(t)
}

/// Infinite plane `normal . x = offset` with a single material.
#[derive(Debug, Clone)]
pub struct Plane {
    normal: Vec3,
    offset: f32,
    material: Arc<Material>,
}

impl Plane {
    /// Create a plane from a (not necessarily unit) normal and offset.
    ///
    /// A zero or non-finite normal gives a plane that is never hit.
    pub fn new(normal: Vec3, offset: f32, material: Arc<Material>) -> Self {
        let len = normal.length();
        if !(len.is_finite() && len > 0.0) {
            log::warn!("plane normal {normal:?} is degenerate; the plane will never be hit");
            return Self {
                normal: Vec3::ZERO,
                offset: 0.0,
                material,
            };
        }
        Self {
            normal: normal / len,
            offset: offset / len,
            material,
        }
    }

    /// Plane through `point` facing `normal`.
    pub fn through(point: Vec3, normal: Vec3, material: Arc<Material>) -> Self {
        let normal = normal.normalize();
        Self::new(normal, normal.dot(point), material)
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let t = plane_distance(self.normal, self.offset, ray)?;
        Some(Hit::new(ray, t, self.normal, &self.material, Vec2::ZERO))
    }
}

/// A plane parameterized by two edge vectors from an origin.
///
/// The hit point's UV is its coordinate in the (possibly non-orthogonal)
/// edge basis. Without wrapping the surface is the parallelogram
/// `origin + [0,1] * edge_u + [0,1] * edge_v`; with wrapping it tiles the
/// whole plane. The material comes from a [`MaterialGrid`] and a hole in the
/// grid is a miss.
#[derive(Debug, Clone)]
pub struct UvPlane {
    origin: Vec3,
    edge_u: Vec3,
    edge_v: Vec3,
    normal: Vec3,
    offset: f32,
    dual_u: Vec3,
    dual_v: Vec3,
    surface: Arc<MaterialGrid>,
    wrap: bool,
}

impl UvPlane {
    pub fn new(origin: Vec3, edge_u: Vec3, edge_v: Vec3, surface: Arc<MaterialGrid>) -> Self {
        let normal = edge_u.cross(edge_v).normalize();
        let cu = edge_v.cross(normal);
        let cv = normal.cross(edge_u);
        Self {
            origin,
            edge_u,
            edge_v,
            normal,
            offset: normal.dot(origin),
            dual_u: cu / edge_u.dot(cu),
            dual_v: cv / edge_v.dot(cv),
            surface,
            wrap: false,
        }
    }

    /// Parallelogram with one material everywhere.
    pub fn quad(origin: Vec3, edge_u: Vec3, edge_v: Vec3, material: Arc<Material>) -> Self {
        Self::new(
            origin,
            edge_u,
            edge_v,
            Arc::new(MaterialGrid::uniform(material)),
        )
    }

    /// Tile the material grid across the whole plane.
    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn surface(&self) -> &MaterialGrid {
        &self.surface
    }

    /// The same parallelogram as a portal aperture.
    pub fn aperture(&self) -> Aperture {
        Aperture::new(self.origin, self.edge_u, self.edge_v)
    }

    pub fn uv_at(&self, p: Vec3) -> Vec2 {
        let d = p - self.origin;
        Vec2::new(d.dot(self.dual_u), d.dot(self.dual_v))
    }

    pub fn bounds(&self) -> Option<Aabb> {
        if self.wrap {
            return None;
        }
        let far = self.origin + self.edge_u + self.edge_v;
        Some(
            Aabb::from_points(self.origin, far)
                .include_point(self.origin + self.edge_u)
                .include_point(self.origin + self.edge_v),
        )
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let t = plane_distance(self.normal, self.offset, ray)?;
        let uv = self.uv_at(ray.at(t));
        if !self.wrap && !((0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)) {
            return None;
        }
        let material = self.surface.lookup(uv)?;
        Some(Hit::new(ray, t, self.normal, material, uv))
    }
}
