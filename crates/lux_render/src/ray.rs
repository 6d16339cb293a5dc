//! Rays and the media they travel through.

use crate::Color;
use lux_math::Vec3;
use std::sync::Arc;

/// A homogeneous medium filling space between surfaces.
///
/// `scattering` is the scattering coefficient per unit distance; a value of
/// zero makes the medium clear (it then only contributes its refractive index).
#[derive(Debug, Clone, PartialEq)]
pub struct Medium {
    pub ior: f32,
    pub scattering: f32,
    pub albedo: Color,
}

impl Medium {
    /// Clear medium with the given index of refraction.
    pub fn new(ior: f32) -> Self {
        Self {
            ior,
            scattering: 0.0,
            albedo: Color::ONE,
        }
    }

    /// Vacuum / air.
    pub fn vacuum() -> Self {
        Self::new(1.0)
    }

    /// Make the medium participating.
    pub fn with_scattering(mut self, scattering: f32, albedo: Color) -> Self {
        self.scattering = scattering.max(0.0);
        self.albedo = albedo;
        self
    }

    #[inline]
    pub fn is_scattering(&self) -> bool {
        self.scattering > 0.0
    }
}

impl Default for Medium {
    fn default() -> Self {
        Self::vacuum()
    }
}

/// A ray with a unit direction and the medium it currently travels in.
///
/// Rays are never mutated; continuation rays are derived with the `spawn*`
/// methods, which carry the medium and the distance travelled since the last
/// medium event forward.
#[derive(Debug, Clone)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
    medium: Arc<Medium>,
    distance: f32,
}

impl Ray {
    /// Create a new ray. `direction` is normalized.
    pub fn new(origin: Vec3, direction: Vec3, medium: Arc<Medium>) -> Self {
        Self::with_distance(origin, direction, medium, 0.0)
    }

    fn with_distance(origin: Vec3, direction: Vec3, medium: Arc<Medium>, distance: f32) -> Self {
        let direction = direction.normalize();
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            medium,
            distance,
        }
    }

    /// Continue in the same medium after travelling `travelled` along this ray.
    pub fn spawn(&self, origin: Vec3, direction: Vec3, travelled: f32) -> Ray {
        Ray::with_distance(
            origin,
            direction,
            self.medium.clone(),
            self.distance + travelled,
        )
    }

    /// Continue into another medium. Crossing a boundary is a medium event.
    pub fn spawn_into(&self, origin: Vec3, direction: Vec3, medium: Arc<Medium>) -> Ray {
        Ray::with_distance(origin, direction, medium, 0.0)
    }

    /// New direction after scattering inside the current medium.
    pub fn scattered(&self, origin: Vec3, direction: Vec3) -> Ray {
        Ray::with_distance(origin, direction, self.medium.clone(), 0.0)
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Component-wise reciprocal of the direction, for slab tests.
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }

    #[inline]
    pub fn medium(&self) -> &Arc<Medium> {
        &self.medium
    }

    /// Distance travelled since the last medium event.
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// P(t) = origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn air() -> Arc<Medium> {
        Arc::new(Medium::vacuum())
    }

    #[test]
    fn test_ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0), air());

        assert!((ray.direction().length() - 1.0).abs() < 1e-6);
        assert!((ray.at(5.0) - Vec3::new(0.0, 3.0, 4.0)).length() < 1e-5);
        assert_eq!(ray.inv_direction().x, f32::INFINITY);
    }

    #[test]
    fn test_spawn_accumulates_distance() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, air());
        let next = ray.spawn(ray.at(2.0), Vec3::Y, 2.0);
        let last = next.spawn(next.at(1.5), Vec3::Z, 1.5);

        assert_eq!(last.distance(), 3.5);
        assert!(Arc::ptr_eq(last.medium(), ray.medium()));
    }

    #[test]
    fn test_medium_events_reset_distance() {
        let glass = Arc::new(Medium::new(1.5));
        let ray = Ray::new(Vec3::ZERO, Vec3::X, air()).spawn(Vec3::X, Vec3::X, 1.0);

        let inside = ray.spawn_into(Vec3::X, Vec3::X, glass.clone());
        assert_eq!(inside.distance(), 0.0);
        assert_eq!(inside.medium().ior, 1.5);

        let scattered = ray.scattered(Vec3::X, Vec3::Y);
        assert_eq!(scattered.distance(), 0.0);
    }

    #[test]
    fn test_scattering_medium() {
        assert!(!Medium::vacuum().is_scattering());
        let fog = Medium::vacuum().with_scattering(0.2, Color::splat(0.9));
        assert!(fog.is_scattering());
    }
}
