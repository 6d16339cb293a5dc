//! Pinhole and thin-lens camera.

use crate::sampling::{random_in_unit_disk, sample_square};
use crate::{Medium, Ray, RenderSettings};
use lux_math::Vec3;
use rand::RngCore;
use std::sync::Arc;

/// Camera for generating rays into the scene.
///
/// Every builder method recomputes the cached viewport, so a camera is
/// always ready to generate rays.
#[derive(Debug, Clone)]
pub struct Camera {
    image_width: u32,
    image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,       // Vertical field of view in degrees
    aperture: f32,   // Lens radius, 0 for a pinhole
    focus_dist: f32, // Distance from camera to plane of perfect focus

    // Cached viewport
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            aperture: 0.0,
            focus_dist: 1.0,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
        };
        camera.update_viewport();
        camera
    }

    /// Camera with resolution and lens taken from render settings.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new()
            .with_resolution(settings.width, settings.height)
            .with_aperture(settings.aperture, settings.focus_distance)
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self.update_viewport();
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.update_viewport();
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, aperture: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.with_aperture(aperture, focus_dist)
    }

    /// Set the thin-lens radius and focus distance.
    pub fn with_aperture(mut self, aperture: f32, focus_dist: f32) -> Self {
        self.aperture = aperture.max(0.0);
        self.focus_dist = focus_dist.max(1e-3);
        self.update_viewport();
        self
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    fn update_viewport(&mut self) {
        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left =
            self.look_from - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);
    }

    /// Generate a jittered ray through pixel (i, j) starting in `medium`.
    pub fn get_ray(&self, i: u32, j: u32, medium: &Arc<Medium>, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.aperture <= 0.0 {
            self.look_from
        } else {
            let p = random_in_unit_disk(rng) * self.aperture;
            self.look_from + p.x * self.u + p.y * self.v
        };

        Ray::new(ray_origin, pixel_sample - ray_origin, medium.clone())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn vacuum() -> Arc<Medium> {
        Arc::new(Medium::vacuum())
    }

    #[test]
    fn test_camera_basis() {
        let camera = Camera::new()
            .with_resolution(800, 600)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0);

        assert_eq!(camera.position(), Vec3::ZERO);
        assert!((camera.w - Vec3::Z).length() < 0.001);
        assert_eq!(camera.resolution(), (800, 600));
    }

    #[test]
    fn test_camera_ray_direction() {
        let camera = Camera::new()
            .with_resolution(100, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        let mut rng = StdRng::seed_from_u64(42);

        // Center ray should point roughly towards -Z
        let ray = camera.get_ray(50, 50, &vacuum(), &mut rng);
        assert!(ray.direction().z < -0.99);

        // Top-left pixel looks up and left
        let corner = camera.get_ray(0, 0, &vacuum(), &mut rng);
        assert!(corner.direction().x < 0.0 && corner.direction().y > 0.0);
    }

    #[test]
    fn test_thin_lens_rays_converge_on_focus_plane() {
        let camera = Camera::new()
            .with_resolution(64, 64)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(40.0, 0.2, 5.0);
        let mut rng = StdRng::seed_from_u64(5);

        let mut origins_differ = false;
        for _ in 0..32 {
            let ray = camera.get_ray(32, 32, &vacuum(), &mut rng);
            assert!(ray.origin().length() <= 0.2 + 1e-5);
            origins_differ |= ray.origin().length() > 1e-3;
            // every ray passes within a pixel of the focus point
            let t = (-5.0 - ray.origin().z) / ray.direction().z;
            let p = ray.at(t);
            assert!(p.x.abs() < 0.2 && p.y.abs() < 0.2);
        }
        assert!(origins_differ);
    }

    #[test]
    fn test_rays_start_in_given_medium() {
        let glass = Arc::new(Medium::new(1.5));
        let ray = Camera::new().get_ray(0, 0, &glass, &mut StdRng::seed_from_u64(0));
        assert!(Arc::ptr_eq(ray.medium(), &glass));
    }
}
