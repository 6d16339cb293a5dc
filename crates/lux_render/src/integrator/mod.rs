//! Radiance estimators.

mod path;
mod photon;

pub use path::PathTracer;
pub use photon::PhotonMapper;

use crate::{Camera, Color, Ray, RenderSettings, Scene};
use rand::RngCore;

/// Estimates the radiance carried back along camera rays.
///
/// Implementations are shared read-only across render workers; all
/// per-path state lives on the stack of the calling worker.
pub trait Integrator: Send + Sync {
    /// Radiance arriving at the ray origin from along the ray.
    fn radiance(&self, ray: &Ray, scene: &Scene, rng: &mut dyn RngCore) -> Color;

    fn settings(&self) -> &RenderSettings;

    /// Mean of `samples_per_pixel` jittered samples through pixel
    /// `(px, py)`.
    ///
    /// Each sample is scaled down so its brightest channel does not exceed
    /// the scene's maximum light; non-finite samples count as black.
    fn trace_pixel(
        &self,
        px: u32,
        py: u32,
        camera: &Camera,
        scene: &Scene,
        rng: &mut dyn RngCore,
    ) -> Color {
        let samples = self.settings().samples_per_pixel.max(1);
        let limit = scene.max_light();

        let mut sum = Color::ZERO;
        for _ in 0..samples {
            let ray = camera.get_ray(px, py, scene.medium(), rng);
            let mut color = self.radiance(&ray, scene, rng);
            if !color.is_finite() {
                continue;
            }
            let peak = color.max_element();
            if limit > 0.0 && peak > limit {
                color *= limit / peak;
            }
            sum += color;
        }
        sum / samples as f32
    }
}
