//! Photon-map gathering.

use super::Integrator;
use crate::sampling::free_flight;
use crate::{Color, EventEntry, Hit, Medium, PhotonIndex, PhotonMaps, Ray, RenderSettings, Scene};
use lux_math::Vec3;
use rand::RngCore;
use std::f32::consts::PI;

/// 1 / 4pi: isotropic phase function, and the solid-angle normalization of
/// a point light's power.
const INV_FOUR_PI: f32 = 0.25 / PI;

/// Backward gather pass over prebuilt photon maps.
///
/// Delta events are followed recursively. At the first non-delta hit the
/// radiance is the sum of the global and caustic density estimates and the
/// direct light of the point lights.
#[derive(Debug)]
pub struct PhotonMapper {
    settings: RenderSettings,
    maps: PhotonMaps,
}

impl PhotonMapper {
    pub fn new(settings: RenderSettings, maps: PhotonMaps) -> Self {
        Self { settings, maps }
    }

    pub fn maps(&self) -> &PhotonMaps {
        &self.maps
    }

    fn trace(&self, ray: &Ray, scene: &Scene, rng: &mut dyn RngCore, depth: u32) -> Color {
        if depth >= self.settings.max_depth {
            return Color::ZERO;
        }
        let hit = scene.intersection(ray);

        let medium = ray.medium();
        if medium.is_scattering() && !self.maps.volume.is_empty() {
            let flight = free_flight(medium.scattering, rng);
            if hit.as_ref().map_or(true, |h| flight < h.distance) {
                return self.volume_estimate(ray.at(flight), medium) * medium.albedo;
            }
        }

        let Some(hit) = hit else {
            return scene.background();
        };
        let material = hit.material;
        if material.is_light() {
            return material.emission();
        }

        let wo = -ray.direction();
        match material.select_event(rng) {
            // absorbed: only what is known at this point
            None => material.emission() + scene.direct_light(&hit, wo, None) * INV_FOUR_PI,
            Some(entry) if entry.is_delta() => match entry.sample_next_ray(ray, &hit, rng) {
                Some(next) => {
                    let incoming = self.trace(&next, scene, rng, depth + 1);
                    entry.apply_monte_carlo(incoming, &hit, next.direction(), wo)
                }
                None => Color::ZERO,
            },
            Some(entry) => {
                material.emission()
                    + self.surface_estimate(&self.maps.global, self.settings.photons.global_k, &hit, wo, entry)
                    + self.surface_estimate(&self.maps.caustic, self.settings.photons.caustic_k, &hit, wo, entry)
                    + scene.direct_light(&hit, wo, Some(entry)) * INV_FOUR_PI
            }
        }
    }

    /// Density estimate on a surface, weighted by the selected event.
    fn surface_estimate(
        &self,
        map: &PhotonIndex,
        k: usize,
        hit: &Hit,
        wo: Vec3,
        entry: &EventEntry,
    ) -> Color {
        map.estimate(hit.point, k, &self.settings.filter, |photon| {
            entry.apply_next_event(photon.flux, hit, -photon.direction, wo)
        }) / entry.probability()
    }

    /// In-scattered radiance from the volume map with an isotropic phase
    /// function.
    ///
    /// Photons are deposited at a rate proportional to the scattering
    /// coefficient, so the flux per gather-sphere volume is divided by it.
    fn volume_estimate(&self, point: Vec3, medium: &Medium) -> Color {
        let neighbors = self.maps.volume.search_nn(point, self.settings.photons.volume_k);
        if neighbors.is_empty() || neighbors.radius <= 0.0 {
            return Color::ZERO;
        }
        let r = neighbors.radius;
        let flux = neighbors
            .photons
            .iter()
            .fold(Color::ZERO, |acc, (photon, _)| acc + photon.flux);
        flux * INV_FOUR_PI / (4.0 / 3.0 * PI * r * r * r * medium.scattering)
    }
}

impl Integrator for PhotonMapper {
    fn radiance(&self, ray: &Ray, scene: &Scene, rng: &mut dyn RngCore) -> Color {
        self.trace(ray, scene, rng, 0)
    }

    fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}
