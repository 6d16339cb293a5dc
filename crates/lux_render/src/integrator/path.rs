//! Unidirectional path tracing with next-event estimation.

use super::Integrator;
use crate::{Color, Ray, RenderSettings, Scene};
use rand::RngCore;

/// Recursive Monte Carlo path tracer.
///
/// At every non-emissive hit one event is chosen by Russian roulette; the
/// path continues through it and the event's direct lighting from the point
/// lights is added. Paths end on escape, on an emitter, on absorption, or at
/// `max_depth`.
#[derive(Debug, Clone)]
pub struct PathTracer {
    settings: RenderSettings,
}

impl PathTracer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    fn trace(&self, ray: &Ray, scene: &Scene, rng: &mut dyn RngCore, depth: u32) -> Color {
        if depth >= self.settings.max_depth {
            return Color::ZERO;
        }

        let Some(hit) = scene.intersection(ray) else {
            return scene.background();
        };
        if hit.material.is_light() {
            return hit.material.emission();
        }

        let Some(entry) = hit.material.select_event(rng) else {
            return Color::ZERO;
        };
        let Some(next) = entry.sample_next_ray(ray, &hit, rng) else {
            return Color::ZERO;
        };

        let wo = -ray.direction();
        let incoming = self.trace(&next, scene, rng, depth + 1);
        entry.apply_monte_carlo(incoming, &hit, next.direction(), wo)
            + scene.direct_light(&hit, wo, Some(entry))
    }
}

impl Integrator for PathTracer {
    fn radiance(&self, ray: &Ray, scene: &Scene, rng: &mut dyn RngCore) -> Color {
        self.trace(ray, scene, rng, 0)
    }

    fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, Material, Medium, Node, Plane, PointLight, Sphere};
    use lux_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn tracer() -> PathTracer {
        PathTracer::new(RenderSettings::new().with_samples(1))
    }

    fn ray(origin: Vec3, direction: Vec3) -> Ray {
        Ray::new(origin, direction, Arc::new(Medium::vacuum()))
    }

    #[test]
    fn test_miss_returns_background() {
        let scene = Scene::new(Node::default()).with_background(Color::new(0.1, 0.2, 0.3));
        let mut rng = StdRng::seed_from_u64(0);
        let c = tracer().radiance(&ray(Vec3::ZERO, Vec3::X), &scene, &mut rng);
        assert_eq!(c, Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_emitter_returns_emission() {
        let lamp = Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, Arc::new(Material::light(Color::splat(5.0))));
        let scene = Scene::new(Node::build_tree(vec![lamp.into()]));
        let mut rng = StdRng::seed_from_u64(0);
        let c = tracer().radiance(&ray(Vec3::ZERO, -Vec3::Z), &scene, &mut rng);
        assert_eq!(c, Color::splat(5.0));
    }

    #[test]
    fn test_absorbing_material_is_black() {
        let black = Plane::new(Vec3::Y, 0.0, Arc::new(Material::new()));
        let scene = Scene::new(Node::build_tree(vec![black.into()]))
            .with_light(PointLight::new(Vec3::Y, Color::ONE));
        let mut rng = StdRng::seed_from_u64(0);
        let c = tracer().radiance(&ray(Vec3::Y * 0.5, -Vec3::Y), &scene, &mut rng);
        assert_eq!(c, Color::ZERO);
    }

    #[test]
    fn test_single_bounce_matches_direct_light() {
        // a diffuse floor under a point light, open sky: every continuation
        // escapes into a black background, leaving only the direct term
        let floor = Plane::new(
            Vec3::Y,
            0.0,
            Arc::new(Material::new().with_event(Arc::new(Event::diffuse(Color::ONE, 1.0)))),
        );
        let scene = Scene::new(Node::build_tree(vec![floor.into()]))
            .with_light(PointLight::new(Vec3::Y * 2.0, Color::splat(4.0)));
        let mut rng = StdRng::seed_from_u64(1);
        let c = tracer().radiance(&ray(Vec3::Y, -Vec3::Y), &scene, &mut rng);
        assert!((c.x - std::f32::consts::FRAC_1_PI).abs() < 1e-4);
    }

    #[test]
    fn test_depth_cap_stops_mirror_corridor() {
        // two facing mirrors with probability 1 never terminate on their own
        let mirror = Arc::new(Material::new().with_event(Arc::new(Event::mirror(1.0))));
        let scene = Scene::new(Node::build_tree(vec![
            Plane::new(Vec3::Z, -1.0, mirror.clone()).into(),
            Plane::new(-Vec3::Z, -1.0, mirror).into(),
        ]));
        let tracer = PathTracer::new(RenderSettings::new().with_max_depth(16));
        let mut rng = StdRng::seed_from_u64(0);
        let c = tracer.radiance(&ray(Vec3::ZERO, Vec3::Z), &scene, &mut rng);
        assert_eq!(c, Color::ZERO);
    }
}
