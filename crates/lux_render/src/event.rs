//! Surface interaction events.
//!
//! A material is a discrete distribution over events. Each event samples a
//! continuation ray and knows how to weight radiance for the two estimators:
//! the Monte Carlo weight applied to radiance arriving along a *sampled*
//! direction, and the deterministic evaluation used for next-event estimation
//! against point lights and for photon density estimates.

use crate::sampling::{cosine_hemisphere, fresnel_dielectric, gen_f32, phong_lobe, reflect};
use crate::{Color, Hit, Medium, Ray};
use lux_math::{Onb, Vec3};
use rand::RngCore;
use std::f32::consts::{FRAC_1_PI, PI};
use std::sync::Arc;

/// Smallest selection probability an event can carry.
const MIN_PROBABILITY: f32 = 1e-6;

/// A planar parallelogram aperture used by portal events.
#[derive(Debug, Clone, PartialEq)]
pub struct Aperture {
    origin: Vec3,
    edge_u: Vec3,
    edge_v: Vec3,
    frame: Onb,
    // dual basis so (p - origin) maps to (u, v) for non-orthogonal edges
    dual_u: Vec3,
    dual_v: Vec3,
}

impl Aperture {
    pub fn new(origin: Vec3, edge_u: Vec3, edge_v: Vec3) -> Self {
        let frame = Onb::from_edges(edge_u, edge_v);
        let n = frame.w;
        let cu = edge_v.cross(n);
        let cv = n.cross(edge_u);
        Self {
            origin,
            edge_u,
            edge_v,
            frame,
            dual_u: cu / edge_u.dot(cu),
            dual_v: cv / edge_v.dot(cv),
        }
    }

    /// Aperture coordinates of a point on (or near) its plane.
    pub fn local_coords(&self, p: Vec3) -> (f32, f32) {
        let d = p - self.origin;
        (d.dot(self.dual_u), d.dot(self.dual_v))
    }

    /// World position of aperture coordinates `(a, b)`.
    pub fn point_at(&self, a: f32, b: f32) -> Vec3 {
        self.origin + a * self.edge_u + b * self.edge_v
    }

    pub fn normal(&self) -> Vec3 {
        self.frame.w
    }
}

/// The interaction law of an event.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// Lambertian reflection.
    Diffuse { color: Color },
    /// Normalized Phong lobe around the mirror direction.
    Glossy { color: Color, exponent: f32 },
    /// Perfect mirror reflection.
    Mirror,
    /// Perfect refraction between two media, with Fresnel-weighted reflection.
    Transmission {
        inside: Arc<Medium>,
        outside: Arc<Medium>,
        fresnel: bool,
    },
    /// Teleport from one aperture to its paired aperture.
    Portal { from: Aperture, to: Aperture },
}

/// A weighted interaction event, shared by every material that lists it.
#[derive(Debug, Clone)]
pub struct Event {
    probability: f32,
    kind: EventKind,
}

impl Event {
    /// Create an event. The probability is clamped into (0, 1]; non-finite
    /// values fall to the minimum.
    pub fn new(kind: EventKind, probability: f32) -> Self {
        let clamped = if probability.is_finite() {
            probability.clamp(MIN_PROBABILITY, 1.0)
        } else {
            MIN_PROBABILITY
        };
        if clamped != probability {
            log::warn!("event probability {probability} clamped to {clamped}");
        }
        Self {
            probability: clamped,
            kind,
        }
    }

    pub fn diffuse(color: Color, probability: f32) -> Self {
        Self::new(EventKind::Diffuse { color }, probability)
    }

    pub fn glossy(color: Color, exponent: f32, probability: f32) -> Self {
        Self::new(
            EventKind::Glossy {
                color,
                exponent: exponent.max(0.0),
            },
            probability,
        )
    }

    pub fn mirror(probability: f32) -> Self {
        Self::new(EventKind::Mirror, probability)
    }

    /// Refraction into `inside` from `outside`, Fresnel splitting enabled.
    pub fn transmission(inside: Arc<Medium>, outside: Arc<Medium>, probability: f32) -> Self {
        Self::new(
            EventKind::Transmission {
                inside,
                outside,
                fresnel: true,
            },
            probability,
        )
    }

    /// Two events teleporting `a -> b` and `b -> a`.
    pub fn portal_pair(a: Aperture, b: Aperture, probability: f32) -> (Self, Self) {
        (
            Self::new(
                EventKind::Portal {
                    from: a.clone(),
                    to: b.clone(),
                },
                probability,
            ),
            Self::new(EventKind::Portal { from: b, to: a }, probability),
        )
    }

    /// Enable or disable the stochastic Fresnel split of a transmission event.
    ///
    /// Without it every non-TIR interaction refracts, trading bias for
    /// lower variance. No effect on other kinds.
    pub fn with_fresnel(mut self, enabled: bool) -> Self {
        if let EventKind::Transmission { fresnel, .. } = &mut self.kind {
            *fresnel = enabled;
        }
        self
    }

    #[inline]
    pub fn probability(&self) -> f32 {
        self.probability
    }

    #[inline]
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Delta events have zero solid-angle support and are never hit by
    /// explicit light sampling.
    pub fn is_delta(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Mirror | EventKind::Transmission { .. } | EventKind::Portal { .. }
        )
    }

    /// Stochastically choose a continuation ray, or `None` if the event
    /// cannot produce one.
    pub fn sample_next_ray(&self, ray: &Ray, hit: &Hit, rng: &mut dyn RngCore) -> Option<Ray> {
        let n = hit.normal;
        match &self.kind {
            EventKind::Diffuse { .. } => {
                let dir = cosine_hemisphere(n, rng);
                if dir.dot(n) <= 0.0 {
                    return None;
                }
                Some(ray.spawn(hit.offset_origin(dir), dir, hit.distance))
            }
            EventKind::Glossy { exponent, .. } => {
                let axis = reflect(ray.direction(), n);
                let dir = phong_lobe(axis, *exponent, rng);
                if dir.dot(n) <= 0.0 {
                    return None;
                }
                Some(ray.spawn(hit.offset_origin(dir), dir, hit.distance))
            }
            EventKind::Mirror => {
                let dir = reflect(ray.direction(), n);
                Some(ray.spawn(hit.offset_origin(dir), dir, hit.distance))
            }
            EventKind::Transmission {
                inside,
                outside,
                fresnel,
            } => sample_transmission(ray, hit, inside, outside, *fresnel, rng),
            EventKind::Portal { from, to } => {
                let (a, b) = from.local_coords(hit.point);
                let local = from.frame.world_to_local(ray.direction());
                // mirrored in u and in the normal so the view looks through
                let dir = to
                    .frame
                    .local_to_world(Vec3::new(-local.x, local.y, -local.z));
                let origin = to.point_at(1.0 - a, b);
                if !origin.is_finite() || dir.length_squared() == 0.0 {
                    return None;
                }
                Some(ray.spawn(origin, dir, hit.distance))
            }
        }
    }

    /// Weight radiance that arrived along a direction sampled by this event.
    ///
    /// `probability` is the selection probability the owning material
    /// assigned to this event.
    pub fn apply_monte_carlo(
        &self,
        probability: f32,
        radiance: Color,
        hit: &Hit,
        wi: Vec3,
        _wo: Vec3,
    ) -> Color {
        match &self.kind {
            EventKind::Diffuse { color } => *color * radiance / probability,
            EventKind::Glossy { color, exponent } => {
                let cos = hit.normal.dot(wi).max(0.0);
                *color * radiance * ((exponent + 2.0) / (exponent + 1.0)) * cos / probability
            }
            // cosine and probability terms cancel for delta events
            EventKind::Mirror | EventKind::Transmission { .. } | EventKind::Portal { .. } => {
                radiance
            }
        }
    }

    /// Deterministic reflection of light arriving from `wi` towards `wo`.
    ///
    /// `irradiance` is power per unit surface area, so the cosine at the
    /// surface is already folded in: point lights project it before calling,
    /// photon flux densities carry it by construction. Light from below the
    /// surface and delta events give zero.
    pub fn apply_next_event(&self, irradiance: Color, hit: &Hit, wi: Vec3, wo: Vec3) -> Color {
        if hit.normal.dot(wi) <= 0.0 {
            return Color::ZERO;
        }
        match &self.kind {
            EventKind::Diffuse { color } => *color * irradiance * FRAC_1_PI,
            EventKind::Glossy { color, exponent } => {
                let mirror = reflect(-wo, hit.normal);
                let lobe = mirror.dot(wi).max(0.0).powf(*exponent);
                *color * irradiance * ((exponent + 2.0) / (2.0 * PI)) * lobe
            }
            EventKind::Mirror | EventKind::Transmission { .. } | EventKind::Portal { .. } => {
                Color::ZERO
            }
        }
    }
}

fn sample_transmission(
    ray: &Ray,
    hit: &Hit,
    inside: &Arc<Medium>,
    outside: &Arc<Medium>,
    fresnel: bool,
    rng: &mut dyn RngCore,
) -> Option<Ray> {
    let d = ray.direction();
    let n = hit.normal;
    let (n1, n2, target) = if hit.entering {
        (outside.ior, inside.ior, inside)
    } else {
        (inside.ior, outside.ior, outside)
    };

    let cos_i = (-d.dot(n)).clamp(0.0, 1.0);
    let eta = n1 / n2;
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i);

    let reflected = || {
        let dir = reflect(d, n);
        ray.spawn(hit.offset_origin(dir), dir, hit.distance)
    };

    // total internal reflection
    if sin2_t > 1.0 {
        return Some(reflected());
    }

    let cos_t = (1.0 - sin2_t).sqrt();
    if fresnel && gen_f32(rng) < fresnel_dielectric(cos_i, cos_t, n1, n2) {
        return Some(reflected());
    }

    let dir = eta * d + (eta * cos_i - cos_t) * n;
    if dir.length_squared() == 0.0 {
        return None;
    }
    Some(ray.spawn_into(hit.offset_origin(dir), dir, target.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Material;
    use lux_math::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn air() -> Arc<Medium> {
        Arc::new(Medium::vacuum())
    }

    fn hit_on_floor<'a>(ray: &Ray, material: &'a Material) -> Hit<'a> {
        // floor y = 0, ray comes from above
        let t = -ray.origin().y / ray.direction().y;
        Hit::new(ray, t, Vec3::Y, material, Vec2::ZERO)
    }

    #[test]
    fn test_delta_classification() {
        assert!(!Event::diffuse(Color::ONE, 0.5).is_delta());
        assert!(!Event::glossy(Color::ONE, 10.0, 0.5).is_delta());
        assert!(Event::mirror(0.5).is_delta());
        assert!(Event::transmission(air(), air(), 0.5).is_delta());
    }

    #[test]
    fn test_probability_clamped() {
        assert_eq!(Event::mirror(3.0).probability(), 1.0);
        assert!(Event::mirror(0.0).probability() > 0.0);
    }

    #[test]
    fn test_non_finite_probability_falls_to_minimum() {
        assert_eq!(Event::mirror(f32::NAN).probability(), MIN_PROBABILITY);
        assert_eq!(Event::mirror(f32::INFINITY).probability(), MIN_PROBABILITY);

        let material = Material::new()
            .with_event(Arc::new(Event::diffuse(Color::ONE, f32::NAN)))
            .with_event(Arc::new(Event::mirror(0.5)));
        let total = material.total_probability();
        assert!(total.is_finite() && total <= 1.0);
        assert!(material.entries().iter().all(|e| e.cumulative().is_finite()));
    }

    #[test]
    fn test_mirror_reflects_and_passes_radiance() {
        let material = Material::new();
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), air());
        let hit = hit_on_floor(&ray, &material);
        let mut rng = StdRng::seed_from_u64(1);

        let event = Event::mirror(0.7);
        let next = event.sample_next_ray(&ray, &hit, &mut rng).unwrap();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((next.direction() - expected).length() < 1e-5);

        let radiance = Color::new(0.2, 0.4, 0.6);
        let wo = -ray.direction();
        assert_eq!(
            event.apply_monte_carlo(0.7, radiance, &hit, next.direction(), wo),
            radiance
        );
        assert_eq!(
            event.apply_next_event(radiance, &hit, next.direction(), wo),
            Color::ZERO
        );
    }

    #[test]
    fn test_diffuse_weights() {
        let material = Material::new();
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, air());
        let hit = hit_on_floor(&ray, &material);
        let event = Event::diffuse(Color::new(0.5, 0.5, 0.5), 0.5);

        let mc = event.apply_monte_carlo(0.5, Color::ONE, &hit, Vec3::Y, Vec3::Y);
        assert!((mc - Color::ONE).length() < 1e-6);

        let ne = event.apply_next_event(Color::ONE, &hit, Vec3::Y, Vec3::Y);
        assert!((ne.x - 0.5 * FRAC_1_PI).abs() < 1e-6);

        // light below the surface contributes nothing
        let below = event.apply_next_event(Color::ONE, &hit, -Vec3::Y, Vec3::Y);
        assert_eq!(below, Color::ZERO);

        // irradiance already carries the projection, grazing light is not dimmed again
        let grazing = Vec3::new(1.0, 0.5, 0.0).normalize();
        let oblique = event.apply_next_event(Color::ONE, &hit, grazing, Vec3::Y);
        assert!((oblique - ne).length() < 1e-6);
    }

    #[test]
    fn test_glossy_samples_above_surface() {
        let material = Material::new();
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), air());
        let hit = hit_on_floor(&ray, &material);
        let event = Event::glossy(Color::ONE, 20.0, 1.0);
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..200 {
            if let Some(next) = event.sample_next_ray(&ray, &hit, &mut rng) {
                assert!(next.direction().dot(hit.normal) > 0.0);
            }
        }

        // peak of the lobe is the mirror direction
        let wo = -ray.direction();
        let mirror = Vec3::new(1.0, 1.0, 0.0).normalize();
        let off = Vec3::new(0.2, 1.0, 0.3).normalize();
        let at_peak = event.apply_next_event(Color::ONE, &hit, mirror, wo);
        let away = event.apply_next_event(Color::ONE, &hit, off, wo);
        assert!(at_peak.x > away.x);
    }

    #[test]
    fn test_transmission_refracts_into_inside_medium() {
        let material = Material::new();
        let glass = Arc::new(Medium::new(1.5));
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, air());
        let hit = hit_on_floor(&ray, &material);
        let event = Event::transmission(glass.clone(), air(), 1.0).with_fresnel(false);
        let mut rng = StdRng::seed_from_u64(2);

        let next = event.sample_next_ray(&ray, &hit, &mut rng).unwrap();
        assert!((next.direction() + Vec3::Y).length() < 1e-5);
        assert!(Arc::ptr_eq(next.medium(), &glass));
        assert!(next.origin().y < 0.0);
    }

    #[test]
    fn test_transmission_snell_angle() {
        let material = Material::new();
        let glass = Arc::new(Medium::new(1.5));
        let dir = Vec3::new(1.0, -1.0, 0.0).normalize();
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), dir, air());
        let hit = hit_on_floor(&ray, &material);
        let event = Event::transmission(glass, air(), 1.0).with_fresnel(false);
        let mut rng = StdRng::seed_from_u64(2);

        let next = event.sample_next_ray(&ray, &hit, &mut rng).unwrap();
        let sin_t = next.direction().x;
        assert!((sin_t - (45f32.to_radians().sin() / 1.5)).abs() < 1e-4);
    }

    #[test]
    fn test_total_internal_reflection() {
        let material = Material::new();
        let glass = Arc::new(Medium::new(1.5));
        // leaving glass at a grazing angle: hit from inside
        let dir = Vec3::new(1.0, 0.3, 0.0).normalize();
        let ray = Ray::new(Vec3::new(0.0, -0.3, 0.0), dir, glass.clone());
        let t = 0.3 / dir.y;
        let hit = Hit::new(&ray, t, Vec3::Y, &material, Vec2::ZERO);
        assert!(!hit.entering);

        let event = Event::transmission(glass.clone(), air(), 1.0);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..20 {
            let next = event.sample_next_ray(&ray, &hit, &mut rng).unwrap();
            assert!(next.direction().y < 0.0);
            assert!(Arc::ptr_eq(next.medium(), &glass));
        }
    }

    #[test]
    fn test_portal_teleports_to_paired_aperture() {
        let material = Material::new();
        // source aperture on the floor, target on a wall at x = 10
        let floor = Aperture::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -2.0));
        assert!((floor.normal() - Vec3::Y).length() < 1e-5);
        let wall = Aperture::new(Vec3::new(10.0, -1.0, -1.0), Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 2.0, 0.0));
        let (into_wall, _) = Event::portal_pair(floor.clone(), wall.clone(), 1.0);

        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, air());
        let hit = hit_on_floor(&ray, &material);
        let mut rng = StdRng::seed_from_u64(0);
        let next = into_wall.sample_next_ray(&ray, &hit, &mut rng).unwrap();

        // center maps to center, direction leaves through the front of the target
        assert!((next.origin() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
        assert!(next.direction().dot(wall.normal()) > 0.99);
        assert_eq!(
            into_wall.apply_monte_carlo(1.0, Color::ONE, &hit, next.direction(), Vec3::Y),
            Color::ONE
        );
    }
}
