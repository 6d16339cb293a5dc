//! Scene container and direct lighting.

use crate::{Color, EventEntry, Hit, Medium, Node, Ray};
use lux_math::Vec3;
use std::sync::Arc;

/// Shadow probes landing this close to the shaded point count as unoccluded.
const SHADOW_TOLERANCE: f32 = 1e-3;

/// An isotropic point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub emission: Color,
}

impl PointLight {
    pub fn new(position: Vec3, emission: Color) -> Self {
        Self { position, emission }
    }
}

/// World geometry, point lights and the ambient medium.
///
/// Immutable once rendering starts; shared by reference across workers.
#[derive(Debug, Clone)]
pub struct Scene {
    world: Node,
    lights: Vec<PointLight>,
    medium: Arc<Medium>,
    background: Color,
    max_light: f32,
}

impl Scene {
    pub fn new(world: Node) -> Self {
        let max_light = world.max_emission();
        Self {
            world,
            lights: Vec::new(),
            medium: Arc::new(Medium::vacuum()),
            background: Color::ZERO,
            max_light,
        }
    }

    /// Ambient medium camera rays and emitted photons start in.
    pub fn with_medium(mut self, medium: Arc<Medium>) -> Self {
        self.medium = medium;
        self
    }

    /// Radiance returned by rays that escape the scene.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.add_light(light);
        self
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.max_light = self.max_light.max(light.emission.max_element());
        self.lights.push(light);
    }

    pub fn world(&self) -> &Node {
        &self.world
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn medium(&self) -> &Arc<Medium> {
        &self.medium
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Brightest emission channel among lights and emissive materials.
    pub fn max_light(&self) -> f32 {
        self.max_light
    }

    pub fn intersection(&self, ray: &Ray) -> Option<Hit<'_>> {
        self.world.intersect(ray)
    }

    /// Direct illumination from the point lights leaving `hit` towards `wo`.
    ///
    /// With an event entry the selected event is evaluated and divided by its
    /// selection probability; without one the material's aggregate
    /// evaluation over every non-delta event is used.
    pub fn direct_light(&self, hit: &Hit, wo: Vec3, entry: Option<&EventEntry>) -> Color {
        let mut total = Color::ZERO;
        for light in &self.lights {
            let to_light = light.position - hit.point;
            let dist2 = to_light.length_squared();
            if dist2 == 0.0 {
                continue;
            }
            let dist = dist2.sqrt();
            let wi = to_light / dist;
            let cos = hit.normal.dot(wi);
            if cos <= 0.0 {
                continue;
            }

            let probe = Ray::new(light.position, -wi, self.medium.clone());
            match self.intersection(&probe) {
                Some(blocker) if (blocker.distance - dist).abs() < SHADOW_TOLERANCE => {}
                _ => continue,
            }

            let irradiance = light.emission * cos / dist2;
            total += match entry {
                Some(entry) => entry.apply_next_event(irradiance, hit, wi, wo) / entry.probability(),
                None => hit.material.evaluate(irradiance, hit, wi, wo),
            };
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, Material, Plane, Sphere};
    use std::f32::consts::FRAC_1_PI;

    fn floor_scene() -> Scene {
        let white = Arc::new(Material::new().with_event(Arc::new(Event::diffuse(Color::ONE, 0.5))));
        let floor = Plane::new(Vec3::Y, 0.0, white);
        Scene::new(Node::build_tree(vec![floor.into()]))
            .with_light(PointLight::new(Vec3::new(0.0, 2.0, 0.0), Color::splat(4.0)))
    }

    fn down(origin: Vec3) -> Ray {
        Ray::new(origin, -Vec3::Y, Arc::new(Medium::vacuum()))
    }

    #[test]
    fn test_direct_light_on_open_floor() {
        let scene = floor_scene();
        let ray = down(Vec3::new(0.0, 1.0, 0.0));
        let hit = scene.intersection(&ray).expect("floor");

        let aggregate = scene.direct_light(&hit, Vec3::Y, None);
        // 4 / 2^2 * cos(0) / pi
        assert!((aggregate.x - FRAC_1_PI).abs() < 1e-4);

        let entry = &hit.material.entries()[0];
        let selected = scene.direct_light(&hit, Vec3::Y, Some(entry));
        assert!((selected.x - FRAC_1_PI / 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_direct_light_falls_off_with_cosine() {
        let scene = floor_scene();
        // light at (0, 2, 0), point at (2, 0, 0): cos 45 degrees, distance^2 = 8
        let ray = down(Vec3::new(2.0, 1.0, 0.0));
        let hit = scene.intersection(&ray).expect("floor");

        let aggregate = scene.direct_light(&hit, Vec3::Y, None);
        let expected = 4.0 / 8.0 * std::f32::consts::FRAC_1_SQRT_2 * FRAC_1_PI;
        assert!((aggregate.x - expected).abs() < 1e-4);
    }

    #[test]
    fn test_occluded_light() {
        let blocker = Sphere::new(Vec3::new(0.0, 1.0, 0.0), 0.3, Arc::new(Material::new()));
        let white = Arc::new(Material::new().with_event(Arc::new(Event::diffuse(Color::ONE, 1.0))));
        let scene = Scene::new(Node::build_tree(vec![
            Plane::new(Vec3::Y, 0.0, white).into(),
            blocker.into(),
        ]))
        .with_light(PointLight::new(Vec3::new(0.0, 2.0, 0.0), Color::splat(4.0)));

        let hit = scene
            .intersection(&down(Vec3::new(0.0, 0.5, 0.0)))
            .expect("floor under the blocker");
        assert_eq!(scene.direct_light(&hit, Vec3::Y, None), Color::ZERO);
    }

    #[test]
    fn test_light_behind_surface_is_ignored() {
        let scene = floor_scene();
        let ray = Ray::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, Arc::new(Medium::vacuum()));
        let hit = scene.intersection(&ray).expect("underside of the floor");
        assert_eq!(scene.direct_light(&hit, -Vec3::Y, None), Color::ZERO);
    }

    #[test]
    fn test_max_light_tracks_lights_and_emitters() {
        let lamp = Sphere::new(Vec3::ZERO, 1.0, Arc::new(Material::light(Color::splat(7.0))));
        let mut scene = Scene::new(Node::build_tree(vec![lamp.into()]));
        assert_eq!(scene.max_light(), 7.0);

        scene.add_light(PointLight::new(Vec3::Y * 5.0, Color::new(1.0, 12.0, 1.0)));
        assert_eq!(scene.max_light(), 12.0);
        assert_eq!(scene.lights().len(), 1);
    }

    #[test]
    fn test_missing_geometry_is_not_an_error() {
        let scene = Scene::new(Node::default()).with_background(Color::splat(0.25));
        assert!(scene.intersection(&down(Vec3::ZERO)).is_none());
        assert_eq!(scene.background(), Color::splat(0.25));
    }
}
