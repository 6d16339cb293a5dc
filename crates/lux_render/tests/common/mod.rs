//! Shared Cornell-box fixture for the integration tests.

use lux_render::{
    Camera, Color, Event, Material, Medium, Node, PointLight, Primitive, RenderSettings, Scene,
    Sphere, UvPlane, Vec3,
};
use std::sync::Arc;

pub const LIGHT_POSITION: Vec3 = Vec3::new(0.0, 0.8, 0.0);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn diffuse(color: Color) -> Arc<Material> {
    Arc::new(Material::new().with_event(Arc::new(Event::diffuse(color, 0.75))))
}

/// Open-fronted box spanning [-1, 1] on every axis, a point light under the
/// ceiling, a mirror sphere at the back left and a glass sphere at the front
/// right.
pub fn cornell_box(settings: &RenderSettings) -> Scene {
    let white = diffuse(Color::splat(0.75));
    let red = diffuse(Color::new(0.75, 0.15, 0.15));
    let green = diffuse(Color::new(0.15, 0.75, 0.15));

    let air = Arc::new(Medium::vacuum());
    let glass = Arc::new(Medium::new(1.5));
    let mirror = Arc::new(Material::new().with_event(Arc::new(Event::mirror(0.95))));
    let clear = Arc::new(Material::new().with_event(Arc::new(settings.transmission(glass, air.clone(), 0.95))));

    let corner = Vec3::splat(-1.0);
    let (x2, y2, z2) = (Vec3::X * 2.0, Vec3::Y * 2.0, Vec3::Z * 2.0);
    let primitives: Vec<Primitive> = vec![
        UvPlane::quad(corner, x2, z2, white.clone()).into(),
        UvPlane::quad(Vec3::new(-1.0, 1.0, -1.0), x2, z2, white.clone()).into(),
        UvPlane::quad(corner, x2, y2, white).into(),
        UvPlane::quad(corner, z2, y2, red).into(),
        UvPlane::quad(Vec3::new(1.0, -1.0, -1.0), z2, y2, green).into(),
        Sphere::new(Vec3::new(-0.45, -0.65, -0.3), 0.35, mirror).into(),
        Sphere::new(Vec3::new(0.45, -0.65, 0.3), 0.35, clear).into(),
    ];

    Scene::new(Node::build_tree(primitives))
        .with_medium(air)
        .with_light(PointLight::new(LIGHT_POSITION, Color::splat(3.0)))
}

pub fn camera(settings: &RenderSettings) -> Camera {
    Camera::from_settings(settings)
        .with_position(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, Vec3::Y)
        .with_lens(50.0, 0.0, 4.0)
}
