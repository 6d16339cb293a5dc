//! Cornell box demo.
//!
//! Renders a Cornell box with either integrator and saves a PNG.
//!
//! ```text
//! cargo run --release -p lux_render --example cornell -- [path|photon] [settings.json]
//! ```

use anyhow::{bail, Context, Result};
use lux_render::{
    Aperture, Camera, Color, Event, ImageBuffer, Integrator, Material, MaterialGrid, Medium, Mesh, Node,
    PathTracer, PhotonEmitter, PhotonMapper, PointLight, Primitive, RenderSettings, Renderer,
    Scene, Sphere, UvPlane, Vec3,
};
use lux_math::Mat4;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "path".to_string());
    let settings = match args.next() {
        Some(path) => RenderSettings::from_path(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => RenderSettings::new()
            .with_resolution(400, 400)
            .with_samples(64)
            .with_seed(1),
    };
    settings.validate()?;

    let start = std::time::Instant::now();
    let scene = build_scene(&settings);
    log::info!(
        "scene built in {:?}: {} primitives, {} lights",
        start.elapsed(),
        scene.world().primitive_count(),
        scene.lights().len()
    );

    let camera = Camera::from_settings(&settings)
        .with_position(Vec3::new(0.0, 0.0, 3.6), Vec3::ZERO, Vec3::Y)
        .with_lens(40.0, settings.aperture, settings.focus_distance.max(3.6));

    let image = match mode.as_str() {
        "path" => render(PathTracer::new(settings.clone()), camera, &scene),
        "photon" => {
            let maps = PhotonEmitter::new(&settings).emit_point_lights(&scene, scene.medium());
            render(PhotonMapper::new(settings.clone(), maps), camera, &scene)
        }
        other => bail!("unknown mode '{other}', expected 'path' or 'photon'"),
    };

    let filename = format!("cornell_{mode}.png");
    save_png(&image, &filename)?;
    log::info!("saved {filename}");
    Ok(())
}

fn render<I: Integrator>(integrator: I, camera: Camera, scene: &Scene) -> ImageBuffer {
    let mut renderer = Renderer::new(integrator, camera);
    renderer.render(scene);
    renderer.into_result()
}

fn save_png(image: &ImageBuffer, filename: &str) -> Result<()> {
    let buffer = image::RgbaImage::from_raw(image.width, image.height, image.to_rgba())
        .context("image buffer has the wrong size")?;
    buffer
        .save(filename)
        .with_context(|| format!("writing {filename}"))?;
    Ok(())
}

fn diffuse(color: Color) -> Arc<Material> {
    Arc::new(Material::new().with_event(Arc::new(Event::diffuse(color, 0.7))))
}

fn build_scene(settings: &RenderSettings) -> Scene {
    let white = diffuse(Color::splat(0.75));
    let red = diffuse(Color::new(0.75, 0.15, 0.15));
    let green = diffuse(Color::new(0.15, 0.75, 0.15));
    let dark = diffuse(Color::splat(0.2));

    let air = Arc::new(Medium::vacuum());
    let glass = Arc::new(Medium::new(1.5));
    let mirror = Arc::new(Material::new().with_event(Arc::new(Event::mirror(0.95))));
    let clear = Arc::new(
        Material::new().with_event(Arc::new(settings.transmission(glass, air.clone(), 0.95))),
    );
    // shared events across a two-lobe plastic
    let plastic = Arc::new(
        Material::new()
            .with_event(Arc::new(Event::diffuse(Color::new(0.2, 0.3, 0.7), 0.6)))
            .with_event(Arc::new(Event::glossy(Color::ONE, 60.0, 0.3))),
    );

    let corner = Vec3::splat(-1.0);
    let (x2, y2, z2) = (Vec3::X * 2.0, Vec3::Y * 2.0, Vec3::Z * 2.0);
    let floor = MaterialGrid::checker(8, 8, white.clone(), dark);

    let mut primitives: Vec<Primitive> = vec![
        UvPlane::new(corner, x2, z2, Arc::new(floor)).into(),
        UvPlane::quad(Vec3::new(-1.0, 1.0, -1.0), x2, z2, white.clone()).into(),
        UvPlane::quad(corner, x2, y2, white).into(),
        UvPlane::quad(corner, z2, y2, red).into(),
        UvPlane::quad(Vec3::new(1.0, -1.0, -1.0), z2, y2, green).into(),
        Sphere::new(Vec3::new(-0.45, -0.65, -0.35), 0.35, mirror).into(),
        Sphere::new(Vec3::new(0.45, -0.65, 0.3), 0.35, clear).into(),
    ];

    // portal pair set into the side walls
    let left = (Vec3::new(-0.99, -0.1, -0.7), Vec3::new(0.0, 0.0, 0.5), Vec3::Y * 0.5);
    let right = (Vec3::new(0.99, -0.1, -0.2), Vec3::new(0.0, 0.0, -0.5), Vec3::Y * 0.5);
    let (to_right, to_left) = Event::portal_pair(
        Aperture::new(left.0, left.1, left.2),
        Aperture::new(right.0, right.1, right.2),
        1.0,
    );
    for ((origin, edge_u, edge_v), event) in [(left, to_right), (right, to_left)] {
        let portal = Arc::new(Material::new().with_event(Arc::new(event)));
        primitives.push(UvPlane::quad(origin, edge_u, edge_v, portal).into());
    }

    // a small tetrahedron hanging from the ceiling
    let tetra = Mesh::new(
        vec![
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(0.0, -1.0, -1.0),
        ],
        vec![[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]],
    )
    .transformed(&(Mat4::from_translation(Vec3::new(0.1, 0.35, -0.4)) * Mat4::from_scale(Vec3::splat(0.2))));
    primitives.extend(Arc::new(tetra).triangles(Arc::new(MaterialGrid::uniform(plastic))));

    Scene::new(Node::build_tree(primitives))
        .with_medium(air)
        .with_light(PointLight::new(Vec3::new(0.0, 0.85, 0.0), Color::splat(3.0)))
}
