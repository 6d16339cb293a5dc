//! End-to-end path tracing of the Cornell box.

mod common;

use lux_render::{Color, ImageBuffer, PathTracer, RenderSettings, Renderer};

fn render(samples: u32) -> ImageBuffer {
    common::init_logging();
    let settings = RenderSettings::new()
        .with_resolution(64, 64)
        .with_samples(samples)
        .with_seed(2024);
    let scene = common::cornell_box(&settings);
    let mut renderer = Renderer::new(PathTracer::new(settings.clone()), common::camera(&settings));
    renderer.render(&scene);
    renderer.into_result()
}

#[test]
fn test_cornell_box_regions() {
    let image = render(32);

    for c in &image.pixels {
        assert!(c.is_finite());
        assert!(c.min_element() >= 0.0);
    }

    // corners look past the open box into the black background
    for (x, y) in [(0, 0), (60, 0), (0, 60), (60, 60)] {
        assert_eq!(image.average(x, y, x + 4, y + 4), Color::ZERO, "corner {x},{y}");
    }

    // ceiling just above the light against the whole frame
    let near_light = image.average(28, 13, 36, 17);
    let frame = image.average(0, 0, 64, 64);
    assert!(
        near_light.max_element() > 2.0 * frame.max_element(),
        "near light {near_light}, frame {frame}"
    );

    // left side of the mirror sphere reflects the red wall
    let reflection = image.average(20, 41, 23, 44);
    assert!(reflection.x > 0.0);
    assert!(reflection.x > 1.5 * reflection.y, "reflection {reflection}");

    // walls keep their colors
    let left_wall = image.average(11, 28, 15, 32);
    let right_wall = image.average(49, 28, 53, 32);
    assert!(left_wall.x > left_wall.y);
    assert!(right_wall.y > right_wall.x);
}

#[test]
fn test_more_samples_reduce_noise() {
    // pixel-to-pixel variation on the back wall, where the true image is smooth
    let roughness = |image: &ImageBuffer| {
        let mut total = 0.0;
        for y in 22..30 {
            for x in 26..38 {
                total += (image.get(x, y) - image.get(x + 1, y)).abs().element_sum();
            }
        }
        total
    };

    let coarse = roughness(&render(2));
    let fine = roughness(&render(32));
    assert!(fine < coarse, "fine {fine} >= coarse {coarse}");
}
