//! Parallel pixel driver and image buffer.

use crate::{Camera, Color, Integrator, Scene};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * linear_to_gamma(color.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(color.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(color.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Linear floating-point image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Mean color over a rectangle, clipped to the image.
    pub fn average(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Color {
        let (x1, y1) = (x1.min(self.width), y1.min(self.height));
        let mut sum = Color::ZERO;
        let mut n = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                sum += self.get(x, y);
                n += 1;
            }
        }
        if n == 0 {
            Color::ZERO
        } else {
            sum / n as f32
        }
    }

    /// Convert to gamma-corrected RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| color_to_rgba(*c)).collect()
    }
}

/// Run `f` on a dedicated pool of `threads` workers, or on the global rayon
/// pool when `threads` is 0 or the pool cannot be created.
pub(crate) fn run_with_threads<R, F>(threads: usize, f: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    if threads == 0 {
        return f();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(f),
        Err(err) => {
            log::warn!("could not build a {threads}-thread pool ({err}); using the global pool");
            f()
        }
    }
}

/// Drives an integrator over every pixel of the film.
///
/// Workers claim pixel indices from a shared atomic counter until the film
/// is exhausted. Each pixel gets its own random stream derived from the base
/// seed and the pixel index, so a fixed seed gives bit-identical images
/// regardless of scheduling.
pub struct Renderer<I: Integrator> {
    integrator: I,
    camera: Camera,
    image: ImageBuffer,
    seed: u64,
}

impl<I: Integrator> Renderer<I> {
    /// Create a renderer; the camera is resized to the integrator's settings.
    pub fn new(integrator: I, camera: Camera) -> Self {
        let settings = integrator.settings();
        let (width, height) = (settings.width, settings.height);
        let seed = settings.seed.unwrap_or_else(rand::random);
        Self {
            camera: camera.with_resolution(width, height),
            image: ImageBuffer::new(width, height),
            integrator,
            seed,
        }
    }

    pub fn integrator(&self) -> &I {
        &self.integrator
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Estimate one pixel with its own deterministic random stream.
    pub fn trace_pixel(&self, px: u32, py: u32, scene: &Scene) -> Color {
        let index = py as u64 * self.image.width as u64 + px as u64;
        let mut rng = StdRng::seed_from_u64(self.seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.integrator
            .trace_pixel(px, py, &self.camera, scene, &mut rng)
    }

    /// Render every pixel into the image buffer.
    pub fn render(&mut self, scene: &Scene) {
        let (width, height) = (self.image.width, self.image.height);
        let total = width as usize * height as usize;
        let threads = self.integrator.settings().threads;
        let start = Instant::now();
        log::info!(
            "rendering {width}x{height} at {} spp",
            self.integrator.settings().samples_per_pixel
        );

        let next = AtomicUsize::new(0);
        let done = AtomicUsize::new(0);
        let this = &*self;
        let results: Vec<Vec<(usize, Color)>> = run_with_threads(threads, || {
            (0..rayon::current_num_threads())
                .into_par_iter()
                .map(|_| {
                    let mut local = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        if index >= total {
                            break;
                        }
                        let (px, py) = ((index % width as usize) as u32, (index / width as usize) as u32);
                        local.push((index, this.trace_pixel(px, py, scene)));

                        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                        if finished * 10 / total != (finished - 1) * 10 / total {
                            log::info!("render {}% complete", finished * 100 / total);
                        }
                    }
                    local
                })
                .collect()
        });

        for (index, color) in results.into_iter().flatten() {
            self.image.pixels[index] = color;
        }
        log::info!("render finished in {:.2?}", start.elapsed());
    }

    /// The rendered image.
    pub fn result(&self) -> &ImageBuffer {
        &self.image
    }

    pub fn into_result(self) -> ImageBuffer {
        self.image
    }
}
