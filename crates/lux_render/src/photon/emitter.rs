//! Forward photon emission from point lights.

use super::{Photon, PhotonBuilder, PhotonMaps};
use crate::renderer::run_with_threads;
use crate::sampling::{free_flight, gen_f32, uniform_sphere};
use crate::{Color, Medium, PhotonSettings, PointLight, Ray, RenderSettings, Scene};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Photons traced per parallel work item.
const CHUNK_SIZE: usize = 256;

/// Work items per worker thread traced between checks for full maps.
const CHUNKS_PER_THREAD: usize = 4;

const GLOBAL: usize = 0;
const CAUSTIC: usize = 1;
const VOLUME: usize = 2;

/// A light that can be picked for a shot.
#[derive(Debug, Clone, Copy)]
struct LightChoice {
    light: PointLight,
    /// Running sum of pick probabilities up to this light
    cumulative: f32,
    /// Emission divided by the pick probability, before the per-map
    /// one-over-shots normalization
    flux: Color,
}

/// Photons deposited by one work item, in shot order.
#[derive(Debug, Default)]
struct ChunkPhotons {
    maps: [Vec<Photon>; 3],
    /// `ends[shot][map]` is the length of `maps[map]` after that shot
    ends: Vec<[usize; 3]>,
}

/// Capped builders for the three maps, fed in shot order.
///
/// Each map counts the shots emitted until it filled up; its photons are
/// normalized by that count when the maps are built.
struct MapBuilders {
    builders: [PhotonBuilder; 3],
    shots: [usize; 3],
    full: [bool; 3],
}

impl MapBuilders {
    fn new(photons: &PhotonSettings) -> Self {
        let builders = [
            PhotonBuilder::new(photons.global),
            PhotonBuilder::new(photons.caustic),
            PhotonBuilder::new(photons.volume),
        ];
        let full = [
            builders[GLOBAL].is_full(),
            builders[CAUSTIC].is_full(),
            builders[VOLUME].is_full(),
        ];
        Self {
            builders,
            shots: [0; 3],
            full,
        }
    }

    fn all_full(&self) -> bool {
        self.full.iter().all(|full| *full)
    }

    /// Append a work item's photons shot by shot.
    fn merge(&mut self, chunk: &ChunkPhotons) {
        let mut start = [0usize; 3];
        for end in &chunk.ends {
            for map in 0..3 {
                if !self.full[map] {
                    for photon in &chunk.maps[map][start[map]..end[map]] {
                        if !self.builders[map].push(*photon) {
                            break;
                        }
                    }
                    self.shots[map] += 1;
                    self.full[map] = self.builders[map].is_full();
                }
                start[map] = end[map];
            }
        }
    }

    fn build(self) -> PhotonMaps {
        let scale = |shots: usize| if shots > 0 { 1.0 / shots as f32 } else { 1.0 };
        let [global, caustic, volume] = self.builders;
        PhotonMaps {
            global: global.build_scaled(scale(self.shots[GLOBAL])),
            caustic: caustic.build_scaled(scale(self.shots[CAUSTIC])),
            volume: volume.build_scaled(scale(self.shots[VOLUME])),
        }
    }
}

/// Fills the photon maps by tracing photons forward from the point lights.
///
/// Must run to completion before the photon mapper gathers.
#[derive(Debug, Clone)]
pub struct PhotonEmitter {
    photons: PhotonSettings,
    max_depth: u32,
    seed: Option<u64>,
    threads: usize,
}

impl PhotonEmitter {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            photons: settings.photons.clone(),
            max_depth: settings.max_depth,
            seed: settings.seed,
            threads: settings.threads,
        }
    }

    /// Emit photons from every point light of `scene`, starting in `medium`.
    ///
    /// Each shot picks a light with probability proportional to its peak
    /// emission. Shots continue until every map is full or the shot limit is
    /// reached. Work items are traced in parallel but merged in shot order,
    /// so a fixed seed gives the same maps for any thread count. Each map's
    /// flux is divided by the number of shots it took to fill it.
    pub fn emit_point_lights(&self, scene: &Scene, medium: &Arc<Medium>) -> PhotonMaps {
        let mut builders = MapBuilders::new(&self.photons);
        let lights = Self::light_choices(scene.lights());
        let max_shots = self.photons.max_shots;

        if lights.is_empty() || builders.all_full() || max_shots == 0 {
            log::info!("no photons to emit");
            return PhotonMaps::default();
        }

        let start = Instant::now();
        log::info!("emitting up to {max_shots} photons from {} lights", lights.len());
        let base_seed = self.seed.unwrap_or_else(rand::random);

        let traced = run_with_threads(self.threads, || {
            let batch = rayon::current_num_threads().max(1) * CHUNKS_PER_THREAD;
            let mut traced = 0usize;
            let mut next_chunk = 0u64;

            while traced < max_shots && !builders.all_full() {
                let work: Vec<(u64, usize)> = (0..batch)
                    .map_while(|i| {
                        let first = traced + i * CHUNK_SIZE;
                        (first < max_shots)
                            .then(|| (next_chunk + i as u64, CHUNK_SIZE.min(max_shots - first)))
                    })
                    .collect();

                let results: Vec<ChunkPhotons> = work
                    .par_iter()
                    .map(|&(chunk, count)| {
                        let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(chunk));
                        self.trace_chunk(scene, medium, &lights, count, &mut rng)
                    })
                    .collect();

                for result in &results {
                    if builders.all_full() {
                        break;
                    }
                    builders.merge(result);
                }
                traced += work.iter().map(|&(_, count)| count).sum::<usize>();
                next_chunk += work.len() as u64;
            }
            traced
        });

        let shots = builders.shots;
        let maps = builders.build();
        log::info!(
            "photon emission done in {:.2?} after {traced} shots: {} global ({} shots), {} caustic ({} shots), {} volume ({} shots)",
            start.elapsed(),
            maps.global.len(),
            shots[GLOBAL],
            maps.caustic.len(),
            shots[CAUSTIC],
            maps.volume.len(),
            shots[VOLUME]
        );
        maps
    }

    /// Lights with positive emission and their pick probabilities.
    fn light_choices(lights: &[PointLight]) -> Vec<LightChoice> {
        let power: f32 = lights.iter().map(|l| l.emission.max_element().max(0.0)).sum();
        if power <= 0.0 {
            return Vec::new();
        }
        let mut cumulative = 0.0;
        lights
            .iter()
            .filter(|l| l.emission.max_element() > 0.0)
            .map(|&light| {
                let probability = light.emission.max_element() / power;
                cumulative += probability;
                LightChoice {
                    light,
                    cumulative,
                    flux: light.emission / probability,
                }
            })
            .collect()
    }

    fn pick_light<'a>(lights: &'a [LightChoice], rng: &mut dyn RngCore) -> Option<&'a LightChoice> {
        let u = gen_f32(rng);
        lights
            .iter()
            .find(|choice| u < choice.cumulative)
            .or_else(|| lights.last())
    }

    fn trace_chunk(
        &self,
        scene: &Scene,
        medium: &Arc<Medium>,
        lights: &[LightChoice],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> ChunkPhotons {
        let mut out = ChunkPhotons::default();
        out.ends.reserve(count);
        for _ in 0..count {
            if let Some(choice) = Self::pick_light(lights, rng) {
                self.trace_photon(scene, medium, choice, &mut out, rng);
            }
            out.ends
                .push([out.maps[GLOBAL].len(), out.maps[CAUSTIC].len(), out.maps[VOLUME].len()]);
        }
        out
    }

    /// Follow one photon until it escapes, reaches a light, is absorbed or
    /// drops below the flux cutoff.
    fn trace_photon(
        &self,
        scene: &Scene,
        medium: &Arc<Medium>,
        choice: &LightChoice,
        out: &mut ChunkPhotons,
        rng: &mut dyn RngCore,
    ) {
        let threshold = self.photons.cutoff * choice.flux.max_element();
        let mut flux = choice.flux;
        let mut ray = Ray::new(choice.light.position, uniform_sphere(rng), medium.clone());
        let mut only_delta = true;
        let mut bounces = 0u32;

        while bounces < self.max_depth {
            let hit = scene.intersection(&ray);

            let current = ray.medium();
            if current.is_scattering() {
                let flight = free_flight(current.scattering, rng);
                if hit.as_ref().map_or(true, |h| flight < h.distance) {
                    let point = ray.at(flight);
                    out.maps[VOLUME].push(Photon::new(point, ray.direction(), flux));
                    flux *= current.albedo;
                    if flux.max_element() < threshold {
                        return;
                    }
                    ray = ray.scattered(point, uniform_sphere(rng));
                    only_delta = false;
                    bounces += 1;
                    continue;
                }
            }

            let Some(hit) = hit else {
                return;
            };
            if hit.material.is_light() {
                return;
            }

            // the first surface hit is covered by direct lighting
            if bounces > 0 && hit.material.has_non_delta() {
                let photon = Photon::new(hit.point, ray.direction(), flux);
                let map = if only_delta { CAUSTIC } else { GLOBAL };
                out.maps[map].push(photon);
            }

            let Some(entry) = hit.material.select_event(rng) else {
                return;
            };
            let Some(next) = entry.sample_next_ray(&ray, &hit, rng) else {
                return;
            };
            flux = entry.apply_monte_carlo(flux, &hit, next.direction(), -ray.direction());
            if !entry.is_delta() {
                only_delta = false;
            }
            if flux.max_element() < threshold {
                return;
            }
            ray = next;
            bounces += 1;
        }
    }
}
