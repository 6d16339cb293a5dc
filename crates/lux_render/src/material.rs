//! Materials: discrete distributions over interaction events.

use crate::sampling::gen_f32;
use crate::{Event, Hit, Ray};
use lux_math::Vec3;
use rand::RngCore;
use std::sync::Arc;

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// An event as listed by one material, with the selection probability that
/// material assigned to it.
#[derive(Debug, Clone)]
pub struct EventEntry {
    event: Arc<Event>,
    probability: f32,
    cumulative: f32,
}

impl EventEntry {
    #[inline]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Probability of this entry being selected.
    #[inline]
    pub fn probability(&self) -> f32 {
        self.probability
    }

    /// Running sum of probabilities up to and including this entry.
    #[inline]
    pub fn cumulative(&self) -> f32 {
        self.cumulative
    }

    #[inline]
    pub fn is_delta(&self) -> bool {
        self.event.is_delta()
    }

    pub fn sample_next_ray(&self, ray: &Ray, hit: &Hit, rng: &mut dyn RngCore) -> Option<Ray> {
        self.event.sample_next_ray(ray, hit, rng)
    }

    pub fn apply_monte_carlo(&self, radiance: Color, hit: &Hit, wi: Vec3, wo: Vec3) -> Color {
        self.event
            .apply_monte_carlo(self.probability, radiance, hit, wi, wo)
    }

    pub fn apply_next_event(&self, irradiance: Color, hit: &Hit, wi: Vec3, wo: Vec3) -> Color {
        self.event.apply_next_event(irradiance, hit, wi, wo)
    }
}

/// A surface material.
///
/// Non-emissive materials hold an ordered event table whose cumulative
/// probabilities never exceed 1; the remaining mass is absorption. Lights
/// carry a fixed emission and no events.
#[derive(Debug, Clone, Default)]
pub struct Material {
    entries: Vec<EventEntry>,
    emission: Option<Color>,
}

impl Material {
    /// Create a material with no events (absorbs everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an emissive material.
    pub fn light(emission: Color) -> Self {
        Self {
            entries: Vec::new(),
            emission: Some(emission),
        }
    }

    /// Builder form of [`Material::add`].
    pub fn with_event(mut self, event: Arc<Event>) -> Self {
        self.add(event);
        self
    }

    /// Append an event with its own probability.
    ///
    /// If the total probability would exceed 1, every entry is rescaled
    /// proportionally so the table still sums to 1.
    pub fn add(&mut self, event: Arc<Event>) {
        if self.is_light() {
            log::warn!("ignoring event added to an emissive material");
            return;
        }

        let probability = event.probability();
        let cumulative = self.total_probability() + probability;
        self.entries.push(EventEntry {
            event,
            probability,
            cumulative,
        });

        if cumulative > 1.0 {
            log::warn!(
                "material event probabilities sum to {cumulative:.4}; rescaling {} events",
                self.entries.len()
            );
            let scale = 1.0 / cumulative;
            let mut running = 0.0;
            for entry in &mut self.entries {
                entry.probability *= scale;
                running += entry.probability;
                entry.cumulative = running.min(1.0);
            }
        }
    }

    /// Sum of all event probabilities (the non-absorbing mass).
    pub fn total_probability(&self) -> f32 {
        self.entries.last().map_or(0.0, |e| e.cumulative)
    }

    pub fn entries(&self) -> &[EventEntry] {
        &self.entries
    }

    #[inline]
    pub fn is_light(&self) -> bool {
        self.emission.is_some()
    }

    /// Emitted radiance; black for non-emissive materials.
    #[inline]
    pub fn emission(&self) -> Color {
        self.emission.unwrap_or(Color::ZERO)
    }

    /// True when at least one event can be evaluated for direct light or
    /// photon density (i.e. is not a delta event).
    pub fn has_non_delta(&self) -> bool {
        self.entries.iter().any(|e| !e.is_delta())
    }

    /// Russian-roulette choice of one event, `None` meaning absorption.
    pub fn select_event(&self, rng: &mut dyn RngCore) -> Option<&EventEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let u = gen_f32(rng);
        self.entries.iter().find(|e| e.cumulative > u)
    }

    /// Deterministic next-event evaluation over every non-delta event.
    ///
    /// Each term is weighted by its selection probability and divided by it
    /// again, so the sum matches the expectation of the one-event estimator.
    pub fn evaluate(&self, irradiance: Color, hit: &Hit, wi: Vec3, wo: Vec3) -> Color {
        self.entries
            .iter()
            .filter(|e| !e.is_delta())
            .map(|e| e.probability * (e.apply_next_event(irradiance, hit, wi, wo) / e.probability))
            .fold(Color::ZERO, |acc, c| acc + c)
    }
}
