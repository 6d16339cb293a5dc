//! Render settings.
//!
//! Everything the core consumes from its driver: image size, sampling,
//! photon counts and gather sizes, emission cutoff, lens and filter.

use crate::{ConfigError, ConfigResult, Event, Filter, Medium};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Photon counts, gather sizes and emission termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotonSettings {
    /// Photons stored in the global (diffuse interreflection) map
    pub global: usize,
    /// Photons stored in the caustic (specular-only paths) map
    pub caustic: usize,
    /// Photons stored in the volume (participating media) map
    pub volume: usize,
    /// Neighbors gathered from the global map
    pub global_k: usize,
    pub caustic_k: usize,
    pub volume_k: usize,
    /// Emission stops once a photon's peak flux drops below this fraction of
    /// its starting value
    pub cutoff: f32,
    /// Upper bound on photons shot from the lights, for maps that are slow
    /// (or impossible) to fill
    pub max_shots: usize,
}

impl Default for PhotonSettings {
    fn default() -> Self {
        Self {
            global: 100_000,
            caustic: 50_000,
            volume: 0,
            global_k: 100,
            caustic_k: 50,
            volume_k: 50,
            cutoff: 0.1,
            max_shots: 1_000_000,
        }
    }
}

/// Settings for a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    /// Hard recursion ceiling; paths normally end by Russian roulette first
    pub max_depth: u32,
    /// Fixed seed for bit-identical renders; `None` seeds from entropy
    pub seed: Option<u64>,
    pub photons: PhotonSettings,
    /// Refract at every non-TIR dielectric interaction instead of splitting
    /// by the Fresnel term
    pub disable_fresnel: bool,
    /// Thin-lens radius, 0 for a pinhole
    pub aperture: f32,
    pub focus_distance: f32,
    pub filter: Filter,
    /// Worker threads, 0 for the rayon default
    pub threads: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            samples_per_pixel: 16,
            max_depth: 64,
            seed: None,
            photons: PhotonSettings::default(),
            disable_fresnel: false,
            aperture: 0.0,
            focus_distance: 1.0,
            filter: Filter::Uniform,
            threads: 0,
        }
    }
}

impl RenderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_photons(mut self, photons: PhotonSettings) -> Self {
        self.photons = photons;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_lens(mut self, aperture: f32, focus_distance: f32) -> Self {
        self.aperture = aperture;
        self.focus_distance = focus_distance;
        self
    }

    pub fn with_fresnel(mut self, enabled: bool) -> Self {
        self.disable_fresnel = !enabled;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Dielectric event between two media honoring `disable_fresnel`.
    pub fn transmission(&self, inside: Arc<Medium>, outside: Arc<Medium>, probability: f32) -> Event {
        Event::transmission(inside, outside, probability).with_fresnel(!self.disable_fresnel)
    }

    /// Check the settings for values the renderer cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::ZeroSamples);
        }

        let p = &self.photons;
        for (name, count, k) in [
            ("global", p.global, p.global_k),
            ("caustic", p.caustic, p.caustic_k),
            ("volume", p.volume, p.volume_k),
        ] {
            if count > 0 && k == 0 {
                return Err(ConfigError::ZeroNeighbors(name));
            }
        }
        if !(p.cutoff > 0.0 && p.cutoff <= 1.0) {
            return Err(ConfigError::InvalidCutoff(p.cutoff));
        }
        if p.max_shots == 0 && p.global + p.caustic + p.volume > 0 {
            return Err(ConfigError::ZeroShots);
        }

        if let Filter::Cone { k } = self.filter {
            if !(k >= 1.0) {
                return Err(ConfigError::InvalidConeFilter(k));
            }
        }
        if !(self.aperture.is_finite() && self.aperture >= 0.0 && self.focus_distance > 0.0) {
            return Err(ConfigError::InvalidAperture(self.aperture));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RenderSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_depth, 64);
        assert_eq!(settings.photons.cutoff, 0.1);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let settings = RenderSettings::from_json_str(
            r#"{ "width": 64, "height": 32, "seed": 7, "photons": { "caustic": 0 },
                 "filter": { "kind": "cone", "k": 1.5 } }"#,
        )
        .expect("valid settings");

        assert_eq!(settings.width, 64);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.photons.caustic, 0);
        assert_eq!(settings.photons.global, PhotonSettings::default().global);
        assert_eq!(settings.filter, Filter::Cone { k: 1.5 });
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let zero = RenderSettings::new().with_resolution(0, 10);
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::ZeroResolution { width: 0, height: 10 })
        ));
        assert!(matches!(
            RenderSettings::new().with_samples(0).validate(),
            Err(ConfigError::ZeroSamples)
        ));

        let mut no_k = RenderSettings::new();
        no_k.photons.caustic_k = 0;
        assert!(matches!(no_k.validate(), Err(ConfigError::ZeroNeighbors("caustic"))));
        no_k.photons.caustic = 0;
        assert!(no_k.validate().is_ok());

        let mut cutoff = RenderSettings::new();
        cutoff.photons.cutoff = 0.0;
        assert!(matches!(cutoff.validate(), Err(ConfigError::InvalidCutoff(_))));

        let mut no_shots = RenderSettings::new();
        no_shots.photons.max_shots = 0;
        assert!(matches!(no_shots.validate(), Err(ConfigError::ZeroShots)));

        let cone = RenderSettings::new().with_filter(Filter::Cone { k: 0.5 });
        assert!(matches!(cone.validate(), Err(ConfigError::InvalidConeFilter(_))));

        let lens = RenderSettings::new().with_lens(-1.0, 1.0);
        assert!(matches!(lens.validate(), Err(ConfigError::InvalidAperture(_))));
    }

    #[test]
    fn test_malformed_json_and_missing_file() {
        assert!(matches!(
            RenderSettings::from_json_str("{ width: }"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            RenderSettings::from_path("/nonexistent/lux/settings.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_transmission_honors_fresnel_switch() {
        let glass = Arc::new(Medium::new(1.5));
        let air = Arc::new(Medium::vacuum());
        let event = RenderSettings::new()
            .with_fresnel(false)
            .transmission(glass, air, 1.0);

        assert!(matches!(
            event.kind(),
            EventKind::Transmission { fresnel: false, .. }
        ));
    }
}
