//! Configuration errors.
//!
//! Light transport itself never fails; only settings coming from outside the
//! core are validated.

use thiserror::Error;

/// Errors that can occur while loading or validating render settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image resolution must be non-zero, got {width}x{height}")]
    ZeroResolution { width: u32, height: u32 },

    #[error("Samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("The {0} photon map stores photons but gathers zero neighbors")]
    ZeroNeighbors(&'static str),

    #[error("Emission cutoff must be in (0, 1], got {0}")]
    InvalidCutoff(f32),

    #[error("Photon maps are configured but the shot limit is zero")]
    ZeroShots,

    #[error("Cone filter constant must be at least 1, got {0}")]
    InvalidConeFilter(f32),

    #[error("Aperture must be non-negative with a positive focus distance, got aperture {0}")]
    InvalidAperture(f32),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
