//! Photon maps.
//!
//! Photons are deposited by the [`PhotonEmitter`] into capped, lock-guarded
//! [`PhotonBuilder`]s, which are then frozen into balanced k-d trees
//! ([`PhotonIndex`]) and queried read-only during the gather pass.

mod emitter;
mod filter;
mod kdtree;

pub use emitter::PhotonEmitter;
pub use filter::Filter;
pub use kdtree::{Neighbors, PhotonBuilder, PhotonIndex};

use crate::Color;
use lux_math::Vec3;

/// A packet of light energy deposited at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photon {
    pub position: Vec3,
    /// Direction of travel when the photon arrived
    pub direction: Vec3,
    pub flux: Color,
}

impl Photon {
    pub fn new(position: Vec3, direction: Vec3, flux: Color) -> Self {
        Self {
            position,
            direction,
            flux,
        }
    }
}

/// The three photon maps gathered by the photon mapper.
#[derive(Debug, Default)]
pub struct PhotonMaps {
    /// Photons that reached a non-delta surface after at least one non-delta
    /// interaction
    pub global: PhotonIndex,
    /// Photons that reached a non-delta surface through delta events only
    pub caustic: PhotonIndex,
    /// Photons deposited at scattering points inside participating media
    pub volume: PhotonIndex,
}

impl PhotonMaps {
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.caustic.is_empty() && self.volume.is_empty()
    }
}
