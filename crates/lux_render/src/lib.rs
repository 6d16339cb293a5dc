//! lux light-transport core.
//!
//! Estimates the radiance reaching each pixel of a virtual film by sampling
//! light paths through a scene of primitives, materials and point lights.
//!
//! Two integrators are provided:
//! - [`PathTracer`]: recursive unidirectional Monte Carlo with next-event
//!   estimation against point lights.
//! - [`PhotonMapper`]: two-pass photon mapping; a [`PhotonEmitter`] first fills
//!   the global, caustic and volume [`PhotonIndex`] maps, then camera paths
//!   gather density estimates from them.
//!
//! Pixel dispatch is handled by [`Renderer`], which hands out pixel indices to
//! worker threads through a shared atomic counter.

mod accel;
mod camera;
mod config;
mod error;
mod event;
mod hit;
mod integrator;
mod material;
mod photon;
mod primitive;
mod ray;
mod renderer;
mod sampling;
mod scene;

pub use accel::{Node, TraversalStats};
pub use camera::Camera;
pub use config::{PhotonSettings, RenderSettings};
pub use error::{ConfigError, ConfigResult};
pub use event::{Aperture, Event, EventKind};
pub use hit::Hit;
pub use integrator::{Integrator, PathTracer, PhotonMapper};
pub use material::{Color, EventEntry, Material};
pub use photon::{
    Filter, Neighbors, Photon, PhotonBuilder, PhotonEmitter, PhotonIndex, PhotonMaps,
};
pub use primitive::{MaterialGrid, Mesh, Plane, Primitive, Sphere, Triangle, UvPlane};
pub use ray::{Medium, Ray};
pub use renderer::{color_to_rgba, linear_to_gamma, ImageBuffer, Renderer};
pub use sampling::gen_f32;
pub use scene::{PointLight, Scene};

/// Re-export Vec3 and common math types from lux_math
pub use lux_math::{Aabb, Interval, Vec2, Vec3};

/// Minimum accepted hit distance along a ray.
pub const EPSILON: f32 = 1e-5;
