// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod onb;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
