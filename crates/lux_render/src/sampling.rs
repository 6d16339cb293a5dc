//! Random number helpers and direction warps shared by events, the camera
//! and the photon emitter.

use lux_math::{Onb, Vec3};
use rand::{Rng, RngCore};
use std::f32::consts::PI;

/// Uniform random number in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Sample a random point in the unit square [-0.5, 0.5] x [-0.5, 0.5].
pub(crate) fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, 0.0)
}

/// Sample a random point in the unit disk.
pub(crate) fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniformly distributed direction on the unit sphere.
pub(crate) fn uniform_sphere(rng: &mut dyn RngCore) -> Vec3 {
    let z = 1.0 - 2.0 * gen_f32(rng);
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Cosine-weighted direction in the hemisphere around `normal`.
pub(crate) fn cosine_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let r1 = gen_f32(rng);
    let r2 = gen_f32(rng);
    let phi = 2.0 * PI * r1;
    let r = r2.sqrt();
    let local = Vec3::new(r * phi.cos(), r * phi.sin(), (1.0 - r2).max(0.0).sqrt());
    Onb::from_w(normal).local_to_world(local)
}

/// Direction around `axis` with inclination `acos(u^(1/(exponent+1)))`,
/// the importance distribution of a Phong lobe.
pub(crate) fn phong_lobe(axis: Vec3, exponent: f32, rng: &mut dyn RngCore) -> Vec3 {
    let cos_theta = gen_f32(rng).powf(1.0 / (exponent + 1.0));
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
    Onb::from_w(axis).local_to_world(local)
}

/// Exponentially distributed free-flight distance in a medium with the given
/// scattering coefficient.
pub(crate) fn free_flight(scattering: f32, rng: &mut dyn RngCore) -> f32 {
    // 1 - u is in (0, 1], keeping ln finite
    -(1.0 - gen_f32(rng)).ln() / scattering
}

/// Reflect a vector about a normal.
#[inline]
pub(crate) fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Unpolarized Fresnel reflectance for a dielectric interface.
///
/// `cos_i` and `cos_t` are the cosines of the incident and transmitted angles.
pub(crate) fn fresnel_dielectric(cos_i: f32, cos_t: f32, n1: f32, n2: f32) -> f32 {
    let r_parallel = (n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t);
    let r_perpendicular = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
    (0.5 * (r_parallel * r_parallel + r_perpendicular * r_perpendicular)).clamp(0.0, 1.0)
}
