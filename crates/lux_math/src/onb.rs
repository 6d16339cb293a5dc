//! Orthonormal basis used to build sampling frames around a direction.

use crate::Vec3;

/// Right-handed orthonormal basis `(u, v, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onb {
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
}

impl Onb {
    /// Build a basis whose `w` axis is the given direction.
    ///
    /// `w` does not need to be normalized but must be non-zero.
    pub fn from_w(w: Vec3) -> Self {
        let w = w.normalize();
        let helper = if w.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
        let v = w.cross(helper).normalize();
        let u = v.cross(w);
        Self { u, v, w }
    }

    /// Build a basis from two (not necessarily orthogonal) edge vectors.
    ///
    /// `u` keeps the direction of `edge_u`, `w` is the normal of the plane
    /// spanned by the edges.
    pub fn from_edges(edge_u: Vec3, edge_v: Vec3) -> Self {
        let u = edge_u.normalize();
        let w = edge_u.cross(edge_v).normalize();
        let v = w.cross(u);
        Self { u, v, w }
    }

    /// Map local coordinates into world space.
    #[inline]
    pub fn local_to_world(&self, a: Vec3) -> Vec3 {
        a.x * self.u + a.y * self.v + a.z * self.w
    }

    /// Map a world-space vector into local coordinates.
    #[inline]
    pub fn world_to_local(&self, a: Vec3) -> Vec3 {
        Vec3::new(a.dot(self.u), a.dot(self.v), a.dot(self.w))
    }
}
