//! Balanced k-d tree over photons.

use super::{Filter, Photon};
use crate::Color;
use lux_math::{Aabb, Vec3};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, PoisonError};

/// Capped, concurrently appendable photon buffer.
///
/// Inserts beyond the capacity are dropped. Building consumes the builder, so
/// the lock is never needed once the tree exists.
#[derive(Debug)]
pub struct PhotonBuilder {
    capacity: usize,
    photons: Mutex<Vec<Photon>>,
    full_logged: AtomicBool,
}

impl PhotonBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            photons: Mutex::new(Vec::new()),
            full_logged: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a photon. Returns `false` if it was dropped because the
    /// builder is full.
    pub fn push(&self, photon: Photon) -> bool {
        let mut photons = self.photons.lock().unwrap_or_else(PoisonError::into_inner);
        if photons.len() >= self.capacity {
            drop(photons);
            if !self.full_logged.swap(true, AtomicOrdering::Relaxed) {
                log::debug!("photon builder reached capacity {}", self.capacity);
            }
            return false;
        }
        photons.push(photon);
        true
    }

    pub fn len(&self) -> usize {
        self.photons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Freeze the photons into a k-d tree.
    ///
    /// Photons are put in a canonical order first, so the tree does not
    /// depend on the order concurrent emitters happened to insert them.
    pub fn build(self) -> PhotonIndex {
        self.build_scaled(1.0)
    }

    /// Freeze the photons, multiplying every flux by `scale` (the emitter's
    /// one-over-shots normalization).
    pub fn build_scaled(self, scale: f32) -> PhotonIndex {
        let mut photons = self
            .photons
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        for photon in &mut photons {
            photon.flux *= scale;
        }
        photons.sort_unstable_by(canonical_order);
        PhotonIndex::from_photons(photons)
    }
}

fn canonical_order(a: &Photon, b: &Photon) -> Ordering {
    let key = |p: &Photon| {
        [
            p.position.x,
            p.position.y,
            p.position.z,
            p.direction.x,
            p.direction.y,
            p.direction.z,
            p.flux.x,
            p.flux.y,
            p.flux.z,
        ]
    };
    key(a)
        .iter()
        .zip(key(b).iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[derive(Debug)]
struct KdNode {
    photon: Photon,
    axis: usize,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

/// Immutable k-d tree answering k-nearest-neighbor queries.
#[derive(Debug, Default)]
pub struct PhotonIndex {
    root: Option<Box<KdNode>>,
    len: usize,
}

/// Result of a nearest-neighbor query.
#[derive(Debug, Clone)]
pub struct Neighbors<'a> {
    /// Photons with their distance to the query point, nearest first
    pub photons: Vec<(&'a Photon, f32)>,
    /// Distance to the farthest accepted photon
    pub radius: f32,
}

impl Neighbors<'_> {
    pub fn len(&self) -> usize {
        self.photons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photons.is_empty()
    }
}

struct Candidate<'a> {
    dist2: f32,
    photon: &'a Photon,
}

impl PartialEq for Candidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.dist2.total_cmp(&other.dist2).is_eq()
    }
}

impl Eq for Candidate<'_> {}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist2.total_cmp(&other.dist2)
    }
}

impl PhotonIndex {
    /// Build a balanced tree by recursive median splits along the longest
    /// axis of each subset.
    pub fn from_photons(mut photons: Vec<Photon>) -> Self {
        let len = photons.len();
        Self {
            root: Self::build_node(&mut photons),
            len,
        }
    }

    fn build_node(photons: &mut [Photon]) -> Option<Box<KdNode>> {
        if photons.is_empty() {
            return None;
        }

        let bounds = photons
            .iter()
            .fold(Aabb::EMPTY, |acc, p| acc.include_point(p.position));
        let axis = bounds.longest_axis();

        let mid = photons.len() / 2;
        photons.select_nth_unstable_by(mid, |a, b| {
            a.position[axis].total_cmp(&b.position[axis])
        });
        let photon = photons[mid];
        let (lower, upper) = photons.split_at_mut(mid);

        Some(Box::new(KdNode {
            photon,
            axis,
            left: Self::build_node(lower),
            right: Self::build_node(&mut upper[1..]),
        }))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The `k` photons nearest to `point` (fewer if the tree holds fewer).
    pub fn search_nn(&self, point: Vec3, k: usize) -> Neighbors<'_> {
        let mut heap = BinaryHeap::with_capacity(k.min(self.len) + 1);
        if k > 0 {
            if let Some(root) = &self.root {
                Self::search(root, point, k, &mut heap);
            }
        }

        let photons: Vec<(&Photon, f32)> = heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.photon, c.dist2.sqrt()))
            .collect();
        let radius = photons.last().map_or(0.0, |(_, d)| *d);
        Neighbors { photons, radius }
    }

    fn search<'a>(node: &'a KdNode, point: Vec3, k: usize, heap: &mut BinaryHeap<Candidate<'a>>) {
        let dist2 = node.photon.position.distance_squared(point);
        if heap.len() < k {
            heap.push(Candidate {
                dist2,
                photon: &node.photon,
            });
        } else if heap.peek().is_some_and(|worst| dist2 < worst.dist2) {
            heap.pop();
            heap.push(Candidate {
                dist2,
                photon: &node.photon,
            });
        }

        let delta = point[node.axis] - node.photon.position[node.axis];
        let (near, far) = if delta < 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };

        if let Some(near) = near {
            Self::search(near, point, k, heap);
        }
        if let Some(far) = far {
            let worst2 = if heap.len() < k {
                f32::INFINITY
            } else {
                heap.peek().map_or(f32::INFINITY, |c| c.dist2)
            };
            if delta * delta <= worst2 {
                Self::search(far, point, k, heap);
            }
        }
    }

    /// Filtered flux density around `point`.
    ///
    /// `contribution` maps each gathered photon to the radiance it carries
    /// towards the viewer; the sum is divided by the filter-normalized disc
    /// area. Empty maps and degenerate (zero-radius) gathers contribute
    /// nothing.
    pub fn estimate<F>(&self, point: Vec3, k: usize, filter: &Filter, contribution: F) -> Color
    where
        F: Fn(&Photon) -> Color,
    {
        let neighbors = self.search_nn(point, k);
        if neighbors.is_empty() || neighbors.radius <= 0.0 {
            return Color::ZERO;
        }
        let r = neighbors.radius;
        let sum = neighbors
            .photons
            .iter()
            .fold(Color::ZERO, |acc, (photon, d)| {
                acc + contribution(*photon) * filter.weight(*d, r)
            });
        sum / (filter.k_term() * std::f32::consts::PI * r * r)
    }
}
