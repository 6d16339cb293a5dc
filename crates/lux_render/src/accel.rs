//! Acceleration nodes.
//!
//! The scene is a tree of [`Node`]s over [`Primitive`]s. Bounded nodes carry an
//! axis-aligned box that is "peeked" (slab test only) before any of their
//! geometry is touched. A binary space node peeks both children, visits them
//! nearest first and skips the farther one when its box starts beyond an
//! already confirmed hit.

use crate::{Hit, Primitive, Ray};
use lux_math::{Aabb, Interval};

/// Counters collected while intersecting a ray with a node tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Nodes whose children or primitive were examined
    pub nodes_visited: usize,
    /// Full primitive intersection tests
    pub primitive_tests: usize,
}

/// Scene acceleration node.
#[derive(Debug, Clone)]
pub enum Node {
    /// A single primitive, with its bounds when it has any.
    Leaf {
        primitive: Primitive,
        bounds: Option<Aabb>,
    },
    /// Unordered children probed linearly. Without bounds the group always
    /// reports a hit on its box.
    Group {
        bounds: Option<Aabb>,
        children: Vec<Node>,
    },
    /// Binary space node; both children are bounded.
    Split {
        bounds: Aabb,
        children: Box<[Node; 2]>,
    },
}

impl Default for Node {
    fn default() -> Self {
        Node::Group {
            bounds: None,
            children: Vec::new(),
        }
    }
}

impl From<Primitive> for Node {
    fn from(primitive: Primitive) -> Self {
        Node::leaf(primitive)
    }
}

impl Node {
    pub fn leaf(primitive: Primitive) -> Self {
        let bounds = primitive.bounds();
        Node::Leaf { primitive, bounds }
    }

    /// Group bounded by its children, or unbounded if any child is.
    pub fn group(children: Vec<Node>) -> Self {
        let bounds = children
            .iter()
            .map(Node::bounds)
            .try_fold(Aabb::EMPTY, |acc, b| b.map(|b| Aabb::surrounding(&acc, &b)));
        Node::Group { bounds, children }
    }

    /// Group that skips its own bounding test (scene roots).
    pub fn unbounded_group(children: Vec<Node>) -> Self {
        Node::Group {
            bounds: None,
            children,
        }
    }

    /// Binary space node over two bounded children. If either child is
    /// unbounded the pair degrades to an unbounded group.
    pub fn split(left: Node, right: Node) -> Self {
        match (left.bounds(), right.bounds()) {
            (Some(a), Some(b)) => Node::Split {
                bounds: Aabb::surrounding(&a, &b),
                children: Box::new([left, right]),
            },
            _ => Node::unbounded_group(vec![left, right]),
        }
    }

    /// Build a tree over arbitrary primitives.
    ///
    /// Bounded primitives are organized into median-split binary space nodes
    /// along the longest centroid axis; unbounded ones (infinite planes, tiled
    /// UV planes) sit beside that tree in an unbounded root group.
    pub fn build_tree(primitives: Vec<Primitive>) -> Self {
        let (bounded, unbounded): (Vec<_>, Vec<_>) = primitives
            .into_iter()
            .map(|p| {
                let b = p.bounds();
                (p, b)
            })
            .partition(|(_, b)| b.is_some());

        let bounded: Vec<(Primitive, Aabb)> = bounded
            .into_iter()
            .filter_map(|(p, b)| b.map(|b| (p, b)))
            .collect();
        let tree = Self::build_split(bounded);

        if unbounded.is_empty() {
            if let Some(tree) = tree {
                return tree;
            }
        }
        let mut children: Vec<Node> = unbounded
            .into_iter()
            .map(|(primitive, bounds)| Node::Leaf { primitive, bounds })
            .collect();
        children.extend(tree);
        Node::unbounded_group(children)
    }

    fn build_split(mut items: Vec<(Primitive, Aabb)>) -> Option<Node> {
        match items.len() {
            0 => return None,
            1 => {
                let (primitive, bounds) = items.pop()?;
                return Some(Node::Leaf {
                    primitive,
                    bounds: Some(bounds),
                });
            }
            _ => {}
        }

        let bounds = items
            .iter()
            .fold(Aabb::EMPTY, |acc, (_, b)| Aabb::surrounding(&acc, b));
        let centroids = items.iter().fold(Aabb::EMPTY, |acc, (_, b)| {
            acc.include_point(b.centroid())
        });
        let axis = centroids.longest_axis();

        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |(_, a), (_, b)| {
            a.centroid()[axis].total_cmp(&b.centroid()[axis])
        });
        let right = items.split_off(mid);

        let left = Self::build_split(items)?;
        let right = Self::build_split(right)?;
        Some(Node::Split {
            bounds,
            children: Box::new([left, right]),
        })
    }

    pub fn bounds(&self) -> Option<Aabb> {
        match self {
            Node::Leaf { bounds, .. } | Node::Group { bounds, .. } => *bounds,
            Node::Split { bounds, .. } => Some(*bounds),
        }
    }

    /// Bounding-box-only test.
    ///
    /// Returns the distance at which the ray enters the box (0 when it starts
    /// inside), or `None` on a miss. Unbounded nodes always report 0.
    pub fn peek(&self, ray: &Ray) -> Option<f32> {
        match self.bounds() {
            None => Some(0.0),
            Some(b) => b
                .hit(
                    ray.origin(),
                    ray.inv_direction(),
                    Interval::new(0.0, f32::INFINITY),
                )
                .map(|(enter, _)| enter),
        }
    }

    /// Nearest hit in the subtree.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        self.intersect_with_stats(ray, &mut TraversalStats::default())
    }

    /// Nearest hit in the subtree, counting the work done.
    pub fn intersect_with_stats(&self, ray: &Ray, stats: &mut TraversalStats) -> Option<Hit<'_>> {
        self.peek(ray)?;
        self.traverse(ray, stats)
    }

    /// Intersect assuming this node's own box already passed.
    fn traverse(&self, ray: &Ray, stats: &mut TraversalStats) -> Option<Hit<'_>> {
        stats.nodes_visited += 1;
        match self {
            Node::Leaf { primitive, .. } => {
                stats.primitive_tests += 1;
                primitive.intersect(ray)
            }
            Node::Group { children, .. } => children
                .iter()
                .filter(|child| child.peek(ray).is_some())
                .filter_map(|child| child.traverse(ray, stats))
                .min_by(|a, b| a.distance.total_cmp(&b.distance)),
            Node::Split { children, .. } => {
                let [a, b] = &**children;
                match (a.peek(ray), b.peek(ray)) {
                    (None, None) => None,
                    (Some(_), None) => a.traverse(ray, stats),
                    (None, Some(_)) => b.traverse(ray, stats),
                    (Some(ta), Some(tb)) => {
                        let (near, far, far_peek) = if ta <= tb { (a, b, tb) } else { (b, a, ta) };
                        match near.traverse(ray, stats) {
                            Some(hit) if far_peek >= hit.distance => Some(hit),
                            near_hit => nearest(near_hit, far.traverse(ray, stats)),
                        }
                    }
                }
            }
        }
    }

    /// Brightest emission channel of any material in the subtree.
    pub fn max_emission(&self) -> f32 {
        match self {
            Node::Leaf { primitive, .. } => primitive.max_emission(),
            Node::Group { children, .. } => children
                .iter()
                .map(Node::max_emission)
                .fold(0.0, f32::max),
            Node::Split { children, .. } => children[0].max_emission().max(children[1].max_emission()),
        }
    }

    /// Number of primitives in the subtree.
    pub fn primitive_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Group { children, .. } => children.iter().map(Node::primitive_count).sum(),
            Node::Split { children, .. } => {
                children[0].primitive_count() + children[1].primitive_count()
            }
        }
    }
}

fn nearest<'a>(a: Option<Hit<'a>>, b: Option<Hit<'a>>) -> Option<Hit<'a>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.distance < a.distance { b } else { a }),
        (a, None) => a,
        (None, b) => b,
    }
}
