use alloc::vec::Vec;

use arrayvec::ArrayVec;
use log::debug;

use crate::{point_id::Arity, squared_distance, Error, Point3, PointId};

/// A 3-dimensional k-d tree over a fixed point set, answering exact nearest-neighbor queries
///
/// Nodes live in a flat arena and refer to each other by index. A tree is populated once by
/// [`build`](Self::build) and is read-only afterwards, so it may be shared between threads for
/// concurrent queries.
#[derive(Debug, Default, Clone)]
pub struct KdTree {
    nodes: Vec<Node>,
    arity: Option<Arity>,
}

impl KdTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree over `points`, the `i`th of which is identified by the `i`th chunk of `ids`
    ///
    /// The chunk size is inferred from `ids.len() / points.len()` and must be 1, 2 or 3. Any
    /// previously built contents are discarded. An empty `points` yields an empty tree.
    pub fn build(&mut self, points: &[Point3], ids: &[u32]) -> Result<(), Error> {
        let arity = Arity::infer(ids.len(), points.len())?;
        self.nodes.clear();
        self.arity = arity;
        let Some(arity) = arity else {
            return Ok(());
        };

        let mut pairs = points
            .iter()
            .enumerate()
            .map(|(i, &point)| (point, PointId::decode(ids, arity, i)))
            .collect::<Vec<_>>();
        self.nodes.reserve_exact(pairs.len());
        split(&mut self.nodes, &mut pairs, 0, None);
        debug!(
            "built k-d tree over {} points ({:?} identifiers, depth {})",
            self.nodes.len(),
            arity,
            self.depth()
        );
        Ok(())
    }

    /// Build a new tree; see [`build`](Self::build)
    pub fn from_points(points: &[Point3], ids: &[u32]) -> Result<Self, Error> {
        let mut tree = Self::new();
        tree.build(points, ids)?;
        Ok(tree)
    }

    pub fn is_built(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Shape of the identifiers stored in the tree, if it holds any points
    pub fn arity(&self) -> Option<Arity> {
        self.arity
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Number of levels in the tree
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|node| node.depth + 1).max().unwrap_or(0)
    }

    pub(crate) fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn parent(&self, node: &Node) -> Option<&Node> {
        node.parent.map(|i| &self.nodes[i])
    }

    pub fn left(&self, node: &Node) -> Option<&Node> {
        node.left.map(|i| &self.nodes[i])
    }

    pub fn right(&self, node: &Node) -> Option<&Node> {
        node.right.map(|i| &self.nodes[i])
    }

    /// Find the stored point closest to `query`, or `None` if the tree is empty
    ///
    /// When several points are exactly equidistant, the first one encountered by the search wins.
    pub fn nearest(&self, query: &Point3) -> Option<&Node> {
        self.nearest_index(query).map(|(i, _)| &self.nodes[i])
    }

    /// Find the stored point closest to `query` along with its squared distance to `query`
    pub fn nearest_with_distance(&self, query: &Point3) -> Option<(&Node, f64)> {
        self.nearest_index(query)
            .map(|(i, dist_sq)| (&self.nodes[i], dist_sq))
    }

    /// Arena index and squared distance of the nearest node
    pub(crate) fn nearest_index(&self, query: &Point3) -> Option<(usize, f64)> {
        if self.nodes.is_empty() {
            return None;
        }

        let leaf = self.descend(0, query);
        let mut best = Best {
            index: leaf,
            dist_sq: squared_distance(&self.nodes[leaf].point, query),
        };
        if best.dist_sq == 0.0 {
            return Some((best.index, 0.0));
        }

        // Descent can stop at a root whose only child lies across its plane
        if self.nodes[leaf].parent.is_none() {
            self.search_subtree(leaf, query, &mut best);
        }

        // Walk back up, re-searching each ancestor's subtree from the ancestor down
        let mut current = leaf;
        while let Some(parent) = self.nodes[current].parent {
            self.search_subtree(parent, query, &mut best);
            current = parent;
        }

        Some((best.index, best.dist_sq))
    }

    /// Follow splitting planes from `start` down to the node `query` would be inserted under
    fn descend(&self, start: usize, query: &Point3) -> usize {
        let mut current = start;
        loop {
            let node = &self.nodes[current];
            let next = if node.plane_offset(query) <= 0.0 {
                node.left
            } else {
                node.right
            };
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Search the subtree at `start` depth first, left before right
    ///
    /// Both children of a node are searched when its splitting plane is closer than `best`;
    /// otherwise only the child on `query`'s side is.
    fn search_subtree(&self, start: usize, query: &Point3, best: &mut Best) {
        // Each step pops one node and pushes at most two, so the stack never outgrows the
        // tree's height plus one.
        let mut stack = ArrayVec::<usize, { MAX_DEPTH + 1 }>::new();
        stack.push(start);
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            best.offer(index, squared_distance(&node.point, query));
            let d = node.plane_offset(query);
            if d * d < best.dist_sq {
                // Pushed in reverse so the left subtree is searched first
                stack.extend(node.right);
                stack.extend(node.left);
            } else if d <= 0.0 {
                stack.extend(node.left);
            } else {
                stack.extend(node.right);
            }
        }
    }
}

/// Recursively turn `pairs` into a subtree at `depth`, returning the index of its root
fn split(
    nodes: &mut Vec<Node>,
    pairs: &mut [(Point3, PointId)],
    depth: u32,
    parent: Option<usize>,
) -> Option<usize> {
    if pairs.is_empty() {
        return None;
    }

    let axis = depth as usize % 3;
    // Stable, so equal coordinates keep their input order
    pairs.sort_by(|a, b| a.0[axis].total_cmp(&b.0[axis]));
    let half = pairs.len() / 2;
    let (point, id) = pairs[half];

    let index = nodes.len();
    nodes.push(Node {
        point,
        id,
        depth,
        parent,
        left: None,
        right: None,
    });
    let (below, rest) = pairs.split_at_mut(half);
    let left = split(nodes, below, depth + 1, Some(index));
    let right = split(nodes, &mut rest[1..], depth + 1, Some(index));
    nodes[index].left = left;
    nodes[index].right = right;
    Some(index)
}

/// A point stored in a [`KdTree`]
#[derive(Debug, Clone)]
pub struct Node {
    point: Point3,
    id: PointId,
    /// Distance from the root
    depth: u32,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

impl Node {
    pub fn point(&self) -> &Point3 {
        &self.point
    }

    pub fn id(&self) -> PointId {
        self.id
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Coordinate index of this node's splitting plane
    pub fn axis(&self) -> usize {
        self.depth as usize % 3
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Signed distance from this node's splitting plane to `query`
    fn plane_offset(&self, query: &Point3) -> f64 {
        let axis = self.axis();
        query[axis] - self.point[axis]
    }
}

struct Best {
    index: usize,
    dist_sq: f64,
}

impl Best {
    fn offer(&mut self, index: usize, dist_sq: f64) {
        if dist_sq < self.dist_sq {
            self.index = index;
            self.dist_sq = dist_sq;
        }
    }
}

/// A median-split tree over as many points as fit in memory can be at most this deep.
const MAX_DEPTH: usize = usize::BITS as usize;
