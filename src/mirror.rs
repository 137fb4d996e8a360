use alloc::vec::Vec;

use arrayvec::ArrayVec;
use log::{debug, trace, warn};

use crate::{
    point_id::{Arity, Dimensions},
    Axis, Error, Geometry, GeometryKind, KdTree, Point3, PointId,
};

/// Default maximum distance between a point and its match
pub const DEFAULT_THRESHOLD: f64 = 0.001;

/// Output component for a position search against a tree with no points
pub const MISSING: i64 = -1;

/// Output component for a point whose nearest match lies beyond the threshold
pub const TOO_FAR: i64 = -2;

/// What to search for, as requested by the caller
///
/// Exactly one of `mirror_axis` and `position` must be set.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Find every point's reflection across this axis
    pub mirror_axis: Option<Axis>,
    /// Find the point nearest to this position
    pub position: Option<Point3>,
    /// Pivot of the mirror plane when `world_space` is set
    pub mirror_position: Point3,
    pub threshold: f64,
    /// Reflect about `mirror_position` rather than the origin
    pub world_space: bool,
    pub policy: MatchPolicy,
}

impl SearchOptions {
    pub fn mirror(axis: Axis) -> Self {
        Self {
            mirror_axis: Some(axis),
            ..Self::default()
        }
    }

    pub fn position(position: Point3) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn with_threshold(self, threshold: f64) -> Self {
        Self { threshold, ..self }
    }

    /// Reflect in world space about a plane through `pivot`
    pub fn with_pivot(self, pivot: Point3) -> Self {
        Self {
            mirror_position: pivot,
            world_space: true,
            ..self
        }
    }

    pub fn with_policy(self, policy: MatchPolicy) -> Self {
        Self { policy, ..self }
    }

    /// Check the options for consistency and determine which search they select
    pub fn mode(&self) -> Result<SearchMode, Error> {
        check_threshold(self.threshold)?;
        match (self.mirror_axis, self.position) {
            (Some(_), Some(_)) => Err(Error::ConflictingModes),
            (None, None) => Err(Error::NoMode),
            (Some(axis), None) => Ok(SearchMode::Mirror(axis)),
            (None, Some(position)) => Ok(SearchMode::Position(position)),
        }
    }

    /// Reflection selected by these options for mirroring across `axis`
    pub fn reflection(&self, axis: Axis) -> Reflection {
        if self.world_space {
            Reflection::about(axis, self.mirror_position)
        } else {
            Reflection::object(axis)
        }
    }
}

fn check_threshold(threshold: f64) -> Result<(), Error> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(Error::InvalidThreshold(threshold));
    }
    Ok(())
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mirror_axis: None,
            position: None,
            mirror_position: [0.0; 3],
            threshold: DEFAULT_THRESHOLD,
            world_space: false,
            policy: MatchPolicy::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SearchMode {
    Position(Point3),
    Mirror(Axis),
}

/// How mirror search treats several points matching the same partner
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum MatchPolicy {
    /// Every point keeps its nearest match, even if another point shares it
    #[default]
    Permissive,
    /// A partner is kept only by the point that lies closest to it, ties going to the lowest
    /// point index; other claimants are reported as [`TOO_FAR`]
    Bijective,
}

/// Reflection across an axis-aligned plane
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Reflection {
    axis: Axis,
    /// Point on the plane; `None` for the plane through the origin
    pivot: Option<Point3>,
}

impl Reflection {
    /// Negate `axis` in place
    pub fn object(axis: Axis) -> Self {
        Self { axis, pivot: None }
    }

    /// Reflect across the plane normal to `axis` that passes through `pivot`
    pub fn about(axis: Axis, pivot: Point3) -> Self {
        Self {
            axis,
            pivot: Some(pivot),
        }
    }

    pub fn reflect(&self, point: &Point3) -> Point3 {
        let i = self.axis.index();
        let mut out = *point;
        match self.pivot {
            Some(pivot) => out[i] = pivot[i] - (point[i] - pivot[i]),
            None => out[i] = -point[i],
        }
        out
    }
}

/// Outcome of a position search
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PositionMatch {
    Found(PointId),
    /// The index holds no points
    Missing,
    /// The nearest point is beyond the threshold
    TooFar,
}

impl PositionMatch {
    /// Integer form handed back to the host: the identifier's components, or the
    /// [`MISSING`]/[`TOO_FAR`] sentinel repeated `arity` times
    pub fn encode(&self, arity: Arity) -> ArrayVec<i64, 3> {
        let sentinel = match *self {
            Self::Found(id) => return id.components().into_iter().map(i64::from).collect(),
            Self::Missing => MISSING,
            Self::TooFar => TOO_FAR,
        };
        (0..arity.count()).map(|_| sentinel).collect()
    }
}

/// Nearest-point and mirror-partner lookups over the points of one geometry
#[derive(Debug, Clone)]
pub struct MirrorIndex {
    kind: GeometryKind,
    dims: Dimensions,
    points: Vec<Point3>,
    tree: KdTree,
}

impl MirrorIndex {
    /// Index the points of `geometry`
    pub fn new(geometry: Geometry) -> Result<Self, Error> {
        if geometry.is_empty() {
            return Err(Error::NoPoints);
        }
        let tree = KdTree::from_points(geometry.points(), geometry.ids())?;
        let kind = geometry.kind();
        let dims = *geometry.dims();
        let points = geometry.into_points();
        Ok(Self {
            kind,
            dims,
            points,
            tree,
        })
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    /// Find the point nearest to `position`, if it lies within `threshold`
    ///
    /// Fails if `threshold` is negative or NaN.
    pub fn find_position(
        &self,
        position: &Point3,
        threshold: f64,
    ) -> Result<PositionMatch, Error> {
        check_threshold(threshold)?;
        Ok(match self.tree.nearest_with_distance(position) {
            None => PositionMatch::Missing,
            Some((_, dist_sq)) if libm::sqrt(dist_sq) > threshold => PositionMatch::TooFar,
            Some((node, _)) => PositionMatch::Found(node.id()),
        })
    }

    /// For every point, in order, find the linear offset of the point lying at its reflection
    ///
    /// Points with no match within `threshold` get [`TOO_FAR`]. Fails if `threshold` is
    /// negative or NaN.
    pub fn mirror_search(
        &self,
        reflection: &Reflection,
        threshold: f64,
        policy: MatchPolicy,
    ) -> Result<Vec<i64>, Error> {
        check_threshold(threshold)?;
        let matches = self
            .points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let mirrored = reflection.reflect(point);
                let found = self
                    .tree
                    .nearest_index(&mirrored)
                    .filter(|&(_, dist_sq)| libm::sqrt(dist_sq) <= threshold);
                if found.is_none() {
                    trace!("no mirror partner for point {i} within {threshold}");
                }
                found
            })
            .collect::<Vec<_>>();

        let winners = match policy {
            MatchPolicy::Permissive => None,
            MatchPolicy::Bijective => Some(self.closest_claims(&matches)),
        };

        let mut rejected = 0;
        let out = matches
            .iter()
            .enumerate()
            .map(|(i, found)| {
                let Some((node, _)) = *found else {
                    rejected += 1;
                    return TOO_FAR;
                };
                if winners.as_ref().is_some_and(|w| w[node] != Some(i)) {
                    rejected += 1;
                    return TOO_FAR;
                }
                self.linear_offset(&self.tree.node(node).id())
            })
            .collect::<Vec<_>>();

        debug!(
            "mirrored {} points across {:?}: {} matched, {} rejected",
            out.len(),
            reflection.axis,
            out.len() - rejected,
            rejected
        );
        Ok(out)
    }

    /// For each tree node, the point whose match to it is closest
    fn closest_claims(&self, matches: &[Option<(usize, f64)>]) -> Vec<Option<usize>> {
        let mut best = Vec::<Option<(usize, f64)>>::new();
        best.resize(self.tree.len(), None);
        let mut contested = 0;
        for (i, found) in matches.iter().enumerate() {
            let Some((node, dist_sq)) = *found else {
                continue;
            };
            match best[node] {
                Some((_, current)) => {
                    contested += 1;
                    if dist_sq < current {
                        best[node] = Some((i, dist_sq));
                    }
                }
                None => best[node] = Some((i, dist_sq)),
            }
        }
        if contested > 0 {
            warn!("{contested} points lost a shared mirror partner to a closer point");
        }
        best.into_iter().map(|claim| claim.map(|(i, _)| i)).collect()
    }

    fn linear_offset(&self, id: &PointId) -> i64 {
        match id.linearize(&self.dims) {
            // Flat ids are u32; grid ids lie inside a grid holding exactly the point count
            Some(offset) => offset as i64,
            None => unreachable!("tree nodes always carry an identifier"),
        }
    }

    /// Run the search selected by `options`, producing the host's integer layout
    ///
    /// Position searches yield one identifier (or sentinel) of the geometry's arity; mirror
    /// searches yield one linear offset per point.
    pub fn run(&self, options: &SearchOptions) -> Result<Vec<i64>, Error> {
        match options.mode()? {
            SearchMode::Position(position) => Ok(self
                .find_position(&position, options.threshold)?
                .encode(self.kind.arity())
                .to_vec()),
            SearchMode::Mirror(axis) => {
                if options.world_space && self.kind == GeometryKind::Lattice {
                    warn!("lattice points are in object space; reflecting them about a world pivot");
                }
                let reflection = options.reflection(axis);
                self.mirror_search(&reflection, options.threshold, options.policy)
            }
        }
    }
}

/// Validate `options`, index `geometry` and run the selected search
pub fn search(geometry: Geometry, options: &SearchOptions) -> Result<Vec<i64>, Error> {
    options.mode()?;
    MirrorIndex::new(geometry)?.run(options)
}
