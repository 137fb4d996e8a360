//! Mirror-partner lookup for the points of 3D geometry
//!
//! A [`KdTree`] indexes a geometry's points for exact nearest-neighbor search. [`MirrorIndex`]
//! uses it to find, for every point, the point lying at its reflection across an axis-aligned
//! plane, or to find the point nearest to an arbitrary position.
//!
//! ```
//! use mirror_tree::{search, Axis, Geometry, SearchOptions};
//!
//! let points = vec![[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
//! let partners = search(Geometry::mesh(points)?, &SearchOptions::mirror(Axis::X))?;
//! assert_eq!(partners, [1, 0, 2]);
//! # Ok::<(), mirror_tree::Error>(())
//! ```
#![no_std]

extern crate alloc;

mod error;
mod geometry;
mod kd_tree;
mod mirror;
mod point_id;

pub use error::Error;
pub use geometry::{Geometry, GeometryKind};
pub use kd_tree::{KdTree, Node};
pub use mirror::{
    search, MatchPolicy, MirrorIndex, PositionMatch, Reflection, SearchMode, SearchOptions,
    DEFAULT_THRESHOLD, MISSING, TOO_FAR,
};
pub use point_id::{Arity, Dimensions, PointId};

/// A position in 3D space
pub type Point3 = [f64; 3];

/// A coordinate axis
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Index of this axis' coordinate in a [`Point3`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for Axis {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            2 => Ok(Self::Z),
            _ => Err(Error::InvalidAxis(value)),
        }
    }
}

fn squared_distance(a: &Point3, b: &Point3) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_from_index() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            assert_eq!(Axis::try_from(axis.index() as u32), Ok(axis));
        }
        assert_eq!(Axis::try_from(3), Err(Error::InvalidAxis(3)));
    }

    #[test]
    fn distance() {
        assert_eq!(squared_distance(&[1.0, 2.0, 3.0], &[0.0, 4.0, 3.0]), 5.0);
    }
}
