use core::fmt;

use arrayvec::ArrayVec;

use crate::{Axis, Error};

/// Number of integer components in a [`PointId`]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Arity {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Arity {
    /// Infer the identifier shape shared by `points` points from a flat buffer of `ids` entries
    ///
    /// An empty point set accepts only an empty buffer and has no arity.
    pub fn infer(ids: usize, points: usize) -> Result<Option<Self>, Error> {
        if points == 0 {
            return match ids {
                0 => Ok(None),
                _ => Err(Error::IdArity { ids, points }),
            };
        }
        match ids.checked_div(points) {
            Some(1) if ids == points => Ok(Some(Self::One)),
            Some(2) if ids == points * 2 => Ok(Some(Self::Two)),
            Some(3) if ids == points * 3 => Ok(Some(Self::Three)),
            _ => Err(Error::IdArity { ids, points }),
        }
    }

    pub fn count(self) -> usize {
        self as usize
    }
}

/// Position of a point in its geometry's native indexing scheme
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PointId {
    #[default]
    Unset,
    /// Vertex or curve control point index
    Flat(u32),
    /// Surface control point, `(row, column)`
    Grid(u32, u32),
    /// Lattice point, `(s, t, u)`
    Lattice(u32, u32, u32),
}

impl PointId {
    /// Decode the identifier of the point at `index` from a flat buffer of `arity`-sized chunks
    pub(crate) fn decode(ids: &[u32], arity: Arity, index: usize) -> Self {
        let start = index * arity.count();
        match arity {
            Arity::One => Self::Flat(ids[start]),
            Arity::Two => Self::Grid(ids[start], ids[start + 1]),
            Arity::Three => Self::Lattice(ids[start], ids[start + 1], ids[start + 2]),
        }
    }

    pub fn arity(&self) -> Option<Arity> {
        match self {
            Self::Unset => None,
            Self::Flat(_) => Some(Arity::One),
            Self::Grid(..) => Some(Arity::Two),
            Self::Lattice(..) => Some(Arity::Three),
        }
    }

    /// Components in order, without allocating
    pub fn components(&self) -> ArrayVec<u32, 3> {
        let mut out = ArrayVec::new();
        match *self {
            Self::Unset => {}
            Self::Flat(x) => out.push(x),
            Self::Grid(x, y) => out.extend([x, y]),
            Self::Lattice(x, y, z) => out.extend([x, y, z]),
        }
        out
    }

    /// Flatten into a single offset using the strides of `dims`
    ///
    /// Surfaces linearize as `row * y + column`, lattices as `s * y * z + t * z + u`. Missing
    /// dimensions count as zero; [`Geometry`](crate::Geometry) guarantees they are present for
    /// grid identifiers.
    pub fn linearize(&self, dims: &Dimensions) -> Option<u64> {
        let y = u64::from(dims.y.unwrap_or(0));
        let z = u64::from(dims.z.unwrap_or(0));
        match *self {
            Self::Unset => None,
            Self::Flat(x) => Some(x.into()),
            Self::Grid(row, col) => Some(u64::from(row) * y + u64::from(col)),
            Self::Lattice(s, t, u) => {
                Some(u64::from(s) * y * z + u64::from(t) * z + u64::from(u))
            }
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "[]"),
            Self::Flat(x) => write!(f, "[{x}]"),
            Self::Grid(x, y) => write!(f, "[{x}][{y}]"),
            Self::Lattice(x, y, z) => write!(f, "[{x}][{y}][{z}]"),
        }
    }
}

/// Grid sizes of the geometry a tree was built from
///
/// Unused dimensions are `None`.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Dimensions {
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub z: Option<u32>,
}

impl Dimensions {
    pub fn flat(x: u32) -> Self {
        Self {
            x: Some(x),
            ..Self::default()
        }
    }

    pub fn grid(x: u32, y: u32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
        }
    }

    pub fn lattice(x: u32, y: u32, z: u32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    pub fn get(&self, axis: Axis) -> Option<u32> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Number of points covered by the set dimensions, if any are set
    pub fn count(&self) -> Option<u64> {
        [self.x, self.y, self.z]
            .into_iter()
            .flatten()
            .map(u64::from)
            .reduce(|a, b| a * b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_arity() {
        assert_eq!(Arity::infer(4, 4), Ok(Some(Arity::One)));
        assert_eq!(Arity::infer(8, 4), Ok(Some(Arity::Two)));
        assert_eq!(Arity::infer(12, 4), Ok(Some(Arity::Three)));
        assert_eq!(Arity::infer(0, 0), Ok(None));
    }

    #[test]
    fn reject_uneven_arity() {
        for ids in [0, 3, 5, 9, 16] {
            assert_eq!(
                Arity::infer(ids, 4),
                Err(Error::IdArity { ids, points: 4 }),
                "{ids} ids"
            );
        }
        assert_eq!(
            Arity::infer(2, 0),
            Err(Error::IdArity { ids: 2, points: 0 })
        );
    }

    #[test]
    fn decode_chunks() {
        let ids = [0, 1, 2, 3, 4, 5];
        assert_eq!(PointId::decode(&ids, Arity::One, 4), PointId::Flat(4));
        assert_eq!(PointId::decode(&ids, Arity::Two, 1), PointId::Grid(2, 3));
        assert_eq!(
            PointId::decode(&ids, Arity::Three, 1),
            PointId::Lattice(3, 4, 5)
        );
    }

    #[test]
    fn linearize_strides() {
        assert_eq!(PointId::Flat(7).linearize(&Dimensions::flat(10)), Some(7));
        // 4 rows of 3 columns
        let surface = Dimensions::grid(4, 3);
        assert_eq!(PointId::Grid(0, 2).linearize(&surface), Some(2));
        assert_eq!(PointId::Grid(2, 1).linearize(&surface), Some(7));
        // 2 x 3 x 4 lattice
        let lattice = Dimensions::lattice(2, 3, 4);
        assert_eq!(PointId::Lattice(1, 2, 3).linearize(&lattice), Some(23));
        assert_eq!(PointId::Lattice(0, 1, 0).linearize(&lattice), Some(4));
        assert_eq!(PointId::Unset.linearize(&lattice), None);
    }

    #[test]
    fn dimension_count() {
        assert_eq!(Dimensions::default().count(), None);
        assert_eq!(Dimensions::flat(5).count(), Some(5));
        assert_eq!(Dimensions::lattice(2, 3, 4).count(), Some(24));
    }

    #[test]
    fn components_follow_arity() {
        assert!(PointId::Unset.components().is_empty());
        assert_eq!(PointId::Grid(3, 9).components().as_slice(), &[3, 9]);
        assert_eq!(PointId::Lattice(1, 2, 3).arity(), Some(Arity::Three));
    }
}
