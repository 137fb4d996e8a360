use alloc::vec::Vec;

use crate::{
    point_id::{Arity, Dimensions},
    Axis, Error, Point3,
};

/// The kinds of host geometry whose points can be mirrored
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GeometryKind {
    Mesh,
    NurbsCurve,
    NurbsSurface,
    Lattice,
}

impl GeometryKind {
    /// Number of components in this kind's point identifiers
    pub fn arity(self) -> Arity {
        match self {
            Self::Mesh | Self::NurbsCurve => Arity::One,
            Self::NurbsSurface => Arity::Two,
            Self::Lattice => Arity::Three,
        }
    }
}

/// Points of one geometry, each tagged with its identifier in the geometry's native indexing
///
/// Identifiers are stored flat, `kind.arity()` entries per point.
#[derive(Debug, Clone)]
pub struct Geometry {
    kind: GeometryKind,
    points: Vec<Point3>,
    ids: Vec<u32>,
    dims: Dimensions,
}

impl Geometry {
    /// Polygon mesh vertices, identified by vertex index
    pub fn mesh(points: Vec<Point3>) -> Result<Self, Error> {
        Self::flat(GeometryKind::Mesh, points)
    }

    /// Curve control points, identified by control point index
    ///
    /// For periodic curves, pass only the unique control points (one per span).
    pub fn curve(points: Vec<Point3>) -> Result<Self, Error> {
        Self::flat(GeometryKind::NurbsCurve, points)
    }

    fn flat(kind: GeometryKind, points: Vec<Point3>) -> Result<Self, Error> {
        let count = point_count(points.len())?;
        Ok(Self {
            kind,
            points,
            ids: (0..count).collect(),
            dims: Dimensions::flat(count),
        })
    }

    /// Surface control points ordered with `v` varying fastest, identified by `(u, v)`
    pub fn surface(points: Vec<Point3>, u_count: u32, v_count: u32) -> Result<Self, Error> {
        let dims = Dimensions::grid(u_count, v_count);
        check_count(&dims, points.len())?;
        let mut ids = Vec::with_capacity(points.len() * 2);
        for u in 0..u_count {
            for v in 0..v_count {
                ids.extend([u, v]);
            }
        }
        Ok(Self {
            kind: GeometryKind::NurbsSurface,
            points,
            ids,
            dims,
        })
    }

    /// Lattice points ordered with `u` varying fastest, identified by `(s, t, u)`
    pub fn lattice(
        points: Vec<Point3>,
        s_count: u32,
        t_count: u32,
        u_count: u32,
    ) -> Result<Self, Error> {
        let dims = Dimensions::lattice(s_count, t_count, u_count);
        check_count(&dims, points.len())?;
        let mut ids = Vec::with_capacity(points.len() * 3);
        for s in 0..s_count {
            for t in 0..t_count {
                for u in 0..u_count {
                    ids.extend([s, t, u]);
                }
            }
        }
        Ok(Self {
            kind: GeometryKind::Lattice,
            points,
            ids,
            dims,
        })
    }

    /// Assemble a geometry from raw buffers supplied by the host
    ///
    /// `ids` must hold `kind.arity()` entries per point, and `dims` must set every dimension
    /// that identifiers of `kind` are linearized with.
    pub fn from_parts(
        kind: GeometryKind,
        points: Vec<Point3>,
        ids: Vec<u32>,
        dims: Dimensions,
    ) -> Result<Self, Error> {
        if let Some(found) = Arity::infer(ids.len(), points.len())? {
            let expected = kind.arity();
            if found != expected {
                return Err(Error::ArityMismatch {
                    kind,
                    expected,
                    found,
                });
            }
        }
        let required: &[Axis] = match kind {
            GeometryKind::Mesh | GeometryKind::NurbsCurve => &[],
            GeometryKind::NurbsSurface => &[Axis::X, Axis::Y],
            GeometryKind::Lattice => &[Axis::X, Axis::Y, Axis::Z],
        };
        for &axis in required {
            if dims.get(axis).is_none() {
                return Err(Error::MissingDimension { kind, axis });
            }
        }
        if !required.is_empty() {
            check_count(&dims, points.len())?;
            // Grid identifiers must lie inside the grid for linear offsets to be meaningful
            let bounds = required.iter().filter_map(|&axis| dims.get(axis));
            for (point, id) in ids.chunks_exact(required.len()).enumerate() {
                if id.iter().zip(bounds.clone()).any(|(&x, size)| x >= size) {
                    return Err(Error::IdOutOfRange { point });
                }
            }
        }
        Ok(Self {
            kind,
            points,
            ids,
            dims,
        })
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    pub fn into_points(self) -> Vec<Point3> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Number of points, if every one of them can carry a 32-bit identifier
fn point_count(len: usize) -> Result<u32, Error> {
    u32::try_from(len).map_err(|_| Error::TooManyPoints(len))
}

fn check_count(dims: &Dimensions, found: usize) -> Result<(), Error> {
    let expected = dims.count().unwrap_or(0);
    if expected != found as u64 {
        return Err(Error::DimensionMismatch { expected, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn mesh_ids() {
        let g = Geometry::mesh(vec![[0.0; 3]; 4]).unwrap();
        assert_eq!(g.ids(), &[0, 1, 2, 3]);
        assert_eq!(g.dims(), &Dimensions::flat(4));
        assert_eq!(g.kind().arity(), Arity::One);
    }

    #[test]
    fn flat_count_fits_ids() {
        assert_eq!(point_count(0), Ok(0));
        assert_eq!(point_count(u32::MAX as usize), Ok(u32::MAX));
        if let Some(len) = (u32::MAX as usize).checked_add(1) {
            assert_eq!(point_count(len), Err(Error::TooManyPoints(len)));
        }
    }

    #[test]
    fn surface_ids_row_major() {
        let g = Geometry::surface(vec![[0.0; 3]; 6], 2, 3).unwrap();
        assert_eq!(g.ids(), &[0, 0, 0, 1, 0, 2, 1, 0, 1, 1, 1, 2]);
    }

    #[test]
    fn lattice_ids() {
        let g = Geometry::lattice(vec![[0.0; 3]; 8], 2, 2, 2).unwrap();
        assert_eq!(&g.ids()[..9], &[0, 0, 0, 0, 0, 1, 0, 1, 0]);
        assert_eq!(&g.ids()[21..], &[1, 1, 1]);
    }

    #[test]
    fn wrong_grid_size() {
        assert_eq!(
            Geometry::surface(vec![[0.0; 3]; 5], 2, 3).unwrap_err(),
            Error::DimensionMismatch {
                expected: 6,
                found: 5
            }
        );
    }

    #[test]
    fn raw_parts_validation() {
        let points = vec![[0.0; 3]; 2];
        assert_eq!(
            Geometry::from_parts(
                GeometryKind::NurbsSurface,
                points.clone(),
                vec![0, 1],
                Dimensions::grid(1, 2)
            )
            .unwrap_err(),
            Error::ArityMismatch {
                kind: GeometryKind::NurbsSurface,
                expected: Arity::Two,
                found: Arity::One
            }
        );
        assert_eq!(
            Geometry::from_parts(
                GeometryKind::Lattice,
                points.clone(),
                vec![0, 0, 0, 0, 0, 1],
                Dimensions::grid(1, 1)
            )
            .unwrap_err(),
            Error::MissingDimension {
                kind: GeometryKind::Lattice,
                axis: Axis::Z
            }
        );
        assert_eq!(
            Geometry::from_parts(
                GeometryKind::Mesh,
                points.clone(),
                vec![0, 1, 2],
                Dimensions::flat(2)
            )
            .unwrap_err(),
            Error::IdArity { ids: 3, points: 2 }
        );
        assert_eq!(
            Geometry::from_parts(
                GeometryKind::NurbsSurface,
                points.clone(),
                vec![0, 0, 0, 2],
                Dimensions::grid(1, 2)
            )
            .unwrap_err(),
            Error::IdOutOfRange { point: 1 }
        );
        let g = Geometry::from_parts(
            GeometryKind::NurbsSurface,
            points,
            vec![0, 0, 0, 1],
            Dimensions::grid(1, 2),
        )
        .unwrap();
        assert_eq!(g.len(), 2);
    }
}
