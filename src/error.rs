use thiserror::Error;

use crate::{geometry::GeometryKind, point_id::Arity, Axis};

/// Reasons a search can be rejected before any tree is built or queried
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("both a mirror axis and a search position were given, remove one")]
    ConflictingModes,
    #[error("neither a mirror axis nor a search position was given, specify one")]
    NoMode,
    #[error("no points to work on")]
    NoPoints,
    #[error("{0} points cannot be indexed with 32-bit identifiers")]
    TooManyPoints(usize),
    /// The identifier buffer is not 1, 2 or 3 entries per point
    #[error("{ids} identifier components cannot be split evenly across {points} points")]
    IdArity { ids: usize, points: usize },
    #[error("{kind:?} identifiers have {expected:?} components, found {found:?}")]
    ArityMismatch {
        kind: GeometryKind,
        expected: Arity,
        found: Arity,
    },
    #[error("{kind:?} requires a dimension along {axis:?}")]
    MissingDimension { kind: GeometryKind, axis: Axis },
    #[error("identifier of point {point} lies outside the grid")]
    IdOutOfRange { point: usize },
    #[error("grid dimensions describe {expected} points, found {found}")]
    DimensionMismatch { expected: u64, found: usize },
    #[error("bad mirror axis {0}, expected 0 (x), 1 (y) or 2 (z)")]
    InvalidAxis(u32),
    #[error("threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),
}
