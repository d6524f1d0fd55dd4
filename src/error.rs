use thiserror::Error;

use crate::graph::NodeId;

/// Failures raised by array arithmetic, node construction and gradient queries.
///
/// Nothing in the crate catches or rewrites these: they surface unchanged to the
/// caller of the operation that triggered them.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Operand shapes are incompatible for the requested operation.
    #[error("shape mismatch in {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },
    /// The operation needs a 2-dimensional operand.
    #[error("{op} requires a matrix, got shape {shape:?}")]
    NotMatrix { op: &'static str, shape: Vec<usize> },
    /// Checked element access outside the array.
    #[error("index {index:?} is out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },
    /// Slice range that is empty, reversed or past the end of its axis.
    #[error("range {start}..{end} is invalid for axis {axis} of length {len}")]
    InvalidRange {
        axis: usize,
        start: usize,
        end: usize,
        len: usize,
    },
    /// Axis argument past the last axis.
    #[error("axis {axis} is out of range for a {ndim}-dimensional array")]
    InvalidAxis { axis: usize, ndim: usize },
    /// Reduction that has no defined value on an empty array.
    #[error("{op} of an empty array")]
    EmptyReduction { op: &'static str },
    /// The gradient query never reached the requested ancestor.
    #[error("node {0} is not an ancestor of the sink")]
    TargetNotFound(NodeId),
    /// A binary operation mixed nodes allocated by different graphs.
    #[error("{op} mixes nodes from different graphs")]
    GraphMismatch { op: &'static str },
    /// A model was called with the wrong number of input nodes.
    #[error("{op} expects {expected} input(s), got {got}")]
    Arity {
        op: &'static str,
        expected: usize,
        got: usize,
    },
}

impl Error {
    /// True for the shape-mismatch family (`ShapeMismatch`, `NotMatrix`).
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Error::ShapeMismatch { .. } | Error::NotMatrix { .. })
    }

    pub(crate) fn shape_mismatch(op: &'static str, lhs: &[usize], rhs: &[usize]) -> Self {
        Error::ShapeMismatch {
            op,
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
