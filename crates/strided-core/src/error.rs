// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor construction, views, and operations.

use crate::Shape;
use buffer_manager::AllocError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TensorError>;

/// Errors that can occur during tensor operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    /// The backing buffer could not be allocated.
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] AllocError),

    /// An operation's preconditions were violated.
    #[error("invalid argument to {op}: {detail}")]
    InvalidArgument { op: &'static str, detail: String },

    /// A requested shape contains a negative extent.
    #[error("negative extent {value} on axis {axis}")]
    NegativeDim { axis: usize, value: i64 },

    /// The supplied data length does not match the element count of the shape.
    #[error("shape mismatch: shape {shape} holds {expected} elements, got {actual}")]
    ShapeMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    /// Matrix multiply inner dimensions disagree.
    #[error("matmul inner dimension mismatch: {lhs} @ {rhs} ({lhs_k} vs {rhs_k})")]
    InputDimMismatch {
        lhs: Shape,
        rhs: Shape,
        lhs_k: usize,
        rhs_k: usize,
    },

    /// Two shapes cannot be unified under broadcasting rules.
    #[error("cannot broadcast {lhs} with {rhs}: axis {axis} has {lhs_dim} vs {rhs_dim}")]
    CannotBroadcast {
        lhs: Shape,
        rhs: Shape,
        axis: usize,
        lhs_dim: usize,
        rhs_dim: usize,
    },

    /// An expansion target is incompatible with the source shape.
    #[error("cannot expand {from} to {to}: axis {axis} has size {from_dim}, target {to_dim}")]
    CannotExpand {
        from: Shape,
        to: Shape,
        axis: usize,
        from_dim: usize,
        to_dim: usize,
    },

    /// An element index is out of range or has the wrong rank.
    #[error("index {index:?} out of bounds for shape {shape}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Shape },

    /// Configuration could not be read, parsed, or applied.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Fieldless classification of [`TensorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OutOfMemory,
    InvalidArgument,
    NegativeDim,
    ShapeMismatch,
    InputDimMismatch,
    CannotBroadcast,
    CannotExpand,
    IndexOutOfBounds,
    Config,
}

impl ErrorKind {
    /// Returns the stable identifier for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OutOfMemory => "out_of_memory",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NegativeDim => "negative_dim",
            ErrorKind::ShapeMismatch => "shape_mismatch",
            ErrorKind::InputDimMismatch => "input_dim_mismatch",
            ErrorKind::CannotBroadcast => "cannot_broadcast",
            ErrorKind::CannotExpand => "cannot_expand",
            ErrorKind::IndexOutOfBounds => "index_out_of_bounds",
            ErrorKind::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TensorError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TensorError::OutOfMemory(_) => ErrorKind::OutOfMemory,
            TensorError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            TensorError::NegativeDim { .. } => ErrorKind::NegativeDim,
            TensorError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            TensorError::InputDimMismatch { .. } => ErrorKind::InputDimMismatch,
            TensorError::CannotBroadcast { .. } => ErrorKind::CannotBroadcast,
            TensorError::CannotExpand { .. } => ErrorKind::CannotExpand,
            TensorError::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            TensorError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn invalid(op: &'static str, detail: impl Into<String>) -> Self {
        TensorError::InvalidArgument {
            op,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_lookup() {
        let err = TensorError::invalid("promote_to_column", "rank 2");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.kind().as_str(), "invalid_argument");

        let oom: TensorError = AllocError::HeapExhausted { requested_bytes: 8 }.into();
        assert_eq!(oom.kind(), ErrorKind::OutOfMemory);
        assert_eq!(oom.kind().to_string(), "out_of_memory");
    }

    #[test]
    fn test_display_includes_shapes() {
        let err = TensorError::CannotBroadcast {
            lhs: Shape::new(vec![3, 3]),
            rhs: Shape::new(vec![2, 3]),
            axis: 0,
            lhs_dim: 3,
            rhs_dim: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("[3, 3]"));
        assert!(msg.contains("[2, 3]"));
        assert!(msg.contains("3 vs 2"));
    }
}
