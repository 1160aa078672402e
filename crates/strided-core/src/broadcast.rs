// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! NumPy-style broadcasting.
//!
//! Shapes are aligned from the right; missing leading axes count as size 1.
//! Per axis, equal sizes pass through, a size-1 side is stretched (stride 0),
//! and anything else is an error. Operands are never modified: unification
//! produces fresh [`TensorView`]s over the operands' buffers.

use crate::{Result, Shape, TensorError, TensorView};

/// Two operands re-laid onto a common shape.
#[derive(Debug, Clone)]
pub struct Broadcast<'a> {
    pub shape: Shape,
    pub lhs: TensorView<'a>,
    pub rhs: TensorView<'a>,
}

/// Two matmul operands whose batch axes have been unified. `lhs` ends in its
/// own `[M, K]` and `rhs` in its own `[K, N]`.
#[derive(Debug, Clone)]
pub struct BatchBroadcast<'a> {
    pub batch: Shape,
    pub lhs: TensorView<'a>,
    pub rhs: TensorView<'a>,
}

struct Unified {
    dims: Vec<usize>,
    lhs_strides: Vec<usize>,
    rhs_strides: Vec<usize>,
}

/// Per-axis unification of two equal-rank axis lists. On failure returns the
/// offending axis.
fn unify(
    lhs_dims: &[usize],
    lhs_strides: &[usize],
    rhs_dims: &[usize],
    rhs_strides: &[usize],
) -> std::result::Result<Unified, usize> {
    debug_assert_eq!(lhs_dims.len(), rhs_dims.len());
    let rank = lhs_dims.len();
    let mut unified = Unified {
        dims: Vec::with_capacity(rank),
        lhs_strides: Vec::with_capacity(rank),
        rhs_strides: Vec::with_capacity(rank),
    };

    for axis in 0..rank {
        let (ld, rd) = (lhs_dims[axis], rhs_dims[axis]);
        let (dim, ls, rs) = if ld == rd {
            (ld, lhs_strides[axis], rhs_strides[axis])
        } else if ld == 1 {
            (rd, 0, rhs_strides[axis])
        } else if rd == 1 {
            (ld, lhs_strides[axis], 0)
        } else {
            return Err(axis);
        };
        unified.dims.push(dim);
        unified.lhs_strides.push(ls);
        unified.rhs_strides.push(rs);
    }
    Ok(unified)
}

fn cannot_broadcast(lhs: &Shape, rhs: &Shape, rank: usize, axis: usize) -> TensorError {
    TensorError::CannotBroadcast {
        lhs: lhs.clone(),
        rhs: rhs.clone(),
        axis,
        lhs_dim: aligned_dim(lhs, rank, axis),
        rhs_dim: aligned_dim(rhs, rank, axis),
    }
}

/// Size of `axis` once `shape` is right-aligned to `rank`.
fn aligned_dim(shape: &Shape, rank: usize, axis: usize) -> usize {
    let pad = rank - shape.rank();
    if axis < pad {
        1
    } else {
        shape.dims()[axis - pad]
    }
}

/// Computes the broadcast shape of `lhs` and `rhs`.
///
/// # Examples
/// ```
/// use strided_core::{broadcast_shape, Shape};
/// let s = broadcast_shape(&Shape::new(vec![3, 1]), &Shape::new(vec![2, 1, 4])).unwrap();
/// assert_eq!(s.dims(), &[2, 3, 4]);
/// ```
///
/// # Errors
/// Returns [`TensorError::CannotBroadcast`] if an aligned axis pair is
/// neither equal nor contains a 1.
pub fn broadcast_shape(lhs: &Shape, rhs: &Shape) -> Result<Shape> {
    let rank = lhs.rank().max(rhs.rank());
    let mut dims = vec![0usize; rank];
    for (axis, dim) in dims.iter_mut().enumerate() {
        let ld = aligned_dim(lhs, rank, axis);
        let rd = aligned_dim(rhs, rank, axis);
        *dim = if ld == rd || rd == 1 {
            ld
        } else if ld == 1 {
            rd
        } else {
            return Err(cannot_broadcast(lhs, rhs, rank, axis));
        };
    }
    Ok(Shape::new(dims))
}

/// Unifies two operands for an elementwise operation.
///
/// Both are right-aligned to the larger rank, then every axis is unified.
/// The returned views share the operands' buffers.
///
/// # Errors
/// Returns [`TensorError::CannotBroadcast`] if the shapes are incompatible.
pub fn broadcast_pair<'a>(lhs: &TensorView<'a>, rhs: &TensorView<'a>) -> Result<Broadcast<'a>> {
    let rank = lhs.rank().max(rhs.rank());
    let a = lhs.align_rank(rank);
    let b = rhs.align_rank(rank);

    let unified = unify(a.shape().dims(), a.strides(), b.shape().dims(), b.strides())
        .map_err(|axis| cannot_broadcast(lhs.shape(), rhs.shape(), rank, axis))?;

    let shape = Shape::new(unified.dims);
    let lhs_layout = crate::Layout::new(shape.clone(), unified.lhs_strides)?;
    let rhs_layout = crate::Layout::new(shape.clone(), unified.rhs_strides)?;

    Ok(Broadcast {
        shape,
        lhs: a.with_layout(lhs_layout),
        rhs: b.with_layout(rhs_layout),
    })
}

/// Unifies the batch axes (all but the trailing two) of two matmul operands.
///
/// Both operands must already have the same rank, at least 2. The trailing
/// matrix axes are carried through untouched.
///
/// # Errors
/// - [`TensorError::InvalidArgument`] if the ranks differ or are below 2.
/// - [`TensorError::CannotBroadcast`] if the batch shapes are incompatible.
pub fn broadcast_batch<'a>(
    lhs: &TensorView<'a>,
    rhs: &TensorView<'a>,
) -> Result<BatchBroadcast<'a>> {
    let rank = lhs.rank();
    if rank < 2 || rhs.rank() != rank {
        return Err(TensorError::invalid(
            "broadcast_batch",
            format!(
                "operands must share a rank of at least 2, got {} and {}",
                lhs.shape(),
                rhs.shape()
            ),
        ));
    }
    let tail = rank - 2;

    let unified = unify(
        &lhs.shape().dims()[..tail],
        &lhs.strides()[..tail],
        &rhs.shape().dims()[..tail],
        &rhs.strides()[..tail],
    )
    .map_err(|axis| cannot_broadcast(lhs.shape(), rhs.shape(), rank, axis))?;

    let lhs_layout = lhs.layout().with_batch(&unified.dims, &unified.lhs_strides);
    let rhs_layout = rhs.layout().with_batch(&unified.dims, &unified.rhs_strides);

    Ok(BatchBroadcast {
        batch: Shape::new(unified.dims),
        lhs: lhs.with_layout(lhs_layout),
        rhs: rhs.with_layout(rhs_layout),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tensor;

    #[test]
    fn test_broadcast_shape_rules() {
        let s = |d: &[usize]| Shape::new(d.to_vec());
        assert_eq!(broadcast_shape(&s(&[3, 4]), &s(&[4])).unwrap(), s(&[3, 4]));
        assert_eq!(broadcast_shape(&s(&[2, 1]), &s(&[1, 3])).unwrap(), s(&[2, 3]));
        assert_eq!(
            broadcast_shape(&s(&[5, 3, 1]), &s(&[3, 4])).unwrap(),
            s(&[5, 3, 4])
        );
        assert_eq!(broadcast_shape(&s(&[1]), &s(&[0])).unwrap(), s(&[0]));
        assert!(broadcast_shape(&s(&[3]), &s(&[4])).is_err());
    }

    #[test]
    fn test_broadcast_shape_error_axis() {
        let err = broadcast_shape(&Shape::new(vec![3, 3]), &Shape::new(vec![2, 3])).unwrap_err();
        assert_eq!(
            err,
            TensorError::CannotBroadcast {
                lhs: Shape::new(vec![3, 3]),
                rhs: Shape::new(vec![2, 3]),
                axis: 0,
                lhs_dim: 3,
                rhs_dim: 2,
            }
        );
    }

    #[test]
    fn test_broadcast_pair_strides() {
        let a = Tensor::from_data(&[10.0, 20.0, 30.0], [3, 1]).unwrap();
        let b = Tensor::zeros([2, 1, 4]).unwrap();
        let bc = broadcast_pair(&a.view(), &b.view()).unwrap();

        assert_eq!(bc.shape.dims(), &[2, 3, 4]);
        assert_eq!(bc.lhs.strides(), &[0, 1, 0]);
        // [2, 1, 4] contiguous strides are [4, 4, 1]; axis 1 is stretched.
        assert_eq!(bc.rhs.strides(), &[4, 0, 1]);
        assert_eq!(bc.lhs.buffer_ptr(), a.buffer_ptr());
        assert_eq!(bc.rhs.buffer_ptr(), b.buffer_ptr());
    }

    #[test]
    fn test_trailing_axis_mismatch_is_rejected() {
        let a = Tensor::from_data(&[10.0, 20.0, 30.0], [3]).unwrap();
        let b = Tensor::zeros([2, 1, 4]).unwrap();
        let err = broadcast_pair(&a.view(), &b.view()).unwrap_err();
        assert!(matches!(
            err,
            TensorError::CannotBroadcast { axis: 2, lhs_dim: 3, rhs_dim: 4, .. }
        ));
    }

    #[test]
    fn test_broadcast_pair_leaves_operands_untouched() {
        let a = Tensor::zeros([1, 3]).unwrap();
        let b = Tensor::zeros([4, 1]).unwrap();
        let av = a.view();
        let bv = b.view();
        let bc = broadcast_pair(&av, &bv).unwrap();
        assert_eq!(bc.shape.dims(), &[4, 3]);
        assert_eq!(av.strides(), &[3, 1]);
        assert_eq!(bv.strides(), &[1, 1]);
    }

    #[test]
    fn test_broadcast_pair_incompatible() {
        let a = Tensor::fill(2.0, [3, 3]).unwrap();
        let b = Tensor::ones([2, 3]).unwrap();
        let err = broadcast_pair(&a.view(), &b.view()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CannotBroadcast);
    }

    #[test]
    fn test_broadcast_batch_keeps_matrix_axes() {
        let a = Tensor::zeros([4, 2, 3]).unwrap();
        let b = Tensor::zeros([3, 5]).unwrap();
        let bv = b.view().align_rank(3);
        let bb = broadcast_batch(&a.view(), &bv).unwrap();

        assert_eq!(bb.batch.dims(), &[4]);
        assert_eq!(bb.lhs.shape().dims(), &[4, 2, 3]);
        assert_eq!(bb.rhs.shape().dims(), &[4, 3, 5]);
        assert_eq!(bb.lhs.strides(), &[6, 3, 1]);
        assert_eq!(bb.rhs.strides(), &[0, 5, 1]);
    }

    #[test]
    fn test_broadcast_batch_mismatch() {
        let a = Tensor::zeros([3, 2, 2]).unwrap();
        let b = Tensor::zeros([2, 2, 2]).unwrap();
        let err = broadcast_batch(&a.view(), &b.view()).unwrap_err();
        assert!(matches!(
            err,
            TensorError::CannotBroadcast { axis: 0, lhs_dim: 3, rhs_dim: 2, .. }
        ));
    }

    #[test]
    fn test_broadcast_batch_requires_equal_rank() {
        let a = Tensor::zeros([2, 2, 2]).unwrap();
        let b = Tensor::zeros([2, 2]).unwrap();
        let err = broadcast_batch(&a.view(), &b.view()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }
}
