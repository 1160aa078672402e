// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shape + stride metadata mapping logical indices onto a flat buffer.
//!
//! A [`Layout`] is what distinguishes a view from its source: views share the
//! buffer but carry their own layout. All view-producing transformations
//! (right-alignment, expansion, column promotion) are pure functions from one
//! layout to another and never touch element data.
//!
//! Strides are in elements. A stride of 0 marks a broadcast axis: every index
//! along it reads the same element.

use crate::{compute_strides, Result, Shape, TensorError};
use std::fmt;

/// Describes how a tensor's logical shape maps onto flat storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
}

impl Layout {
    /// Creates a contiguous row-major layout for `shape`.
    pub fn contiguous(shape: Shape) -> Self {
        let strides = compute_strides(shape.dims());
        Self { shape, strides }
    }

    /// Creates a layout with explicit strides.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidArgument`] if `strides` and `shape`
    /// disagree in rank.
    pub fn new(shape: Shape, strides: Vec<usize>) -> Result<Self> {
        if strides.len() != shape.rank() {
            return Err(TensorError::invalid(
                "layout",
                format!(
                    "{} strides supplied for rank-{} shape {shape}",
                    strides.len(),
                    shape.rank()
                ),
            ));
        }
        Ok(Self { shape, strides })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Logical element count, `product(shape)`.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns `true` if the strides equal the row-major strides of the shape.
    pub fn is_contiguous(&self) -> bool {
        self.strides == compute_strides(self.shape.dims())
    }

    /// Minimum buffer length this layout can address without going out of
    /// bounds, or `None` if the furthest offset overflows `usize`.
    pub fn required_len(&self) -> Option<usize> {
        if self.dims().contains(&0) {
            return Some(0);
        }
        self.dims()
            .iter()
            .zip(&self.strides)
            .try_fold(1usize, |len, (&d, &s)| (d - 1).checked_mul(s)?.checked_add(len))
    }

    /// Buffer offset of a multi-index: `Σ index[i] * strides[i]`.
    ///
    /// # Errors
    /// Returns [`TensorError::IndexOutOfBounds`] if `index` has the wrong rank
    /// or any coordinate is past its axis.
    pub fn offset_of(&self, index: &[usize]) -> Result<usize> {
        let in_bounds = index.len() == self.rank()
            && index.iter().zip(self.dims()).all(|(&i, &d)| i < d);
        let offset = if in_bounds {
            index
                .iter()
                .zip(&self.strides)
                .try_fold(0usize, |acc, (&i, &s)| i.checked_mul(s)?.checked_add(acc))
        } else {
            None
        };
        offset.ok_or_else(|| TensorError::IndexOutOfBounds {
            index: index.to_vec(),
            shape: self.shape.clone(),
        })
    }

    /// Pads the layout with leading size-1, stride-0 axes up to `rank`.
    /// Layouts already at or above `rank` are returned unchanged.
    pub fn align_rank(&self, rank: usize) -> Layout {
        let diff = rank.saturating_sub(self.rank());
        if diff == 0 {
            return self.clone();
        }
        let mut dims = vec![1; diff];
        dims.extend_from_slice(self.dims());
        let mut strides = vec![0; diff];
        strides.extend_from_slice(&self.strides);
        Layout {
            shape: Shape::new(dims),
            strides,
        }
    }

    /// Expands this layout to `target`.
    ///
    /// The first `target.rank() - self.rank()` axes are new leading axes with
    /// stride 0 and the target's sizes. Each remaining axis, aligned from the
    /// right, keeps its stride if the sizes match, or is stretched to stride 0
    /// if the source size is 1.
    ///
    /// # Errors
    /// - [`TensorError::InvalidArgument`] if `target` has lower rank.
    /// - [`TensorError::CannotExpand`] if an axis is neither equal nor 1.
    pub fn expand(&self, target: &Shape) -> Result<Layout> {
        let rank = self.rank();
        if target.rank() < rank {
            return Err(TensorError::invalid(
                "expand",
                format!("cannot expand rank-{rank} {} to rank-{} {target}", self.shape, target.rank()),
            ));
        }
        let diff = target.rank() - rank;
        let mut strides = vec![0usize; target.rank()];

        for (i, (&from_dim, &stride)) in self.dims().iter().zip(&self.strides).enumerate() {
            let axis = diff + i;
            let to_dim = target.dims()[axis];
            strides[axis] = if from_dim == to_dim {
                stride
            } else if from_dim == 1 {
                0
            } else {
                return Err(TensorError::CannotExpand {
                    from: self.shape.clone(),
                    to: target.clone(),
                    axis,
                    from_dim,
                    to_dim,
                });
            };
        }

        Ok(Layout {
            shape: target.clone(),
            strides,
        })
    }

    /// Promotes a rank-1 layout `[K]` to a column `[K, 1]`.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidArgument`] unless the layout is rank 1.
    pub fn promote_to_column(&self) -> Result<Layout> {
        if self.rank() != 1 {
            return Err(TensorError::invalid(
                "promote_to_column",
                format!("expected a rank-1 tensor, got shape {}", self.shape),
            ));
        }
        Ok(Layout {
            shape: Shape::new(vec![self.dims()[0], 1]),
            strides: vec![self.strides[0], 0],
        })
    }

    /// Replaces the shape and strides of the leading `rank - 2` axes, keeping
    /// the trailing matrix axes as they are.
    pub(crate) fn with_batch(&self, batch_dims: &[usize], batch_strides: &[usize]) -> Layout {
        let tail = self.rank() - 2;
        let mut dims = batch_dims.to_vec();
        dims.extend_from_slice(&self.dims()[tail..]);
        let mut strides = batch_strides.to_vec();
        strides.extend_from_slice(&self.strides[tail..]);
        Layout {
            shape: Shape::new(dims),
            strides,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape={} strides=[", self.shape)?;
        for (i, s) in self.strides.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{s}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous() {
        let l = Layout::contiguous(Shape::new(vec![2, 3, 4]));
        assert_eq!(l.strides(), &[12, 4, 1]);
        assert!(l.is_contiguous());
        assert_eq!(l.required_len(), Some(24));
    }

    #[test]
    fn test_new_rejects_rank_mismatch() {
        let err = Layout::new(Shape::matrix(2, 2), vec![1]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_offset_of() {
        let l = Layout::contiguous(Shape::matrix(2, 3));
        assert_eq!(l.offset_of(&[1, 2]).unwrap(), 5);
        assert!(matches!(
            l.offset_of(&[2, 0]),
            Err(TensorError::IndexOutOfBounds { .. })
        ));
        assert!(l.offset_of(&[1]).is_err());
    }

    #[test]
    fn test_align_rank() {
        let l = Layout::contiguous(Shape::vector(3)).align_rank(3);
        assert_eq!(l.dims(), &[1, 1, 3]);
        assert_eq!(l.strides(), &[0, 0, 1]);

        let same = Layout::contiguous(Shape::matrix(2, 2)).align_rank(1);
        assert_eq!(same.dims(), &[2, 2]);
    }

    #[test]
    fn test_expand_leading_and_stretch() {
        // [3, 1] -> [2, 3, 4]
        let l = Layout::contiguous(Shape::matrix(3, 1));
        let e = l.expand(&Shape::new(vec![2, 3, 4])).unwrap();
        assert_eq!(e.dims(), &[2, 3, 4]);
        assert_eq!(e.strides(), &[0, 1, 0]);
        assert_eq!(e.required_len(), Some(3));
    }

    #[test]
    fn test_expand_keeps_existing_strides() {
        let l = Layout::new(Shape::matrix(2, 3), vec![1, 2]).unwrap();
        let e = l.expand(&Shape::new(vec![5, 2, 3])).unwrap();
        assert_eq!(e.strides(), &[0, 1, 2]);
    }

    #[test]
    fn test_expand_incompatible() {
        let l = Layout::contiguous(Shape::matrix(2, 3));
        let err = l.expand(&Shape::matrix(4, 3)).unwrap_err();
        assert!(matches!(
            err,
            TensorError::CannotExpand { axis: 0, from_dim: 2, to_dim: 4, .. }
        ));

        let err = l.expand(&Shape::vector(3)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_promote_to_column() {
        let l = Layout::contiguous(Shape::vector(4));
        let c = l.promote_to_column().unwrap();
        assert_eq!(c.dims(), &[4, 1]);
        assert_eq!(c.strides(), &[1, 0]);

        let err = Layout::contiguous(Shape::matrix(2, 2))
            .promote_to_column()
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_required_len_with_zero_extent() {
        let l = Layout::contiguous(Shape::new(vec![3, 0]));
        assert_eq!(l.required_len(), Some(0));
    }

    #[test]
    fn test_required_len_overflow() {
        let l = Layout::new(Shape::vector(2), vec![usize::MAX]).unwrap();
        assert_eq!(l.required_len(), None);

        let l = Layout::new(Shape::matrix(2, 2), vec![usize::MAX / 2 + 1, usize::MAX / 2 + 1]).unwrap();
        assert_eq!(l.required_len(), None);
    }

    #[test]
    fn test_offset_of_overflow_is_out_of_bounds() {
        let l = Layout::new(Shape::vector(3), vec![usize::MAX]).unwrap();
        assert_eq!(l.offset_of(&[1]).unwrap(), usize::MAX);
        let err = l.offset_of(&[2]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_display() {
        let l = Layout::contiguous(Shape::matrix(2, 3));
        assert_eq!(l.to_string(), "shape=[2, 3] strides=[3, 1]");
    }
}
