// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and stride computation.

use crate::{Result, TensorError};
use buffer_manager::{AllocError, ELEMENT_BYTES};
use std::fmt;

/// Computes contiguous row-major (C-order) strides for `dims`.
///
/// The rightmost axis gets stride 1; walking right to left,
/// `strides[i] = dims[i + 1] * strides[i + 1]`. Rank 0 yields no strides.
///
/// # Examples
/// ```
/// use strided_core::compute_strides;
/// assert_eq!(compute_strides(&[2, 3, 4]), vec![12, 4, 1]);
/// ```
pub fn compute_strides(dims: &[usize]) -> Vec<usize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![0usize; rank];
    strides[rank - 1] = 1;
    for i in (0..rank - 1).rev() {
        strides[i] = dims[i + 1] * strides[i + 1];
    }
    strides
}

/// The extents of a tensor's axes.
///
/// Shapes are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use strided_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a shape from signed extents.
    ///
    /// # Errors
    /// Returns [`TensorError::NegativeDim`] naming the first negative axis.
    pub fn from_signed(dims: &[i64]) -> Result<Self> {
        let dims = dims
            .iter()
            .enumerate()
            .map(|(axis, &value)| {
                usize::try_from(value).map_err(|_| TensorError::NegativeDim { axis, value })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { dims })
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// Saturates at `usize::MAX` on overflow; use
    /// [`checked_num_elements`](Shape::checked_num_elements) when sizing
    /// allocations.
    pub fn num_elements(&self) -> usize {
        self.checked_num_elements().unwrap_or(usize::MAX)
    }

    /// Returns the total number of elements, failing with `OutOfMemory` if
    /// the product overflows.
    pub fn checked_num_elements(&self) -> Result<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(TensorError::OutOfMemory(AllocError::HeapExhausted {
                requested_bytes: usize::MAX,
            }))
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Memory footprint in bytes of a contiguous buffer with this shape.
    pub fn size_bytes(&self) -> usize {
        self.num_elements().saturating_mul(ELEMENT_BYTES)
    }

    /// Computes row-major strides for this shape.
    pub fn strides(&self) -> Vec<usize> {
        compute_strides(&self.dims)
    }

    /// Returns `true` if two shapes are broadcast-compatible.
    ///
    /// Shapes are compatible when, aligning dimensions from the right,
    /// each pair is either equal or one of them is 1.
    pub fn is_broadcast_compatible(&self, other: &Shape) -> bool {
        self.dims
            .iter()
            .rev()
            .zip(other.dims.iter().rev())
            .all(|(&a, &b)| a == b || a == 1 || b == 1)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::new(dims.to_vec())
    }
}
