// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Broadcasting elementwise arithmetic.

use crate::{broadcast_pair, Result, Tensor, TensorView};
use buffer_manager::Allocator;

/// The closed set of elementwise binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Applies the operator with IEEE-754 `f32` semantics. Division by zero
    /// produces ±infinity or NaN.
    #[inline]
    pub fn apply(self, x: f32, y: f32) -> f32 {
        match self {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        }
    }
}

/// Evaluates `op` over the broadcast of `lhs` and `rhs`, charging the output
/// to `lhs`'s allocator.
///
/// # Errors
/// - [`TensorError::CannotBroadcast`](crate::TensorError::CannotBroadcast)
///   if the shapes are incompatible.
/// - [`TensorError::OutOfMemory`](crate::TensorError::OutOfMemory) if the
///   output cannot be allocated.
pub fn binary(op: BinaryOp, lhs: &TensorView<'_>, rhs: &TensorView<'_>) -> Result<Tensor> {
    let allocator = lhs.buffer().allocator();
    binary_in(&allocator, op, lhs, rhs)
}

/// [`binary`] with the output charged to `allocator`.
pub fn binary_in(
    allocator: &Allocator,
    op: BinaryOp,
    lhs: &TensorView<'_>,
    rhs: &TensorView<'_>,
) -> Result<Tensor> {
    tracing::trace!(op = op.name(), lhs = %lhs.shape(), rhs = %rhs.shape(), "elementwise");

    let bc = broadcast_pair(lhs, rhs)?;
    let mut out = Tensor::empty_in(allocator, bc.shape)?;

    let a = bc.lhs.as_slice();
    let b = bc.rhs.as_slice();
    let a_strides = bc.lhs.strides();
    let b_strides = bc.rhs.strides();
    let out_dims = out.shape().dims().to_vec();
    let out_strides = out.strides().to_vec();

    for (k, dst) in out.as_mut_slice().iter_mut().enumerate() {
        let mut offset_a = 0;
        let mut offset_b = 0;
        for d in 0..out_dims.len() {
            let coord = (k / out_strides[d]) % out_dims[d];
            offset_a += coord * a_strides[d];
            offset_b += coord * b_strides[d];
        }
        *dst = op.apply(a[offset_a], b[offset_b]);
    }

    Ok(out)
}

/// Elementwise `lhs + rhs` with broadcasting.
///
/// # Examples
/// ```
/// use strided_core::{ops, Tensor};
/// let a = Tensor::from_data(&[1.0, 2.0, 3.0], [3]).unwrap();
/// let b = Tensor::from_data(&[10.0, 20.0], [2, 1]).unwrap();
/// let c = ops::add(&a.view(), &b.view()).unwrap();
/// assert_eq!(c.shape().dims(), &[2, 3]);
/// assert_eq!(c.as_slice(), &[11.0, 12.0, 13.0, 21.0, 22.0, 23.0]);
/// ```
pub fn add(lhs: &TensorView<'_>, rhs: &TensorView<'_>) -> Result<Tensor> {
    binary(BinaryOp::Add, lhs, rhs)
}

/// Elementwise `lhs - rhs` with broadcasting.
pub fn sub(lhs: &TensorView<'_>, rhs: &TensorView<'_>) -> Result<Tensor> {
    binary(BinaryOp::Sub, lhs, rhs)
}

/// Elementwise `lhs * rhs` with broadcasting.
pub fn mul(lhs: &TensorView<'_>, rhs: &TensorView<'_>) -> Result<Tensor> {
    binary(BinaryOp::Mul, lhs, rhs)
}

/// Elementwise `lhs / rhs` with broadcasting.
pub fn div(lhs: &TensorView<'_>, rhs: &TensorView<'_>) -> Result<Tensor> {
    binary(BinaryOp::Div, lhs, rhs)
}
