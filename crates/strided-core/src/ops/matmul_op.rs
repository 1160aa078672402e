// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Batched matrix multiplication.

use crate::{broadcast_batch, compute_strides, Result, Shape, Tensor, TensorError, TensorView};
use buffer_manager::Allocator;

/// Performs batched matrix multiplication: `output = lhs @ rhs`.
///
/// `lhs` is `[..., M, K]` and `rhs` is `[..., K, N]`. The trailing two axes
/// are the matrix axes; every leading axis is a batch axis and is broadcast
/// NumPy-style. A rank-1 `rhs` `[K]` is promoted to a column `[K, 1]`; a
/// rank-1 `lhs` `[K]` is right-aligned to a row `[1, K]`. Neither promotion
/// is squeezed from the result.
///
/// The output, of shape `batch ++ [M, N]`, is charged to `lhs`'s allocator.
///
/// # Errors
/// - [`TensorError::InputDimMismatch`] if `lhs`'s last axis differs from
///   `rhs`'s second-to-last.
/// - [`TensorError::CannotBroadcast`] if the batch shapes are incompatible.
/// - [`TensorError::OutOfMemory`] if the output cannot be allocated.
///
/// # Examples
/// ```
/// use strided_core::{ops, Tensor};
/// let a = Tensor::ones([4, 2, 3]).unwrap();
/// let b = Tensor::ones([3, 4]).unwrap();
/// let c = ops::matmul(&a.view(), &b.view()).unwrap();
/// assert_eq!(c.shape().dims(), &[4, 2, 4]);
/// assert!(c.as_slice().iter().all(|&x| x == 3.0));
/// ```
pub fn matmul(lhs: &TensorView<'_>, rhs: &TensorView<'_>) -> Result<Tensor> {
    let allocator = lhs.buffer().allocator();
    matmul_in(&allocator, lhs, rhs)
}

/// [`matmul`] with the output charged to `allocator`.
pub fn matmul_in(
    allocator: &Allocator,
    lhs: &TensorView<'_>,
    rhs: &TensorView<'_>,
) -> Result<Tensor> {
    if lhs.rank() == 0 || rhs.rank() == 0 {
        return Err(TensorError::invalid(
            "matmul",
            format!("operands must have rank >= 1, got {} and {}", lhs.shape(), rhs.shape()),
        ));
    }

    let rhs_m = if rhs.rank() == 1 {
        rhs.promote_to_column()?
    } else {
        rhs.clone()
    };
    let rank = lhs.rank().max(rhs_m.rank()).max(2);
    let a = lhs.align_rank(rank);
    let b = rhs_m.align_rank(rank);

    let lhs_k = a.shape().dims()[rank - 1];
    let rhs_k = b.shape().dims()[rank - 2];
    if lhs_k != rhs_k {
        return Err(TensorError::InputDimMismatch {
            lhs: lhs.shape().clone(),
            rhs: rhs.shape().clone(),
            lhs_k,
            rhs_k,
        });
    }

    let bb = broadcast_batch(&a, &b)?;
    let m = a.shape().dims()[rank - 2];
    let n = b.shape().dims()[rank - 1];

    let mut out_dims = bb.batch.dims().to_vec();
    out_dims.extend_from_slice(&[m, n]);
    tracing::trace!(lhs = %lhs.shape(), rhs = %rhs.shape(), m, k = lhs_k, n, "matmul");
    let mut out = Tensor::zeros_in(allocator, Shape::new(out_dims))?;
    if out.is_empty() || lhs_k == 0 {
        return Ok(out);
    }

    let tail = rank - 2;
    let a_strides = bb.lhs.strides();
    let b_strides = bb.rhs.strides();
    let kernel = MatKernel {
        m,
        k: lhs_k,
        n,
        a_row: a_strides[tail],
        a_col: a_strides[tail + 1],
        b_row: b_strides[tail],
        b_col: b_strides[tail + 1],
    };

    let batch_dims = bb.batch.dims();
    let batch_strides = compute_strides(batch_dims);
    let a_data = bb.lhs.as_slice();
    let b_data = bb.rhs.as_slice();

    for (batch, c_block) in out.as_mut_slice().chunks_exact_mut(m * n).enumerate() {
        let mut a_off = 0;
        let mut b_off = 0;
        for d in 0..batch_dims.len() {
            let coord = (batch / batch_strides[d]) % batch_dims[d];
            a_off += coord * a_strides[d];
            b_off += coord * b_strides[d];
        }
        kernel.run(&a_data[a_off..], &b_data[b_off..], c_block);
    }

    Ok(out)
}

/// One `[M, K] @ [K, N]` product over strided operands.
struct MatKernel {
    m: usize,
    k: usize,
    n: usize,
    a_row: usize,
    a_col: usize,
    b_row: usize,
    b_col: usize,
}

impl MatKernel {
    /// ikj loop order: each `a[i, p]` scales row `p` of `b` into row `i` of
    /// `c`, which is sequential in the output. `c` must be zeroed.
    fn run(&self, a: &[f32], b: &[f32], c: &mut [f32]) {
        for i in 0..self.m {
            let c_row = &mut c[i * self.n..(i + 1) * self.n];
            for p in 0..self.k {
                let a_ip = a[i * self.a_row + p * self.a_col];
                let b_base = p * self.b_row;
                for (j, c_ij) in c_row.iter_mut().enumerate() {
                    *c_ij += a_ip * b[b_base + j * self.b_col];
                }
            }
        }
    }
}
