// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor arithmetic operations.
//!
//! Every operation reads its operands through [`TensorView`](crate::TensorView)s,
//! so broadcast and reshaped views are accepted without copying, and returns
//! a freshly allocated contiguous [`Tensor`](crate::Tensor). The plain forms
//! charge the output to the left operand's allocator; the `_in` forms take
//! the allocator explicitly.

mod elementwise_op;
mod matmul_op;

pub use elementwise_op::{add, binary, binary_in, div, mul, sub, BinaryOp};
pub use matmul_op::{matmul, matmul_in};
