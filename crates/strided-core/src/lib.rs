// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # strided-core
//!
//! Strided N-dimensional `f32` tensors with NumPy-style broadcasting.
//!
//! This crate provides:
//! - [`Shape`] and [`Layout`]: extents plus per-axis element strides.
//! - [`Tensor`]: an owning, contiguous row-major tensor.
//! - [`TensorView`]: a borrowed, possibly non-contiguous window onto a
//!   tensor's buffer (expansion, reshape, column promotion).
//! - Broadcasting helpers: [`broadcast_shape`], [`broadcast_pair`],
//!   [`broadcast_batch`].
//! - Operations in [`ops`]: elementwise add/sub/mul/div and batched matmul.
//! - [`EngineConfig`]: TOML-driven allocator setup.
//!
//! Storage comes from [`buffer_manager`]: every tensor's buffer is charged
//! to an [`Allocator`] and returned to it on drop.
//!
//! # Design Goals
//! - Views never copy; the borrow checker keeps them from outliving storage.
//! - Operations never mutate their operands.
//! - Clean error types via `thiserror`.

mod broadcast;
mod config;
mod error;
mod layout;
pub mod ops;
mod shape;
mod tensor;

pub use broadcast::{broadcast_batch, broadcast_pair, broadcast_shape, BatchBroadcast, Broadcast};
pub use buffer_manager::{Allocator, MemoryBudget};
pub use config::EngineConfig;
pub use error::{ErrorKind, Result, TensorError};
pub use layout::Layout;
pub use ops::BinaryOp;
pub use shape::{compute_strides, Shape};
pub use tensor::{reshape_alias, Tensor, TensorView};
