// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII buffer handle that settles allocator accounting on drop.
//!
//! A [`Buffer`] is the single owning handle of an allocation. Anything that
//! wants to read the same memory without owning it borrows `&Buffer`, so a
//! borrower can neither free the memory nor outlive it.

use crate::allocator::AllocatorInner;
use crate::Allocator;
use std::sync::Arc;

/// An owned, flat `f32` buffer handed out by an [`Allocator`](crate::Allocator).
///
/// # Example
/// ```
/// use buffer_manager::Allocator;
///
/// let alloc = Allocator::unbounded();
/// let buf = alloc.allocate_from_slice(&[1.0, 2.0]).unwrap();
/// assert_eq!(alloc.allocated_bytes(), 8);
/// drop(buf);
/// assert_eq!(alloc.allocated_bytes(), 0);
/// ```
pub struct Buffer {
    data: Vec<f32>,
    allocator: Arc<AllocatorInner>,
    size_bytes: usize,
}

impl Buffer {
    pub(crate) fn new(data: Vec<f32>, allocator: Arc<AllocatorInner>, size_bytes: usize) -> Self {
        Self {
            data,
            allocator,
            size_bytes,
        }
    }

    /// Returns the buffer contents.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the buffer contents mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Number of `f32` elements in the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of this allocation in bytes (as charged to the budget).
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Returns a handle to the allocator this buffer is charged to.
    pub fn allocator(&self) -> Allocator {
        Allocator::from_inner(Arc::clone(&self.allocator))
    }

    /// Address of the first element, used to test buffer identity.
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.allocator.release(self.size_bytes);
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.data.len())
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}
