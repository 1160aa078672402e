// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # buffer-manager
//!
//! A budget-enforced allocator for the flat `f32` buffers that back strided
//! tensors.
//!
//! # Key Components
//!
//! - [`MemoryBudget`]: a hard memory ceiling with human-readable parsing
//!   (`"512M"`, `"1G"`, etc.).
//! - [`Allocator`]: enforces the budget, performs exactly one heap
//!   reservation per request, and tracks statistics. There is no free list:
//!   every buffer is fresh and every release goes straight back to the heap.
//! - [`Buffer`]: the RAII owner of an allocated buffer. Dropping it returns
//!   its bytes to the allocator's accounting. Borrowers (tensor views) hold
//!   `&Buffer`, so the borrow checker rejects any view that outlives it.
//! - [`AllocationStats`]: cumulative allocator metrics (peak usage, OOM
//!   count, allocation/deallocation totals).
//!
//! # Ownership Model
//!
//! ```text
//! Allocator::allocate_*(len)
//!       │
//!       ▼
//!    Buffer  ◄─── owns Vec<f32>, holds Arc<AllocatorInner>
//!       │   ▲
//!       │   └── &'a Buffer held by any number of views
//!       │  drop()
//!       ▼
//!   AllocatorInner::release()  ──► live-byte counter
//! ```
//!
//! # Example
//! ```
//! use buffer_manager::{Allocator, MemoryBudget};
//!
//! let alloc = Allocator::new(MemoryBudget::from_bytes(1024));
//!
//! let a = alloc.allocate_zeroed(64).unwrap(); // 256 bytes
//! let b = alloc.allocate_filled(32, 1.0).unwrap(); // 128 bytes
//! assert_eq!(alloc.allocated_bytes(), 384);
//!
//! drop(a);
//! assert_eq!(alloc.allocated_bytes(), 128);
//! assert!(b.as_slice().iter().all(|&x| x == 1.0));
//! ```

mod allocator;
mod budget;
mod buffer;
mod error;
mod stats;

pub use allocator::{Allocator, ELEMENT_BYTES};
pub use budget::MemoryBudget;
pub use buffer::Buffer;
pub use error::AllocError;
pub use stats::AllocationStats;
