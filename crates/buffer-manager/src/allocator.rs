// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Budget-enforced allocator for tensor buffers.
//!
//! The [`Allocator`] is the single source of tensor storage. It:
//!
//! 1. Optionally enforces a hard memory ceiling: requests that would push the
//!    live byte count over the budget return `Err(OutOfMemory)`.
//! 2. Reserves memory fallibly (`Vec::try_reserve_exact`), so heap exhaustion
//!    is reported as an error rather than an abort.
//! 3. Tracks allocation statistics for profiling.
//!
//! Every request performs exactly one heap reservation. Buffers are never
//! cached or reused across requests.
//!
//! # Thread Safety
//! `Allocator` is `Send + Sync`; the shared state is behind atomics and a
//! `Mutex`, and clones share the same accounting.

use crate::{AllocError, AllocationStats, Buffer, MemoryBudget};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Size in bytes of one buffer element.
pub const ELEMENT_BYTES: usize = std::mem::size_of::<f32>();

static GLOBAL: OnceLock<Allocator> = OnceLock::new();

/// Accounting state shared between an allocator and the buffers it issued.
pub(crate) struct AllocatorInner {
    label: String,
    budget: Option<MemoryBudget>,
    allocated_bytes: AtomicUsize,
    stats: Mutex<AllocationStats>,
}

impl AllocatorInner {
    /// Called by `Buffer::drop`.
    pub(crate) fn release(&self, size_bytes: usize) {
        self.allocated_bytes.fetch_sub(size_bytes, Ordering::AcqRel);
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_release(size_bytes);
        }
        tracing::trace!(allocator = %self.label, size_bytes, "buffer released");
    }

    fn record_refusal(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_refusal();
        }
    }
}

/// The allocator behind every owning tensor.
///
/// # Example
/// ```
/// use buffer_manager::{Allocator, AllocError, MemoryBudget};
///
/// let alloc = Allocator::new(MemoryBudget::from_bytes(64));
/// let buf = alloc.allocate_zeroed(16).unwrap();
/// assert_eq!(alloc.allocated_bytes(), 64);
///
/// // Budget exhausted.
/// assert!(matches!(alloc.allocate_zeroed(1), Err(AllocError::OutOfMemory { .. })));
///
/// drop(buf);
/// assert_eq!(alloc.allocated_bytes(), 0);
/// ```
#[derive(Clone)]
pub struct Allocator {
    inner: Arc<AllocatorInner>,
}

impl Allocator {
    /// Creates an allocator with the given budget.
    pub fn new(budget: MemoryBudget) -> Self {
        Self::build("budgeted", Some(budget))
    }

    /// Creates an allocator with no budget; only the heap limits it.
    pub fn unbounded() -> Self {
        Self::build("unbounded", None)
    }

    /// Creates an allocator with a label used in log events.
    pub fn with_label(label: impl Into<String>, budget: Option<MemoryBudget>) -> Self {
        Self::build(label, budget)
    }

    /// The process-wide unbounded allocator.
    pub fn global() -> &'static Allocator {
        GLOBAL.get_or_init(|| Self::build("global", None))
    }

    pub(crate) fn from_inner(inner: Arc<AllocatorInner>) -> Self {
        Self { inner }
    }

    fn build(label: impl Into<String>, budget: Option<MemoryBudget>) -> Self {
        Self {
            inner: Arc::new(AllocatorInner {
                label: label.into(),
                budget,
                allocated_bytes: AtomicUsize::new(0),
                stats: Mutex::new(AllocationStats::default()),
            }),
        }
    }

    /// Allocates `len` elements set to `0.0`.
    pub fn allocate_zeroed(&self, len: usize) -> Result<Buffer, AllocError> {
        self.allocate_filled(len, 0.0)
    }

    /// Allocates `len` elements set to `value`.
    pub fn allocate_filled(&self, len: usize, value: f32) -> Result<Buffer, AllocError> {
        self.allocate_with(len, |data| data.resize(len, value))
    }

    /// Allocates a copy of `src`.
    pub fn allocate_from_slice(&self, src: &[f32]) -> Result<Buffer, AllocError> {
        self.allocate_with(src.len(), |data| data.extend_from_slice(src))
    }

    /// Charges the budget, reserves exactly `len` elements, then lets `init`
    /// populate them. `init` must push exactly `len` elements.
    fn allocate_with(
        &self,
        len: usize,
        init: impl FnOnce(&mut Vec<f32>),
    ) -> Result<Buffer, AllocError> {
        let size_bytes = len.checked_mul(ELEMENT_BYTES).ok_or_else(|| {
            self.inner.record_refusal();
            AllocError::HeapExhausted {
                requested_bytes: usize::MAX,
            }
        })?;

        self.charge(size_bytes)?;

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            self.inner.allocated_bytes.fetch_sub(size_bytes, Ordering::AcqRel);
            self.inner.record_refusal();
            tracing::warn!(
                allocator = %self.inner.label,
                requested_bytes = size_bytes,
                "heap refused allocation"
            );
            return Err(AllocError::HeapExhausted {
                requested_bytes: size_bytes,
            });
        }
        init(&mut data);
        debug_assert_eq!(data.len(), len);

        let live = self.allocated_bytes();
        if let Ok(mut stats) = self.inner.stats.lock() {
            stats.record_grant(size_bytes);
        }
        tracing::debug!(
            allocator = %self.inner.label,
            len,
            size_bytes,
            live_bytes = live,
            "buffer allocated"
        );

        Ok(Buffer::new(data, Arc::clone(&self.inner), size_bytes))
    }

    /// Adds `size_bytes` to the live counter if the budget allows it.
    fn charge(&self, size_bytes: usize) -> Result<(), AllocError> {
        let Some(budget) = self.inner.budget else {
            self.inner.allocated_bytes.fetch_add(size_bytes, Ordering::AcqRel);
            return Ok(());
        };
        let limit = budget.as_bytes();

        let charged = self
            .inner
            .allocated_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current
                    .checked_add(size_bytes)
                    .filter(|&total| total <= limit)
            });

        match charged {
            Ok(_) => Ok(()),
            Err(current) => {
                self.inner.record_refusal();
                tracing::warn!(
                    allocator = %self.inner.label,
                    requested_bytes = size_bytes,
                    live_bytes = current,
                    budget = %budget,
                    "allocation exceeds memory budget"
                );
                Err(AllocError::OutOfMemory {
                    requested_bytes: size_bytes,
                    available_bytes: limit.saturating_sub(current),
                    budget_bytes: limit,
                })
            }
        }
    }

    /// Returns the number of bytes held by live buffers.
    pub fn allocated_bytes(&self) -> usize {
        self.inner.allocated_bytes.load(Ordering::Acquire)
    }

    /// Returns the bytes remaining before the budget is hit, or `None` when
    /// the allocator is unbounded.
    pub fn available_bytes(&self) -> Option<usize> {
        self.inner
            .budget
            .map(|b| b.as_bytes().saturating_sub(self.allocated_bytes()))
    }

    /// Returns the memory budget, if any.
    pub fn budget(&self) -> Option<MemoryBudget> {
        self.inner.budget
    }

    /// Returns the label used in log events.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns a snapshot of allocation statistics.
    pub fn stats(&self) -> AllocationStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("label", &self.inner.label)
            .field("budget", &self.inner.budget)
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}
