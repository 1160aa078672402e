// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Live-buffer accounting for an [`crate::Allocator`].
//!
//! Every request ends in exactly one of two events, a grant or a refusal.
//! Every granted buffer later produces exactly one release when it drops.
//! The counters below are updated under the allocator's stats lock, so
//! `live_bytes` and `peak_allocated_bytes` are consistent with each other
//! even when buffers are dropped on other threads.

/// Snapshot of an allocator's request and release history.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AllocationStats {
    /// Requests seen, granted or refused.
    pub total_allocations: u64,
    /// Requests refused (budget exceeded or heap exhausted).
    pub oom_count: u64,
    /// Granted buffers that have since been dropped.
    pub total_deallocations: u64,
    /// Bytes held by buffers that are still alive.
    pub live_bytes: usize,
    /// High-water mark of `live_bytes`.
    pub peak_allocated_bytes: usize,
    /// Bytes granted over the allocator's lifetime.
    pub cumulative_allocated_bytes: u64,
}

impl AllocationStats {
    /// Requests that produced a buffer.
    pub fn granted(&self) -> u64 {
        self.total_allocations - self.oom_count
    }

    /// Buffers granted and not yet dropped.
    pub fn live_buffers(&self) -> u64 {
        self.granted().saturating_sub(self.total_deallocations)
    }

    /// `true` once every granted buffer has been dropped.
    pub fn is_drained(&self) -> bool {
        self.live_buffers() == 0 && self.live_bytes == 0
    }

    pub(crate) fn record_grant(&mut self, size_bytes: usize) {
        self.total_allocations += 1;
        self.cumulative_allocated_bytes += size_bytes as u64;
        self.live_bytes += size_bytes;
        self.peak_allocated_bytes = self.peak_allocated_bytes.max(self.live_bytes);
    }

    pub(crate) fn record_refusal(&mut self) {
        self.total_allocations += 1;
        self.oom_count += 1;
    }

    pub(crate) fn record_release(&mut self, size_bytes: usize) {
        self.total_deallocations += 1;
        self.live_bytes = self.live_bytes.saturating_sub(size_bytes);
    }

    /// One-line description for logs, e.g.
    /// `3/4 requests granted, 1 refused; 2 live buffers (1.50 KiB), peak 3.00 KiB, 4.00 KiB issued`.
    pub fn summary(&self) -> String {
        format!(
            "{}/{} requests granted, {} refused; {} live buffers ({}), peak {}, {} issued",
            self.granted(),
            self.total_allocations,
            self.oom_count,
            self.live_buffers(),
            human_bytes(self.live_bytes as u64),
            human_bytes(self.peak_allocated_bytes as u64),
            human_bytes(self.cumulative_allocated_bytes),
        )
    }
}

fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.2} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}
