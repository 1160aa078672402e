// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory budget configuration and parsing.
//!
//! A [`MemoryBudget`] is the ceiling an [`crate::Allocator`] enforces over the
//! bytes held by its live buffers. It supports human-readable parsing so that
//! configuration files can say `"512M"` instead of a raw byte count.

use crate::AllocError;
use std::fmt;

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;
const GIB: usize = 1024 * MIB;

/// A hard ceiling on live buffer bytes.
///
/// # Parsing
/// Supports strings with binary suffixes:
/// - `"512M"` or `"512MB"` → 512 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"2048K"` or `"2048KB"` → 2048 × 1024 bytes
/// - `"4096"` or `"4096B"` → raw byte count
///
/// # Examples
/// ```
/// use buffer_manager::MemoryBudget;
///
/// let b = MemoryBudget::from_mb(512);
/// assert_eq!(b.as_mb(), 512);
///
/// let b = MemoryBudget::parse("1G").unwrap();
/// assert_eq!(b.as_mb(), 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    bytes: usize,
}

impl MemoryBudget {
    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from megabytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MIB }
    }

    /// Creates a budget from gigabytes.
    pub fn from_gb(gb: usize) -> Self {
        Self { bytes: gb * GIB }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in megabytes (truncated).
    pub fn as_mb(&self) -> usize {
        self.bytes / MIB
    }

    /// Parses a human-readable budget string. Case-insensitive.
    ///
    /// # Errors
    /// Returns [`AllocError::InvalidBudget`] for empty, malformed, zero, or
    /// overflowing budgets.
    pub fn parse(s: &str) -> Result<Self, AllocError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AllocError::InvalidBudget("empty budget string".into()));
        }

        let upper = s.to_uppercase();
        let (num_str, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
            (n, GIB)
        } else if let Some(n) = upper.strip_suffix('G') {
            (n, GIB)
        } else if let Some(n) = upper.strip_suffix("MB") {
            (n, MIB)
        } else if let Some(n) = upper.strip_suffix('M') {
            (n, MIB)
        } else if let Some(n) = upper.strip_suffix("KB") {
            (n, KIB)
        } else if let Some(n) = upper.strip_suffix('K') {
            (n, KIB)
        } else if let Some(n) = upper.strip_suffix('B') {
            (n, 1)
        } else {
            (upper.as_str(), 1)
        };

        let value: usize = num_str.trim().parse().map_err(|_| {
            AllocError::InvalidBudget(format!(
                "'{s}': expected a number followed by an optional suffix (K, M, G)"
            ))
        })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| AllocError::InvalidBudget(format!("'{s}' overflows usize")))?;

        if bytes == 0 {
            return Err(AllocError::InvalidBudget(format!("'{s}' is zero")));
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= GIB && self.bytes % GIB == 0 {
            write!(f, "{} GB", self.bytes / GIB)
        } else if self.bytes >= MIB && self.bytes % MIB == 0 {
            write!(f, "{} MB", self.bytes / MIB)
        } else if self.bytes >= KIB && self.bytes % KIB == 0 {
            write!(f, "{} KB", self.bytes / KIB)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mb() {
        let b = MemoryBudget::from_mb(512);
        assert_eq!(b.as_bytes(), 512 * 1024 * 1024);
        assert_eq!(b.as_mb(), 512);
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(MemoryBudget::parse("512M").unwrap().as_mb(), 512);
        assert_eq!(MemoryBudget::parse("512mb").unwrap().as_mb(), 512);
        assert_eq!(MemoryBudget::parse("2g").unwrap().as_mb(), 2048);
        assert_eq!(MemoryBudget::parse("1024KB").unwrap().as_bytes(), 1024 * 1024);
        assert_eq!(MemoryBudget::parse("4096B").unwrap().as_bytes(), 4096);
    }

    #[test]
    fn test_parse_raw_bytes_and_whitespace() {
        assert_eq!(MemoryBudget::parse("1048576").unwrap().as_mb(), 1);
        assert_eq!(MemoryBudget::parse("  64K  ").unwrap().as_bytes(), 64 * 1024);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(MemoryBudget::parse(""), Err(AllocError::InvalidBudget(_))));
        assert!(MemoryBudget::parse("abc").is_err());
        assert!(MemoryBudget::parse("0M").is_err());
        assert!(MemoryBudget::parse("99999999999999999999G").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", MemoryBudget::from_gb(1)), "1 GB");
        assert_eq!(format!("{}", MemoryBudget::from_mb(512)), "512 MB");
        assert_eq!(format!("{}", MemoryBudget::from_bytes(2048)), "2 KB");
        assert_eq!(format!("{}", MemoryBudget::from_bytes(100)), "100 B");
    }

    #[test]
    fn test_serde_roundtrip() {
        let b = MemoryBudget::from_mb(256);
        let json = serde_json::to_string(&b).unwrap();
        let back: MemoryBudget = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
