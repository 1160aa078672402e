// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Engine configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! label = "inference"
//! memory_budget = "512M"
//! ```
//!
//! Omitting `memory_budget` yields an unbounded allocator.

use crate::{Result, TensorError};
use buffer_manager::{Allocator, MemoryBudget};
use std::path::Path;

/// Configuration for a tensor allocator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Allocator name, shown in logs and statistics.
    #[serde(default = "default_label")]
    pub label: String,
    /// Memory budget (human-readable, e.g. `"512M"`). `None` means unbounded.
    #[serde(default)]
    pub memory_budget: Option<String>,
}

fn default_label() -> String {
    "engine".to_string()
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TensorError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| TensorError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TensorError::Config(format!("TOML serialise error: {e}")))
    }

    /// Parses the memory budget string, if any.
    pub fn parse_budget(&self) -> Result<Option<MemoryBudget>> {
        self.memory_budget
            .as_deref()
            .map(MemoryBudget::parse)
            .transpose()
            .map_err(|e| TensorError::Config(format!("invalid budget: {e}")))
    }

    /// Builds the allocator this configuration describes.
    pub fn create_allocator(&self) -> Result<Allocator> {
        let budget = self.parse_budget()?;
        tracing::debug!(
            label = %self.label,
            budget = ?budget.map(|b| b.as_bytes()),
            "creating allocator from config"
        );
        Ok(Allocator::with_label(self.label.clone(), budget))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            memory_budget: None,
        }
    }
}
