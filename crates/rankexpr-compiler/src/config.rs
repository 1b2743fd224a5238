//! Resolver and model import configuration.
//!
//! Both structs are plain serde values with presets, so they can be built in
//! code or loaded from a JSON document.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What the type resolution pass does for each rank profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Type summary features and require scalar first and second phase expressions
    pub validate: bool,
    /// Only document schemas are being validated; ranking is skipped entirely
    pub documents_only: bool,
    /// Stop at the first profile that fails instead of attempting every profile
    pub fail_fast: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::full_validation()
    }
}

impl ResolverConfig {
    /// Infer function types and validate every profile.
    pub fn full_validation() -> Self {
        ResolverConfig {
            validate: true,
            documents_only: false,
            fail_fast: false,
        }
    }

    /// Infer and record function types without validating the profiles.
    pub fn types_only() -> Self {
        ResolverConfig {
            validate: false,
            ..Self::full_validation()
        }
    }

    /// Skip rank profiles altogether.
    pub fn documents_only() -> Self {
        ResolverConfig {
            documents_only: true,
            ..Self::full_validation()
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Loads a configuration from JSON. Missing fields take their
    /// [`full_validation`](Self::full_validation) values.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid resolver configuration")
    }
}

/// Settings applied while a graph reader builds an [`ImportedModel`](crate::import::ImportedModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Constants with at most this many cells are stored with the model
    /// configuration; larger ones are distributed separately.
    pub small_constant_max_cells: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            small_constant_max_cells: 512,
        }
    }
}

impl ImportConfig {
    pub fn with_small_constant_max_cells(mut self, cells: usize) -> Self {
        self.small_constant_max_cells = cells;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid import configuration")
    }
}
