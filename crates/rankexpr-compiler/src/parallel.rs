//! Parallel type resolution of independent rank profiles.
//!
//! Profiles of a schema share nothing mutable: each one is borrowed mutably by
//! exactly one rayon worker while the schema and query profiles are shared
//! read-only. Resolution of a single profile stays sequential.
//!
//! # Example
//!
//! ```rust
//! use rankexpr_compiler::parallel::ParallelResolver;
//! use rankexpr_compiler::{QueryProfileRegistry, RankProfile, RankProfileRegistry, Schema};
//!
//! let schema = Schema::new("music");
//! let queries = QueryProfileRegistry::new();
//! let mut registry = RankProfileRegistry::new();
//! registry.add("music", RankProfile::new("default"));
//! registry.add("music", RankProfile::new("fresh"));
//!
//! let resolver = ParallelResolver::new();
//! let outcome = resolver.process(&schema, &queries, &mut registry).unwrap();
//! assert_eq!(outcome.resolved, ["default", "fresh"]);
//! assert_eq!(resolver.stats().profiles_resolved, 2);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::passes::{RankingExpressionTypeResolver, ResolutionOutcome};
use crate::profile::{QueryProfileRegistry, RankProfile, RankProfileRegistry, Schema};

/// Statistics accumulated over parallel resolution passes.
#[derive(Debug, Clone, Default)]
pub struct ParallelStats {
    pub profiles_resolved: usize,
    pub profiles_failed: usize,
    /// Threads available to the last pass
    pub threads_used: usize,
    /// Total wall time of all passes (microseconds)
    pub elapsed_us: u64,
}

impl ParallelStats {
    /// Create new statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiles attempted, whether they resolved or failed.
    pub fn total_profiles(&self) -> usize {
        self.profiles_resolved + self.profiles_failed
    }
}

/// Configuration for parallel resolution.
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub resolver: ResolverConfig,
    /// Maximum number of threads to use (0 = the global rayon pool)
    pub max_threads: usize,
}

impl ParallelConfig {
    /// Create a configuration using the global rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration each profile is resolved with.
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }
}

/// Resolves the rank profiles of a schema on a rayon thread pool.
pub struct ParallelResolver {
    config: ParallelConfig,
    stats: Arc<Mutex<ParallelStats>>,
}

impl Default for ParallelResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelResolver {
    /// Create a resolver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ParallelConfig::default())
    }

    pub fn with_config(config: ParallelConfig) -> Self {
        ParallelResolver {
            config,
            stats: Arc::new(Mutex::new(ParallelStats::new())),
        }
    }

    /// Get a snapshot of the accumulated statistics.
    pub fn stats(&self) -> ParallelStats {
        self.stats.lock().clone()
    }

    /// Reset statistics.
    pub fn reset_stats(&self) {
        *self.stats.lock() = ParallelStats::new();
    }

    /// Resolves every profile of `schema` in parallel.
    ///
    /// The outcome lists profiles in registry order, as the sequential
    /// resolver does. In fail-fast mode workers stop picking up profiles once
    /// any profile has failed, and the first failure in registry order is
    /// returned as the error. Profiles already being resolved by other
    /// workers at that point still complete.
    pub fn process(
        &self,
        schema: &Schema,
        query_profiles: &QueryProfileRegistry,
        registry: &mut RankProfileRegistry,
    ) -> Result<ResolutionOutcome> {
        let resolver =
            RankingExpressionTypeResolver::with_config(schema, query_profiles, self.config.resolver);
        let mut outcome = ResolutionOutcome::default();
        if resolver.config().documents_only {
            return Ok(outcome);
        }

        let start = Instant::now();
        let fail_fast = resolver.config().fail_fast;
        let failed = AtomicBool::new(false);
        let resolve_all = |profiles: &mut [RankProfile]| -> Vec<(String, Option<Result<()>>)> {
            profiles
                .par_iter_mut()
                .map(|profile| {
                    let name = profile.name().to_string();
                    if fail_fast && failed.load(Ordering::Acquire) {
                        return (name, None);
                    }
                    let result = resolver.resolve_profile(profile);
                    if fail_fast && result.is_err() {
                        failed.store(true, Ordering::Release);
                    }
                    (name, Some(result))
                })
                .collect()
        };

        let profiles = registry.rank_profiles_of_mut(schema.name());
        let (results, threads) = if self.config.max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.max_threads)
                .build()
                .context("Could not build the resolver thread pool")?;
            (pool.install(|| resolve_all(profiles)), pool.current_num_threads())
        } else {
            (resolve_all(profiles), rayon::current_num_threads())
        };

        for (profile, result) in results {
            match result {
                Some(result) => resolver.record(&mut outcome, &profile, result)?,
                None => debug!(profile = %profile, "skipped after an earlier failure"),
            }
        }

        let elapsed = start.elapsed();
        let mut stats = self.stats.lock();
        stats.profiles_resolved += outcome.resolved.len();
        stats.profiles_failed += outcome.failures.len();
        stats.threads_used = threads;
        stats.elapsed_us += elapsed.as_micros() as u64;
        debug!(
            schema = schema.name(),
            profiles = outcome.resolved.len() + outcome.failures.len(),
            threads,
            "resolved rank profiles in parallel"
        );
        Ok(outcome)
    }
}
