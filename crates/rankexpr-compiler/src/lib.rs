//! Rank profile type resolution and model import.
//!
//! **Version**: 0.1.0
//!
//! This crate validates the ranking side of a deployment before any document
//! is scored. It infers the tensor type of every function in every rank
//! profile, checks that referenced attributes, query parameters, constants
//! and functions exist, and enforces that the first and second phase
//! expressions produce a scalar. It also holds the [`ImportedModel`]
//! structure machine-learned models are imported into.
//!
//! # Overview
//!
//! - [`config`]: resolver and import configuration with presets
//! - [`profile`]: schemas, query profiles and rank profiles (plain data holders)
//! - [`passes`]: the type resolution pass
//! - [`parallel`]: resolution of independent profiles on a rayon pool
//! - [`import`]: imported models and their signatures
//!
//! # Quick Start
//!
//! ```rust
//! use rankexpr_compiler::{
//!     QueryProfileRegistry, RankProfile, RankProfileRegistry, RankingExpressionTypeResolver,
//!     Schema,
//! };
//! use rankexpr_ir::{ExpressionFunction, ExpressionNode, RankingExpression, TensorType};
//!
//! let schema = Schema::new("music").with_attribute("popularity", TensorType::empty());
//! let queries = QueryProfileRegistry::new();
//!
//! let boost = ExpressionFunction::new(
//!     "boost",
//!     RankingExpression::from_root(ExpressionNode::mul(
//!         ExpressionNode::attribute("popularity"),
//!         ExpressionNode::value(2.0),
//!     )),
//! );
//! let mut registry = RankProfileRegistry::new();
//! registry.add(
//!     "music",
//!     RankProfile::new("default")
//!         .with_function(boost)
//!         .with_first_phase(RankingExpression::from_root(ExpressionNode::identifier("boost"))),
//! );
//!
//! let resolver = RankingExpressionTypeResolver::new(&schema, &queries);
//! let outcome = resolver.process(&mut registry).unwrap();
//! assert!(outcome.is_success());
//!
//! let profile = registry.rank_profile("music", "default").unwrap();
//! assert_eq!(profile.inferred_return_type("boost"), Some(&TensorType::empty()));
//! ```

pub mod config;
mod context;
pub mod import;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod passes;
pub mod profile;

pub use config::{ImportConfig, ResolverConfig};
pub use context::ProfileTypeContext;
pub use import::{ImportedModel, Signature};
pub use passes::{ir_error, ProfileFailure, RankingExpressionTypeResolver, ResolutionOutcome};
pub use profile::{QueryProfileRegistry, RankProfile, RankProfileRegistry, Schema};
