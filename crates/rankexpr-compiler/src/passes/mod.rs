//! Compiler passes over rank profiles.

pub mod type_resolution;

pub use type_resolution::{
    ir_error, ProfileFailure, RankingExpressionTypeResolver, ResolutionOutcome,
};
