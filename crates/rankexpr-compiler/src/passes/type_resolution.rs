//! Type resolution pass over the rank profiles of a schema.
//!
//! For every profile, the return type of each argument-less function is
//! inferred and recorded on the profile. With validation on, summary features
//! must type and the first and second phase expressions must produce a scalar.
//!
//! A profile stops at its first failure. Other profiles are still attempted
//! unless [`ResolverConfig::fail_fast`] is set.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use rankexpr_ir::{IrError, RankingExpression, TensorType, TypeContext};

use crate::config::ResolverConfig;
use crate::context::ProfileTypeContext;
use crate::profile::{QueryProfileRegistry, RankProfile, RankProfileRegistry, Schema};

/// A rank profile that failed type resolution.
#[derive(Debug)]
pub struct ProfileFailure {
    pub profile: String,
    pub error: anyhow::Error,
}

impl ProfileFailure {
    /// The typed error at the bottom of the failure chain, if any.
    pub fn ir_error(&self) -> Option<&IrError> {
        ir_error(&self.error)
    }
}

/// What a resolution pass did to the profiles of one schema.
#[derive(Debug, Default)]
pub struct ResolutionOutcome {
    /// Profiles resolved successfully, in registry order
    pub resolved: Vec<String>,
    pub failures: Vec<ProfileFailure>,
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The first failure as an error, or the resolved profile names.
    pub fn into_result(self) -> Result<Vec<String>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.resolved),
        }
    }
}

/// Recovers the typed root cause of a resolution failure.
pub fn ir_error(error: &anyhow::Error) -> Option<&IrError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<IrError>())
        .map(IrError::root_cause)
}

/// Infers function types and validates the rank profiles of one schema.
pub struct RankingExpressionTypeResolver<'a> {
    schema: &'a Schema,
    query_profiles: &'a QueryProfileRegistry,
    config: ResolverConfig,
}

impl<'a> RankingExpressionTypeResolver<'a> {
    pub fn new(schema: &'a Schema, query_profiles: &'a QueryProfileRegistry) -> Self {
        Self::with_config(schema, query_profiles, ResolverConfig::default())
    }

    pub fn with_config(
        schema: &'a Schema,
        query_profiles: &'a QueryProfileRegistry,
        config: ResolverConfig,
    ) -> Self {
        RankingExpressionTypeResolver {
            schema,
            query_profiles,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves every profile registered for this resolver's schema.
    ///
    /// Returns an error only in fail-fast mode; otherwise failures are
    /// collected in the outcome.
    pub fn process(&self, registry: &mut RankProfileRegistry) -> Result<ResolutionOutcome> {
        let mut outcome = ResolutionOutcome::default();
        if self.config.documents_only {
            debug!(schema = self.schema.name(), "documents only, skipping rank profiles");
            return Ok(outcome);
        }
        for profile in registry.rank_profiles_of_mut(self.schema.name()) {
            let result = self.resolve_profile(profile);
            self.record(&mut outcome, profile.name(), result)?;
        }
        Ok(outcome)
    }

    pub(crate) fn record(
        &self,
        outcome: &mut ResolutionOutcome,
        profile: &str,
        result: Result<()>,
    ) -> Result<()> {
        match result {
            Ok(()) => outcome.resolved.push(profile.to_string()),
            Err(error) if self.config.fail_fast => return Err(error),
            Err(error) => {
                warn!(schema = self.schema.name(), profile, "{:#}", error);
                outcome.failures.push(ProfileFailure {
                    profile: profile.to_string(),
                    error,
                });
            }
        }
        Ok(())
    }

    /// Resolves one profile, recording the types of its argument-less functions.
    ///
    /// Types from earlier passes are discarded first, so a profile whose
    /// functions were rewritten since can be resolved again.
    pub fn resolve_profile(&self, profile: &mut RankProfile) -> Result<()> {
        profile.clear_inferred_return_types();
        let inferred = self
            .infer_function_types(profile)
            .with_context(|| self.location(profile))?;
        for (function, tensor_type) in inferred {
            profile.set_inferred_return_type(&function, tensor_type);
        }

        if self.config.validate {
            self.validate(profile)
                .with_context(|| self.location(profile))?;
        }
        info!(
            schema = self.schema.name(),
            profile = profile.name(),
            functions = profile.inferred_return_types().len(),
            "resolved rank profile types"
        );
        Ok(())
    }

    fn infer_function_types(&self, profile: &RankProfile) -> Result<Vec<(String, TensorType)>> {
        let context = ProfileTypeContext::new(self.schema, self.query_profiles, profile);
        let mut inferred = Vec::new();
        for function in profile.functions().values() {
            if !function.arguments().is_empty() {
                continue;
            }
            let tensor_type = function
                .body()
                .tensor_type(&context)
                .map_err(|e| IrError::invalid_expression(function.to_string(), e))?;
            debug!(function = function.name(), return_type = %tensor_type, "inferred function type");
            inferred.push((function.name().to_string(), tensor_type));
        }
        Ok(inferred)
    }

    fn validate(&self, profile: &RankProfile) -> Result<()> {
        let context = ProfileTypeContext::new(self.schema, self.query_profiles, profile);
        for feature in profile.summary_features() {
            type_of(feature, &format!("summary feature {}", feature), &context)?;
        }
        if let Some(first_phase) = profile.first_phase() {
            ensure_scalar(first_phase, "first-phase expression", &context)?;
        }
        if let Some(second_phase) = profile.second_phase() {
            ensure_scalar(second_phase, "second-phase expression", &context)?;
        }
        Ok(())
    }

    fn location(&self, profile: &RankProfile) -> String {
        format!(
            "In schema '{}', rank profile '{}'",
            self.schema.name(),
            profile.name()
        )
    }
}

fn type_of(
    expression: &RankingExpression,
    description: &str,
    context: &dyn TypeContext,
) -> Result<TensorType, IrError> {
    expression
        .tensor_type(context)
        .map_err(|e| IrError::invalid_expression(description, e))
}

fn ensure_scalar(
    expression: &RankingExpression,
    role: &str,
    context: &dyn TypeContext,
) -> Result<(), IrError> {
    let actual = type_of(expression, role, context)?;
    if actual.is_empty() {
        Ok(())
    } else {
        Err(IrError::ScalarConstraintViolation {
            role: role.to_string(),
            actual,
        })
    }
}
