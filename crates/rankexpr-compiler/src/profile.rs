//! Rank profiles and the registries they are resolved against.
//!
//! These are plain data holders filled in by configuration processing. The
//! type resolution pass reads [`Schema`] and [`QueryProfileRegistry`] and
//! writes inferred function types into each [`RankProfile`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use rankexpr_ir::{ExpressionFunction, RankingExpression, TensorType};

/// A document schema: its attribute and constant types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    attributes: IndexMap<String, TensorType>,
    constants: IndexMap<String, TensorType>,
}

impl Schema {
    /// Creates a schema with no attributes or constants.
    pub fn new(name: impl Into<String>) -> Self {
        Schema {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a document attribute. Scalar attributes have the empty type.
    pub fn with_attribute(mut self, name: impl Into<String>, tensor_type: TensorType) -> Self {
        self.attributes.insert(name.into(), tensor_type);
        self
    }

    /// Adds a constant visible to every rank profile of this schema.
    pub fn with_constant(mut self, name: impl Into<String>, tensor_type: TensorType) -> Self {
        self.constants.insert(name.into(), tensor_type);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&TensorType> {
        self.attributes.get(name)
    }

    pub fn constant(&self, name: &str) -> Option<&TensorType> {
        self.constants.get(name)
    }
}

/// Types of the query parameters declared by query profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryProfileRegistry {
    parameters: IndexMap<String, TensorType>,
}

impl QueryProfileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the type of a query parameter, referenced as `query(name)`.
    pub fn with_parameter(mut self, name: impl Into<String>, tensor_type: TensorType) -> Self {
        self.parameters.insert(name.into(), tensor_type);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&TensorType> {
        self.parameters.get(name)
    }
}

/// A named set of ranking expressions.
///
/// Functions keep their declaration order. Types inferred for argument-less
/// functions are stored beside the functions, not in them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RankProfileData")]
pub struct RankProfile {
    name: String,
    functions: IndexMap<String, ExpressionFunction>,
    first_phase: Option<RankingExpression>,
    second_phase: Option<RankingExpression>,
    summary_features: Vec<RankingExpression>,
    constants: IndexMap<String, TensorType>,
    #[serde(skip)]
    inferred_types: IndexMap<String, TensorType>,
}

/// Serialized form of a [`RankProfile`]. Function keys are re-derived from
/// the function names on load.
#[derive(Deserialize)]
struct RankProfileData {
    name: String,
    #[serde(default)]
    functions: IndexMap<String, ExpressionFunction>,
    #[serde(default)]
    first_phase: Option<RankingExpression>,
    #[serde(default)]
    second_phase: Option<RankingExpression>,
    #[serde(default)]
    summary_features: Vec<RankingExpression>,
    #[serde(default)]
    constants: IndexMap<String, TensorType>,
}

impl From<RankProfileData> for RankProfile {
    fn from(data: RankProfileData) -> Self {
        let mut profile = RankProfile {
            name: data.name,
            first_phase: data.first_phase,
            second_phase: data.second_phase,
            summary_features: data.summary_features,
            constants: data.constants,
            ..RankProfile::default()
        };
        for function in data.functions.into_values() {
            profile.add_function(function);
        }
        profile
    }
}

impl RankProfile {
    /// Creates an empty profile.
    pub fn new(name: impl Into<String>) -> Self {
        RankProfile {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a function, replacing any function with the same name.
    pub fn with_function(mut self, function: ExpressionFunction) -> Self {
        self.add_function(function);
        self
    }

    /// Sets the expression every matched document is scored with.
    pub fn with_first_phase(mut self, expression: RankingExpression) -> Self {
        self.first_phase = Some(expression);
        self
    }

    /// Sets the expression used to rescore the best first-phase hits.
    pub fn with_second_phase(mut self, expression: RankingExpression) -> Self {
        self.second_phase = Some(expression);
        self
    }

    /// Adds an expression returned with each hit. It may produce any tensor.
    pub fn with_summary_feature(mut self, expression: RankingExpression) -> Self {
        self.summary_features.push(expression);
        self
    }

    /// Adds a profile constant. It shadows a schema constant of the same name.
    pub fn with_constant(mut self, name: impl Into<String>, tensor_type: TensorType) -> Self {
        self.constants.insert(name.into(), tensor_type);
        self
    }

    pub fn add_function(&mut self, function: ExpressionFunction) {
        self.inferred_types.shift_remove(function.name());
        self.functions.insert(function.name().to_string(), function);
    }

    /// Replaces a function after a rewrite, dropping any type inferred for the
    /// previous version. Returns the replaced function.
    pub fn replace_function(&mut self, function: ExpressionFunction) -> Option<ExpressionFunction> {
        self.inferred_types.shift_remove(function.name());
        self.functions.insert(function.name().to_string(), function)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Functions by name, in declaration order.
    pub fn functions(&self) -> &IndexMap<String, ExpressionFunction> {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&ExpressionFunction> {
        self.functions.get(name)
    }

    pub fn first_phase(&self) -> Option<&RankingExpression> {
        self.first_phase.as_ref()
    }

    pub fn second_phase(&self) -> Option<&RankingExpression> {
        self.second_phase.as_ref()
    }

    pub fn summary_features(&self) -> &[RankingExpression] {
        &self.summary_features
    }

    pub fn constant(&self, name: &str) -> Option<&TensorType> {
        self.constants.get(name)
    }

    /// The type last inferred for an argument-less function by type resolution.
    pub fn inferred_return_type(&self, function: &str) -> Option<&TensorType> {
        self.inferred_types.get(function)
    }

    pub fn inferred_return_types(&self) -> &IndexMap<String, TensorType> {
        &self.inferred_types
    }

    pub(crate) fn set_inferred_return_type(&mut self, function: &str, tensor_type: TensorType) {
        self.inferred_types.insert(function.to_string(), tensor_type);
    }

    pub(crate) fn clear_inferred_return_types(&mut self) {
        self.inferred_types.clear();
    }
}

/// The rank profiles of every schema.
#[derive(Debug, Clone, Default)]
pub struct RankProfileRegistry {
    profiles: IndexMap<String, Vec<RankProfile>>,
}

impl RankProfileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a profile to the profiles of `schema`.
    pub fn add(&mut self, schema: impl Into<String>, profile: RankProfile) {
        self.profiles.entry(schema.into()).or_default().push(profile);
    }

    /// The profiles of `schema` in the order they were added.
    pub fn rank_profiles_of(&self, schema: &str) -> &[RankProfile] {
        self.profiles.get(schema).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn rank_profiles_of_mut(&mut self, schema: &str) -> &mut [RankProfile] {
        self.profiles
            .get_mut(schema)
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    pub fn rank_profile(&self, schema: &str, profile: &str) -> Option<&RankProfile> {
        self.rank_profiles_of(schema)
            .iter()
            .find(|p| p.name() == profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankexpr_ir::ExpressionNode;

    fn function(name: &str, value: f64) -> ExpressionFunction {
        ExpressionFunction::new(
            name,
            RankingExpression::from_root(ExpressionNode::value(value)),
        )
    }

    #[test]
    fn test_functions_keep_declaration_order() {
        let profile = RankProfile::new("p")
            .with_function(function("z", 1.0))
            .with_function(function("a", 2.0))
            .with_function(function("m", 3.0));
        let names: Vec<&str> = profile.functions().keys().map(String::as_str).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn test_replace_function_drops_inferred_type() {
        let mut profile = RankProfile::new("p").with_function(function("f", 1.0));
        profile.set_inferred_return_type("f", TensorType::empty());
        assert!(profile.inferred_return_type("f").is_some());

        let old = profile.replace_function(function("f", 2.0));
        assert_eq!(old, Some(function("f", 1.0)));
        assert!(profile.inferred_return_type("f").is_none());
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = RankProfileRegistry::new();
        registry.add("music", RankProfile::new("default"));
        registry.add("music", RankProfile::new("fresh"));
        assert_eq!(registry.rank_profiles_of("music").len(), 2);
        assert!(registry.rank_profiles_of("video").is_empty());
        assert!(registry.rank_profiles_of_mut("video").is_empty());
        assert!(registry.rank_profile("music", "fresh").is_some());
    }

    #[test]
    fn test_deserialize_keys_functions_by_name() {
        let json = r#"{
            "name": "p",
            "functions": {
                "wrong_key": {"name": "f", "body": {"name": "", "root": {"Constant": 1.0}}}
            }
        }"#;
        let profile: RankProfile = serde_json::from_str(json).unwrap();
        assert!(profile.function("f").is_some());
        assert!(profile.function("wrong_key").is_none());
    }

    #[test]
    fn test_deserialize_rejects_malformed_function() {
        let json = r#"{
            "name": "p",
            "functions": {
                "f": {
                    "name": "f",
                    "arguments": ["x"],
                    "argument_types": {"zzz": {"dimensions": []}},
                    "body": {"name": "", "root": {"Constant": 1.0}}
                }
            }
        }"#;
        let err = serde_json::from_str::<RankProfile>(json).unwrap_err();
        assert!(err.to_string().contains("must be a subset of its arguments"));
    }
}
