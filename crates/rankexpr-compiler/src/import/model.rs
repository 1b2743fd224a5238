//! The imported model: a foreign tensor graph as ranking expressions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rankexpr_ir::{ExpressionFunction, IrError, RankingExpression, Tensor, TensorType};

use super::Signature;
use crate::config::ImportConfig;

const DEFAULT_SIGNATURE: &str = "default";

/// A model built incrementally by a graph reader.
///
/// Graph placeholders become inputs, variables become constants and every
/// other node reachable from an input becomes an expression. Constants are
/// stored as small (kept with the configuration) or large (distributed
/// separately). All maps keep insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelData")]
pub struct ImportedModel {
    name: String,
    source: String,
    #[serde(skip)]
    config: ImportConfig,
    inputs: IndexMap<String, TensorType>,
    small_constants: IndexMap<String, Tensor>,
    large_constants: IndexMap<String, Tensor>,
    expressions: IndexMap<String, RankingExpression>,
    functions: IndexMap<String, RankingExpression>,
    signatures: IndexMap<String, Signature>,
}

/// Serialized form of an [`ImportedModel`], before its name is checked.
#[derive(Deserialize)]
struct ModelData {
    name: String,
    source: String,
    #[serde(default)]
    inputs: IndexMap<String, TensorType>,
    #[serde(default)]
    small_constants: IndexMap<String, Tensor>,
    #[serde(default)]
    large_constants: IndexMap<String, Tensor>,
    #[serde(default)]
    expressions: IndexMap<String, RankingExpression>,
    #[serde(default)]
    functions: IndexMap<String, RankingExpression>,
    #[serde(default)]
    signatures: IndexMap<String, Signature>,
}

impl TryFrom<ModelData> for ImportedModel {
    type Error = IrError;

    fn try_from(data: ModelData) -> Result<Self, IrError> {
        let mut model = ImportedModel::new(data.name, data.source)?;
        model.inputs = data.inputs;
        model.small_constants = data.small_constants;
        model.large_constants = data.large_constants;
        model.expressions = data.expressions;
        model.functions = data.functions;
        model.signatures = data.signatures;
        Ok(model)
    }
}

impl ImportedModel {
    /// Creates an empty model. `name` may only contain `[A-Za-z0-9_]`.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self, IrError> {
        Self::with_config(name, source, ImportConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        source: impl Into<String>,
        config: ImportConfig,
    ) -> Result<Self, IrError> {
        let name = name.into();
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(IrError::InvalidModelName { name });
        }
        Ok(ImportedModel {
            name,
            source: source.into(),
            config,
            inputs: IndexMap::new(),
            small_constants: IndexMap::new(),
            large_constants: IndexMap::new(),
            expressions: IndexMap::new(),
            functions: IndexMap::new(),
            signatures: IndexMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory or file the model was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn inputs(&self) -> &IndexMap<String, TensorType> {
        &self.inputs
    }

    pub fn small_constants(&self) -> &IndexMap<String, Tensor> {
        &self.small_constants
    }

    pub fn large_constants(&self) -> &IndexMap<String, Tensor> {
        &self.large_constants
    }

    /// Graph nodes that are neither inputs nor constants, by node name.
    pub fn expressions(&self) -> &IndexMap<String, RankingExpression> {
        &self.expressions
    }

    pub fn functions(&self) -> &IndexMap<String, RankingExpression> {
        &self.functions
    }

    pub fn signatures(&self) -> &IndexMap<String, Signature> {
        &self.signatures
    }

    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    /// The type of a small or large constant.
    pub fn constant_type(&self, name: &str) -> Option<&TensorType> {
        self.small_constants
            .get(name)
            .or_else(|| self.large_constants.get(name))
            .map(Tensor::tensor_type)
    }

    /// Returns the named signature, adding an empty one if it does not exist.
    pub fn signature_mut(&mut self, name: &str) -> &mut Signature {
        self.signatures
            .entry(name.to_string())
            .or_insert_with(|| Signature::new(name))
    }

    pub fn default_signature_mut(&mut self) -> &mut Signature {
        self.signature_mut(DEFAULT_SIGNATURE)
    }

    pub fn input(&mut self, name: impl Into<String>, tensor_type: TensorType) {
        self.inputs.insert(name.into(), tensor_type);
    }

    pub fn small_constant(&mut self, name: impl Into<String>, constant: Tensor) {
        self.small_constants.insert(name.into(), constant);
    }

    pub fn large_constant(&mut self, name: impl Into<String>, constant: Tensor) {
        self.large_constants.insert(name.into(), constant);
    }

    /// Stores a constant as small or large depending on its cell count.
    pub fn constant(&mut self, name: impl Into<String>, constant: Tensor) {
        let name = name.into();
        if constant.size() <= self.config.small_constant_max_cells {
            self.small_constant(name, constant);
        } else {
            debug!(model = %self.name, constant = %name, cells = constant.size(), "large constant");
            self.large_constant(name, constant);
        }
    }

    pub fn expression(&mut self, name: impl Into<String>, expression: RankingExpression) {
        self.expressions.insert(name.into(), expression);
    }

    pub fn function(&mut self, name: impl Into<String>, expression: RankingExpression) {
        self.functions.insert(name.into(), expression);
    }

    /// The functions this model exposes to ranking, by name.
    ///
    /// Each signature output becomes `<signature>.<output>` with the
    /// signature's inputs as arguments. A signature without outputs exposes
    /// the expression carrying the signature's name, and fails with
    /// [`IrError::UnknownModelEntry`] if the model has no such expression. A model
    /// without signatures exposes every expression under its own name, with
    /// all model inputs as arguments whether the expression uses them or not.
    pub fn output_expressions(&self) -> Result<Vec<(String, ExpressionFunction)>, IrError> {
        let mut outputs = Vec::new();
        for (signature_name, signature) in &self.signatures {
            for local in signature.outputs().keys() {
                let name = format!("{}.{}", signature_name, local);
                let function = signature.output_expression(self, local)?.with_name(&name);
                outputs.push((name, function));
            }
            if signature.outputs().is_empty() {
                let body = self
                    .expressions
                    .get(signature_name)
                    .ok_or_else(|| self.unknown_entry("expression", signature_name))?;
                let function = ExpressionFunction::try_new(
                    signature_name.clone(),
                    signature.inputs().keys().cloned().collect(),
                    body.clone(),
                    signature.input_map(self)?,
                    None,
                )?;
                outputs.push((signature_name.clone(), function));
            }
        }

        if self.signatures.is_empty() {
            let arguments: Vec<String> = self.inputs.keys().cloned().collect();
            for (name, body) in &self.expressions {
                let function = ExpressionFunction::try_new(
                    name.clone(),
                    arguments.clone(),
                    body.clone(),
                    self.inputs.clone(),
                    None,
                )?;
                outputs.push((name.clone(), function));
            }
        }
        Ok(outputs)
    }

    pub(crate) fn unknown_entry(&self, entry: &str, name: &str) -> IrError {
        IrError::UnknownModelEntry {
            owner: format!("model '{}'", self.name),
            entry: entry.to_string(),
            name: name.to_string(),
        }
    }
}
