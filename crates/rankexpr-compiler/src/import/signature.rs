//! Named groups of model inputs and outputs.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use rankexpr_ir::{ExpressionFunction, IrError, TensorType};

use super::ImportedModel;

/// A set of named inputs and outputs of an [`ImportedModel`].
///
/// Inputs map a local name to a model input; outputs map a local name to a
/// model expression. A signature only stores names; every read that needs the
/// model's inputs or expressions takes the owning model as an argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    name: String,
    inputs: IndexMap<String, String>,
    outputs: IndexMap<String, String>,
    skipped_outputs: IndexMap<String, String>,
    import_warnings: Vec<String>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Signature {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local input name to model input name.
    pub fn inputs(&self) -> &IndexMap<String, String> {
        &self.inputs
    }

    /// Local output name to model expression name.
    pub fn outputs(&self) -> &IndexMap<String, String> {
        &self.outputs
    }

    /// Outputs the graph reader could not import, with the reason for each.
    pub fn skipped_outputs(&self) -> &IndexMap<String, String> {
        &self.skipped_outputs
    }

    pub fn import_warnings(&self) -> &[String] {
        &self.import_warnings
    }

    pub fn input(&mut self, local: impl Into<String>, model_input: impl Into<String>) {
        self.inputs.insert(local.into(), model_input.into());
    }

    pub fn output(&mut self, local: impl Into<String>, expression: impl Into<String>) {
        self.outputs.insert(local.into(), expression.into());
    }

    pub fn skipped_output(&mut self, local: impl Into<String>, reason: impl Into<String>) {
        self.skipped_outputs.insert(local.into(), reason.into());
    }

    pub fn import_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        warn!(signature = %self.name, "{}", warning);
        self.import_warnings.push(warning);
    }

    /// The type of every input of this signature, by local name.
    pub fn input_map(&self, model: &ImportedModel) -> Result<IndexMap<String, TensorType>, IrError> {
        self.inputs
            .keys()
            .map(|local| {
                let tensor_type = self.input_argument(model, local)?;
                Ok((local.clone(), tensor_type.clone()))
            })
            .collect::<Result<_, IrError>>()
    }

    /// The type of the model input a local input refers to.
    pub fn input_argument<'m>(
        &self,
        model: &'m ImportedModel,
        local: &str,
    ) -> Result<&'m TensorType, IrError> {
        let model_input = self
            .inputs
            .get(local)
            .ok_or_else(|| self.unknown("input", local))?;
        model
            .inputs()
            .get(model_input)
            .ok_or_else(|| model.unknown_entry("input", model_input))
    }

    /// The function computing an output: named after the output, taking this
    /// signature's inputs as arguments.
    pub fn output_expression(
        &self,
        model: &ImportedModel,
        local: &str,
    ) -> Result<ExpressionFunction, IrError> {
        let expression_name = self
            .outputs
            .get(local)
            .ok_or_else(|| self.unknown("output", local))?;
        let body = model
            .expressions()
            .get(expression_name)
            .ok_or_else(|| model.unknown_entry("expression", expression_name))?;
        ExpressionFunction::try_new(
            local,
            self.inputs.keys().cloned().collect(),
            body.clone(),
            self.input_map(model)?,
            None,
        )
    }

    fn unknown(&self, entry: &str, name: &str) -> IrError {
        IrError::UnknownModelEntry {
            owner: self.to_string(),
            entry: entry.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signature '{}'", self.name)
    }
}
