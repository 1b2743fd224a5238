//! Error types for the IR.

use thiserror::Error;

use crate::expr::ReferenceKind;
use crate::tensor::TensorType;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Invalid tensor type: {0}")]
    InvalidTensorType(String),
    #[error("Cannot join {left} and {right}: {reason}")]
    IncompatibleTypes {
        left: String,
        right: String,
        reason: String,
    },
    #[error("Dimension '{dimension}' is not present in {tensor_type}")]
    UnknownDimension {
        dimension: String,
        tensor_type: String,
    },
    #[error("Invalid tensor value: {0}")]
    InvalidTensor(String),
    #[error("The {description} is invalid")]
    InvalidExpression {
        description: String,
        #[source]
        source: Box<IrError>,
    },
    #[error("Unresolved {kind} reference '{name}'")]
    UnresolvedReference { kind: ReferenceKind, name: String },
    #[error(
        "The {role} must produce a double (a tensor with no dimensions), but produces {actual}"
    )]
    ScalarConstraintViolation { role: String, actual: TensorType },
    #[error(
        "Argument type keys of function '{function}' must be a subset of its arguments, but {unknown:?} are not arguments"
    )]
    MalformedFunctionDeclaration {
        function: String,
        unknown: Vec<String>,
    },
    #[error("An imported model name can only contain [A-Za-z0-9_], but is '{name}'")]
    InvalidModelName { name: String },
    /// `owner` is the model or signature, e.g. `model 'mnist'`
    #[error("The {owner} has no {entry} named '{name}'")]
    UnknownModelEntry {
        owner: String,
        entry: String,
        name: String,
    },
    #[error("Invocation loop: {}", .path.join(" -> "))]
    CyclicReference { path: Vec<String> },
}

impl IrError {
    /// Wraps `source` as the failure of the expression described by `description`.
    pub fn invalid_expression(description: impl Into<String>, source: IrError) -> Self {
        IrError::InvalidExpression {
            description: description.into(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, skipping `InvalidExpression` wrappers.
    pub fn root_cause(&self) -> &IrError {
        match self {
            IrError::InvalidExpression { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
