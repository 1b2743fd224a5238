//! Static type inference over expression trees.

use indexmap::IndexMap;
use tracing::trace;

use super::{ExpressionNode, Reference, ReferenceKind};
use crate::context::{BoundTypeContext, TypeContext};
use crate::error::IrError;
use crate::tensor::TensorType;

/// Memoization key for the type of a function called with given argument types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionTypeKey {
    pub function: String,
    pub argument_types: Vec<TensorType>,
}

impl ExpressionNode {
    /// Computes the type this node produces, without evaluating it.
    pub fn tensor_type(&self, context: &dyn TypeContext) -> Result<TensorType, IrError> {
        match self {
            ExpressionNode::Constant(_) => Ok(TensorType::empty()),
            ExpressionNode::Reference(reference) => reference_type(reference, context),
            ExpressionNode::Arithmetic { left, right, .. }
            | ExpressionNode::Join { left, right, .. } => {
                let left = left.tensor_type(context)?;
                let right = right.tensor_type(context)?;
                left.join(&right)
            }
            ExpressionNode::Reduce {
                argument,
                dimensions,
                ..
            } => argument.tensor_type(context)?.reduce(dimensions.as_slice()),
            ExpressionNode::Rename { argument, from, to } => argument
                .tensor_type(context)?
                .rename(from.as_slice(), to.as_slice()),
            ExpressionNode::Map { argument, .. } => argument.tensor_type(context),
        }
    }
}

fn reference_type(reference: &Reference, context: &dyn TypeContext) -> Result<TensorType, IrError> {
    let found = match reference.kind() {
        ReferenceKind::Attribute => context.attribute_type(reference.name()),
        ReferenceKind::Query => context.query_type(reference.name()),
        ReferenceKind::Constant => context.constant_type(reference.name()),
        ReferenceKind::Function => return function_type(reference, context),
    };
    found.cloned().ok_or_else(|| unresolved(reference))
}

fn function_type(reference: &Reference, context: &dyn TypeContext) -> Result<TensorType, IrError> {
    let name = reference.name();
    if reference.arguments().is_empty() {
        if let Some(bound) = context.argument_type(name) {
            return Ok(bound.clone());
        }
    }

    let function = context.function(name).ok_or_else(|| unresolved(reference))?;
    if let Some(declared) = function.return_type() {
        return Ok(declared.clone());
    }

    let argument_types = reference
        .arguments()
        .iter()
        .map(|argument| argument.tensor_type(context))
        .collect::<Result<Vec<_>, _>>()?;
    let key = FunctionTypeKey {
        function: name.to_string(),
        argument_types,
    };
    if let Some(cached) = context.cached_function_type(&key) {
        return Ok(cached);
    }

    let mut path = context.invocation_path();
    if path.iter().any(|f| f == name) {
        path.push(name.to_string());
        return Err(IrError::CyclicReference { path });
    }

    let mut bindings = IndexMap::with_capacity(function.arguments().len());
    for (i, argument) in function.arguments().iter().enumerate() {
        let bound = key
            .argument_types
            .get(i)
            .or_else(|| function.argument_types().get(argument));
        if let Some(bound) = bound {
            bindings.insert(argument.clone(), bound.clone());
        }
    }

    let scope = BoundTypeContext::new(context, name, bindings);
    let return_type = function
        .body()
        .tensor_type(&scope)
        .map_err(|e| IrError::invalid_expression(function.to_string(), e))?;
    trace!(function = name, return_type = %return_type, "inferred function type");
    context.cache_function_type(key, return_type.clone());
    Ok(return_type)
}

fn unresolved(reference: &Reference) -> IrError {
    IrError::UnresolvedReference {
        kind: reference.kind(),
        name: reference.to_string(),
    }
}
