//! Expression functions and their argument-bound instances.
//!
//! An [`ExpressionFunction`] is a named, optionally parameterized ranking
//! expression. It is an immutable value: every `with_*` method returns a new
//! function.
//!
//! [`ExpressionFunction::expand`] binds concrete argument expressions and
//! produces an [`Instance`] whose name is a pure function of the function
//! name, argument order and the rendered argument text. Instances with equal
//! names are interchangeable, which lets serialization emit each distinct
//! specialization once.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::error::IrError;
use crate::expr::{ExpressionNode, RankingExpression};
use crate::serialization::SerializationContext;
use crate::tensor::TensorType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FunctionData")]
pub struct ExpressionFunction {
    name: String,
    arguments: Vec<String>,
    /// Declared types of any subset of the arguments
    argument_types: IndexMap<String, TensorType>,
    body: RankingExpression,
    return_type: Option<TensorType>,
}

#[derive(Deserialize)]
struct FunctionData {
    name: String,
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default)]
    argument_types: IndexMap<String, TensorType>,
    body: RankingExpression,
    #[serde(default)]
    return_type: Option<TensorType>,
}

impl TryFrom<FunctionData> for ExpressionFunction {
    type Error = IrError;

    fn try_from(data: FunctionData) -> Result<Self, IrError> {
        ExpressionFunction::try_new(
            data.name,
            data.arguments,
            data.body,
            data.argument_types,
            data.return_type,
        )
    }
}

impl ExpressionFunction {
    /// A function without arguments.
    pub fn new(name: impl Into<String>, body: RankingExpression) -> Self {
        Self::with_arguments(name, Vec::new(), body)
    }

    pub fn with_arguments(
        name: impl Into<String>,
        arguments: Vec<String>,
        body: RankingExpression,
    ) -> Self {
        ExpressionFunction {
            name: name.into(),
            arguments,
            argument_types: IndexMap::new(),
            body,
            return_type: None,
        }
    }

    /// A function with declared argument and return types.
    ///
    /// Fails if an argument type is given for a name that is not an argument.
    pub fn try_new(
        name: impl Into<String>,
        arguments: Vec<String>,
        body: RankingExpression,
        argument_types: IndexMap<String, TensorType>,
        return_type: Option<TensorType>,
    ) -> Result<Self, IrError> {
        let name = name.into();
        check_argument_types(&name, &arguments, &argument_types)?;
        Ok(ExpressionFunction {
            name,
            arguments,
            argument_types,
            body,
            return_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Declared argument types. The keys may be any subset of the arguments.
    pub fn argument_types(&self) -> &IndexMap<String, TensorType> {
        &self.argument_types
    }

    pub fn body(&self) -> &RankingExpression {
        &self.body
    }

    /// The declared return type, if any.
    pub fn return_type(&self) -> Option<&TensorType> {
        self.return_type.as_ref()
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        ExpressionFunction {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_body(&self, body: RankingExpression) -> Self {
        ExpressionFunction {
            body,
            ..self.clone()
        }
    }

    pub fn with_return_type(&self, return_type: TensorType) -> Self {
        ExpressionFunction {
            return_type: Some(return_type),
            ..self.clone()
        }
    }

    pub fn with_argument_types(
        &self,
        argument_types: IndexMap<String, TensorType>,
    ) -> Result<Self, IrError> {
        check_argument_types(&self.name, &self.arguments, &argument_types)?;
        Ok(ExpressionFunction {
            argument_types,
            ..self.clone()
        })
    }

    /// Creates an instance of this function with the given argument values bound.
    ///
    /// Each argument is bound to the text of the corresponding value rendered
    /// in `context`; surplus values or arguments are ignored. The body is then
    /// rendered with those bindings. Calls to other functions in the body are
    /// expanded in turn and recorded in `context`. `path` holds the functions
    /// currently being expanded and is used to reject invocation loops.
    pub fn expand(
        &self,
        context: &SerializationContext,
        argument_values: &[ExpressionNode],
        path: &mut Vec<String>,
    ) -> Result<Instance, IrError> {
        if path.contains(&self.name) {
            let mut cycle = path.clone();
            cycle.push(self.name.clone());
            return Err(IrError::CyclicReference { path: cycle });
        }

        let mut bindings = IndexMap::with_capacity(self.arguments.len());
        for (argument, value) in self.arguments.iter().zip(argument_values) {
            bindings.insert(argument.clone(), value.render(context, path)?);
        }

        path.push(self.name.clone());
        let rendered = self.body.root().render(&context.with_bindings(bindings.clone()), path);
        path.pop();

        let instance = Instance::new(self.symbol(&bindings), rendered?);
        debug!(function = %self.name, instance = %instance.name, "expanded function");
        Ok(instance)
    }

    /// The symbolic name of this function with the given argument bindings.
    fn symbol(&self, bindings: &IndexMap<String, String>) -> String {
        if bindings.is_empty() {
            return self.name.clone();
        }
        let codes: Vec<String> = bindings
            .iter()
            .map(|(argument, value)| symbol_code(&format!("{}={}", argument, value)))
            .collect();
        format!("{}@{}", self.name, codes.join("."))
    }
}

impl fmt::Display for ExpressionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function '{}'", self.name)
    }
}

fn check_argument_types(
    function: &str,
    arguments: &[String],
    argument_types: &IndexMap<String, TensorType>,
) -> Result<(), IrError> {
    let unknown: Vec<String> = argument_types
        .keys()
        .filter(|key| !arguments.contains(*key))
        .cloned()
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(IrError::MalformedFunctionDeclaration {
            function: function.to_string(),
            unknown,
        })
    }
}

/// 64-bit digest of `text` as 16 lower-case hex digits: the first eight bytes of its SHA-1.
pub fn symbol_code(text: &str) -> String {
    let digest = Sha1::digest(text.as_bytes());
    hex::encode(&digest[..8])
}

/// A function with its arguments bound: a symbolic name and the fully substituted body text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    name: String,
    expression: String,
}

impl Instance {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Instance {
            name: name.into(),
            expression: expression.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}
