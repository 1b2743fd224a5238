//! Type contexts: where references find their types.
//!
//! [`TypeContext`] is implemented by whatever owns the engine state an
//! expression is typed against. The ranking compiler implements it over a rank
//! profile; [`MapTypeContext`] is a plain in-memory implementation.
//! [`BoundTypeContext`] is the scope used while typing a function body.

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::expr::FunctionTypeKey;
use crate::function::ExpressionFunction;
use crate::tensor::TensorType;

/// Lookup of the types referenced from an expression.
pub trait TypeContext {
    fn attribute_type(&self, name: &str) -> Option<&TensorType>;

    fn query_type(&self, name: &str) -> Option<&TensorType>;

    fn constant_type(&self, name: &str) -> Option<&TensorType>;

    fn function(&self, name: &str) -> Option<&ExpressionFunction>;

    /// Type bound to a function argument in the current scope.
    fn argument_type(&self, _name: &str) -> Option<&TensorType> {
        None
    }

    /// Names of the functions currently being typed, outermost first.
    fn invocation_path(&self) -> Vec<String> {
        Vec::new()
    }

    fn cached_function_type(&self, _key: &FunctionTypeKey) -> Option<TensorType> {
        None
    }

    fn cache_function_type(&self, _key: FunctionTypeKey, _tensor_type: TensorType) {}
}

/// Scope of a function body: the function's argument bindings over a parent context.
///
/// Arguments of enclosing scopes are not visible; everything else is delegated.
pub struct BoundTypeContext<'a> {
    parent: &'a dyn TypeContext,
    function: String,
    bindings: IndexMap<String, TensorType>,
}

impl<'a> BoundTypeContext<'a> {
    pub fn new(
        parent: &'a dyn TypeContext,
        function: impl Into<String>,
        bindings: IndexMap<String, TensorType>,
    ) -> Self {
        BoundTypeContext {
            parent,
            function: function.into(),
            bindings,
        }
    }
}

impl TypeContext for BoundTypeContext<'_> {
    fn attribute_type(&self, name: &str) -> Option<&TensorType> {
        self.parent.attribute_type(name)
    }

    fn query_type(&self, name: &str) -> Option<&TensorType> {
        self.parent.query_type(name)
    }

    fn constant_type(&self, name: &str) -> Option<&TensorType> {
        self.parent.constant_type(name)
    }

    fn function(&self, name: &str) -> Option<&ExpressionFunction> {
        self.parent.function(name)
    }

    fn argument_type(&self, name: &str) -> Option<&TensorType> {
        self.bindings.get(name)
    }

    fn invocation_path(&self) -> Vec<String> {
        let mut path = self.parent.invocation_path();
        path.push(self.function.clone());
        path
    }

    fn cached_function_type(&self, key: &FunctionTypeKey) -> Option<TensorType> {
        self.parent.cached_function_type(key)
    }

    fn cache_function_type(&self, key: FunctionTypeKey, tensor_type: TensorType) {
        self.parent.cache_function_type(key, tensor_type)
    }
}

/// In-memory type context, filled in with builder methods.
///
/// ```
/// use rankexpr_ir::{ExpressionNode, MapTypeContext, TensorType};
///
/// let context = MapTypeContext::new()
///     .with_attribute("popularity", TensorType::empty());
/// let expr = ExpressionNode::mul(ExpressionNode::attribute("popularity"), ExpressionNode::value(2.0));
/// assert!(expr.tensor_type(&context).unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MapTypeContext {
    attributes: HashMap<String, TensorType>,
    queries: HashMap<String, TensorType>,
    constants: HashMap<String, TensorType>,
    functions: IndexMap<String, ExpressionFunction>,
    cache: RefCell<HashMap<FunctionTypeKey, TensorType>>,
}

impl MapTypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, tensor_type: TensorType) -> Self {
        self.attributes.insert(name.into(), tensor_type);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, tensor_type: TensorType) -> Self {
        self.queries.insert(name.into(), tensor_type);
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, tensor_type: TensorType) -> Self {
        self.constants.insert(name.into(), tensor_type);
        self
    }

    pub fn with_function(mut self, function: ExpressionFunction) -> Self {
        self.functions.insert(function.name().to_string(), function);
        self
    }

    /// Number of memoized function types.
    pub fn cached_types(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl TypeContext for MapTypeContext {
    fn attribute_type(&self, name: &str) -> Option<&TensorType> {
        self.attributes.get(name)
    }

    fn query_type(&self, name: &str) -> Option<&TensorType> {
        self.queries.get(name)
    }

    fn constant_type(&self, name: &str) -> Option<&TensorType> {
        self.constants.get(name)
    }

    fn function(&self, name: &str) -> Option<&ExpressionFunction> {
        self.functions.get(name)
    }

    fn cached_function_type(&self, key: &FunctionTypeKey) -> Option<TensorType> {
        self.cache.borrow().get(key).cloned()
    }

    fn cache_function_type(&self, key: FunctionTypeKey, tensor_type: TensorType) {
        self.cache.borrow_mut().insert(key, tensor_type);
    }
}
