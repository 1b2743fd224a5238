//! Ranking expression trees.
//!
//! An [`ExpressionNode`] is an immutable tree of tensor and scalar operations.
//! Leaves are numeric constants or [`Reference`]s to engine state; inner nodes
//! combine, reduce, rename or map their operands. A [`RankingExpression`] pairs
//! a root node with a display name.
//!
//! Trees are built by an expression parser or by model import; this crate only
//! types and renders them.

mod typing;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::TypeContext;
use crate::error::IrError;
use crate::tensor::TensorType;

pub use typing::FunctionTypeKey;

/// What a [`Reference`] points at. Each kind resolves through its own
/// [`TypeContext`] lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// A document attribute, `attribute(name)`
    Attribute,
    /// A query parameter, `query(name)`
    Query,
    /// A named constant, `constant(name)`
    Constant,
    /// A user function call `name(args)`, or a bound argument when used bare
    Function,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Attribute => write!(f, "attribute"),
            ReferenceKind::Query => write!(f, "query parameter"),
            ReferenceKind::Constant => write!(f, "constant"),
            ReferenceKind::Function => write!(f, "function"),
        }
    }
}

/// A named placeholder resolved against engine state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    kind: ReferenceKind,
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    arguments: Vec<ExpressionNode>,
}

impl Reference {
    /// `attribute(name)`: a document attribute.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::simple(ReferenceKind::Attribute, name)
    }

    /// `query(name)`: a query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::simple(ReferenceKind::Query, name)
    }

    /// `constant(name)`: a profile, schema or model constant.
    pub fn constant(name: impl Into<String>) -> Self {
        Self::simple(ReferenceKind::Constant, name)
    }

    /// A call `name(arguments)` to a function of the enclosing profile.
    pub fn function(name: impl Into<String>, arguments: Vec<ExpressionNode>) -> Self {
        Reference {
            kind: ReferenceKind::Function,
            name: name.into(),
            arguments,
        }
    }

    /// A bare name: a bound function argument, or a function called without arguments.
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::function(name, Vec::new())
    }

    fn simple(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Reference {
            kind,
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call arguments. Empty for everything but function calls.
    pub fn arguments(&self) -> &[ExpressionNode] {
        &self.arguments
    }
}

/// Binary scalar operators usable between two expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl ArithmeticOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Subtract => "-",
            ArithmeticOperator::Multiply => "*",
            ArithmeticOperator::Divide => "/",
            ArithmeticOperator::Modulo => "%",
            ArithmeticOperator::Power => "^",
        }
    }
}

/// Scalar function combining the two cells matched up by a tensor join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinFunction {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Max,
    Min,
}

/// Scalar function applied to every cell by a tensor map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapFunction {
    Neg,
    Abs,
    Exp,
    Log,
    Sqrt,
    Relu,
    Sigmoid,
    Tanh,
}

impl MapFunction {
    pub fn name(&self) -> &'static str {
        match self {
            MapFunction::Neg => "neg",
            MapFunction::Abs => "abs",
            MapFunction::Exp => "exp",
            MapFunction::Log => "log",
            MapFunction::Sqrt => "sqrt",
            MapFunction::Relu => "relu",
            MapFunction::Sigmoid => "sigmoid",
            MapFunction::Tanh => "tanh",
        }
    }
}

/// Aggregation used by a tensor reduce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregator {
    Avg,
    Count,
    Max,
    Min,
    Prod,
    Sum,
}

impl Aggregator {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregator::Avg => "avg",
            Aggregator::Count => "count",
            Aggregator::Max => "max",
            Aggregator::Min => "min",
            Aggregator::Prod => "prod",
            Aggregator::Sum => "sum",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExpressionNode {
    /// Numeric literal
    Constant(f64),
    Reference(Reference),
    Arithmetic {
        operator: ArithmeticOperator,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },
    Join {
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
        function: JoinFunction,
    },
    /// Reduces the named dimensions, or all dimensions when `dimensions` is empty
    Reduce {
        argument: Box<ExpressionNode>,
        aggregator: Aggregator,
        dimensions: Vec<String>,
    },
    Rename {
        argument: Box<ExpressionNode>,
        from: Vec<String>,
        to: Vec<String>,
    },
    Map {
        argument: Box<ExpressionNode>,
        function: MapFunction,
    },
}

impl ExpressionNode {
    /// Create a numeric literal.
    pub fn value(value: f64) -> Self {
        ExpressionNode::Constant(value)
    }

    /// Create an attribute reference.
    pub fn attribute(name: impl Into<String>) -> Self {
        ExpressionNode::Reference(Reference::attribute(name))
    }

    /// Create a query parameter reference.
    pub fn query(name: impl Into<String>) -> Self {
        ExpressionNode::Reference(Reference::query(name))
    }

    /// Create a named constant reference.
    pub fn constant(name: impl Into<String>) -> Self {
        ExpressionNode::Reference(Reference::constant(name))
    }

    /// Create a function call.
    pub fn function(name: impl Into<String>, arguments: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Reference(Reference::function(name, arguments))
    }

    /// Create a bare name: a bound argument or an argument-less function call.
    pub fn identifier(name: impl Into<String>) -> Self {
        ExpressionNode::Reference(Reference::identifier(name))
    }

    /// Create a scalar arithmetic operation. Operands may be tensors; the
    /// result type is their join.
    pub fn arithmetic(
        operator: ArithmeticOperator,
        left: ExpressionNode,
        right: ExpressionNode,
    ) -> Self {
        ExpressionNode::Arithmetic {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create `left + right`.
    #[allow(clippy::should_implement_trait)]
    pub fn add(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::arithmetic(ArithmeticOperator::Add, left, right)
    }

    /// Create `left - right`.
    #[allow(clippy::should_implement_trait)]
    pub fn sub(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::arithmetic(ArithmeticOperator::Subtract, left, right)
    }

    /// Create `left * right`.
    #[allow(clippy::should_implement_trait)]
    pub fn mul(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::arithmetic(ArithmeticOperator::Multiply, left, right)
    }

    /// Create `left / right`.
    #[allow(clippy::should_implement_trait)]
    pub fn div(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::arithmetic(ArithmeticOperator::Divide, left, right)
    }

    /// Create a cell-wise join of two tensors.
    pub fn join(left: ExpressionNode, right: ExpressionNode, function: JoinFunction) -> Self {
        ExpressionNode::Join {
            left: Box::new(left),
            right: Box::new(right),
            function,
        }
    }

    /// Create a reduction over `dimensions`; no dimensions reduces all of them.
    pub fn reduce<S: Into<String>>(
        argument: ExpressionNode,
        aggregator: Aggregator,
        dimensions: impl IntoIterator<Item = S>,
    ) -> Self {
        ExpressionNode::Reduce {
            argument: Box::new(argument),
            aggregator,
            dimensions: dimensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a renaming of dimensions `from[i]` to `to[i]`.
    pub fn rename<S: Into<String>, T: Into<String>>(
        argument: ExpressionNode,
        from: impl IntoIterator<Item = S>,
        to: impl IntoIterator<Item = T>,
    ) -> Self {
        ExpressionNode::Rename {
            argument: Box::new(argument),
            from: from.into_iter().map(Into::into).collect(),
            to: to.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a cell-wise function application.
    pub fn map(argument: ExpressionNode, function: MapFunction) -> Self {
        ExpressionNode::Map {
            argument: Box::new(argument),
            function,
        }
    }

    /// Direct children of this node, including function-call arguments.
    pub fn children(&self) -> Vec<&ExpressionNode> {
        match self {
            ExpressionNode::Constant(_) => Vec::new(),
            ExpressionNode::Reference(reference) => reference.arguments.iter().collect(),
            ExpressionNode::Arithmetic { left, right, .. }
            | ExpressionNode::Join { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            ExpressionNode::Reduce { argument, .. }
            | ExpressionNode::Rename { argument, .. }
            | ExpressionNode::Map { argument, .. } => vec![argument.as_ref()],
        }
    }

    /// All references in this tree, in depth-first order.
    pub fn references(&self) -> Vec<&Reference> {
        let mut references = Vec::new();
        self.collect_references(&mut references);
        references
    }

    fn collect_references<'a>(&'a self, references: &mut Vec<&'a Reference>) {
        if let ExpressionNode::Reference(reference) = self {
            references.push(reference);
        }
        for child in self.children() {
            child.collect_references(references);
        }
    }
}

/// An expression tree with a name used in diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingExpression {
    name: String,
    root: ExpressionNode,
}

impl RankingExpression {
    pub fn new(name: impl Into<String>, root: ExpressionNode) -> Self {
        RankingExpression {
            name: name.into(),
            root,
        }
    }

    /// An unnamed expression.
    pub fn from_root(root: ExpressionNode) -> Self {
        Self::new("", root)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &ExpressionNode {
        &self.root
    }

    /// The type this expression produces in the given context.
    pub fn tensor_type(&self, context: &dyn TypeContext) -> Result<TensorType, IrError> {
        self.root.tensor_type(context)
    }
}
