//! # Ranking Expression IR
//!
//! **Tensor types, ranking expression trees and expression functions**
//!
//! This crate holds the data structures the ranking compiler types and
//! serializes: the algebra of tensor types, the expression tree, the contexts
//! expressions are typed against, and user-defined expression functions.
//!
//! ## Core Components
//!
//! ### Tensor Types ([`TensorType`])
//! The static type of every ranking value:
//! - **Mapped dimensions** `name{}` with string labels
//! - **Indexed dimensions** `name[N]` with a known size, or `name[]` unbound
//! - The empty type `tensor()` is the scalar (a double)
//! - Type operations mirroring the tensor operations: [`TensorType::join`],
//!   [`TensorType::reduce`] and [`TensorType::rename`]
//!
//! ### Expressions ([`ExpressionNode`], [`RankingExpression`])
//! - **Leaves**: numeric literals and [`Reference`]s to attributes, query
//!   parameters, constants, function calls and bound arguments
//! - **Tensor operations**: join, reduce, rename and map
//! - Static typing with [`ExpressionNode::tensor_type`]
//!
//! ### Type Contexts ([`TypeContext`])
//! Where references find their types. [`MapTypeContext`] is a standalone
//! implementation; the compiler implements the trait over a rank profile.
//!
//! ### Functions ([`ExpressionFunction`])
//! Named, optionally parameterized expressions with optional declared types.
//! [`ExpressionFunction::expand`] binds argument values and produces an
//! [`Instance`] named by a digest of the bound argument text.
//!
//! ## Quick Start
//!
//! ```rust
//! use rankexpr_ir::{Aggregator, ExpressionNode, JoinFunction, MapTypeContext, TensorType};
//!
//! let context = MapTypeContext::new()
//!     .with_query("input", "tensor(d0[],d1[784])".parse().unwrap())
//!     .with_constant("weights", "tensor(d1[784],d2[10])".parse().unwrap());
//!
//! let product = ExpressionNode::join(
//!     ExpressionNode::query("input"),
//!     ExpressionNode::constant("weights"),
//!     JoinFunction::Multiply,
//! );
//! let logits = ExpressionNode::reduce(product, Aggregator::Sum, ["d1"]);
//!
//! let tensor_type = logits.tensor_type(&context).unwrap();
//! assert_eq!(tensor_type.to_string(), "tensor(d0[],d2[10])");
//! ```

mod context;
mod display;
mod error;
mod expr;
mod function;
pub mod serialization;
mod tensor;

#[cfg(test)]
mod tests;

pub use context::{BoundTypeContext, MapTypeContext, TypeContext};
pub use error::IrError;
pub use expr::{
    Aggregator, ArithmeticOperator, ExpressionNode, FunctionTypeKey, JoinFunction, MapFunction,
    RankingExpression, Reference, ReferenceKind,
};
pub use function::{symbol_code, ExpressionFunction, Instance};
pub use serialization::SerializationContext;
pub use tensor::{Dimension, DimensionKind, Tensor, TensorCell, TensorType, TensorTypeBuilder};
