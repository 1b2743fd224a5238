//! Imported Model Construction
//!
//! Machine-learned models are brought into ranking as an [`ImportedModel`]:
//! a framework-specific graph reader (not part of this crate) fills one in
//! through its mutating accessors, after which the model is read-only and
//! [`ImportedModel::output_expressions`] yields the functions to add to a
//! rank profile.
//!
//! ## Examples
//!
//! ```
//! use rankexpr_compiler::import::ImportedModel;
//! use rankexpr_ir::{ExpressionNode, RankingExpression};
//!
//! let mut model = ImportedModel::new("mnist_softmax", "models/mnist_softmax").unwrap();
//! model.input("Placeholder", "tensor(d0[],d1[784])".parse().unwrap());
//! model.expression(
//!     "add",
//!     RankingExpression::from_root(ExpressionNode::identifier("Placeholder")),
//! );
//! let signature = model.signature_mut("serving_default");
//! signature.input("x", "Placeholder");
//! signature.output("y", "add");
//!
//! let outputs = model.output_expressions().unwrap();
//! assert_eq!(outputs[0].0, "serving_default.y");
//! assert_eq!(outputs[0].1.arguments(), ["x"]);
//! ```

mod model;
mod signature;

pub use model::ImportedModel;
pub use signature::Signature;
