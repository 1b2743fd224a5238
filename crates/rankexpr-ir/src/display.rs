//! Display trait implementations for IR types.
//!
//! Tensor types print in their canonical `tensor(...)` form. Expressions print
//! as ranking expression text without expanding function calls; use
//! [`ExpressionNode::render`] for the expanded form.

use std::fmt;

use crate::expr::{ExpressionNode, RankingExpression, Reference, ReferenceKind};
use crate::tensor::{Dimension, DimensionKind, TensorType};

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind(), self.size()) {
            (DimensionKind::Mapped, _) => write!(f, "{}{{}}", self.name()),
            (DimensionKind::Indexed, Some(size)) => write!(f, "{}[{}]", self.name(), size),
            (DimensionKind::Indexed, None) => write!(f, "{}[]", self.name()),
        }
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor(")?;
        for (i, dimension) in self.dimensions().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", dimension)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ReferenceKind::Attribute => write!(f, "attribute({})", self.name()),
            ReferenceKind::Query => write!(f, "query({})", self.name()),
            ReferenceKind::Constant => write!(f, "constant({})", self.name()),
            ReferenceKind::Function => {
                write!(f, "{}", self.name())?;
                if self.arguments().is_empty() {
                    return Ok(());
                }
                write!(f, "(")?;
                for (i, argument) in self.arguments().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        // without a context nothing is expanded, so writing cannot fail
        self.write(&mut out, None, &mut Vec::new())
            .map_err(|_| fmt::Error)?;
        f.write_str(&out)
    }
}

impl fmt::Display for RankingExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root())
    }
}
