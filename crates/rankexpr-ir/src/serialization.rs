//! Rendering expression trees to their canonical text form.
//!
//! Rendering happens in a [`SerializationContext`] holding the functions that
//! may be called, the argument bindings of the function currently being
//! expanded, and the instances expanded so far. A call to a known function is
//! expanded into an [`Instance`](crate::Instance), recorded once under its
//! symbolic name, and rendered as `rankingExpression(<symbol>)`. Calls made with
//! the same rendered arguments share one instance.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::IrError;
use crate::expr::{ExpressionNode, JoinFunction, Reference, ReferenceKind};
use crate::function::ExpressionFunction;

#[derive(Clone, Debug, Default)]
pub struct SerializationContext {
    functions: Rc<IndexMap<String, ExpressionFunction>>,
    bindings: IndexMap<String, String>,
    serialized: Rc<RefCell<IndexMap<String, String>>>,
}

impl SerializationContext {
    /// A context without functions or bindings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_functions(functions: impl IntoIterator<Item = ExpressionFunction>) -> Self {
        SerializationContext {
            functions: Rc::new(
                functions
                    .into_iter()
                    .map(|f| (f.name().to_string(), f))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// A context sharing this one's functions and recorded instances, with
    /// `bindings` replacing the current argument bindings.
    pub fn with_bindings(&self, bindings: IndexMap<String, String>) -> Self {
        SerializationContext {
            functions: Rc::clone(&self.functions),
            bindings,
            serialized: Rc::clone(&self.serialized),
        }
    }

    pub fn function(&self, name: &str) -> Option<&ExpressionFunction> {
        self.functions.get(name)
    }

    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    /// Records the expression text of an expanded instance.
    pub fn add_function_serialization(&self, name: impl Into<String>, expression: impl Into<String>) {
        self.serialized
            .borrow_mut()
            .insert(name.into(), expression.into());
    }

    /// Expanded instances, by symbolic name, in the order first expanded.
    pub fn function_serializations(&self) -> IndexMap<String, String> {
        self.serialized.borrow().clone()
    }
}

impl ExpressionNode {
    /// Renders this node in `context`, expanding calls to the context's functions.
    pub fn render(
        &self,
        context: &SerializationContext,
        path: &mut Vec<String>,
    ) -> Result<String, IrError> {
        let mut out = String::new();
        self.write(&mut out, Some(context), path)?;
        Ok(out)
    }

    pub(crate) fn write(
        &self,
        out: &mut String,
        context: Option<&SerializationContext>,
        path: &mut Vec<String>,
    ) -> Result<(), IrError> {
        match self {
            ExpressionNode::Constant(value) => {
                let _ = write!(out, "{}", value);
            }
            ExpressionNode::Reference(reference) => write_reference(reference, out, context, path)?,
            ExpressionNode::Arithmetic {
                operator,
                left,
                right,
            } => {
                write_operand(left, out, context, path)?;
                let _ = write!(out, " {} ", operator.symbol());
                write_operand(right, out, context, path)?;
            }
            ExpressionNode::Join {
                left,
                right,
                function,
            } => {
                out.push_str("join(");
                left.write(out, context, path)?;
                out.push_str(", ");
                right.write(out, context, path)?;
                let _ = write!(out, ", {})", lambda(*function));
            }
            ExpressionNode::Reduce {
                argument,
                aggregator,
                dimensions,
            } => {
                out.push_str("reduce(");
                argument.write(out, context, path)?;
                let _ = write!(out, ", {}", aggregator.name());
                for dimension in dimensions {
                    let _ = write!(out, ", {}", dimension);
                }
                out.push(')');
            }
            ExpressionNode::Rename { argument, from, to } => {
                out.push_str("rename(");
                argument.write(out, context, path)?;
                let _ = write!(out, ", {}, {})", name_list(from), name_list(to));
            }
            ExpressionNode::Map { argument, function } => {
                out.push_str("map(");
                argument.write(out, context, path)?;
                let _ = write!(out, ", f(a)({}(a)))", function.name());
            }
        }
        Ok(())
    }
}

/// Arithmetic operands are parenthesized when they are themselves arithmetic.
fn write_operand(
    operand: &ExpressionNode,
    out: &mut String,
    context: Option<&SerializationContext>,
    path: &mut Vec<String>,
) -> Result<(), IrError> {
    if matches!(operand, ExpressionNode::Arithmetic { .. }) {
        out.push('(');
        operand.write(out, context, path)?;
        out.push(')');
        Ok(())
    } else {
        operand.write(out, context, path)
    }
}

fn write_reference(
    reference: &Reference,
    out: &mut String,
    context: Option<&SerializationContext>,
    path: &mut Vec<String>,
) -> Result<(), IrError> {
    let name = reference.name();
    match reference.kind() {
        ReferenceKind::Attribute => {
            let _ = write!(out, "attribute({})", name);
        }
        ReferenceKind::Query => {
            let _ = write!(out, "query({})", name);
        }
        ReferenceKind::Constant => {
            let _ = write!(out, "constant({})", name);
        }
        ReferenceKind::Function => {
            if let Some(context) = context {
                if reference.arguments().is_empty() {
                    if let Some(bound) = context.binding(name) {
                        out.push_str(bound);
                        return Ok(());
                    }
                }
                if let Some(function) = context.function(name) {
                    let instance = function.expand(context, reference.arguments(), path)?;
                    let _ = write!(out, "rankingExpression({})", instance.name());
                    context.add_function_serialization(instance.name(), instance.expression());
                    return Ok(());
                }
            }
            out.push_str(name);
            if !reference.arguments().is_empty() {
                out.push('(');
                for (i, argument) in reference.arguments().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    argument.write(out, context, path)?;
                }
                out.push(')');
            }
        }
    }
    Ok(())
}

fn lambda(function: JoinFunction) -> &'static str {
    match function {
        JoinFunction::Add => "f(a,b)(a + b)",
        JoinFunction::Subtract => "f(a,b)(a - b)",
        JoinFunction::Multiply => "f(a,b)(a * b)",
        JoinFunction::Divide => "f(a,b)(a / b)",
        JoinFunction::Power => "f(a,b)(pow(a, b))",
        JoinFunction::Max => "f(a,b)(max(a, b))",
        JoinFunction::Min => "f(a,b)(min(a, b))",
    }
}

fn name_list(names: &[String]) -> String {
    if names.len() == 1 {
        names[0].clone()
    } else {
        format!("({})", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Aggregator, RankingExpression};

    fn function(name: &str, arguments: &[&str], root: ExpressionNode) -> ExpressionFunction {
        ExpressionFunction::with_arguments(
            name,
            arguments.iter().map(|a| a.to_string()).collect(),
            RankingExpression::from_root(root),
        )
    }

    #[test]
    fn test_imported_model_text() {
        let product = ExpressionNode::join(
            ExpressionNode::rename(ExpressionNode::identifier("Placeholder"), ["d0", "d1"], ["d0", "d2"]),
            ExpressionNode::constant("test_Variable_read"),
            JoinFunction::Multiply,
        );
        let add = ExpressionNode::join(
            ExpressionNode::reduce(product, Aggregator::Sum, ["d2"]),
            ExpressionNode::constant("test_Variable_1_read"),
            JoinFunction::Add,
        );
        assert_eq!(
            add.to_string(),
            "join(reduce(join(rename(Placeholder, (d0, d1), (d0, d2)), constant(test_Variable_read), f(a,b)(a * b)), sum, d2), constant(test_Variable_1_read), f(a,b)(a + b))"
        );
    }

    #[test]
    fn test_nested_arithmetic_is_parenthesized() {
        let expr = ExpressionNode::mul(
            ExpressionNode::add(ExpressionNode::value(1.0), ExpressionNode::attribute("a")),
            ExpressionNode::value(2.5),
        );
        assert_eq!(expr.to_string(), "(1 + attribute(a)) * 2.5");
    }

    #[test]
    fn test_nested_calls_are_flattened() {
        let double = function(
            "double",
            &["x"],
            ExpressionNode::mul(ExpressionNode::identifier("x"), ExpressionNode::value(2.0)),
        );
        let outer = function(
            "outer",
            &["y"],
            ExpressionNode::function("double", vec![ExpressionNode::identifier("y")]),
        );
        let context = SerializationContext::with_functions(vec![double, outer]);

        let root = ExpressionNode::function("outer", vec![ExpressionNode::attribute("a")]);
        let text = root.render(&context, &mut Vec::new()).unwrap();

        let serialized = context.function_serializations();
        assert_eq!(serialized.len(), 2);
        let (double_name, double_text) = serialized.get_index(0).unwrap();
        assert!(double_name.starts_with("double@"));
        // the enclosing binding y=attribute(a) flows into the nested call
        assert_eq!(double_text, "attribute(a) * 2");
        let (outer_name, outer_text) = serialized.get_index(1).unwrap();
        assert_eq!(text, format!("rankingExpression({})", outer_name));
        assert_eq!(outer_text, &format!("rankingExpression({})", double_name));
    }

    #[test]
    fn test_identical_calls_share_an_instance() {
        let f = function(
            "f",
            &["x"],
            ExpressionNode::add(ExpressionNode::identifier("x"), ExpressionNode::value(1.0)),
        );
        let context = SerializationContext::with_functions(vec![f]);
        let call = || ExpressionNode::function("f", vec![ExpressionNode::attribute("a")]);
        let root = ExpressionNode::add(call(), call());
        root.render(&context, &mut Vec::new()).unwrap();
        assert_eq!(context.function_serializations().len(), 1);

        let other = ExpressionNode::function("f", vec![ExpressionNode::attribute("b")]);
        other.render(&context, &mut Vec::new()).unwrap();
        assert_eq!(context.function_serializations().len(), 2);
    }

    #[test]
    fn test_self_call_is_rejected() {
        let f = function("f", &[], ExpressionNode::identifier("f"));
        let context = SerializationContext::with_functions(vec![f]);
        let err = ExpressionNode::identifier("f")
            .render(&context, &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Invocation loop: f -> f");
    }
}
