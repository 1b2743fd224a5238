//! Unit tests for the IR.

use indexmap::IndexMap;

use crate::{
    symbol_code, Aggregator, ExpressionFunction, ExpressionNode, IrError, JoinFunction,
    MapFunction, MapTypeContext, RankingExpression, SerializationContext, TensorType,
};

fn ty(spec: &str) -> TensorType {
    spec.parse().unwrap()
}

fn arguments(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// `layer(x) = join(reduce(join(x, constant(w), *), sum, d1), constant(b), +)`
fn layer() -> ExpressionFunction {
    let product = ExpressionNode::join(
        ExpressionNode::identifier("x"),
        ExpressionNode::constant("w"),
        JoinFunction::Multiply,
    );
    ExpressionFunction::with_arguments(
        "layer",
        arguments(&["x"]),
        RankingExpression::from_root(ExpressionNode::join(
            ExpressionNode::reduce(product, Aggregator::Sum, ["d1"]),
            ExpressionNode::constant("b"),
            JoinFunction::Add,
        )),
    )
}

#[test]
fn test_typed_and_rendered_consistently() {
    let context = MapTypeContext::new()
        .with_query("input", ty("tensor(d0[],d1[4])"))
        .with_constant("w", ty("tensor(d1[4],d2[3])"))
        .with_constant("b", ty("tensor(d2[3])"))
        .with_function(layer());

    let call = ExpressionNode::function(
        "layer",
        vec![ExpressionNode::map(ExpressionNode::query("input"), MapFunction::Relu)],
    );
    assert_eq!(call.tensor_type(&context).unwrap(), ty("tensor(d0[],d2[3])"));

    let serialization = SerializationContext::with_functions(vec![layer()]);
    let text = call.render(&serialization, &mut Vec::new()).unwrap();
    let instances = serialization.function_serializations();
    let (name, body) = instances.get_index(0).unwrap();
    assert_eq!(text, format!("rankingExpression({})", name));
    assert_eq!(
        name,
        &format!("layer@{}", symbol_code("x=map(query(input), f(a)(relu(a)))"))
    );
    assert_eq!(
        body,
        "join(reduce(join(map(query(input), f(a)(relu(a))), constant(w), f(a,b)(a * b)), sum, d1), constant(b), f(a,b)(a + b))"
    );
}

#[test]
fn test_scalar_function_times_scalar() {
    let context = MapTypeContext::new()
        .with_attribute("popularity", TensorType::empty())
        .with_function(ExpressionFunction::new(
            "boost",
            RankingExpression::from_root(ExpressionNode::value(1.5)),
        ));
    let expr = ExpressionNode::mul(
        ExpressionNode::identifier("boost"),
        ExpressionNode::attribute("popularity"),
    );
    assert!(expr.tensor_type(&context).unwrap().is_empty());
}

#[test]
fn test_join_failure_names_the_function() {
    let f = ExpressionFunction::new(
        "mismatch",
        RankingExpression::from_root(ExpressionNode::add(
            ExpressionNode::attribute("a"),
            ExpressionNode::attribute("b"),
        )),
    );
    let context = MapTypeContext::new()
        .with_attribute("a", ty("tensor(x[2])"))
        .with_attribute("b", ty("tensor(x[3])"))
        .with_function(f);
    let err = ExpressionNode::identifier("mismatch")
        .tensor_type(&context)
        .unwrap_err();
    assert_eq!(err.to_string(), "The function 'mismatch' is invalid");
    assert!(matches!(err.root_cause(), IrError::IncompatibleTypes { .. }));
}

#[test]
fn test_function_serializes_with_serde() {
    let types: IndexMap<String, TensorType> =
        [("x".to_string(), ty("tensor(d0[],d1[4])"))].into_iter().collect();
    let f = ExpressionFunction::try_new(
        "layer",
        arguments(&["x"]),
        layer().body().clone(),
        types,
        Some(ty("tensor(d0[],d2[3])")),
    )
    .unwrap();
    let json = serde_json::to_string(&f).unwrap();
    let back: ExpressionFunction = serde_json::from_str(&json).unwrap();
    assert_eq!(back, f);
}
