//! Integration tests for imported models.
//!
//! The models here are assembled by hand the way a graph reader assembles
//! them, then turned into ranking functions.

use rankexpr_compiler::{ImportConfig, ImportedModel};
use rankexpr_ir::{
    Aggregator, ExpressionNode, IrError, JoinFunction, MapTypeContext, RankingExpression,
    SerializationContext, Tensor, TensorType,
};

fn ty(spec: &str) -> TensorType {
    spec.parse().unwrap()
}

/// `add = reduce(rename(Placeholder) * weights, sum, d2) + bias`
fn softmax_regression() -> RankingExpression {
    let product = ExpressionNode::join(
        ExpressionNode::rename(ExpressionNode::identifier("Placeholder"), ["d0", "d1"], ["d0", "d2"]),
        ExpressionNode::constant("test_Variable_read"),
        JoinFunction::Multiply,
    );
    RankingExpression::new(
        "add",
        ExpressionNode::join(
            ExpressionNode::reduce(product, Aggregator::Sum, ["d2"]),
            ExpressionNode::constant("test_Variable_1_read"),
            JoinFunction::Add,
        ),
    )
}

fn mnist() -> ImportedModel {
    let mut model = ImportedModel::new("mnist_softmax", "models/mnist_softmax/saved").unwrap();
    model.input("Placeholder", ty("tensor(d0[],d1[784])"));
    model.large_constant(
        "test_Variable_read",
        Tensor::dense(ty("tensor(d1[10],d2[784])"), vec![0.0; 7840]).unwrap(),
    );
    model.small_constant(
        "test_Variable_1_read",
        Tensor::dense(ty("tensor(d1[10])"), vec![0.0; 10]).unwrap(),
    );
    model.expression("add", softmax_regression());
    model
}

#[test]
fn test_signature_output_becomes_function() {
    let mut model = mnist();
    let signature = model.signature_mut("serving_default");
    signature.input("x", "Placeholder");
    signature.output("y", "add");

    let outputs = model.output_expressions().unwrap();
    assert_eq!(outputs.len(), 1);
    let (name, function) = &outputs[0];
    assert_eq!(name, "serving_default.y");
    assert_eq!(function.name(), "serving_default.y");
    assert_eq!(function.arguments(), ["x"]);
    assert_eq!(
        function.argument_types().get("x"),
        Some(&ty("tensor(d0[],d1[784])"))
    );
    assert_eq!(
        function.body().to_string(),
        "join(reduce(join(rename(Placeholder, (d0, d1), (d0, d2)), constant(test_Variable_read), f(a,b)(a * b)), sum, d2), constant(test_Variable_1_read), f(a,b)(a + b))"
    );
}

#[test]
fn test_invalid_model_name() {
    let err = ImportedModel::new("bad name!", "somewhere").unwrap_err();
    assert!(matches!(err, IrError::InvalidModelName { .. }));
    assert_eq!(
        err.to_string(),
        "An imported model name can only contain [A-Za-z0-9_], but is 'bad name!'"
    );
    assert!(ImportedModel::new("", "somewhere").is_ok());
    assert!(ImportedModel::new("Model_2", "somewhere").is_ok());
}

#[test]
fn test_signature_accessors() {
    let mut model = mnist();
    let signature = model.default_signature_mut();
    signature.input("x", "Placeholder");
    signature.output("y", "add");
    signature.skipped_output("z", "Unsupported operation Softmax");
    signature.import_warning("Ignoring dropout");

    let signature = model.signature("default").unwrap();
    assert_eq!(signature.to_string(), "signature 'default'");
    assert_eq!(
        signature.input_argument(&model, "x").unwrap(),
        &ty("tensor(d0[],d1[784])")
    );
    assert_eq!(signature.input_map(&model).unwrap().len(), 1);
    assert_eq!(
        signature.skipped_outputs().get("z").map(String::as_str),
        Some("Unsupported operation Softmax")
    );
    assert_eq!(signature.import_warnings(), ["Ignoring dropout"]);
    assert_eq!(signature.output_expression(&model, "y").unwrap().name(), "y");
}

#[test]
fn test_missing_output_expression() {
    let mut model = mnist();
    let signature = model.signature_mut("serving_default");
    signature.input("x", "Placeholder");
    signature.output("y", "softmax");

    let err = model.output_expressions().unwrap_err();
    assert_eq!(
        err.to_string(),
        "The model 'mnist_softmax' has no expression named 'softmax'"
    );
}

#[test]
fn test_signature_without_outputs_uses_expression_of_same_name() {
    let mut model = mnist();
    model.expression("scores", softmax_regression());
    model.signature_mut("scores").input("image", "Placeholder");

    let outputs = model.output_expressions().unwrap();
    assert_eq!(outputs.len(), 1);
    let (name, function) = &outputs[0];
    assert_eq!(name, "scores");
    assert_eq!(function.arguments(), ["image"]);
}

#[test]
fn test_signature_without_outputs_or_expression_fails() {
    let mut model = mnist();
    model.signature_mut("serving_default").input("x", "Placeholder");

    let err = model.output_expressions().unwrap_err();
    assert!(matches!(err, IrError::UnknownModelEntry { .. }));
    assert_eq!(
        err.to_string(),
        "The model 'mnist_softmax' has no expression named 'serving_default'"
    );
}

#[test]
fn test_deserialized_model_name_is_checked() {
    let model = mnist();
    let json = serde_json::to_string(&model).unwrap();
    let restored: ImportedModel = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.name(), "mnist_softmax");
    assert_eq!(restored.expressions().len(), 1);
    assert_eq!(
        restored.constant_type("test_Variable_read"),
        Some(&ty("tensor(d1[10],d2[784])"))
    );

    let renamed = json.replace(r#""name":"mnist_softmax""#, r#""name":"bad name!""#);
    let err = serde_json::from_str::<ImportedModel>(&renamed).unwrap_err();
    assert!(err.to_string().contains("can only contain [A-Za-z0-9_]"));
}

#[test]
fn test_single_expression_without_signatures() {
    let outputs = mnist().output_expressions().unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].0, "add");
    assert_eq!(outputs[0].1.arguments(), ["Placeholder"]);
}

#[test]
fn test_multiple_expressions_without_signatures_keep_all_inputs() {
    let mut model = mnist();
    model.input("unused", ty("tensor(d0[2])"));
    model.expression(
        "scaled",
        RankingExpression::from_root(ExpressionNode::mul(
            ExpressionNode::identifier("Placeholder"),
            ExpressionNode::value(0.5),
        )),
    );

    let outputs = model.output_expressions().unwrap();
    let names: Vec<&str> = outputs.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["add", "scaled"]);
    for (_, function) in &outputs {
        assert_eq!(function.arguments(), ["Placeholder", "unused"]);
        assert_eq!(function.argument_types().len(), 2);
    }
}

#[test]
fn test_constant_storage_by_size() {
    let config = ImportConfig::default().with_small_constant_max_cells(16);
    let mut model = ImportedModel::with_config("m", "src", config).unwrap();
    model.constant("bias", Tensor::dense(ty("tensor(d0[16])"), vec![1.0; 16]).unwrap());
    model.constant("weights", Tensor::dense(ty("tensor(d0[17])"), vec![1.0; 17]).unwrap());

    assert!(model.small_constants().contains_key("bias"));
    assert!(model.large_constants().contains_key("weights"));
    assert_eq!(model.constant_type("weights"), Some(&ty("tensor(d0[17])")));
    assert!(model.constant_type("nothing").is_none());
}

#[test]
fn test_output_function_types_when_called() {
    let mut model = mnist();
    let signature = model.signature_mut("serving_default");
    signature.input("Placeholder", "Placeholder");
    signature.output("y", "add");
    let (_, function) = model.output_expressions().unwrap().remove(0);

    let mut context = MapTypeContext::new().with_query("image", ty("tensor(d0[],d1[784])"));
    for (name, tensor) in model.small_constants().iter().chain(model.large_constants()) {
        context = context.with_constant(name.clone(), tensor.tensor_type().clone());
    }
    let context = context.with_function(function);

    let call = ExpressionNode::function("serving_default.y", vec![ExpressionNode::query("image")]);
    assert_eq!(call.tensor_type(&context).unwrap(), ty("tensor(d0[],d1[10])"));
}

#[test]
fn test_output_function_expands_with_bound_input() {
    let mut model = mnist();
    let signature = model.signature_mut("serving_default");
    signature.input("Placeholder", "Placeholder");
    signature.output("y", "add");
    let outputs = model.output_expressions().unwrap();

    let serialization =
        SerializationContext::with_functions(outputs.into_iter().map(|(_, function)| function));
    let call = ExpressionNode::function("serving_default.y", vec![ExpressionNode::query("image")]);
    let text = call.render(&serialization, &mut Vec::new()).unwrap();

    let instances = serialization.function_serializations();
    let (symbol, body) = instances.get_index(0).unwrap();
    assert!(symbol.starts_with("serving_default.y@"));
    assert_eq!(text, format!("rankingExpression({})", symbol));
    assert!(body.starts_with("join(reduce(join(rename(query(image), (d0, d1), (d0, d2))"));
}
