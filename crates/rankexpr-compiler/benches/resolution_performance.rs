//! Type resolution benchmarks.
//!
//! Measures resolution time for profiles with growing numbers of functions,
//! sequentially and across profiles in parallel.
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rankexpr_compiler::parallel::ParallelResolver;
use rankexpr_compiler::{
    QueryProfileRegistry, RankProfile, RankProfileRegistry, RankingExpressionTypeResolver, Schema,
};
use rankexpr_ir::{
    Aggregator, ExpressionFunction, ExpressionNode, JoinFunction, RankingExpression, TensorType,
};

fn schema() -> Schema {
    Schema::new("bench")
        .with_attribute("embedding", "tensor(x[128])".parse().unwrap())
        .with_attribute("popularity", TensorType::empty())
}

fn queries() -> QueryProfileRegistry {
    QueryProfileRegistry::new().with_parameter("query_embedding", "tensor(x[128])".parse().unwrap())
}

/// A chain of functions where each one calls the previous one.
fn profile(name: &str, functions: usize) -> RankProfile {
    let dot = ExpressionNode::reduce(
        ExpressionNode::join(
            ExpressionNode::attribute("embedding"),
            ExpressionNode::query("query_embedding"),
            JoinFunction::Multiply,
        ),
        Aggregator::Sum,
        Vec::<String>::new(),
    );
    let mut profile =
        RankProfile::new(name).with_function(ExpressionFunction::new("f0", RankingExpression::from_root(dot)));
    for i in 1..functions {
        let body = ExpressionNode::add(
            ExpressionNode::identifier(format!("f{}", i - 1)),
            ExpressionNode::mul(ExpressionNode::attribute("popularity"), ExpressionNode::value(i as f64)),
        );
        profile = profile.with_function(ExpressionFunction::new(
            format!("f{}", i),
            RankingExpression::from_root(body),
        ));
    }
    profile.with_first_phase(RankingExpression::from_root(ExpressionNode::identifier(format!(
        "f{}",
        functions - 1
    ))))
}

fn bench_function_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("function_chain");
    let schema = schema();
    let queries = queries();
    let resolver = RankingExpressionTypeResolver::new(&schema, &queries);

    for size in [10, 100, 1000] {
        let mut profile = profile("chain", size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                resolver.resolve_profile(black_box(&mut profile)).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_parallel_profiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_profiles");
    let schema = schema();
    let queries = queries();

    for profiles in [4, 32] {
        let mut registry = RankProfileRegistry::new();
        for i in 0..profiles {
            registry.add("bench", profile(&format!("p{}", i), 100));
        }
        group.bench_with_input(BenchmarkId::new("sequential", profiles), &profiles, |b, _| {
            let resolver = RankingExpressionTypeResolver::new(&schema, &queries);
            b.iter(|| black_box(resolver.process(&mut registry).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("parallel", profiles), &profiles, |b, _| {
            let resolver = ParallelResolver::new();
            b.iter(|| black_box(resolver.process(&schema, &queries, &mut registry).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_function_chain, bench_parallel_profiles);
criterion_main!(benches);
