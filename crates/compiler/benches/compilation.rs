//! Performance benchmarks for the Control Path native compiler
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.
//!
//! Measures parsing, compilation, bundle serialization and evaluation for
//! namespaces with different numbers of config functions.

use controlpath_native::ast::Bundle;
use controlpath_native::{
    compile_namespace, compile_source, evaluate, parse_source, serialize_bundle, CompileOptions,
    Context,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate a namespace source file with `count` config functions
fn generate_namespace(count: usize) -> String {
    let mut functions = Vec::new();

    for i in 0..count {
        let function = if i % 4 == 0 {
            // Equality chain
            format!(
                r#"export function getFlag{i}({{ country, plan }}: {{ country: string; plan: string }}): boolean {{
  if (country === "US" && plan === "pro") {{
    return true;
  }} else if (["CA", "MX"].includes(country)) {{
    return true;
  }}
  return false;
}}"#,
                i = to_letters(i)
            )
        } else if i % 4 == 1 {
            // Percentage rollout
            format!(
                r#"export function getFlag{i}({{ userId }}: {{ userId: string }}): boolean {{
  if (bucket(userId, 25)) {{
    return true;
  }}
  return false;
}}"#,
                i = to_letters(i)
            )
        } else if i % 4 == 2 {
            // Numeric thresholds
            format!(
                r#"export function getFlag{i}({{ age }}: {{ age: number }}): number {{
  if (age >= 65) {{
    return 0.3;
  }} else if (age < 18) {{
    return 0.1;
  }}
  return 0;
}}"#,
                i = to_letters(i)
            )
        } else {
            // Default only
            format!(
                "export function getFlag{i}(): string {{\n  return \"variation-a\";\n}}",
                i = to_letters(i)
            )
        };
        functions.push(function);
    }

    functions.join("\n\n")
}

/// Function names only allow letters, so indices are spelled out.
fn to_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (index % 26) as u8));
        index /= 26;
        if index == 0 {
            break;
        }
    }
    letters.iter().rev().collect()
}

/// Benchmark parsing performance
fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    group.sample_size(20);

    for count in [10, 50, 100, 250, 500] {
        let text = generate_namespace(count);
        group.bench_with_input(BenchmarkId::new("parse_source", count), &text, |b, text| {
            b.iter(|| {
                let source = parse_source(black_box(text), "bench.ts")
                    .expect("Parsing should succeed in benchmarks");
                black_box(source)
            });
        });
    }

    group.finish();
}

/// Benchmark compilation time for different function counts
fn benchmark_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compilation");
    group.sample_size(20);

    for count in [10, 50, 100, 250, 500] {
        let source = parse_source(&generate_namespace(count), "bench.ts")
            .expect("Parsing should succeed in benchmarks");
        group.bench_with_input(BenchmarkId::new("compile", count), &source, |b, source| {
            b.iter(|| {
                let namespace =
                    compile_namespace(black_box(source), "bench", &CompileOptions::default())
                        .expect("Compilation should succeed in benchmarks");
                black_box(namespace)
            });
        });
    }

    group.finish();
}

/// Benchmark full pipeline (parse + compile + serialize)
fn benchmark_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    group.sample_size(20);

    for count in [10, 50, 100, 250, 500] {
        let text = generate_namespace(count);
        group.bench_with_input(
            BenchmarkId::new("parse_compile_serialize", count),
            &text,
            |b, text| {
                b.iter(|| {
                    let namespace = compile_source(black_box(text), "bench.ts", "bench")
                        .expect("Compilation should succeed in benchmarks");
                    let bytes = serialize_bundle(&Bundle::new(vec![namespace]))
                        .expect("Serialization should succeed in benchmarks");
                    black_box(bytes)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark evaluating every config of a namespace against one context
fn benchmark_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");

    let context = Context::builder()
        .set("country", "MX")
        .set("plan", "free")
        .set("user_id", "user-42")
        .set("age", 70_i64)
        .build();

    for count in [10, 100, 500] {
        let namespace = compile_source(&generate_namespace(count), "bench.ts", "bench")
            .expect("Compilation should succeed in benchmarks");
        group.bench_with_input(
            BenchmarkId::new("evaluate_all", count),
            &namespace,
            |b, namespace| {
                b.iter(|| {
                    for config in &namespace.configs {
                        let result = evaluate(config, "bench", black_box(&context))
                            .expect("Evaluation should succeed in benchmarks");
                        black_box(result);
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_compilation,
    benchmark_full_pipeline,
    benchmark_evaluation
);
criterion_main!(benches);
