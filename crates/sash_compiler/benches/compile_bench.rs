//! Benchmark harness for the sash compiler.
//!
//! Uses criterion for reliable benchmarking.
//! Run with: cargo bench -p sash_compiler

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sash_ast::{BinaryOperator, SourceFile, Statement};
use sash_compiler::{compile_source_file, Program};
use sash_nodebuilder::NodeBuilder;
use sash_options::CompilerOptions;

/// A function holding a closure over a mutable local, driven by a loop.
fn counter_program(b: &NodeBuilder, index: usize) -> Vec<Statement> {
    let run = format!("run{index}");
    let loop_body = b.block_stmt(vec![
        b.let_var("v", None, b.call(b.var("step"), vec![b.int(2)])),
        b.if_stmt(
            b.and(
                b.binary(b.var("v"), BinaryOperator::Greater, b.int(4)),
                b.binary(b.var("v"), BinaryOperator::ExclamationEquals, b.int(8)),
            ),
            b.print(b.add(b.string("big "), b.string("value"))),
            None,
        ),
        b.expr_stmt(b.assign(b.var("i"), b.add(b.var("i"), b.int(1)))),
    ]);
    vec![
        b.function(
            &run,
            &[("start", "Int")],
            None,
            b.block(vec![
                b.def_var("n", None, b.var("start")),
                b.function(
                    "step",
                    &[("by", "Int")],
                    Some("Int"),
                    b.block(vec![
                        b.expr_stmt(b.assign(b.var("n"), b.add(b.var("n"), b.var("by")))),
                        b.return_stmt(Some(b.var("n"))),
                    ]),
                ),
                b.def_var("i", None, b.int(0)),
                b.while_stmt(b.binary(b.var("i"), BinaryOperator::Less, b.int(10)), loop_body),
            ]),
        ),
        b.expr_stmt(b.call(b.var(&run), vec![b.int(index as i32)])),
    ]
}

/// Generate a program with `count` independent counter blocks.
fn generate_program(count: usize) -> SourceFile {
    let b = NodeBuilder::new();
    let statements = (0..count).flat_map(|i| counter_program(&b, i)).collect();
    b.source_file("bench.sash", statements)
}

// ============================================================================
// Binder Benchmarks
// ============================================================================

fn bench_binder(c: &mut Criterion) {
    let mut group = c.benchmark_group("binder");

    let small = generate_program(1);
    group.bench_function("small", |b| {
        b.iter(|| sash_binder::bind_source_file(black_box(&small)));
    });

    let large = generate_program(100);
    group.bench_function("large", |b| {
        b.iter(|| sash_binder::bind_source_file(black_box(&large)));
    });

    group.finish();
}

// ============================================================================
// Emitter Benchmarks
// ============================================================================

fn bench_emitter(c: &mut Criterion) {
    let mut group = c.benchmark_group("emitter");

    let (large, diagnostics) = sash_binder::bind_source_file(&generate_program(100));
    assert!(diagnostics.is_empty());
    group.bench_function("large", |b| {
        b.iter(|| sash_emitter::emit(black_box(&large)));
    });

    group.finish();
}

// ============================================================================
// Full Pipeline Benchmarks
// ============================================================================

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");

    let medium = generate_program(10);
    group.bench_function("medium", |b| {
        b.iter(|| compile_source_file(black_box(&medium)));
    });

    group.bench_function("multiple_files", |b| {
        b.iter(|| {
            let mut program = Program::new(CompilerOptions::default());
            for _ in 0..10 {
                program.add_source_file(medium.clone());
            }
            black_box(program.emit())
        });
    });

    group.finish();
}

// ============================================================================
// Scaling Benchmarks
// ============================================================================

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for size in [10, 50, 100, 200] {
        let source = generate_program(size);
        group.bench_with_input(BenchmarkId::new("counters", size), &source, |b, source| {
            b.iter(|| compile_source_file(black_box(source)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_binder, bench_emitter, bench_full_pipeline, bench_scaling);
criterion_main!(benches);
