// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Document analyzer benchmarks
//!
//! Measures:
//! - Full recognition of a multi-statement script
//! - Re-recognition after a typed character inside one statement
//! - Keyword completion at the end of a statement

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sqlscope_engine::{DocumentAnalyzer, EngineConfig};
use sqlscope_ir::Dialect;
use sqlscope_test_utils::{MockCatalogBuilder, SqlFixtures};

/// A script of `count` statements cycling through the fixtures
fn script(count: usize) -> String {
    let statements = [
        SqlFixtures::simple_select(),
        SqlFixtures::multiple_joins(),
        SqlFixtures::group_by_having(),
        SqlFixtures::with_cte(),
        SqlFixtures::simple_update(),
        SqlFixtures::correlated_subquery(),
    ];
    statements
        .iter()
        .cycle()
        .take(count)
        .map(|s| format!("{s};\n"))
        .collect()
}

fn analyzer(dialect: Dialect) -> DocumentAnalyzer {
    DocumentAnalyzer::new(EngineConfig::for_dialect(dialect))
        .with_snapshot(MockCatalogBuilder::new().with_standard_schema().snapshot())
}

fn bench_set_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("document/set_text");
    for count in [6, 60] {
        let text = script(count);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &text, |b, text| {
            let mut analyzer = analyzer(Dialect::PostgreSQL);
            b.iter(|| {
                analyzer.set_text(black_box(text));
                black_box(analyzer.context().len());
            });
        });
    }
    group.finish();
}

fn bench_typing(c: &mut Criterion) {
    let text = script(60);
    // inside the select list of the last statement
    let offset = text.rfind("SELECT").unwrap_or(0) + 7;

    c.bench_function("document/insert_character", |b| {
        let mut analyzer = analyzer(Dialect::MySQL);
        analyzer.set_text(&text);
        b.iter(|| {
            analyzer.apply_edit(offset, 0, "x").unwrap();
            analyzer.apply_edit(offset, 1, "").unwrap();
        });
    });
}

fn bench_completion(c: &mut Criterion) {
    let text = format!("{}SELECT * FROM users ", script(6));
    let offset = text.len();

    c.bench_function("document/complete_keywords", |b| {
        let mut analyzer = analyzer(Dialect::MySQL);
        analyzer.set_text(&text);
        b.iter(|| black_box(analyzer.complete_keywords_at(black_box(offset))));
    });
}

criterion_group!(benches, bench_set_text, bench_typing, bench_completion);
criterion_main!(benches);
