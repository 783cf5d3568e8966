// Throughput of the layer engine and the full aggregator over synthetic Ruby sources

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use enforcer::layers::LayerEngine;
use enforcer::patterns::RuleSet;
use enforcer::report::{AnalyzeOptions, Aggregator};
use std::collections::BTreeMap;
use std::hint::black_box;
use std::path::{Path, PathBuf};

/// A class with `methods` methods, each with a loop, a query and some string noise
fn synthetic_source(methods: usize) -> String {
    let mut source = String::from("require 'json'\n\nclass Importer\n  LIMIT = 100\n\n");
    for i in 0..methods {
        source.push_str(&format!(
            "  def import_{i}(rows, opts = {{}})\n    \
             rows.each do |row|\n      \
             record = Record.find(row[:id])\n      \
             if record && row[:name] != \"unknown\"\n        \
             record.update(name: row[:name], note: \"imported\")\n      \
             end\n    \
             end\n    \
             puts \"done {i}\"\n  \
             end\n\n"
        ));
    }
    source.push_str("end\n");
    source
}

fn bench_layer_engine(c: &mut Criterion) {
    let engine = LayerEngine::default();
    let rules = RuleSet::builtin();
    let mut group = c.benchmark_group("layer_engine");

    for methods in [10, 50, 200] {
        let source = synthetic_source(methods);
        group.bench_with_input(BenchmarkId::from_parameter(methods), &source, |b, source| {
            b.iter(|| engine.check(black_box(source), &rules, Path::new("lib/importer.rb")))
        });
    }
    group.finish();
}

fn bench_project_analysis(c: &mut Criterion) {
    let aggregator = Aggregator::new(RuleSet::builtin());
    let options = AnalyzeOptions {
        include_smells: true,
        ..AnalyzeOptions::default()
    };
    let files: BTreeMap<PathBuf, String> = (0..20)
        .map(|i| (PathBuf::from(format!("lib/importer_{i}.rb")), synthetic_source(25)))
        .collect();

    c.bench_function("analyze_project_20_files", |b| {
        b.iter(|| aggregator.analyze_project(black_box(&files), &options))
    });
}

criterion_group!(benches, bench_layer_engine, bench_project_analysis);
criterion_main!(benches);
