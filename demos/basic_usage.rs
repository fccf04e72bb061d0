// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic search-translator usage example.
//!
//! Demonstrates:
//! 1. Translating a `find()` filter with sort/limit directives
//! 2. Folding an aggregation pipeline
//! 3. Reading diagnostics for approximated constructs
//! 4. Full-text and prefix stage builders
//! 5. Displaying metrics
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use search_translator::{
    FindDirectives, PipelineOptions, PrefixOptions, SearchTranslator, TextOptions,
    TranslatorConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    // RUST_LOG=search_translator=debug shows fold decisions
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║         search-translator: Basic Usage Example                ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Configure the translator
    // ─────────────────────────────────────────────────────────────────────────
    println!("📦 Configuring translator...");
    let translator = SearchTranslator::new(TranslatorConfig {
        fold_projection: true,
        ..TranslatorConfig::for_index("orders")
    });
    println!("   └─ Index: {}", translator.index());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. find() filter + directives
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔍 Translating find() filter...");
    let filter = json!({
        "status": "shipped",
        "total": { "$gte": 100, "$lt": 1000 },
        "$or": [
            { "priority": true },
            { "tags": { "$in": ["express", "overnight"] } }
        ]
    });
    let translation = translator.translate_filter(
        &filter,
        &FindDirectives::new()
            .sort(json!({ "createdAt": -1 }))
            .skip(20)
            .limit(10),
    )?;
    println!("   ┌─ Input:  {}", filter);
    println!(
        "   └─ Output: {}",
        serde_json::to_string_pretty(&translation.output)?
    );

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Aggregation pipeline
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🧩 Folding aggregation pipeline...");
    let pipeline = json!([
        { "$match": { "customer.country": "GB", "deletedAt": null } },
        { "$sort": { "total": -1 } },
        { "$limit": 5 },
        { "$project": { "total": 1, "customer.name": 1 } },
        { "$group": { "_id": "$customer.name", "spent": { "$sum": "$total" } } }
    ]);
    let translation = translator.translate_pipeline(&pipeline, &PipelineOptions::default())?;
    println!("   ┌─ Stages in:  {}", pipeline.as_array().map_or(0, Vec::len));
    println!("   ├─ Stages out: {}", translation.output.len());
    println!(
        "   └─ Output: {}",
        serde_json::to_string_pretty(&translation.output)?
    );

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Diagnostics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n⚠️  Translating filter with approximations...");
    let translation = translator.translate_clause(&json!({
        "tags": ["a", "b"],
        "location": { "$near": [51.5, -0.1] },
        "name": { "$regex": "^al", "$options": "i" }
    }))?;
    println!("   ┌─ Exact: {}", translation.is_exact());
    for diagnostic in &translation.diagnostics {
        println!("   ├─ [{}] {}", diagnostic.kind(), diagnostic);
    }
    println!("   └─ Clause: {}", translation.output.to_value());

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Builders
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔤 Building full-text and prefix stages...");
    let text = translator.full_text(
        "wireless headphones",
        vec!["title".to_string(), "description".to_string()],
        &TextOptions::default().fuzzy(Default::default()).boost(2.0),
    );
    println!("   ├─ Full text: {}", text.to_value());
    let prefix = translator.prefix("head", "title", &PrefixOptions::default());
    println!("   └─ Prefix:    {}", prefix.to_value());

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Raw Metrics:");
    dump_metrics(&snapshotter);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

/// Dump all captured metrics grouped by kind
fn dump_metrics(snapshotter: &Snapshotter) {
    let snapshot = snapshotter.snapshot();

    let mut counters: Vec<_> = vec![];
    let mut histograms: Vec<_> = vec![];

    for (composite_key, _, _, value) in snapshot.into_vec() {
        let (_, key) = composite_key.into_parts();
        let name = key.name().to_string();
        let labels: Vec<_> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", labels.join(","))
        };

        match value {
            DebugValue::Counter(v) => counters.push((name, label_str, v)),
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name, label_str, count, sum));
            }
            DebugValue::Gauge(_) => {}
        }
    }

    counters.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    histograms.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    if !counters.is_empty() {
        println!("   ┌─ Counters (cumulative)");
        for (name, labels, value) in &counters {
            println!("   │  └─ {}{} = {}", name, labels, value);
        }
    }

    if !histograms.is_empty() {
        println!("   └─ Histograms (distributions)");
        for (name, labels, count, sum) in &histograms {
            println!("      └─ {}{} count={} sum={:.6}", name, labels, count, sum);
        }
    }

    if counters.is_empty() && histograms.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
}
