//! Benchmarks for the pieces of the causal-reasoning façade that don't
//! require a live LLM provider: prompt construction and backoff math.
//! Run: cargo bench -p rca-llm --bench facade

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rca_core::analyzer::analyze_incident;
use rca_core::event::normalize;
use rca_core::grouping::IncidentGroup;
use rca_core::resilience::{calculate_backoff, RetryConfig};
use rca_llm::build_prompt;
use serde_json::json;
use std::collections::HashMap;
use std::hint::black_box;

fn sample_group(event_count: usize, service_count: usize) -> IncidentGroup {
    let events = (0..event_count)
        .map(|i| {
            let mut raw = HashMap::new();
            raw.insert(
                "service".to_string(),
                json!(format!("service-{}", i % service_count)),
            );
            raw.insert("level".to_string(), json!("ERROR"));
            raw.insert("message".to_string(), json!("connection timeout"));
            raw.insert(
                "timestamp".to_string(),
                json!(format!("2025-01-01T10:{:02}:{:02}Z", i / 60 % 60, i % 60)),
            );
            normalize(raw).unwrap()
        })
        .collect();
    IncidentGroup::from_events(events)
}

fn bench_prompt_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_prompt");
    for &(events, services) in &[(10, 1), (100, 5), (1000, 20)] {
        let incident_group = sample_group(events, services);
        let result = analyze_incident(&incident_group);

        group.bench_with_input(
            BenchmarkId::new("events", events),
            &result,
            |b, result| b.iter(|| black_box(build_prompt(result))),
        );
    }
    group.finish();
}

fn bench_backoff_calculation(c: &mut Criterion) {
    let config = RetryConfig::default();
    c.bench_function("calculate_backoff", |b| {
        b.iter(|| {
            for attempt in 0..5u32 {
                black_box(calculate_backoff(attempt, &config));
            }
        })
    });
}

criterion_group!(benches, bench_prompt_construction, bench_backoff_calculation);
criterion_main!(benches);
