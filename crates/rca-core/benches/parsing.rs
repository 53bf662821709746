//! Benchmark for log parsing operations
//! Run: cargo bench -p rca-core --bench parsing

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rca_core::ingestion;
use rca_core::ingestion::text::{parse_text, TextFormat};
use std::hint::black_box;

const APACHE_LOG: &str =
    "[Tue Feb 10 14:30:45 2026] [error] Failed to connect to database: connection refused";
const NGINX_LOG: &str = r#"192.168.1.50 - alice [10/Feb/2026:14:30:45 +0000] "GET /api/users/123 HTTP/1.1" 500 1234 "-" "Mozilla/5.0""#;
const SYSLOG_LOG: &str =
    "Feb 10 14:30:45 server-01 sshd[12345]: Failed password for invalid user admin from 10.0.0.1 port 22";
const JSONL_LINE: &str = r#"{"service":"payments","level":"error","message":"connection timeout","timestamp":"2026-02-10T14:30:45Z"}"#;

fn bench_apache_parser(c: &mut Criterion) {
    c.bench_function("apache_parser_single", |b| {
        b.iter(|| parse_text(black_box(APACHE_LOG), Some(TextFormat::Apache)))
    });
}

fn bench_nginx_parser(c: &mut Criterion) {
    c.bench_function("nginx_parser_single", |b| {
        b.iter(|| parse_text(black_box(NGINX_LOG), Some(TextFormat::Nginx)))
    });
}

fn bench_syslog_parser(c: &mut Criterion) {
    c.bench_function("syslog_parser_single", |b| {
        b.iter(|| parse_text(black_box(SYSLOG_LOG), Some(TextFormat::Syslog)))
    });
}

fn bench_auto_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_detect");
    group.bench_function("apache", |b| b.iter(|| parse_text(black_box(APACHE_LOG), None)));
    group.bench_function("nginx", |b| b.iter(|| parse_text(black_box(NGINX_LOG), None)));
    group.bench_function("syslog", |b| b.iter(|| parse_text(black_box(SYSLOG_LOG), None)));
    group.finish();
}

fn bench_jsonl_parsing(c: &mut Criterion) {
    c.bench_function("jsonl_parse_single", |b| {
        b.iter(|| rca_core::ingestion::jsonl::parse_jsonl(black_box(JSONL_LINE), false))
    });
}

fn bench_batch_parsing(c: &mut Criterion) {
    let batch_sizes = [10, 100, 1000, 10000];

    let mut group = c.benchmark_group("batch_parsing");

    for size in batch_sizes {
        let text = (0..size)
            .map(|i| {
                format!(
                    r#"192.168.1.{} - user{} [10/Feb/2026:14:30:45 +0000] "GET /api/test/{} HTTP/1.1" 200 1234 "-" "Mozilla/5.0""#,
                    i % 255,
                    i,
                    i
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("nginx", size), &text, |b, text| {
            b.iter(|| parse_text(black_box(text), Some(TextFormat::Nginx)))
        });
    }

    group.finish();
}

fn bench_format_detection(c: &mut Criterion) {
    c.bench_function("detect_format_from_extension", |b| {
        b.iter(|| ingestion::detect_format(black_box("events.jsonl")))
    });
}

criterion_group!(
    benches,
    bench_apache_parser,
    bench_nginx_parser,
    bench_syslog_parser,
    bench_auto_detect,
    bench_jsonl_parsing,
    bench_batch_parsing,
    bench_format_detection,
);

criterion_main!(benches);
