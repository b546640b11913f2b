//! Admission and classification benchmarks

use botgate::services::transport::{classify, RawResponse};
use botgate::services::RateLimiter;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::time::Duration;

/// Admission on a bucket that never runs dry
fn bench_admit(c: &mut Criterion) {
    let limiter = RateLimiter::new(u32::MAX, Duration::from_secs(3600));

    c.bench_function("admit_with_tokens", |b| {
        b.iter(|| black_box(limiter.admit()))
    });

    let empty = RateLimiter::new(1, Duration::from_secs(3600));
    empty.admit();
    c.bench_function("admit_empty_bucket", |b| {
        b.iter(|| black_box(empty.admit()))
    });
}

/// Response classification for the common outcomes
fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let cases = vec![
        (
            "success",
            RawResponse::json(
                200,
                &json!({"ok": true, "result": {"message_id": 1, "date": 0, "chat": {"id": 1, "type": "private"}}}),
            ),
        ),
        (
            "app_level_rate_limit",
            RawResponse::json(
                200,
                &json!({"ok": false, "error_code": 429, "parameters": {"retry_after": 3}}),
            ),
        ),
        ("http_500", RawResponse::new(500, "<html>Internal Server Error</html>")),
    ];

    for (name, raw) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &raw, |b, raw| {
            b.iter(|| black_box(classify(raw)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_admit, bench_classify);
criterion_main!(benches);
