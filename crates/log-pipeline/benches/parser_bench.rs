//! 라인 파서 벤치마크
//!
//! 두 시간 형식과 메시지 길이별 `parse_line` 처리량을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use logconv_pipeline::parser::parse_line;

/// first 형식 짧은 라인
const FIRST_SHORT: &str = "2021-01-02 15:04:05 | user logged in";

/// second 형식 짧은 라인
const SECOND_SHORT: &str = "2021-01-02T15:04:05Z | disk almost full";

/// 메시지 안에 구분자가 여러 번 등장하는 긴 라인
const FIRST_LONG: &str = "2021-01-02 15:04:05 | request completed | method=POST | path=/api/v1/users/create | status=201 | duration_ms=245 | user_agent=Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 | region=us-east-1";

/// 구분자가 없는 잘못된 라인
const MALFORMED: &str = "bad-line-no-separator with some trailing text";

fn bench_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line");
    group.throughput(Throughput::Elements(1));

    for (name, line, format) in [
        ("first_short", FIRST_SHORT, "first"),
        ("second_short", SECOND_SHORT, "second"),
        ("first_long", FIRST_LONG, "first"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(line, format), |b, (line, format)| {
            b.iter(|| parse_line("bench.log", black_box(line), black_box(format), 1).unwrap())
        });
    }

    group.finish();
}

fn bench_errors(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line_errors");

    group.bench_function("malformed_structure", |b| {
        b.iter(|| parse_line("bench.log", black_box(MALFORMED), "first", 1).unwrap_err())
    });

    group.bench_function("timestamp_mismatch", |b| {
        b.iter(|| parse_line("bench.log", black_box(SECOND_SHORT), "first", 1).unwrap_err())
    });

    group.finish();
}

fn bench_throughput(c: &mut Criterion) {
    let lines: Vec<String> = (0..1000)
        .map(|i| format!("2021-01-02 15:04:{:02} | message number {i}", i % 60))
        .collect();

    let mut group = c.benchmark_group("parse_line_batch");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("1000_lines", |b| {
        b.iter(|| {
            for (idx, line) in lines.iter().enumerate() {
                parse_line("bench.log", black_box(line), "first", idx as u64 + 1).unwrap();
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_formats, bench_errors, bench_throughput);
criterion_main!(benches);
