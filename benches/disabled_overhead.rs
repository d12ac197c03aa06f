use criterion::{black_box, criterion_group, criterion_main, Criterion};
use perftrace::trace::{Measurement, NullSink, PerfTrace, Phase};
use std::sync::Arc;

/// The cost-when-disabled guarantee: begin/end on a disabled collector must
/// stay in the low-nanosecond range (one relaxed atomic load each).
fn bench_disabled_span(c: &mut Criterion) {
    let trace = Arc::new(PerfTrace::new(1, false));

    c.bench_function("disabled_begin_end", |b| {
        b.iter(|| {
            let mut m = trace.measurement(black_box(1), black_box(5), Phase::ReadTaskData);
            m.begin();
            m.add_count(black_box(1));
            m.end();
        })
    });

    c.bench_function("disabled_summary_record", |b| {
        b.iter(|| {
            Measurement::record(
                &trace,
                black_box(1),
                black_box(5),
                Phase::ReadTaskData,
                black_box(0),
                black_box(1_000),
            );
        })
    });
}

fn bench_enabled_span(c: &mut Criterion) {
    let trace = Arc::new(PerfTrace::with_sink(1, true, Box::new(NullSink)));

    c.bench_function("enabled_begin_end", |b| {
        b.iter(|| {
            let mut m = trace.measurement(black_box(1), black_box(5), Phase::ReadTaskData);
            m.begin();
            m.add_count(black_box(1));
            m.end();
        })
    });
}

criterion_group!(benches, bench_disabled_span, bench_enabled_span);
criterion_main!(benches);
