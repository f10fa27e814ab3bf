use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlweave::{Connector, SelectQb, SqlQb, select};

/// SELECT with `n` columns and `n` filters, half of them inside one OR group.
fn build_select(n: usize) -> SelectQb {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
    let mut qb = select("t").select(&refs);
    for i in 0..n / 2 {
        qb = qb.filter(&format!("col{i}"), "eq", &i.to_string());
    }
    qb = qb.start_group(Connector::And);
    for i in n / 2..n {
        qb = qb.or_filter(&format!("col{i}"), "in", "a,b,c");
    }
    qb.end_group().order_by(&["-col0"]).limit(50)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble/build");

    for n in [2, 10, 50, 100] {
        let qb = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &qb, |b, qb| {
            b.iter(|| black_box(qb.build()));
        });
    }

    group.finish();
}

fn bench_declare_and_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble/declare_and_build");

    for n in [2, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).build()));
        });
    }

    group.finish();
}

fn bench_json_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble/json_paths");

    for depth in [1, 4, 16] {
        let path: Vec<String> = (0..depth).map(|i| format!("k{i}")).collect();
        let column = format!("doc->{}", path.join("->"));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &column, |b, column| {
            b.iter(|| {
                let qb = select("t")
                    .select(&[column.as_str()])
                    .filter(column, "has", "needle");
                black_box(qb.build())
            });
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let qb = build_select(10);
    c.bench_function("assemble/aggregate", |b| {
        b.iter(|| black_box(qb.build_aggregate("COUNT_DISTINCT", "col1")));
    });
}

criterion_group!(
    benches,
    bench_build,
    bench_declare_and_build,
    bench_json_paths,
    bench_aggregate
);
criterion_main!(benches);
