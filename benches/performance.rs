use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagql::prelude::*;

fn make_rows(rows: usize) -> Vec<Record> {
    (0..rows)
        .map(|i| {
            Record::from_pairs([
                ("group", Value::from(format!("group-{}", i % 16))),
                ("order", Value::Int((rows - i) as i64)),
                ("value", Value::Float((i % 10) as f64)),
            ])
        })
        .collect()
}

fn bench_hash_join(c: &mut Criterion) {
    let ctx = Context::new();
    let outer = Query::from_records(make_rows(4096));
    let inner = Query::from_records(
        (0..16)
            .map(|g| Record::from_pairs([("name", Value::from(format!("group-{g}")))]))
            .collect(),
    );
    let key = |_: &Context, r: &Record| -> Result<Value> { Ok(r.get(0).clone()) };
    let joined = outer.join(false, &inner, key, key, |_: &Context, o: &Record, i: &Record| {
        Ok(o.merge(i, None))
    });
    c.bench_function("hash_join_4096x16", |b| {
        b.iter(|| black_box(joined.count(&ctx).unwrap_or(0)))
    });
}

fn bench_multi_key_sort(c: &mut Criterion) {
    let ctx = Context::new();
    let sorted = Query::from_records(make_rows(4096))
        .order_by(|_: &Context, r: &Record| Ok(r.get(0).clone()))
        .then_by_descending(|_: &Context, r: &Record| Ok(r.get(1).clone()));
    c.bench_function("order_by_then_by_4096", |b| {
        b.iter(|| black_box(sorted.query().count(&ctx).unwrap_or(0)))
    });
}

fn bench_group_by(c: &mut Criterion) {
    let ctx = Context::new();
    let reg = AggregatorRegistry::with_builtins();
    let specs = vec![
        reg.spec("sum", "total", column("value")).unwrap(),
        reg.spec("count", "n", constant(Value::Int(1))).unwrap(),
    ];
    let grouped = Query::from_records(make_rows(4096))
        .group_by_aggregate(vec![("group".into(), column("group"))], specs);
    c.bench_function("group_by_4096", |b| {
        b.iter(|| black_box(grouped.count(&ctx).unwrap_or(0)))
    });
}

criterion_group!(operators, bench_hash_join, bench_multi_key_sort, bench_group_by);
criterion_main!(operators);
