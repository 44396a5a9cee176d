//! Relational properties of the operator library over small integer inputs.

use tagql::prelude::*;

fn ints(values: &[i64]) -> Query {
    Query::from_records(values.iter().map(|v| Record::from_pairs([("v", Value::Int(*v))])).collect())
}

fn firsts(rows: &[Record]) -> Vec<i64> {
    rows.iter().map(|r| r.get(0).as_int().unwrap_or(i64::MIN)).collect()
}

fn v(_: &Context, r: &Record) -> Result<Value> {
    Ok(r.get(0).clone())
}

fn pair(_: &Context, outer: &Record, inner: &Record) -> Result<Record> {
    Ok(Record::from_pairs([("o", outer.get(0).clone()), ("i", inner.get(0).clone())]))
}

#[test]
fn test_union_has_no_duplicates_and_covers_both_inputs() {
    let ctx = Context::new();
    let a = ints(&[1, 2, 2, 3]);
    let b = ints(&[3, 4, 1, 5]);
    let out = firsts(&a.union(&b).collect(&ctx).unwrap());
    assert_eq!(out, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_union_all_and_concat_are_identical() {
    let ctx = Context::new();
    let a = ints(&[1, 2, 2]);
    let b = ints(&[2, 3]);
    let all = a.union_all(&b).collect(&ctx).unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all, a.concat(&b).collect(&ctx).unwrap());
}

#[test]
fn test_except_keeps_rows_absent_from_the_right() {
    let ctx = Context::new();
    let a = ints(&[1, 2, 3, 2, 4]);
    let out = firsts(&a.except(&ints(&[2, 5])).collect(&ctx).unwrap());
    assert_eq!(out, vec![1, 3, 4]);
    assert_eq!(
        a.except(&Query::empty()).collect(&ctx).unwrap(),
        a.collect(&ctx).unwrap()
    );
}

#[test]
fn test_intersect_emits_each_common_row_once() {
    let ctx = Context::new();
    let out = ints(&[1, 2, 2, 3, 3])
        .intersect(&ints(&[3, 2, 9]))
        .collect(&ctx)
        .unwrap();
    assert_eq!(firsts(&out), vec![2, 3]);
}

#[test]
fn test_distinct_keeps_first_seen_order() {
    let ctx = Context::new();
    let out = ints(&[1, 2, 2, 3, 1]).distinct().collect(&ctx).unwrap();
    assert_eq!(firsts(&out), vec![1, 2, 3]);
}

#[test]
fn test_equality_join_example() {
    let ctx = Context::new();
    let outer = ints(&[0, 1, 2, 3, 4, 5, 8]);
    let inner = ints(&[1, 2, 1, 4, 7, 6, 7, 2]);
    let rows = outer.join(false, &inner, v, v, pair).collect(&ctx).unwrap();
    let pairs: Vec<(i64, i64)> = rows
        .iter()
        .map(|r| (r.get(0).as_int().unwrap(), r.get(1).as_int().unwrap()))
        .collect();
    assert_eq!(pairs, vec![(1, 1), (1, 1), (2, 2), (2, 2), (4, 4)]);
}

#[test]
fn test_left_join_adds_one_row_per_unmatched_outer() {
    let ctx = Context::new();
    let outer = ints(&[0, 1, 2, 3, 4, 5, 8]);
    let inner = ints(&[1, 2, 1, 4, 7, 6, 7, 2]);
    let inner_rows = outer.join(false, &inner, v, v, pair).count(&ctx).unwrap();
    let left_rows = outer.join(true, &inner, v, v, pair).collect(&ctx).unwrap();
    // 0, 3, 5 and 8 have no match.
    assert_eq!(left_rows.len(), inner_rows + 4);
    let unmatched: Vec<i64> = left_rows
        .iter()
        .filter(|r| r.get(1).is_null())
        .map(|r| r.get(0).as_int().unwrap())
        .collect();
    assert_eq!(unmatched, vec![0, 3, 5, 8]);
}

#[test]
fn test_weak_join_matches_across_types() {
    let ctx = Context::new();
    let outer = ints(&[256]);
    let inner = Query::from_records(vec![Record::from_pairs([("s", Value::from("256.0"))])]);
    assert_eq!(outer.join(false, &inner, v, v, pair).count(&ctx).unwrap(), 1);
    let strict = outer.join_with(JoinOptions::inner().with_weak_fallback(false), &inner, v, v, pair);
    assert_eq!(strict.count(&ctx).unwrap(), 0);
}

#[test]
fn test_order_by_then_by_is_lexicographic_and_stable() {
    let ctx = Context::new();
    let rows: Vec<Record> = [(2, 1, "a"), (1, 2, "b"), (2, 1, "c"), (1, 1, "d"), (2, 0, "e")]
        .iter()
        .map(|(k1, k2, tag)| {
            Record::from_pairs([
                ("k1", Value::Int(*k1)),
                ("k2", Value::Int(*k2)),
                ("tag", Value::from(*tag)),
            ])
        })
        .collect();
    let q = Query::from_records(rows)
        .order_by(|_: &Context, r: &Record| Ok(r.get(0).clone()))
        .then_by(|_: &Context, r: &Record| Ok(r.get(1).clone()));
    let tags: Vec<String> = q
        .collect(&ctx)
        .unwrap()
        .iter()
        .map(|r| r.get(2).as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(tags, vec!["d", "b", "e", "a", "c"]);
}

#[test]
fn test_queries_restart_with_identical_output() {
    let ctx = Context::new();
    let q = ints(&[5, 3, 5, 1])
        .filter(|_: &Context, r: &Record| Ok(r.get(0).as_int().unwrap_or(0) > 1))
        .distinct()
        .order_by_descending(v)
        .into_query();
    assert_eq!(q.collect(&ctx).unwrap(), q.collect(&ctx).unwrap());
    assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![5, 3]);
}

#[test]
fn test_end_of_stream_is_sticky() {
    let ctx = Context::new();
    let mut it = ints(&[1]).take(1).start();
    assert!(matches!(it.next(&ctx).unwrap(), Step::Yield(_)));
    for _ in 0..3 {
        assert!(it.next(&ctx).unwrap().is_end());
    }
}

#[test]
fn test_deadline_surfaces_as_error_not_end() {
    let ctx = Context::new().with_timeout(std::time::Duration::from_millis(0));
    let err = ints(&[1, 2]).collect(&ctx).unwrap_err();
    assert!(err.is_cancellation());
}

/// Deterministic keys in `0..range` from a linear congruential sequence.
fn generated(seed: u64, len: usize, range: u64) -> Vec<i64> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % range) as i64
        })
        .collect()
}

#[test]
fn test_join_cardinality_matches_pair_counts() {
    let ctx = Context::new();
    for seed in 1..=12u64 {
        let outer = generated(seed, 20 + seed as usize, 8);
        let inner = generated(seed * 7919, 15, 6);
        let matches = |o: &i64| inner.iter().filter(|i| *i == o).count();
        let expected: usize = outer.iter().map(matches).sum();
        let unmatched = outer.iter().filter(|o| matches(*o) == 0).count();

        let (oq, iq) = (ints(&outer), ints(&inner));
        assert_eq!(oq.join(false, &iq, v, v, pair).count(&ctx).unwrap(), expected, "seed {seed}");
        assert_eq!(
            oq.join(true, &iq, v, v, pair).count(&ctx).unwrap(),
            expected + unmatched,
            "seed {seed}"
        );
    }
}

#[test]
fn test_weak_join_fallback_surfaces_comparison_errors() {
    let ctx = Context::new();
    let inner = Query::from_records(vec![Record::from_pairs([("s", Value::from("abc"))])]);
    let err = ints(&[2]).join(false, &inner, v, v, pair).collect(&ctx).unwrap_err();
    assert!(matches!(err, Error::Compare(_)));
    // Exact digest hits never reach the weak scan.
    let inner = Query::from_records(vec![
        Record::from_pairs([("s", Value::from("abc"))]),
        Record::from_pairs([("s", Value::Int(2))]),
    ]);
    assert_eq!(ints(&[2]).join(false, &inner, v, v, pair).count(&ctx).unwrap(), 1);
}

#[test]
fn test_order_by_weak_comparator_over_mixed_tags() {
    let ctx = Context::new();
    let rows: Vec<Record> = (0..500i64)
        .map(|x| {
            let key = if x % 2 == 0 { Value::from(x.to_string()) } else { Value::Int(x) };
            Record::from_pairs([("k", key), ("id", Value::Int(x))])
        })
        .collect();
    let sorted = Query::from_records(rows).order_by_with(
        v,
        |a: &Value, b: &Value| a.compare(b, CompareOption::Weak),
        false,
    );
    let out = sorted.collect(&ctx).unwrap();
    assert_eq!(out.len(), 500);
    let mut ids: Vec<i64> = out.iter().filter_map(|r| r.get(1).as_int()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..500).collect::<Vec<_>>());

    // Consistent mixed keys still come out ordered.
    let small = Query::from_records(
        [Value::from("3"), Value::Int(1), Value::from("2.0")]
            .into_iter()
            .map(|k| Record::from_pairs([("k", k)]))
            .collect(),
    );
    let out = small
        .order_by_with(v, |a: &Value, b: &Value| a.compare(b, CompareOption::Weak), false)
        .collect(&ctx)
        .unwrap();
    let keys: Vec<String> = out.iter().map(|r| r.get(0).to_string()).collect();
    assert_eq!(keys, vec!["1", "2.0", "3"]);
}
