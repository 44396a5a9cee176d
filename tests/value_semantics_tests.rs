use std::cmp::Ordering;

use tagql::prelude::*;
use tagql::tagql_core::value::NANOS_PER_SECOND;

#[test]
fn test_weak_string_number_comparison() {
    let s = Value::from("256.0");
    let n = Value::Int(256);
    assert_eq!(s.compare(&n, CompareOption::Weak).unwrap(), Ordering::Equal);
    assert_eq!(s.compare_i(&n, CompareOption::Weak).unwrap(), 0);
    assert!(matches!(
        s.compare(&n, CompareOption::Strict),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn test_arithmetic_never_coerces_strings() {
    let err = Value::from("1").plus(&Value::Int(1)).unwrap_err();
    assert_eq!(err.to_string(), "could not plus string + int64");
    assert!(Value::Null.mult(&Value::Int(2)).is_err());
}

#[test]
fn test_signed_minus_unsigned_keeps_sign() {
    let out = Value::Int(1).minus(&Value::Uint(3)).unwrap();
    assert_eq!(out, Value::Int(-2));
}

#[test]
fn test_predicates_inside_a_filter() {
    let ctx = Context::new();
    let names = ["cpu0", "cpu1", "mem", "gpu0"];
    let q = Query::from_records(names.iter().map(|n| Record::from_pairs([("n", Value::from(*n))])).collect());
    let prefix = Value::from("cpu%");
    let like = q.filter(move |_: &Context, r: &Record| r.get(0).like(&prefix));
    assert_eq!(like.count(&ctx).unwrap(), 2);

    let pattern = Value::from("^[gm]");
    let re = q.filter(move |_: &Context, r: &Record| r.get(0).regexp(&pattern));
    assert_eq!(re.count(&ctx).unwrap(), 2);

    let wanted = vec![Value::from("mem"), Value::from("disk")];
    let listed = q.filter(move |_: &Context, r: &Record| r.get(0).in_list(&wanted, CompareOption::Strict));
    assert_eq!(listed.count(&ctx).unwrap(), 1);
}

#[test]
fn test_record_line_form() {
    let r = Record::from_pairs([
        ("s", Value::from("a,\"b\"")),
        ("t", Value::datetime_from_secs(0).unwrap()),
        ("n", Value::Null),
    ]);
    assert_eq!(r.to_line(), "\"a,\\\"b\\\"\",1970-01-01T00:00:00Z,null");
}

#[test]
fn test_interval_int_div_truncates() {
    let ten_s = Value::Interval(10 * NANOS_PER_SECOND);
    assert_eq!(ten_s.int_div(&Value::Float(3.0)).unwrap(), Value::Interval(3_333_333_333));
    assert_eq!(ten_s.int_div(&Value::Float(4.0)).unwrap(), Value::Interval(2_500_000_000));
    let odd = Value::Interval(7);
    assert_eq!(odd.int_div(&Value::Float(2.0)).unwrap(), Value::Interval(3));
    assert_eq!(odd.div(&Value::Float(2.0)).unwrap(), Value::Interval(4));
    assert_eq!(odd.int_div(&Value::Int(2)).unwrap(), Value::Interval(3));
}
