//! Closure shapes at the planner boundary.
//!
//! A planner compiles each WHERE/ON/HAVING clause into a [`Predicate`] and
//! each SELECT/ORDER BY/JOIN-key expression into a [`ValueReader`]. Operators
//! store them behind `Arc` so a `Query` can start any number of cursors.

use std::cmp::Ordering;
use std::sync::Arc;

use tagql_core::{CompareOption, Context, Error, Record, Result, Value};

use crate::query::Query;

pub type Predicate = Arc<dyn Fn(&Context, &Record) -> Result<bool> + Send + Sync>;

/// Receives the zero-based index of every element inspected.
pub type IndexedPredicate = Arc<dyn Fn(&Context, usize, &Record) -> Result<bool> + Send + Sync>;

pub type ValueReader = Arc<dyn Fn(&Context, &Record) -> Result<Value> + Send + Sync>;

pub type Selector = Arc<dyn Fn(&Context, &Record) -> Result<Record> + Send + Sync>;

pub type IndexedSelector = Arc<dyn Fn(&Context, usize, &Record) -> Result<Record> + Send + Sync>;

pub type ManySelector = Arc<dyn Fn(&Context, &Record) -> Result<Query> + Send + Sync>;

/// `(outer, inner) -> row`.
pub type ResultSelector = Arc<dyn Fn(&Context, &Record, &Record) -> Result<Record> + Send + Sync>;

/// `(outer, matching inner group) -> row`.
pub type GroupSelector = Arc<dyn Fn(&Context, &Record, &[Record]) -> Result<Record> + Send + Sync>;

pub type Comparator = Arc<dyn Fn(&Value, &Value) -> Result<Ordering> + Send + Sync>;

/// Read a column by bare or `table.column` name.
pub fn column(name: impl Into<String>) -> ValueReader {
    let name = name.into();
    Arc::new(move |_: &Context, r: &Record| {
        r.get_by_name(&name)
            .cloned()
            .ok_or_else(|| Error::UnknownColumn(name.clone()))
    })
}

/// Read the value at a fixed position.
pub fn position(i: usize) -> ValueReader {
    Arc::new(move |_: &Context, r: &Record| Ok(r.get(i).clone()))
}

pub fn constant(v: Value) -> ValueReader {
    Arc::new(move |_: &Context, _: &Record| Ok(v.clone()))
}

/// `Value::compare` under `opt`.
pub fn comparator(opt: CompareOption) -> Comparator {
    Arc::new(move |a: &Value, b: &Value| a.compare(b, opt))
}

/// Pairs a join's outer and inner rows into one merged record.
pub fn merge_rows() -> ResultSelector {
    Arc::new(|_: &Context, outer: &Record, inner: &Record| Ok(outer.merge(inner, None)))
}

/// True when `reader` yields a truthy value.
pub fn truthy(reader: ValueReader) -> Predicate {
    Arc::new(move |ctx: &Context, r: &Record| Ok(reader(ctx, r)?.is_truthy()))
}

/// `reader(row) = v` under `opt`.
pub fn equals(reader: ValueReader, v: Value, opt: CompareOption) -> Predicate {
    Arc::new(move |ctx: &Context, r: &Record| reader(ctx, r)?.equals(&v, opt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_reader_reports_unknown_names() {
        let ctx = Context::new();
        let r = Record::from_pairs([("host", Value::from("a"))]);
        assert_eq!(column("host")(&ctx, &r).unwrap(), Value::from("a"));
        assert_eq!(
            column("zone")(&ctx, &r).unwrap_err(),
            Error::UnknownColumn("zone".into())
        );
        assert_eq!(position(7)(&ctx, &r).unwrap(), Value::Null);
    }

    #[test]
    fn predicates_compose_readers() {
        let ctx = Context::new();
        let r = Record::from_pairs([("n", Value::from("3"))]);
        assert!(equals(column("n"), Value::Int(3), CompareOption::Weak)(&ctx, &r).unwrap());
        assert!(equals(column("n"), Value::Int(3), CompareOption::Strict)(&ctx, &r).is_err());
        assert!(!truthy(constant(Value::Int(0)))(&ctx, &r).unwrap());
    }
}
