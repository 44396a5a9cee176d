//! Multi-key ordering.
//!
//! An [`OrderedQuery`] remembers the unsorted source and the key list, so
//! `then_by` re-sorts the source with the longer list instead of sorting an
//! already-sorted intermediate.

mod key;

use std::cmp::Ordering;
use std::sync::Arc;

use tagql_core::{CompareOption, Context, Record, Result, Value};

use crate::query::Query;
use crate::traits::{BoxIter, RecordIterator, Step};

pub use key::{sort_records, SortKey};
use key::Sorted;

#[derive(Clone)]
pub struct OrderedQuery {
    source: Query,
    keys: Vec<SortKey>,
    query: Query,
}

impl OrderedQuery {
    fn build(source: Query, keys: Vec<SortKey>) -> Self {
        let shared = Arc::new(keys.clone());
        let parent = source.clone();
        let query = Query::new(move || Box::new(Sorted::new(parent.start(), Arc::clone(&shared))));
        Self {
            source,
            keys,
            query,
        }
    }

    fn then(&self, key: SortKey) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key);
        Self::build(self.source.clone(), keys)
    }

    pub fn then_by<F>(&self, key: F) -> OrderedQuery
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.then(SortKey::ascending(Arc::new(key)))
    }

    pub fn then_by_descending<F>(&self, key: F) -> OrderedQuery
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.then(SortKey::descending(Arc::new(key)))
    }

    pub fn then_by_with<F, C>(&self, key: F, cmp: C, descending: bool) -> OrderedQuery
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        C: Fn(&Value, &Value) -> Result<Ordering> + Send + Sync + 'static,
    {
        self.then(SortKey::new(Arc::new(key), descending).with_comparator(cmp))
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Drops adjacent duplicate rows. Only valid because equal rows are
    /// adjacent once sorted.
    pub fn distinct(&self) -> Query {
        let sorted = self.query.clone();
        Query::new(move || {
            Box::new(AdjacentDistinct {
                src: sorted.start(),
                last: None,
            })
        })
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    pub fn start(&self) -> BoxIter {
        self.query.start()
    }

    pub fn collect(&self, ctx: &Context) -> Result<Vec<Record>> {
        self.query.collect(ctx)
    }
}

impl From<OrderedQuery> for Query {
    fn from(q: OrderedQuery) -> Self {
        q.into_query()
    }
}

impl Query {
    pub fn order_by<F>(&self, key: F) -> OrderedQuery
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
    {
        OrderedQuery::build(self.clone(), vec![SortKey::ascending(Arc::new(key))])
    }

    pub fn order_by_descending<F>(&self, key: F) -> OrderedQuery
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
    {
        OrderedQuery::build(self.clone(), vec![SortKey::descending(Arc::new(key))])
    }

    pub fn order_by_with<F, C>(&self, key: F, cmp: C, descending: bool) -> OrderedQuery
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        C: Fn(&Value, &Value) -> Result<Ordering> + Send + Sync + 'static,
    {
        let key = SortKey::new(Arc::new(key), descending).with_comparator(cmp);
        OrderedQuery::build(self.clone(), vec![key])
    }

    /// Order by a prepared key list (an ORDER BY clause).
    pub fn sort(&self, keys: Vec<SortKey>) -> OrderedQuery {
        OrderedQuery::build(self.clone(), keys)
    }
}

struct AdjacentDistinct {
    src: BoxIter,
    last: Option<Record>,
}

impl RecordIterator for AdjacentDistinct {
    fn name(&self) -> &'static str {
        "ordered_distinct"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        loop {
            ctx.check()?;
            let r = match self.src.next(ctx)? {
                Step::Yield(r) => r,
                Step::End => return Ok(Step::End),
            };
            let repeat = match self.last.as_ref() {
                Some(prev) => prev.equal_to(&r, CompareOption::Strict)?,
                None => false,
            };
            if !repeat {
                self.last = Some(r.clone());
                return Ok(Step::Yield(r));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::position;

    fn grid(pairs: &[(i64, i64)]) -> Query {
        Query::from_records(
            pairs
                .iter()
                .map(|(a, b)| Record::from_pairs([("a", Value::Int(*a)), ("b", Value::Int(*b))]))
                .collect(),
        )
    }

    fn tuples(rows: &[Record]) -> Vec<(i64, i64)> {
        rows.iter()
            .map(|r| (r.get(0).as_int().unwrap(), r.get(1).as_int().unwrap()))
            .collect()
    }

    fn a(ctx: &Context, r: &Record) -> Result<Value> {
        position(0)(ctx, r)
    }

    fn b(ctx: &Context, r: &Record) -> Result<Value> {
        position(1)(ctx, r)
    }

    #[test]
    fn then_by_resorts_from_the_source() {
        let ctx = Context::new();
        let q = grid(&[(2, 1), (1, 2), (2, 0), (1, 1)]);
        let by_a = q.order_by(a);
        assert_eq!(tuples(&by_a.collect(&ctx).unwrap()), vec![(1, 2), (1, 1), (2, 1), (2, 0)]);
        let by_ab = by_a.then_by(b);
        assert_eq!(tuples(&by_ab.collect(&ctx).unwrap()), vec![(1, 1), (1, 2), (2, 0), (2, 1)]);
        // The first ordering is untouched.
        assert_eq!(by_a.keys().len(), 1);
        let by_a_bdesc = by_a.then_by_descending(b);
        assert_eq!(
            tuples(&by_a_bdesc.collect(&ctx).unwrap()),
            vec![(1, 2), (1, 1), (2, 1), (2, 0)]
        );
    }

    #[test]
    fn descending_first_key() {
        let ctx = Context::new();
        let q = grid(&[(1, 0), (3, 0), (2, 0)]).order_by_descending(a);
        assert_eq!(tuples(&q.collect(&ctx).unwrap()), vec![(3, 0), (2, 0), (1, 0)]);
    }

    #[test]
    fn ordered_distinct_drops_adjacent_repeats() {
        let ctx = Context::new();
        let q = grid(&[(2, 0), (1, 0), (2, 0), (1, 0), (3, 0)]).order_by(a).distinct();
        assert_eq!(tuples(&q.collect(&ctx).unwrap()), vec![(1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn custom_comparator_and_prepared_keys() {
        let ctx = Context::new();
        let reversed = |x: &Value, y: &Value| y.compare(x, CompareOption::Strict);
        let q = grid(&[(1, 0), (2, 0)]).order_by_with(a, reversed, false);
        assert_eq!(tuples(&q.collect(&ctx).unwrap()), vec![(2, 0), (1, 0)]);

        let keys = vec![SortKey::ascending(position(1)), SortKey::descending(position(0))];
        let q: Query = grid(&[(1, 1), (2, 1), (5, 0)]).sort(keys).into();
        assert_eq!(tuples(&q.collect(&ctx).unwrap()), vec![(5, 0), (2, 1), (1, 1)]);
    }

    #[test]
    fn sorted_query_restarts() {
        let ctx = Context::new();
        let q = grid(&[(3, 0), (1, 0)]).order_by(a);
        assert_eq!(q.collect(&ctx).unwrap(), q.collect(&ctx).unwrap());
        assert_eq!(q.query().count(&ctx).unwrap(), 2);
    }
}
