//! Set algebra over row equality.
//!
//! Rows are equal when `Record::equal_to` holds under the strict policy,
//! or, for the `*_by` forms, when the projected key values are. Membership
//! is tracked in a [`RowSet`] bucketed by row digest, which strict equality
//! is consistent with.
//!
//! `except` and `intersect` drain their second operand into a set on the
//! first pull, so that operand must be finite. The first operand streams.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use tagql_core::{CompareOption, Context, Hash256, Record, Result, Value};

use crate::expr::ValueReader;
use crate::query::Query;
use crate::traits::{BoxIter, RecordIterator, Step};

/// Hash set of records keyed by digest, confirmed with strict equality.
#[derive(Debug, Default)]
pub(crate) struct RowSet {
    buckets: HashMap<Hash256, Vec<Record>>,
    len: usize,
}

impl RowSet {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn contains(&self, r: &Record) -> Result<bool> {
        match self.buckets.get(&r.digest()) {
            Some(bucket) => {
                for seen in bucket {
                    if seen.equal_to(r, CompareOption::Strict)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// False when an equal row was already present.
    pub(crate) fn insert(&mut self, r: Record) -> Result<bool> {
        let bucket = self.buckets.entry(r.digest()).or_default();
        for seen in bucket.iter() {
            if seen.equal_to(&r, CompareOption::Strict)? {
                return Ok(false);
            }
        }
        bucket.push(r);
        self.len += 1;
        Ok(true)
    }

    pub(crate) fn remove(&mut self, r: &Record) -> Result<bool> {
        let digest = r.digest();
        let Some(bucket) = self.buckets.get_mut(&digest) else {
            return Ok(false);
        };
        let mut hit = None;
        for (i, seen) in bucket.iter().enumerate() {
            if seen.equal_to(r, CompareOption::Strict)? {
                hit = Some(i);
                break;
            }
        }
        match hit {
            Some(i) => {
                bucket.swap_remove(i);
                if bucket.is_empty() {
                    self.buckets.remove(&digest);
                }
                self.len -= 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// What a set operator compares: the whole row or one projected value.
#[derive(Clone)]
enum SetKey {
    Row,
    By(ValueReader),
}

impl SetKey {
    fn of(&self, ctx: &Context, r: &Record) -> Result<Record> {
        match self {
            SetKey::Row => Ok(r.clone()),
            SetKey::By(read) => Ok(Record::new(Vec::new(), vec![read(ctx, r)?])),
        }
    }
}

fn fill(set: &mut RowSet, src: &mut dyn RecordIterator, key: &SetKey, ctx: &Context) -> Result<()> {
    loop {
        ctx.check()?;
        match src.next(ctx)? {
            Step::Yield(r) => {
                set.insert(key.of(ctx, &r)?)?;
            }
            Step::End => return Ok(()),
        }
    }
}

impl Query {
    /// First occurrence of each distinct row, in source order.
    pub fn distinct(&self) -> Query {
        self.distinct_with(SetKey::Row)
    }

    pub fn distinct_by<F>(&self, key: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.distinct_with(SetKey::By(Arc::new(key)))
    }

    fn distinct_with(&self, key: SetKey) -> Query {
        let parent = self.clone();
        Query::new(move || {
            Box::new(Distinct {
                src: parent.start(),
                key: key.clone(),
                seen: RowSet::default(),
            })
        })
    }

    /// Rows of `self` then `other`, each distinct row once.
    pub fn union(&self, other: &Query) -> Query {
        self.union_with(other, SetKey::Row)
    }

    pub fn union_by<F>(&self, other: &Query, key: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.union_with(other, SetKey::By(Arc::new(key)))
    }

    /// Rows of `self` then `other`, duplicates kept.
    pub fn union_all(&self, other: &Query) -> Query {
        self.concat(other)
    }

    fn union_with(&self, other: &Query, key: SetKey) -> Query {
        let first = self.clone();
        let second = other.clone();
        Query::new(move || {
            Box::new(Union {
                first: first.start(),
                second: second.start(),
                on_second: false,
                key: key.clone(),
                seen: RowSet::default(),
            })
        })
    }

    /// Rows of `self` with no equal row in `other`. Duplicates within
    /// `self` are kept.
    pub fn except(&self, other: &Query) -> Query {
        self.except_with(other, SetKey::Row)
    }

    pub fn except_by<F>(&self, other: &Query, key: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.except_with(other, SetKey::By(Arc::new(key)))
    }

    fn except_with(&self, other: &Query, key: SetKey) -> Query {
        let first = self.clone();
        let second = other.clone();
        Query::new(move || {
            Box::new(Probe {
                src: first.start(),
                other: Some(second.clone()),
                key: key.clone(),
                set: RowSet::default(),
                mode: ProbeMode::Except,
            })
        })
    }

    /// Rows of `self` that also appear in `other`, each distinct row once.
    pub fn intersect(&self, other: &Query) -> Query {
        self.intersect_with(other, SetKey::Row)
    }

    pub fn intersect_by<F>(&self, other: &Query, key: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.intersect_with(other, SetKey::By(Arc::new(key)))
    }

    fn intersect_with(&self, other: &Query, key: SetKey) -> Query {
        let first = self.clone();
        let second = other.clone();
        Query::new(move || {
            Box::new(Probe {
                src: first.start(),
                other: Some(second.clone()),
                key: key.clone(),
                set: RowSet::default(),
                mode: ProbeMode::Intersect,
            })
        })
    }
}

struct Distinct {
    src: BoxIter,
    key: SetKey,
    seen: RowSet,
}

impl RecordIterator for Distinct {
    fn name(&self) -> &'static str {
        "distinct"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        loop {
            ctx.check()?;
            let r = match self.src.next(ctx)? {
                Step::Yield(r) => r,
                Step::End => return Ok(Step::End),
            };
            if self.seen.insert(self.key.of(ctx, &r)?)? {
                return Ok(Step::Yield(r));
            }
        }
    }
}

struct Union {
    first: BoxIter,
    second: BoxIter,
    on_second: bool,
    key: SetKey,
    seen: RowSet,
}

impl RecordIterator for Union {
    fn name(&self) -> &'static str {
        "union"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        loop {
            ctx.check()?;
            let step = if self.on_second {
                self.second.next(ctx)?
            } else {
                self.first.next(ctx)?
            };
            let r = match step {
                Step::Yield(r) => r,
                Step::End if !self.on_second => {
                    self.on_second = true;
                    continue;
                }
                Step::End => return Ok(Step::End),
            };
            if self.seen.insert(self.key.of(ctx, &r)?)? {
                return Ok(Step::Yield(r));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeMode {
    Except,
    Intersect,
}

/// Streams `src` against a set drained from `other` on the first pull.
struct Probe {
    src: BoxIter,
    other: Option<Query>,
    key: SetKey,
    set: RowSet,
    mode: ProbeMode,
}

impl RecordIterator for Probe {
    fn name(&self) -> &'static str {
        match self.mode {
            ProbeMode::Except => "except",
            ProbeMode::Intersect => "intersect",
        }
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        if let Some(other) = self.other.take() {
            fill(&mut self.set, other.start().as_mut(), &self.key, ctx)?;
            trace!(op = self.name(), keys = self.set.len(), "materialized probe set");
        }
        loop {
            ctx.check()?;
            let r = match self.src.next(ctx)? {
                Step::Yield(r) => r,
                Step::End => return Ok(Step::End),
            };
            let k = self.key.of(ctx, &r)?;
            let keep = match self.mode {
                ProbeMode::Except => !self.set.contains(&k)?,
                // Removing on a hit emits each matching row once.
                ProbeMode::Intersect => self.set.remove(&k)?,
            };
            if keep {
                return Ok(Step::Yield(r));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::column;
    use crate::query::test_util::*;
    use tagql_core::Value;

    #[test]
    fn row_set_confirms_equality_within_buckets() {
        let mut set = RowSet::default();
        assert!(set.insert(row(1)).unwrap());
        assert!(!set.insert(Record::from_pairs([("w", Value::Float(1.0))])).unwrap());
        assert!(set.contains(&row(1)).unwrap());
        assert!(set.remove(&row(1)).unwrap());
        assert!(!set.remove(&row(1)).unwrap());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn distinct_keeps_first_occurrence() {
        let ctx = Context::new();
        let q = ints(&[1, 2, 2, 3, 1]).distinct();
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn distinct_by_projects_key() {
        let ctx = Context::new();
        let rows = vec![
            Record::from_pairs([("host", Value::from("a")), ("n", Value::Int(1))]),
            Record::from_pairs([("host", Value::from("b")), ("n", Value::Int(2))]),
            Record::from_pairs([("host", Value::from("a")), ("n", Value::Int(3))]),
        ];
        let q = Query::from_records(rows).distinct_by(|ctx, r| column("host")(ctx, r));
        let out = q.collect(&ctx).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].get(1), &Value::Int(2));
    }

    #[test]
    fn union_dedups_across_both_sides() {
        let ctx = Context::new();
        let q = ints(&[1, 2, 2]).union(&ints(&[2, 3, 1, 4]));
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![1, 2, 3, 4]);
        let all = ints(&[1, 2, 2]).union_all(&ints(&[2, 3]));
        assert_eq!(all.count(&ctx).unwrap(), 5);
    }

    #[test]
    fn except_keeps_left_duplicates() {
        let ctx = Context::new();
        let q = ints(&[1, 2, 1, 3, 4]).except(&ints(&[2, 4]));
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![1, 1, 3]);
        let same = ints(&[5, 5]).except(&Query::empty());
        assert_eq!(firsts(&same.collect(&ctx).unwrap()), vec![5, 5]);
    }

    #[test]
    fn intersect_emits_each_match_once() {
        let ctx = Context::new();
        let q = ints(&[1, 2, 2, 3, 5]).intersect(&ints(&[2, 3, 3, 4]));
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![2, 3]);
        // Restarting rebuilds the set.
        assert_eq!(q.count(&ctx).unwrap(), 2);
    }

    #[test]
    fn by_variants_compare_projected_values() {
        let ctx = Context::new();
        let by_parity = |_: &Context, r: &Record| r.get(0).modulo(&Value::Int(2));
        let q = ints(&[1, 2, 3, 4]).except_by(&ints(&[6]), by_parity);
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![1, 3]);
        let q = ints(&[1, 2, 3]).intersect_by(&ints(&[9]), by_parity);
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![1]);
        let q = ints(&[1, 3]).union_by(&ints(&[5, 6]), by_parity);
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![1, 6]);
    }
}
