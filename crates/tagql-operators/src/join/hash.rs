//! Hash join over a fully drained inner side.
//!
//! Lookup tries an exact digest hit first. On a miss, and when the weak
//! fallback is enabled, every bucket key is compared with weak equality so
//! keys of different tags (int64 vs string, say) still meet. That scan is
//! O(distinct inner keys) per missed outer row. A weak comparison that fails
//! aborts the join with its error.
//!
//! Null keys never match.

use std::collections::HashMap;

use tracing::{debug, trace};

use tagql_core::{CompareOption, Context, Hash256, Record, Result, Value};

use crate::expr::{ResultSelector, ValueReader};
use crate::query::Query;
use crate::traits::{BoxIter, RecordIterator, Step};

use super::JoinOptions;

/// Inner rows grouped by key, buckets in first-seen key order.
#[derive(Debug, Default)]
pub(crate) struct KeyTable {
    buckets: Vec<(Value, Vec<Record>)>,
    index: HashMap<Hash256, usize>,
    row_count: usize,
}

impl KeyTable {
    pub(crate) fn build(src: &mut dyn RecordIterator, key: &ValueReader, ctx: &Context) -> Result<Self> {
        let mut table = KeyTable::default();
        loop {
            ctx.check()?;
            let r = match src.next(ctx)? {
                Step::Yield(r) => r,
                Step::End => break,
            };
            let k = key(ctx, &r)?;
            if k.is_null() {
                continue;
            }
            let digest = k.digest();
            let slot = match table.index.get(&digest) {
                Some(&i) => i,
                None => {
                    table.index.insert(digest, table.buckets.len());
                    table.buckets.push((k, Vec::new()));
                    table.buckets.len() - 1
                }
            };
            table.buckets[slot].1.push(r);
            table.row_count += 1;
        }
        trace!(
            rows = table.row_count,
            keys = table.buckets.len(),
            "materialized join table"
        );
        Ok(table)
    }

    /// Bucket holding rows whose key equals `k`.
    pub(crate) fn lookup(&self, k: &Value, weak_fallback: bool) -> Result<Option<usize>> {
        if k.is_null() {
            return Ok(None);
        }
        if let Some(&i) = self.index.get(&k.digest()) {
            return Ok(Some(i));
        }
        if !weak_fallback {
            return Ok(None);
        }
        for (i, (bk, _)) in self.buckets.iter().enumerate() {
            if k.equals(bk, CompareOption::Weak)? {
                debug!(outer = %k, inner = %bk, "join key matched by weak equality");
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    pub(crate) fn rows(&self, bucket: usize) -> &[Record] {
        self.buckets
            .get(bucket)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }
}

/// Outer row being paired with its bucket.
struct Pending {
    outer: Record,
    bucket: usize,
    pos: usize,
}

pub(super) struct HashJoin {
    outer: BoxIter,
    inner: Option<Query>,
    outer_key: ValueReader,
    inner_key: ValueReader,
    selector: ResultSelector,
    options: JoinOptions,
    table: KeyTable,
    pending: Option<Pending>,
}

impl HashJoin {
    pub(super) fn new(
        outer: BoxIter,
        inner: Query,
        outer_key: ValueReader,
        inner_key: ValueReader,
        selector: ResultSelector,
        options: JoinOptions,
    ) -> Self {
        Self {
            outer,
            inner: Some(inner),
            outer_key,
            inner_key,
            selector,
            options,
            table: KeyTable::default(),
            pending: None,
        }
    }
}

impl RecordIterator for HashJoin {
    fn name(&self) -> &'static str {
        if self.options.is_left {
            "left_join"
        } else {
            "join"
        }
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        if let Some(inner) = self.inner.take() {
            self.table = KeyTable::build(inner.start().as_mut(), &self.inner_key, ctx)?;
        }
        loop {
            ctx.check()?;
            if let Some(p) = self.pending.as_mut() {
                if let Some(inner) = self.table.rows(p.bucket).get(p.pos) {
                    p.pos += 1;
                    return Ok(Step::Yield((self.selector)(ctx, &p.outer, inner)?));
                }
                self.pending = None;
            }
            let outer = match self.outer.next(ctx)? {
                Step::Yield(r) => r,
                Step::End => return Ok(Step::End),
            };
            let k = (self.outer_key)(ctx, &outer)?;
            match self.table.lookup(&k, self.options.weak_fallback)? {
                Some(bucket) => {
                    self.pending = Some(Pending {
                        outer,
                        bucket,
                        pos: 0,
                    })
                }
                None if self.options.is_left => {
                    return Ok(Step::Yield((self.selector)(ctx, &outer, &Record::empty())?));
                }
                None => {}
            }
        }
    }
}
