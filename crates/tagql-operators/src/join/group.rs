use tagql_core::{Context, Record, Result};

use crate::expr::{GroupSelector, ValueReader};
use crate::query::Query;
use crate::traits::{BoxIter, RecordIterator, Step};

use super::hash::KeyTable;

/// One output row per outer row, built from its whole inner group.
pub(super) struct GroupJoin {
    outer: BoxIter,
    inner: Option<Query>,
    outer_key: ValueReader,
    inner_key: ValueReader,
    selector: GroupSelector,
    weak_fallback: bool,
    table: KeyTable,
}

impl GroupJoin {
    pub(super) fn new(
        outer: BoxIter,
        inner: Query,
        outer_key: ValueReader,
        inner_key: ValueReader,
        selector: GroupSelector,
        weak_fallback: bool,
    ) -> Self {
        Self {
            outer,
            inner: Some(inner),
            outer_key,
            inner_key,
            selector,
            weak_fallback,
            table: KeyTable::default(),
        }
    }
}

impl RecordIterator for GroupJoin {
    fn name(&self) -> &'static str {
        "group_join"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        if let Some(inner) = self.inner.take() {
            self.table = KeyTable::build(inner.start().as_mut(), &self.inner_key, ctx)?;
        }
        ctx.check()?;
        let outer = match self.outer.next(ctx)? {
            Step::Yield(r) => r,
            Step::End => return Ok(Step::End),
        };
        let k = (self.outer_key)(ctx, &outer)?;
        let group: &[Record] = match self.table.lookup(&k, self.weak_fallback)? {
            Some(bucket) => self.table.rows(bucket),
            None => &[],
        };
        Ok(Step::Yield((self.selector)(ctx, &outer, group)?))
    }
}
