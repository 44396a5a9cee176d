use tracing::trace;

use tagql_core::{Context, Record, Result};

use crate::expr::ResultSelector;
use crate::query::Query;
use crate::traits::{drain, BoxIter, RecordIterator, Step};

/// Every outer row paired with every buffered inner row.
pub(super) struct FullJoin {
    outer: BoxIter,
    inner: Option<Query>,
    selector: ResultSelector,
    buffer: Vec<Record>,
    current: Option<Record>,
    pos: usize,
}

impl FullJoin {
    pub(super) fn new(outer: BoxIter, inner: Query, selector: ResultSelector) -> Self {
        Self {
            outer,
            inner: Some(inner),
            selector,
            buffer: Vec::new(),
            current: None,
            pos: 0,
        }
    }
}

impl RecordIterator for FullJoin {
    fn name(&self) -> &'static str {
        "full_join"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        if let Some(inner) = self.inner.take() {
            self.buffer = drain(inner.start().as_mut(), ctx)?;
            trace!(rows = self.buffer.len(), "buffered cross join inner side");
        }
        loop {
            ctx.check()?;
            if let Some(outer) = self.current.as_ref() {
                if let Some(inner) = self.buffer.get(self.pos) {
                    self.pos += 1;
                    return Ok(Step::Yield((self.selector)(ctx, outer, inner)?));
                }
            }
            if self.buffer.is_empty() {
                return Ok(Step::End);
            }
            match self.outer.next(ctx)? {
                Step::Yield(r) => {
                    self.current = Some(r);
                    self.pos = 0;
                }
                Step::End => {
                    self.current = None;
                    return Ok(Step::End);
                }
            }
        }
    }
}
