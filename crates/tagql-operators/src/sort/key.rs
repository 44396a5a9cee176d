//! Sort keys and the in-memory stable sort behind `order_by`.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::trace;

use tagql_core::{CompareOption, Context, Record, Result, Value};

use crate::expr::{comparator, Comparator, ValueReader};
use crate::traits::{drain, BoxIter, RecordIterator, Step};

/// One ORDER BY term.
#[derive(Clone)]
pub struct SortKey {
    pub reader: ValueReader,
    pub comparator: Comparator,
    pub descending: bool,
}

impl SortKey {
    pub fn new(reader: ValueReader, descending: bool) -> Self {
        Self {
            reader,
            comparator: comparator(CompareOption::Strict),
            descending,
        }
    }

    pub fn ascending(reader: ValueReader) -> Self {
        Self::new(reader, false)
    }

    pub fn descending(reader: ValueReader) -> Self {
        Self::new(reader, true)
    }

    pub fn with_comparator<C>(mut self, cmp: C) -> Self
    where
        C: Fn(&Value, &Value) -> Result<Ordering> + Send + Sync + 'static,
    {
        self.comparator = Arc::new(cmp);
        self
    }
}

/// Compare two key tuples: the first non-equal key decides, and a
/// descending key flips only its own decision.
fn compare_keys(keys: &[SortKey], a: &[Value], b: &[Value]) -> Result<Ordering> {
    for (k, (x, y)) in keys.iter().zip(a.iter().zip(b.iter())) {
        match (k.comparator)(x, y)? {
            Ordering::Equal => continue,
            ord if k.descending => return Ok(ord.reverse()),
            ord => return Ok(ord),
        }
    }
    Ok(Ordering::Equal)
}

/// Stable sort of `rows` by `keys`. The first comparator error aborts.
///
/// Comparators need not be total orders (weak comparison over mixed
/// string and number keys is not transitive); the output is then some
/// permutation of the input, never a panic.
pub fn sort_records(ctx: &Context, rows: Vec<Record>, keys: &[SortKey]) -> Result<Vec<Record>> {
    let mut keyed: Vec<(Vec<Value>, Record)> = Vec::with_capacity(rows.len());
    for r in rows {
        ctx.check()?;
        let tuple = keys
            .iter()
            .map(|k| (k.reader)(ctx, &r))
            .collect::<Result<Vec<_>>>()?;
        keyed.push((tuple, r));
    }

    type Keyed = (Vec<Value>, Record);
    let by_keys = |a: &Keyed, b: &Keyed| compare_keys(keys, &a.0, &b.0);
    let sorted = merge_sort(ctx, keyed, &by_keys)?;
    Ok(sorted.into_iter().map(|(_, r)| r).collect())
}

/// Top-down merge sort with a fallible comparator. Ties take the left
/// run first.
fn merge_sort<T, F>(ctx: &Context, mut items: Vec<T>, cmp: &F) -> Result<Vec<T>>
where
    F: Fn(&T, &T) -> Result<Ordering>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(ctx, items, cmp)?;
    let right = merge_sort(ctx, right, cmp)?;
    ctx.check()?;

    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(l, r)? == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        out.extend(if take_right { right.next() } else { left.next() });
    }
    Ok(out)
}

/// Buffers its source on the first pull, then replays it sorted.
pub(crate) struct Sorted {
    src: Option<BoxIter>,
    keys: Arc<Vec<SortKey>>,
    buffer: std::vec::IntoIter<Record>,
}

impl Sorted {
    pub(crate) fn new(src: BoxIter, keys: Arc<Vec<SortKey>>) -> Self {
        Self {
            src: Some(src),
            keys,
            buffer: Vec::new().into_iter(),
        }
    }
}

impl RecordIterator for Sorted {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        if let Some(mut src) = self.src.take() {
            let rows = drain(src.as_mut(), ctx)?;
            trace!(rows = rows.len(), keys = self.keys.len(), "buffered sort input");
            self.buffer = sort_records(ctx, rows, &self.keys)?.into_iter();
        }
        ctx.check()?;
        Ok(match self.buffer.next() {
            Some(r) => Step::Yield(r),
            None => Step::End,
        })
    }
}
