//! Row selection: filter, take, skip and their `while` forms.
//!
//! Indexed predicates see the position of every element their cursor pulls,
//! including the ones they reject.

use std::sync::Arc;

use tagql_core::{Context, Record, Result};

use crate::expr::IndexedPredicate;
use crate::query::Query;
use crate::traits::{BoxIter, RecordIterator, Step};

fn indexed<F>(pred: F) -> IndexedPredicate
where
    F: Fn(&Context, &Record) -> Result<bool> + Send + Sync + 'static,
{
    Arc::new(move |ctx: &Context, _: usize, r: &Record| pred(ctx, r))
}

impl Query {
    /// Keep rows for which `pred` holds (SQL WHERE / HAVING).
    pub fn filter<F>(&self, pred: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<bool> + Send + Sync + 'static,
    {
        self.filter_with(indexed(pred))
    }

    pub fn filter_indexed<F>(&self, pred: F) -> Query
    where
        F: Fn(&Context, usize, &Record) -> Result<bool> + Send + Sync + 'static,
    {
        self.filter_with(Arc::new(pred))
    }

    fn filter_with(&self, pred: IndexedPredicate) -> Query {
        let parent = self.clone();
        Query::new(move || {
            Box::new(Filter {
                src: parent.start(),
                pred: Arc::clone(&pred),
                index: 0,
            })
        })
    }

    pub fn take(&self, n: usize) -> Query {
        let parent = self.clone();
        Query::new(move || {
            Box::new(Take {
                src: parent.start(),
                remaining: n,
            })
        })
    }

    pub fn skip(&self, n: usize) -> Query {
        let parent = self.clone();
        Query::new(move || {
            Box::new(Skip {
                src: parent.start(),
                remaining: n,
            })
        })
    }

    pub fn take_while<F>(&self, pred: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<bool> + Send + Sync + 'static,
    {
        self.take_while_with(indexed(pred))
    }

    pub fn take_while_indexed<F>(&self, pred: F) -> Query
    where
        F: Fn(&Context, usize, &Record) -> Result<bool> + Send + Sync + 'static,
    {
        self.take_while_with(Arc::new(pred))
    }

    fn take_while_with(&self, pred: IndexedPredicate) -> Query {
        let parent = self.clone();
        Query::new(move || {
            Box::new(TakeWhile {
                src: parent.start(),
                pred: Arc::clone(&pred),
                index: 0,
                done: false,
            })
        })
    }

    pub fn skip_while<F>(&self, pred: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<bool> + Send + Sync + 'static,
    {
        self.skip_while_with(indexed(pred))
    }

    pub fn skip_while_indexed<F>(&self, pred: F) -> Query
    where
        F: Fn(&Context, usize, &Record) -> Result<bool> + Send + Sync + 'static,
    {
        self.skip_while_with(Arc::new(pred))
    }

    fn skip_while_with(&self, pred: IndexedPredicate) -> Query {
        let parent = self.clone();
        Query::new(move || {
            Box::new(SkipWhile {
                src: parent.start(),
                pred: Arc::clone(&pred),
                index: 0,
                skipping: true,
            })
        })
    }
}

struct Filter {
    src: BoxIter,
    pred: IndexedPredicate,
    index: usize,
}

impl RecordIterator for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        loop {
            ctx.check()?;
            let r = match self.src.next(ctx)? {
                Step::Yield(r) => r,
                Step::End => return Ok(Step::End),
            };
            let i = self.index;
            self.index += 1;
            if (self.pred)(ctx, i, &r)? {
                return Ok(Step::Yield(r));
            }
        }
    }
}

struct Take {
    src: BoxIter,
    remaining: usize,
}

impl RecordIterator for Take {
    fn name(&self) -> &'static str {
        "take"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        if self.remaining == 0 {
            return Ok(Step::End);
        }
        let step = self.src.next(ctx)?;
        match step {
            Step::Yield(_) => self.remaining -= 1,
            Step::End => self.remaining = 0,
        }
        Ok(step)
    }
}

struct Skip {
    src: BoxIter,
    remaining: usize,
}

impl RecordIterator for Skip {
    fn name(&self) -> &'static str {
        "skip"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        while self.remaining > 0 {
            ctx.check()?;
            if self.src.next(ctx)?.is_end() {
                self.remaining = 0;
                return Ok(Step::End);
            }
            self.remaining -= 1;
        }
        ctx.check()?;
        self.src.next(ctx)
    }
}

struct TakeWhile {
    src: BoxIter,
    pred: IndexedPredicate,
    index: usize,
    done: bool,
}

impl RecordIterator for TakeWhile {
    fn name(&self) -> &'static str {
        "take_while"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        if self.done {
            return Ok(Step::End);
        }
        let r = match self.src.next(ctx)? {
            Step::Yield(r) => r,
            Step::End => {
                self.done = true;
                return Ok(Step::End);
            }
        };
        let i = self.index;
        self.index += 1;
        if (self.pred)(ctx, i, &r)? {
            Ok(Step::Yield(r))
        } else {
            self.done = true;
            Ok(Step::End)
        }
    }
}

struct SkipWhile {
    src: BoxIter,
    pred: IndexedPredicate,
    index: usize,
    skipping: bool,
}

impl RecordIterator for SkipWhile {
    fn name(&self) -> &'static str {
        "skip_while"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        if !self.skipping {
            ctx.check()?;
            return self.src.next(ctx);
        }
        loop {
            ctx.check()?;
            let r = match self.src.next(ctx)? {
                Step::Yield(r) => r,
                Step::End => return Ok(Step::End),
            };
            let i = self.index;
            self.index += 1;
            if !(self.pred)(ctx, i, &r)? {
                self.skipping = false;
                return Ok(Step::Yield(r));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::query::test_util::*;
    use tagql_core::{Error, Value};

    fn v(r: &Record) -> i64 {
        r.get(0).as_int().unwrap()
    }

    #[test]
    fn filter_index_counts_rejected_rows() {
        let ctx = Context::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let q = ints(&[10, 11, 12, 13, 14]).filter_indexed(move |_, i, r| {
            log.lock().unwrap().push(i);
            Ok(v(r) % 2 == 0 && i != 2)
        });
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![10, 14]);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn take_and_skip() {
        let ctx = Context::new();
        let q = ints(&[1, 2, 3, 4, 5]);
        assert_eq!(firsts(&q.take(2).collect(&ctx).unwrap()), vec![1, 2]);
        assert_eq!(firsts(&q.skip(3).collect(&ctx).unwrap()), vec![4, 5]);
        assert!(q.skip(9).collect(&ctx).unwrap().is_empty());
        assert_eq!(q.take(9).count(&ctx).unwrap(), 5);
        assert_eq!(firsts(&q.skip(1).take(2).collect(&ctx).unwrap()), vec![2, 3]);
    }

    #[test]
    fn take_while_stops_at_first_failure() {
        let ctx = Context::new();
        let q = ints(&[1, 2, 5, 1]).take_while(|_, r| Ok(v(r) < 3));
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![1, 2]);

        let q = ints(&[7, 7, 7, 7]).take_while_indexed(|_, i, _| Ok(i < 3));
        assert_eq!(q.count(&ctx).unwrap(), 3);
    }

    #[test]
    fn skip_while_passes_everything_after_first_failure() {
        let ctx = Context::new();
        let q = ints(&[1, 2, 5, 1]).skip_while(|_, r| Ok(v(r) < 3));
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![5, 1]);

        let q = ints(&[4, 4, 4, 4]).skip_while_indexed(|_, i, _| Ok(i < 2));
        assert_eq!(q.count(&ctx).unwrap(), 2);
    }

    #[test]
    fn predicate_errors_propagate_unchanged() {
        let ctx = Context::new();
        let q = ints(&[1]).filter(|_, r| {
            r.get(0)
                .compare(&Value::from("x"), tagql_core::CompareOption::Strict)
                .map(|o| o.is_lt())
        });
        assert!(matches!(q.collect(&ctx), Err(Error::TypeMismatch { .. })));
    }
}
