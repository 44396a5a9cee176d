//! Projection: select, select_values, select_many and zip.

use std::sync::Arc;

use tagql_core::{Column, Context, Record, Result};

use crate::expr::{IndexedSelector, ManySelector, ResultSelector, ValueReader};
use crate::query::Query;
use crate::traits::{BoxIter, RecordIterator, Step};

impl Query {
    pub fn select<F>(&self, sel: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<Record> + Send + Sync + 'static,
    {
        self.select_with(Arc::new(move |ctx: &Context, _: usize, r: &Record| sel(ctx, r)))
    }

    pub fn select_indexed<F>(&self, sel: F) -> Query
    where
        F: Fn(&Context, usize, &Record) -> Result<Record> + Send + Sync + 'static,
    {
        self.select_with(Arc::new(sel))
    }

    fn select_with(&self, sel: IndexedSelector) -> Query {
        let parent = self.clone();
        Query::new(move || {
            Box::new(Select {
                src: parent.start(),
                sel: Arc::clone(&sel),
                index: 0,
            })
        })
    }

    /// A SELECT list: output column `i` is `readers[i]` applied to each row.
    pub fn select_values(&self, columns: Vec<Column>, readers: Vec<ValueReader>) -> Query {
        let parent = self.clone();
        let columns = Arc::new(columns);
        let readers = Arc::new(readers);
        Query::new(move || {
            Box::new(SelectValues {
                src: parent.start(),
                columns: Arc::clone(&columns),
                readers: Arc::clone(&readers),
            })
        })
    }

    /// Flatten the query `sel` returns for each row.
    pub fn select_many<F>(&self, sel: F) -> Query
    where
        F: Fn(&Context, &Record) -> Result<Query> + Send + Sync + 'static,
    {
        let parent = self.clone();
        let sel: ManySelector = Arc::new(sel);
        Query::new(move || {
            Box::new(SelectMany {
                src: parent.start(),
                sel: Arc::clone(&sel),
                current: None,
            })
        })
    }

    /// Pair rows positionally; ends with the shorter side.
    pub fn zip<F>(&self, other: &Query, sel: F) -> Query
    where
        F: Fn(&Context, &Record, &Record) -> Result<Record> + Send + Sync + 'static,
    {
        let left = self.clone();
        let right = other.clone();
        let sel: ResultSelector = Arc::new(sel);
        Query::new(move || {
            Box::new(Zip {
                left: left.start(),
                right: right.start(),
                sel: Arc::clone(&sel),
                done: false,
            })
        })
    }
}

struct Select {
    src: BoxIter,
    sel: IndexedSelector,
    index: usize,
}

impl RecordIterator for Select {
    fn name(&self) -> &'static str {
        "select"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        match self.src.next(ctx)? {
            Step::Yield(r) => {
                let i = self.index;
                self.index += 1;
                Ok(Step::Yield((self.sel)(ctx, i, &r)?))
            }
            Step::End => Ok(Step::End),
        }
    }
}

struct SelectValues {
    src: BoxIter,
    columns: Arc<Vec<Column>>,
    readers: Arc<Vec<ValueReader>>,
}

impl RecordIterator for SelectValues {
    fn name(&self) -> &'static str {
        "select_values"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        let r = match self.src.next(ctx)? {
            Step::Yield(r) => r,
            Step::End => return Ok(Step::End),
        };
        let values = self
            .readers
            .iter()
            .map(|read| read(ctx, &r))
            .collect::<Result<Vec<_>>>()?;
        Ok(Step::Yield(Record::new(self.columns.as_ref().clone(), values)))
    }
}

struct SelectMany {
    src: BoxIter,
    sel: ManySelector,
    current: Option<BoxIter>,
}

impl RecordIterator for SelectMany {
    fn name(&self) -> &'static str {
        "select_many"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        loop {
            ctx.check()?;
            if let Some(inner) = self.current.as_mut() {
                match inner.next(ctx)? {
                    Step::Yield(r) => return Ok(Step::Yield(r)),
                    Step::End => self.current = None,
                }
            }
            match self.src.next(ctx)? {
                Step::Yield(r) => self.current = Some((self.sel)(ctx, &r)?.start()),
                Step::End => return Ok(Step::End),
            }
        }
    }
}

struct Zip {
    left: BoxIter,
    right: BoxIter,
    sel: ResultSelector,
    done: bool,
}

impl RecordIterator for Zip {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        if self.done {
            return Ok(Step::End);
        }
        let (a, b) = match (self.left.next(ctx)?, self.right.next(ctx)?) {
            (Step::Yield(a), Step::Yield(b)) => (a, b),
            _ => {
                self.done = true;
                return Ok(Step::End);
            }
        };
        Ok(Step::Yield((self.sel)(ctx, &a, &b)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{column, constant};
    use crate::query::test_util::*;
    use tagql_core::Value;

    #[test]
    fn select_rebuilds_rows() {
        let ctx = Context::new();
        let q = ints(&[1, 2]).select_indexed(|_, i, r| {
            Ok(Record::from_pairs([
                ("i", Value::Int(i as i64)),
                ("double", r.get(0).mult(&Value::Int(2))?),
            ]))
        });
        let rows = q.collect(&ctx).unwrap();
        assert_eq!(rows[1].to_line(), "1,4");
        assert_eq!(rows[1].header_line(), "i,double");
    }

    #[test]
    fn select_values_uses_one_reader_per_column() {
        let ctx = Context::new();
        let q = ints(&[5]).select_values(
            vec![Column::new("x"), Column::new("k")],
            vec![column("v"), constant(Value::from("c"))],
        );
        assert_eq!(q.collect(&ctx).unwrap()[0].to_line(), "5,\"c\"");

        let bad = ints(&[5]).select_values(vec![Column::new("x")], vec![column("nope")]);
        assert!(bad.collect(&ctx).is_err());
    }

    #[test]
    fn select_many_flattens_and_skips_empty_children() {
        let ctx = Context::new();
        let q = ints(&[0, 2, 1]).select_many(|_, r| {
            let n = r.get(0).as_int().unwrap_or(0);
            Ok(ints(&vec![n; n as usize]))
        });
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![2, 2, 1]);
    }

    #[test]
    fn zip_stops_at_shorter_side() {
        let ctx = Context::new();
        let q = ints(&[1, 2, 3]).zip(&ints(&[10, 20]), |_, a, b| {
            Ok(Record::from_pairs([("s", a.get(0).plus(b.get(0))?)]))
        });
        assert_eq!(firsts(&q.collect(&ctx).unwrap()), vec![11, 22]);
    }
}
