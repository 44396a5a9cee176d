//! Re-startable pipeline descriptions.
//!
//! A `Query` holds only a start function. Every operator method wraps the
//! parent's start function in a new one that builds fresh cursor state, so
//! the same `Query` value can be iterated any number of times.

use std::fmt;
use std::sync::Arc;

use tagql_core::{Context, Record, Result, Table};

use crate::traits::{drain, BoxIter, RecordIterator, Step};

#[derive(Clone)]
pub struct Query {
    start: Arc<dyn Fn() -> BoxIter + Send + Sync>,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").finish_non_exhaustive()
    }
}

impl Query {
    pub fn new<F>(start: F) -> Self
    where
        F: Fn() -> BoxIter + Send + Sync + 'static,
    {
        Self {
            start: Arc::new(start),
        }
    }

    /// A fresh cursor over this pipeline.
    pub fn start(&self) -> BoxIter {
        (self.start)()
    }

    pub fn empty() -> Self {
        Query::new(|| Box::new(Empty))
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        let rows = Arc::new(records);
        Query::new(move || {
            Box::new(Records {
                rows: Arc::clone(&rows),
                pos: 0,
            })
        })
    }

    pub fn from_table(table: Table) -> Self {
        let table = Arc::new(table);
        Query::new(move || {
            Box::new(TableRows {
                table: Arc::clone(&table),
                pos: 0,
            })
        })
    }

    pub fn collect(&self, ctx: &Context) -> Result<Vec<Record>> {
        drain(self.start().as_mut(), ctx)
    }

    pub fn count(&self, ctx: &Context) -> Result<usize> {
        let mut it = self.start();
        let mut n = 0;
        while let Step::Yield(_) = it.next(ctx)? {
            n += 1;
        }
        Ok(n)
    }

    pub fn first(&self, ctx: &Context) -> Result<Option<Record>> {
        Ok(self.start().next(ctx)?.into_record())
    }

    pub fn for_each<F>(&self, ctx: &Context, mut f: F) -> Result<()>
    where
        F: FnMut(Record) -> Result<()>,
    {
        let mut it = self.start();
        while let Step::Yield(r) = it.next(ctx)? {
            f(r)?;
        }
        Ok(())
    }
}

struct Empty;

impl RecordIterator for Empty {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        Ok(Step::End)
    }
}

struct Records {
    rows: Arc<Vec<Record>>,
    pos: usize,
}

impl RecordIterator for Records {
    fn name(&self) -> &'static str {
        "records"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        match self.rows.get(self.pos) {
            Some(r) => {
                self.pos += 1;
                Ok(Step::Yield(r.clone()))
            }
            None => Ok(Step::End),
        }
    }
}

struct TableRows {
    table: Arc<Table>,
    pos: usize,
}

impl RecordIterator for TableRows {
    fn name(&self) -> &'static str {
        "table"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        match self.table.at(self.pos) {
            Some(r) => {
                self.pos += 1;
                Ok(Step::Yield(r))
            }
            None => Ok(Step::End),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use tagql_core::{Record, Value};

    use super::Query;

    /// One-column rows named `v`.
    pub fn ints(values: &[i64]) -> Query {
        Query::from_records(values.iter().map(|v| row(*v)).collect())
    }

    pub fn row(v: i64) -> Record {
        Record::from_pairs([("v", Value::Int(v))])
    }

    pub fn firsts(rows: &[Record]) -> Vec<i64> {
        rows.iter().map(|r| r.get(0).as_int().unwrap_or(i64::MIN)).collect()
    }
}
