use tagql_core::{Context, Record, Result};

use crate::query::Query;
use crate::traits::{BoxIter, RecordIterator, Step};

impl Query {
    /// Every row of `self`, then every row of `other`.
    pub fn concat(&self, other: &Query) -> Query {
        let first = self.clone();
        let second = other.clone();
        Query::new(move || {
            Box::new(Concat {
                first: first.start(),
                second: second.start(),
                on_second: false,
            })
        })
    }

    pub fn append(&self, record: Record) -> Query {
        self.concat(&Query::from_records(vec![record]))
    }

    pub fn prepend(&self, record: Record) -> Query {
        Query::from_records(vec![record]).concat(self)
    }
}

struct Concat {
    first: BoxIter,
    second: BoxIter,
    on_second: bool,
}

impl RecordIterator for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn next(&mut self, ctx: &Context) -> Result<Step> {
        ctx.check()?;
        if !self.on_second {
            match self.first.next(ctx)? {
                Step::Yield(r) => return Ok(Step::Yield(r)),
                Step::End => self.on_second = true,
            }
        }
        self.second.next(ctx)
    }
}
