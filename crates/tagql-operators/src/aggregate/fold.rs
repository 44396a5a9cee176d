//! Terminal folds: pull a query to exhaustion, combining as rows arrive.

use tagql_core::{Context, Record, Result};

use crate::query::Query;
use crate::traits::Step;

impl Query {
    /// Fold with the first row as the seed. `None` when the query is empty.
    pub fn aggregate<F>(&self, ctx: &Context, f: F) -> Result<Option<Record>>
    where
        F: Fn(&Context, &Record, &Record) -> Result<Record>,
    {
        let mut it = self.start();
        let mut acc = match it.next(ctx)? {
            Step::Yield(r) => r,
            Step::End => return Ok(None),
        };
        while let Step::Yield(r) = it.next(ctx)? {
            acc = f(ctx, &acc, &r)?;
        }
        Ok(Some(acc))
    }

    /// Fold from `seed`; an empty query yields the seed itself.
    pub fn aggregate_with_seed<F>(&self, ctx: &Context, seed: Record, f: F) -> Result<Record>
    where
        F: Fn(&Context, &Record, &Record) -> Result<Record>,
    {
        let mut it = self.start();
        let mut acc = seed;
        while let Step::Yield(r) = it.next(ctx)? {
            acc = f(ctx, &acc, &r)?;
        }
        Ok(acc)
    }

    /// `aggregate_with_seed` followed by `result` on the final accumulator.
    pub fn aggregate_with_seed_by<F, R>(
        &self,
        ctx: &Context,
        seed: Record,
        f: F,
        result: R,
    ) -> Result<Record>
    where
        F: Fn(&Context, &Record, &Record) -> Result<Record>,
        R: FnOnce(&Context, Record) -> Result<Record>,
    {
        let acc = self.aggregate_with_seed(ctx, seed, f)?;
        result(ctx, acc)
    }
}
