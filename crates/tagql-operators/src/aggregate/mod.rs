//! Aggregation.
//!
//! Two families live here:
//! - terminal folds (`aggregate`, `aggregate_with_seed`,
//!   `aggregate_with_seed_by`) reduce a whole query to one record with a
//!   combining function;
//! - `aggregate_with`, `aggregate_with_func` and `group_by_aggregate` drive
//!   [`Aggregator`] instances, one per [`AggregateSpec`], over a single pass.
//!
//! Each start of an aggregating query creates every aggregator exactly once
//! (per group) and feeds it every input row exactly once, in source order.

mod builtin;
mod fold;
mod group;

use std::fmt;
use std::sync::Arc;

use tagql_core::{Context, Record, Result, Value};

pub use builtin::{Avg, Count, Max, Min, Sum};

/// Stateful accumulator behind one aggregate expression.
pub trait Aggregator: Send {
    fn accumulate(&mut self, ctx: &Context, record: &Record) -> Result<()>;

    fn result(&self) -> Result<Value>;
}

pub type AggregatorBox = Box<dyn Aggregator>;

/// An output column name plus a factory for fresh aggregator instances.
#[derive(Clone)]
pub struct AggregateSpec {
    pub name: String,
    make: Arc<dyn Fn() -> AggregatorBox + Send + Sync>,
}

impl AggregateSpec {
    pub fn new<F>(name: impl Into<String>, make: F) -> Self
    where
        F: Fn() -> AggregatorBox + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            make: Arc::new(make),
        }
    }

    pub fn instantiate(&self) -> AggregatorBox {
        (self.make)()
    }
}

impl fmt::Debug for AggregateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
