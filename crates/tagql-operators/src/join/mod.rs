//! Joins: hash join (inner/left/right), group join and cross product.
//!
//! Every form drains its inner operand on the first pull, so the inner side
//! must be finite; the outer side streams. Output follows outer order, and
//! inner order within each matching group.

mod cross;
mod group;
mod hash;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tagql_core::{Context, Record, Result, Value};

use crate::expr::{GroupSelector, ResultSelector, ValueReader};
use crate::query::Query;

use cross::FullJoin;
use group::GroupJoin;
use hash::HashJoin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOptions {
    /// Emit unmatched outer rows once, paired with an empty record.
    pub is_left: bool,
    /// Retry a missed key against every inner key with weak equality.
    pub weak_fallback: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            is_left: false,
            weak_fallback: true,
        }
    }
}

impl JoinOptions {
    pub fn inner() -> Self {
        Self::default()
    }

    pub fn left() -> Self {
        Self {
            is_left: true,
            ..Self::default()
        }
    }

    pub fn with_weak_fallback(mut self, weak_fallback: bool) -> Self {
        self.weak_fallback = weak_fallback;
        self
    }
}

impl Query {
    /// Hash join of `self` (outer) with `inner`.
    pub fn join<OK, IK, S>(
        &self,
        is_left: bool,
        inner: &Query,
        outer_key: OK,
        inner_key: IK,
        selector: S,
    ) -> Query
    where
        OK: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        IK: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        S: Fn(&Context, &Record, &Record) -> Result<Record> + Send + Sync + 'static,
    {
        self.join_with(
            JoinOptions {
                is_left,
                ..JoinOptions::default()
            },
            inner,
            outer_key,
            inner_key,
            selector,
        )
    }

    pub fn join_with<OK, IK, S>(
        &self,
        options: JoinOptions,
        inner: &Query,
        outer_key: OK,
        inner_key: IK,
        selector: S,
    ) -> Query
    where
        OK: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        IK: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        S: Fn(&Context, &Record, &Record) -> Result<Record> + Send + Sync + 'static,
    {
        self.hash_join(
            options,
            inner,
            Arc::new(outer_key),
            Arc::new(inner_key),
            Arc::new(selector),
        )
    }

    fn hash_join(
        &self,
        options: JoinOptions,
        inner: &Query,
        outer_key: ValueReader,
        inner_key: ValueReader,
        selector: ResultSelector,
    ) -> Query {
        let outer = self.clone();
        let inner = inner.clone();
        Query::new(move || {
            Box::new(HashJoin::new(
                outer.start(),
                inner.clone(),
                Arc::clone(&outer_key),
                Arc::clone(&inner_key),
                Arc::clone(&selector),
                options,
            ))
        })
    }

    /// Keeps every row of `inner`: the sides swap and a left join runs, with
    /// `selector` still receiving `(outer, inner)`.
    pub fn right_join<OK, IK, S>(
        &self,
        inner: &Query,
        outer_key: OK,
        inner_key: IK,
        selector: S,
    ) -> Query
    where
        OK: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        IK: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        S: Fn(&Context, &Record, &Record) -> Result<Record> + Send + Sync + 'static,
    {
        inner.join_with(
            JoinOptions::left(),
            self,
            inner_key,
            outer_key,
            move |ctx: &Context, i: &Record, o: &Record| selector(ctx, o, i),
        )
    }

    /// One row per outer row from `selector(outer, group)`; unmatched rows
    /// get an empty group.
    pub fn group_join<OK, IK, S>(
        &self,
        inner: &Query,
        outer_key: OK,
        inner_key: IK,
        selector: S,
    ) -> Query
    where
        OK: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        IK: Fn(&Context, &Record) -> Result<Value> + Send + Sync + 'static,
        S: Fn(&Context, &Record, &[Record]) -> Result<Record> + Send + Sync + 'static,
    {
        let outer = self.clone();
        let inner = inner.clone();
        let outer_key: ValueReader = Arc::new(outer_key);
        let inner_key: ValueReader = Arc::new(inner_key);
        let selector: GroupSelector = Arc::new(selector);
        let weak = JoinOptions::default().weak_fallback;
        Query::new(move || {
            Box::new(GroupJoin::new(
                outer.start(),
                inner.clone(),
                Arc::clone(&outer_key),
                Arc::clone(&inner_key),
                Arc::clone(&selector),
                weak,
            ))
        })
    }

    /// Cross product, used for comma-separated FROM lists without ON.
    pub fn full_join<S>(&self, inner: &Query, selector: S) -> Query
    where
        S: Fn(&Context, &Record, &Record) -> Result<Record> + Send + Sync + 'static,
    {
        let outer = self.clone();
        let inner = inner.clone();
        let selector: ResultSelector = Arc::new(selector);
        Query::new(move || {
            Box::new(FullJoin::new(
                outer.start(),
                inner.clone(),
                Arc::clone(&selector),
            ))
        })
    }
}
