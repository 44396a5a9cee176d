#![forbid(unsafe_code)]
//! tagql-operators: pull-based relational operators over `Record`s.
//!
//! Design intent:
//! - A [`Query`] is a restartable description; `start()` builds a fresh
//!   cursor chain and nothing runs until the caller pulls.
//! - Every cursor checks the [`tagql_core::Context`] before each step, so
//!   cancellation and deadlines are observed at row granularity.
//! - Operators that must see a whole operand (sort, join inner side, set
//!   probes, GROUP BY) materialize it on their first pull.

pub mod expr;
pub mod query;
pub mod registry;
pub mod traits;

pub mod aggregate;
pub mod concat;
pub mod filter;
pub mod map;
pub mod set;

pub mod join;
pub mod sort;

pub use aggregate::{AggregateSpec, Aggregator, AggregatorBox, Avg, Count, Max, Min, Sum};
pub use join::JoinOptions;
pub use query::Query;
pub use registry::{AggregatorFactory, AggregatorRegistry, AggregatorRegistryBuilder};
pub use sort::{sort_records, OrderedQuery, SortKey};
pub use traits::{drain, BoxIter, RecordIterator, Step};
