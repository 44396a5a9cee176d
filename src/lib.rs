#![forbid(unsafe_code)]
//! tagql: an in-memory relational query engine over tagged measurements.
//!
//! This crate re-exports the workspace so callers depend on one name:
//! - [`tagql_core`]: values, records, tables, contexts, errors and configuration
//! - [`tagql_operators`]: the pull-based operator library and aggregators
//! - [`tagql_io`]: the measurement store and line readers/writers
//! - [`tagql_exec`]: the `Engine` that binds them together

pub use tagql_core;
pub use tagql_exec;
pub use tagql_io;
pub use tagql_operators;

pub use tagql_core::{Column, CompareOption, Context, EngineConfig, Error, Record, Result, Table, Value};
pub use tagql_exec::{Engine, QueryReport, ResultSet};
pub use tagql_io::{MemoryStorage, Storage, TagFilter, TagSet};
pub use tagql_operators::{AggregateSpec, AggregatorRegistry, JoinOptions, OrderedQuery, Query, SortKey};

pub mod prelude {
    pub use tagql_core::prelude::*;
    pub use tagql_exec::{Engine, ResultSet};
    pub use tagql_io::{MemoryStorage, Storage, TagFilter, TagSet};
    pub use tagql_operators::expr::{column, constant, position};
    pub use tagql_operators::{
        AggregateSpec, AggregatorRegistry, JoinOptions, OrderedQuery, Query, RecordIterator, SortKey, Step,
    };
}
