#![forbid(unsafe_code)]
//! tagql-exec: binds storage, the aggregator registry and configuration into
//! an `Engine` that turns measurements into source queries and drives
//! queries to completion.

pub mod metrics;
pub mod report;
pub mod result;
pub mod runtime;

pub use report::{QueryId, QueryReport};
pub use result::ResultSet;
pub use runtime::Engine;
