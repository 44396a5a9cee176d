//! tagql-core: values, rows and the shared error/config types.
//!
//! Nothing here knows about operators, storage or execution.

#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod record;
pub mod table;
pub mod value;

pub use config::EngineConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use hash::Hash256;
pub use record::{Column, Record};
pub use table::Table;
pub use value::{CompareOption, Value};
