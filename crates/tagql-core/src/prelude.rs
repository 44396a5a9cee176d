//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::context::Context;
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::record::{Column, Record};
pub use crate::table::Table;
pub use crate::value::{CompareOption, LikePattern, RegexpMatcher, Value};
