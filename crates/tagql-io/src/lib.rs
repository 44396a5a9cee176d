#![forbid(unsafe_code)]
//! tagql-io: the tagged-measurement store and text readers/writers.
//!
//! - `storage`: the `Storage` contract, tag sets and filters.
//! - `memory_storage`: a mutex-guarded in-process implementation.
//! - `readers` / `writers`: JSON-lines ingestion and record-line output.

pub mod error;
pub mod memory_storage;
pub mod readers;
pub mod storage;
pub mod writers;

pub use error::{Result, StorageError};
pub use memory_storage::MemoryStorage;
pub use storage::{Measurement, Storage, TagFilter, TagSet};
