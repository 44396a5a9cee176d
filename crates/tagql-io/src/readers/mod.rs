//! Ingestion readers that build a `Table` from text input.

pub mod jsonl;

pub use jsonl::read_jsonl;
