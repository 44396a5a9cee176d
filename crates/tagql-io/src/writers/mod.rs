//! Record writers.

pub mod jsonl;
pub mod line;

pub use jsonl::JsonlWriter;
pub use line::LineWriter;
