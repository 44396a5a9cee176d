//! Pull cursor shared by every operator.
//!
//! A cursor is driven by one caller making sequential `next` calls. Each call
//! checks the [`Context`] before doing per-record work, so a cancelled or
//! expired query stops between records with an error that is distinct from
//! [`Step::End`].
//!
//! Invariants:
//! - After returning `Step::End` once, a cursor keeps returning it.
//! - Errors from a source are returned unchanged; no operator retries or
//!   recovers on its source's behalf.

use tagql_core::{Context, Record, Result};

/// One pull result. Exhaustion is a value, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Yield(Record),
    End,
}

impl Step {
    pub fn into_record(self) -> Option<Record> {
        match self {
            Step::Yield(r) => Some(r),
            Step::End => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Step::End)
    }
}

pub trait RecordIterator: Send {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    fn next(&mut self, ctx: &Context) -> Result<Step>;
}

pub type BoxIter = Box<dyn RecordIterator>;

/// Pull `it` to exhaustion.
pub fn drain(it: &mut dyn RecordIterator, ctx: &Context) -> Result<Vec<Record>> {
    let mut out = Vec::new();
    while let Step::Yield(r) = it.next(ctx)? {
        out.push(r);
    }
    Ok(out)
}
