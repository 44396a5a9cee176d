use thiserror::Error;

/// Canonical result for core and every crate built on it.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("type mismatch: cannot {op} {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("comparison error: {0}")]
    Compare(String),

    #[error("could not {op} {left} {symbol} {right}")]
    Operation {
        op: &'static str,
        symbol: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("could not {op} {operand}")]
    UnaryOperation {
        op: &'static str,
        operand: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow: {0}")]
    Overflow(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid regular expression: {0}")]
    Regex(String),

    #[error("unknown aggregate function '{0}'")]
    UnknownAggregate(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("tag '{tag}' of {table} collides with a field column")]
    TagColumnConflict { table: String, tag: String },

    #[error("table not found: {0}")]
    NotFound(String),

    // Storage lives in a higher crate; it maps its failures into this variant.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("query deadline exceeded")]
    DeadlineExceeded,

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    /// True when a table or measurement lookup found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True for the two context-driven aborts.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::Regex(e.to_string())
    }
}
