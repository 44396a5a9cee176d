//! Engine configuration that downstream crates can serialize/deserialize.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-query deadline. `None` lets a query run until it finishes.
    pub query_timeout_ms: Option<u64>,

    /// Largest result set `execute` will return; larger ones fail whole.
    pub max_result_rows: Option<usize>,

    /// Append a measurement's tag keys as columns when scanning it.
    pub include_tag_columns: bool,

    /// Allow joins to fall back to weak key equality after an exact miss.
    pub weak_join_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: None,
            max_result_rows: None,
            include_tag_columns: true,
            weak_join_keys: true,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TAGQL_QUERY_TIMEOUT_MS`: per-query deadline in milliseconds
    /// - `TAGQL_MAX_RESULT_ROWS`: result row cap
    /// - `TAGQL_INCLUDE_TAG_COLUMNS`: `true`/`false`
    /// - `TAGQL_WEAK_JOIN_KEYS`: `true`/`false`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TAGQL_QUERY_TIMEOUT_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.query_timeout_ms = Some(v);
            }
        }

        if let Ok(s) = std::env::var("TAGQL_MAX_RESULT_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_result_rows = Some(v);
            }
        }

        if let Ok(s) = std::env::var("TAGQL_INCLUDE_TAG_COLUMNS") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.include_tag_columns = v;
            }
        }

        if let Ok(s) = std::env::var("TAGQL_WEAK_JOIN_KEYS") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.weak_join_keys = v;
            }
        }

        cfg
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}
