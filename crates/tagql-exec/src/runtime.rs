//! Runtime: bind storage to queries and drive them to completion.
//!
//! - `scan` snapshots matching measurements and exposes them as a `Query`.
//! - `execute` pulls a query under the configured deadline and row cap,
//!   returning every row or the first error, never a partial result.
//! - Each execution is reported with a fresh `QueryId` and an output digest.

use std::io::BufRead;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use tagql_core::hash::hash_lines;
use tagql_core::{Column, Context, EngineConfig, Error, Record, Result, Table, Value};
use tagql_io::readers::read_jsonl;
use tagql_io::{Measurement, Storage, TagFilter, TagSet};
use tagql_operators::{AggregatorRegistry, JoinOptions, Query, Step};

use crate::metrics::emit_span;
use crate::report::{QueryId, QueryReport};
use crate::result::ResultSet;

/// Engine owns the storage handle, aggregator registry and configuration.
pub struct Engine {
    cfg: EngineConfig,
    storage: Arc<dyn Storage>,
    registry: AggregatorRegistry,
}

impl Engine {
    pub fn new(cfg: EngineConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            cfg,
            storage,
            registry: AggregatorRegistry::with_builtins(),
        }
    }

    pub fn with_registry(mut self, registry: AggregatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &AggregatorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Join options honoring `weak_join_keys`.
    pub fn join_options(&self, is_left: bool) -> JoinOptions {
        JoinOptions {
            is_left,
            weak_fallback: self.cfg.weak_join_keys,
        }
    }

    /// Store one measurement. `ingest_error` keeps any prior data in place.
    pub fn ingest(&self, name: &str, tags: TagSet, table: Table, ingest_error: Option<String>) -> Result<()> {
        debug!(table = name, tags = %tags, rows = table.len(), failed = ingest_error.is_some(), "ingest");
        self.storage.set(name, tags, table, ingest_error)?;
        Ok(())
    }

    /// Parse NDJSON into a measurement. A parse failure is recorded against
    /// the measurement and returned.
    pub fn ingest_jsonl<R: BufRead>(&self, name: &str, tags: TagSet, reader: R) -> Result<()> {
        match read_jsonl(reader) {
            Ok(table) => self.ingest(name, tags, table, None),
            Err(e) => {
                let msg = e.to_string();
                warn!(table = name, error = %msg, "jsonl ingest failed");
                self.ingest(name, tags, Table::default(), Some(msg))?;
                Err(e.into())
            }
        }
    }

    /// A source query over every measurement of `name` matching `filter`,
    /// in canonical tag order. The data is copied out now; later writes are
    /// not visible to the returned query.
    pub fn scan(&self, name: &str, filter: &TagFilter) -> Result<Query> {
        let measurements = self.storage.from(name, filter)?;
        let mut records = Vec::new();
        for m in &measurements {
            records.extend(self.measurement_records(m)?);
        }
        debug!(table = name, measurements = measurements.len(), rows = records.len(), "scan");
        Ok(Query::from_records(records))
    }

    /// Rows of one measurement with its tags appended as columns. A tag
    /// key naming an existing field column is rejected.
    fn measurement_records(&self, m: &Measurement) -> Result<Vec<Record>> {
        let mut table = m.table.clone();
        table.qualify(&m.name);
        if self.cfg.include_tag_columns {
            for (k, v) in m.tags.iter() {
                if table.columns.iter().any(|c| c.name == k) {
                    return Err(Error::TagColumnConflict {
                        table: m.name.clone(),
                        tag: k.to_string(),
                    });
                }
                let at = table.add_column(Column::qualified(m.name.as_str(), k));
                for row in &mut table.rows {
                    if row.len() <= at {
                        row.resize(at + 1, Value::Null);
                    }
                    row[at] = Value::from(v);
                }
            }
        }
        Ok(table.records().collect())
    }

    pub fn execute(&self, query: &Query) -> Result<ResultSet> {
        self.execute_with(&Context::new(), query)
    }

    /// Drive `query` under `ctx`, tightened by `query_timeout_ms`.
    pub fn execute_with(&self, ctx: &Context, query: &Query) -> Result<ResultSet> {
        let ctx = match self.cfg.query_timeout() {
            Some(t) => ctx.with_timeout(t),
            None => ctx.clone(),
        };
        let id = QueryId::new();
        let started_ms = now_millis();
        debug!(query = %id, "query started");

        let rows = match self.pull(&ctx, query) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(query = %id, error = %e, "query failed");
                return Err(e);
            }
        };

        let columns = rows.first().map(|r| r.columns.clone()).unwrap_or_default();
        let header = columns
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let lines: Vec<String> = rows.iter().map(Record::to_line).collect();
        let output_digest = hash_lines(std::iter::once(header.as_str()).chain(lines.iter().map(String::as_str)));

        let report = QueryReport {
            id,
            rows: rows.len(),
            started_ms,
            finished_ms: now_millis(),
            output_digest,
        };
        info!(
            query = %id,
            rows = report.rows,
            elapsed_ms = report.elapsed_ms(),
            digest = %report.output_digest,
            "query finished"
        );
        emit_span(
            "query",
            &[
                ("rows", report.rows.to_string()),
                ("elapsed_ms", report.elapsed_ms().to_string()),
            ],
        );
        Ok(ResultSet {
            columns,
            rows,
            report,
        })
    }

    fn pull(&self, ctx: &Context, query: &Query) -> Result<Vec<Record>> {
        let mut it = query.start();
        let mut rows = Vec::new();
        loop {
            ctx.check()?;
            match it.next(ctx)? {
                Step::Yield(r) => {
                    if let Some(max) = self.cfg.max_result_rows {
                        if rows.len() >= max {
                            return Err(Error::LimitExceeded(format!(
                                "result exceeds {max} rows"
                            )));
                        }
                    }
                    rows.push(r);
                }
                Step::End => return Ok(rows),
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
