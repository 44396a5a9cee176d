//! NDJSON ingestion: one JSON object per line.

use std::io::BufRead;

use tracing::trace;

use tagql_core::{Column, Table, Value};

use crate::error::{Result, StorageError};

/// Read every object into a table. Keys not seen before become new columns,
/// so earlier rows read null there. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Table> {
    let mut table = Table::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: serde_json::Value = serde_json::from_str(line).map_err(|e| StorageError::Ingest {
            line: i + 1,
            reason: e.to_string(),
        })?;
        let serde_json::Value::Object(obj) = parsed else {
            return Err(StorageError::Ingest {
                line: i + 1,
                reason: "expected a JSON object".into(),
            });
        };
        let mut row: Vec<Value> = Vec::with_capacity(table.columns.len());
        for (key, v) in &obj {
            let at = table.add_column(Column::new(key.as_str()));
            if row.len() <= at {
                row.resize(at + 1, Value::Null);
            }
            row[at] = Value::from_json(v);
        }
        table.push_row(row);
    }
    trace!(rows = table.len(), columns = table.columns.len(), "read jsonl");
    Ok(table)
}
