//! In-memory measurement store.
//!
//! A single mutex guards the whole map; `from` copies the matching
//! measurements out while holding it, so callers iterate without the lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use tagql_core::Table;

use crate::error::{Result, StorageError};
use crate::storage::{Measurement, Storage, TagFilter, TagSet};

type Measurements = HashMap<String, BTreeMap<String, Measurement>>;

/// Thread-safe store keyed by table name, then canonical tags.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<Measurements>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Measurements>> {
        self.data.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Store `table` under `name` with no error.
    pub fn insert(&self, name: &str, tags: TagSet, table: Table) -> Result<()> {
        self.set(name, tags, table, None)
    }

    /// Number of measurements across all tables.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.values().map(BTreeMap::len).sum())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn from(&self, name: &str, filter: &TagFilter) -> Result<Vec<Measurement>> {
        let data = self.lock()?;
        let tables = data
            .get(name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        // BTreeMap order is canonical tag order.
        Ok(tables
            .values()
            .filter(|m| filter.matches(&m.tags))
            .cloned()
            .collect())
    }

    fn set(&self, name: &str, tags: TagSet, table: Table, ingest_error: Option<String>) -> Result<()> {
        let mut data = self.lock()?;
        let key = tags.canonical();
        let tables = data.entry(name.to_string()).or_default();
        if let (Some(prev), Some(err)) = (tables.get_mut(&key), ingest_error.as_ref()) {
            debug!(table = name, tags = %key, error = %err, "ingest failed; keeping prior data");
            prev.last_error = Some(err.clone());
            return Ok(());
        }
        let mut m = Measurement::new(name, tags, table);
        m.last_error = ingest_error;
        tables.insert(key, m);
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn remove(&self, name: &str, tags: &TagSet) -> Result<bool> {
        let mut data = self.lock()?;
        let Some(tables) = data.get_mut(name) else {
            return Ok(false);
        };
        let removed = tables.remove(&tags.canonical()).is_some();
        if tables.is_empty() {
            data.remove(name);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagql_core::Value;

    fn table(v: i64) -> Table {
        let mut t = Table::with_column_names(&["v"]);
        t.push_row(vec![Value::Int(v)]);
        t
    }

    fn host(h: &str) -> TagSet {
        TagSet::new().with("host", h)
    }

    #[test]
    fn unknown_table_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.from("cpu", &TagFilter::All).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref n) if n == "cpu"));
    }

    #[test]
    fn measurements_come_back_in_tag_order() {
        let storage = MemoryStorage::new();
        storage.insert("cpu", host("b"), table(2)).unwrap();
        storage.insert("cpu", host("a"), table(1)).unwrap();
        let ms = storage.from("cpu", &TagFilter::All).unwrap();
        let names: Vec<String> = ms.iter().map(|m| m.qualified_name()).collect();
        assert_eq!(names, vec!["cpu,host=a", "cpu,host=b"]);
    }

    #[test]
    fn filter_may_match_nothing() {
        let storage = MemoryStorage::new();
        storage.insert("cpu", host("a"), table(1)).unwrap();
        let ms = storage.from("cpu", &TagFilter::Equals(host("z"))).unwrap();
        assert!(ms.is_empty());
    }

    #[test]
    fn failed_ingest_keeps_prior_table() {
        let storage = MemoryStorage::new();
        storage.insert("cpu", host("a"), table(1)).unwrap();
        storage
            .set("cpu", host("a"), table(99), Some("truncated input".into()))
            .unwrap();
        let ms = storage.from("cpu", &TagFilter::All).unwrap();
        assert_eq!(ms[0].table, table(1));
        assert_eq!(ms[0].last_error.as_deref(), Some("truncated input"));

        // A clean ingest replaces the data and clears the error.
        storage.insert("cpu", host("a"), table(2)).unwrap();
        let ms = storage.from("cpu", &TagFilter::All).unwrap();
        assert_eq!(ms[0].table, table(2));
        assert_eq!(ms[0].last_error, None);
    }

    #[test]
    fn failed_first_ingest_stores_what_arrived() {
        let storage = MemoryStorage::new();
        storage.set("mem", TagSet::new(), table(5), Some("partial".into())).unwrap();
        let ms = storage.from("mem", &TagFilter::All).unwrap();
        assert_eq!(ms[0].table, table(5));
        assert_eq!(ms[0].last_error.as_deref(), Some("partial"));
    }

    #[test]
    fn snapshots_are_isolated_from_later_writes() {
        let storage = MemoryStorage::new();
        storage.insert("cpu", host("a"), table(1)).unwrap();
        let snapshot = storage.from("cpu", &TagFilter::All).unwrap();
        storage.insert("cpu", host("a"), table(2)).unwrap();
        assert_eq!(snapshot[0].table, table(1));
    }

    #[test]
    fn remove_and_names() {
        let storage = MemoryStorage::new();
        storage.insert("mem", TagSet::new(), table(1)).unwrap();
        storage.insert("cpu", host("a"), table(1)).unwrap();
        assert_eq!(storage.names().unwrap(), vec!["cpu", "mem"]);
        assert!(storage.remove("cpu", &host("a")).unwrap());
        assert!(!storage.remove("cpu", &host("a")).unwrap());
        assert_eq!(storage.names().unwrap(), vec!["mem"]);
        assert_eq!(storage.len().unwrap(), 1);
        storage.clear().unwrap();
        assert!(storage.is_empty().unwrap());
    }

    #[test]
    fn clones_share_state() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        other.insert("cpu", TagSet::new(), table(1)).unwrap();
        assert_eq!(storage.len().unwrap(), 1);
    }
}
