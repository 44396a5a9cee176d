//! The storage contract: named tables, each split into measurements keyed by
//! a tag set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tagql_core::Table;

use crate::error::{Result, StorageError};

/// Tag key/value pairs, kept sorted so the canonical form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `k=v,k2=v2` in key order; empty for no tags.
    pub fn canonical(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Inverse of `canonical`. Whitespace around keys and values is dropped.
    pub fn parse(s: &str) -> Result<Self> {
        let mut tags = TagSet::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (k, v) = pair
                .split_once('=')
                .ok_or_else(|| StorageError::InvalidTags(s.to_string()))?;
            let k = k.trim();
            if k.is_empty() {
                return Err(StorageError::InvalidTags(s.to_string()));
            }
            tags.insert(k, v.trim());
        }
        Ok(tags)
    }

    /// Every pair of `other` is present here with the same value.
    pub fn contains_all(&self, other: &TagSet) -> bool {
        other.iter().all(|(k, v)| self.get(k) == Some(v))
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TagSet(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One tagged instance of a named table.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub tags: TagSet,
    pub table: Table,
    /// Error reported by the most recent ingest, if any.
    pub last_error: Option<String>,
}

impl Measurement {
    pub fn new(name: impl Into<String>, tags: TagSet, table: Table) -> Self {
        Self {
            name: name.into(),
            tags,
            table,
            last_error: None,
        }
    }

    /// `name`, or `name,k=v,...` when tagged.
    pub fn qualified_name(&self) -> String {
        if self.tags.is_empty() {
            self.name.clone()
        } else {
            format!("{},{}", self.name, self.tags.canonical())
        }
    }
}

/// Selects measurements of one table by their tags.
#[derive(Clone, Default)]
pub enum TagFilter {
    #[default]
    All,
    /// Measurements carrying at least these pairs.
    Equals(TagSet),
    Custom(Arc<dyn Fn(&TagSet) -> bool + Send + Sync>),
}

impl TagFilter {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&TagSet) -> bool + Send + Sync + 'static,
    {
        TagFilter::Custom(Arc::new(f))
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Equals(want) => tags.contains_all(want),
            TagFilter::Custom(f) => f(tags),
        }
    }
}

impl fmt::Debug for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFilter::All => f.write_str("All"),
            TagFilter::Equals(tags) => f.debug_tuple("Equals").field(tags).finish(),
            TagFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Shared, lock-guarded measurement store. Reads hand out owned snapshots.
pub trait Storage: Send + Sync {
    /// Matching measurements of `name`, sorted by canonical tags.
    /// `NotFound` when no measurement of that name exists at all.
    fn from(&self, name: &str, filter: &TagFilter) -> Result<Vec<Measurement>>;

    /// Upsert the measurement for `(name, tags)`. With `ingest_error` set,
    /// a previously stored table is kept and only the error is recorded.
    fn set(&self, name: &str, tags: TagSet, table: Table, ingest_error: Option<String>) -> Result<()>;

    /// Table names, sorted.
    fn names(&self) -> Result<Vec<String>>;

    /// True when a measurement was removed.
    fn remove(&self, name: &str, tags: &TagSet) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_sorted() {
        let tags = TagSet::new().with("region", "eu").with("host", "a");
        assert_eq!(tags.canonical(), "host=a,region=eu");
        assert_eq!(TagSet::parse(" region = eu ,host=a").unwrap(), tags);
        assert_eq!(TagSet::parse("").unwrap(), TagSet::new());
    }

    #[test]
    fn malformed_tags_are_rejected() {
        assert!(matches!(TagSet::parse("host"), Err(StorageError::InvalidTags(_))));
        assert!(matches!(TagSet::parse("=a"), Err(StorageError::InvalidTags(_))));
    }

    #[test]
    fn equals_filter_is_a_subset_match() {
        let tags: TagSet = [("host", "a"), ("region", "eu")].into_iter().collect();
        assert!(TagFilter::Equals(TagSet::new().with("host", "a")).matches(&tags));
        assert!(!TagFilter::Equals(TagSet::new().with("host", "b")).matches(&tags));
        assert!(TagFilter::All.matches(&tags));
        assert!(TagFilter::custom(|t| t.len() == 2).matches(&tags));
    }

    #[test]
    fn qualified_name_includes_tags() {
        let m = Measurement::new("cpu", TagSet::new(), Table::default());
        assert_eq!(m.qualified_name(), "cpu");
        let m = Measurement::new("cpu", TagSet::new().with("host", "a"), Table::default());
        assert_eq!(m.qualified_name(), "cpu,host=a");
    }
}
