//! Rows as positionally aligned columns and values.
//!
//! A record may carry more columns than values when it comes from a sparse
//! table; every read past the value array yields `Null`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::{digest_with, Hash256};
use crate::value::{CompareOption, Value};

static NULL: Value = Value::Null;

/// A value's position, optionally qualified by its source table and the
/// alias that table was given in the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub table_name: String,
    pub table_as: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table.into(),
            table_as: String::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_as = alias.into();
        self
    }

    /// The alias when set, else the table name.
    pub fn qualifier(&self) -> &str {
        if self.table_as.is_empty() {
            &self.table_name
        } else {
            &self.table_as
        }
    }

    /// A qualifier matches either the alias or the underlying table name.
    pub fn matches(&self, qualifier: Option<&str>, name: &str) -> bool {
        if self.name != name {
            return false;
        }
        match qualifier {
            None => true,
            Some(q) => q == self.table_as || q == self.table_name,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = self.qualifier();
        if q.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", q, self.name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub columns: Vec<Column>,
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(columns: Vec<Column>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// The record joins pair with an unmatched outer row.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(column, value)` pairs with unqualified columns.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values): (Vec<Column>, Vec<Value>) = pairs
            .into_iter()
            .map(|(n, v)| (Column::new(n), v))
            .unzip();
        Self { columns, values }
    }

    /// Number of positions, counting columns without a stored value.
    pub fn width(&self) -> usize {
        self.columns.len().max(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0
    }

    pub fn get(&self, i: usize) -> &Value {
        self.values.get(i).unwrap_or(&NULL)
    }

    /// Position of `name`, bare (`host`) or qualified (`cpu.host`).
    pub fn position(&self, name: &str) -> Option<usize> {
        match name.split_once('.') {
            Some((q, n)) => self
                .position_of(Some(q), n)
                .or_else(|| self.position_of(None, name)),
            None => self.position_of(None, name),
        }
    }

    fn position_of(&self, qualifier: Option<&str>, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.matches(qualifier, name))
    }

    /// `None` only when no column has this name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|i| self.get(i))
    }

    pub fn lookup(&self, qualifier: Option<&str>, name: &str) -> Option<&Value> {
        self.position_of(qualifier, name).map(|i| self.get(i))
    }

    /// Overwrite `name`, appending an unqualified column when absent.
    pub fn set(&mut self, name: &str, value: Value) {
        let i = match self.position(name) {
            Some(i) => i,
            None => {
                self.columns.push(Column::new(name));
                self.columns.len() - 1
            }
        };
        if self.values.len() <= i {
            self.values.resize(i + 1, Value::Null);
        }
        self.values[i] = value;
    }

    /// Position-wise equality of the values; column names are ignored.
    pub fn equal_to(&self, other: &Record, opt: CompareOption) -> Result<bool> {
        let width = self.values.len().max(other.values.len());
        for i in 0..width {
            if !self.get(i).equals(other.get(i), opt)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// A copy with positions ordered by qualified column name.
    pub fn sorted_by_columns(&self) -> Record {
        let mut pairs: Vec<(Column, Value)> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), self.get(i).clone()))
            .collect();
        pairs.sort_by(|(a, _), (b, _)| {
            (a.qualifier(), a.name.as_str()).cmp(&(b.qualifier(), b.name.as_str()))
        });
        let (columns, values): (Vec<Column>, Vec<Value>) = pairs.into_iter().unzip();
        Record { columns, values }
    }

    pub fn to_line(&self) -> String {
        let width = self.width();
        let mut out = String::new();
        for i in 0..width {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&self.get(i).to_text());
        }
        out
    }

    pub fn header_line(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Self's positions followed by `other`'s. With `alias`, the appended
    /// columns are re-qualified under it.
    pub fn merge(&self, other: &Record, alias: Option<&str>) -> Record {
        let mut columns = Vec::with_capacity(self.width() + other.width());
        let mut values = Vec::with_capacity(self.width() + other.width());
        for i in 0..self.width() {
            columns.push(self.columns.get(i).cloned().unwrap_or_default());
            values.push(self.get(i).clone());
        }
        for i in 0..other.width() {
            let mut c = other.columns.get(i).cloned().unwrap_or_default();
            if let Some(a) = alias {
                c.table_as = a.to_string();
            }
            columns.push(c);
            values.push(other.get(i).clone());
        }
        Record { columns, values }
    }

    /// Digest of the values only, consistent with strict `equal_to`.
    pub fn digest(&self) -> Hash256 {
        // Trailing nulls do not change equality, so they must not change the key.
        let used = self
            .values
            .iter()
            .rposition(|v| !v.is_null())
            .map_or(0, |i| i + 1);
        digest_with(|h| {
            for v in &self.values[..used] {
                v.hash_into(h);
            }
        })
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
