//! Materialized rowsets.

use serde::{Deserialize, Serialize};

use crate::record::{Column, Record};
use crate::value::Value;

/// A column schema plus value rows. Rows may be shorter than the schema when
/// columns were added after they were pushed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_column_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| Column::new(n.as_ref())).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn at(&self, i: usize) -> Option<Record> {
        self.rows
            .get(i)
            .map(|row| Record::new(self.columns.clone(), row.clone()))
    }

    pub fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push(values);
    }

    /// Position of `column`, adding it to the schema when unseen.
    pub fn add_column(&mut self, column: Column) -> usize {
        match self.columns.iter().position(|c| *c == column) {
            Some(i) => i,
            None => {
                self.columns.push(column);
                self.columns.len() - 1
            }
        }
    }

    /// Append a record, widening the schema with any columns it introduces.
    pub fn push_record(&mut self, record: &Record) {
        let mut row: Vec<Value> = Vec::new();
        for (i, c) in record.columns.iter().enumerate() {
            let at = self.add_column(c.clone());
            if row.len() <= at {
                row.resize(at + 1, Value::Null);
            }
            row[at] = record.get(i).clone();
        }
        self.rows.push(row);
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows
            .iter()
            .map(move |row| Record::new(self.columns.clone(), row.clone()))
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut t = Table::default();
        for r in records {
            t.push_record(r);
        }
        t
    }

    /// Rename the table every column belongs to.
    pub fn qualify(&mut self, table_name: &str) {
        for c in &mut self.columns {
            c.table_name = table_name.to_string();
        }
    }
}
