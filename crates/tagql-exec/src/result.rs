//! Materialized query output.

use std::io::Write;

use serde::{Deserialize, Serialize};

use tagql_core::{Column, Record, Result, Table};
use tagql_io::writers::LineWriter;

use crate::report::QueryReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Columns of the first row; empty when there are no rows.
    pub columns: Vec<Column>,
    pub rows: Vec<Record>,
    pub report: QueryReport,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header_line(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn to_table(&self) -> Table {
        if self.rows.is_empty() {
            return Table::new(self.columns.clone());
        }
        Table::from_records(&self.rows)
    }

    /// Header line, then one text line per row.
    pub fn write_lines<W: Write>(&self, w: W) -> Result<()> {
        let mut out = LineWriter::new(w);
        out.write_header(&self.header_line())?;
        out.write_all(&self.rows)?;
        Ok(())
    }
}
