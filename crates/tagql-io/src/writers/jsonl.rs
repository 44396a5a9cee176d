//! Streaming NDJSON writer.

use std::io::{BufWriter, Write};

use serde_json::Map;

use tagql_core::Record;

use crate::error::{Result, StorageError};

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// One JSON object per record, keyed by qualified column name. Later
    /// columns win when two share a name.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let mut obj = Map::new();
        for (i, c) in record.columns.iter().enumerate() {
            obj.insert(c.to_string(), record.get(i).to_json());
        }
        let line = serde_json::to_string(&obj)?;
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        for r in records {
            self.write_record(r)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| StorageError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagql_core::Value;

    #[test]
    fn one_object_per_line() {
        let rows = vec![
            Record::from_pairs([("host", Value::from("a")), ("v", Value::Int(1))]),
            Record::from_pairs([("host", Value::Null), ("v", Value::Float(0.5))]),
        ];
        let mut w = JsonlWriter::new(Vec::new());
        w.write_all(&rows).unwrap();
        let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(text, "{\"host\":\"a\",\"v\":1}\n{\"host\":null,\"v\":0.5}\n");
    }
}
