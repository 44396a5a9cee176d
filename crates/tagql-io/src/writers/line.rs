//! Text writer for the record line form: a header line of qualified column
//! names, then one comma-joined line per record.

use std::io::{BufWriter, Write};

use tagql_core::Record;

use crate::error::Result;

pub struct LineWriter<W: Write> {
    writer: BufWriter<W>,
    header_written: bool,
}

impl<W: Write> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            header_written: false,
        }
    }

    /// Write the header explicitly; useful when there may be no rows.
    pub fn write_header(&mut self, header: &str) -> Result<()> {
        writeln!(self.writer, "{header}")?;
        self.header_written = true;
        Ok(())
    }

    /// Write one record. The first record supplies the header when none was
    /// written yet.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        if !self.header_written {
            self.write_header(&record.header_line())?;
        }
        writeln!(self.writer, "{}", record.to_line())?;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        for r in records {
            self.write_record(r)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::StorageError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagql_core::{Column, Value};

    #[test]
    fn header_then_lines() {
        let rows = vec![
            Record::new(
                vec![Column::qualified("cpu", "host"), Column::new("v")],
                vec![Value::from("a\"b"), Value::Int(1)],
            ),
            Record::new(
                vec![Column::qualified("cpu", "host"), Column::new("v")],
                vec![Value::Null, Value::Float(2.5)],
            ),
        ];
        let mut w = LineWriter::new(Vec::new());
        w.write_all(&rows).unwrap();
        let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(text, "cpu.host,v\n\"a\\\"b\",1\nnull,2.5\n");
    }

    #[test]
    fn explicit_header_for_empty_output() {
        let mut w = LineWriter::new(Vec::new());
        w.write_header("a,b").unwrap();
        w.write_all(std::iter::empty()).unwrap();
        assert_eq!(w.into_inner().unwrap(), b"a,b\n");
    }
}
