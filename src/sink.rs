//! Destinations for parsed records.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::parser::{Fields, Record, Tags};

/// Receives every record produced by a collection cycle, in production order.
pub trait Accumulator {
    fn add_record(&mut self, name: String, fields: Fields, tags: Tags, timestamp: DateTime<Utc>);
}

/// Keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordBuffer {
    records: Vec<Record>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes and returns everything collected so far.
    pub fn drain(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }
}

impl Accumulator for RecordBuffer {
    fn add_record(&mut self, name: String, fields: Fields, tags: Tags, timestamp: DateTime<Utc>) {
        self.records.push(Record {
            name,
            fields,
            tags,
            timestamp,
        });
    }
}

#[derive(Serialize)]
struct Line<'a> {
    name: &'a str,
    fields: &'a Fields,
    tags: &'a Tags,
    timestamp: DateTime<Utc>,
}

/// Writes each record as one JSON object per line.
///
/// Write failures never abort a cycle: they are logged and counted.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
    failed: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            failed: 0,
        }
    }

    /// Number of records successfully written.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Number of records that could not be written.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("Failed to flush record output: {}", e);
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Accumulator for JsonLinesSink<W> {
    fn add_record(&mut self, name: String, fields: Fields, tags: Tags, timestamp: DateTime<Utc>) {
        let line = Line {
            name: &name,
            fields: &fields,
            tags: &tags,
            timestamp,
        };
        let result = serde_json::to_writer(&mut self.writer, &line)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        match result {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.failed += 1;
                warn!("Failed to write record {:?}: {}", name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FieldValue;
    use chrono::TimeZone;
    use std::io;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_record_buffer_keeps_order() {
        let mut buffer = RecordBuffer::new();
        for name in ["a", "b", "c"] {
            let record = Record::new(name, ts()).with_field("v", 1i64);
            buffer.add_record(record.name, record.fields, record.tags, record.timestamp);
        }

        let names: Vec<&str> = buffer.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(buffer.drain().len(), 3);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_json_lines_sink_format() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let record = Record::new("cpu", ts())
            .with_field("usage", 1.5)
            .with_tag("host", "web-1");
        sink.add_record(record.name, record.fields, record.tags, record.timestamp);

        assert_eq!(sink.written(), 1);
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "{\"name\":\"cpu\",\"fields\":{\"usage\":1.5},\"tags\":{\"host\":\"web-1\"},\"timestamp\":\"2024-01-01T00:00:00Z\"}\n"
        );
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_lines_sink_counts_failures() {
        let mut sink = JsonLinesSink::new(BrokenWriter);
        let mut fields = Fields::new();
        fields.insert("v".to_string(), FieldValue::Integer(1));
        sink.add_record("cpu".to_string(), fields, Tags::new(), ts());

        assert_eq!(sink.written(), 0);
        assert_eq!(sink.failed(), 1);
    }
}
