//! JSON rendering of [`Record`] itself.
//!
//! A file holds either a single record object or an array of them:
//!
//! ```json
//! [
//!   {"name": "cpu", "fields": {"usage": 12.5}, "tags": {"host": "web-1"},
//!    "timestamp": "2024-01-01T00:00:00Z"},
//!   {"name": "mem", "fields": {"used": 1024}}
//! ]
//! ```
//!
//! `tags` and `timestamp` are optional; records without a timestamp are
//! stamped with the time the file was parsed.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{Fields, ParseError, Parser, Record, Tags};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecord {
    name: String,
    fields: Fields,
    #[serde(default)]
    tags: Tags,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

/// Parser for the `records_json` data format.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordJsonParser;

impl RecordJsonParser {
    pub const DATA_FORMAT: &'static str = "records_json";

    pub fn new() -> Self {
        Self
    }

    fn convert(
        index: usize,
        value: Value,
        now: DateTime<Utc>,
    ) -> Result<Record, ParseError> {
        let raw: RawRecord = serde_json::from_value(value)
            .map_err(|e| ParseError::new(format!("record {}: {}", index, e)))?;

        if raw.name.is_empty() {
            return Err(ParseError::new(format!("record {}: empty name", index)));
        }
        if raw.fields.is_empty() {
            return Err(ParseError::new(format!(
                "record {} ({:?}): no fields",
                index, raw.name
            )));
        }

        Ok(Record {
            name: raw.name,
            fields: raw.fields,
            tags: raw.tags,
            timestamp: raw.timestamp.unwrap_or(now),
        })
    }
}

impl Parser for RecordJsonParser {
    fn parse(&self, buf: &[u8]) -> Result<Vec<Record>, ParseError> {
        if buf.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        match serde_json::from_slice::<Value>(buf)? {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Self::convert(i, item, now))
                .collect(),
            value @ Value::Object(_) => Ok(vec![Self::convert(0, value, now)?]),
            _ => Err(ParseError::new(
                "expected a record object or an array of records",
            )),
        }
    }
}
