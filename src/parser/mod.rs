//! Structured-data parsing: turns a file's raw bytes into records.
//!
//! The collection cycle only depends on the [`Parser`] trait. Data formats
//! are selected by name through [`build_parser`].

pub mod record_json;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub use record_json::RecordJsonParser;

/// Field mapping of a record.
pub type Fields = BTreeMap<String, FieldValue>;

/// Tag mapping of a record.
pub type Tags = BTreeMap<String, String>;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Unsigned(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

/// One telemetry point extracted from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub fields: Fields,
    pub tags: Tags,
    pub timestamp: DateTime<Utc>,
}

impl Record {
    /// Creates a record without fields or tags.
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            fields: Fields::new(),
            tags: Tags::new(),
            timestamp,
        }
    }

    /// Adds a field, replacing any previous value under the same key.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Adds a tag, replacing any previous value under the same key.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Error returned when a parser rejects its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::new(format!("invalid JSON: {}", e))
    }
}

/// Parses the full contents of one file into records.
pub trait Parser: Send {
    /// Parses `buf`. An empty result is valid.
    fn parse(&self, buf: &[u8]) -> Result<Vec<Record>, ParseError>;
}

/// Names accepted by [`build_parser`].
pub const DATA_FORMATS: &[&str] = &[RecordJsonParser::DATA_FORMAT];

/// Builds the parser registered under `data_format`.
pub fn build_parser(data_format: &str) -> Result<Box<dyn Parser>, ConfigError> {
    match data_format {
        RecordJsonParser::DATA_FORMAT => Ok(Box::new(RecordJsonParser::new())),
        other => Err(ConfigError::UnknownDataFormat(other.to_string())),
    }
}
