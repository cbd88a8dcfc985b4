//! Configuration of a folder collector.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::{DATA_FORMATS, RecordJsonParser};

const SAMPLE_CONFIG: &str = r#"
  ## Folders to gather from on each interval.
  ## These accept standard unix glob matching rules, with the addition of
  ## ** as a "super asterisk", ie:
  ##   /var/log/**       -> every directory below /var/log, at any depth
  ##   /var/log/*        -> every directory directly inside /var/log
  ##   /var/log/apache   -> only the apache directory
  ## Every file directly inside a matched folder is read in full on each
  ## interval. A pattern that matches no folder fails the whole interval.
  folders = ["/var/log/apache"]

  ## The data format to be read from files.
  data_format = "records_json"
"#;

/// Error type for invalid configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No folder pattern configured.
    NoFolders,
    /// A configured folder pattern is empty.
    EmptyPattern(usize),
    /// No parser is registered under this name.
    UnknownDataFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoFolders => write!(f, "no folders configured"),
            ConfigError::EmptyPattern(index) => {
                write!(f, "folder pattern #{} is empty", index + 1)
            }
            ConfigError::UnknownDataFormat(name) => write!(
                f,
                "unknown data format {:?} (supported: {})",
                name,
                DATA_FORMATS.join(", ")
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

fn default_data_format() -> String {
    RecordJsonParser::DATA_FORMAT.to_string()
}

/// Folder patterns plus the data format of the files found in them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Folder glob patterns, evaluated in this order.
    pub folders: Vec<String>,
    #[serde(default = "default_data_format")]
    pub data_format: String,
}

impl FolderConfig {
    pub fn new(folders: Vec<String>) -> Self {
        Self {
            folders,
            data_format: default_data_format(),
        }
    }

    pub fn with_data_format(mut self, data_format: impl Into<String>) -> Self {
        self.data_format = data_format.into();
        self
    }

    /// Checks the folder list. The data format is checked when the parser
    /// is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.folders.is_empty() {
            return Err(ConfigError::NoFolders);
        }
        if let Some(index) = self.folders.iter().position(|f| f.trim().is_empty()) {
            return Err(ConfigError::EmptyPattern(index));
        }
        Ok(())
    }

    /// Annotated sample configuration.
    pub fn sample_config() -> &'static str {
        SAMPLE_CONFIG
    }

    /// One-line description of the collector.
    pub fn description() -> &'static str {
        "Reload and gather from every file in the configured folders on each interval."
    }
}
