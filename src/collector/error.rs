//! Errors that abort a collection cycle.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::collector::globpath::PatternError;
use crate::parser::ParseError;

/// Error type for collection cycle failures.
///
/// Every variant is fatal to the cycle it occurs in; the next scheduled
/// cycle starts over from a fresh resolution.
#[derive(Debug)]
pub enum GatherError {
    /// A folder pattern, or a file pattern derived from a folder entry,
    /// failed to compile.
    Pattern(PatternError),
    /// A folder pattern compiled but matched no directory.
    FolderNotFound { pattern: String },
    /// A resolved folder could not be listed.
    ListFolder { folder: PathBuf, source: io::Error },
    /// A resolved file could not be read.
    ReadFile { path: PathBuf, source: io::Error },
    /// The parser rejected a file's contents.
    Parse { path: PathBuf, source: ParseError },
}

impl fmt::Display for GatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatherError::Pattern(e) => write!(f, "could not compile glob: {}", e),
            GatherError::FolderNotFound { pattern } => {
                write!(f, "could not find folder: {}", pattern)
            }
            GatherError::ListFolder { folder, source } => {
                write!(f, "cannot read folder {}: {}", folder.display(), source)
            }
            GatherError::ReadFile { path, source } => {
                write!(f, "file {} could not be read: {}", path.display(), source)
            }
            GatherError::Parse { path, source } => {
                write!(f, "could not parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for GatherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatherError::Pattern(e) => Some(e),
            GatherError::FolderNotFound { .. } => None,
            GatherError::ListFolder { source, .. } | GatherError::ReadFile { source, .. } => {
                Some(source)
            }
            GatherError::Parse { source, .. } => Some(source),
        }
    }
}

impl From<PatternError> for GatherError {
    fn from(e: PatternError) -> Self {
        GatherError::Pattern(e)
    }
}
