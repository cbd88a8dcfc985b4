//! Folder collector: re-resolves folder patterns and re-reads every matching
//! file on each collection cycle.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      FolderCollector                         │
//! │  gather(acc) ──► read + parse + emit, file by file           │
//! │        │                                                     │
//! │  ┌─────▼──────────────────────────────────────────────────┐  │
//! │  │                    PathResolver                        │  │
//! │  │  Phase A: folder patterns ──► folders                  │  │
//! │  │  Phase B: folder entries  ──► files                    │  │
//! │  └─────┬───────────────────────────────┬──────────────────┘  │
//! │        │                               │                     │
//! │  ┌─────▼──────┐                 ┌──────▼──────┐              │
//! │  │ GlobEngine │ (trait)         │ FileSystem  │ (trait)      │
//! │  └─────┬──────┘                 └──────┬──────┘              │
//! └────────┼───────────────────────────────┼─────────────────────┘
//!          │                        ┌──────┴──────┐
//!    ┌─────▼─────┐           ┌──────▼──────┐ ┌────▼────┐
//!    │ GlobPath  │           │   RealFs    │ │ MockFs  │
//!    └───────────┘           └─────────────┘ └─────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use rfolder::collector::{FolderCollector, MockFs};
//! use rfolder::parser::RecordJsonParser;
//! use rfolder::sink::RecordBuffer;
//!
//! let fs = MockFs::new();
//! fs.add_file("/data/a/x.json", r#"{"name": "x", "fields": {"v": 1}}"#);
//! fs.add_file("/data/b/y.json", r#"{"name": "y", "fields": {"v": 2}}"#);
//!
//! let mut collector = FolderCollector::new(
//!     fs,
//!     vec!["/data/*".to_string()],
//!     Box::new(RecordJsonParser::new()),
//! );
//! let mut acc = RecordBuffer::new();
//! let stats = collector.gather(&mut acc).unwrap();
//! assert_eq!(stats.files, 2);
//! assert_eq!(acc.len(), 2);
//! ```

pub mod error;
pub mod folder;
pub mod globpath;
pub mod mock;
pub mod resolver;
pub mod traits;

pub use error::GatherError;
pub use folder::{CycleStats, FolderCollector};
pub use globpath::{GlobEngine, GlobPath, GlobPathEngine, PathMatcher, PatternError};
pub use mock::MockFs;
pub use resolver::PathResolver;
pub use traits::{FileSystem, RealFs};
