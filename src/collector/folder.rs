//! The collection cycle: resolve, read, parse, emit.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::collector::error::GatherError;
use crate::collector::globpath::{GlobEngine, GlobPathEngine};
use crate::collector::resolver::PathResolver;
use crate::collector::traits::FileSystem;
use crate::config::{ConfigError, FolderConfig};
use crate::parser::{Parser, Record, build_parser};
use crate::sink::Accumulator;

/// Summary of one successful collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Folders resolved in Phase A.
    pub folders: usize,
    /// Files resolved in Phase B (and read).
    pub files: usize,
    /// Records forwarded to the sink.
    pub records: usize,
    /// Bytes read from files.
    pub bytes: u64,
    pub duration: Duration,
}

/// Re-reads every file of the configured folders on each cycle.
///
/// The folder and file lists of the latest cycle are kept for
/// introspection only. `gather` takes `&mut self`, so two cycles of the
/// same collector can never overlap.
pub struct FolderCollector<F: FileSystem, G: GlobEngine = GlobPathEngine> {
    resolver: PathResolver<F, G>,
    parser: Box<dyn Parser>,
    folder_names: Vec<PathBuf>,
    file_names: Vec<PathBuf>,
    last_stats: Option<CycleStats>,
}

impl<F: FileSystem> FolderCollector<F> {
    /// Creates a collector using the built-in glob engine.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `folders` - Folder glob patterns
    /// * `parser` - Parser applied to the contents of every file
    pub fn new(fs: F, folders: Vec<String>, parser: Box<dyn Parser>) -> Self {
        Self::with_engine(fs, GlobPathEngine, folders, parser)
    }

    /// Validates `config` and builds a collector with the parser it names.
    pub fn from_config(fs: F, config: &FolderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let parser = build_parser(&config.data_format)?;
        Ok(Self::new(fs, config.folders.clone(), parser))
    }
}

impl<F: FileSystem, G: GlobEngine> FolderCollector<F, G> {
    /// Creates a collector with a custom glob engine.
    pub fn with_engine(fs: F, engine: G, folders: Vec<String>, parser: Box<dyn Parser>) -> Self {
        Self {
            resolver: PathResolver::with_engine(fs, engine, folders),
            parser,
            folder_names: Vec::new(),
            file_names: Vec::new(),
            last_stats: None,
        }
    }

    /// Replaces the parser used from the next cycle on.
    pub fn set_parser(&mut self, parser: Box<dyn Parser>) {
        self.parser = parser;
    }

    /// Configured folder patterns.
    pub fn patterns(&self) -> &[String] {
        self.resolver.patterns()
    }

    /// Folders resolved by the latest cycle; empty if folder resolution failed.
    pub fn last_folders(&self) -> &[PathBuf] {
        &self.folder_names
    }

    /// Files resolved by the latest cycle; empty if resolution failed.
    pub fn last_files(&self) -> &[PathBuf] {
        &self.file_names
    }

    /// Statistics of the latest successful cycle.
    pub fn last_stats(&self) -> Option<&CycleStats> {
        self.last_stats.as_ref()
    }

    /// Runs one collection cycle.
    ///
    /// Resolves folders, then files, then reads and parses every file in
    /// order, forwarding each file's records to `acc` before moving on to
    /// the next file. The first error aborts the cycle: later files are not
    /// read, and records already forwarded stay forwarded.
    pub fn gather(&mut self, acc: &mut dyn Accumulator) -> Result<CycleStats, GatherError> {
        let start = Instant::now();
        self.folder_names.clear();
        self.file_names.clear();

        self.refresh_folder_paths()?;
        self.refresh_file_paths()?;

        let mut stats = CycleStats {
            folders: self.folder_names.len(),
            files: self.file_names.len(),
            ..CycleStats::default()
        };

        for path in &self.file_names {
            let (records, bytes) = self.read_records(path)?;
            trace!("{:?}: {} records from {} bytes", path, records.len(), bytes);

            stats.bytes += bytes as u64;
            stats.records += records.len();
            for record in records {
                acc.add_record(record.name, record.fields, record.tags, record.timestamp);
            }
        }

        stats.duration = start.elapsed();
        debug!(
            "Gathered {} records from {} files in {} folders ({:?})",
            stats.records, stats.files, stats.folders, stats.duration
        );
        self.last_stats = Some(stats.clone());
        Ok(stats)
    }

    fn refresh_folder_paths(&mut self) -> Result<(), GatherError> {
        self.folder_names = self.resolver.resolve_folders()?;
        Ok(())
    }

    fn refresh_file_paths(&mut self) -> Result<(), GatherError> {
        self.file_names = self.resolver.resolve_files(&self.folder_names)?;
        Ok(())
    }

    fn read_records(&self, path: &Path) -> Result<(Vec<Record>, usize), GatherError> {
        let contents = self
            .resolver
            .fs()
            .read(path)
            .map_err(|source| GatherError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        let records = self
            .parser
            .parse(&contents)
            .map_err(|source| GatherError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok((records, contents.len()))
    }
}
