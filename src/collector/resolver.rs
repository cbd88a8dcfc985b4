//! Two-phase resolution of folder patterns into the files to read.
//!
//! Phase A expands every folder pattern into the directories that exist
//! right now. Phase B lists each of those directories one level deep and
//! expands every entry through the same glob engine. Both phases are
//! recomputed from scratch on every call.

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::collector::error::GatherError;
use crate::collector::globpath::{GlobEngine, GlobPathEngine, PathMatcher, PatternError, has_meta};
use crate::collector::traits::FileSystem;

/// Resolves folder patterns into folders, and folders into files.
pub struct PathResolver<F: FileSystem, G: GlobEngine = GlobPathEngine> {
    fs: F,
    engine: G,
    patterns: Vec<String>,
}

impl<F: FileSystem> PathResolver<F> {
    /// Creates a resolver using the built-in glob engine.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `patterns` - Folder glob patterns, evaluated in this order
    pub fn new(fs: F, patterns: Vec<String>) -> Self {
        Self::with_engine(fs, GlobPathEngine, patterns)
    }
}

impl<F: FileSystem, G: GlobEngine> PathResolver<F, G> {
    /// Creates a resolver with a custom glob engine.
    pub fn with_engine(fs: F, engine: G, patterns: Vec<String>) -> Self {
        Self {
            fs,
            engine,
            patterns,
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Phase A: expands every folder pattern into existing directories.
    ///
    /// Matches keep the engine's order, pattern after pattern. A folder
    /// matched by two patterns is returned twice. Non-directory matches are
    /// dropped, and a pattern left without any directory is an error.
    pub fn resolve_folders(&self) -> Result<Vec<PathBuf>, GatherError> {
        let mut all_folders = Vec::new();

        for pattern in &self.patterns {
            let matcher = self.engine.compile(pattern)?;
            let folders: Vec<PathBuf> = matcher
                .match_paths(&self.fs)
                .into_iter()
                .filter(|path| self.fs.is_dir(path))
                .collect();

            if folders.is_empty() {
                return Err(GatherError::FolderNotFound {
                    pattern: pattern.clone(),
                });
            }
            trace!("Folder pattern {:?} matched {} folders", pattern, folders.len());
            all_folders.extend(folders);
        }

        debug!(
            "Resolved {} folders from {} patterns",
            all_folders.len(),
            self.patterns.len()
        );
        Ok(all_folders)
    }

    /// Phase B: expands the entries of each folder into files.
    ///
    /// Entries are visited in name order. An entry whose name carries glob
    /// meta characters is compiled as a `folder/entry` glob of its own; any
    /// other entry is taken as is, so names that are not valid UTF-8 are
    /// still read. Subdirectories are skipped. An empty result is valid.
    pub fn resolve_files(&self, folders: &[PathBuf]) -> Result<Vec<PathBuf>, GatherError> {
        let mut all_files = Vec::new();

        for folder in folders {
            let entries = self
                .fs
                .read_dir(folder)
                .map_err(|source| GatherError::ListFolder {
                    folder: folder.clone(),
                    source,
                })?;

            let mut names: Vec<OsString> = entries
                .iter()
                .filter_map(|entry| entry.file_name().map(ToOwned::to_owned))
                .collect();
            names.sort();

            for name in names {
                let candidate = folder.join(&name);
                let matches = match name.to_str() {
                    Some(n) if has_meta(n) => {
                        let pattern = candidate.to_str().ok_or_else(|| PatternError {
                            pattern: candidate.to_string_lossy().into_owned(),
                            reason: "path is not valid UTF-8".to_string(),
                        })?;
                        self.engine.compile(pattern)?.match_paths(&self.fs)
                    }
                    _ if self.fs.exists(&candidate) => vec![candidate.clone()],
                    _ => Vec::new(),
                };
                if matches.is_empty() {
                    debug!(
                        "Entry {:?} matched nothing (removed, or glob characters in its name)",
                        candidate
                    );
                }

                for path in matches {
                    if self.fs.is_dir(&path) {
                        trace!("Skipping directory {:?}", path);
                        continue;
                    }
                    all_files.push(path);
                }
            }
        }

        debug!(
            "Resolved {} files from {} folders",
            all_files.len(),
            folders.len()
        );
        Ok(all_files)
    }
}
