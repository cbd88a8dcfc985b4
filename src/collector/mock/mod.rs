//! In-memory mock filesystem for testing the resolver and the collection
//! cycle without touching the real disk.
//!
//! Besides plain files and directories, `MockFs` can simulate entries that
//! exist but cannot be read or listed, and it records every file read so
//! tests can assert which files a cycle attempted.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct State {
    /// Map from path to file contents.
    files: HashMap<PathBuf, Vec<u8>>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Files that exist but fail to read.
    unreadable: HashSet<PathBuf>,
    /// Directories that exist but fail to list.
    unlistable: HashSet<PathBuf>,
    /// Entries that are symbolic links.
    symlinks: HashSet<PathBuf>,
    /// Every path passed to `read`, in call order.
    reads: Vec<PathBuf>,
}

impl State {
    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

/// In-memory filesystem for testing.
///
/// Clones share the same underlying tree, so a test can keep one handle and
/// change the filesystem between collection cycles while the collector
/// holds another.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    state: Arc<RwLock<State>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content, replacing any previous content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.write();
        state.add_parents(&path);
        state.files.insert(path, content.into());
    }

    /// Adds an empty directory (and its parents).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.write();
        state.add_parents(&path);
        state.directories.insert(path);
    }

    /// Adds a directory that reports itself as a symbolic link.
    ///
    /// Its contents are independent entries; add them like any others.
    pub fn add_symlink_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.write();
        state.add_parents(&path);
        state.directories.insert(path.clone());
        state.symlinks.insert(path);
    }

    /// Removes a file, or a directory together with everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.write();
        state.files.retain(|p, _| !p.starts_with(path));
        state.directories.retain(|p| !p.starts_with(path));
        state.symlinks.retain(|p| !p.starts_with(path));
    }

    /// Makes an existing file fail every subsequent read with
    /// `PermissionDenied`.
    pub fn deny_read(&self, path: impl AsRef<Path>) {
        self.write().unreadable.insert(path.as_ref().to_path_buf());
    }

    /// Makes an existing directory fail every subsequent listing with
    /// `PermissionDenied`.
    pub fn deny_list(&self, path: impl AsRef<Path>) {
        self.write().unlistable.insert(path.as_ref().to_path_buf());
    }

    /// Returns every path passed to `read` so far, in call order.
    pub fn reads(&self) -> Vec<PathBuf> {
        self.read_state().reads.clone()
    }

    /// Forgets the recorded reads.
    pub fn clear_reads(&self) {
        self.write().reads.clear();
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn permission_denied(what: &str, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("permission denied: {} {:?}", what, path),
    )
}

impl FileSystem for MockFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut state = self.write();
        state.reads.push(path.to_path_buf());

        if state.unreadable.contains(path) {
            return Err(permission_denied("read", path));
        }
        if state.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {:?}", path),
            ));
        }
        state.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.read_state();
        state.files.contains_key(path) || state.directories.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.read_state().directories.contains(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.read_state().symlinks.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.read_state();
        if !state.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }
        if state.unlistable.contains(path) {
            return Err(permission_denied("list", path));
        }

        let mut entries = HashSet::new();

        // Find all files and directories that are direct children
        for file_path in state.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &state.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}
