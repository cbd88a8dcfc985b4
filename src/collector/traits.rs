//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the resolver and the collection cycle run
//! against the real disk in production and against `MockFs` in tests, where
//! unreadable files and vanished folders can be simulated.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction for filesystem operations.
///
/// Covers exactly what a collection cycle needs: listing one directory
/// level, type checks for glob evaluation and reading whole files.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as raw bytes.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents, or an I/O error if the file cannot be read.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Checks if a path exists and is a directory, following symlinks.
    fn is_dir(&self, path: &Path) -> bool;

    /// Checks if the path itself is a symbolic link, without following it.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Lists the immediate entries of a directory (one level, not recursive).
    ///
    /// # Arguments
    /// * `path` - Path to the directory
    ///
    /// # Returns
    /// A vector of paths to entries in the directory, or an I/O error.
    /// Order is unspecified.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.is_symlink()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.json");
        fs::write(&path, b"{\"name\":\"cpu\"}").unwrap();

        let fs = RealFs::new();
        assert_eq!(fs.read(&path).unwrap(), b"{\"name\":\"cpu\"}".to_vec());
    }

    #[test]
    fn test_real_fs_exists_and_is_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let fs = RealFs::new();
        assert!(fs.exists(&file));
        assert!(!fs.is_dir(&file));
        assert!(fs.is_dir(dir.path()));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let fs = RealFs::new();
        let mut entries = fs.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries, vec![dir.path().join("a.txt"), dir.path().join("sub")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_is_symlink() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fs = RealFs::new();
        assert!(fs.is_dir(&link));
        assert!(fs.is_symlink(&link));
        assert!(!fs.is_symlink(&target));
        assert!(!fs.is_symlink(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_read_dir_missing() {
        let fs = RealFs::new();
        let err = fs.read_dir(Path::new("/nonexistent/path/12345")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
