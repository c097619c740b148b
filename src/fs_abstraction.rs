//! Filesystem abstraction for the output writer.
//!
//! The writer only ever creates directories and replaces whole files, so the
//! trait is kept to exactly that. Tests use the mockall-generated
//! `MockFileSystem` to exercise write failures.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

#[cfg(test)]
use mockall::automock;

/// Filesystem operations needed to persist output files.
#[cfg_attr(test, automock)]
pub trait FileSystem: Send + Sync {
    /// Create a directory and all missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Replace `path` with `contents`.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Real filesystem. Writes go to a temporary file in the target directory
/// and are renamed into place, so readers never see a half-written list.
#[derive(Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(contents)?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

static REAL_FS: RealFileSystem = RealFileSystem;

/// Shared real filesystem instance.
pub fn real_fs() -> &'static RealFileSystem {
    &REAL_FS
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_write_and_replace() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("ips_single_all.txt");

        let fs = RealFileSystem;
        fs.write(&file_path, b"10.0.0.1\n").unwrap();
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "10.0.0.1\n");

        fs.write(&file_path, b"10.0.0.2\n").unwrap();
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "10.0.0.2\n");
    }

    #[test]
    fn test_real_fs_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let fs = RealFileSystem;
        fs.write(&temp_dir.path().join("a.txt"), b"x").unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.txt")]);
    }

    #[test]
    fn test_real_fs_create_dir_all() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("aws/services");
        real_fs().create_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_real_fs_write_to_missing_dir_fails() {
        let fs = RealFileSystem;
        let result = fs.write(Path::new("/nonexistent/path/file.txt"), b"test");
        assert!(result.is_err());
    }

    #[test]
    fn test_real_fs_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RealFileSystem>();
    }

    #[test]
    fn test_mock_fs_write_error() {
        let mut mock = MockFileSystem::new();
        mock.expect_write()
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));

        let result = mock.write(Path::new("/out/ips_ranges_all.txt"), b"10.0.0.0/8\n");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }
}
