//! Utility functions

use crate::error::{Error, Result};
use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Ensure a directory (and its parents) exists with given permissions
pub fn ensure_dir<P: AsRef<Path>>(path: P, mode: u32) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        if !path.is_dir() {
            return Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "exists but is not a directory"),
            ));
        }
        return Ok(());
    }

    create_parent_dirs(path, mode)?;
    fs::create_dir(path).map_err(|e| Error::io(path, e))?;
    fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|e| Error::io(path, e))?;
    log::debug!("Created directory {} ({:o})", path.display(), mode);

    Ok(())
}

/// Create parent directories with given permissions
pub fn create_parent_dirs<P: AsRef<Path>>(path: P, mode: u32) -> Result<()> {
    if let Some(parent) = path.as_ref().parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        fs::set_permissions(parent, Permissions::from_mode(mode))
            .map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir() -> Result<()> {
        let tmp = TempDir::new().unwrap();
        let dir_path = tmp.path().join("test_dir");

        ensure_dir(&dir_path, 0o755)?;
        assert!(dir_path.is_dir());

        // Should not error if dir already exists
        ensure_dir(&dir_path, 0o755)?;

        Ok(())
    }

    #[test]
    fn test_ensure_dir_creates_missing_parents() -> Result<()> {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("homes").join("dev");

        ensure_dir(&nested, 0o755)?;
        assert!(nested.is_dir());

        Ok(())
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, "x").unwrap();

        assert!(ensure_dir(&file, 0o755).is_err());
    }

    #[test]
    fn test_create_parent_dirs_mode() -> Result<()> {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("permbox").join("permissions.conf");

        create_parent_dirs(&file, 0o755)?;

        let parent = tmp.path().join("permbox");
        assert!(parent.is_dir());
        let mode = fs::metadata(&parent).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
        assert!(!file.exists());

        Ok(())
    }
}
