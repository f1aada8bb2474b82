//! Permission store
//!
//! Records are append-only: granting the same kind twice stores two
//! records, and only `revoke` removes them. Every mutation is written
//! through immediately. There is no locking, so concurrent writers to
//! the same file must be serialized by the caller.

use crate::error::{Error, Result};
use crate::permission::{PermKind, PermissionRecord, validate_container_name};
use crate::utils::create_parent_dirs;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Storage backend for permission records
pub trait PermissionStore {
    /// Append a record after every existing one
    fn append(&mut self, record: PermissionRecord) -> Result<()>;

    /// Remove every record matching `(container, kind)`, returning how many went
    fn remove(&mut self, container: &str, kind: PermKind) -> Result<usize>;

    /// All records in storage order
    fn list_all(&self) -> Result<Vec<PermissionRecord>>;

    /// Records for one container in storage order
    ///
    /// An empty result means the container runs with maximum isolation.
    fn list(&self, container: &str) -> Result<Vec<PermissionRecord>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|r| r.container == container)
            .collect())
    }

    /// Validate and append a grant given as raw strings
    fn grant(&mut self, container: &str, kind: &str, value: &str) -> Result<PermissionRecord> {
        let kind = kind.parse::<PermKind>()?;
        let record = PermissionRecord::new(container, kind, value)?;
        self.append(record.clone())?;
        Ok(record)
    }

    /// Validate the container name, then remove its `kind` records
    fn revoke(&mut self, container: &str, kind: PermKind) -> Result<usize> {
        validate_container_name(container)?;
        self.remove(container, kind)
    }
}

/// Line-oriented store backed by a single config file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents; a missing file reads as empty
    fn read_contents(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PermissionStore for FileStore {
    fn append(&mut self, record: PermissionRecord) -> Result<()> {
        create_parent_dirs(&self.path, 0o755)?;

        // A hand-edited file may lack its trailing newline
        let contents = self.read_contents()?;
        let mut line = String::new();
        if !contents.is_empty() && !contents.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(&record.to_string());
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::io(&self.path, e))?;

        log::debug!("Appended '{}' to {}", record, self.path.display());
        Ok(())
    }

    fn remove(&mut self, container: &str, kind: PermKind) -> Result<usize> {
        let contents = self.read_contents()?;
        if contents.is_empty() {
            return Ok(0);
        }

        let mut kept = String::with_capacity(contents.len());
        let mut removed = 0;
        for line in contents.lines() {
            let is_match = matches!(
                PermissionRecord::parse_line(line),
                Ok(Some(record)) if record.matches(container, kind)
            );
            if is_match {
                removed += 1;
            } else {
                kept.push_str(line);
                kept.push('\n');
            }
        }

        if removed == 0 {
            return Ok(0);
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, kept).map_err(|e| Error::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::io(&self.path, e))?;

        log::debug!(
            "Removed {} {} record(s) for {} from {}",
            removed,
            kind,
            container,
            self.path.display()
        );
        Ok(removed)
    }

    fn list_all(&self) -> Result<Vec<PermissionRecord>> {
        let contents = self.read_contents()?;
        let mut records = Vec::new();

        for (lineno, line) in contents.lines().enumerate() {
            match PermissionRecord::parse_line(line) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => log::warn!(
                    "{}:{}: skipping line: {}",
                    self.path.display(),
                    lineno + 1,
                    e
                ),
            }
        }

        Ok(records)
    }
}

/// In-memory store for library callers and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<PermissionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionStore for MemoryStore {
    fn append(&mut self, record: PermissionRecord) -> Result<()> {
        self.records.push(record);
        Ok(())
    }

    fn remove(&mut self, container: &str, kind: PermKind) -> Result<usize> {
        let before = self.records.len();
        self.records.retain(|r| !r.matches(container, kind));
        Ok(before - self.records.len())
    }

    fn list_all(&self) -> Result<Vec<PermissionRecord>> {
        Ok(self.records.clone())
    }
}
