use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use tempfile::NamedTempFile;

/// Persistent string-keyed storage backing a [`CommentStore`](crate::db::CommentStore).
pub trait KeyValueStore {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Atomically write content to a file using a temporary file + rename.
///
/// Each call writes its own uniquely named temporary file in the target's
/// directory. Publishing (the rename) happens under an exclusive lock on a
/// sibling `.<name>.lock` file, so concurrent writers replace the target one
/// at a time and the last one to publish wins.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(content)
        .context("Failed to write file content")?;
    temp.as_file().sync_all().context("Failed to sync file")?;

    let lock = open_lock_file(path)?;
    lock.lock_exclusive()
        .context("Failed to acquire file lock")?;
    let persisted = temp
        .persist(path)
        .with_context(|| format!("Failed to rename to {}", path.display()));
    lock.unlock().context("Failed to unlock file")?;
    persisted?;
    Ok(())
}

fn open_lock_file(path: &Path) -> Result<File> {
    let mut lock_name = OsString::from(".");
    lock_name.push(path.file_name().unwrap_or_default());
    lock_name.push(".lock");
    let lock_path = path.with_file_name(lock_name);

    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))
}

/// Stores each key as a file of the same name inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a store rooted at an existing directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.is_dir() {
            bail!("Store directory does not exist: {}", path.display());
        }

        Ok(Self { path })
    }

    pub fn base_path(&self) -> &Path {
        &self.path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("Invalid store key: {key:?}");
        }
        Ok(self.path.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        atomic_write(&path, value.as_bytes())
    }
}

/// In-process store, mostly useful for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
