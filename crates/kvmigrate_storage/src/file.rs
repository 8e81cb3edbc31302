//! Directory-tree key-value backend for persistent storage.

use crate::backend::{Entry, KvBackend, SEPARATOR};
use crate::error::{StorageError, StorageResult};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix added to the file name of every leaf.
const LEAF_PREFIX: char = '_';

/// Prefix added to the directory name of every sub-namespace.
///
/// With [`LEAF_PREFIX`] this maps every key to its own path: leaf `b`,
/// namespace `b/` and namespace `_b/` land on `_b`, `+b` and `+_b`.
const NAMESPACE_PREFIX: char = '+';

/// A directory-tree key-value backend.
///
/// Sub-namespaces map to `+name` directories and leaves map to `_name`
/// files, so the
/// store survives process restarts and can be inspected with ordinary
/// tools.
///
/// # Durability
///
/// - `put` writes a temporary file, syncs it, then renames it over the leaf
/// - a reader never observes a half-written value
///
/// # Example
///
/// ```no_run
/// use kvmigrate_storage::{Entry, FileBackend, KvBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("/var/lib/secrets")).unwrap();
/// backend.put(&Entry::new("app/db/password", b"hunter2".to_vec())).unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileBackend {
    /// Opens a backend rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            tmp_counter: AtomicU64::new(0),
        })
    }

    /// Returns the root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a namespace prefix (`""` or ending in `/`) to a directory.
    fn namespace_dir(&self, prefix: &str) -> StorageResult<PathBuf> {
        if prefix.is_empty() {
            return Ok(self.root.clone());
        }
        let Some(trimmed) = prefix.strip_suffix(SEPARATOR) else {
            return Err(StorageError::InvalidKey(prefix.to_string()));
        };
        let mut dir = self.root.clone();
        for segment in checked_segments(prefix, trimmed)? {
            dir.push(format!("{NAMESPACE_PREFIX}{segment}"));
        }
        Ok(dir)
    }

    /// Resolves a leaf key to its file path.
    fn leaf_path(&self, key: &str) -> StorageResult<PathBuf> {
        let segments = checked_segments(key, key)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(StorageError::InvalidKey(key.to_string()));
        };
        let mut path = self.root.clone();
        for segment in parents {
            path.push(format!("{NAMESPACE_PREFIX}{segment}"));
        }
        path.push(format!("{LEAF_PREFIX}{leaf}"));
        Ok(path)
    }
}

/// Splits `path` into segments, rejecting ones the filesystem would
/// reinterpret.
fn checked_segments<'a>(key: &str, path: &'a str) -> StorageResult<Vec<&'a str>> {
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(segments)
}

impl KvBackend for FileBackend {
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let dir = self.namespace_dir(prefix)?;
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for dirent in read_dir {
            let dirent = dirent?;
            // Non UTF-8 names cannot be expressed as keys.
            let Ok(name) = dirent.file_name().into_string() else {
                continue;
            };
            if dirent.file_type()?.is_dir() {
                if let Some(namespace) = name.strip_prefix(NAMESPACE_PREFIX) {
                    names.push(format!("{namespace}{SEPARATOR}"));
                }
            } else if let Some(leaf) = name.strip_prefix(LEAF_PREFIX) {
                names.push(leaf.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Entry>> {
        let path = self.leaf_path(key)?;
        match fs::read(&path) {
            Ok(value) => Ok(Some(Entry::new(key, value))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, entry: &Entry) -> StorageResult<()> {
        let path = self.leaf_path(&entry.key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(entry.key.clone()))?;
        fs::create_dir_all(parent)?;

        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = parent.join(format!(".tmp-{}-{n}", std::process::id()));
        let written = write_synced(&tmp, &entry.value).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn write_synced(path: &Path, value: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(value)?;
    file.sync_all()
}
