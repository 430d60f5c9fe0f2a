//! Where definition files come from.
//!
//! Loaders never touch the file system directly: they go through a
//! [`FileSource`], so the same pipeline runs over a game directory, over
//! in-memory documents, or over a mix of both.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::loader::is_data_file;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Change-detection stamp of a file. Two reads with equal stamps are
/// assumed to return the same text.
///
/// `hash` is a content hash for files up to [`STAMP_HASH_LIMIT`] bytes and 0
/// above it. Larger files rely on `modified` and `len` alone, so two writes
/// of the same length within the file system's timestamp resolution go
/// unnoticed for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileStamp {
    pub modified: u128,
    pub len: u64,
    pub hash: u64,
}

/// Files up to this size get a content hash in their stamp.
pub const STAMP_HASH_LIMIT: u64 = 4 * 1024 * 1024;

/// FNV-1a over `bytes`.
pub fn content_hash(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    bytes.iter().fold(OFFSET, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

#[async_trait]
pub trait FileSource: Send + Sync {
    async fn read_to_string(&self, path: &str) -> Result<String, SourceError>;

    /// `None` when the file does not exist.
    async fn stamp(&self, path: &str) -> Option<FileStamp>;

    /// Data files directly inside `folder`, sorted by path. A missing folder
    /// is empty.
    async fn list_dir(&self, folder: &str) -> Vec<String>;
}

pub(crate) fn join(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

// ===========================================================================
// File system
// ===========================================================================

/// Files under a root directory, read with `tokio::fs`.
#[derive(Debug, Clone)]
pub struct FsFileSource {
    root: PathBuf,
}

impl FsFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl FileSource for FsFileSource {
    async fn read_to_string(&self, path: &str) -> Result<String, SourceError> {
        tokio::fs::read_to_string(self.root.join(path))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SourceError::NotFound {
                    path: path.to_string(),
                },
                _ => SourceError::Io {
                    path: path.to_string(),
                    source: e,
                },
            })
    }

    async fn stamp(&self, path: &str) -> Option<FileStamp> {
        let meta = tokio::fs::metadata(self.root.join(path)).await.ok()?;
        if !meta.is_file() {
            return None;
        }
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_nanos());
        let hash = if meta.len() <= STAMP_HASH_LIMIT {
            // A file removed between the two calls reads as missing.
            let bytes = tokio::fs::read(self.root.join(path)).await.ok()?;
            content_hash(&bytes)
        } else {
            0
        };
        Some(FileStamp {
            modified,
            len: meta.len(),
            hash,
        })
    }

    async fn list_dir(&self, folder: &str) -> Vec<String> {
        let mut entries = match tokio::fs::read_dir(self.root.join(folder)).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(folder, error = %e, "folder not listed");
                return Vec::new();
            }
        };

        let mut paths = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if is_file && is_data_file(name) {
                paths.push(join(folder, name));
            }
        }
        paths.sort();
        paths
    }
}

// ===========================================================================
// In memory
// ===========================================================================

#[derive(Debug, Default)]
struct MemoryFiles {
    files: BTreeMap<String, (String, u64)>,
    clock: u64,
}

/// In-memory files keyed by path. Every write gets a fresh stamp, so
/// loaders see it as a change even when the length stays the same.
#[derive(Debug, Default)]
pub struct MemoryFileSource {
    inner: Mutex<MemoryFiles>,
}

impl MemoryFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let source = Self::new();
        for (path, text) in files {
            source.write(path, text);
        }
        source
    }

    pub fn write(&self, path: &str, text: impl Into<String>) {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let version = inner.clock;
        inner.files.insert(path.to_string(), (text.into(), version));
    }

    pub fn remove(&self, path: &str) -> bool {
        self.inner.lock().files.remove(path).is_some()
    }
}

#[async_trait]
impl FileSource for MemoryFileSource {
    async fn read_to_string(&self, path: &str) -> Result<String, SourceError> {
        self.inner
            .lock()
            .files
            .get(path)
            .map(|(text, _)| text.clone())
            .ok_or_else(|| SourceError::NotFound {
                path: path.to_string(),
            })
    }

    async fn stamp(&self, path: &str) -> Option<FileStamp> {
        self.inner.lock().files.get(path).map(|(text, version)| FileStamp {
            modified: u128::from(*version),
            len: text.len() as u64,
            hash: content_hash(text.as_bytes()),
        })
    }

    async fn list_dir(&self, folder: &str) -> Vec<String> {
        let prefix = join(folder, "");
        self.inner
            .lock()
            .files
            .keys()
            .filter(|p| {
                p.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .filter(|p| is_data_file(p))
            .cloned()
            .collect()
    }
}
