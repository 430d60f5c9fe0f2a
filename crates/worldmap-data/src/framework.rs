//! Incremental, dependency-tracked loader framework.
//!
//! Two generic roles make up every loader:
//!
//! - [`FileLoader`] -- one file plus a parse function, cached by file stamp.
//! - [`FolderLoader`] -- every data file in a folder, one `FileLoader` each,
//!   merged into a typed result by a [`FolderMerge`] implementation.
//!
//! Loaders chain through [`UpstreamTracker`]: a merge loads its upstreams
//! through the tracker, and the downstream result is considered stale as
//! soon as any consumed upstream generation moves.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::sync::Mutex;

use worldmap_core::warning::Warning;

use crate::loader::DataLoadError;
use crate::source::{FileSource, FileStamp, SourceError};
use crate::tracker::UpstreamTracker;

// ===========================================================================
// Traits
// ===========================================================================

/// Change detection shared by every loader.
#[async_trait]
pub trait Reloadable: Send + Sync {
    fn name(&self) -> &str;

    /// Generation of the latest result; bumped on every fresh result and
    /// `0` before the first load.
    fn generation(&self) -> u64;

    /// `true` if the next non-forced `load` would produce a fresh result.
    async fn should_reload(&self) -> bool;
}

#[async_trait]
pub trait Loader: Reloadable {
    type Output: Send + Sync + 'static;

    /// Return the cached result, or rebuild it when something changed.
    /// `force` rebuilds unconditionally, re-reading every file.
    async fn load(&self, force: bool) -> Result<LoadResult<Self::Output>, DataLoadError>;
}

/// Result of a load. The payload is shared; a later load never mutates it.
#[derive(Debug)]
pub struct LoadResult<T> {
    pub result: Arc<T>,
    /// Paths and `folder/*` globs whose change invalidates this result.
    pub dependencies: Vec<String>,
    pub warnings: Vec<Warning>,
    pub generation: u64,
}

impl<T> Clone for LoadResult<T> {
    fn clone(&self) -> Self {
        Self {
            result: Arc::clone(&self.result),
            dependencies: self.dependencies.clone(),
            warnings: self.warnings.clone(),
            generation: self.generation,
        }
    }
}

/// Returns `true` if `path` is covered by the dependency glob `dependency`
/// (`folder/*` for direct children of a folder, otherwise an exact path).
pub fn matches_dependency(dependency: &str, path: &str) -> bool {
    let path = path.replace('\\', "/");
    match dependency.strip_suffix("/*") {
        Some(folder) => path
            .strip_prefix(folder)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|name| !name.is_empty() && !name.contains('/')),
        None => dependency == path,
    }
}

// ===========================================================================
// Single file
// ===========================================================================

pub type ParseFn<R> = fn(&str, &str) -> Result<Vec<R>, DataLoadError>;

struct FileCache<R> {
    stamp: Option<FileStamp>,
    result: LoadResult<Vec<R>>,
}

/// Loads one file into records.
///
/// An optional file that is missing contributes no records. An optional
/// file that cannot be read or parsed contributes no records and one
/// warning. A required file propagates every failure.
pub struct FileLoader<R> {
    path: String,
    required: bool,
    parse: ParseFn<R>,
    source: Arc<dyn FileSource>,
    cache: Mutex<Option<FileCache<R>>>,
    generation: AtomicU64,
}

impl<R> FileLoader<R> {
    pub fn new(path: impl Into<String>, parse: ParseFn<R>, source: Arc<dyn FileSource>) -> Self {
        Self {
            path: path.into(),
            required: false,
            parse,
            source,
            cache: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn read(&self) -> Result<Vec<R>, DataLoadError> {
        let text = self.source.read_to_string(&self.path).await?;
        (self.parse)(&self.path, &text)
    }
}

#[async_trait]
impl<R: Send + Sync + 'static> Reloadable for FileLoader<R> {
    fn name(&self) -> &str {
        &self.path
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    async fn should_reload(&self) -> bool {
        let cache = self.cache.lock().await;
        match cache.as_ref() {
            None => true,
            Some(c) => self.source.stamp(&self.path).await != c.stamp,
        }
    }
}

#[async_trait]
impl<R: Send + Sync + 'static> Loader for FileLoader<R> {
    type Output = Vec<R>;

    async fn load(&self, force: bool) -> Result<LoadResult<Vec<R>>, DataLoadError> {
        let mut cache = self.cache.lock().await;
        // Stamp before reading: a write racing the read shows up next time.
        let stamp = self.source.stamp(&self.path).await;
        if !force {
            if let Some(c) = cache.as_ref().filter(|c| c.stamp == stamp) {
                tracing::debug!(file = %self.path, "file cache hit");
                return Ok(c.result.clone());
            }
        }

        let (records, warnings) = match self.read().await {
            Ok(records) => (records, Vec::new()),
            Err(e) if self.required => return Err(e),
            Err(DataLoadError::Source(SourceError::NotFound { .. })) => (Vec::new(), Vec::new()),
            Err(e) => {
                tracing::error!(file = %self.path, error = %e, "failed to load file");
                let warning = Warning::new(format!("Failed to load {}: {}", self.path, e))
                    .with_file(&self.path);
                (Vec::new(), vec![warning])
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(file = %self.path, records = records.len(), generation, "file loaded");
        let result = LoadResult {
            result: Arc::new(records),
            dependencies: vec![self.path.clone()],
            warnings,
            generation,
        };
        *cache = Some(FileCache {
            stamp,
            result: result.clone(),
        });
        Ok(result)
    }
}

// ===========================================================================
// Folder
// ===========================================================================

/// Output of a merge plus the warnings it produced.
#[derive(Debug)]
pub struct Merged<T> {
    pub result: T,
    pub warnings: Vec<Warning>,
}

/// The entity-specific half of a folder loader.
#[async_trait]
pub trait FolderMerge: Send + Sync + 'static {
    type Record: Clone + Send + Sync + 'static;
    type Output: Send + Sync + 'static;

    /// Parse one file of the folder.
    fn parse(path: &str, text: &str) -> Result<Vec<Self::Record>, DataLoadError>;

    /// Merge the records of every file, in file order. Upstream results must
    /// be loaded through `upstream`.
    async fn merge(
        &self,
        records: Vec<Self::Record>,
        upstream: &mut UpstreamTracker,
    ) -> Result<Merged<Self::Output>, DataLoadError>;
}

struct FolderState<M: FolderMerge> {
    files: BTreeMap<String, Arc<FileLoader<M::Record>>>,
    cached: Option<LoadResult<M::Output>>,
    tracker: UpstreamTracker,
}

/// Loads every data file of a folder and merges them.
pub struct FolderLoader<M: FolderMerge> {
    name: String,
    folder: String,
    source: Arc<dyn FileSource>,
    merger: M,
    upstream: Vec<Arc<dyn Reloadable>>,
    state: Mutex<FolderState<M>>,
    generation: AtomicU64,
}

impl<M: FolderMerge> FolderLoader<M> {
    pub fn new(
        name: impl Into<String>,
        folder: impl Into<String>,
        source: Arc<dyn FileSource>,
        merger: M,
    ) -> Self {
        Self {
            name: name.into(),
            folder: folder.into().trim_end_matches('/').to_string(),
            source,
            merger,
            upstream: Vec::new(),
            state: Mutex::new(FolderState {
                files: BTreeMap::new(),
                cached: None,
                tracker: UpstreamTracker::new(),
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Declare an upstream loader; its pending reload makes this loader
    /// reload too.
    pub fn with_upstream(mut self, upstream: Arc<dyn Reloadable>) -> Self {
        self.upstream.push(upstream);
        self
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn merger(&self) -> &M {
        &self.merger
    }

    async fn needs_reload(&self, state: &FolderState<M>) -> bool {
        for upstream in &self.upstream {
            if upstream.should_reload().await {
                tracing::debug!(loader = %self.name, upstream = upstream.name(), "upstream changed");
                return true;
            }
        }
        if state.cached.is_none() || state.tracker.is_stale().await {
            return true;
        }
        let listed = self.source.list_dir(&self.folder).await;
        if !listed.iter().eq(state.files.keys()) {
            tracing::debug!(loader = %self.name, "file set changed");
            return true;
        }
        for file in state.files.values() {
            if file.should_reload().await {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl<M: FolderMerge> Reloadable for FolderLoader<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    async fn should_reload(&self) -> bool {
        let state = self.state.lock().await;
        self.needs_reload(&state).await
    }
}

#[async_trait]
impl<M: FolderMerge> Loader for FolderLoader<M> {
    type Output = M::Output;

    async fn load(&self, force: bool) -> Result<LoadResult<M::Output>, DataLoadError> {
        let mut state = self.state.lock().await;
        if !force && !self.needs_reload(&state).await {
            if let Some(cached) = &state.cached {
                tracing::debug!(loader = %self.name, "folder cache hit");
                return Ok(cached.clone());
            }
        }

        let listed = self.source.list_dir(&self.folder).await;
        state.files.retain(|path, _| listed.contains(path));
        for path in &listed {
            if !state.files.contains_key(path) {
                let file = FileLoader::new(path.clone(), M::parse, Arc::clone(&self.source));
                state.files.insert(path.clone(), Arc::new(file));
            }
        }

        let files: Vec<Arc<FileLoader<M::Record>>> = state.files.values().cloned().collect();
        let loaded = try_join_all(files.iter().map(|f| f.load(force))).await?;

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        for file in loaded {
            records.extend(file.result.iter().cloned());
            warnings.extend(file.warnings);
        }
        let record_count = records.len();

        let mut tracker = UpstreamTracker::new();
        let merged = self.merger.merge(records, &mut tracker).await?;
        warnings.extend(merged.warnings);

        let mut dependencies = vec![format!("{}/*", self.folder)];
        for dep in tracker.dependencies() {
            if !dependencies.contains(dep) {
                dependencies.push(dep.clone());
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            loader = %self.name,
            files = files.len(),
            records = record_count,
            warnings = warnings.len(),
            generation,
            "folder merged"
        );

        let result = LoadResult {
            result: Arc::new(merged.result),
            dependencies,
            warnings,
            generation,
        };
        state.cached = Some(result.clone());
        state.tracker = tracker;
        Ok(result)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
