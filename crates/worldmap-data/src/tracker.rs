use std::sync::Arc;

use crate::framework::{Loader, Reloadable};
use crate::loader::DataLoadError;

/// Records the upstream results a merge consumed.
///
/// A merge loads every upstream through the tracker. The tracker keeps the
/// generation each upstream had at that moment, so a downstream result is
/// known to be stale as soon as any of those upstreams produced something
/// newer, no matter which consumer triggered the upstream reload.
#[derive(Default)]
pub struct UpstreamTracker {
    consumed: Vec<(Arc<dyn Reloadable>, u64)>,
    dependencies: Vec<String>,
}

impl UpstreamTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `loader` without forcing and remember the generation consumed.
    pub async fn load<L>(&mut self, loader: &Arc<L>) -> Result<Arc<L::Output>, DataLoadError>
    where
        L: Loader + 'static,
    {
        let result = loader.load(false).await?;
        let handle: Arc<dyn Reloadable> = loader.clone();
        self.consumed.push((handle, result.generation));
        for dep in result.dependencies {
            if !self.dependencies.contains(&dep) {
                self.dependencies.push(dep);
            }
        }
        Ok(result.result)
    }

    /// Dependency globs of every consumed upstream.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn consumed(&self) -> impl Iterator<Item = (&str, u64)> {
        self.consumed.iter().map(|(l, g)| (l.name(), *g))
    }

    /// `true` if an upstream moved past the consumed generation or would
    /// reload now.
    pub async fn is_stale(&self) -> bool {
        for (loader, generation) in &self.consumed {
            if loader.generation() != *generation {
                tracing::debug!(upstream = loader.name(), "upstream generation moved");
                return true;
            }
            if loader.should_reload().await {
                return true;
            }
        }
        false
    }
}

impl std::fmt::Debug for UpstreamTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamTracker")
            .field("consumed", &self.consumed().collect::<Vec<_>>())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
