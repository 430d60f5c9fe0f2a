//! The live world map session.
//!
//! Owns the composite loader and the current snapshot, and turns refreshes
//! into renderer messages: an incremental diff when it is small enough, a
//! summary otherwise. Refreshes are serialized; a request that arrives while
//! one is running waits for it.

use std::sync::Arc;

use parking_lot::Mutex;

use worldmap_core::diff::{DiffLimits, DiffOutcome, diff_snapshots};
use worldmap_core::id::SourceSpan;
use worldmap_core::message::{InboundMessage, OutboundMessage};
use worldmap_core::snapshot::WorldMapData;
use worldmap_data::{Loader, WorldMapLoader, matches_dependency};

use crate::error::SessionError;
use crate::renderer::{Host, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing has loaded yet.
    Idle,
    Loading,
    /// A snapshot is available.
    Ready,
}

/// How the result of a refresh is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Announce {
    /// Diff against the previous snapshot when possible.
    Changes,
    /// Always send the full summary.
    Summary,
}

struct SessionState {
    phase: SessionPhase,
    snapshot: Option<Arc<WorldMapData>>,
    dependencies: Vec<String>,
}

pub struct WorldMapSession {
    loader: WorldMapLoader,
    renderer: Arc<dyn Renderer>,
    host: Arc<dyn Host>,
    limits: DiffLimits,
    refresh_lock: tokio::sync::Mutex<()>,
    state: Mutex<SessionState>,
}

impl WorldMapSession {
    pub fn new(
        loader: WorldMapLoader,
        renderer: Arc<dyn Renderer>,
        host: Arc<dyn Host>,
        limits: DiffLimits,
    ) -> Self {
        Self {
            loader,
            renderer,
            host,
            limits,
            refresh_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(SessionState {
                phase: SessionPhase::Idle,
                snapshot: None,
                dependencies: Vec::new(),
            }),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    /// The snapshot the renderer was last told about.
    pub fn snapshot(&self) -> Option<Arc<WorldMapData>> {
        self.state.lock().snapshot.clone()
    }

    /// Dependency globs of the current snapshot.
    pub fn dependencies(&self) -> Vec<String> {
        self.state.lock().dependencies.clone()
    }

    /// `true` if a change to `path` can affect the current snapshot.
    ///
    /// Before the first successful load every path counts, so a failed
    /// initial load is retried on the next change.
    pub fn is_dependency(&self, path: &str) -> bool {
        let state = self.state.lock();
        if state.snapshot.is_none() {
            return true;
        }
        state
            .dependencies
            .iter()
            .any(|dep| matches_dependency(dep, path))
    }

    /// Reload and tell the renderer what changed.
    ///
    /// On failure the renderer gets one `error` message and the previous
    /// snapshot stays current.
    pub async fn refresh(&self, force: bool) -> Result<(), SessionError> {
        self.run_refresh(force, Announce::Changes).await
    }

    /// Dispatch one message from the renderer.
    pub async fn handle_message(&self, message: InboundMessage) -> Result<(), SessionError> {
        if let Some((list, range)) = message.range_request() {
            let snapshot = self.snapshot().ok_or(SessionError::NoSnapshot)?;
            self.post(list.range(&snapshot, range.start, range.end)).await;
            return Ok(());
        }

        match message {
            InboundMessage::Loaded { force } => self.run_refresh(force, Announce::Summary).await,
            InboundMessage::OpenState { file, start, end } => {
                let span = start.zip(end).map(|(s, e)| SourceSpan::new(s, e));
                self.host.open_source(&file, span).await
            }
            other => {
                tracing::warn!(?other, "unhandled renderer message");
                Ok(())
            }
        }
    }

    /// Decode a JSON message from the renderer and dispatch it.
    pub async fn handle_json(&self, text: &str) -> Result<(), SessionError> {
        let message: InboundMessage =
            serde_json::from_str(text).map_err(|e| SessionError::Serialization {
                detail: e.to_string(),
            })?;
        tracing::debug!(?message, "renderer message");
        self.handle_message(message).await
    }

    async fn run_refresh(&self, force: bool, announce: Announce) -> Result<(), SessionError> {
        let _guard = self.refresh_lock.lock().await;

        let previous = {
            let mut state = self.state.lock();
            state.phase = SessionPhase::Loading;
            state.snapshot.clone()
        };
        self.post(OutboundMessage::progress("Loading world map...")).await;

        let result = match self.loader.load(force).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, force, "world map refresh failed");
                {
                    let mut state = self.state.lock();
                    state.phase = if state.snapshot.is_some() {
                        SessionPhase::Ready
                    } else {
                        SessionPhase::Idle
                    };
                }
                self.post(OutboundMessage::error(e.to_string())).await;
                return Err(e.into());
            }
        };

        let snapshot = result.result;
        let messages = match previous {
            Some(old) if !force && announce == Announce::Changes => {
                match diff_snapshots(&old, &snapshot, &self.limits) {
                    DiffOutcome::Incremental(messages) => {
                        tracing::debug!(messages = messages.len(), "incremental update");
                        messages
                    }
                    DiffOutcome::Abandoned(reason) => {
                        tracing::debug!(%reason, "diff abandoned, sending summary");
                        vec![OutboundMessage::summary(&snapshot)]
                    }
                }
            }
            _ => vec![OutboundMessage::summary(&snapshot)],
        };

        {
            let mut state = self.state.lock();
            state.phase = SessionPhase::Ready;
            state.snapshot = Some(snapshot);
            state.dependencies = result.dependencies;
        }

        for message in messages {
            self.post(message).await;
        }
        Ok(())
    }

    async fn post(&self, message: OutboundMessage) {
        let command = message.command();
        if let Err(e) = self.renderer.post(message).await {
            tracing::warn!(command, error = %e, "renderer post failed");
        }
    }
}
