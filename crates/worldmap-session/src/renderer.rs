//! The two outward seams of a session: the renderer that draws the map and
//! the host that can open definition files.

use async_trait::async_trait;
use tokio::sync::mpsc;

use worldmap_core::id::SourceSpan;
use worldmap_core::message::OutboundMessage;

use crate::error::SessionError;

/// Receives messages for the map view. Delivery is best-effort: the session
/// logs a failed post and carries on.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn post(&self, message: OutboundMessage) -> Result<(), SessionError>;
}

/// Editor integration for "go to definition" requests from the map view.
#[async_trait]
pub trait Host: Send + Sync {
    async fn open_source(&self, file: &str, span: Option<SourceSpan>) -> Result<(), SessionError>;
}

/// Serializes every message to a JSON line and forwards it on a channel.
#[derive(Debug, Clone)]
pub struct ChannelRenderer {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelRenderer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Renderer for ChannelRenderer {
    async fn post(&self, message: OutboundMessage) -> Result<(), SessionError> {
        let json = serde_json::to_string(&message).map_err(|e| SessionError::Serialization {
            detail: e.to_string(),
        })?;
        self.tx.send(json).map_err(|_| SessionError::Renderer {
            detail: "renderer channel closed".to_string(),
        })
    }
}

/// A host without an editor: open requests are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHost;

#[async_trait]
impl Host for LogHost {
    async fn open_source(&self, file: &str, span: Option<SourceSpan>) -> Result<(), SessionError> {
        match span {
            Some(span) => tracing::info!(file, start = span.start, end = span.end, "open source"),
            None => tracing::info!(file, "open source"),
        }
        Ok(())
    }
}
