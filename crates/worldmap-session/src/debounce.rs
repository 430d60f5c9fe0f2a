use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::session::WorldMapSession;

/// Refresh `session` after file changes settle.
///
/// Changed paths arrive on `rx` as workspace-relative strings. A burst of
/// changes is collected until `quiet` passes without a new one; the session
/// then refreshes once, and only if some path in the burst is a dependency
/// of the current snapshot (any path counts while nothing is loaded). The
/// task ends when the sender is dropped.
pub fn spawn_change_listener(
    session: Arc<WorldMapSession>,
    mut rx: UnboundedReceiver<String>,
    quiet: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(first) = rx.recv().await {
            let mut relevant = session.is_dependency(&first);
            let mut closed = false;
            loop {
                match tokio::time::timeout(quiet, rx.recv()).await {
                    Ok(Some(path)) => relevant |= session.is_dependency(&path),
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            if relevant {
                tracing::debug!("definition files changed, refreshing");
                if let Err(e) = session.refresh(false).await {
                    tracing::warn!(error = %e, "refresh after file change failed");
                }
            } else {
                tracing::trace!(path = %first, "change outside dependencies ignored");
            }
            if closed {
                break;
            }
        }
    })
}
