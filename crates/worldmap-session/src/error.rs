use worldmap_data::DataLoadError;

/// Errors surfaced by a [`crate::WorldMapSession`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Loading the world map failed; the previous snapshot stays current.
    #[error("world map load failed: {0}")]
    Load(#[from] DataLoadError),

    /// A request needs a snapshot, but nothing has loaded yet.
    #[error("no world map is loaded")]
    NoSnapshot,

    /// The renderer could not take a message.
    #[error("renderer error: {detail}")]
    Renderer { detail: String },

    /// A message could not be encoded or decoded.
    #[error("serialization error: {detail}")]
    Serialization { detail: String },

    /// The file watcher could not be started.
    #[error("file watcher error: {detail}")]
    Watch { detail: String },
}
