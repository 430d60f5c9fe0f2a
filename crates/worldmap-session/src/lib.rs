//! A live world map session for an editor.
//!
//! [`WorldMapSession`] keeps the current snapshot of a game directory and
//! keeps a renderer in sync with it. File changes reach it through
//! [`watch::FsWatcher`] and [`debounce::spawn_change_listener`]; renderer
//! requests through [`WorldMapSession::handle_message`].
//!
//! ```rust,ignore
//! let source = Arc::new(FsFileSource::new(&root));
//! let config = WorldMapConfig::load(source.as_ref(), "worldmap.toml").await?;
//! let (renderer, lines) = ChannelRenderer::new();
//! let session = Arc::new(WorldMapSession::new(
//!     WorldMapLoader::new(source, &config),
//!     Arc::new(renderer),
//!     Arc::new(LogHost),
//!     config.diff_limits(),
//! ));
//! session.refresh(false).await?;
//! ```

pub mod debounce;
pub mod error;
pub mod renderer;
pub mod session;
pub mod watch;

pub use debounce::spawn_change_listener;
pub use error::SessionError;
pub use renderer::{ChannelRenderer, Host, LogHost, Renderer};
pub use session::{SessionPhase, WorldMapSession};
pub use watch::FsWatcher;
