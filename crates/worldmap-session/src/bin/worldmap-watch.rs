//! Load a game directory, print renderer messages as JSON lines on stdout,
//! and keep them coming as definition files change.
//!
//! Renderer requests are read as JSON lines from stdin; the process exits
//! when stdin closes.
//!
//! Usage:
//!   worldmap-watch <game-dir> [--config worldmap.toml]
//!   RUST_LOG=worldmap_data=debug worldmap-watch ./game

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use worldmap_data::{FsFileSource, WorldMapConfig, WorldMapLoader};
use worldmap_session::{
    ChannelRenderer, FsWatcher, LogHost, SessionError, WorldMapSession, spawn_change_listener,
};

#[derive(Parser, Debug)]
#[command(name = "worldmap-watch", about = "Stream world map updates for a game directory")]
struct Args {
    /// Game directory holding the map and history folders.
    root: PathBuf,

    /// Configuration file, relative to the game directory.
    #[arg(long, default_value = "worldmap.toml")]
    config: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "worldmap-watch failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), SessionError> {
    let source = Arc::new(FsFileSource::new(&args.root));
    let config = WorldMapConfig::load(source.as_ref(), &args.config).await?;
    tracing::info!(root = %args.root.display(), ?config, "starting");

    let (renderer, mut lines) = ChannelRenderer::new();
    let printer = tokio::spawn(async move {
        while let Some(line) = lines.recv().await {
            println!("{line}");
        }
    });

    let session = Arc::new(WorldMapSession::new(
        WorldMapLoader::new(source, &config),
        Arc::new(renderer),
        Arc::new(LogHost),
        config.diff_limits(),
    ));

    let (changes_tx, changes_rx) = tokio::sync::mpsc::unbounded_channel();
    let _watcher = FsWatcher::spawn(&args.root, changes_tx)?;
    let listener = spawn_change_listener(
        session.clone(),
        changes_rx,
        Duration::from_millis(config.debounce_ms),
    );

    if let Err(e) = session.refresh(false).await {
        tracing::warn!(error = %e, "initial load failed, waiting for changes");
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match stdin.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => {
                if let Err(e) = session.handle_json(&line).await {
                    tracing::warn!(error = %e, "request failed");
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin closed");
                break;
            }
        }
    }

    listener.abort();
    drop(session);
    let _ = printer.await;
    Ok(())
}
