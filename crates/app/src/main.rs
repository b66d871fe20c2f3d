use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use spindle_core::{AppConfig, ContextId, EndOfQueue};
use spindle_output::OutputBinding;
use spindle_session::{SessionSnapshot, SessionStore};
use spindle_sources::{normalize_album_all, AlbumTrack};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;

mod device;

use device::SimulatedDevice;

#[derive(Parser, Debug)]
#[command(
    name = "spindle",
    about = "Playlist -> Session Store -> Output Binding"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a JSON playlist through the simulated output device.
    Run {
        #[arg(long)]
        playlist: PathBuf,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

/// Playlist files carry raw album-shaped rows, the same shape the album
/// grid receives from the data-fetching layer.
#[derive(Debug, Deserialize)]
struct PlaylistFile {
    context: String,
    tracks: Vec<Option<AlbumTrack>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cli.command {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Run { playlist } => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg, &playlist).await
        }
    }
}

async fn run(cfg: AppConfig, playlist_path: &Path) -> Result<()> {
    let media_base = Url::parse(&cfg.media_base_url)
        .with_context(|| format!("invalid media_base_url {}", cfg.media_base_url))?;

    let playlist = load_playlist(playlist_path)?;
    let context = ContextId::album(playlist.context.clone());
    let tracks = normalize_album_all(playlist.tracks);
    if tracks.is_empty() {
        bail!("playlist {} has no playable tracks", playlist_path.display());
    }

    info!(
        context = %context,
        tracks = tracks.len(),
        end_of_queue = ?cfg.end_of_queue,
        "spindle started"
    );

    let (store, directives) = SessionStore::new(cfg.end_of_queue);
    let (sim, events) = SimulatedDevice::new(
        Duration::from_millis(cfg.demo.load_ms),
        Duration::from_millis(cfg.demo.track_ms),
        media_base.as_str().to_string(),
    );
    let binding = OutputBinding::new(sim, directives, events, store.clone());
    tokio::spawn(binding.run());

    // Independent display surface; it knows only its own list identity
    // and the snapshots it watches.
    tokio::spawn(observe(store.subscribe(), context.clone()));

    store.set_playlist(tracks, context);
    store.play();

    tokio::select! {
        _ = playback_finished(store.subscribe()) => {
            let snapshot = store.snapshot();
            match snapshot.playback_error {
                Some(error) => warn!(%error, "playback halted"),
                None => info!("queue finished"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c; shutting down");
            store.pause();
        }
    }

    Ok(())
}

async fn observe(mut rx: watch::Receiver<SessionSnapshot>, my_list: ContextId) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        if let Some(error) = &snapshot.playback_error {
            warn!(%error, "playback error");
            continue;
        }
        if !snapshot.is_context_active(&my_list) {
            continue;
        }
        if let Some(track) = &snapshot.current_track {
            let state = if snapshot.is_playing { "playing" } else { "paused" };
            info!(
                track = %track.id,
                position = ?snapshot.position,
                "{state}: {} - {}",
                track.name,
                track.artist
            );
        }
    }
}

/// Resolves once playback has started and then come to rest again,
/// either at the natural end of the queue or on an error.
async fn playback_finished(mut rx: watch::Receiver<SessionSnapshot>) {
    let mut started = false;
    loop {
        {
            let snapshot = rx.borrow_and_update();
            if snapshot.playback_error.is_some() {
                return;
            }
            if snapshot.is_playing {
                started = true;
            } else if started {
                return;
            }
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn load_playlist(path: &Path) -> Result<PlaylistFile> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("spindle").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("SPINDLE_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
    if let Ok(v) = std::env::var("SPINDLE_END_OF_QUEUE") {
        if let Some(policy) = parse_end_of_queue(&v) {
            cfg.end_of_queue = policy;
        }
    }
    if let Ok(v) = std::env::var("SPINDLE_MEDIA_BASE_URL") {
        if !v.trim().is_empty() {
            cfg.media_base_url = v;
        }
    }
}

fn parse_end_of_queue(value: &str) -> Option<EndOfQueue> {
    match value.trim().to_ascii_lowercase().as_str() {
        "stop" => Some(EndOfQueue::Stop),
        "wrap" => Some(EndOfQueue::Wrap),
        _ => None,
    }
}
