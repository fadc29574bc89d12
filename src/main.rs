use anyhow::{Context, Result, bail};
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use portal_player::Config;
use portal_player::models::{Playlist, VideoItem};
use portal_player::player::{PlaybackSource, ResumeDecision, SourceResolver};
use portal_player::services::{HttpProgressService, ProgressService};

const USAGE: &str = "usage: portal-player <playlist.json> [--autoplay=false] [--progress]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portal_player=debug")),
        )
        .init();

    let mut playlist_path = None;
    let mut autoplay_flag = None;
    let mut show_progress = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--autoplay" | "--autoplay=true" => autoplay_flag = Some(true),
            "--autoplay=false" => autoplay_flag = Some(false),
            "--progress" => show_progress = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            other if other.starts_with("--") => bail!("unknown option {}\n{}", other, USAGE),
            other => playlist_path = Some(other.to_string()),
        }
    }
    let Some(playlist_path) = playlist_path else {
        bail!(USAGE);
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Falling back to default config: {:#}", e);
            Config::default()
        }
    };
    let autoplay = autoplay_flag.unwrap_or(config.playback.autoplay);

    let contents = fs::read_to_string(&playlist_path)
        .with_context(|| format!("Failed to read playlist {}", playlist_path))?;
    let items: Vec<VideoItem> =
        serde_json::from_str(&contents).context("Failed to parse playlist JSON")?;
    let playlist = Playlist::new(items, 0, None)?;

    let progress = if show_progress {
        if config.service.token.is_none() {
            warn!("No service token configured, stored progress may be rejected");
        }
        Some(HttpProgressService::from_config(&config.service)?)
    } else {
        None
    };

    info!(items = playlist.len(), autoplay, ?progress, "Resolving playlist");

    for (index, item) in playlist.items().iter().enumerate() {
        println!("{:>3}. [{}] {}", index + 1, item.delivery.as_str(), item.title);
        match SourceResolver::resolve(item, autoplay) {
            PlaybackSource::Native { url } => println!("     native:    {}", url),
            PlaybackSource::Embedded { url, .. } => println!("     embedded:  {}", url),
            PlaybackSource::Unplayable { reason } => println!("     unplayable: {}", reason),
        }
        if let Some(thumbnail) = SourceResolver::thumbnail_for(item) {
            println!("     thumbnail: {}", thumbnail);
        }
        if let Some(service) = &progress
            && let Some(video_id) = item.id.as_i64()
        {
            match service.get_status(video_id, None).await {
                Ok(status) => {
                    let decision =
                        ResumeDecision::from_status(status.as_ref(), config.playback.completed_threshold);
                    let label = decision.notice().unwrap_or_else(|| "Starting from the beginning".to_string());
                    println!("     progress:  {}", label);
                }
                Err(e) => warn!(video_id, "Failed to fetch stored progress: {:#}", e),
            }
        }
    }

    Ok(())
}
