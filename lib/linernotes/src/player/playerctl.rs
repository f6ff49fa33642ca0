use async_trait::async_trait;
use itertools::Itertools;
use shared::track::RawTrack;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::ResolveError;
use crate::traits::TrackSource;

/// Timeout for a single playerctl invocation (5 seconds)
const QUERY_TIMEOUT_SECS: u64 = 5;

const FIELD_SEPARATOR: &str = "|||";

/// Track id, artist list, title, album. playerctl joins list values with ", ".
const METADATA_FORMAT: &str =
    "{{mpris:trackid}}|||{{xesam:artist}}|||{{xesam:title}}|||{{xesam:album}}";

/// Track id fragments used by players for ads and podcast episodes.
const NON_MUSIC_MARKERS: [&str; 4] = [":ad:", "/ad/", ":episode:", "/episode/"];

/// Reads the current track over MPRIS through the `playerctl` CLI.
#[derive(Debug, Clone, Default)]
pub struct PlayerctlSource {
    player: Option<String>,
}

impl PlayerctlSource {
    /// `player` restricts the query to one MPRIS player (e.g. "spotify").
    pub fn new(player: Option<String>) -> Self {
        Self { player }
    }

    async fn run(&self, args: &[&str]) -> Result<String, ResolveError> {
        let mut cmd = Command::new("playerctl");
        if let Some(player) = &self.player {
            cmd.arg("--player").arg(player);
        }
        cmd.args(args).kill_on_drop(true);

        debug!("Running playerctl {:?}", args);
        let output = match tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            cmd.output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ResolveError::PlayerUnavailable(
                    "playerctl is not installed".to_string(),
                ))
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(ResolveError::Timeout(QUERY_TIMEOUT_SECS)),
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("playerctl exited with code {:?}", output.status.code())
            } else {
                stderr
            };
            Err(ResolveError::PlayerUnavailable(message))
        }
    }
}

#[async_trait]
impl TrackSource for PlayerctlSource {
    fn id(&self) -> &'static str {
        "playerctl"
    }

    fn name(&self) -> &'static str {
        "playerctl (MPRIS)"
    }

    async fn current_track(&self) -> Result<RawTrack, ResolveError> {
        let status = self.run(&["status"]).await?;
        check_status(&status)?;

        let metadata = self.run(&["metadata", "--format", METADATA_FORMAT]).await?;
        let track = parse_metadata(&metadata)?;
        info!(
            "Now playing: {} - {} ({})",
            track.artists.join(", "),
            track.title,
            track.album
        );
        Ok(track)
    }
}

fn check_status(status: &str) -> Result<(), ResolveError> {
    match status.trim() {
        "Playing" | "Paused" => Ok(()),
        _ => Err(ResolveError::NothingPlaying),
    }
}

/// Parses one line of `METADATA_FORMAT` output.
fn parse_metadata(line: &str) -> Result<RawTrack, ResolveError> {
    let (track_id, artists, title, album) = line
        .lines()
        .next()
        .unwrap_or_default()
        .split(FIELD_SEPARATOR)
        .map(str::trim)
        .collect_tuple()
        .ok_or(ResolveError::NothingPlaying)?;

    if let Some(marker) = NON_MUSIC_MARKERS.iter().find(|m| track_id.contains(*m)) {
        let kind = if marker.contains("ad") { "advertisement" } else { "podcast episode" };
        return Err(ResolveError::NotMusic(kind.to_string()));
    }

    if title.is_empty() {
        return Err(ResolveError::NothingPlaying);
    }

    let artists: Vec<String> = artists
        .split(", ")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();

    Ok(RawTrack {
        artists,
        title: title.to_string(),
        album: album.to_string(),
    })
}
