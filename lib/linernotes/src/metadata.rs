use regex::Regex;
use shared::track::{RawTrack, TrackMetadata};
use std::sync::OnceLock;

use crate::player::ResolveError;
use crate::traits::TrackSource;

/// Edition noise removed from album names, applied in this order.
const ALBUM_NOISE: [&str; 3] = ["deluxe", "expanded edition - remastered", "bonus tracks edition"];

fn album_noise_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        ALBUM_NOISE
            .iter()
            .filter_map(|noise| Regex::new(&format!("(?i){}", regex::escape(noise))).ok())
            .collect()
    })
}

/// Lowercases the album and strips edition noise. Whatever surrounds the
/// removed text (brackets, spaces) is kept as-is.
pub fn normalize_album(album: &str) -> String {
    album_noise_patterns()
        .iter()
        .fold(album.to_lowercase(), |acc, pattern| {
            pattern.replace_all(&acc, "").into_owned()
        })
}

/// Turns what the player reports into the metadata used for one cycle.
pub fn from_raw(raw: RawTrack) -> Result<TrackMetadata, ResolveError> {
    let artist = raw
        .artists
        .into_iter()
        .next()
        .ok_or(ResolveError::NothingPlaying)?;

    Ok(TrackMetadata {
        artist,
        album: normalize_album(&raw.album),
        track: raw.title,
    })
}

pub async fn resolve_metadata(source: &dyn TrackSource) -> Result<TrackMetadata, ResolveError> {
    from_raw(source.current_track().await?)
}
