use serde::{Deserialize, Serialize};

/// Track as reported by the media player, before any cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrack {
    pub artists: Vec<String>,
    pub title: String,
    pub album: String,
}

/// Resolved metadata for one aggregation cycle.
///
/// `album` is already lowercased and stripped of edition noise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub artist: String,
    pub album: String,
    pub track: String,
}

impl TrackMetadata {
    pub fn new(
        artist: impl Into<String>,
        album: impl Into<String>,
        track: impl Into<String>,
    ) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
            track: track.into(),
        }
    }
}

impl std::fmt::Display for TrackMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} ({})", self.artist, self.track, self.album)
    }
}
