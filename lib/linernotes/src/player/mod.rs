mod playerctl;

pub use playerctl::PlayerctlSource;

use thiserror::Error;

/// Why the current track could not be determined.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no media player available: {0}")]
    PlayerUnavailable(String),

    #[error("nothing is playing right now")]
    NothingPlaying,

    #[error("current item is not music ({0})")]
    NotMusic(String),

    #[error("player query timed out after {0}s")]
    Timeout(u64),

    #[error("player query failed: {0}")]
    Io(#[from] std::io::Error),
}
