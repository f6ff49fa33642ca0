use async_trait::async_trait;
use shared::track::RawTrack;

use crate::error::Result;
use crate::player::ResolveError;

/// Something that can tell what is playing right now.
#[async_trait]
pub trait TrackSource: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    async fn current_track(&self) -> std::result::Result<RawTrack, ResolveError>;
}

/// Single-turn text completion.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}
