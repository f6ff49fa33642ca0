//! In-process stand-ins for the service traits.

use async_trait::async_trait;
use shared::track::RawTrack;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::player::ResolveError;
use crate::traits::{CompletionBackend, TrackSource};

/// Answers by prompt; prompts without an answer fail with an API error.
#[derive(Default)]
pub(crate) struct FakeBackend {
    answers: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    default_answer: Option<String>,
}

impl FakeBackend {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(p, a)| (p.to_string(), a.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    /// Answers every prompt with the same text.
    pub fn echo(answer: &str) -> Self {
        Self {
            default_answer: Some(answer.to_string()),
            ..Default::default()
        }
    }

    pub fn delay(mut self, prompt: &str, delay: Duration) -> Self {
        self.delays.insert(prompt.to_string(), delay);
        self
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    fn id(&self) -> &'static str {
        "fake"
    }

    fn name(&self) -> &'static str {
        "Fake"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Some(delay) = self.delays.get(prompt) {
            tokio::time::sleep(*delay).await;
        }
        self.answers
            .get(prompt)
            .or(self.default_answer.as_ref())
            .cloned()
            .ok_or(Error::Api {
                status: 500,
                message: "boom".to_string(),
            })
    }
}

/// Hands out queued tracks, one per call; an exhausted queue means nothing plays.
#[derive(Default)]
pub(crate) struct FakeSource {
    queue: Mutex<Vec<RawTrack>>,
}

impl FakeSource {
    pub fn new(tracks: Vec<RawTrack>) -> Self {
        let mut queue = tracks;
        queue.reverse();
        Self {
            queue: Mutex::new(queue),
        }
    }
}

#[async_trait]
impl TrackSource for FakeSource {
    fn id(&self) -> &'static str {
        "fake"
    }

    fn name(&self) -> &'static str {
        "Fake"
    }

    async fn current_track(&self) -> std::result::Result<RawTrack, ResolveError> {
        self.queue
            .lock()
            .unwrap()
            .pop()
            .ok_or(ResolveError::NothingPlaying)
    }
}

pub(crate) fn raw_track(artist: &str, title: &str, album: &str) -> RawTrack {
    RawTrack {
        artists: vec![artist.to_string()],
        title: title.to_string(),
        album: album.to_string(),
    }
}
