use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::openai::OpenAiClientBuilder;
use crate::player::PlayerctlSource;
use crate::{CompletionBackend, TrackSource};

pub struct Services {
    sources: HashMap<String, Arc<dyn TrackSource>>,
    completion: HashMap<String, Arc<dyn CompletionBackend>>,
    default_source: Option<String>,
    default_completion: Option<String>,
}

impl Services {
    /// The stock wiring: playerctl for the track, OpenAI for the answers.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = OpenAiClientBuilder::new()
            .base_url(&config.api_url)
            .api_key(config.api_key.as_deref())
            .model(&config.model)
            .timeout_secs(config.request_timeout_secs)
            .build()?;

        ServicesBuilder::new()
            .add_source(PlayerctlSource::new(config.player.clone()))
            .add_completion(client)
            .build()
            .map_err(|_| crate::error::Error::NotConfigured)
    }

    pub fn source(&self, id: Option<&str>) -> Option<&Arc<dyn TrackSource>> {
        let key = id.or(self.default_source.as_deref())?;
        self.sources.get(key)
    }

    pub fn completion(&self, id: Option<&str>) -> Option<&Arc<dyn CompletionBackend>> {
        let key = id.or(self.default_completion.as_deref())?;
        self.completion.get(key)
    }

    pub fn list_sources(&self) -> Vec<(&str, &str)> {
        self.sources.values().map(|p| (p.id(), p.name())).collect()
    }

    pub fn list_completion(&self) -> Vec<(&str, &str)> {
        self.completion
            .values()
            .map(|p| (p.id(), p.name()))
            .collect()
    }
}

pub struct ServicesBuilder {
    sources: HashMap<String, Arc<dyn TrackSource>>,
    completion: HashMap<String, Arc<dyn CompletionBackend>>,
    default_source: Option<String>,
    default_completion: Option<String>,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            completion: HashMap::new(),
            default_source: None,
            default_completion: None,
        }
    }

    pub fn add_source(mut self, source: impl TrackSource + 'static) -> Self {
        let id = source.id().to_string();
        if self.default_source.is_none() {
            self.default_source = Some(id.clone());
        }
        self.sources.insert(id, Arc::new(source));
        self
    }

    pub fn add_completion(mut self, backend: impl CompletionBackend + 'static) -> Self {
        let id = backend.id().to_string();
        if self.default_completion.is_none() {
            self.default_completion = Some(id.clone());
        }
        self.completion.insert(id, Arc::new(backend));
        self
    }

    pub fn build(self) -> std::result::Result<Services, &'static str> {
        if self.sources.is_empty() {
            return Err("at least one track source required");
        }
        if self.completion.is_empty() {
            return Err("at least one completion backend required");
        }

        Ok(Services {
            sources: self.sources,
            completion: self.completion,
            default_source: self.default_source,
            default_completion: self.default_completion,
        })
    }
}

impl Default for ServicesBuilder {
    fn default() -> Self {
        Self::new()
    }
}
