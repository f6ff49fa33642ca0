//! Centralized configuration management.
//!
//! Every knob is read from the environment once at startup. Nothing here is
//! required: a missing credential only surfaces as an error on the first
//! completion call.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_PLAYER: &str = "spotify";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TICK_MS: u64 = 1000;

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    /// Bearer token for the completion API (`AUTH_TOKEN_OPEN_AI`, then `OPENAI_API_KEY`)
    pub api_key: Option<String>,
    /// Model identifier (default: "gpt-3.5-turbo")
    pub model: String,
    /// Completion API base URL (default: "https://api.openai.com/v1/")
    pub api_url: String,
    /// playerctl player name; `None` lets playerctl pick (default: "spotify")
    pub player: Option<String>,
    /// Per-request timeout in seconds (default: 60)
    pub request_timeout_secs: u64,
    /// UI poll interval in milliseconds (default: 1000)
    pub tick_ms: u64,
    /// Where tracing output goes (default: "$TMPDIR/linernotes.log")
    pub log_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty("AUTH_TOKEN_OPEN_AI").or_else(|| non_empty("OPENAI_API_KEY")),
            model: non_empty("LINERNOTES_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_url: non_empty("LINERNOTES_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            player: match lookup("LINERNOTES_PLAYER") {
                Some(p) if p.trim().is_empty() => None,
                Some(p) => Some(p),
                None => Some(DEFAULT_PLAYER.to_string()),
            },
            request_timeout_secs: non_empty("LINERNOTES_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            tick_ms: non_empty("LINERNOTES_TICK_MS")
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_TICK_MS),
            log_file: non_empty("LINERNOTES_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("linernotes.log")),
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("player", &self.player)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("tick_ms", &self.tick_ms)
            .field("log_file", &self.log_file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.player.as_deref(), Some("spotify"));
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.tick(), Duration::from_secs(1));
    }

    #[test]
    fn primary_token_wins_over_fallback() {
        let config = config_from(&[
            ("AUTH_TOKEN_OPEN_AI", "primary"),
            ("OPENAI_API_KEY", "fallback"),
        ]);
        assert_eq!(config.api_key.as_deref(), Some("primary"));

        let config = config_from(&[("AUTH_TOKEN_OPEN_AI", " "), ("OPENAI_API_KEY", "fallback")]);
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn empty_player_means_any_player() {
        let config = config_from(&[("LINERNOTES_PLAYER", "")]);
        assert_eq!(config.player, None);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("LINERNOTES_REQUEST_TIMEOUT_SECS", "soon"),
            ("LINERNOTES_TICK_MS", "0"),
        ]);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.tick_ms, DEFAULT_TICK_MS);
    }

    #[test]
    fn debug_output_redacts_the_credential() {
        let config = config_from(&[("AUTH_TOKEN_OPEN_AI", "sk-very-secret")]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
