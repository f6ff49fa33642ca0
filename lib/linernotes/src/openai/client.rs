use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::models::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse};
use crate::{
    error::{Error, Result},
    traits::CompletionBackend,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Chat-completion client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    client: Client,
}

#[derive(Default)]
pub struct OpenAiClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

impl OpenAiClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// A missing key is not a build error; calls fail with
    /// [`Error::MissingCredential`] instead.
    pub fn api_key(mut self, key: Option<&str>) -> Self {
        self.api_key = key.map(str::to_string);
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<OpenAiClient> {
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        // `Url::join` drops the last segment unless the base ends with a slash.
        let base_url = Url::parse(&format!("{}/", base.trim_end_matches('/')))?;

        Ok(OpenAiClient {
            base_url,
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            client: Client::new(),
        })
    }
}

impl OpenAiClient {
    pub fn endpoint(&self) -> Result<Url> {
        Ok(self.base_url.join("chat/completions")?)
    }

    async fn handle_response(response: Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        parse_completion(&text)
    }
}

/// Pulls the first choice's message content out of a response body.
pub(crate) fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("JSON parse error: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::MalformedResponse("response has no choices".to_string()))
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    fn id(&self) -> &'static str {
        "openai"
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let key = self.api_key.as_deref().ok_or(Error::MissingCredential)?;
        let url = self.endpoint()?;
        let body = ChatCompletionRequest::single_turn(&self.model, prompt);

        debug!("Request: POST {} (model {})", url, self.model);
        let request = self.client.post(url).bearer_auth(key).json(&body).send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(response) => response?,
            Err(_) => {
                warn!("Completion request timed out after {:?}", self.timeout);
                return Err(Error::Timeout(self.timeout.as_secs()));
            }
        };
        Self::handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_is_single_user_turn_at_zero_temperature() {
        let body = ChatCompletionRequest::single_turn("gpt-3.5-turbo", "Who produced OK Computer?");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.0,
                "messages": [{"role": "user", "content": "Who produced OK Computer?"}]
            })
        );
    }

    #[test]
    fn first_choice_content_is_used() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Nigel Godrich."}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        })
        .to_string();
        assert_eq!(parse_completion(&body).unwrap(), "Nigel Godrich.");
    }

    #[test]
    fn empty_choices_are_malformed() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        let err = parse_completion("<html>").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn endpoint_keeps_version_segment() {
        let client = OpenAiClientBuilder::new()
            .base_url("https://example.test/v1")
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "https://example.test/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_fails_to_build() {
        let result = OpenAiClientBuilder::new().base_url("not a url").build();
        assert!(matches!(result, Err(Error::Url(_))));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = OpenAiClientBuilder::new()
            .base_url("http://127.0.0.1:9/v1/")
            .api_key(None)
            .build()
            .unwrap();
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
    }
}
