//! OpenAI-compatible chat completions client.
//!
//! # Responsibility
//! - Send one rendered prioritization prompt and return the raw message text.
//!
//! # Invariants
//! - Exactly one HTTP request per `generate` call; no retries.
//! - Prompt bodies and API keys are never logged.

use crate::config::GenerationConfig;
use crate::prioritize::generation::{
    parse_http_error, GenerationError, GenerationResult, GenerationService,
};
use crate::prioritize::request::PrioritizationRequest;
use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

const PROVIDER_NAME: &str = "openai-compatible";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Generation service backed by any `/chat/completions` endpoint.
pub struct OpenAiCompatibleGenerator {
    config: GenerationConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatibleGenerator {
    /// Builds a client, resolving the API key from `config.api_key_env`.
    ///
    /// A missing key is reported by `generate`, before anything is sent.
    pub fn new(config: GenerationConfig) -> GenerationResult<Self> {
        let api_key = config.resolve_api_key();
        Self::build(config, api_key)
    }

    /// Builds a client with an explicit API key.
    pub fn with_api_key(
        config: GenerationConfig,
        api_key: impl Into<String>,
    ) -> GenerationResult<Self> {
        Self::build(config, Some(api_key.into()))
    }

    fn build(config: GenerationConfig, api_key: Option<String>) -> GenerationResult<Self> {
        config.validate().map_err(|err| GenerationError::InvalidRequest {
            message: err.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| GenerationError::Other {
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

fn transport_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout {
            message: err.to_string(),
        }
    } else {
        GenerationError::Network {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl GenerationService for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate(&self, request: &PrioritizationRequest) -> GenerationResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::Authentication {
                message: format!("API key not set; export {}", self.config.api_key_env),
            })?;
        let prompt = request.render_prompt().map_err(|err| GenerationError::Other {
            message: format!("failed to render prompt: {err}"),
        })?;

        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" },
        });

        let started_at = Instant::now();
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(transport_error)?;
        let duration_ms = started_at.elapsed().as_millis();

        if !(200..300).contains(&status) {
            let err = parse_http_error(status, &body_text, &self.config.model);
            warn!(
                "event=generation_call module=prioritize status=error duration_ms={} http_status={}",
                duration_ms, status
            );
            return Err(err);
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body_text).map_err(|err| GenerationError::Other {
                message: format!("unexpected completion envelope: {err}"),
            })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        info!(
            "event=generation_call module=prioritize status=ok duration_ms={} output_chars={}",
            duration_ms,
            content.len()
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::OpenAiCompatibleGenerator;
    use crate::config::GenerationConfig;
    use crate::model::task::Task;
    use crate::prioritize::generation::{GenerationError, GenerationService};
    use crate::prioritize::request::PrioritizationRequest;
    use mockito::{Matcher, Server};

    fn config_for(base_url: String) -> GenerationConfig {
        GenerationConfig {
            base_url,
            model: "test-model".to_string(),
            ..GenerationConfig::default()
        }
    }

    fn request() -> PrioritizationRequest {
        PrioritizationRequest::build(&[Task::with_id("T1", "Plan", "P1", "E1")], &[])
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "response_format": { "type": "json_object" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"{\"prioritizedTasks\":[]}"}}]}"#)
            .create_async()
            .await;

        let generator =
            OpenAiCompatibleGenerator::with_api_key(config_for(server.url()), "secret").unwrap();
        let output = generator.generate(&request()).await.unwrap();

        assert_eq!(output, r#"{"prioritizedTasks":[]}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn maps_quota_status_to_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let generator =
            OpenAiCompatibleGenerator::with_api_key(config_for(server.url()), "secret").unwrap();
        let err = generator.generate(&request()).await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::RateLimited {
                message: "quota exceeded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn empty_choices_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let generator =
            OpenAiCompatibleGenerator::with_api_key(config_for(server.url()), "secret").unwrap();
        let err = generator.generate(&request()).await.unwrap_err();
        assert_eq!(err, GenerationError::EmptyResponse);
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let config = GenerationConfig {
            api_key_env: "TEAMDESK_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..config_for(server.url())
        };
        let generator = OpenAiCompatibleGenerator::new(config).unwrap();
        let err = generator.generate(&request()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Authentication { .. }));
        mock.assert_async().await;
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = GenerationConfig {
            timeout_secs: 0,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            OpenAiCompatibleGenerator::with_api_key(config, "k"),
            Err(GenerationError::InvalidRequest { .. })
        ));
    }
}
