//! OpenAI-compatible chat completions client for card generation.
//!
//! Uses a `json_schema` response format so the model answers with
//! `{"cards": [{"front": .., "back": ..}]}`. Output that does not parse into
//! that shape is retried up to `max_attempts` times in total; every other
//! failure is returned immediately.

use super::{CardGenerator, GenerationRequest, ProviderError};
use crate::config::AiConfig;
use crate::models::CardDraft;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

pub struct OpenAiGenerator {
    client: Client,
    config: AiConfig,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct GeneratedCards {
    cards: Vec<CardDraft>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiGenerator {
    pub fn new(config: AiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "flashcards",
                    "strict": true,
                    "schema": cards_schema()
                }
            }
        })
    }

    fn request_once(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<Vec<CardDraft>, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.request_body(request))
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        parse_completion(&body)
    }
}

impl CardGenerator for OpenAiGenerator {
    fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    fn generate(&self, request: &GenerationRequest) -> Result<Vec<CardDraft>, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey)?;
        let max_attempts = self.config.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            debug!(
                "Requesting {} cards from {} (attempt {}/{})",
                request.card_count, self.config.model, attempt, max_attempts
            );
            match self.request_once(api_key, request) {
                Err(err) if err.is_malformed_output() && attempt < max_attempts => {
                    warn!("Malformed AI output on attempt {}: {}", attempt, err);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

fn cards_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "cards": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "front": { "type": "string" },
                        "back": { "type": "string" }
                    },
                    "required": ["front", "back"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["cards"],
        "additionalProperties": false
    })
}

/// Extracts the card list from a chat completion body
fn parse_completion(body: &str) -> Result<Vec<CardDraft>, ProviderError> {
    let completion: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedOutput(format!("unexpected response body: {}", e)))?;

    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| ProviderError::MalformedOutput("response has no choices".to_string()))?;

    if let Some(refusal) = message.refusal {
        return Err(ProviderError::MalformedOutput(format!(
            "model refused: {}",
            refusal
        )));
    }

    let content = message
        .content
        .ok_or_else(|| ProviderError::MalformedOutput("response has no content".to_string()))?;

    let generated: GeneratedCards = serde_json::from_str(&content)
        .map_err(|e| ProviderError::MalformedOutput(e.to_string()))?;

    Ok(generated.cards)
}

/// Pulls `error.message` out of an API error body, falling back to the raw text
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.chars().take(500).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::generation::request_cards;
    use httpmock::prelude::*;

    fn generator_for(server: &MockServer) -> OpenAiGenerator {
        OpenAiGenerator::new(AiConfig {
            base_url: server.base_url(),
            api_key: Some("sk-test".to_string()),
            max_attempts: 2,
            timeout_secs: 5,
            ..AiConfig::default()
        })
        .unwrap()
    }

    fn completion_with(content: &str) -> String {
        json!({
            "choices": [
                { "message": { "role": "assistant", "content": content, "refusal": null } }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_parse_completion() {
        let body = completion_with(r#"{"cards":[{"front":"hola","back":"hello"},{"front":"adiós","back":"goodbye"}]}"#);
        let cards = parse_completion(&body).unwrap();
        assert_eq!(
            cards,
            vec![CardDraft::new("hola", "hello"), CardDraft::new("adiós", "goodbye")]
        );
    }

    #[test]
    fn test_parse_completion_bad_content_is_malformed() {
        let body = completion_with(r#"{"items":[]}"#);
        let err = parse_completion(&body).unwrap_err();
        assert!(err.is_malformed_output());
        assert!(err.to_string().contains("did not match schema"));
    }

    #[test]
    fn test_parse_completion_refusal() {
        let body = json!({
            "choices": [{ "message": { "content": null, "refusal": "I can't help with that" } }]
        })
        .to_string();
        assert!(parse_completion(&body).unwrap_err().is_malformed_output());
    }

    #[test]
    fn test_parse_completion_no_choices() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.is_malformed_output());
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Incorrect API key provided");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_configured_only_with_key() {
        let generator = OpenAiGenerator::new(AiConfig::default()).unwrap();
        assert!(!generator.is_configured());

        let generator = OpenAiGenerator::new(AiConfig {
            api_key: Some("sk-test".to_string()),
            ..AiConfig::default()
        })
        .unwrap();
        assert!(generator.is_configured());
        assert_eq!(generator.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_request_body_carries_schema() {
        let generator = OpenAiGenerator::new(AiConfig::default()).unwrap();
        let request = GenerationRequest::new(1, "Spanish Basics", None);
        let body = generator.request_body(&request);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["required"][0],
            "cards"
        );
    }

    #[test]
    fn test_malformed_output_retried_once() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/chat/completions")
                .header("authorization", "Bearer sk-test");
            then.status(200)
                .header("content-type", "application/json")
                .body(completion_with(r#"{"items":[]}"#));
        });

        let generator = generator_for(&server);
        let request = GenerationRequest::new(1, "Spanish Basics", Some("Common greetings"));
        let result = request_cards(&generator, &request);

        assert!(matches!(result, Err(AppError::ProviderFormat)));
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_rate_limit_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST).path("/chat/completions");
            then.status(429).json_body(json!({
                "error": { "message": "Rate limit reached for gpt-4o-mini", "type": "requests" }
            }));
        });

        let generator = generator_for(&server);
        let request = GenerationRequest::new(1, "Spanish Basics", None);

        match generator.generate(&request) {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached for gpt-4o-mini");
            }
            other => panic!("expected API error, got {:?}", other),
        }
        assert_eq!(mock.calls(), 1);

        let result = request_cards(&generator, &request);
        assert!(matches!(result, Err(AppError::ProviderRateLimit)));
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_bad_key_classified_as_auth() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST).path("/chat/completions");
            then.status(401).json_body(json!({
                "error": { "message": "Incorrect API key provided: sk-test", "type": "invalid_request_error" }
            }));
        });

        let generator = generator_for(&server);
        let request = GenerationRequest::new(1, "Spanish Basics", None);
        let result = request_cards(&generator, &request);

        assert!(matches!(result, Err(AppError::ProviderAuth)));
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_twenty_cards_over_http() {
        let server = MockServer::start();
        let cards: Vec<_> = (1..=20)
            .map(|i| json!({ "front": format!("front {}", i), "back": format!("back {}", i) }))
            .collect();
        let content = json!({ "cards": cards }).to_string();
        let mock = server.mock(|when, then| {
            when.method(Method::POST).path("/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .body(completion_with(&content));
        });

        let generator = generator_for(&server);
        let request = GenerationRequest::new(1, "Spanish Basics", None);
        let drafts = request_cards(&generator, &request).unwrap();

        assert_eq!(drafts.len(), 20);
        assert_eq!(drafts[0], CardDraft::new("front 1", "back 1"));
        assert_eq!(mock.calls(), 1);
    }
}
