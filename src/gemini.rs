//! Client for Google's Gemini `generateContent` endpoint.
//!
//! Docs: <https://ai.google.dev/api/generate-content>

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

/// Default API root.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/";
/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const ROLE_USER: &str = "user";
const ROLE_MODEL: &str = "model";

/// Errors from a generation call.
#[derive(Debug)]
pub enum GenerationError {
    /// The request never got a response (connection, TLS, timeout).
    Network(reqwest::Error),
    /// The API answered with a non-success status.
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// The prompt or the answer was blocked by a safety filter.
    Blocked(String),
    /// The response didn't have the shape we expected.
    UnexpectedResponse(String),
    /// Client settings are unusable.
    Config(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(err) => write!(f, "request to Gemini failed: {err}"),
            Self::Api { status, message } => write!(f, "Gemini API error {status}: {message}"),
            Self::Blocked(reason) => write!(f, "blocked by Gemini: {reason}"),
            Self::UnexpectedResponse(message) => {
                write!(f, "unexpected Gemini response: {message}")
            }
            Self::Config(message) => write!(f, "invalid Gemini settings: {message}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Network(err)
    }
}

/// Anything that can turn a prompt into a greeting.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends `prompt` in a fresh conversation and returns the reply text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Sampling settings sent with every request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f64,
    /// Nucleus sampling threshold
    pub top_p: f64,
    /// Top-k sampling
    pub top_k: u32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Plain text, not JSON
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

/// One turn of a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`
    #[serde(default)]
    pub role: String,
    /// Parts of the turn; only text is used here
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }

    /// A user turn.
    pub fn user(text: &str) -> Self {
        Self::text(ROLE_USER, text)
    }

    /// A model turn.
    pub fn model(text: &str) -> Self {
        Self::text(ROLE_MODEL, text)
    }
}

/// A piece of a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Text payload; other part kinds come back as `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Connection settings for [`GeminiClient`].
#[derive(Clone, Debug)]
pub struct GeminiSettings {
    /// API key, sent as `x-goog-api-key`
    pub api_key: String,
    /// Model name, eg `gemini-1.5-flash`
    pub model: String,
    /// API root, eg `https://generativelanguage.googleapis.com/`
    pub api_base: Url,
    /// Whole-request timeout
    pub timeout: Duration,
}

/// Talks to Gemini over HTTPS.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    config: GenerationConfig,
}

impl GeminiClient {
    /// Builds a client from settings.
    pub fn new(settings: &GeminiSettings) -> Result<Self, GenerationError> {
        if settings.api_key.trim().is_empty() {
            return Err(GenerationError::Config("API key is empty".to_string()));
        }
        let endpoint = generate_content_url(&settings.api_base, &settings.model)?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            config: GenerationConfig::default(),
        })
    }

    /// The `generateContent` URL this client posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Starts a conversation seeded with `history`.
    pub fn start_chat(&self, history: Vec<Content>) -> ChatSession<'_> {
        ChatSession {
            client: self,
            history,
        }
    }

    #[instrument(skip_all, fields(turns = contents.len()))]
    async fn generate_content(&self, contents: &[Content]) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents,
            generation_config: &self.config,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).to_string(),
            });
        }
        debug!("Gemini answered {} bytes", bytes.len());
        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)
            .map_err(|err| GenerationError::UnexpectedResponse(err.to_string()))?;
        extract_text(parsed)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.start_chat(Vec::new()).send_message(prompt).await
    }
}

/// A conversation; each reply is appended to the history.
#[derive(Debug)]
pub struct ChatSession<'a> {
    client: &'a GeminiClient,
    history: Vec<Content>,
}

impl ChatSession<'_> {
    /// Sends a user turn and returns the model's text.
    pub async fn send_message(&mut self, prompt: &str) -> Result<String, GenerationError> {
        let mut contents = self.history.clone();
        contents.push(Content::user(prompt));
        let reply = self.client.generate_content(&contents).await?;
        contents.push(Content::model(&reply));
        self.history = contents;
        Ok(reply)
    }

    /// Turns exchanged so far.
    pub fn history(&self) -> &[Content] {
        &self.history
    }
}

fn generate_content_url(api_base: &Url, model: &str) -> Result<Url, GenerationError> {
    let model = model.trim();
    if model.is_empty() || model.contains('/') {
        return Err(GenerationError::Config(format!("bad model name: {model:?}")));
    }
    api_base
        .join(&format!("v1beta/models/{model}:generateContent"))
        .map_err(|err| GenerationError::Config(err.to_string()))
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(GenerationError::Blocked(reason));
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        GenerationError::UnexpectedResponse("no candidates in response".to_string())
    })?;

    if let Some(reason) = candidate.finish_reason.as_deref()
        && matches!(
            reason,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII"
        )
    {
        return Err(GenerationError::Blocked(reason.to_string()));
    }

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.is_empty() {
        return Err(GenerationError::UnexpectedResponse(
            "candidate had no text".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("parse response")
    }

    fn settings(api_base: &str) -> GeminiSettings {
        GeminiSettings {
            api_key: "test-key".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_base: Url::parse(api_base).expect("api base"),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn request_carries_fixed_generation_config() {
        let contents = vec![Content::user("hello")];
        let config = GenerationConfig::default();
        let body = serde_json::to_value(GenerateContentRequest {
            contents: &contents,
            generation_config: &config,
        })
        .expect("serialize");

        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {
                    "temperature": 1.0,
                    "topP": 0.95,
                    "topK": 64,
                    "maxOutputTokens": 8192,
                    "responseMimeType": "text/plain"
                }
            })
        );
    }

    #[test]
    fn endpoint_targets_model() {
        let client = GeminiClient::new(&settings(DEFAULT_API_BASE)).expect("client");
        assert_eq!(
            client.endpoint().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn rejects_empty_key_and_bad_model() {
        let mut bad_key = settings(DEFAULT_API_BASE);
        bad_key.api_key = "  ".to_string();
        assert!(matches!(
            GeminiClient::new(&bad_key),
            Err(GenerationError::Config(_))
        ));

        let mut bad_model = settings(DEFAULT_API_BASE);
        bad_model.model = "../oops".to_string();
        assert!(matches!(
            GeminiClient::new(&bad_model),
            Err(GenerationError::Config(_))
        ));
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let response = parse(json!({
            "candidates": [
                {
                    "content": {"role": "model", "parts": [{"text": "Happy "}, {"text": "Onam!"}]},
                    "finishReason": "STOP"
                },
                {
                    "content": {"role": "model", "parts": [{"text": "ignored"}]}
                }
            ]
        }));
        assert_eq!(extract_text(response).expect("text"), "Happy Onam!");
    }

    #[test]
    fn blocked_prompt_is_reported() {
        let response = parse(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }));
        assert!(matches!(
            extract_text(response),
            Err(GenerationError::Blocked(reason)) if reason == "SAFETY"
        ));
    }

    #[test]
    fn safety_finish_reason_is_reported() {
        let response = parse(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }));
        assert!(matches!(
            extract_text(response),
            Err(GenerationError::Blocked(_))
        ));
    }

    #[test]
    fn missing_candidates_is_unexpected() {
        assert!(matches!(
            extract_text(parse(json!({}))),
            Err(GenerationError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            extract_text(parse(json!({"candidates": [{"finishReason": "STOP"}]}))),
            Err(GenerationError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn chat_starts_with_given_history() {
        let client = GeminiClient::new(&settings(DEFAULT_API_BASE)).expect("client");
        let chat = client.start_chat(vec![Content::user("hi"), Content::model("hello")]);
        assert_eq!(chat.history().len(), 2);
        assert!(client.start_chat(Vec::new()).history().is_empty());
    }

    async fn spawn_fake_gemini(status: u16, reply: serde_json::Value) -> Url {
        use axum::Json;
        use axum::http::{HeaderMap, StatusCode};

        let handler = move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
            let reply = reply.clone();
            async move {
                assert_eq!(
                    headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()),
                    Some("test-key")
                );
                assert_eq!(body["generationConfig"]["topK"], 64);
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
                (status, Json(reply))
            }
        };
        let app = axum::Router::new().route(
            "/v1beta/models/{action}",
            axum::routing::post(handler),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake gemini");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Url::parse(&format!("http://{addr}/")).expect("fake url")
    }

    #[tokio::test]
    async fn send_message_round_trips_over_http() {
        let base = spawn_fake_gemini(
            200,
            json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "Happy Holi!"}]}}]}),
        )
        .await;
        let client = GeminiClient::new(&settings(base.as_str())).expect("client");
        let mut chat = client.start_chat(Vec::new());
        let reply = chat.send_message("a prompt").await.expect("reply");

        assert_eq!(reply, "Happy Holi!");
        assert_eq!(
            chat.history(),
            &[Content::user("a prompt"), Content::model("Happy Holi!")]
        );
    }

    #[tokio::test]
    async fn api_errors_keep_status_and_body() {
        let base = spawn_fake_gemini(429, json!({"error": {"message": "quota"}})).await;
        let client = GeminiClient::new(&settings(base.as_str())).expect("client");
        match client.generate("a prompt").await {
            Err(GenerationError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert!(message.contains("quota"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn error_display() {
        let err = GenerationError::Api {
            status: 429,
            message: "quota".into(),
        };
        assert_eq!(err.to_string(), "Gemini API error 429: quota");
    }
}
