//! Gemini `generateContent` over REST.

use super::retry::{
    RetryConfig, RetryDecision, execute_with_retry, is_retryable_rpc_status,
    is_retryable_status_code, parse_retry_delay,
};
use crate::telemetry;
use async_trait::async_trait;
use brand_core::{BrandError, Llm, LlmRequest, LlmResponse, Result, UsageMetadata};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::Instrument;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    content: Option<WireContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    usage_metadata: Option<WireUsage>,
}

/// `{"error": {"code", "message", "status", "details"}}` as returned on failure.
#[derive(Debug, Deserialize)]
struct WireErrorEnvelope {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<WireErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireErrorDetail {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(default)]
    retry_delay: Option<String>,
}

// ============================================================================
// Failures
// ============================================================================

/// One failed `generateContent` attempt, kept structured until the retry
/// policy has seen it.
#[derive(Debug, Clone, PartialEq)]
pub enum GeminiFailure {
    /// The API answered with a non-success status.
    Api {
        code: u16,
        /// Google RPC status such as `RESOURCE_EXHAUSTED`.
        status: Option<String>,
        message: String,
        /// From a `google.rpc.RetryInfo` detail.
        retry_after: Option<Duration>,
    },
    /// The request never got a response.
    Transport { message: String, transient: bool },
    /// A success status with a body that is not a `generateContent` response.
    Decode(String),
}

impl GeminiFailure {
    /// Builds an `Api` failure from the status code and raw error body.
    pub fn from_response(code: u16, body: &str) -> Self {
        match serde_json::from_str::<WireErrorEnvelope>(body) {
            Ok(envelope) => {
                let retry_after = envelope
                    .error
                    .details
                    .iter()
                    .filter(|d| d.kind.ends_with("google.rpc.RetryInfo"))
                    .find_map(|d| d.retry_delay.as_deref().and_then(parse_retry_delay));
                Self::Api {
                    code,
                    status: envelope.error.status,
                    message: envelope.error.message,
                    retry_after,
                }
            }
            Err(_) => Self::Api {
                code,
                status: None,
                message: body.trim().to_string(),
                retry_after: None,
            },
        }
    }

    pub fn retry_decision(&self) -> RetryDecision {
        match self {
            Self::Api { code, status, retry_after, .. } => {
                let transient = is_retryable_status_code(*code)
                    || status.as_deref().is_some_and(is_retryable_rpc_status);
                match (transient, retry_after) {
                    (false, _) => RetryDecision::GiveUp,
                    (true, Some(wait)) => RetryDecision::RetryAfter(*wait),
                    (true, None) => RetryDecision::Retry,
                }
            }
            Self::Transport { transient: true, .. } => RetryDecision::Retry,
            Self::Transport { .. } | Self::Decode(_) => RetryDecision::GiveUp,
        }
    }
}

impl fmt::Display for GeminiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api { code, status: Some(status), message, .. } => {
                write!(f, "Gemini API error {} {}: {}", code, status, message)
            }
            Self::Api { code, status: None, message, .. } => {
                write!(f, "Gemini API error {}: {}", code, message)
            }
            Self::Transport { message, .. } => write!(f, "Gemini request failed: {}", message),
            Self::Decode(message) => write!(f, "Failed to decode Gemini response: {}", message),
        }
    }
}

impl From<GeminiFailure> for BrandError {
    fn from(failure: GeminiFailure) -> Self {
        BrandError::model(failure.to_string())
    }
}

// ============================================================================
// Client
// ============================================================================

/// Text-only Gemini client.
///
/// ```rust,ignore
/// let model = GeminiClient::new(api_key, "gemini-2.5-flash")?;
/// let reply = model.generate_text(LlmRequest::new("Name a coffee shop").json()).await?;
/// ```
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    default_temperature: f32,
    default_max_tokens: u32,
    retry_config: RetryConfig,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| BrandError::model(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
            default_temperature: 0.9,
            default_max_tokens: 8192,
            retry_config: RetryConfig::default(),
        })
    }

    pub fn from_config(config: &crate::config::ModelConfig) -> Result<Self> {
        let key = config.require_api_key()?;
        let mut client = Self::new(key, config.model_name.clone())?;
        client.default_temperature = config.temperature;
        client.default_max_tokens = u32::try_from(config.max_tokens).unwrap_or(u32::MAX);
        Ok(client)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    fn api_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }

    fn build_request(&self, request: &LlmRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![WireContent {
                role: Some("user".to_string()),
                parts: vec![TextPart { text: request.prompt.clone() }],
            }],
            system_instruction: request.system_instruction.as_ref().map(|text| WireContent {
                role: None,
                parts: vec![TextPart { text: text.clone() }],
            }),
            generation_config: GenerationConfig {
                temperature: Some(request.temperature.unwrap_or(self.default_temperature)),
                max_output_tokens: Some(
                    request.max_output_tokens.unwrap_or(self.default_max_tokens),
                ),
                response_mime_type: request.json_output.then(|| "application/json".to_string()),
            },
        }
    }

    async fn send(
        &self,
        body: &GenerateContentRequest,
    ) -> std::result::Result<GenerateContentResponse, GeminiFailure> {
        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GeminiFailure::Transport {
                message: e.to_string(),
                transient: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GeminiFailure::from_response(status.as_u16(), &text));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GeminiFailure::Decode(e.to_string()))
    }
}

fn convert_response(response: GenerateContentResponse) -> Result<LlmResponse> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| BrandError::model("Gemini returned no candidates"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(BrandError::model(format!(
            "Gemini returned an empty candidate (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(LlmResponse {
        text,
        usage: response.usage_metadata.map(|u| UsageMetadata {
            prompt_token_count: u.prompt_token_count,
            candidates_token_count: u.candidates_token_count,
            total_token_count: u.total_token_count,
        }),
    })
}

#[async_trait]
impl Llm for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = self.build_request(&request);
        let timer = telemetry::start_timing("gemini.generate_content");

        let response = execute_with_retry(
            &self.retry_config,
            GeminiFailure::retry_decision,
            || self.send(&body),
        )
        .instrument(telemetry::llm_request_span(&self.model, "generate_content"))
        .await?;

        telemetry::record_llm_latency(timer.elapsed_secs(), &self.model, "generate_content");
        let converted = convert_response(response)?;
        if let Some(usage) = converted.usage {
            telemetry::record_tokens_used(usage.total_token_count);
        }
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const OK_BODY: &str =
        r#"{"candidates": [{"content": {"parts": [{"text": "hello"}]}, "finishReason": "STOP"}]}"#;

    const UNAVAILABLE_BODY: &str =
        r#"{"error": {"code": 503, "message": "overloaded", "status": "UNAVAILABLE"}}"#;

    /// Answers each connection with the next `(status line, body)` pair and
    /// counts the requests it served.
    async fn spawn_api(replies: Vec<(&'static str, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v1beta", listener.local_addr().unwrap());
        let served = Arc::new(AtomicUsize::new(0));
        let counter = served.clone();
        tokio::spawn(async move {
            for (status, body) in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        (base, served)
    }

    /// Reads headers and a `Content-Length` body.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if !name.eq_ignore_ascii_case("content-length") {
                            return None;
                        }
                        value.trim().parse::<usize>().ok()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    fn fast_retries() -> RetryConfig {
        RetryConfig::default()
            .with_max_retries(3)
            .with_initial_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_transient_statuses_are_retried() {
        let (base, served) = spawn_api(vec![
            ("503 Service Unavailable", UNAVAILABLE_BODY),
            ("500 Internal Server Error", "oops"),
            ("200 OK", OK_BODY),
        ])
        .await;
        let client = client().with_base_url(base).with_retry_config(fast_retries());

        let response = client.generate_text(LlmRequest::new("hi")).await.unwrap();

        assert_eq!(response.text, "hello");
        assert_eq!(served.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (base, served) = spawn_api(vec![(
            "400 Bad Request",
            r#"{"error": {"code": 400, "message": "bad field", "status": "INVALID_ARGUMENT"}}"#,
        )])
        .await;
        let client = client().with_base_url(base).with_retry_config(fast_retries());

        let err = client.generate_text(LlmRequest::new("hi")).await.unwrap_err();

        assert!(matches!(&err, BrandError::Model(m) if m.contains("400 INVALID_ARGUMENT")));
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_classification() {
        let throttled = GeminiFailure::from_response(
            429,
            r#"{"error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED",
                "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo",
                             "retryDelay": "12s"}]}}"#,
        );
        assert_eq!(throttled.retry_decision(), RetryDecision::RetryAfter(Duration::from_secs(12)));

        for code in [408, 500, 502, 503, 504] {
            let failure = GeminiFailure::from_response(code, "");
            assert_eq!(failure.retry_decision(), RetryDecision::Retry, "{code}");
        }
        let missing = GeminiFailure::from_response(404, "not found");
        assert_eq!(missing.retry_decision(), RetryDecision::GiveUp);

        let timeout = GeminiFailure::Transport { message: "timed out".into(), transient: true };
        assert_eq!(timeout.retry_decision(), RetryDecision::Retry);
        assert_eq!(GeminiFailure::Decode("eof".into()).retry_decision(), RetryDecision::GiveUp);
    }

    #[test]
    fn test_failure_message() {
        let failure = GeminiFailure::from_response(
            503,
            UNAVAILABLE_BODY,
        );
        let err: BrandError = failure.into();
        assert_eq!(err.to_string(), "Model error: Gemini API error 503 UNAVAILABLE: overloaded");
    }

    fn client() -> GeminiClient {
        GeminiClient::new("test-key", "gemini-2.5-flash").unwrap()
    }

    #[test]
    fn test_api_url() {
        let client = client().with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            client.api_url(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let request = LlmRequest::new("Name my bakery")
            .with_system_instruction("You are a naming expert")
            .with_temperature(0.5)
            .json();
        let body = serde_json::to_value(client().build_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Name my bakery");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are a naming expert");
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_response_conversion() {
        let raw = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let response = convert_response(parsed).unwrap();
        assert_eq!(response.text, "{\"a\":1}");
        assert_eq!(response.usage.unwrap().total_token_count, 15);
    }

    #[test]
    fn test_empty_response_is_error() {
        let parsed: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        let err = convert_response(parsed).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));

        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(convert_response(parsed).is_err());
    }
}
