//! AI Client — the single point of entry for all Gemini API calls in Horizon.
//!
//! ARCHITECTURAL RULE: No other module may call the Generative Language
//! API directly. All generation MUST go through this module.
//!
//! The transport is a trait object so handlers and tests can swap the
//! HTTP backend for a scripted one. The model is discovered once at
//! startup (`connect`) or pinned explicitly (`new`); it is never
//! re-selected for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;
pub mod schemas;
#[cfg(test)]
pub mod testing;

use schemas::AiPayload;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Candidate models in preference order. The first one present in the
/// credential's model list wins; otherwise the first listed model is used.
const PREFERRED_MODELS: &[&str] = &[
    "models/gemini-2.5-flash",
    "models/gemini-flash-latest",
    "models/gemini-pro-latest",
];

const DEFAULT_RETRIES: u32 = 1;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AI response failed validation: {issues:?}")]
    Validation { issues: Vec<String> },

    #[error("Credential has no available models")]
    NoModels,

    #[error("Generation failed after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Delay progression between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed,
    /// Doubling delay: base, 2×base, 4×base, ...
    #[allow(dead_code)] // every current caller uses the fixed default
    Exponential,
}

/// Bounded-retry policy for a single generation call.
///
/// `retries` counts ADDITIONAL attempts: `retries = 1` means at most
/// 2 attempts total. Transport, parse, and validation failures all
/// consume the same budget.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn retries(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt` (1-based; attempt 0 never waits).
    fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => self.delay * (1 << (attempt - 1)),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
            backoff: Backoff::Fixed,
        }
    }
}

/// Transport seam between the client and the Generative Language API.
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    /// Lists the model names available to the credential.
    async fn list_models(&self) -> Result<Vec<String>, AiError>;

    /// Runs one generation call and returns the raw response text.
    /// A well-formed response with no text content yields an empty
    /// string; callers must handle empty output.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, AiError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini HTTP backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate's first part, or empty when the
    /// response carries no text.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

/// Production transport over the Generative Language REST API.
pub struct GeminiBackend {
    http: Client,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl GenerateBackend for GeminiBackend {
    async fn list_models(&self) -> Result<Vec<String>, AiError> {
        let url = format!("{GEMINI_API_URL}/models?key={}", self.api_key);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let listed: ListModelsResponse = response.json().await?;
        Ok(listed.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, AiError> {
        let url = format!("{GEMINI_API_URL}/{model}:generateContent?key={}", self.api_key);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self.http.post(url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {status}: {body}");
            return Err(AiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        Ok(parsed.into_text())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single AI client used by all services in Horizon. Wraps a
/// generation backend with model selection, retry, fence stripping, and
/// schema validation.
#[derive(Clone)]
pub struct AiClient {
    backend: Arc<dyn GenerateBackend>,
    model: String,
}

impl AiClient {
    /// Builds a client with an explicitly pinned model, skipping model
    /// discovery.
    pub fn new(backend: Arc<dyn GenerateBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Lists the credential's models once and selects the preferred one.
    /// The selection holds for the process lifetime.
    pub async fn connect(backend: Arc<dyn GenerateBackend>) -> Result<Self, AiError> {
        let models = backend.list_models().await?;
        let model = select_model(&models).ok_or(AiError::NoModels)?.to_string();
        info!("Selected model {model} ({} available)", models.len());
        Ok(Self { backend, model })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generates raw text, trimmed. Retries up to `policy.retries`
    /// additional times; the last error surfaces once the budget is
    /// exhausted.
    pub async fn generate_text(&self, prompt: &str, policy: &RetryPolicy) -> Result<String, AiError> {
        let mut last_error: Option<AiError> = None;

        for attempt in 0..=policy.retries {
            if attempt > 0 {
                let delay = policy.delay_for(attempt);
                warn!(
                    "Generation attempt {attempt} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.backend.generate(&self.model, prompt).await {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or(AiError::Exhausted {
            attempts: policy.retries + 1,
        }))
    }

    /// Generates JSON conforming to `T`: strips code fences, parses, and
    /// validates. Parse and validation failures consume the same retry
    /// budget as transport errors. Never returns partially valid data.
    pub async fn generate_json<T: AiPayload>(
        &self,
        prompt: &str,
        policy: &RetryPolicy,
    ) -> Result<T, AiError> {
        let mut last_error: Option<AiError> = None;

        for attempt in 0..=policy.retries {
            if attempt > 0 {
                let delay = policy.delay_for(attempt);
                warn!(
                    "JSON generation attempt {attempt} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.generate_json_once::<T>(prompt).await {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    debug!("JSON generation attempt failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(AiError::Exhausted {
            attempts: policy.retries + 1,
        }))
    }

    async fn generate_json_once<T: AiPayload>(&self, prompt: &str) -> Result<T, AiError> {
        let raw = self.backend.generate(&self.model, prompt).await?;
        let cleaned = strip_code_fences(&raw);
        let payload: T = serde_json::from_str(&cleaned)?;
        payload
            .validate()
            .map_err(|issues| AiError::Validation { issues })?;
        Ok(payload)
    }
}

/// Picks the first preferred model present in `models`, falling back to
/// the first available model.
fn select_model(models: &[String]) -> Option<&str> {
    for candidate in PREFERRED_MODELS {
        if let Some(found) = models.iter().find(|m| m.as_str() == *candidate) {
            return Some(found);
        }
    }
    models.first().map(String::as_str)
}

/// Strips Markdown code fences from model output: every fence opening
/// (triple backtick with an optional `json` tag and newline) and every
/// bare closing fence is removed, then surrounding whitespace trimmed.
/// Idempotent, and the identity on fence-free input.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        if let Some(tag) = rest.get(..4) {
            if tag.eq_ignore_ascii_case("json") {
                rest = &rest[4..];
            }
        }
        if let Some(after_newline) = rest.strip_prefix('\n') {
            rest = after_newline;
        }
    }

    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::Ordering;

    // ── fence stripping ─────────────────────────────────────────────────

    #[test]
    fn test_strip_code_fences_with_json_tag() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_strip_code_fences_is_identity_on_fence_free_input() {
        assert_eq!(strip_code_fences("{}"), "{}");
    }

    #[test]
    fn test_strip_code_fences_is_idempotent() {
        let once = strip_code_fences("```json\n{\"a\": 1}\n```");
        assert_eq!(strip_code_fences(&once), once);
    }

    #[test]
    fn test_strip_code_fences_preserves_trailing_text() {
        assert_eq!(
            strip_code_fences("```json\n{}\n```\nSee above."),
            "{}\nSee above."
        );
    }

    #[test]
    fn test_strip_code_fences_uppercase_tag() {
        assert_eq!(strip_code_fences("```JSON\n{}\n```"), "{}");
    }

    // ── model selection ─────────────────────────────────────────────────

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_model_prefers_candidate_order() {
        let models = names(&[
            "models/gemini-pro-latest",
            "models/gemini-2.5-flash",
            "models/other",
        ]);
        assert_eq!(select_model(&models), Some("models/gemini-2.5-flash"));
    }

    #[test]
    fn test_select_model_falls_back_to_first_available() {
        let models = names(&["models/unknown-a", "models/unknown-b"]);
        assert_eq!(select_model(&models), Some("models/unknown-a"));
    }

    #[test]
    fn test_select_model_empty_list_is_none() {
        assert_eq!(select_model(&[]), None);
    }

    // ── retry policy ────────────────────────────────────────────────────

    #[test]
    fn test_fixed_backoff_delay_is_constant() {
        let policy = RetryPolicy {
            retries: 3,
            delay: Duration::from_millis(500),
            backoff: Backoff::Fixed,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
    }

    #[test]
    fn test_exponential_backoff_doubles() {
        let policy = RetryPolicy {
            retries: 3,
            delay: Duration::from_millis(100),
            backoff: Backoff::Exponential,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    // ── client behavior over a scripted backend ─────────────────────────

    use super::testing::ScriptedBackend;

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            delay: Duration::from_millis(1),
            backoff: Backoff::Fixed,
        }
    }

    #[derive(Debug, Deserialize)]
    struct Probe {
        ok: bool,
    }

    impl AiPayload for Probe {
        fn validate(&self) -> Result<(), Vec<String>> {
            if self.ok {
                Ok(())
            } else {
                Err(vec!["ok must be true".to_string()])
            }
        }
    }

    #[tokio::test]
    async fn test_generate_text_trims_output() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok("  hello  \n".to_string())]));
        let client = AiClient::new(backend, "models/test");
        let text = client
            .generate_text("hi", &fast_policy(0))
            .await
            .expect("generation succeeds");
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_generate_text_retries_transport_error_then_succeeds() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(AiError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Ok("recovered".to_string()),
        ]));
        let client = AiClient::new(backend.clone(), "models/test");
        let text = client
            .generate_text("hi", &fast_policy(1))
            .await
            .expect("second attempt succeeds");
        assert_eq!(text, "recovered");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_generate_text_surfaces_last_error_when_exhausted() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(AiError::Api {
                status: 500,
                message: "first".to_string(),
            }),
            Err(AiError::Api {
                status: 503,
                message: "last".to_string(),
            }),
        ]));
        let client = AiClient::new(backend, "models/test");
        let err = client
            .generate_text("hi", &fast_policy(1))
            .await
            .expect_err("both attempts fail");
        match err {
            AiError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "last");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_json_strips_fences_and_parses() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(
            "```json\n{\"ok\": true}\n```".to_string()
        )]));
        let client = AiClient::new(backend, "models/test");
        let probe: Probe = client
            .generate_json("hi", &fast_policy(0))
            .await
            .expect("parses");
        assert!(probe.ok);
    }

    #[tokio::test]
    async fn test_generate_json_schema_rejection_makes_exactly_two_attempts() {
        let backend = Arc::new(ScriptedBackend::always("{\"ok\": false}"));
        let client = AiClient::new(backend.clone(), "models/test");
        let err = client
            .generate_json::<Probe>("hi", &fast_policy(1))
            .await
            .expect_err("validation always fails");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        match err {
            AiError::Validation { issues } => {
                assert_eq!(issues, vec!["ok must be true".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_json_parse_failure_consumes_retry_budget() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok("not json at all".to_string()),
            Ok("{\"ok\": true}".to_string()),
        ]));
        let client = AiClient::new(backend.clone(), "models/test");
        let probe: Probe = client
            .generate_json("hi", &fast_policy(1))
            .await
            .expect("second attempt parses");
        assert!(probe.ok);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_connect_selects_preferred_model() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let client = AiClient::connect(backend).await.expect("connects");
        assert_eq!(client.model(), "models/gemini-2.5-flash");
    }
}
