//! LLM-assisted evaluation through an Ollama-compatible `/api/generate` endpoint.
//!
//! Two failure tiers:
//! - transport problems (unreachable host, timeout, HTTP error status) abort
//!   with a [`QaError`]
//! - output the model garbles is folded into a failing result so every
//!   criterion still gets exactly one verdict

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::EvaluationBackend;
use crate::domain::{AcceptanceCriterion, CriterionResult, QaError, Result, Status, TestArtifact};
use crate::obs;

/// Characters of DOM snapshot embedded in the prompt.
pub const DOM_SNAPSHOT_LIMIT: usize = 3000;

/// Characters of base64-encoded screenshot embedded in the prompt.
pub const SCREENSHOT_B64_LIMIT: usize = 1200;

/// Characters of unparseable model output quoted in the diagnostic reasoning.
pub const MALFORMED_EXCERPT_LIMIT: usize = 200;

/// Path of the generate endpoint, appended to the configured host.
pub const GENERATE_PATH: &str = "/api/generate";

pub const DEFAULT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const NO_SCREENSHOT: &str = "No screenshot provided.";
const NO_REASONING: &str = "No reasoning returned.";
const NO_UPDATE: &str = "No update recommendation returned.";
const MALFORMED_UPDATE: &str =
    "Retry with a stricter prompt or fall back to the deterministic (mock) backend.";

const INSTRUCTIONS: &str = "You are a QA analyst. Evaluate if the artifact satisfies the acceptance criterion. \
Return ONLY JSON with keys: status(pass/fail), confidence(0-1), reasoning, recommended_test_update.";

/// Inference endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInferenceConfig {
    /// Model identifier understood by the service.
    pub model: String,
    /// Base URL of the service, without trailing slash.
    pub host: String,
    /// Upper bound for one request, connect through body.
    pub timeout: Duration,
}

impl Default for RemoteInferenceConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RemoteInferenceConfig {
    /// Defaults overlaid with `QA_AUTOMATOR_MODEL`, `QA_AUTOMATOR_HOST` and
    /// `QA_AUTOMATOR_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("QA_AUTOMATOR_MODEL") {
            config = config.with_model(model);
        }
        if let Ok(host) = std::env::var("QA_AUTOMATOR_HOST") {
            config = config.with_host(host);
        }
        if let Ok(raw) = std::env::var("QA_AUTOMATOR_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => config = config.with_timeout(Duration::from_secs(secs)),
                Err(_) => warn!(value = %raw, "ignoring invalid QA_AUTOMATOR_TIMEOUT_SECS"),
            }
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the generate endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}{}", self.host, GENERATE_PATH)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

/// Backend that asks a language model for the verdict.
#[derive(Debug, Clone)]
pub struct RemoteInferenceBackend {
    config: RemoteInferenceConfig,
    http_client: reqwest::blocking::Client,
}

impl RemoteInferenceBackend {
    pub fn new(config: RemoteInferenceConfig) -> Result<Self> {
        let url = reqwest::Url::parse(&config.host).map_err(|e| {
            QaError::InvalidConfig(format!("inference host {:?} is not a URL: {}", config.host, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(QaError::InvalidConfig(format!(
                "inference host {:?} must use http or https",
                config.host
            )));
        }

        let http_client = reqwest::blocking::Client::builder()
            .user_agent(concat!("qa-automator/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| QaError::InvalidConfig(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &RemoteInferenceConfig {
        &self.config
    }

    /// POST the prompt and return the raw response body.
    fn post_generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            format: "json",
        };

        let response = self
            .http_client
            .post(self.config.generate_url())
            .json(&request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QaError::BackendStatus {
                host: self.config.host.clone(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, err: reqwest::Error) -> QaError {
        if err.is_builder() {
            return QaError::InvalidConfig(format!("bad inference request: {}", err));
        }
        let reason = if err.is_timeout() {
            format!("timed out after {:?}", self.config.timeout)
        } else {
            err.to_string()
        };
        obs::emit_backend_unreachable(&self.config.host, &reason);
        QaError::BackendUnreachable {
            host: self.config.host.clone(),
            reason,
        }
    }
}

impl EvaluationBackend for RemoteInferenceBackend {
    fn name(&self) -> &'static str {
        "remote-inference"
    }

    fn evaluate(
        &self,
        criterion: &AcceptanceCriterion,
        artifact: &TestArtifact,
    ) -> Result<CriterionResult> {
        let prompt = build_prompt(criterion, artifact);
        debug!(
            criterion_id = %criterion.id,
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            "requesting model verdict"
        );

        let body = self.post_generate(&prompt)?;
        let text = unwrap_generate_response(&body);
        let verdict = match try_parse_verdict(&text) {
            Some(verdict) => verdict,
            None => {
                let head = excerpt(&text, MALFORMED_EXCERPT_LIMIT);
                obs::emit_model_output_malformed(&criterion.id, &head);
                ModelVerdict::malformed(&text)
            }
        };

        Ok(verdict.into_result(criterion))
    }
}

/// Verdict fields extracted from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    pub status: Status,
    pub confidence: f64,
    pub reasoning: String,
    pub recommended_test_update: String,
}

impl ModelVerdict {
    /// Conservative failure used when the model output is not a JSON object.
    pub fn malformed(text: &str) -> Self {
        Self {
            status: Status::Fail,
            confidence: 0.0,
            reasoning: format!(
                "Model response was not valid JSON: {}",
                excerpt(text, MALFORMED_EXCERPT_LIMIT)
            ),
            recommended_test_update: MALFORMED_UPDATE.to_string(),
        }
    }

    fn from_object(fields: &Map<String, Value>) -> Self {
        Self {
            status: fields
                .get("status")
                .and_then(Value::as_str)
                .map(Status::from_label)
                .unwrap_or(Status::Fail),
            confidence: fields.get("confidence").map(coerce_confidence).unwrap_or(0.0),
            reasoning: text_field(fields, "reasoning").unwrap_or_else(|| NO_REASONING.to_string()),
            recommended_test_update: text_field(fields, "recommended_test_update")
                .unwrap_or_else(|| NO_UPDATE.to_string()),
        }
    }

    pub fn into_result(self, criterion: &AcceptanceCriterion) -> CriterionResult {
        CriterionResult {
            criterion: criterion.clone(),
            status: self.status,
            confidence: self.confidence,
            reasoning: self.reasoning,
            recommended_test_update: self.recommended_test_update,
        }
    }
}

/// Build the single instruction string sent to the model.
pub fn build_prompt(criterion: &AcceptanceCriterion, artifact: &TestArtifact) -> String {
    let (summary, image_b64) = screenshot_signal(artifact);

    format!(
        "{}\n\n\
         Criterion: {}\n\
         Observed text: {}\n\
         DOM snapshot: {}\n\
         Image summary: {}\n\
         Image(base64-prefix): {}\n",
        INSTRUCTIONS,
        criterion.statement,
        artifact.observed_text,
        excerpt(&artifact.dom_snapshot, DOM_SNAPSHOT_LIMIT),
        summary,
        image_b64,
    )
}

/// Presence/size line plus a truncated base64 prefix of the screenshot.
/// The prefix is a weak hint only; it is not guaranteed to decode.
fn screenshot_signal(artifact: &TestArtifact) -> (String, String) {
    let Some(path) = artifact.existing_screenshot() else {
        return (NO_SCREENSHOT.to_string(), String::new());
    };

    match std::fs::read(path) {
        Ok(bytes) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let summary = format!("Screenshot present: {} ({} bytes)", name, bytes.len());
            let mut encoded = BASE64.encode(&bytes);
            encoded.truncate(SCREENSHOT_B64_LIMIT);
            (summary, encoded)
        }
        Err(e) => {
            warn!(path = ?path, error = %e, "screenshot unreadable, treating as absent");
            (NO_SCREENSHOT.to_string(), String::new())
        }
    }
}

/// Extract the model's text from a `/api/generate` body.
///
/// A missing `response` yields `"{}"`; a body that is not JSON is passed
/// through unchanged so the tolerant parser can flag it.
pub fn unwrap_generate_response(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(envelope)) => match envelope.get("response") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => "{}".to_string(),
            Some(other) => other.to_string(),
        },
        Ok(_) | Err(_) => body.to_string(),
    }
}

/// Parse model output, degrading to a failing verdict when it is not a JSON
/// object.
pub fn parse_model_output(text: &str) -> ModelVerdict {
    try_parse_verdict(text).unwrap_or_else(|| ModelVerdict::malformed(text))
}

fn try_parse_verdict(text: &str) -> Option<ModelVerdict> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => Some(ModelVerdict::from_object(&fields)),
        _ => None,
    }
}

fn coerce_confidence(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// First `limit` characters of `text`.
fn excerpt(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
