//! Evaluation backends.
//!
//! A backend turns one `(criterion, artifact)` pair into one
//! [`CriterionResult`]. Two strategies exist and the set is closed:
//!
//! - [`DeterministicBackend`]: offline keyword-overlap scoring
//! - [`RemoteInferenceBackend`]: LLM verdict from an Ollama-style endpoint

pub mod deterministic;
pub mod remote;

pub use deterministic::{DeterministicBackend, DEFAULT_PASS_THRESHOLD};
pub use remote::{
    build_prompt, parse_model_output, unwrap_generate_response, ModelVerdict,
    RemoteInferenceBackend, RemoteInferenceConfig, DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_TIMEOUT,
    DOM_SNAPSHOT_LIMIT, GENERATE_PATH, MALFORMED_EXCERPT_LIMIT, SCREENSHOT_B64_LIMIT,
};

use crate::domain::{AcceptanceCriterion, CriterionResult, Result, TestArtifact};

/// Strategy for judging whether an artifact satisfies a criterion.
pub trait EvaluationBackend {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Evaluate a single criterion. Errors are reserved for failures that
    /// must abort the whole analysis.
    fn evaluate(
        &self,
        criterion: &AcceptanceCriterion,
        artifact: &TestArtifact,
    ) -> Result<CriterionResult>;
}

/// The configured backend.
#[derive(Debug, Clone)]
pub enum Backend {
    Deterministic(DeterministicBackend),
    RemoteInference(RemoteInferenceBackend),
}

impl Backend {
    pub fn deterministic() -> Self {
        Self::Deterministic(DeterministicBackend::default())
    }

    pub fn remote(config: RemoteInferenceConfig) -> Result<Self> {
        Ok(Self::RemoteInference(RemoteInferenceBackend::new(config)?))
    }
}

impl From<DeterministicBackend> for Backend {
    fn from(backend: DeterministicBackend) -> Self {
        Self::Deterministic(backend)
    }
}

impl From<RemoteInferenceBackend> for Backend {
    fn from(backend: RemoteInferenceBackend) -> Self {
        Self::RemoteInference(backend)
    }
}

impl EvaluationBackend for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::Deterministic(b) => b.name(),
            Self::RemoteInference(b) => b.name(),
        }
    }

    fn evaluate(
        &self,
        criterion: &AcceptanceCriterion,
        artifact: &TestArtifact,
    ) -> Result<CriterionResult> {
        match self {
            Self::Deterministic(b) => b.evaluate(criterion, artifact),
            Self::RemoteInference(b) => b.evaluate(criterion, artifact),
        }
    }
}
