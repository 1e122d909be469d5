//! QA Automator Core Library
//!
//! Judges captured test evidence (observed text, DOM snapshot, optional
//! screenshot) against natural-language acceptance criteria and suggests
//! test-case updates.

pub mod analyzer;
pub mod backend;
pub mod domain;
pub mod loader;
pub mod obs;
pub mod reporting;
pub mod telemetry;

pub use analyzer::{update_test_cases, QaAnalyzer, AUTO_UPDATE_HEADER};

pub use backend::{
    build_prompt, parse_model_output, unwrap_generate_response, Backend, DeterministicBackend,
    EvaluationBackend, ModelVerdict, RemoteInferenceBackend, RemoteInferenceConfig,
    DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_PASS_THRESHOLD, DEFAULT_TIMEOUT, DOM_SNAPSHOT_LIMIT,
    GENERATE_PATH, MALFORMED_EXCERPT_LIMIT, SCREENSHOT_B64_LIMIT,
};

pub use domain::{
    AcceptanceCriterion, CriterionResult, QaError, QaReport, ReportArtifact, ReportEntry, Result,
    Status, TestArtifact,
};

pub use loader::{load_artifact, load_criteria};
pub use obs::AnalysisSpan;
pub use reporting::{render_report_json, write_report_json, write_updated_test_case};
pub use telemetry::init_tracing;

/// QA Automator version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
