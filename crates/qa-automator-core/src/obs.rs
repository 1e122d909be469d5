//! Structured observability hooks for analysis runs.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `AnalysisSpan` RAII guard
//! - Emission functions for the analysis lifecycle and backend trouble
//!
//! Lifecycle events are emitted at `info!`, per-criterion verdicts at
//! `debug!`, backend trouble at `warn!`.

use tracing::{debug, info, warn};

/// RAII guard that enters a run-scoped tracing span for the duration of an
/// analysis.
///
/// # Example
///
/// ```
/// use qa_automator_core::AnalysisSpan;
///
/// let _span = AnalysisSpan::enter("4f1c...", "deterministic");
/// // every event below carries run_id = "4f1c..." and backend = "deterministic"
/// ```
pub struct AnalysisSpan {
    _span: tracing::span::EnteredSpan,
}

impl AnalysisSpan {
    /// Create and enter a span tagged with the run_id and backend name.
    pub fn enter(run_id: &str, backend: &str) -> Self {
        let span = tracing::info_span!("qa.analysis", run_id = %run_id, backend = %backend);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: analysis started.
pub fn emit_analysis_started(backend: &str, criteria: usize) {
    info!(event = "analysis.started", backend = %backend, criteria = criteria);
}

/// Emit event: one criterion evaluated.
pub fn emit_criterion_evaluated(criterion_id: &str, status: &str, confidence: f64) {
    debug!(
        event = "criterion.evaluated",
        criterion_id = %criterion_id,
        status = %status,
        confidence = confidence,
    );
}

/// Emit event: analysis finished with pass/fail counts.
pub fn emit_analysis_finished(passed: usize, failed: usize, duration_ms: u64) {
    info!(
        event = "analysis.finished",
        passed = passed,
        failed = failed,
        duration_ms = duration_ms,
    );
}

/// Emit event: inference service could not be reached.
pub fn emit_backend_unreachable(host: &str, reason: &str) {
    warn!(event = "backend.unreachable", host = %host, reason = %reason);
}

/// Emit event: model output was not a JSON object and was degraded to a failure.
pub fn emit_model_output_malformed(criterion_id: &str, excerpt: &str) {
    warn!(
        event = "model_output.malformed",
        criterion_id = %criterion_id,
        excerpt = %excerpt,
    );
}
