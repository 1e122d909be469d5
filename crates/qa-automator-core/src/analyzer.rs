//! Report aggregation.
//!
//! Runs one backend over an ordered criteria list and renders test-case
//! update suggestions from the resulting [`QaReport`].

use std::time::Instant;
use uuid::Uuid;

use crate::backend::{Backend, EvaluationBackend};
use crate::domain::{AcceptanceCriterion, QaReport, Result, TestArtifact};
use crate::obs::{self, AnalysisSpan};

/// Header line introducing the generated checks in an updated test case.
pub const AUTO_UPDATE_HEADER: &str = "# Auto-updated checks from multimodal QA analysis";

/// Evaluates criteria sequentially with a single backend.
#[derive(Debug, Clone)]
pub struct QaAnalyzer<B = Backend> {
    backend: B,
}

impl<B: EvaluationBackend> QaAnalyzer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Evaluate every criterion, in order, against `artifact`.
    ///
    /// The first backend error aborts the run; no partial report is returned.
    pub fn analyze(
        &self,
        criteria: &[AcceptanceCriterion],
        artifact: &TestArtifact,
    ) -> Result<QaReport> {
        let run_id = Uuid::new_v4().to_string();
        let _span = AnalysisSpan::enter(&run_id, self.backend.name());
        let started = Instant::now();
        obs::emit_analysis_started(self.backend.name(), criteria.len());

        let mut results = Vec::with_capacity(criteria.len());
        for criterion in criteria {
            let result = self.backend.evaluate(criterion, artifact)?;
            obs::emit_criterion_evaluated(&criterion.id, result.status.as_str(), result.confidence);
            results.push(result);
        }

        let report = QaReport::new(results);
        obs::emit_analysis_finished(
            report.passed(),
            report.failed(),
            started.elapsed().as_millis() as u64,
        );
        Ok(report)
    }

    /// See [`update_test_cases`].
    pub fn update_test_cases(&self, report: &QaReport, test_case_text: &str) -> String {
        update_test_cases(report, test_case_text)
    }
}

/// Append one suggested check per result to an existing test case.
///
/// The original text is kept (minus trailing whitespace), followed by a blank
/// line, [`AUTO_UPDATE_HEADER`] and lines of the form
/// `- [PASS] AC-1: <recommended update>`.
pub fn update_test_cases(report: &QaReport, test_case_text: &str) -> String {
    let mut out = String::from(test_case_text.trim_end());
    out.push_str("\n\n");
    out.push_str(AUTO_UPDATE_HEADER);
    for result in &report.results {
        out.push_str(&format!(
            "\n- [{}] {}: {}",
            result.status.as_upper(),
            result.criterion.id,
            result.recommended_test_update
        ));
    }
    out.push('\n');
    out
}
