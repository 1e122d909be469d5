//! Offline keyword-overlap scoring.
//!
//! Crude on purpose: it needs no network, gives the same answer for the same
//! input, and doubles as a reference oracle for the LLM path.

use regex::Regex;
use std::sync::OnceLock;

use super::EvaluationBackend;
use crate::domain::{AcceptanceCriterion, CriterionResult, QaError, Result, Status, TestArtifact};

/// Default minimum keyword-match ratio for a pass.
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.6;

/// Tokens this short or shorter are ignored.
const MIN_TOKEN_LEN: usize = 3;

const PASS_UPDATE: &str = "Keep existing assertions; add semantic snapshot checks for this flow.";
const FAIL_UPDATE: &str = "Update test case with outcome-oriented checks, and include missing user-visible behavior from acceptance criterion.";

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[a-zA-Z0-9]+").expect("token pattern is valid"))
}

/// Lower-cased alphanumeric runs of at least three characters, in order,
/// repeats kept.
pub fn tokenize(statement: &str) -> Vec<String> {
    let lowered = statement.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// No-LLM analyzer for fully local runs.
#[derive(Debug, Clone, PartialEq)]
pub struct DeterministicBackend {
    pass_threshold: f64,
}

impl Default for DeterministicBackend {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

impl DeterministicBackend {
    /// Backend with a custom pass threshold in `[0, 1]`.
    pub fn with_threshold(pass_threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&pass_threshold) {
            return Err(QaError::InvalidConfig(format!(
                "pass threshold {} is outside [0, 1]",
                pass_threshold
            )));
        }
        Ok(Self { pass_threshold })
    }

    pub fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    /// Fraction of statement tokens found in the artifact's text and DOM.
    ///
    /// Each token occurrence in the statement counts separately. A statement
    /// without scoreable tokens scores `0.0`.
    pub fn score(&self, statement: &str, artifact: &TestArtifact) -> f64 {
        let haystack = format!("{} {}", artifact.observed_text, artifact.dom_snapshot).to_lowercase();
        let terms = tokenize(statement);
        if terms.is_empty() {
            return 0.0;
        }

        let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
        hits as f64 / terms.len() as f64
    }
}

impl EvaluationBackend for DeterministicBackend {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    fn evaluate(
        &self,
        criterion: &AcceptanceCriterion,
        artifact: &TestArtifact,
    ) -> Result<CriterionResult> {
        let score = self.score(&criterion.statement, artifact);
        let status = Status::from_passed(score >= self.pass_threshold);

        let recommended_test_update = match status {
            Status::Pass => PASS_UPDATE,
            Status::Fail => FAIL_UPDATE,
        };

        Ok(CriterionResult {
            criterion: criterion.clone(),
            status,
            confidence: round_to(score, 3),
            reasoning: format!(
                "Matched {:.1}% of criterion terms against observed output using deterministic keyword scoring.",
                score * 100.0
            ),
            recommended_test_update: recommended_test_update.to_string(),
        })
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
