//! Per-criterion verdicts and the ordered report built from them.

use serde::{Deserialize, Serialize};

use super::criterion::AcceptanceCriterion;

/// Pass/fail verdict for one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    /// Interpret a status label reported by a model. Anything other than
    /// `pass` (case-insensitive) counts as a failure.
    pub fn from_label(label: &str) -> Self {
        Self::from_passed(label.trim().eq_ignore_ascii_case("pass"))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }

    pub fn as_upper(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }

    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one criterion against one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: AcceptanceCriterion,
    pub status: Status,
    /// Certainty in `[0, 1]`.
    pub confidence: f64,
    pub reasoning: String,
    pub recommended_test_update: String,
}

/// Ordered verdicts for one artifact against one criteria set.
///
/// # Invariants
///
/// `results[i].criterion` is the i-th criterion handed to the analyzer; no
/// criterion is skipped or reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    pub results: Vec<CriterionResult>,
}

impl QaReport {
    pub fn new(results: Vec<CriterionResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.passed()
    }

    /// Fraction of passing criteria; `0.0` for an empty report.
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.passed() as f64 / self.len() as f64
        }
    }

    /// Flatten into the published report shape.
    pub fn as_artifact(&self) -> ReportArtifact {
        ReportArtifact {
            results: self
                .results
                .iter()
                .map(|r| ReportEntry {
                    criterion_id: r.criterion.id.clone(),
                    statement: r.criterion.statement.clone(),
                    status: r.status,
                    confidence: r.confidence,
                    reasoning: r.reasoning.clone(),
                    recommended_test_update: r.recommended_test_update.clone(),
                })
                .collect(),
        }
    }
}

/// One row of the published report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub criterion_id: String,
    pub statement: String,
    pub status: Status,
    pub confidence: f64,
    pub reasoning: String,
    pub recommended_test_update: String,
}

/// Published report: `{"results": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub results: Vec<ReportEntry>,
}
