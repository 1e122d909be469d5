//! Domain models for QA Automator.
//!
//! Canonical definitions for the core entities:
//! - `AcceptanceCriterion`: one natural-language requirement
//! - `TestArtifact`: evidence captured from one test execution
//! - `CriterionResult`: verdict for one criterion
//! - `QaReport`: ordered verdicts for one analysis run

pub mod criterion;
pub mod error;
pub mod result;

pub use criterion::{AcceptanceCriterion, TestArtifact};
pub use error::{QaError, Result};
pub use result::{CriterionResult, QaReport, ReportArtifact, ReportEntry, Status};
