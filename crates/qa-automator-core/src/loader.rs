//! Criteria and artifact loading from JSON files.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::domain::{AcceptanceCriterion, QaError, Result, TestArtifact};

#[derive(Deserialize)]
struct CriteriaFile {
    criteria: Vec<AcceptanceCriterion>,
}

/// Load `{"criteria": [{"id": ..., "statement": ...}, ...]}`, keeping file order.
pub fn load_criteria(path: &Path) -> Result<Vec<AcceptanceCriterion>> {
    let file: CriteriaFile = read_json(path)?;

    let mut seen = HashSet::new();
    for criterion in &file.criteria {
        if !seen.insert(criterion.id.as_str()) {
            return Err(QaError::DuplicateCriterion(criterion.id.clone()));
        }
    }

    Ok(file.criteria)
}

/// Load `{"title", "observed_text", "dom_snapshot"?, "screenshot_path"?}`.
pub fn load_artifact(path: &Path) -> Result<TestArtifact> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| QaError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| QaError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}
