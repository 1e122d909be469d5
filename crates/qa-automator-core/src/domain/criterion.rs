//! Inputs to every evaluation: acceptance criteria and captured test artifacts.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// One requirement parsed from a document or user story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    /// Stable identifier, unique within a run (e.g. `AC-1`).
    pub id: String,

    /// Natural-language requirement.
    pub statement: String,
}

impl AcceptanceCriterion {
    pub fn new(id: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            statement: statement.into(),
        }
    }
}

/// Execution trace captured from a UI or API test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestArtifact {
    /// Human-readable run title.
    pub title: String,

    /// Text output observed during the run.
    pub observed_text: String,

    /// Serialized DOM at the end of the run.
    #[serde(default)]
    pub dom_snapshot: String,

    /// Screenshot location. The file may not exist; a missing file is
    /// treated the same as no screenshot.
    #[serde(default, deserialize_with = "empty_path_as_none")]
    pub screenshot_path: Option<PathBuf>,
}

impl TestArtifact {
    /// Create an artifact with no DOM snapshot and no screenshot.
    pub fn new(title: impl Into<String>, observed_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            observed_text: observed_text.into(),
            dom_snapshot: String::new(),
            screenshot_path: None,
        }
    }

    pub fn with_dom_snapshot(mut self, dom_snapshot: impl Into<String>) -> Self {
        self.dom_snapshot = dom_snapshot.into();
        self
    }

    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot_path = Some(path.into());
        self
    }

    /// Screenshot path, only if it points at an existing file.
    pub fn existing_screenshot(&self) -> Option<&Path> {
        self.screenshot_path
            .as_deref()
            .filter(|path| path.is_file())
    }
}

fn empty_path_as_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(PathBuf::from))
}
