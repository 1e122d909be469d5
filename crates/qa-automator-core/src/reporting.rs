use std::path::Path;

use crate::domain::{QaReport, Result};

/// Render the report as pretty JSON (`{"results": [...]}`).
pub fn render_report_json(report: &QaReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&report.as_artifact())?)
}

/// Write the report as pretty JSON.
pub fn write_report_json(path: &Path, report: &QaReport) -> Result<()> {
    let content = render_report_json(report)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Write an updated test case produced by [`crate::update_test_cases`].
pub fn write_updated_test_case(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    Ok(())
}
