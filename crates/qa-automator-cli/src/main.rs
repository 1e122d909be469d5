//! QA Automator CLI
//!
//! Scores a captured test run against acceptance criteria, prints a JSON
//! report and optionally appends suggested checks to an existing test case.
//!
//! ## Backends
//!
//! - `mock`: offline keyword-overlap scoring (default)
//! - `ollama`: LLM verdicts from a local or remote Ollama service

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};

use qa_automator_core::{
    init_tracing, load_artifact, load_criteria, render_report_json, write_report_json,
    write_updated_test_case, Backend, DeterministicBackend, QaAnalyzer, RemoteInferenceConfig,
    DEFAULT_PASS_THRESHOLD,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Deterministic keyword scoring, no network
    Mock,
    /// Ollama `/api/generate` endpoint
    Ollama,
}

#[derive(Parser)]
#[command(name = "qa-automator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automate QA analysis with multimodal reasoning and test updates", long_about = None)]
struct Cli {
    /// JSON file with criteria
    #[arg(long)]
    criteria: PathBuf,

    /// JSON file with test run artifact
    #[arg(long)]
    artifact: PathBuf,

    /// Evaluation backend
    #[arg(long, value_enum, default_value_t = BackendKind::Mock)]
    backend: BackendKind,

    /// Model identifier (ollama backend) [env: QA_AUTOMATOR_MODEL]
    #[arg(long)]
    model: Option<String>,

    /// Inference service base URL (ollama backend) [env: QA_AUTOMATOR_HOST]
    #[arg(long)]
    host: Option<String>,

    /// Request timeout in seconds (ollama backend) [env: QA_AUTOMATOR_TIMEOUT_SECS]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Minimum keyword-match ratio for a pass (mock backend)
    #[arg(long, default_value_t = DEFAULT_PASS_THRESHOLD)]
    pass_threshold: f64,

    /// Existing test-case markdown/txt to update
    #[arg(long)]
    test_case: Option<PathBuf>,

    /// Output path for updated test case
    #[arg(long, default_value = "updated_test_case.md")]
    updated_test_case_out: PathBuf,

    /// Also write the JSON report to this file
    #[arg(long)]
    report_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn build_backend(&self) -> Result<Backend> {
        let backend = match self.backend {
            BackendKind::Mock => Backend::Deterministic(
                DeterministicBackend::with_threshold(self.pass_threshold)
                    .context("invalid --pass-threshold")?,
            ),
            BackendKind::Ollama => Backend::remote(self.inference_config())
                .context("invalid inference backend settings")?,
        };
        Ok(backend)
    }

    /// Environment settings, then explicit flags on top.
    fn inference_config(&self) -> RemoteInferenceConfig {
        let mut config = RemoteInferenceConfig::from_env();
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(host) = &self.host {
            config = config.with_host(host);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.json, level);

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let analyzer = QaAnalyzer::new(cli.build_backend()?);

    let criteria = load_criteria(&cli.criteria)?;
    let artifact = load_artifact(&cli.artifact)?;
    info!(
        criteria = criteria.len(),
        artifact = %artifact.title,
        "loaded inputs"
    );

    let report = analyzer
        .analyze(&criteria, &artifact)
        .context("analysis aborted")?;
    println!("{}", render_report_json(&report)?);

    if let Some(path) = &cli.report_out {
        write_report_json(path, &report)
            .with_context(|| format!("write report to {:?}", path))?;
    }

    if let Some(test_case) = &cli.test_case {
        let baseline = std::fs::read_to_string(test_case)
            .with_context(|| format!("read test case {:?}", test_case))?;
        let updated = analyzer.update_test_cases(&report, &baseline);
        write_updated_test_case(&cli.updated_test_case_out, &updated)
            .with_context(|| format!("write {:?}", cli.updated_test_case_out))?;
        println!(
            "\nUpdated test-case written to: {}",
            cli.updated_test_case_out.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_automator_core::{DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_TIMEOUT};

    #[test]
    fn cli_defaults_to_mock_backend() {
        let cli = Cli::parse_from(["qa-automator", "--criteria", "c.json", "--artifact", "a.json"]);
        assert_eq!(cli.backend, BackendKind::Mock);
        assert_eq!(cli.updated_test_case_out, PathBuf::from("updated_test_case.md"));
        assert!(matches!(cli.build_backend().unwrap(), Backend::Deterministic(_)));
    }

    #[test]
    fn cli_builds_ollama_backend() {
        let cli = Cli::parse_from([
            "qa-automator",
            "--criteria",
            "c.json",
            "--artifact",
            "a.json",
            "--backend",
            "ollama",
            "--host",
            "http://gpu-box:11434/",
            "--model",
            "qwen2.5:7b",
        ]);
        match cli.build_backend().unwrap() {
            Backend::RemoteInference(backend) => {
                assert_eq!(backend.config().host, "http://gpu-box:11434");
                assert_eq!(backend.config().model, "qwen2.5:7b");
            }
            other => panic!("expected remote backend, got {other:?}"),
        }
    }

    #[test]
    fn cli_unset_flags_fall_back_to_defaults() {
        let cli = Cli::parse_from(["qa-automator", "--criteria", "c.json", "--artifact", "a.json"]);
        let config = cli.inference_config();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let cli = Cli::parse_from([
            "qa-automator",
            "--criteria",
            "c.json",
            "--artifact",
            "a.json",
            "--timeout-secs",
            "7",
        ]);
        assert_eq!(cli.inference_config().timeout, Duration::from_secs(7));
        assert_eq!(cli.inference_config().model, DEFAULT_MODEL);
    }

    #[test]
    fn cli_rejects_out_of_range_threshold() {
        let cli = Cli::parse_from([
            "qa-automator",
            "--criteria",
            "c.json",
            "--artifact",
            "a.json",
            "--pass-threshold",
            "2",
        ]);
        assert!(cli.build_backend().is_err());
    }
}
