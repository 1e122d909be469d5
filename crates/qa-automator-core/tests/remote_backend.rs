//! Remote-inference backend against an in-process HTTP responder.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use qa_automator_core::{
    AcceptanceCriterion, Backend, EvaluationBackend, QaAnalyzer, QaError, RemoteInferenceBackend,
    RemoteInferenceConfig, Status, TestArtifact,
};

/// Captured request: path line and JSON body.
struct Captured {
    request_line: String,
    body: serde_json::Value,
}

/// Serve `responses` one connection at a time, then stop.
fn serve(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("request line");

            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).expect("header");
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("content-length");
                    }
                }
            }

            let mut raw = vec![0u8; content_length];
            reader.read_exact(&mut raw).expect("request body");
            let _ = tx.send(Captured {
                request_line: request_line.trim_end().to_string(),
                body: serde_json::from_slice(&raw).unwrap_or(serde_json::Value::Null),
            });

            let mut stream = stream;
            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).expect("write response");
        }
    });

    (url, rx)
}

fn generate_body(model_text: &str) -> String {
    serde_json::json!({
        "model": "llama3.1:8b",
        "response": model_text,
        "done": true
    })
    .to_string()
}

fn backend_for(url: &str) -> RemoteInferenceBackend {
    RemoteInferenceBackend::new(
        RemoteInferenceConfig::default()
            .with_host(url)
            .with_model("qa-judge")
            .with_timeout(Duration::from_secs(5)),
    )
    .expect("backend")
}

/// A host:port that refuses connections.
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

fn criterion() -> AcceptanceCriterion {
    AcceptanceCriterion::new("AC-1", "dashboard welcome message visible")
}

fn artifact() -> TestArtifact {
    TestArtifact::new("Run", "Dashboard loaded and welcome message visible")
        .with_dom_snapshot("<h1>Dashboard</h1>")
}

#[test]
fn model_verdict_is_returned() {
    let (url, requests) = serve(vec![(
        200,
        generate_body(
            r#"{"status":"pass","confidence":0.91,"reasoning":"welcome text present","recommended_test_update":"assert heading text"}"#,
        ),
    )]);

    let result = backend_for(&url).evaluate(&criterion(), &artifact()).unwrap();
    assert_eq!(result.criterion, criterion());
    assert_eq!(result.status, Status::Pass);
    assert_eq!(result.confidence, 0.91);
    assert_eq!(result.reasoning, "welcome text present");
    assert_eq!(result.recommended_test_update, "assert heading text");

    let captured = requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(captured.request_line.starts_with("POST /api/generate "));
    assert_eq!(captured.body["model"], "qa-judge");
    assert_eq!(captured.body["stream"], false);
    assert_eq!(captured.body["format"], "json");
    let prompt = captured.body["prompt"].as_str().expect("prompt string");
    assert!(prompt.contains("Criterion: dashboard welcome message visible"));
    assert!(prompt.contains("Image summary: No screenshot provided."));
}

#[test]
fn malformed_model_output_degrades_to_fail() {
    let (url, _requests) = serve(vec![(200, generate_body("I think it passes!"))]);

    let result = backend_for(&url).evaluate(&criterion(), &artifact()).unwrap();
    assert_eq!(result.status, Status::Fail);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(
        result.reasoning,
        "Model response was not valid JSON: I think it passes!"
    );
}

#[test]
fn non_json_body_degrades_to_fail() {
    let (url, _requests) = serve(vec![(200, "<html>proxy page</html>".to_string())]);

    let result = backend_for(&url).evaluate(&criterion(), &artifact()).unwrap();
    assert_eq!(result.status, Status::Fail);
    assert!(result.reasoning.contains("<html>proxy page</html>"));
}

#[test]
fn missing_response_field_uses_defaults() {
    let (url, _requests) = serve(vec![(200, r#"{"done":true}"#.to_string())]);

    let result = backend_for(&url).evaluate(&criterion(), &artifact()).unwrap();
    assert_eq!(result.status, Status::Fail);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.reasoning, "No reasoning returned.");
    assert_eq!(
        result.recommended_test_update,
        "No update recommendation returned."
    );
}

#[test]
fn unreachable_host_is_hard_error_naming_host() {
    let url = closed_port_url();
    let err = backend_for(&url)
        .evaluate(&criterion(), &artifact())
        .unwrap_err();

    match &err {
        QaError::BackendUnreachable { host, .. } => assert_eq!(host, &url),
        other => panic!("expected BackendUnreachable, got {other:?}"),
    }
    assert!(err.to_string().contains(&url));
    assert!(err.to_string().contains("ollama serve"));
}

#[test]
fn silent_server_times_out_as_unreachable() {
    // Accepts connections into the backlog but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));

    let backend = RemoteInferenceBackend::new(
        RemoteInferenceConfig::default()
            .with_host(&url)
            .with_timeout(Duration::from_millis(300)),
    )
    .unwrap();

    let err = backend.evaluate(&criterion(), &artifact()).unwrap_err();
    assert!(matches!(err, QaError::BackendUnreachable { .. }));
    drop(listener);
}

#[test]
fn http_error_status_is_hard_error() {
    let (url, _requests) = serve(vec![(404, r#"{"error":"model not found"}"#.to_string())]);

    let err = backend_for(&url)
        .evaluate(&criterion(), &artifact())
        .unwrap_err();
    assert!(matches!(err, QaError::BackendStatus { status: 404, .. }));
}

#[test]
fn analyzer_keeps_one_result_per_criterion_with_garbled_output() {
    let (url, _requests) = serve(vec![
        (200, generate_body(r#"{"status":"pass","confidence":1}"#)),
        (200, generate_body("not json at all")),
        (200, generate_body(r#"{"status":"fail","confidence":"0.3"}"#)),
    ]);

    let criteria = vec![
        AcceptanceCriterion::new("AC-1", "welcome message"),
        AcceptanceCriterion::new("AC-2", "error banner"),
        AcceptanceCriterion::new("AC-3", "logout link"),
    ];
    let analyzer = QaAnalyzer::new(Backend::RemoteInference(backend_for(&url)));
    let report = analyzer.analyze(&criteria, &artifact()).unwrap();

    assert_eq!(report.results.len(), 3);
    let ids: Vec<_> = report.results.iter().map(|r| r.criterion.id.as_str()).collect();
    assert_eq!(ids, vec!["AC-1", "AC-2", "AC-3"]);
    assert_eq!(report.results[0].status, Status::Pass);
    assert_eq!(report.results[1].status, Status::Fail);
    assert_eq!(report.results[1].confidence, 0.0);
    assert_eq!(report.results[2].confidence, 0.3);
}

#[test]
fn analyzer_aborts_when_backend_unreachable() {
    let url = closed_port_url();
    let analyzer = QaAnalyzer::new(Backend::RemoteInference(backend_for(&url)));

    let result = analyzer.analyze(&[criterion()], &artifact());
    assert!(matches!(result, Err(QaError::BackendUnreachable { .. })));
}
