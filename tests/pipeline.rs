//! End-to-end pipeline tests against a wiremock upstream.

use precon::{
    authenticate, partition_inputs, AssessmentClient, Config, CostEstimator, DocxRenderer,
    ReportBuilder, ReqwestHttpClient, RetryPolicy, RunId,
};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Smallest valid PNG: 1x1 transparent pixel
const PNG_1PX: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

fn test_config(dir: &tempfile::TempDir, endpoint: String) -> Config {
    let logo_path = write_file(dir, "logo.png", PNG_1PX);

    let mut config = Config::default();
    config.api.endpoint = endpoint;
    config.api.api_key = Some("sk-test".to_string());
    config.api.timeout = Duration::from_secs(5);
    config.retry.initial_delay = Duration::from_millis(10);
    config.report.output_dir = dir.path().to_path_buf();
    config.report.logo_path = logo_path;
    config.auth.username = Some("surveyor".to_string());
    config.auth.password = Some("hunter2".to_string());
    config
}

fn builder(config: &Config) -> ReportBuilder<ReqwestHttpClient> {
    let client = AssessmentClient::new(ReqwestHttpClient::new(), config.api.clone());
    let retry = RetryPolicy::new(config.retry.clone());
    let estimator = CostEstimator::for_model(&config.api.model, &config.pricing).unwrap();
    ReportBuilder::new(client, retry, estimator, config.report.clone())
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "choices": [{"message": {"role": "assistant", "content": content}}],
    })
}

#[tokio::test]
async fn full_run_produces_artifact_and_cost() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "minor surface cracking along the parapet",
        )))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, mock_server.uri());

    let paths = vec![
        write_file(&dir, "north.jpg", PNG_1PX),
        write_file(&dir, "south.png", PNG_1PX),
    ];
    let (images, rejected) = partition_inputs(paths);
    assert!(rejected.is_empty());

    let session = authenticate(&config.auth, "surveyor", "hunter2").unwrap();
    let run_id = RunId::new();
    let renderer = DocxRenderer::new(&config.report, &run_id).unwrap();

    let result = builder(&config)
        .run(&session, run_id, &images, renderer)
        .await
        .unwrap();

    assert_eq!(result.entries, 2);
    assert_eq!(result.failures, 0);
    assert!(result.total_cost > Decimal::ZERO);
    assert!(result.completed_at >= result.started_at);

    // Artifact exists, named after the run, and is a zip container
    assert!(result.artifact_path.exists());
    assert!(result
        .artifact_path
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .contains(&run_id.to_short_string()));
    let bytes = std::fs::read(&result.artifact_path).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn rate_limited_then_success_recovers() {
    let mock_server = MockServer::start().await;

    // First attempt is throttled, the retry succeeds
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit reached"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("no visible damage")))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, mock_server.uri());
    let images = vec![precon::ImageInput::from_path(write_file(&dir, "site.jpg", PNG_1PX)).unwrap()];

    let session = authenticate(&config.auth, "surveyor", "hunter2").unwrap();
    let run_id = RunId::new();
    let renderer = DocxRenderer::new(&config.report, &run_id).unwrap();

    let result = builder(&config)
        .run(&session, run_id, &images, renderer)
        .await
        .unwrap();

    assert_eq!(result.entries, 1);
    assert_eq!(result.failures, 0);
    assert!(result.total_cost > Decimal::ZERO);
}

#[tokio::test]
async fn upstream_failure_degrades_to_fallback_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, mock_server.uri());
    let images = vec![precon::ImageInput::from_path(write_file(&dir, "site.jpg", PNG_1PX)).unwrap()];

    let session = authenticate(&config.auth, "surveyor", "hunter2").unwrap();
    let run_id = RunId::new();
    let renderer = DocxRenderer::new(&config.report, &run_id).unwrap();

    let result = builder(&config)
        .run(&session, run_id, &images, renderer)
        .await
        .unwrap();

    // The run still completes with a document entry and zero cost
    assert_eq!(result.entries, 1);
    assert_eq!(result.failures, 1);
    assert_eq!(result.total_cost, Decimal::ZERO);
    assert!(result.artifact_path.exists());
}

#[tokio::test]
async fn rejected_extensions_do_not_abort_the_batch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("sound structure")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, mock_server.uri());

    let paths = vec![
        write_file(&dir, "a.jpg", PNG_1PX),
        write_file(&dir, "b.txt", b"not an image"),
        write_file(&dir, "c.png", PNG_1PX),
    ];
    let (images, rejected) = partition_inputs(paths);
    assert_eq!(images.len(), 2);
    assert_eq!(rejected.len(), 1);
    assert!(rejected[0].path.ends_with("b.txt"));

    let session = authenticate(&config.auth, "surveyor", "hunter2").unwrap();
    let run_id = RunId::new();
    let renderer = DocxRenderer::new(&config.report, &run_id).unwrap();

    let result = builder(&config)
        .run(&session, run_id, &images, renderer)
        .await
        .unwrap();

    assert_eq!(result.entries, 2);
    assert_eq!(result.failures, 0);
}
