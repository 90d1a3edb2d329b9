#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests for the Ollama client against a mocked HTTP backend

use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use solution_memory_mcp::config::OllamaConfig;
use solution_memory_mcp::embeddings::ollama::OllamaClient;

fn client_for(server: &MockServer) -> OllamaClient {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: server.address().ip().to_string(),
        port: server.address().port(),
        model: "nomic-embed-text:latest".to_string(),
        batch_size: 4,
        embedding_dimension: 768,
    };
    OllamaClient::new(config).expect("should create client")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn generate_embedding_parses_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(serde_json::json!({
            "model": "nomic-embed-text:latest",
            "prompt": "hello world"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": [0.1, 0.2, 0.3]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .generate_embedding("hello world")
        .expect("should generate embedding");

    assert_eq!(result.text, "hello world");
    assert_eq!(result.embedding, vec![0.1, 0.2, 0.3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_check_passes_when_model_is_listed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [
                {"name": "nomic-embed-text:latest", "size": 274302450, "digest": "abc123"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.health_check().expect("health check should pass");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn validate_model_fails_for_unknown_model() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [{"name": "some-other-model"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.ping().is_ok());

    let error = client
        .validate_model()
        .expect_err("validation should fail for unknown model");
    assert!(error.to_string().contains("not available"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    // First attempt fails with a 500; the retry succeeds.
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": [1.0]
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = client_for(&server).with_retry_attempts(2);
    let result = client
        .generate_embedding("retry me")
        .expect("should succeed after retry");
    assert_eq!(result.embedding, vec![1.0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server)
        .with_timeout(Duration::from_secs(5))
        .with_retry_attempts(3);

    let error = client
        .generate_embedding("bad request")
        .expect_err("client error should not be retried");
    assert!(error.to_string().contains("400") || error.root_cause().to_string().contains("400"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn batch_embedding_uses_batch_api() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(serde_json::json!({
            "input": ["first", "second"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embeddings": [[0.1, 0.2], [0.3, 0.4]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let results = client
        .generate_embeddings_batch(&["first".to_string(), "second".to_string()])
        .expect("should generate batch embeddings");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].embedding, vec![0.1, 0.2]);
    assert_eq!(results[1].embedding, vec![0.3, 0.4]);
}
