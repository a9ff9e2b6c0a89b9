use atlas_protocol::{PendingFile, RepoContext};
use atlas_summarizer::{GeminiSummarizer, Summarize, SummarizerError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn items() -> Vec<PendingFile> {
    vec![
        PendingFile {
            path: "a.py".into(),
            content: "import os".into(),
            language: Some("python".into()),
            size: 9,
        },
        PendingFile {
            path: "b.py".into(),
            content: "import sys".into(),
            language: Some("python".into()),
            size: 10,
        },
    ]
}

#[tokio::test]
async fn parses_a_batch_reply() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let reply = json!({
        "candidates": [{
            "content": {
                "parts": [{
                    "text": "```json\n{\"a.py\": \"Imports os.\", \"b.py\": \"Imports sys.\"}\n```"
                }]
            }
        }]
    });
    Mock::given(method("POST"))
        .and(path("/gemini-2.0-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiSummarizer::new("test-key".into()).with_base_url(server.uri());
    let out = client
        .summarize_batch(&items(), &RepoContext::default())
        .await?;

    assert_eq!(out.len(), 2);
    assert_eq!(out["a.py"], "Imports os.");
    assert_eq!(out["b.py"], "Imports sys.");
    Ok(())
}

#[tokio::test]
async fn server_errors_surface_as_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let client = GeminiSummarizer::new("test-key".into()).with_base_url(server.uri());
    let err = client
        .summarize_batch(&items(), &RepoContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizerError::Api { status: 500, .. }));
}

#[tokio::test]
async fn replies_without_json_are_malformed() {
    let server = MockServer::start().await;
    let reply = json!({
        "candidates": [{
            "content": { "parts": [{ "text": "I could not summarize these files." }] }
        }]
    });
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;

    let client = GeminiSummarizer::new("test-key".into()).with_base_url(server.uri());
    let err = client
        .summarize_batch(&items(), &RepoContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizerError::MalformedResponse(_)));
}
