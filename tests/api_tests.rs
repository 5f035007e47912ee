use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use talktocode::prompts::{SUGGESTION_QUERY, SUMMARY_QUERY};
use talktocode::{Generation, ServiceError};

mod common;
use common::test_helpers::*;
use common::{InMemorySource, MockGenerator};

fn sample_repo_data() -> serde_json::Value {
    json!({
        "structure": ["a.py", "dir", "dir/b.py"],
        "files": {
            "a.py": "import os\nprint('hi')",
            "dir/b.py": "def foo():\n    pass"
        }
    })
}

#[tokio::test]
async fn test_home_message() {
    let app = test_app(sample_source(), idle_generator());
    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("/ingest"));
}

#[tokio::test]
async fn test_health() {
    let app = test_app(sample_source(), idle_generator());
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "talktocode");
}

#[tokio::test]
async fn test_ingest_missing_repo_url() {
    let app = test_app(sample_source(), idle_generator());
    let (status, body) = post_json(app, "/ingest", json!({ "exclude": ["test"] })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing repo_url" }));
}

#[tokio::test]
async fn test_ingest_returns_summary_suggestions_and_data() {
    setup_test_logger();
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .withf(|prompt| prompt.contains("--- dir/b.py ---") && prompt.ends_with(SUMMARY_QUERY))
        .times(1)
        .returning(|_| Ok(Generation::Text("A small Python repo.".into())));
    generator
        .expect_generate()
        .withf(|prompt| prompt.ends_with(SUGGESTION_QUERY))
        .times(1)
        .returning(|_| Ok(Generation::Text("Add docstrings to dir/b.py.".into())));
    let app = test_app(sample_source(), generator);

    let (status, body) = post_json(
        app,
        "/ingest",
        json!({
            "repo_url": "https://github.com/owner/repo/",
            "exclude": ["TEST"],
            "max_size_kb": 10
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["files_analyzed"], 2);
    assert_eq!(body["summary"], "A small Python repo.");
    assert_eq!(body["suggestions"], "Add docstrings to dir/b.py.");
    assert_eq!(body["repo_data"], sample_repo_data());
    assert!(body["estimated_tokens"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_ingest_keeps_upstream_failure_inline() {
    let generator = replying(vec![
        Generation::Failed {
            status: 429,
            body: "quota exhausted".into(),
        },
        Generation::Text("ok".into()),
    ]);
    let app = test_app(sample_source(), generator);

    let (status, body) = post_json(app, "/ingest", json!({ "repo_url": "owner/repo" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Error: 429 - quota exhausted");
    assert_eq!(body["suggestions"], "ok");
}

#[tokio::test]
async fn test_ingest_fetch_failure_is_500() {
    let app = test_app(InMemorySource::new("owner/repo").unresolvable(), idle_generator());

    let (status, body) = post_json(app, "/ingest", json!({ "repo_url": "owner/missing" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch repo data" }));
}

#[tokio::test]
async fn test_ingest_unreachable_generator_is_502() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .returning(|_| Err(ServiceError::Generation("connection refused".into())));
    let app = test_app(sample_source(), generator);

    let (status, body) = post_json(app, "/ingest", json!({ "repo_url": "owner/repo" })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("Generation error"));
}

#[tokio::test]
async fn test_get_repo_data_honors_exclusions() {
    let app = test_app(sample_source(), idle_generator());

    let (status, body) = post_json(
        app,
        "/get_repo_data",
        json!({ "repo_url": "https://github.com/owner/repo", "exclude": ["test"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["files_analyzed"], 2);
    let structure = body["repo_data"]["structure"].as_array().unwrap();
    assert!(!structure.iter().any(|p| p.as_str().unwrap().contains("tests")));
    assert!(body["repo_data"]["files"].get("tests/foo.py").is_none());
}

#[tokio::test]
async fn test_get_repo_data_without_exclusions_lists_everything() {
    let app = test_app(sample_source(), idle_generator());

    let (_, body) = post_json(app, "/get_repo_data", json!({ "repo_url": "owner/repo", "exclude": null })).await;

    assert_eq!(
        body["repo_data"]["structure"],
        json!(["a.py", "dir", "dir/b.py", "tests", "tests/foo.py"])
    );
}

#[tokio::test]
async fn test_empty_repository_data_can_be_sent_back() {
    let (status, body) = post_json(
        test_app(InMemorySource::new("o/r"), idle_generator()),
        "/get_repo_data",
        json!({ "repo_url": "o/r" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["repo_data"], json!({ "structure": [], "files": {} }));
    let repo_data = body["repo_data"].clone();

    let (status, body) = post_json(
        test_app(InMemorySource::new("o/r"), idle_generator()),
        "/search",
        json!({ "repo_data": repo_data.clone(), "keyword": "os" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "results": [] }));

    let (status, body) = post_json(
        test_app(InMemorySource::new("o/r"), idle_generator()),
        "/analyze_structure",
        json!({ "repo_data": repo_data }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "structure": "" }));
}

#[tokio::test]
async fn test_analyze_codebase() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .withf(|prompt| prompt.starts_with("Repo Data:\nDirectory Structure:\na.py\ndir\ndir/b.py"))
        .times(1)
        .returning(|_| Ok(Generation::Text("Summary.".into())));
    let app = test_app(sample_source(), generator);

    let (status, body) = post_json(app, "/analyze_codebase", json!({ "repo_data": sample_repo_data() })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "analysis": "Summary." }));
}

#[tokio::test]
async fn test_analyze_codebase_missing_data() {
    for missing in [json!({}), json!({ "repo_data": null }), json!({ "repo_data": {} })] {
        let app = test_app(sample_source(), idle_generator());

        let (status, body) = post_json(app, "/analyze_codebase", missing).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing repo_data" }));
    }
}

#[tokio::test]
async fn test_analyze_structure() {
    let app = test_app(sample_source(), idle_generator());

    let (status, body) = post_json(app, "/analyze_structure", json!({ "repo_data": sample_repo_data() })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "structure": "a.py\ndir\ndir/b.py" }));
}

#[tokio::test]
async fn test_analyze_structure_rejects_wrongly_shaped_data() {
    let app = test_app(sample_source(), idle_generator());

    let (status, body) = post_json(app, "/analyze_structure", json!({ "repo_data": { "structure": "a.py" } })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid repo_data"));
}

#[tokio::test]
async fn test_search_scenario() {
    let app = test_app(sample_source(), idle_generator());

    let (status, body) = post_json(
        app,
        "/search",
        json!({ "repo_data": sample_repo_data(), "keyword": "os" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "results": ["a.py: Line 1: import os"] }));
}

#[tokio::test]
async fn test_search_requires_keyword() {
    let app = test_app(sample_source(), idle_generator());

    let (status, body) = post_json(app, "/search", json!({ "repo_data": sample_repo_data(), "keyword": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing repo_data or keyword" }));
}

#[tokio::test]
async fn test_search_accepts_whitespace_keyword() {
    let app = test_app(sample_source(), idle_generator());

    let (status, body) = post_json(app, "/search", json!({ "repo_data": sample_repo_data(), "keyword": " " })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "results": [
                "a.py: Line 1: import os",
                "dir/b.py: Line 1: def foo():",
                "dir/b.py: Line 2: pass"
            ]
        })
    );
}

#[tokio::test]
async fn test_ask_passes_query_and_history() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .withf(|prompt| prompt.ends_with("Conversation History:\nuser: hello\n\nQuery: Where is os imported?"))
        .times(1)
        .returning(|_| Ok(Generation::Text("In a.py.".into())));
    let app = test_app(sample_source(), generator);

    let (status, body) = post_json(
        app,
        "/ask",
        json!({
            "repo_data": sample_repo_data(),
            "query": "Where is os imported?",
            "history": "user: hello"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": "In a.py." }));
}

#[tokio::test]
async fn test_ask_missing_query() {
    let app = test_app(sample_source(), idle_generator());

    let (status, body) = post_json(app, "/ask", json!({ "repo_data": sample_repo_data() })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing repo_data or query" }));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = test_app(sample_source(), idle_generator());
    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}
