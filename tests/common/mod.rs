#![allow(dead_code)]

pub mod in_memory;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mockall::{mock, Sequence};
use serde_json::Value;
use std::sync::Arc;
use talktocode::config::{Config, GitHubConfig};
use talktocode::{router, AppState, GitHubClient, Generation, TextGenerator};
use tower::ServiceExt;

pub use in_memory::InMemorySource;

mock! {
    pub Generator {}

    #[async_trait]
    impl TextGenerator for Generator {
        async fn generate(&self, prompt: &str) -> talktocode::Result<Generation>;
    }
}

pub mod test_helpers {
    use super::*;

    pub fn setup_test_logger() {
        talktocode::logging::init_for_tests();
    }

    /// Router over an in-memory tree and a mocked generator
    pub fn test_app(source: InMemorySource, generator: MockGenerator) -> Router {
        router(AppState::new(Config::default(), Arc::new(source), Arc::new(generator)))
    }

    /// Generator that must not be called
    pub fn idle_generator() -> MockGenerator {
        MockGenerator::new()
    }

    /// Generator answering each call with the next reply, in order
    pub fn replying(replies: Vec<Generation>) -> MockGenerator {
        let mut generator = MockGenerator::new();
        let mut seq = Sequence::new();
        for reply in replies {
            generator
                .expect_generate()
                .times(1)
                .in_sequence(&mut seq)
                .return_once(move |_| Ok(reply));
        }
        generator
    }

    /// Sample tree used across API tests
    pub fn sample_source() -> InMemorySource {
        InMemorySource::new("owner/repo")
            .with_file("a.py", "import os\nprint('hi')")
            .with_file("dir/b.py", "def foo():\n    pass")
            .with_file("tests/foo.py", "assert True")
    }

    /// GitHub client pointed at a mock server
    pub fn github_client(server: &mockito::ServerGuard) -> GitHubClient {
        let config = GitHubConfig {
            api_base: server.url(),
            ..GitHubConfig::default()
        };
        GitHubClient::new(&config, Some("test-token".to_string())).unwrap()
    }

    pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(app, request).await
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}
