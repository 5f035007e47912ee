//! Text generation: the [`TextGenerator`] seam, its Gemini implementation and
//! the [`Advisor`] that pairs a formatted repository with fixed queries.

mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use crate::prompts::{build_prompt, SUGGESTION_QUERY, SUMMARY_QUERY};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Outcome of one generation call that reached the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// The service answered with text
    Text(String),
    /// The service answered with a non-success status
    Failed {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },
}

impl Generation {
    /// True for `Text`
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Generated text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Failed { .. } => None,
        }
    }

    /// Flattens to the string shape returned by the HTTP API
    pub fn into_response_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Failed { status, body } => format!("Error: {} - {}", status, body),
        }
    }
}

/// A single-turn text generation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends `prompt` and returns the service outcome.
    ///
    /// `Err` means the service could not be reached or answered with an
    /// unreadable success body.
    async fn generate(&self, prompt: &str) -> Result<Generation>;
}

/// Produces summaries, suggestions and answers about a formatted repository
#[derive(Clone)]
pub struct Advisor {
    generator: Arc<dyn TextGenerator>,
}

impl Advisor {
    /// Creates an advisor backed by `generator`
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Summary of the repository's purpose and key files
    pub async fn summarize(&self, formatted_data: &str) -> Result<Generation> {
        info!("Generating code summary");
        self.generator
            .generate(&build_prompt(formatted_data, SUMMARY_QUERY, ""))
            .await
    }

    /// Two or three concrete improvement suggestions
    pub async fn suggest(&self, formatted_data: &str) -> Result<Generation> {
        info!("Generating code suggestions");
        self.generator
            .generate(&build_prompt(formatted_data, SUGGESTION_QUERY, ""))
            .await
    }

    /// Free-form question, with optional prior conversation
    pub async fn ask(&self, formatted_data: &str, query: &str, history: &str) -> Result<Generation> {
        info!("Answering repository question");
        self.generator
            .generate(&build_prompt(formatted_data, query, history))
            .await
    }
}
