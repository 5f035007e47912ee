use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the GitHub token variable
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Name of the Gemini API key variable
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Credentials for the two upstream services
///
/// Loaded once at startup and only read afterwards.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// GitHub access token used for the contents API
    pub github_token: Option<String>,
    /// API key for the Gemini generation service
    pub gemini_api_key: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("github_token", &self.github_token.as_ref().map(|_| "***"))
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ApiKeys {
    /// Reads both secrets from the process environment
    pub fn from_env() -> Self {
        Self {
            github_token: get_env_value(GITHUB_TOKEN_VAR),
            gemini_api_key: get_env_value(GEMINI_API_KEY_VAR),
        }
    }

    /// Replaces any key that is set in the environment, keeping file values otherwise
    pub fn merge_env(&mut self) {
        let env = Self::from_env();
        if env.github_token.is_some() {
            self.github_token = env.github_token;
        }
        if env.gemini_api_key.is_some() {
            self.gemini_api_key = env.gemini_api_key;
        }
    }
}

/// Loads a `.env` file into the process environment if one can be found,
/// returning the file that was read.
///
/// Variables already present in the environment are left untouched.
pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(p) => dotenv::from_path(p).ok().map(|_| p.to_path_buf()),
        None => dotenv::dotenv().ok(),
    }
}

/// Returns the value of an environment variable, treating empty strings as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
