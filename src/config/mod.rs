mod env_manager;

use crate::error::{Result, ServiceError};
use crate::fetcher::FetchBudget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use env_manager::{get_env_value, load_dotenv, ApiKeys, GEMINI_API_KEY_VAR, GITHUB_TOKEN_VAR};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Main configuration struct for the service
///
/// Built from defaults, then an optional TOML file, then environment
/// overrides. Shared read-only across requests once the server starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings
    pub server: ServerConfig,
    /// GitHub contents API settings
    pub github: GitHubConfig,
    /// Gemini generation API settings
    pub gemini: GeminiConfig,
    /// Traversal budget defaults
    pub fetch: FetchConfig,
    /// Upstream credentials
    pub api_keys: ApiKeys,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

/// GitHub API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Base URL of the REST API
    pub api_base: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Gemini client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Base URL including the API version segment
    pub api_base: String,
    /// Model name used in the `generateContent` path
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Fetch budget defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of files whose content is stored
    pub max_files: usize,
    /// Maximum cumulative size of stored files, in bytes
    pub max_bytes: usize,
    /// Number of characters kept per stored file
    pub preview_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            github: GitHubConfig::default(),
            gemini: GeminiConfig::default(),
            fetch: FetchConfig::default(),
            api_keys: ApiKeys::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API_BASE.to_string(),
            timeout_seconds: 30,
            user_agent: concat!("talktocode/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: GEMINI_API_BASE.to_string(),
            model: GEMINI_MODEL.to_string(),
            timeout_seconds: 120,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_files: 50,
            max_bytes: 50 * 1024,
            preview_chars: 500,
        }
    }
}

impl FetchConfig {
    /// Builds the traversal budget described by this configuration
    pub fn budget(&self) -> FetchBudget {
        FetchBudget {
            max_files: self.max_files,
            max_bytes: self.max_bytes,
            preview_chars: self.preview_chars,
        }
    }
}

impl GitHubConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl GeminiConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Loads configuration from an explicit file, or the default location if present.
    ///
    /// Environment overrides are applied last. An explicit path that does not
    /// exist is an error; a missing default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate(path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// File `load` reads: the explicit path, else the default one when it exists
    pub fn locate(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        }
    }

    /// Parses a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ServiceError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// `<config_dir>/talktocode/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("talktocode").join("config.toml"))
    }

    /// Applies environment overrides on top of the current values
    pub fn apply_env(&mut self) {
        self.api_keys.merge_env();
        if let Some(base) = get_env_value("GITHUB_API_BASE_URL") {
            self.github.api_base = base;
        }
        if let Some(base) = get_env_value("GEMINI_API_BASE_URL") {
            self.gemini.api_base = base;
        }
        if let Some(model) = get_env_value("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(host) = get_env_value("TALKTOCODE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get_env_value("TALKTOCODE_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Checks that budgets are usable and that configured secrets are not blank
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_files == 0 {
            return Err(ServiceError::Config("fetch.max_files must be positive".into()));
        }
        if self.fetch.max_bytes == 0 {
            return Err(ServiceError::Config("fetch.max_bytes must be positive".into()));
        }
        if self.fetch.preview_chars == 0 {
            return Err(ServiceError::Config("fetch.preview_chars must be positive".into()));
        }
        for (name, value) in [
            (GITHUB_TOKEN_VAR, &self.api_keys.github_token),
            (GEMINI_API_KEY_VAR, &self.api_keys.gemini_api_key),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ServiceError::Config(format!("{} is empty", name)));
            }
        }
        Ok(())
    }

    /// Retrieves the GitHub token, if configured
    pub fn github_token(&self) -> Option<&str> {
        self.api_keys.github_token.as_deref()
    }

    /// Retrieves the Gemini API key or fails when it is missing
    pub fn gemini_api_key(&self) -> Result<&str> {
        self.api_keys
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| ServiceError::Config(format!("{} not configured", GEMINI_API_KEY_VAR)))
    }

    /// Address the server listens on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
