use crate::config::GitHubConfig;
use crate::error::{Result, ServiceError};
use crate::fetcher::{ContentEntry, EntryKind, RepoInfo, RepoSource};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// Client for the GitHub repository contents API
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
}

/// Repository metadata returned by `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub default_branch: Option<String>,
}

/// One item of a contents listing, or a single file with its body
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub download_url: Option<String>,
    pub content: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentItem>),
    Single(Box<ContentItem>),
}

impl From<ContentItem> for ContentEntry {
    fn from(item: ContentItem) -> Self {
        ContentEntry {
            kind: EntryKind::from_api(&item.kind),
            name: item.name,
            path: item.path,
        }
    }
}

impl GitHubClient {
    /// Creates a client with the token, if any, attached to every request
    pub fn new(config: &GitHubConfig, token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ServiceError::Config(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("token {}", token.trim()))
                .map_err(|e| ServiceError::Config(format!("Invalid GitHub token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_base: Url::parse(&config.api_base)?,
        })
    }

    /// `{api_base}/repos/{owner}/{name}` followed by extra path segments
    fn repo_url(&self, repo: &str, extra: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ServiceError::Config("GitHub API base cannot be a base URL".into()))?;
            segments.pop_if_empty().push("repos");
            segments.extend(repo.split('/').filter(|s| !s.is_empty()));
            for part in extra {
                segments.extend(part.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, what, response.headers()));
        }
        Ok(response.json::<T>().await?)
    }

    /// Fetches repository metadata
    pub async fn get_repository(&self, repo: &str) -> Result<Repository> {
        let url = self.repo_url(repo, &[])?;
        self.get_json(url, &format!("repository {}", repo)).await
    }

    /// Lists a directory; `""` is the root
    pub async fn get_contents(&self, repo: &str, path: &str) -> Result<Vec<ContentItem>> {
        let url = self.repo_url(repo, &["contents", path])?;
        match self.get_json(url, &format!("{}/{}", repo, path)).await? {
            ContentsResponse::Listing(items) => Ok(items),
            ContentsResponse::Single(item) => Ok(vec![*item]),
        }
    }

    /// Downloads a file's bytes, decoding the base64 body or following
    /// `download_url` when the API omits the content (large files)
    pub async fn get_file(&self, repo: &str, path: &str) -> Result<Vec<u8>> {
        let url = self.repo_url(repo, &["contents", path])?;
        let item: ContentItem = self.get_json(url, &format!("{}/{}", repo, path)).await?;

        match (item.encoding.as_deref(), item.content.as_deref()) {
            (Some("base64"), Some(content)) => decode_base64(content),
            _ => {
                let download = item.download_url.ok_or_else(|| {
                    ServiceError::Decode(format!("{} has no content and no download URL", path))
                })?;
                self.download(&download, path).await
            }
        }
    }

    async fn download(&self, url: &str, path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, path, response.headers()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn decode_base64(content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| ServiceError::Decode(e.to_string()))
}

fn status_error(status: StatusCode, what: &str, headers: &HeaderMap) -> ServiceError {
    let rate_limited = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "0")
        .unwrap_or(false);

    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(what.to_string()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS if rate_limited => {
            warn!("GitHub rate limit exhausted while fetching {}", what);
            ServiceError::GitHubApi(format!("Rate limit exceeded fetching {}", what))
        }
        _ => ServiceError::GitHubApi(format!("Fetching {} failed: HTTP {}", what, status)),
    }
}

#[async_trait]
impl RepoSource for GitHubClient {
    async fn resolve(&self, repo: &str) -> Result<RepoInfo> {
        let repository = self.get_repository(repo).await?;
        Ok(RepoInfo {
            full_name: repository.full_name,
            default_branch: repository.default_branch,
        })
    }

    async fn list_dir(&self, repo: &str, path: &str) -> Result<Vec<ContentEntry>> {
        let items = self.get_contents(repo, path).await?;
        Ok(items.into_iter().map(ContentEntry::from).collect())
    }

    async fn read_file(&self, repo: &str, entry: &ContentEntry) -> Result<Vec<u8>> {
        self.get_file(repo, &entry.path).await
    }
}
