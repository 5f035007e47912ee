use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use talktocode::fetcher::{ContentEntry, EntryKind, RepoInfo};
use talktocode::{RepoSource, Result, ServiceError};

/// Repository tree held in memory; listings keep insertion order
#[derive(Debug, Default)]
pub struct InMemorySource {
    full_name: String,
    dirs: HashMap<String, Vec<ContentEntry>>,
    files: HashMap<String, Vec<u8>>,
    failing_dirs: HashSet<String>,
    failing_files: HashSet<String>,
    unresolvable: bool,
    listings: AtomicUsize,
}

impl InMemorySource {
    pub fn new(full_name: &str) -> Self {
        let mut dirs = HashMap::new();
        dirs.insert(String::new(), Vec::new());
        Self {
            full_name: full_name.to_string(),
            dirs,
            ..Self::default()
        }
    }

    /// Adds a file, creating its parent directories on the way
    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        let parent = self.ensure_parents(path);
        let name = path.rsplit('/').next().unwrap_or(path);
        self.add_entry(&parent, ContentEntry::file(name, path));
        self.files.insert(path.to_string(), content.into());
        self
    }

    pub fn with_failing_file(mut self, path: &str) -> Self {
        self = self.with_file(path, Vec::new());
        self.failing_files.insert(path.to_string());
        self
    }

    /// `""` is the root
    pub fn with_failing_dir(mut self, path: &str) -> Self {
        self.failing_dirs.insert(path.to_string());
        self
    }

    pub fn unresolvable(mut self) -> Self {
        self.unresolvable = true;
        self
    }

    /// Number of `list_dir` calls served so far
    pub fn listing_count(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    fn ensure_parents(&mut self, path: &str) -> String {
        let mut parent = String::new();
        let segments: Vec<&str> = path.split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            let dir_path = if parent.is_empty() {
                segment.to_string()
            } else {
                format!("{}/{}", parent, segment)
            };
            self.add_entry(&parent, ContentEntry::dir(segment, &dir_path));
            self.dirs.entry(dir_path.clone()).or_default();
            parent = dir_path;
        }
        parent
    }

    fn add_entry(&mut self, parent: &str, entry: ContentEntry) {
        let listing = self.dirs.entry(parent.to_string()).or_default();
        if !listing.iter().any(|e| e.name == entry.name) {
            listing.push(entry);
        }
    }
}

#[async_trait]
impl RepoSource for InMemorySource {
    async fn resolve(&self, repo: &str) -> Result<RepoInfo> {
        if self.unresolvable {
            return Err(ServiceError::NotFound(format!("repository {}", repo)));
        }
        Ok(RepoInfo {
            full_name: self.full_name.clone(),
            default_branch: Some("main".to_string()),
        })
    }

    async fn list_dir(&self, _repo: &str, path: &str) -> Result<Vec<ContentEntry>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        if self.failing_dirs.contains(path) {
            return Err(ServiceError::GitHubApi(format!("Listing {} failed: HTTP 500", path)));
        }
        self.dirs
            .get(path)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(path.to_string()))
    }

    async fn read_file(&self, _repo: &str, entry: &ContentEntry) -> Result<Vec<u8>> {
        if entry.kind != EntryKind::File || self.failing_files.contains(&entry.path) {
            return Err(ServiceError::GitHubApi(format!(
                "Downloading {} failed: HTTP 500",
                entry.path
            )));
        }
        self.files
            .get(&entry.path)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(entry.path.clone()))
    }
}
