use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of a repository tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Dir,
    /// Symbolic link
    Symlink,
    /// Git submodule
    Submodule,
    /// Anything the source does not classify
    Other,
}

impl EntryKind {
    /// Maps the `type` string used by the GitHub contents API
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "file" => Self::File,
            "dir" => Self::Dir,
            "symlink" => Self::Symlink,
            "submodule" => Self::Submodule,
            _ => Self::Other,
        }
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Entry name within its directory
    pub name: String,
    /// Remote path used to address the entry on subsequent calls
    pub path: String,
    /// File, directory, ...
    pub kind: EntryKind,
}

impl ContentEntry {
    /// Creates a file entry
    pub fn file(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
        }
    }

    /// Creates a directory entry
    pub fn dir(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::Dir,
        }
    }
}

/// Basic metadata of a resolved repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// `owner/name`
    pub full_name: String,
    /// Default branch, when known
    pub default_branch: Option<String>,
}

/// A remote repository tree that can be listed one directory at a time
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Resolves the repository, failing if it does not exist or is unreachable
    async fn resolve(&self, repo: &str) -> Result<RepoInfo>;

    /// Lists a directory; `""` is the repository root
    async fn list_dir(&self, repo: &str, path: &str) -> Result<Vec<ContentEntry>>;

    /// Downloads the raw bytes of a file entry
    async fn read_file(&self, repo: &str, entry: &ContentEntry) -> Result<Vec<u8>>;
}
