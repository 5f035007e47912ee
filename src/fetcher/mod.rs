//! Bounded repository tree traversal.
//!
//! The walk is depth-first and fetches one directory listing at a time from a
//! [`RepoSource`]. Counters live in an explicit [`TraversalState`] and pending
//! directories in an explicit work-list, so the order of `structure` matches a
//! recursive walk exactly.

mod source;

pub use source::{ContentEntry, EntryKind, RepoInfo, RepoSource};

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::vec;
use tracing::{debug, info, warn};

const KNOWN_HOST_PREFIXES: &[&str] = &[
    "https://github.com/",
    "http://github.com/",
    "https://www.github.com/",
    "http://www.github.com/",
    "github.com/",
];

/// Result of a fetch: the traversal order of recorded paths and the stored contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoData {
    /// Every recorded path, directories included, in traversal order
    pub structure: Vec<String>,
    /// Stored (truncated) content per file path, in insertion order
    pub files: IndexMap<String, String>,
}

impl RepoData {
    /// Creates an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files with stored content
    pub fn files_analyzed(&self) -> usize {
        self.files.len()
    }
}

/// File-count and byte-size ceiling for one traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchBudget {
    /// Maximum number of files whose content is stored
    pub max_files: usize,
    /// Maximum cumulative size of stored files, in bytes
    pub max_bytes: usize,
    /// Characters kept per stored file
    pub preview_chars: usize,
}

impl Default for FetchBudget {
    fn default() -> Self {
        Self {
            max_files: 50,
            max_bytes: 50 * 1024,
            preview_chars: 500,
        }
    }
}

impl FetchBudget {
    /// Budget with a custom file cap and default byte limits
    pub fn with_max_files(max_files: usize) -> Self {
        Self {
            max_files,
            ..Self::default()
        }
    }
}

/// Case-insensitive substrings that suppress matching paths entirely
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl ExclusionSet {
    /// Builds the set, lowercasing patterns and dropping empty ones
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lowered: Vec<String> = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().to_lowercase();
            if !pattern.is_empty() && !lowered.contains(&pattern) {
                lowered.push(pattern);
            }
        }
        Self { patterns: lowered }
    }

    /// True if the lowercased path contains any pattern
    pub fn matches(&self, path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let lowered = path.to_lowercase();
        self.patterns.iter().any(|p| lowered.contains(p.as_str()))
    }

    /// Number of distinct patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if no pattern is configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Counters reported once a traversal finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    /// Files whose content was stored
    pub files_stored: usize,
    /// Sum of the decoded sizes of stored files
    pub bytes_stored: usize,
    /// Directory listings fetched, root included
    pub directories_visited: usize,
    /// Directory listings that failed and were skipped
    pub directory_errors: usize,
    /// Files whose download failed and were recorded as an error string
    pub file_errors: usize,
    /// Whether the walk stopped early on the budget
    pub halted: bool,
}

/// Strips a GitHub host prefix and surrounding slashes from a repository URL.
///
/// `https://github.com/owner/name/` becomes `owner/name`. Anything else is
/// passed through trimmed; no further validation happens here.
pub fn normalize_repo_identifier(repo_url: &str) -> String {
    let trimmed = repo_url.trim();
    let without_host = KNOWN_HOST_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    let repo = without_host.trim_matches('/');
    repo.strip_suffix(".git").unwrap_or(repo).to_string()
}

/// Returns at most `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Accumulator threaded through one traversal
struct TraversalState {
    budget: FetchBudget,
    data: RepoData,
    stats: FetchStats,
}

impl TraversalState {
    fn new(budget: FetchBudget) -> Self {
        Self {
            budget,
            data: RepoData::new(),
            stats: FetchStats::default(),
        }
    }

    /// Global stop condition, checked before entering a directory
    fn exhausted(&self) -> bool {
        self.stats.files_stored >= self.budget.max_files
            || self.stats.bytes_stored > self.budget.max_bytes
    }

    fn has_room_for(&self, size: usize) -> bool {
        self.stats.files_stored < self.budget.max_files
            && self.stats.bytes_stored + size <= self.budget.max_bytes
    }

    fn store(&mut self, path: String, text: &str, size: usize) {
        let preview = truncate_chars(text, self.budget.preview_chars).to_string();
        self.data.files.insert(path, preview);
        self.stats.files_stored += 1;
        self.stats.bytes_stored += size;
    }

    fn store_error(&mut self, path: String, message: String) {
        let message = truncate_chars(&message, self.budget.preview_chars).to_string();
        self.data.files.insert(path, message);
        self.stats.file_errors += 1;
    }
}

/// Pending entries of one listed directory
struct Frame {
    path: String,
    entries: vec::IntoIter<ContentEntry>,
}

/// Walks a repository through a [`RepoSource`] under a [`FetchBudget`]
#[derive(Clone)]
pub struct RepoFetcher {
    source: Arc<dyn RepoSource>,
}

impl RepoFetcher {
    /// Creates a fetcher over the given source
    pub fn new(source: Arc<dyn RepoSource>) -> Self {
        Self { source }
    }

    /// Fetches the tree of `repo` (an `owner/name` identifier).
    ///
    /// Resolution or root listing failures abort the whole fetch; failures
    /// below the root are logged and skipped.
    pub async fn fetch(
        &self,
        repo: &str,
        budget: &FetchBudget,
        exclusions: &ExclusionSet,
    ) -> Result<RepoData> {
        let (data, stats) = self.fetch_with_stats(repo, budget, exclusions).await?;
        info!(
            "Finished fetching repo data. Files: {}, Total Size: {} bytes",
            stats.files_stored, stats.bytes_stored
        );
        Ok(data)
    }

    /// Same as [`RepoFetcher::fetch`], also returning traversal counters
    pub async fn fetch_with_stats(
        &self,
        repo: &str,
        budget: &FetchBudget,
        exclusions: &ExclusionSet,
    ) -> Result<(RepoData, FetchStats)> {
        let info = self.source.resolve(repo).await?;
        info!("Fetched repo: {}", info.full_name);

        let root = self.source.list_dir(repo, "").await?;
        let mut state = TraversalState::new(*budget);
        state.stats.directories_visited = 1;

        let mut work: Vec<Frame> = vec![Frame {
            path: String::new(),
            entries: root.into_iter(),
        }];

        while let Some(frame) = work.last_mut() {
            let Some(entry) = frame.entries.next() else {
                work.pop();
                continue;
            };
            let path = join_path(&frame.path, &entry.name);

            if exclusions.matches(&path) {
                debug!("Skipping excluded path: {}", path);
                continue;
            }
            state.data.structure.push(path.clone());

            match entry.kind {
                EntryKind::File => self.capture_file(repo, &entry, path, &mut state).await,
                EntryKind::Dir => {
                    if state.exhausted() {
                        info!(
                            "Hit max file limit ({}) or size limit ({} bytes), stopping traversal",
                            state.budget.max_files, state.budget.max_bytes
                        );
                        state.stats.halted = true;
                        break;
                    }
                    match self.source.list_dir(repo, &entry.path).await {
                        Ok(entries) => {
                            state.stats.directories_visited += 1;
                            work.push(Frame {
                                path,
                                entries: entries.into_iter(),
                            });
                        }
                        Err(e) => {
                            warn!("Error in {}: {}", path, e);
                            state.stats.directory_errors += 1;
                        }
                    }
                }
                EntryKind::Symlink | EntryKind::Submodule | EntryKind::Other => {
                    debug!("Recording {} without content ({:?})", path, entry.kind);
                }
            }
        }

        Ok((state.data, state.stats))
    }

    async fn capture_file(
        &self,
        repo: &str,
        entry: &ContentEntry,
        path: String,
        state: &mut TraversalState,
    ) {
        if state.stats.files_stored >= state.budget.max_files {
            debug!("Skipping {} - file limit reached", path);
            return;
        }

        match self.source.read_file(repo, entry).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let size = text.len();
                if state.has_room_for(size) {
                    state.store(path, &text, size);
                    debug!(
                        "Added file {}: {} (Size: {} bytes)",
                        state.stats.files_stored,
                        entry.path,
                        size
                    );
                } else {
                    debug!("Skipping {} - size or limit exceeded", path);
                }
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path, e);
                state.store_error(path, format!("Error: {}", e));
            }
        }
    }
}
