use crate::fetcher::RepoData;

/// Case-insensitive keyword scan over stored file contents.
///
/// Returns `"<path>: Line <n>: <trimmed line>"` for every matching line, files
/// in insertion order, lines in order. Only the stored (truncated) content is
/// searched.
pub fn search(repo_data: &RepoData, keyword: &str) -> Vec<String> {
    let needle = keyword.to_lowercase();
    let mut results = Vec::new();
    for (path, content) in &repo_data.files {
        if !content.to_lowercase().contains(&needle) {
            continue;
        }
        for (index, line) in content.split('\n').enumerate() {
            if line.to_lowercase().contains(&needle) {
                results.push(format!("{}: Line {}: {}", path, index + 1, line.trim()));
            }
        }
    }
    results
}
