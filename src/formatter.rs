//! Flattens [`RepoData`] into the text document sent to the generation service.

use crate::fetcher::RepoData;

const STRUCTURE_HEADER: &str = "Directory Structure:";
const FILES_HEADER: &str = "File Contents:";

/// Renders the listing block followed by one delimited block per stored file
pub fn format_repo_data(repo_data: &RepoData) -> String {
    let mut output = String::new();
    output.push_str(STRUCTURE_HEADER);
    output.push('\n');
    output.push_str(&structure_listing(repo_data));
    output.push_str("\n\n");
    output.push_str(FILES_HEADER);
    output.push('\n');
    for (path, content) in &repo_data.files {
        output.push_str(&format!("--- {} ---\n{}\n", path, content));
    }
    output
}

/// Paths of `structure`, one per line
pub fn structure_listing(repo_data: &RepoData) -> String {
    repo_data.structure.join("\n")
}

/// Reads the listing block of a formatted document back into paths
pub fn parse_structure(formatted: &str) -> Vec<String> {
    let Some(rest) = formatted.strip_prefix(STRUCTURE_HEADER) else {
        return Vec::new();
    };
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let marker = format!("\n\n{}\n", FILES_HEADER);
    let listing = match rest.find(&marker) {
        Some(end) => &rest[..end],
        None => rest,
    };
    if listing.is_empty() {
        return Vec::new();
    }
    listing.split('\n').map(str::to_string).collect()
}

/// Rough token count: number of whitespace-separated words
pub fn estimate_tokens(formatted: &str) -> usize {
    formatted.split_whitespace().count()
}
