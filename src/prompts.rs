/// Query asking for an overview of the repository
pub const SUMMARY_QUERY: &str = "Provide a concise summary of this repository's purpose and key files based on the provided data.";

/// Query asking for concrete improvements
pub const SUGGESTION_QUERY: &str = "Analyze the code in this repo data and suggest 2-3 specific improvements, additions, or fixes (e.g., add error handling, optimize a function, add documentation). Include file names where applicable.";

/// Builds the single-turn prompt sent to the generation service
pub fn build_prompt(formatted_data: &str, query: &str, conversation_history: &str) -> String {
    format!(
        "Repo Data:\n{}\n\nConversation History:\n{}\n\nQuery: {}",
        formatted_data, conversation_history, query
    )
}
