use std::sync::LazyLock;

use regex::Regex;

/// Instructions for the failure classifier
pub const FILTER_FAILURES_TEMPLATE: &str = include_str!("../prompts/filter_failures.md");

/// Instructions for the summarizer
pub const SUMMARIZE_TEMPLATE: &str = include_str!("../prompts/summarize.md");

static JSON_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("json block pattern is valid")
});

/// Append a serialized payload to a prompt template
pub fn build_prompt(template: &str, payload: &str) -> String {
    format!("{}\n\n\n{}", template, payload)
}

/// Pull the first fenced ```json object out of a model reply.
///
/// A reply that is itself a bare JSON object is returned as-is.
pub fn extract_json_block(reply: &str) -> Option<&str> {
    if let Some(caps) = JSON_BLOCK.captures(reply) {
        return caps.get(1).map(|m| m.as_str());
    }
    let trimmed = reply.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }
    None
}
