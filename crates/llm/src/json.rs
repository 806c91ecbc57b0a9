//! Locating JSON inside free-form model output.

use serde_json::Value;

/// Best-effort extraction of a JSON object from `text`.
///
/// Tries a fenced code block, then the outermost `{...}` span, then the whole
/// text. Returns `None` when nothing parses.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Some(block) = from_codeblock(text) {
        if let Ok(value) = serde_json::from_str(&block) {
            return Some(value);
        }
    }

    if let Some(raw) = raw_object(text) {
        if let Ok(value) = serde_json::from_str(raw) {
            return Some(value);
        }
    }

    serde_json::from_str(text.trim()).ok()
}

fn from_codeblock(text: &str) -> Option<String> {
    let patterns = ["```json\n", "```JSON\n", "```\n"];

    for pattern in patterns {
        if let Some(start_idx) = text.find(pattern) {
            let json_start = start_idx + pattern.len();
            if let Some(end_idx) = text[json_start..].find("```") {
                return Some(text[json_start..json_start + end_idx].trim().to_string());
            }
        }
    }

    None
}

fn raw_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
