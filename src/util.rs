//! Helpers for pulling structured data out of free-form model replies.

use serde::de::DeserializeOwned;

/// Extract the first balanced `{...}` block from `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not count
/// toward nesting. If the first block never closes, `None` is returned.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract the first JSON object and deserialize it.
pub fn parse_embedded_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(extract_json_object(text)?).ok()
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
