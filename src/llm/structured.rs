//! Structured-output parsing helpers.
//!
//! Models running in JSON mode usually return a bare object, but some wrap it
//! in prose or a fenced code block. [`parse_json_reply`] accepts both and only
//! fails when no parseable object can be found.

use crate::types::{AppError, Result};
use serde::de::DeserializeOwned;

/// Parse a JSON-mode reply into `T`.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    let candidate = extract_json_object(trimmed).ok_or_else(|| {
        AppError::MalformedResponse(format!(
            "expected a JSON object, got: {}",
            preview(trimmed)
        ))
    })?;

    serde_json::from_str::<T>(candidate).map_err(|e| {
        AppError::MalformedResponse(format!("{} in reply: {}", e, preview(trimmed)))
    })
}

/// Return the first balanced `{...}` object in `text`, honoring string
/// literals and escapes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    if text.chars().count() > MAX {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Query {
        query: String,
    }

    #[test]
    fn test_parse_bare_object() {
        let parsed: Query = parse_json_reply(r#"{"query": "rust async"}"#).unwrap();
        assert_eq!(parsed.query, "rust async");
    }

    #[test]
    fn test_parse_fenced_object() {
        let raw = "Here you go:\n```json\n{\"query\": \"a {braced} \\\"term\\\"\"}\n```";
        let parsed: Query = parse_json_reply(raw).unwrap();
        assert_eq!(parsed.query, "a {braced} \"term\"");
    }

    #[test]
    fn test_unparseable_is_malformed() {
        let result: Result<Query> = parse_json_reply("no json here");
        assert!(matches!(result, Err(AppError::MalformedResponse(_))));

        let result: Result<Query> = parse_json_reply("{\"query\": ");
        assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    }

    #[test]
    fn test_extract_handles_multibyte_text() {
        let raw = "résumé → {\"query\": \"café\"} trailing";
        assert_eq!(extract_json_object(raw), Some("{\"query\": \"café\"}"));
    }
}
