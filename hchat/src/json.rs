//! Locating a JSON object inside free-form model output.
//!
//! ```rust
//! use hchat::extract_json_object;
//!
//! let text = "\u{feff}Here you go:\n```json\n{\"a\": \"}\", \"b\": {\"c\": 1}}\n```";
//! assert_eq!(extract_json_object(text), Some("{\"a\": \"}\", \"b\": {\"c\": 1}}"));
//! assert_eq!(extract_json_object("no object here"), None);
//! ```

/// Returns the first balanced `{...}` span of `text`.
///
/// Braces inside JSON strings are ignored, so prose, a byte-order mark or
/// markdown fences around the object do not matter. An opening brace that
/// is never closed yields `None`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = text.trim_start_matches('\u{feff}');
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
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
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// First `limit` characters of `text`, for error messages.
pub(crate) fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
