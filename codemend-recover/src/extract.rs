//! Structural JSON extraction from raw model output.
//!
//! Models wrap valid JSON in prose or code fences, or emit several bracketed
//! fragments (an example inside a string, a short aside). The extractor picks
//! the most plausible payload in three stages: strict parse, longest balanced
//! fragment, fenced ```` ```json ```` block.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::trace;

use crate::error::{RecoverError, Result};

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```json\s*(.+?)\s*```").expect("fence pattern is valid")
});

/// Extract the most plausible JSON value from `text`.
///
/// # Errors
///
/// Returns [`RecoverError::Extraction`] carrying `text` when no strategy
/// yields parseable JSON.
pub fn extract(text: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    if let Some(fragment) = longest_balanced_fragment(text) {
        match serde_json::from_str::<Value>(fragment) {
            Ok(value) => return Ok(value),
            Err(e) => trace!("longest fragment did not parse: {e}"),
        }
    }

    if let Some(inner) = fenced_json_block(text) {
        match serde_json::from_str::<Value>(inner) {
            Ok(value) => return Ok(value),
            Err(e) => trace!("fenced json block did not parse: {e}"),
        }
    }

    Err(RecoverError::Extraction {
        raw: text.to_owned(),
    })
}

/// Longest substring whose brackets return the depth counter to zero.
///
/// `{` and `[` share one counter, as do `}` and `]`, so `{"a": 1]` counts as
/// balanced. Real malformed output mixes bracket kinds often enough that
/// strict kind matching loses more payloads than it saves. Quotes are not
/// tracked either. Closers seen at depth zero are ignored. Ties keep the
/// earliest fragment.
pub fn longest_balanced_fragment(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut start_char = 0usize;
    let mut best: Option<(&str, usize)> = None;

    for (char_idx, (byte_idx, ch)) in text.char_indices().enumerate() {
        match ch {
            '{' | '[' => {
                if depth == 0 {
                    start = byte_idx;
                    start_char = char_idx;
                }
                depth += 1;
            }
            '}' | ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let len = char_idx - start_char + 1;
                    if best.is_none_or(|(_, best_len)| len > best_len) {
                        best = Some((&text[start..byte_idx + ch.len_utf8()], len));
                    }
                }
            }
            _ => {}
        }
    }

    best.map(|(fragment, _)| fragment)
}

/// Interior of the first ```` ```json ... ``` ```` block (case-insensitive).
fn fenced_json_block(text: &str) -> Option<&str> {
    JSON_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
