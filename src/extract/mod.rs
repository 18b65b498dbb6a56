pub mod fields;
pub mod verdict;

use serde_json::{Map, Value};
use tracing::warn;

pub use verdict::parse_verdict;

/// One decoded `llm_output` cell: always a flat JSON object.
pub type ParsedResult = Map<String, Value>;

const FENCE: &str = "```";
const PREVIEW_CHARS: usize = 100;

/// How a fenced ```` ```json ... ``` ```` block is unwrapped before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStrategy {
    /// Keep everything between the first `{` and the last `}`.
    BraceSlice,
    /// Drop the opening and closing fence lines.
    LineMarkers,
}

/// Decode the JSON object inside an LLM output cell.
///
/// Returns None for empty/NaN cells and for anything that still fails to
/// decode after whitespace has been collapsed. Failures are logged with a
/// short preview; they never propagate.
pub fn extract_json(raw: &str, strategy: FenceStrategy) -> Option<ParsedResult> {
    let trimmed = raw.trim();
    if is_blank(trimmed) {
        return None;
    }

    let body = if is_fenced(trimmed) {
        unfence(trimmed, strategy)
    } else {
        trimmed
    };

    match decode_object(body) {
        Some(obj) => Some(obj),
        None => {
            let collapsed = collapse_whitespace(body);
            let retried = decode_object(&collapsed);
            if retried.is_none() {
                warn!("Failed to parse JSON: {}...", preview(body));
            }
            retried
        }
    }
}

/// True for cells that carry no output at all.
pub fn is_blank(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case("nan")
}

fn is_fenced(s: &str) -> bool {
    s.len() >= 2 * FENCE.len() && s.starts_with(FENCE) && s.ends_with(FENCE)
}

fn unfence(s: &str, strategy: FenceStrategy) -> &str {
    match strategy {
        FenceStrategy::BraceSlice => match (s.find('{'), s.rfind('}')) {
            (Some(start), Some(end)) if end > start => s[start..=end].trim(),
            _ => s,
        },
        FenceStrategy::LineMarkers => {
            let lines: Vec<&str> = s.lines().collect();
            if lines.len() > 2 {
                let first_len = lines[0].len();
                let last_start = s.len() - lines[lines.len() - 1].len();
                // Byte offsets keep the inner slice borrowed from `s`.
                let inner_start = s[first_len..]
                    .find('\n')
                    .map(|i| first_len + i + 1)
                    .unwrap_or(first_len);
                s[inner_start.min(last_start)..last_start].trim()
            } else {
                // Single-line fence such as ```{"a":1}```
                let inner = &s[FENCE.len()..s.len() - FENCE.len()];
                let inner = inner.strip_prefix("json").unwrap_or(inner);
                inner.trim()
            }
        }
    }
}

fn decode_object(s: &str) -> Option<ParsedResult> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First 100 characters, for diagnostics.
pub(crate) fn preview(s: &str) -> String {
    s.chars().take(PREVIEW_CHARS).collect()
}
