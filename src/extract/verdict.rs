use tracing::warn;

use super::{is_blank, preview};

/// Read a plain-text true/false verdict.
///
/// Exact `true`/`false` wins; otherwise the first of the two words found
/// anywhere in the text decides, with `true` checked first.
pub fn parse_verdict(raw: &str) -> Option<bool> {
    if is_blank(raw) {
        return None;
    }
    let lower = raw.trim().to_lowercase();

    match lower.as_str() {
        "true" => return Some(true),
        "false" => return Some(false),
        _ => {}
    }

    if lower.contains("true") {
        Some(true)
    } else if lower.contains("false") {
        Some(false)
    } else {
        warn!("Could not parse verdict: {}", preview(raw.trim()));
        None
    }
}
