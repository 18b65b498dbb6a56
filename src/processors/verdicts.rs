use serde_json::Value;

use crate::extract::fields::flag;
use crate::extract::{parse_verdict, ParsedResult};
use crate::metrics::MetricValue;
use crate::sheets::DateMatch;

use super::Processor;

const VERDICT: &str = "verdict";

/// Prompts answered with a bare `True`/`False` rather than JSON.
fn verdict_row(raw: &str) -> Option<ParsedResult> {
    let v = parse_verdict(raw)?;
    let mut map = ParsedResult::new();
    map.insert(VERDICT.to_string(), Value::Bool(v));
    Some(map)
}

fn verdict_rate(
    parsed: &[ParsedResult],
    header: &'static str,
    label: &'static str,
) -> Vec<MetricValue> {
    let positive = parsed.iter().filter(|p| flag(p, VERDICT)).count();
    vec![MetricValue::percent(header, label, positive, parsed.len(), 1)]
}

pub struct ClientSuspectingAi;

impl Processor for ClientSuspectingAi {
    fn prompt_type(&self) -> &'static str {
        "client_suspecting_ai"
    }

    fn label(&self) -> &'static str {
        "Client Suspecting AI"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Clients Suspecting AI"]
    }

    fn decimals(&self) -> u32 {
        1
    }

    fn date_match(&self) -> DateMatch {
        DateMatch::Substring
    }

    fn parse(&self, raw: &str) -> Option<ParsedResult> {
        verdict_row(raw)
    }

    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue> {
        verdict_rate(parsed, "Clients Suspecting AI", "Client Suspecting AI")
    }
}

pub struct Threatening;

impl Processor for Threatening {
    fn prompt_type(&self) -> &'static str {
        "threatening"
    }

    fn label(&self) -> &'static str {
        "Threatening"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Threatening Case Identifier"]
    }

    fn decimals(&self) -> u32 {
        1
    }

    fn date_match(&self) -> DateMatch {
        DateMatch::Exact
    }

    fn parse(&self, raw: &str) -> Option<ParsedResult> {
        verdict_row(raw)
    }

    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue> {
        verdict_rate(parsed, "Threatening Case Identifier", "Threatening")
    }
}
