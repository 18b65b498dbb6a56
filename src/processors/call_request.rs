use crate::extract::fields::{flag, text_any};
use crate::extract::{FenceStrategy, ParsedResult};
use crate::metrics::MetricValue;
use crate::sheets::DateMatch;

use super::Processor;

const REBUTTAL_KEYS: [&str; 2] = ["CallRequestRebuttalResult", "CallRequestRebutalResult"];

/// Customers asking for a phone call, and how many of those were lost.
pub struct CallRequest;

impl Processor for CallRequest {
    fn prompt_type(&self) -> &'static str {
        "call_request"
    }

    fn label(&self) -> &'static str {
        "Call Request"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Call Request", "Rebuttal Result"]
    }

    fn decimals(&self) -> u32 {
        2
    }

    fn date_match(&self) -> DateMatch {
        DateMatch::Substring
    }

    fn fence(&self) -> FenceStrategy {
        FenceStrategy::BraceSlice
    }

    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue> {
        let total = parsed.len();
        let mut requested = 0usize;
        let mut not_retained = 0usize;

        for p in parsed {
            if !flag(p, "CallRequested") {
                continue;
            }
            requested += 1;
            if text_any(p, &REBUTTAL_KEYS) == "NoRetention" {
                not_retained += 1;
            }
        }

        // Both rates are against every valid conversation, not just requests.
        vec![
            MetricValue::percent("Call Request", "Call Request Rate", requested, total, 2),
            MetricValue::percent("Rebuttal Result", "Rebuttal Result Rate", not_retained, total, 2),
        ]
    }
}
