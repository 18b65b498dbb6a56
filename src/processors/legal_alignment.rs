use crate::extract::fields::{flag, text};
use crate::extract::{FenceStrategy, ParsedResult};
use crate::metrics::MetricValue;
use crate::sheets::DateMatch;

use super::Processor;

/// Clients questioning legality, and how many of them escalated.
pub struct LegalAlignment;

impl Processor for LegalAlignment {
    fn prompt_type(&self) -> &'static str {
        "legal_alignment"
    }

    fn label(&self) -> &'static str {
        "Legal Alignment"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Escalation Outcome", "Clients Questioning Legalties"]
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
        let mut concerned = 0usize;
        let mut escalated = 0usize;

        for p in parsed {
            if !flag(p, "LegalityConcerned") {
                continue;
            }
            concerned += 1;
            if text(p, "EscalationOutcome").eq_ignore_ascii_case("escalated") {
                escalated += 1;
            }
        }

        vec![
            MetricValue::percent("Escalation Outcome", "Escalation Rate", escalated, total, 2),
            MetricValue::percent(
                "Clients Questioning Legalties",
                "Legal Concerns",
                concerned,
                total,
                2,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::test_support::{parse_all, value_of};

    #[test]
    fn test_escalation_counts_only_concerned_rows() {
        let rows = [
            r#"{"LegalityConcerned":"true","EscalationOutcome":"Escalated"}"#,
            r#"{"LegalityConcerned":"true","EscalationOutcome":"Resolved"}"#,
            r#"{"LegalityConcerned":"false","EscalationOutcome":"escalated"}"#,
            r#"{"LegalityConcerned":"false"}"#,
        ];
        let metrics = LegalAlignment.aggregate(&parse_all(&LegalAlignment, &rows));
        assert_eq!(value_of(&metrics, "Escalation Outcome"), 25.0);
        assert_eq!(value_of(&metrics, "Clients Questioning Legalties"), 50.0);
    }
}
