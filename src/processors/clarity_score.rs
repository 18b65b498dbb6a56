use crate::department::Department;
use crate::extract::fields::integer;
use crate::extract::{FenceStrategy, ParsedResult};
use crate::metrics::{CellFormat, Combine, MetricValue};
use crate::sheets::DateMatch;

use super::{Processor, SnapshotTarget};

/// Share of customer messages that were requests for clarification.
///
/// Unlike the per-conversation processors this is a message-weighted ratio,
/// and the cross-department figure pools messages before dividing.
pub struct ClarityScore;

impl Processor for ClarityScore {
    fn prompt_type(&self) -> &'static str {
        "clarity_score"
    }

    fn label(&self) -> &'static str {
        "Clarity Score"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Clarity Score"]
    }

    fn decimals(&self) -> u32 {
        1
    }

    fn date_match(&self) -> DateMatch {
        DateMatch::Exact
    }

    fn fence(&self) -> FenceStrategy {
        FenceStrategy::LineMarkers
    }

    fn target(&self) -> SnapshotTarget {
        SnapshotTarget::Combined {
            department: Department::MvResolvers,
            combine: Combine::Pooled,
        }
    }

    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue> {
        let mut messages = 0i64;
        let mut clarifications = 0i64;

        for p in parsed {
            let (Some(total), Some(asked)) = (integer(p, "Total"), integer(p, "ClarificationMessages"))
            else {
                continue;
            };
            if total > 0 {
                messages += total;
                clarifications += asked;
            }
        }

        vec![MetricValue::ratio(
            "Clarity Score",
            "Clarification Percentage",
            clarifications as f64,
            messages as f64,
            100.0,
            1,
            CellFormat::Percent,
        )]
    }
}
