use crate::extract::fields::integer;
use crate::extract::{FenceStrategy, ParsedResult};
use crate::metrics::{CellFormat, MetricValue};
use crate::sheets::DateMatch;

use super::Processor;

// Weights per NPS bucket 1..=5.
const NUMERATOR_WEIGHTS: [f64; 5] = [2.0, 3.0, 3.0, 4.0, 10.0];
const DENOMINATOR_WEIGHTS: [f64; 5] = [2.0, 1.5, 1.0, 1.0, 2.0];

/// Weighted NPS over the 1-5 scores the sentiment prompt assigns.
pub struct Sentiment;

impl Processor for Sentiment {
    fn prompt_type(&self) -> &'static str {
        "sentiment"
    }

    fn label(&self) -> &'static str {
        "Sentiment Analysis"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Sentiment Analysis"]
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
        let mut buckets = [0usize; 5];
        for p in parsed {
            if let Some(score @ 1..=5) = integer(p, "NPS_score") {
                buckets[(score - 1) as usize] += 1;
            }
        }

        let weigh = |weights: &[f64; 5]| -> f64 {
            buckets
                .iter()
                .zip(weights)
                .map(|(&n, w)| n as f64 * w)
                .sum()
        };

        vec![MetricValue::ratio(
            "Sentiment Analysis",
            "Weighted NPS",
            weigh(&NUMERATOR_WEIGHTS),
            weigh(&DENOMINATOR_WEIGHTS),
            1.0,
            2,
            CellFormat::Number,
        )]
    }
}
