pub mod call_request;
pub mod categorizing;
pub mod clarity_score;
pub mod flags;
pub mod legal_alignment;
pub mod sentiment;
pub mod verdicts;

use serde::Serialize;

use crate::department::Department;
use crate::extract::{extract_json, FenceStrategy, ParsedResult};
use crate::metrics::{Combine, MetricValue};
use crate::sheets::DateMatch;

/// Where a processor's figures land in the snapshot sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotTarget {
    /// Each department's figures go to that department's sheet.
    PerDepartment,
    /// One cross-department figure goes to a single department's sheet.
    Combined {
        department: Department,
        combine: Combine,
    },
}

/// An extra table written next to the summary (e.g. per-category coverage).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub name: &'static str,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A post-processor for one prompt type.
///
/// Implementors only describe how to read one row and how to tally the rows
/// that parsed; discovery, summaries and sheet writes are shared.
pub trait Processor {
    /// Prefix of the input file names, e.g. `call_request`.
    fn prompt_type(&self) -> &'static str;

    /// Human label used in summary file names, e.g. `Call Request`.
    fn label(&self) -> &'static str;

    /// Snapshot column headers this processor writes, in order.
    fn headers(&self) -> &'static [&'static str];

    fn decimals(&self) -> u32;

    fn date_match(&self) -> DateMatch;

    fn fence(&self) -> FenceStrategy {
        FenceStrategy::BraceSlice
    }

    fn target(&self) -> SnapshotTarget {
        SnapshotTarget::PerDepartment
    }

    /// Decode one `llm_output` cell. None excludes the row from every tally.
    fn parse(&self, raw: &str) -> Option<ParsedResult> {
        extract_json(raw, self.fence())
    }

    /// Compute this processor's metrics over the rows that parsed.
    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue>;

    fn breakdown(&self, _parsed: &[ParsedResult]) -> Option<Breakdown> {
        None
    }
}

/// Every processor, in the order a full run executes them.
pub fn all() -> Vec<Box<dyn Processor>> {
    vec![
        Box::new(call_request::CallRequest),
        Box::new(legal_alignment::LegalAlignment),
        Box::new(categorizing::Categorizing),
        Box::new(clarity_score::ClarityScore),
        Box::new(verdicts::ClientSuspectingAi),
        Box::new(verdicts::Threatening),
        Box::new(flags::Misprescription),
        Box::new(flags::UnnecessaryClinicRec),
        Box::new(flags::PolicyEscalation),
        Box::new(sentiment::Sentiment),
    ]
}

/// Serializable description of a processor, for `snapm list`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorInfo {
    pub prompt_type: &'static str,
    pub label: &'static str,
    pub headers: &'static [&'static str],
    pub decimals: u32,
    pub date_match: DateMatch,
    pub target: SnapshotTarget,
}

impl ProcessorInfo {
    pub fn of(p: &dyn Processor) -> Self {
        Self {
            prompt_type: p.prompt_type(),
            label: p.label(),
            headers: p.headers(),
            decimals: p.decimals(),
            date_match: p.date_match(),
            target: p.target(),
        }
    }
}

/// Look a processor up by prompt type (`call-request` and `call_request` both work).
pub fn by_name(name: &str) -> Option<Box<dyn Processor>> {
    let wanted = name.trim().to_lowercase().replace('-', "_");
    all().into_iter().find(|p| p.prompt_type() == wanted)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_names_are_unique() {
        let names: Vec<_> = all().iter().map(|p| p.prompt_type()).collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("call-request").unwrap().prompt_type(), "call_request");
        assert_eq!(by_name("SENTIMENT").unwrap().prompt_type(), "sentiment");
        assert!(by_name("ftr").is_none());
    }

    #[test]
    fn test_aggregate_headers_match_declared_headers() {
        for p in all() {
            let metrics = p.aggregate(&[]);
            let headers: Vec<_> = metrics.iter().map(|m| m.header).collect();
            assert_eq!(headers, p.headers(), "{}", p.prompt_type());
            assert!(metrics.iter().all(|m| m.value == 0.0));
            assert!(metrics.iter().all(|m| m.decimals == p.decimals()));
        }
    }
}
