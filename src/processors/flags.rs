//! Processors that count a single boolean field per conversation and
//! report one cross-department average to a single snapshot sheet.

use crate::department::Department;
use crate::extract::fields::{flag, strict_flag};
use crate::extract::{FenceStrategy, ParsedResult};
use crate::metrics::{Combine, MetricValue};
use crate::sheets::DateMatch;

use super::{Processor, SnapshotTarget};

fn flag_rate(
    parsed: &[ParsedResult],
    header: &'static str,
    label: &'static str,
    is_set: impl Fn(&ParsedResult) -> bool,
) -> Vec<MetricValue> {
    let count = parsed.iter().filter(|&p| is_set(p)).count();
    vec![MetricValue::percent(header, label, count, parsed.len(), 1)]
}

pub struct Misprescription;

impl Processor for Misprescription {
    fn prompt_type(&self) -> &'static str {
        "misprescription"
    }

    fn label(&self) -> &'static str {
        "Misprescription"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Medical mis-prescriptions"]
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
            department: Department::Doctors,
            combine: Combine::Mean,
        }
    }

    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue> {
        flag_rate(parsed, "Medical mis-prescriptions", "Misprescription", |p| {
            flag(p, "mis-prescription")
        })
    }
}

pub struct UnnecessaryClinicRec;

impl Processor for UnnecessaryClinicRec {
    fn prompt_type(&self) -> &'static str {
        "unnecessary_clinic_rec"
    }

    fn label(&self) -> &'static str {
        "Unnecessary Clinic Rec"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Unnecessary clinic recommendations"]
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
            department: Department::Doctors,
            combine: Combine::Mean,
        }
    }

    // Only a JSON `true` counts here; the prompt never answers with strings.
    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue> {
        flag_rate(
            parsed,
            "Unnecessary clinic recommendations",
            "Could Avoid Visit",
            |p| strict_flag(p, "could_avoid_visit"),
        )
    }
}

pub struct PolicyEscalation;

impl Processor for PolicyEscalation {
    fn prompt_type(&self) -> &'static str {
        "policy_escalation"
    }

    fn label(&self) -> &'static str {
        "Policy Escalation"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["Policy to cause escalation"]
    }

    fn decimals(&self) -> u32 {
        1
    }

    fn date_match(&self) -> DateMatch {
        DateMatch::Substring
    }

    fn fence(&self) -> FenceStrategy {
        FenceStrategy::LineMarkers
    }

    fn target(&self) -> SnapshotTarget {
        SnapshotTarget::Combined {
            department: Department::MvResolvers,
            combine: Combine::Mean,
        }
    }

    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue> {
        flag_rate(parsed, "Policy to cause escalation", "Policy Escalation", |p| {
            flag(p, "CustomerEscalation")
        })
    }
}
