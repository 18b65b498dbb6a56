use serde_json::Value;
use std::collections::BTreeMap;

use crate::extract::fields::text;
use crate::extract::{FenceStrategy, ParsedResult};
use crate::metrics::{percentage, MetricValue};
use crate::sheets::DateMatch;

use super::{Breakdown, Processor};

const SKIPPED_CATEGORIES: [&str; 3] = ["", "N/A", "Parse_Error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handling {
    Bot,
    Intervention,
    Transfer,
    Other,
}

fn handling(p: &ParsedResult) -> Handling {
    let raw = text(p, "InterventionOrTransfer");
    let lower = raw.to_lowercase();
    match lower.as_str() {
        "intervention" => Handling::Intervention,
        "transfer" => Handling::Transfer,
        "" | "n/a" => Handling::Bot,
        _ => Handling::Other,
    }
}

fn categories(p: &ParsedResult) -> Vec<String> {
    let name_of = |v: &Value| {
        v.get("CategoryName")
            .and_then(|n| n.as_str())
            .map(|s| s.trim().to_string())
    };
    let names: Vec<String> = match p.get("Categories") {
        Some(Value::Array(items)) => items.iter().filter_map(name_of).collect(),
        Some(obj @ Value::Object(_)) => name_of(obj).into_iter().collect(),
        _ => Vec::new(),
    };
    names
        .into_iter()
        .filter(|n| !SKIPPED_CATEGORIES.contains(&n.as_str()))
        .collect()
}

/// Chat categories and whether the bot, an agent, or a transfer handled them.
pub struct Categorizing;

impl Processor for Categorizing {
    fn prompt_type(&self) -> &'static str {
        "categorizing"
    }

    fn label(&self) -> &'static str {
        "Categorizing"
    }

    fn headers(&self) -> &'static [&'static str] {
        &["% Intervention", "% Transfer", "% Not Handled"]
    }

    fn decimals(&self) -> u32 {
        2
    }

    fn date_match(&self) -> DateMatch {
        DateMatch::Exact
    }

    fn fence(&self) -> FenceStrategy {
        FenceStrategy::LineMarkers
    }

    fn aggregate(&self, parsed: &[ParsedResult]) -> Vec<MetricValue> {
        let total = parsed.len();
        let interventions = parsed
            .iter()
            .filter(|p| handling(p) == Handling::Intervention)
            .count();
        let transfers = parsed
            .iter()
            .filter(|p| handling(p) == Handling::Transfer)
            .count();

        let intervention = MetricValue::percent("% Intervention", "Intervention", interventions, total, 2);
        let transfer = MetricValue::percent("% Transfer", "Transfer", transfers, total, 2);
        let not_handled = MetricValue::compound("% Not Handled", "All Chats Not Handled", &intervention, &transfer);

        vec![intervention, transfer, not_handled]
    }

    /// Per-category table. `Category %` is against every chat; the other three
    /// rates are against the chats in that category.
    fn breakdown(&self, parsed: &[ParsedResult]) -> Option<Breakdown> {
        let total = parsed.len();

        #[derive(Default)]
        struct Counts {
            chats: usize,
            bot: usize,
            intervention: usize,
            transfer: usize,
        }

        let mut by_category: BTreeMap<String, Counts> = BTreeMap::new();
        for p in parsed {
            let h = handling(p);
            let mut seen = Vec::new();
            for name in categories(p) {
                // A chat listing the same category twice still counts once.
                if seen.contains(&name) {
                    continue;
                }
                let c = by_category.entry(name.clone()).or_default();
                c.chats += 1;
                match h {
                    Handling::Bot => c.bot += 1,
                    Handling::Intervention => c.intervention += 1,
                    Handling::Transfer => c.transfer += 1,
                    Handling::Other => {}
                }
                seen.push(name);
            }
        }

        if by_category.is_empty() {
            return None;
        }

        let mut entries: Vec<(String, Counts)> = by_category.into_iter().collect();
        entries.sort_by(|a, b| b.1.chats.cmp(&a.1.chats).then_with(|| a.0.cmp(&b.0)));

        let pct = |v: f64| format!("{v:.2}%");
        let rows = entries
            .into_iter()
            .map(|(name, c)| {
                vec![
                    name,
                    c.chats.to_string(),
                    pct(percentage(c.chats, total, 2)),
                    pct(percentage(c.bot, c.chats, 2)),
                    pct(percentage(c.intervention, c.chats, 2)),
                    pct(percentage(c.transfer, c.chats, 2)),
                ]
            })
            .collect();

        Some(Breakdown {
            name: "Categories",
            headers: [
                "Category",
                "Count",
                "Category %",
                "Coverage Per Category %",
                "Intervention By Agent %",
                "Transferred by Bot %",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            rows,
        })
    }
}
