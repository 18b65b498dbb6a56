//! Local summary CSVs, written for every department regardless of sheet access.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::metrics::MetricValue;
use crate::processors::Breakdown;

/// Owner name used for cross-department summaries.
pub const OVERALL: &str = "Overall";

/// `{outputs}/{prompt_type}/{YYYY-MM-DD}`
pub fn summary_dir(outputs: &Path, prompt_type: &str, date: NaiveDate) -> PathBuf {
    outputs
        .join(prompt_type)
        .join(date.format("%Y-%m-%d").to_string())
}

/// `CC Sales` + `Call Request` + `Summary` → `CC Sales_Call_Request_Summary.csv`
pub fn file_name(owner: &str, label: &str, kind: &str) -> String {
    format!("{}_{}_{}.csv", owner, label.replace(' ', "_"), kind)
}

fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// One-row summary: Department, one column per metric, Valid Rows, Date.
pub fn write_summary(
    dir: &Path,
    owner: &str,
    label: &str,
    metrics: &[MetricValue],
    valid_rows: usize,
    date: NaiveDate,
) -> Result<PathBuf> {
    let mut header = vec!["Department".to_string()];
    header.extend(metrics.iter().map(|m| m.summary_column()));
    header.push("Valid Rows".to_string());
    header.push("Date".to_string());

    let mut row = vec![owner.to_string()];
    row.extend(metrics.iter().map(|m| format!("{:.*}", m.decimals as usize, m.value)));
    row.push(valid_rows.to_string());
    row.push(date.format("%Y-%m-%d").to_string());

    let path = dir.join(file_name(owner, label, "Summary"));
    write_rows(&path, &[header, row])?;
    info!("Saved summary to {}", path.display());
    Ok(path)
}

pub fn write_breakdown(dir: &Path, owner: &str, label: &str, breakdown: &Breakdown) -> Result<PathBuf> {
    let mut rows = Vec::with_capacity(breakdown.rows.len() + 1);
    rows.push(breakdown.headers.clone());
    rows.extend(breakdown.rows.iter().cloned());

    let path = dir.join(file_name(owner, label, "Breakdown"));
    write_rows(&path, &rows)?;
    info!("Saved {} breakdown to {}", breakdown.name, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CellFormat;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 5).unwrap()
    }

    #[test]
    fn test_summary_paths() {
        let dir = summary_dir(Path::new("outputs"), "call_request", date());
        assert_eq!(dir, Path::new("outputs/call_request/2025-08-05"));
        assert_eq!(
            file_name("CC Sales", "Call Request", "Summary"),
            "CC Sales_Call_Request_Summary.csv"
        );
    }

    #[test]
    fn test_write_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = summary_dir(tmp.path(), "call_request", date());
        let metrics = vec![
            MetricValue::percent("Call Request", "Call Request Rate", 2, 3, 2),
            MetricValue::ratio("Sentiment Analysis", "Weighted NPS", 5.0, 2.0, 1.0, 2, CellFormat::Number),
        ];

        let path = write_summary(&dir, "CC Sales", "Call Request", &metrics, 3, date()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Department,Call Request Rate (%),Weighted NPS,Valid Rows,Date");
        assert_eq!(lines[1], "CC Sales,66.67,2.50,3,2025-08-05");
    }

    #[test]
    fn test_write_breakdown() {
        let tmp = tempfile::tempdir().unwrap();
        let breakdown = Breakdown {
            name: "category",
            headers: vec!["Category".into(), "Count".into()],
            rows: vec![vec!["Billing".into(), "2".into()]],
        };
        let path = write_breakdown(tmp.path(), OVERALL, "Categorizing", &breakdown).unwrap();
        assert!(path.ends_with("Overall_Categorizing_Breakdown.csv"));
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "Category,Count\nBilling,2\n");
    }
}
