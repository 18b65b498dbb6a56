use unicode_width::UnicodeWidthStr;

use crate::pipeline::{RunOutcome, RunReport, UploadReport};
use crate::processors::{ProcessorInfo, SnapshotTarget};
use crate::sheets::DateMatch;

/// Format duration in seconds to human-readable string.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds as u64;
    let m = total / 60;
    let s = total % 60;
    if m > 0 {
        format!("{m}m{s:02}s")
    } else {
        format!("{:.1}s", seconds)
    }
}

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Left-align `s` in a column `width` cells wide.
fn pad(s: &str, width: usize) -> String {
    let s = truncate(s, width);
    let fill = width.saturating_sub(UnicodeWidthStr::width(s.as_str()));
    format!("{s}{}", " ".repeat(fill))
}

fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Success => "success",
        RunOutcome::PartialSuccess => "partial success",
        RunOutcome::NoData => "no data",
        RunOutcome::Failed => "failed",
    }
}

fn target_label(target: SnapshotTarget) -> String {
    match target {
        SnapshotTarget::PerDepartment => "per department".to_string(),
        SnapshotTarget::Combined { department, combine } => {
            format!("{department} ({combine:?})").to_lowercase()
        }
    }
}

/// Print one processor run as a table of departments.
pub fn print_run_report(report: &RunReport) {
    println!(
        "{} {}: {} ({})",
        report.prompt_type,
        report.date,
        outcome_label(report.outcome),
        format_duration(report.duration_secs)
    );
    if let Some(e) = &report.error {
        println!("  error: {e}");
    }
    if report.departments.is_empty() {
        println!();
        return;
    }

    println!(
        "  {} {:>6} {:>6} {} {}",
        pad("DEPARTMENT", 14),
        "ROWS",
        "VALID",
        pad("METRICS", 30),
        "SHEET"
    );
    println!("  {}", "-".repeat(76));

    for d in &report.departments {
        let metrics = d
            .metrics
            .iter()
            .map(|m| m.cell_text())
            .collect::<Vec<_>>()
            .join(" / ");
        let sheet = match (&d.error, &d.sheet) {
            (Some(e), _) => format!("error: {e}"),
            (None, Some(status)) => status.label(),
            (None, None) => "combined".to_string(),
        };
        println!(
            "  {} {:>6} {:>6} {} {}",
            pad(&d.name, 14),
            d.rows_read,
            d.valid_rows,
            pad(&metrics, 30),
            truncate(&sheet, 40)
        );
        if let Some(update) = &d.update {
            for column in &update.missing_columns {
                println!("    please add column \"{column}\"");
            }
        }
    }
    println!();
}

pub fn print_upload_report(report: &UploadReport) {
    println!(
        "{} {} -> tab {}: {}",
        report.prompt_type,
        report.date,
        report.tab,
        outcome_label(report.outcome)
    );
    for d in &report.departments {
        println!(
            "  {} {:>6}  {}",
            pad(d.department.display_name(), 14),
            d.rows,
            truncate(&d.sheet.label(), 50)
        );
    }
}

/// Print the processor registry.
pub fn print_processor_list(processors: &[ProcessorInfo]) {
    println!("{} processors:\n", processors.len());
    println!(
        "  {} {} {:>3} {} {}",
        pad("PROMPT TYPE", 24),
        pad("DATE", 9),
        "DP",
        pad("TARGET", 22),
        "COLUMNS"
    );
    println!("  {}", "-".repeat(90));

    for p in processors {
        let date = match p.date_match {
            DateMatch::Exact => "exact",
            DateMatch::Substring => "substring",
        };
        println!(
            "  {} {} {:>3} {} {}",
            pad(p.prompt_type, 24),
            pad(date, 9),
            p.decimals,
            pad(&target_label(p.target), 22),
            truncate(&p.headers.join(", "), 60)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::department::Department;
    use crate::metrics::Combine;

    #[test]
    fn test_truncate_respects_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Unnecessary clinic recommendations", 12), "Unnecessa...");
        assert_eq!(UnicodeWidthStr::width(truncate("日本語のテキスト", 9).as_str()), 9);
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("abcdefgh", 6), "abc...");
    }

    #[test]
    fn test_target_label() {
        let combined = SnapshotTarget::Combined {
            department: Department::MvResolvers,
            combine: Combine::Pooled,
        };
        assert_eq!(target_label(combined), "mv resolvers (pooled)");
        assert_eq!(target_label(SnapshotTarget::PerDepartment), "per department");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.34), "0.3s");
        assert_eq!(format_duration(75.0), "1m15s");
    }
}
