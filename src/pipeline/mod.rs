//! Drives one processor over one day's files: discover, parse, aggregate,
//! save summaries, then push figures into the snapshot sheets.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use crate::department::{Department, DepartmentSheets};
use crate::extract::ParsedResult;
use crate::input::{self, InputFile};
use crate::metrics::{Combine, MetricValue};
use crate::processors::{Processor, SnapshotTarget};
use crate::sheets::{SheetService, SheetUpdate, SnapshotWriter};
use crate::summary::{self, OVERALL};

/// Everything a run needs besides the processor itself.
pub struct RunContext<'a> {
    pub llm_outputs: PathBuf,
    pub outputs: PathBuf,
    pub date: NaiveDate,
    /// Snapshot tab holding the date-by-metric grid.
    pub tab: String,
    /// None runs summary-only.
    pub sheets: Option<&'a dyn SheetService>,
    pub departments: &'a DepartmentSheets,
    pub dry_run: bool,
}

impl RunContext<'_> {
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every sheet update the run attempted wrote all of its cells.
    Success,
    /// Summaries were saved but at least one sheet update was skipped or failed.
    PartialSuccess,
    /// No input files for the run date.
    NoData,
    /// Inputs could not be discovered; nothing was processed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SheetStatus {
    Written,
    Partial,
    Skipped(String),
    Failed(String),
}

impl SheetStatus {
    pub fn label(&self) -> String {
        match self {
            SheetStatus::Written => "written".to_string(),
            SheetStatus::Partial => "partial".to_string(),
            SheetStatus::Skipped(r) => format!("skipped: {r}"),
            SheetStatus::Failed(r) => format!("failed: {r}"),
        }
    }
}

/// One department's (or the combined figure's) part of a run.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentOutcome {
    /// Department display name, or `Overall` for a combined figure.
    pub name: String,
    pub rows_read: usize,
    pub valid_rows: usize,
    pub parse_failures: usize,
    pub metrics: Vec<MetricValue>,
    pub summary: Option<PathBuf>,
    /// None when this entry owns no sheet write (folded into a combined figure).
    pub sheet: Option<SheetStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<SheetUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DepartmentOutcome {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows_read: 0,
            valid_rows: 0,
            parse_failures: 0,
            metrics: Vec::new(),
            summary: None,
            sheet: None,
            update: None,
            error: None,
        }
    }

    fn is_clean(&self) -> bool {
        self.error.is_none() && matches!(self.sheet, None | Some(SheetStatus::Written))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub prompt_type: String,
    pub date: NaiveDate,
    pub outcome: RunOutcome,
    pub departments: Vec<DepartmentOutcome>,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Tally {
    rows_read: usize,
    parsed: Vec<ParsedResult>,
}

fn parse_file(processor: &dyn Processor, file: &InputFile) -> Result<Tally> {
    let rows = input::read_output_rows(&file.path)?;
    let rows_read = rows.len();
    let parsed = rows
        .iter()
        .filter_map(|row| processor.parse(&row.llm_output))
        .collect();
    Ok(Tally { rows_read, parsed })
}

/// Write `metrics` into `dept`'s snapshot sheet, honouring dry-run and missing access.
fn push_metrics(
    ctx: &RunContext,
    processor: &dyn Processor,
    dept: Department,
    metrics: &[MetricValue],
) -> (SheetStatus, Option<SheetUpdate>) {
    if ctx.dry_run {
        return (SheetStatus::Skipped("dry run".to_string()), None);
    }
    let Some(service) = ctx.sheets else {
        return (SheetStatus::Skipped("no sheets access".to_string()), None);
    };
    let Some(sheet_id) = ctx.departments.sheet_id(dept) else {
        warn!("No spreadsheet configured for {}", dept);
        return (
            SheetStatus::Skipped(format!("no spreadsheet for {}", dept.key())),
            None,
        );
    };

    let writer = SnapshotWriter::new(service, ctx.tab.as_str());
    let date = ctx.date_str();
    let update = writer.update_metrics(sheet_id, &date, processor.date_match(), metrics);

    let status = if let Some(e) = &update.error {
        SheetStatus::Failed(e.clone())
    } else if update.row.is_none() {
        SheetStatus::Skipped(format!("date {date} not in sheet"))
    } else if update.is_complete() {
        SheetStatus::Written
    } else if !update.written.is_empty() {
        SheetStatus::Partial
    } else {
        SheetStatus::Failed("no metric cells written".to_string())
    };
    (status, Some(update))
}

fn save_summaries(
    ctx: &RunContext,
    processor: &dyn Processor,
    outcome: &mut DepartmentOutcome,
    parsed: &[ParsedResult],
) {
    let dir = summary::summary_dir(&ctx.outputs, processor.prompt_type(), ctx.date);
    match summary::write_summary(
        &dir,
        &outcome.name,
        processor.label(),
        &outcome.metrics,
        outcome.valid_rows,
        ctx.date,
    ) {
        Ok(path) => outcome.summary = Some(path),
        Err(e) => {
            warn!("{:#}", e);
            outcome.error = Some(format!("{e:#}"));
        }
    }

    if let Some(breakdown) = processor.breakdown(parsed) {
        if let Err(e) = summary::write_breakdown(&dir, &outcome.name, processor.label(), &breakdown) {
            warn!("{:#}", e);
            outcome.error.get_or_insert_with(|| format!("{e:#}"));
        }
    }
}

/// Run one processor for `ctx.date`. Per-file and per-sheet failures are
/// recorded in the report; only discovery errors are returned.
pub fn run_processor(processor: &dyn Processor, ctx: &RunContext) -> Result<RunReport> {
    let start = Instant::now();
    let prompt_type = processor.prompt_type();

    let files = input::discover_inputs(&ctx.llm_outputs, prompt_type, ctx.date)?;
    if files.is_empty() {
        eprintln!("{}: no input files for {}", prompt_type, ctx.date_str());
        return Ok(RunReport {
            prompt_type: prompt_type.to_string(),
            date: ctx.date,
            outcome: RunOutcome::NoData,
            departments: Vec::new(),
            duration_secs: start.elapsed().as_secs_f64(),
            error: None,
        });
    }

    eprintln!("{}: {} file(s) for {}", prompt_type, files.len(), ctx.date_str());
    let target = processor.target();
    let total = files.len();
    let width = total.to_string().len();
    let mut departments = Vec::with_capacity(total + 1);

    for (i, file) in files.iter().enumerate() {
        let mut outcome = DepartmentOutcome::new(file.department.display_name());

        let tally = match parse_file(processor, file) {
            Ok(t) => t,
            Err(e) => {
                eprintln!(
                    "  [{:>width$}/{}] FAILED to read {}: {:#}",
                    i + 1,
                    total,
                    file.path.display(),
                    e
                );
                outcome.error = Some(format!("{e:#}"));
                outcome.sheet = Some(SheetStatus::Skipped("input unreadable".to_string()));
                departments.push(outcome);
                continue;
            }
        };

        outcome.rows_read = tally.rows_read;
        outcome.valid_rows = tally.parsed.len();
        outcome.parse_failures = tally.rows_read - tally.parsed.len();
        outcome.metrics = processor.aggregate(&tally.parsed);
        save_summaries(ctx, processor, &mut outcome, &tally.parsed);

        if target == SnapshotTarget::PerDepartment {
            let (status, update) = push_metrics(ctx, processor, file.department, &outcome.metrics);
            outcome.sheet = Some(status);
            outcome.update = update;
        }

        eprintln!(
            "  [{:>width$}/{}] {}: {} rows, {} valid, sheet {}",
            i + 1,
            total,
            outcome.name,
            outcome.rows_read,
            outcome.valid_rows,
            outcome
                .sheet
                .as_ref()
                .map(|s| s.label())
                .unwrap_or_else(|| "combined".to_string()),
        );
        departments.push(outcome);
    }

    if let SnapshotTarget::Combined { department, combine } = target {
        let overall = combine_departments(ctx, processor, &departments, department, combine);
        eprintln!(
            "  {}: {} valid rows, {} sheet {}",
            OVERALL,
            overall.valid_rows,
            department,
            overall.sheet.as_ref().map(|s| s.label()).unwrap_or_default(),
        );
        departments.push(overall);
    }

    let outcome = if departments.iter().all(|d| d.is_clean()) {
        RunOutcome::Success
    } else {
        RunOutcome::PartialSuccess
    };
    let duration = start.elapsed().as_secs_f64();
    info!("{} finished: {:?} ({:.1}s)", prompt_type, outcome, duration);

    Ok(RunReport {
        prompt_type: prompt_type.to_string(),
        date: ctx.date,
        outcome,
        departments,
        duration_secs: duration,
        error: None,
    })
}

/// Run each processor in turn. A processor that fails outright is reported
/// as `Failed` and the rest still run.
pub fn run_all(processors: &[Box<dyn Processor>], ctx: &RunContext) -> Vec<RunReport> {
    processors
        .iter()
        .map(|processor| {
            let start = Instant::now();
            run_processor(processor.as_ref(), ctx).unwrap_or_else(|e| {
                eprintln!("{}: FAILED: {:#}", processor.prompt_type(), e);
                warn!("{} failed: {:#}", processor.prompt_type(), e);
                RunReport {
                    prompt_type: processor.prompt_type().to_string(),
                    date: ctx.date,
                    outcome: RunOutcome::Failed,
                    departments: Vec::new(),
                    duration_secs: start.elapsed().as_secs_f64(),
                    error: Some(format!("{e:#}")),
                }
            })
        })
        .collect()
}

/// Fold the per-department figures into one and push it to `target`'s sheet.
fn combine_departments(
    ctx: &RunContext,
    processor: &dyn Processor,
    departments: &[DepartmentOutcome],
    target: Department,
    how: Combine,
) -> DepartmentOutcome {
    let mut overall = DepartmentOutcome::new(OVERALL);
    let contributing: Vec<&DepartmentOutcome> = departments
        .iter()
        .filter(|d| d.valid_rows > 0)
        .collect();

    overall.rows_read = contributing.iter().map(|d| d.rows_read).sum();
    overall.valid_rows = contributing.iter().map(|d| d.valid_rows).sum();
    overall.parse_failures = contributing.iter().map(|d| d.parse_failures).sum();
    overall.metrics = processor
        .headers()
        .iter()
        .filter_map(|header| {
            let values: Vec<&MetricValue> = contributing
                .iter()
                .filter_map(|d| d.metrics.iter().find(|m| m.header == *header))
                .collect();
            MetricValue::combine(&values, how)
        })
        .collect();

    if overall.metrics.is_empty() {
        overall.metrics = processor.aggregate(&[]);
        save_summaries(ctx, processor, &mut overall, &[]);
        overall.sheet = Some(SheetStatus::Skipped("no readable department data".to_string()));
        return overall;
    }

    save_summaries(ctx, processor, &mut overall, &[]);
    let (status, update) = push_metrics(ctx, processor, target, &overall.metrics);
    overall.sheet = Some(status);
    overall.update = update;
    overall
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub department: Department,
    pub rows: usize,
    pub sheet: SheetStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub prompt_type: String,
    pub date: NaiveDate,
    pub tab: String,
    pub outcome: RunOutcome,
    pub departments: Vec<UploadOutcome>,
}

/// Copy each department's raw output CSV into a tab named after the run date.
pub fn run_upload(prompt_type: &str, ctx: &RunContext) -> Result<UploadReport> {
    let tab = ctx.date_str();
    let service = match (ctx.sheets, ctx.dry_run) {
        (Some(s), _) => Some(s),
        (None, true) => None,
        (None, false) => bail!("Uploading requires sheets access; set a token or use --dry-run"),
    };

    let files = input::discover_inputs(&ctx.llm_outputs, prompt_type, ctx.date)?;
    if files.is_empty() {
        eprintln!("{}: no input files for {}", prompt_type, tab);
        return Ok(UploadReport {
            prompt_type: prompt_type.to_string(),
            date: ctx.date,
            tab,
            outcome: RunOutcome::NoData,
            departments: Vec::new(),
        });
    }

    let mut departments = Vec::with_capacity(files.len());
    for file in &files {
        let dept = file.department;
        let (rows, sheet) = match input::read_table(&file.path) {
            Err(e) => (0, SheetStatus::Failed(format!("{e:#}"))),
            Ok(rows) => {
                let n = rows.len();
                let status = match (service, ctx.departments.sheet_id(dept)) {
                    _ if ctx.dry_run => SheetStatus::Skipped("dry run".to_string()),
                    (_, None) => SheetStatus::Skipped(format!("no spreadsheet for {}", dept.key())),
                    (None, _) => SheetStatus::Skipped("no sheets access".to_string()),
                    (Some(service), Some(sheet_id)) => {
                        let writer = SnapshotWriter::new(service, ctx.tab.as_str());
                        match writer.upload_table(sheet_id, &tab, &rows) {
                            Ok(_) => SheetStatus::Written,
                            Err(e) => {
                                warn!("Upload for {} failed: {}", dept, e);
                                SheetStatus::Failed(e.to_string())
                            }
                        }
                    }
                };
                (n, status)
            }
        };
        eprintln!("  {}: {} rows, {}", dept, rows, sheet.label());
        departments.push(UploadOutcome {
            department: dept,
            rows,
            sheet,
        });
    }

    let outcome = if departments.iter().all(|d| d.sheet == SheetStatus::Written) {
        RunOutcome::Success
    } else {
        RunOutcome::PartialSuccess
    };

    Ok(UploadReport {
        prompt_type: prompt_type.to_string(),
        date: ctx.date,
        tab,
        outcome,
        departments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::call_request::CallRequest;
    use crate::processors::flags::Misprescription;
    use crate::sheets::memory::MemorySheets;
    use crate::sheets::DateMatch;
    use std::fs;
    use std::path::Path;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 5).unwrap()
    }

    fn write_input(root: &Path, name: &str, outputs: &[&str]) {
        let dir = input::date_dir(root, date());
        fs::create_dir_all(&dir).unwrap();
        let mut w = csv::Writer::from_path(dir.join(name)).unwrap();
        w.write_record(["conversation_id", "llm_output"]).unwrap();
        for (i, out) in outputs.iter().enumerate() {
            w.write_record([format!("c{i}").as_str(), *out]).unwrap();
        }
        w.flush().unwrap();
    }

    const CALL_ROWS: [&str; 4] = [
        r#"{"CallRequested":"True","CallRequestRebuttalResult":"Retained"}"#,
        r#"{"CallRequested":"False"}"#,
        "not json at all",
        r#"{"CallRequested":"True","CallRequestRebuttalResult":"NoRetention"}"#,
    ];

    fn call_request_sheet(sheets: MemorySheets, id: &str) -> MemorySheets {
        sheets.with_tab(
            id,
            "Data",
            &[
                &["Date", "call request", "Rebuttal Result"],
                &["2025-08-04 (Mon)"],
                &["2025-08-05 (Tue)"],
            ],
        )
    }

    fn ctx<'a>(
        root: &Path,
        sheets: Option<&'a dyn SheetService>,
        departments: &'a DepartmentSheets,
    ) -> RunContext<'a> {
        RunContext {
            llm_outputs: root.join("LLM_outputs"),
            outputs: root.join("outputs"),
            date: date(),
            tab: "Data".to_string(),
            sheets,
            departments,
            dry_run: false,
        }
    }

    #[test]
    fn test_call_request_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        write_input(&tmp.path().join("LLM_outputs"), "call_request_cc_sales_08_05.csv", &CALL_ROWS);

        let sheets = call_request_sheet(MemorySheets::new(), "cc-sheet");
        let mut depts = DepartmentSheets::default();
        depts.insert(Department::CcSales, "cc-sheet");

        let report = run_processor(&CallRequest, &ctx(tmp.path(), Some(&sheets), &depts)).unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);
        let cc = &report.departments[0];
        assert_eq!(cc.rows_read, 4);
        assert_eq!(cc.valid_rows, 3);
        assert_eq!(cc.parse_failures, 1);
        assert_eq!(sheets.cell("cc-sheet", "Data", "B3").as_deref(), Some("66.67%"));
        assert_eq!(sheets.cell("cc-sheet", "Data", "C3").as_deref(), Some("33.33%"));

        let summary = fs::read_to_string(cc.summary.as_ref().unwrap()).unwrap();
        assert!(summary.contains("CC Sales,66.67,33.33,3,2025-08-05"));
        assert!(cc.summary.as_ref().unwrap().ends_with(
            "call_request/2025-08-05/CC Sales_Call_Request_Summary.csv"
        ));
    }

    #[test]
    fn test_no_input_is_no_data() {
        let tmp = tempfile::tempdir().unwrap();
        let depts = DepartmentSheets::default();
        let report = run_processor(&CallRequest, &ctx(tmp.path(), None, &depts)).unwrap();
        assert_eq!(report.outcome, RunOutcome::NoData);
        assert!(report.departments.is_empty());
    }

    #[test]
    fn test_without_sheets_saves_summary_only() {
        let tmp = tempfile::tempdir().unwrap();
        write_input(&tmp.path().join("LLM_outputs"), "call_request_doctors_08_05.csv", &CALL_ROWS);
        let depts = DepartmentSheets::default();

        let report = run_processor(&CallRequest, &ctx(tmp.path(), None, &depts)).unwrap();
        assert_eq!(report.outcome, RunOutcome::PartialSuccess);
        assert!(report.departments[0].summary.as_ref().unwrap().exists());
        assert_eq!(
            report.departments[0].sheet,
            Some(SheetStatus::Skipped("no sheets access".to_string()))
        );
    }

    #[test]
    fn test_dry_run_never_writes() {
        let tmp = tempfile::tempdir().unwrap();
        write_input(&tmp.path().join("LLM_outputs"), "call_request_cc_sales_08_05.csv", &CALL_ROWS);
        let sheets = call_request_sheet(MemorySheets::new(), "cc-sheet");
        let mut depts = DepartmentSheets::default();
        depts.insert(Department::CcSales, "cc-sheet");

        let mut run = ctx(tmp.path(), Some(&sheets), &depts);
        run.dry_run = true;
        let report = run_processor(&CallRequest, &run).unwrap();
        assert_eq!(sheets.writes.get(), 0);
        assert!(report.departments[0].summary.is_some());
    }

    #[test]
    fn test_bad_file_does_not_stop_other_departments() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("LLM_outputs");
        write_input(&root, "call_request_cc_sales_08_05.csv", &CALL_ROWS);
        let dir = input::date_dir(&root, date());
        fs::write(dir.join("call_request_doctors_08_05.csv"), "conversation_id,answer\nc1,x\n").unwrap();

        let sheets = call_request_sheet(MemorySheets::new(), "cc-sheet");
        let mut depts = DepartmentSheets::default();
        depts.insert(Department::CcSales, "cc-sheet");

        let report = run_processor(&CallRequest, &ctx(tmp.path(), Some(&sheets), &depts)).unwrap();
        assert_eq!(report.outcome, RunOutcome::PartialSuccess);
        let doctors = report.departments.iter().find(|d| d.name == "Doctors").unwrap();
        assert!(doctors.error.is_some());
        assert_eq!(sheets.cell("cc-sheet", "Data", "B3").as_deref(), Some("66.67%"));
    }

    #[test]
    fn test_missing_column_is_partial() {
        let tmp = tempfile::tempdir().unwrap();
        write_input(&tmp.path().join("LLM_outputs"), "call_request_cc_sales_08_05.csv", &CALL_ROWS);
        let sheets = MemorySheets::new().with_tab(
            "cc-sheet",
            "Data",
            &[&["Date", "Call Request"], &["2025-08-05"]],
        );
        let mut depts = DepartmentSheets::default();
        depts.insert(Department::CcSales, "cc-sheet");

        let report = run_processor(&CallRequest, &ctx(tmp.path(), Some(&sheets), &depts)).unwrap();
        assert_eq!(report.outcome, RunOutcome::PartialSuccess);
        let cc = &report.departments[0];
        assert_eq!(cc.sheet, Some(SheetStatus::Partial));
        assert_eq!(cc.update.as_ref().unwrap().missing_columns, vec!["Rebuttal Result"]);
        assert_eq!(sheets.cell("cc-sheet", "Data", "B2").as_deref(), Some("66.67%"));
    }

    #[test]
    fn test_combined_target_writes_mean_to_doctors() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("LLM_outputs");
        // 1/2 = 50.0 and 1/4 = 25.0; mean 37.5
        write_input(
            &root,
            "misprescription_doctors_08_05.csv",
            &[r#"{"mis-prescription": true}"#, r#"{"mis-prescription": false}"#],
        );
        write_input(
            &root,
            "misprescription_delighters_08_05.csv",
            &[
                r#"{"mis-prescription": true}"#,
                r#"{"mis-prescription": false}"#,
                r#"{"mis-prescription": false}"#,
                r#"{"mis-prescription": false}"#,
            ],
        );

        let sheets = MemorySheets::new().with_tab(
            "doc-sheet",
            "Data",
            &[&["Date", "Medical mis-prescriptions"], &["2025-08-05"]],
        );
        let mut depts = DepartmentSheets::default();
        depts.insert(Department::Doctors, "doc-sheet");
        depts.insert(Department::Delighters, "del-sheet");

        let report = run_processor(&Misprescription, &ctx(tmp.path(), Some(&sheets), &depts)).unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(report.departments.len(), 3);
        assert!(report.departments[..2].iter().all(|d| d.sheet.is_none()));

        let overall = report.departments.last().unwrap();
        assert_eq!(overall.name, OVERALL);
        assert_eq!(overall.valid_rows, 6);
        assert_eq!(overall.metrics[0].value, 37.5);
        assert_eq!(sheets.cell("doc-sheet", "Data", "B2").as_deref(), Some("37.5%"));
        assert!(overall
            .summary
            .as_ref()
            .unwrap()
            .ends_with("Overall_Misprescription_Summary.csv"));
    }

    #[test]
    fn test_combined_target_without_valid_rows_saves_zero_summary() {
        let tmp = tempfile::tempdir().unwrap();
        write_input(
            &tmp.path().join("LLM_outputs"),
            "misprescription_doctors_08_05.csv",
            &["garbage", ""],
        );
        let sheets = MemorySheets::new().with_tab(
            "doc-sheet",
            "Data",
            &[&["Date", "Medical mis-prescriptions"], &["2025-08-05"]],
        );
        let mut depts = DepartmentSheets::default();
        depts.insert(Department::Doctors, "doc-sheet");

        let report = run_processor(&Misprescription, &ctx(tmp.path(), Some(&sheets), &depts)).unwrap();
        assert_eq!(report.outcome, RunOutcome::PartialSuccess);
        let overall = report.departments.last().unwrap();
        assert_eq!(overall.name, OVERALL);
        assert_eq!(overall.valid_rows, 0);
        assert_eq!(overall.metrics.len(), 1);
        assert_eq!(overall.metrics[0].value, 0.0);
        assert!(matches!(overall.sheet, Some(SheetStatus::Skipped(_))));
        assert_eq!(sheets.writes.get(), 0);

        let summary = fs::read_to_string(overall.summary.as_ref().unwrap()).unwrap();
        assert!(summary.lines().nth(1).unwrap().starts_with("Overall,0"));
        assert!(summary.contains(",0,2025-08-05"));
    }

    struct Unlistable;

    impl Processor for Unlistable {
        fn prompt_type(&self) -> &'static str {
            "broken["
        }
        fn label(&self) -> &'static str {
            "Broken"
        }
        fn headers(&self) -> &'static [&'static str] {
            &["Broken"]
        }
        fn decimals(&self) -> u32 {
            1
        }
        fn date_match(&self) -> DateMatch {
            DateMatch::Exact
        }
        fn aggregate(&self, _parsed: &[ParsedResult]) -> Vec<MetricValue> {
            Vec::new()
        }
    }

    #[test]
    fn test_run_all_continues_after_a_failed_processor() {
        let tmp = tempfile::tempdir().unwrap();
        write_input(&tmp.path().join("LLM_outputs"), "call_request_doctors_08_05.csv", &CALL_ROWS);
        let depts = DepartmentSheets::default();
        let processors: Vec<Box<dyn Processor>> = vec![Box::new(Unlistable), Box::new(CallRequest)];

        let reports = run_all(&processors, &ctx(tmp.path(), None, &depts));
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].outcome, RunOutcome::Failed);
        assert!(reports[0].error.is_some());
        assert_eq!(reports[1].prompt_type, "call_request");
        assert_eq!(reports[1].departments[0].valid_rows, 3);
        assert!(reports[1].error.is_none());
    }

    #[test]
    fn test_upload_creates_dated_tab() {
        let tmp = tempfile::tempdir().unwrap();
        write_input(&tmp.path().join("LLM_outputs"), "sentiment_cc_sales_08_05.csv", &["{}", "{}"]);
        let sheets = MemorySheets::new();
        let mut depts = DepartmentSheets::default();
        depts.insert(Department::CcSales, "cc-sheet");

        let report = run_upload("sentiment", &ctx(tmp.path(), Some(&sheets), &depts)).unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(report.departments[0].rows, 3);
        assert_eq!(sheets.rows("cc-sheet", "2025-08-05").len(), 3);
        assert_eq!(sheets.cell("cc-sheet", "2025-08-05", "B1").as_deref(), Some("llm_output"));
    }

    #[test]
    fn test_upload_without_sheets_requires_dry_run() {
        let tmp = tempfile::tempdir().unwrap();
        let depts = DepartmentSheets::default();
        assert!(run_upload("sentiment", &ctx(tmp.path(), None, &depts)).is_err());
    }
}
