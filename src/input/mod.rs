//! Discovery and reading of the per-department CSVs written by the LLM step.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::department::Department;

/// One row of an LLM output CSV. Other columns are ignored.
#[derive(Debug, Clone)]
pub struct OutputRow {
    pub conversation_id: String,
    pub llm_output: String,
}

/// An input file matched to its department.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub department: Department,
    pub path: PathBuf,
}

fn filename_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<dept>[A-Za-z0-9_]+?)_(?P<mm>\d{2})_(?P<dd>\d{2})\.csv$").ok())
        .as_ref()
}

/// Split `{prompt_type}_{dept_key}_{MM}_{DD}.csv` into `(dept_key, MM, DD)`.
pub fn parse_input_filename(prompt_type: &str, file_name: &str) -> Option<(String, u32, u32)> {
    let rest = file_name.strip_prefix(prompt_type)?.strip_prefix('_')?;
    let caps = filename_re()?.captures(rest)?;
    let month = caps["mm"].parse().ok()?;
    let day = caps["dd"].parse().ok()?;
    Some((caps["dept"].to_string(), month, day))
}

/// Directory holding one day's LLM outputs.
pub fn date_dir(llm_outputs: &Path, date: NaiveDate) -> PathBuf {
    llm_outputs.join(date.format("%Y-%m-%d").to_string())
}

/// Find this prompt type's files for `date`, one per known department, sorted.
pub fn discover_inputs(llm_outputs: &Path, prompt_type: &str, date: NaiveDate) -> Result<Vec<InputFile>> {
    let dir = date_dir(llm_outputs, date);
    if !dir.is_dir() {
        warn!("Input directory not found: {}", dir.display());
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/{}_*_{:02}_{:02}.csv",
        glob::Pattern::escape(&dir.to_string_lossy()),
        prompt_type,
        date.month(),
        date.day()
    );
    let paths: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid glob pattern: {pattern}"))?
        .filter_map(|r| r.ok())
        .collect();

    let mut files = Vec::new();
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((key, month, day)) = parse_input_filename(prompt_type, name) else {
            debug!("Skipping unrecognised file {}", name);
            continue;
        };
        if month != date.month() || day != date.day() {
            continue;
        }
        match Department::from_key(&key) {
            Some(department) => files.push(InputFile { department, path }),
            None => warn!("Unknown department '{}' in {}; skipping", key, name),
        }
    }

    files.sort_by(|a, b| a.department.cmp(&b.department).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

/// Read every row of an output CSV. Fails if the `llm_output` column is missing.
/// Short rows read the missing cells as blank; unreadable records are skipped.
pub fn read_output_rows(path: &Path) -> Result<Vec<OutputRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let Some(output_idx) = column("llm_output") else {
        anyhow::bail!("{} has no llm_output column", path.display());
    };
    let id_idx = column("conversation_id");

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("{}: skipping record {}: {}", path.display(), i + 1, e);
                continue;
            }
        };
        let cell = |idx: usize| record.get(idx).unwrap_or_default().to_string();
        rows.push(OutputRow {
            conversation_id: id_idx.map(cell).unwrap_or_default(),
            llm_output: cell(output_idx),
        });
    }
    Ok(rows)
}

/// Read a CSV as plain string rows, header first. Used for raw uploads.
pub fn read_table(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    reader
        .records()
        .map(|r| {
            r.map(|rec| rec.iter().map(|c| c.to_string()).collect())
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}
