use serde::Serialize;
use tracing::{debug, info, warn};

use crate::metrics::MetricValue;

use super::{a1, column_letter, find_column, find_date_row, DateMatch, Result, SheetService};

pub const DEFAULT_TAB: &str = "Data";

/// Longest text a single cell accepts.
pub const MAX_CELL_CHARS: usize = 50_000;

/// What happened when one department's metrics were pushed to its sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetUpdate {
    /// One-based row of the date, if found.
    pub row: Option<usize>,
    /// Cells written, as `B3`.
    pub written: Vec<String>,
    /// Headers with no matching column.
    pub missing_columns: Vec<String>,
    /// Headers whose write failed.
    pub failed: Vec<String>,
    /// Set when the sheet could not be read at all.
    pub error: Option<String>,
}

impl SheetUpdate {
    pub fn is_complete(&self) -> bool {
        self.row.is_some()
            && self.missing_columns.is_empty()
            && self.failed.is_empty()
            && self.error.is_none()
    }
}

/// Reads and writes the date-by-metric grid on one tab of a snapshot sheet.
pub struct SnapshotWriter<'a> {
    service: &'a dyn SheetService,
    tab: String,
}

impl<'a> SnapshotWriter<'a> {
    pub fn new(service: &'a dyn SheetService, tab: impl Into<String>) -> Self {
        Self {
            service,
            tab: tab.into(),
        }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    fn header_row(&self, sheet_id: &str) -> Result<Vec<String>> {
        let rows = self.service.read_range(sheet_id, &a1(&self.tab, "1:1"))?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    fn first_column(&self, sheet_id: &str) -> Result<Vec<String>> {
        let rows = self.service.read_range(sheet_id, &a1(&self.tab, "A:A"))?;
        Ok(rows
            .into_iter()
            .map(|r| r.into_iter().next().unwrap_or_default())
            .collect())
    }

    /// Column letter whose row-1 header matches `name`.
    pub fn locate_column(&self, sheet_id: &str, name: &str) -> Result<Option<String>> {
        let headers = self.header_row(sheet_id)?;
        let found = find_column(&headers, name).map(column_letter);
        if found.is_none() {
            warn!(
                "Column '{}' not found on {} (available: {:?}); please add column '{}'",
                name, self.tab, headers, name
            );
        }
        Ok(found)
    }

    /// One-based row whose column-A cell matches `date`.
    pub fn locate_row(&self, sheet_id: &str, date: &str, mode: DateMatch) -> Result<Option<usize>> {
        let cells = self.first_column(sheet_id)?;
        let found = find_date_row(&cells, date, mode);
        if found.is_none() {
            warn!("Date {} not found in column A of {}", date, self.tab);
        }
        Ok(found)
    }

    /// Write one raw value. Failures are logged, not returned.
    pub fn write_cell(&self, sheet_id: &str, column: &str, row: usize, value: &str) -> bool {
        let cell = format!("{column}{row}");
        let range = a1(&self.tab, &cell);
        match self
            .service
            .update_range(sheet_id, &range, &[vec![value.to_string()]])
        {
            Ok(_) => {
                debug!("Wrote {} to {}", value, range);
                true
            }
            Err(e) => {
                warn!("Failed to write {} to {}: {}", value, range, e);
                false
            }
        }
    }

    /// Write each metric's cell text into the date's row under its header.
    ///
    /// The header row and column A are read once; a metric whose header is
    /// missing is skipped and reported, the rest are still written.
    pub fn update_metrics(
        &self,
        sheet_id: &str,
        date: &str,
        mode: DateMatch,
        metrics: &[MetricValue],
    ) -> SheetUpdate {
        let mut update = SheetUpdate::default();

        let row = match self.locate_row(sheet_id, date, mode) {
            Ok(Some(row)) => row,
            Ok(None) => return update,
            Err(e) => {
                update.error = Some(format!("reading dates: {e}"));
                return update;
            }
        };
        update.row = Some(row);

        let headers = match self.header_row(sheet_id) {
            Ok(h) => h,
            Err(e) => {
                update.error = Some(format!("reading headers: {e}"));
                return update;
            }
        };

        for metric in metrics {
            let Some(idx) = find_column(&headers, metric.header) else {
                warn!(
                    "Column '{}' not found on {}; please add column '{}'",
                    metric.header, self.tab, metric.header
                );
                update.missing_columns.push(metric.header.to_string());
                continue;
            };
            let column = column_letter(idx);
            if self.write_cell(sheet_id, &column, row, &metric.cell_text()) {
                update.written.push(format!("{column}{row}"));
            } else {
                update.failed.push(metric.header.to_string());
            }
        }

        update
    }

    /// Replace the contents of `tab` with `rows`, creating the tab if needed.
    pub fn upload_table(&self, sheet_id: &str, tab: &str, rows: &[Vec<String>]) -> Result<usize> {
        if self.service.add_tab(sheet_id, tab)? {
            info!("Created tab {}", tab);
        }
        self.service.clear_range(sheet_id, &a1(tab, "A:Z"))?;

        let cleaned: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(|c| clean_cell(c)).collect())
            .collect();
        let updated = self.service.update_range(sheet_id, &a1(tab, "A1"), &cleaned)?;
        info!("Uploaded {} rows to {}", updated, tab);
        Ok(updated)
    }
}

/// Normalise line endings and cap length so the API accepts the cell.
pub fn clean_cell(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if text.chars().count() > MAX_CELL_CHARS {
        let mut cut: String = text.chars().take(MAX_CELL_CHARS - 3).collect();
        cut.push_str("...");
        cut
    } else {
        text
    }
}
