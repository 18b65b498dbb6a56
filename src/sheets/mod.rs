pub mod google;
pub mod locate;
pub mod writer;

#[cfg(test)]
pub mod memory;

use thiserror::Error;

pub use locate::{column_letter, find_column, find_date_row, DateMatch};
pub use writer::{SheetUpdate, SnapshotWriter};

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected Sheets response: {0}")]
    Decode(String),

    #[error("Invalid Sheets URL: {0}")]
    Url(String),
}

pub type Result<T> = std::result::Result<T, SheetsError>;

/// The handful of spreadsheet operations the pipeline needs.
pub trait SheetService {
    /// Cell values of an A1 range, row-major. Trailing empty cells may be absent.
    fn read_range(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<String>>>;

    /// Overwrite a range starting at its top-left cell. Returns rows updated.
    fn update_range(&self, sheet_id: &str, range: &str, values: &[Vec<String>]) -> Result<usize>;

    fn clear_range(&self, sheet_id: &str, range: &str) -> Result<()>;

    /// Add a tab. Ok(false) if a tab with that title already exists.
    fn add_tab(&self, sheet_id: &str, title: &str) -> Result<bool>;
}

/// `Data!B3`, quoting tab names that need it: `'Raw Data'!B3`.
pub fn a1(tab: &str, range: &str) -> String {
    let plain = tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        format!("{tab}!{range}")
    } else {
        format!("'{}'!{range}", tab.replace('\'', "''"))
    }
}
