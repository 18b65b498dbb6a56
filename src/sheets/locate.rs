use serde::Serialize;

/// How a date row is recognised in the first column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateMatch {
    /// Cell equals `YYYY-MM-DD` after trimming.
    Exact,
    /// Cell contains `YYYY-MM-DD` anywhere, e.g. `2025-08-05 (Mon)`.
    Substring,
}

/// 0 → A, 25 → Z, 26 → AA, 701 → ZZ.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Inverse of [`column_letter`]. None for empty, non-alphabetic or overflowing input.
#[cfg(test)]
pub(crate) fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// Zero-based index of the header equal to `name`: exact first, then case-insensitive.
pub fn find_column(headers: &[String], name: &str) -> Option<usize> {
    let wanted = name.trim();
    headers
        .iter()
        .position(|h| !h.trim().is_empty() && h.trim() == wanted)
        .or_else(|| {
            let lower = wanted.to_lowercase();
            headers
                .iter()
                .position(|h| !h.trim().is_empty() && h.trim().to_lowercase() == lower)
        })
}

/// One-based row of the first cell matching `date`.
pub fn find_date_row(cells: &[String], date: &str, mode: DateMatch) -> Option<usize> {
    cells
        .iter()
        .position(|cell| {
            let cell = cell.trim();
            match mode {
                DateMatch::Exact => cell == date,
                DateMatch::Substring => cell.contains(date),
            }
        })
        .map(|i| i + 1)
}
