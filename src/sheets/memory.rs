//! In-memory `SheetService` for tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::locate::column_index;
use super::{Result, SheetService, SheetsError};

type Grid = Vec<Vec<String>>;

#[derive(Default)]
pub struct MemorySheets {
    tabs: RefCell<HashMap<(String, String), Grid>>,
    pub fail_writes: Cell<bool>,
    pub fail_reads: Cell<bool>,
    pub writes: Cell<usize>,
}

enum Area {
    Row(usize),
    Cols(usize, usize),
    Cell(usize, usize),
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tab(self, sheet_id: &str, tab: &str, rows: &[&[&str]]) -> Self {
        let grid = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        self.tabs
            .borrow_mut()
            .insert((sheet_id.to_string(), tab.to_string()), grid);
        self
    }

    pub fn rows(&self, sheet_id: &str, tab: &str) -> Grid {
        self.tabs
            .borrow()
            .get(&(sheet_id.to_string(), tab.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Value at an A1 cell like `B3`, None if never written.
    pub fn cell(&self, sheet_id: &str, tab: &str, cell: &str) -> Option<String> {
        let Area::Cell(col, row) = parse_area(cell) else {
            panic!("not a cell: {cell}");
        };
        self.rows(sheet_id, tab)
            .get(row - 1)
            .and_then(|r| r.get(col))
            .cloned()
    }

    fn grid_mut<T>(&self, sheet_id: &str, range: &str, f: impl FnOnce(&mut Grid, Area) -> T) -> Result<T> {
        let (tab, area) = split_range(range);
        let mut tabs = self.tabs.borrow_mut();
        let grid = tabs
            .get_mut(&(sheet_id.to_string(), tab.clone()))
            .ok_or_else(|| api_error(400, &format!("Unable to parse range: {range}")))?;
        Ok(f(grid, parse_area(&area)))
    }
}

impl SheetService for MemorySheets {
    fn read_range(&self, sheet_id: &str, range: &str) -> Result<Grid> {
        if self.fail_reads.get() {
            return Err(api_error(503, "backend unavailable"));
        }
        self.grid_mut(sheet_id, range, |grid, area| match area {
            Area::Row(r) => grid.get(r - 1).map(|row| vec![row.clone()]).unwrap_or_default(),
            Area::Cols(a, b) => grid
                .iter()
                .map(|row| row.iter().skip(a).take(b + 1 - a).cloned().collect())
                .collect(),
            Area::Cell(c, r) => grid
                .get(r - 1)
                .and_then(|row| row.get(c))
                .map(|v| vec![vec![v.clone()]])
                .unwrap_or_default(),
        })
    }

    fn update_range(&self, sheet_id: &str, range: &str, values: &[Vec<String>]) -> Result<usize> {
        if self.fail_writes.get() {
            return Err(api_error(500, "write rejected"));
        }
        self.writes.set(self.writes.get() + 1);
        self.grid_mut(sheet_id, range, |grid, area| {
            let Area::Cell(col, row) = area else {
                panic!("updates start at a cell: {range}");
            };
            for (i, vals) in values.iter().enumerate() {
                let r = row - 1 + i;
                if grid.len() <= r {
                    grid.resize(r + 1, Vec::new());
                }
                for (j, v) in vals.iter().enumerate() {
                    let c = col + j;
                    if grid[r].len() <= c {
                        grid[r].resize(c + 1, String::new());
                    }
                    grid[r][c] = v.clone();
                }
            }
            values.len()
        })
    }

    fn clear_range(&self, sheet_id: &str, range: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(api_error(500, "write rejected"));
        }
        self.grid_mut(sheet_id, range, |grid, area| {
            if let Area::Cols(a, b) = area {
                for row in grid.iter_mut() {
                    for cell in row.iter_mut().skip(a).take(b + 1 - a) {
                        cell.clear();
                    }
                }
            }
        })
    }

    fn add_tab(&self, sheet_id: &str, title: &str) -> Result<bool> {
        if self.fail_writes.get() {
            return Err(api_error(500, "write rejected"));
        }
        let mut tabs = self.tabs.borrow_mut();
        let key = (sheet_id.to_string(), title.to_string());
        if tabs.contains_key(&key) {
            return Ok(false);
        }
        tabs.insert(key, Vec::new());
        Ok(true)
    }
}

fn api_error(status: u16, message: &str) -> SheetsError {
    SheetsError::Api {
        status,
        message: message.to_string(),
    }
}

fn split_range(range: &str) -> (String, String) {
    let (tab, area) = range.rsplit_once('!').unwrap_or(("", range));
    let tab = match tab.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => tab.to_string(),
    };
    (tab, area.to_string())
}

fn parse_area(area: &str) -> Area {
    if let Some((a, b)) = area.split_once(':') {
        if let Ok(r) = a.parse::<usize>() {
            return Area::Row(r);
        }
        return Area::Cols(
            column_index(a).unwrap_or(0),
            column_index(b).unwrap_or(0),
        );
    }
    let split = area
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(area.len());
    let col = column_index(&area[..split]).unwrap_or(0);
    let row = area[split..].parse().unwrap_or(1);
    Area::Cell(col, row)
}
