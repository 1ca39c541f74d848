//! In-memory worksheet model and the snapshot merge rules.
//!
//! Cells are addressed 1-based as `(row, column)`, matching how the layouts
//! are described in spreadsheet terms. [`Grid::max_row`] and
//! [`Grid::max_column`] report the highest populated index, or 0 when the grid
//! is empty.
//!
//! Bucket layout:
//!
//! | Namespace | Bucket | 01-Oct-2026 (06:00:00) | 02-Oct-2026 (06:00:00) |
//! |-----------|--------|------------------------|------------------------|
//! | ns1       | b1     | 5000000000             | 6000000000             |
//!
//! Capacity layout: VDC label in row 1, `Date | Total | Free | Used | Reserved`
//! in row 2, one snapshot per row after that.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::collect::{BucketRecord, CapacitySummary};

pub const BUCKET_HEADERS: [&str; 2] = ["Namespace", "Bucket"];
pub const CAPACITY_HEADERS: [&str; 5] = ["Date", "Total", "Free", "Used", "Reserved"];

/// Name given to the worksheet of a freshly created workbook.
pub const DEFAULT_SHEET_NAME: &str = "Sheet";

/// Format of the snapshot label, e.g. `18-Oct-2026 (09:15:02)`.
pub const TIMESTAMP_FORMAT: &str = "%d-%b-%Y (%H:%M:%S)";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Formula text as stored in the file, without the leading `=`.
    Formula(String),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Number(_) | Cell::Formula(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) | Cell::Formula(_) => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Sparse 2D grid of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    cells: BTreeMap<(u32, u32), Cell>,
    max_row: u32,
    max_column: u32,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: u32, column: u32) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    /// Store `value` at `(row, column)`. Both indices are 1-based.
    pub fn set(&mut self, row: u32, column: u32, value: impl Into<Cell>) {
        debug_assert!(row >= 1 && column >= 1, "grid addresses are 1-based");
        self.cells.insert((row, column), value.into());
        self.max_row = self.max_row.max(row);
        self.max_column = self.max_column.max(column);
    }

    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    pub fn max_column(&self) -> u32 {
        self.max_column
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All populated cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        self.cells.iter().map(|(&(row, column), cell)| (row, column, cell))
    }
}

/// One named worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grid: Grid::new(),
        }
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_NAME)
    }
}

/// Every worksheet of a report file, in file order.
///
/// The first worksheet is the active one; snapshots are only ever merged into
/// it. The others are carried through a load/save round trip untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    active: Sheet,
    others: Vec<Sheet>,
}

impl Document {
    /// Build a document from sheets in file order. `None` if `sheets` is empty.
    pub fn from_sheets(sheets: impl IntoIterator<Item = Sheet>) -> Option<Self> {
        let mut sheets = sheets.into_iter();
        let active = sheets.next()?;
        Some(Self {
            active,
            others: sheets.collect(),
        })
    }

    pub fn active(&self) -> &Sheet {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut Sheet {
        &mut self.active
    }

    /// All sheets in file order, the active one first.
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        std::iter::once(&self.active).chain(self.others.iter())
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets().find(|sheet| sheet.name == name)
    }
}

/// Outcome of merging one bucket snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketUpsert {
    /// Column the snapshot was written to.
    pub column: u32,
    /// Rows updated in place.
    pub updated_rows: usize,
    /// Rows appended for buckets seen for the first time.
    pub appended_rows: usize,
}

/// Merge a bucket snapshot as one new column labelled `timestamp`.
///
/// Rows are matched on (column 1 == namespace, column 2 == bucket), comparing
/// text cells exactly; number and formula cells never match. A matching
/// row gets the size in the new column; otherwise a row is appended. Earlier
/// columns are never touched. Object counts are not part of this layout.
pub fn upsert_bucket_snapshot(
    grid: &mut Grid,
    records: &[BucketRecord],
    timestamp: &str,
) -> BucketUpsert {
    let column = if grid.max_column() < 3 {
        grid.set(1, 1, BUCKET_HEADERS[0]);
        grid.set(1, 2, BUCKET_HEADERS[1]);
        3
    } else {
        grid.max_column() + 1
    };
    debug!(column, "Adding date column");
    grid.set(1, column, timestamp);

    let mut index = row_index(grid);
    let mut outcome = BucketUpsert {
        column,
        updated_rows: 0,
        appended_rows: 0,
    };

    for record in records {
        let key = (record.namespace.clone(), record.bucket_name.clone());
        debug!(
            namespace = %record.namespace,
            bucket = %record.bucket_name,
            total_objects = record.total_objects,
            total_size = record.total_size,
            "Merging bucket record"
        );
        match index.get(&key) {
            Some(&row) => {
                debug!(row, bucket = %record.bucket_name, "Bucket already exists");
                grid.set(row, column, record.total_size);
                outcome.updated_rows += 1;
            }
            None => {
                let row = grid.max_row() + 1;
                grid.set(row, 1, record.namespace.as_str());
                grid.set(row, 2, record.bucket_name.as_str());
                grid.set(row, column, record.total_size);
                index.insert(key, row);
                info!(row, column, bucket = %record.bucket_name, "New bucket row inserted");
                outcome.appended_rows += 1;
            }
        }
    }

    outcome
}

/// First row (from row 2 down) holding each (namespace, bucket) pair.
fn row_index(grid: &Grid) -> HashMap<(String, String), u32> {
    let mut index = HashMap::new();
    for row in 2..=grid.max_row() {
        let namespace = grid.get(row, 1).and_then(Cell::as_text);
        let bucket = grid.get(row, 2).and_then(Cell::as_text);
        let (Some(namespace), Some(bucket)) = (namespace, bucket) else {
            continue;
        };
        index
            .entry((namespace.to_string(), bucket.to_string()))
            .or_insert(row);
    }
    index
}

/// Append a capacity snapshot as one new row and return its index.
pub fn append_capacity_snapshot(grid: &mut Grid, summary: &CapacitySummary, timestamp: &str) -> u32 {
    let row = if grid.max_row() < 2 {
        grid.set(1, 1, summary.vdc_label.as_str());
        for (i, header) in CAPACITY_HEADERS.iter().enumerate() {
            grid.set(2, i as u32 + 1, *header);
        }
        3
    } else {
        grid.max_row() + 1
    };
    debug!(row, "Adding capacity row");

    grid.set(row, 1, timestamp);
    grid.set(row, 2, summary.total_gb);
    grid.set(row, 3, summary.free_gb);
    grid.set(row, 4, summary.allocated_gb);
    grid.set(row, 5, summary.reserved_gb);
    row
}
