//! Row grouping for tagging-guide tables.
//!
//! Tagging tables are not uniformly structured: a single logical record is
//! often spread over several rows (merged cells, continuation lines), and
//! only the first of those rows carries the sequence number. The engine
//! walks the data rows and opens a new group at every row whose sequence
//! cell is a plain decimal number.

use crate::config::GroupingStrategy;
use crate::error::Error;
use unicode_normalization::UnicodeNormalization;

/// Where the header sits and which column holds the sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    /// 0-based index of the header row. Data starts on the next row.
    pub header_row: usize,

    /// 0-based index of the sequence-number column.
    pub key_column: usize,
}

/// Rows sharing one leading sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub no: u64,

    /// Column holding the sequence number, excluded from action detection.
    pub key_column: usize,

    /// Trimmed cell texts of every row in the group, in table order.
    pub rows: Vec<Vec<String>>,
}

impl RowGroup {
    /// All cell texts of the group, cells and rows joined by single spaces.
    pub fn joined_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join(" "))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of grouping one table.
#[derive(Debug, Default)]
pub struct GroupedTable {
    pub groups: Vec<RowGroup>,

    /// Number of rows below the header, empty rows included.
    pub data_rows: usize,

    /// Rows that could not be interpreted, as [`Error::RowProcessing`].
    pub row_failures: Vec<Error>,

    /// 1-based numbers of non-empty rows seen before the first numbered row.
    pub orphan_rows: Vec<usize>,
}

/// Locate the header row and sequence column for `rows` under `strategy`.
///
/// Returns `None` when the strategy cannot make sense of the header, which
/// callers treat as a table-level failure.
pub fn locate_layout(rows: &[Vec<String>], strategy: GroupingStrategy) -> Option<TableLayout> {
    let header = rows.first()?;

    match strategy {
        GroupingStrategy::HeaderScan => {
            let header_row = rows
                .iter()
                .position(|row| row.iter().any(|cell| cell.to_lowercase().contains("tagging")))
                .unwrap_or(0);
            Some(TableLayout {
                header_row,
                key_column: 0,
            })
        }
        GroupingStrategy::IndexedHeader => {
            let key_column = header
                .iter()
                .position(|cell| cell.eq_ignore_ascii_case("no.") || cell.eq_ignore_ascii_case("no"))?;
            Some(TableLayout {
                header_row: 0,
                key_column,
            })
        }
    }
}

/// Compatibility-fold a key cell so full-width digits read as ASCII.
fn fold_key(cell: &str) -> String {
    cell.nfkc().collect()
}

/// Whether a trimmed cell opens a new group. Full-width digits count.
pub fn is_sequence_number(cell: &str) -> bool {
    let key = fold_key(cell);
    !key.is_empty() && key.chars().all(|c| c.is_ascii_digit())
}

/// Partition the data rows below `layout.header_row` into numbered groups.
pub fn group_rows(rows: &[Vec<String>], layout: &TableLayout) -> GroupedTable {
    let mut grouped = GroupedTable::default();
    let mut current: Option<RowGroup> = None;

    for (idx, row) in rows.iter().enumerate().skip(layout.header_row + 1) {
        grouped.data_rows += 1;
        let row_number = idx + 1;

        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let Some(key) = row.get(layout.key_column) else {
            grouped.row_failures.push(Error::RowProcessing {
                row: row_number,
                reason: format!(
                    "only {} cells, sequence number expected in column {}",
                    row.len(),
                    layout.key_column + 1
                ),
            });
            continue;
        };

        let key = fold_key(key);
        if is_sequence_number(&key) {
            let no = match key.parse::<u64>() {
                Ok(no) => no,
                Err(e) => {
                    grouped.row_failures.push(Error::RowProcessing {
                        row: row_number,
                        reason: format!("sequence number '{}' is not usable: {}", key, e),
                    });
                    continue;
                }
            };

            if let Some(done) = current.take() {
                grouped.groups.push(done);
            }
            log::debug!("row {}: opening group {}", row_number, no);
            current = Some(RowGroup {
                no,
                key_column: layout.key_column,
                rows: vec![row.clone()],
            });
        } else if let Some(group) = current.as_mut() {
            group.rows.push(row.clone());
        } else {
            grouped.orphan_rows.push(row_number);
        }
    }

    if let Some(done) = current.take() {
        grouped.groups.push(done);
    }

    grouped
}
