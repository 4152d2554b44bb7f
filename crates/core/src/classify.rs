//! Tagging-guide table classification.

use crate::types::Table;

/// Whether a table looks like a tagging-guide table.
///
/// The lower-cased first-row cell texts, joined with single spaces, must
/// contain both `no` and `tagging`. The match is a plain substring match so
/// that header variants such as "No." / "NO" and "Tagging Source" /
/// "Tagging" are all accepted.
pub fn is_tagging_table(table: &Table) -> bool {
    let Some(first_row) = table.rows.first() else {
        return false;
    };
    if first_row.cells.is_empty() {
        return false;
    }

    let header = first_row
        .cells
        .iter()
        .map(|c| c.text.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    header.contains("no") && header.contains("tagging")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_header() {
        let table = Table::from_rows(vec![vec!["No.", "Action", "Tagging Source"]]);
        assert!(is_tagging_table(&table));
    }

    #[test]
    fn test_header_variants() {
        let table = Table::from_rows(vec![vec!["NO", "TAGGING"]]);
        assert!(is_tagging_table(&table));

        let table = Table::from_rows(vec![vec!["  no ", " Tagging Guide "]]);
        assert!(is_tagging_table(&table));
    }

    #[test]
    fn test_missing_tokens() {
        let table = Table::from_rows(vec![vec!["Index", "Tagging Source"]]);
        assert!(!is_tagging_table(&table));

        let table = Table::from_rows(vec![vec!["No.", "Description"]]);
        assert!(!is_tagging_table(&table));

        let table = Table::from_rows(vec![vec!["Menu", "Label"], vec!["No.", "Tagging"]]);
        assert!(!is_tagging_table(&table));
    }

    #[test]
    fn test_empty_tables() {
        assert!(!is_tagging_table(&Table::default()));

        let empty_row: Vec<Vec<&str>> = vec![vec![]];
        assert!(!is_tagging_table(&Table::from_rows(empty_row)));
    }
}
