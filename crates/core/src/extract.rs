//! Action detection and attribute extraction for row groups.

use crate::grouping::RowGroup;
use crate::types::{AttributeKey, Attributes, TaggingRecord};
use regex::Regex;
use std::sync::LazyLock;

/// One `key="value"` pattern per recognized attribute.
static ATTRIBUTE_PATTERNS: LazyLock<Vec<(AttributeKey, Regex)>> = LazyLock::new(|| {
    AttributeKey::ALL
        .iter()
        .map(|key| {
            let pattern = format!(r#"{}\s*=\s*"([^"]+)""#, regex::escape(key.as_str()));
            (*key, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// A `key=""` assignment with nothing between the quotes.
static EMPTY_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\w-]+\s*=\s*""($|[^"\w])"#).unwrap());

/// Substrings marking a cell as attribute-carrying rather than an action.
const ATTRIBUTE_MARKERS: &[&str] = &["AA", "GA", "data-omni", "ga-"];

/// Lower-case keywords that identify an action cell.
const ACTION_KEYWORDS: &[&str] = &[
    "click", "buy", "order", "reserve", "open", "close", "drop", "where", "pre-order",
];

/// Cell contents that stand for "nothing here".
const BLANK_MARKERS: &[&str] = &["\u{3000}", ""];

/// Quote characters folded into a plain `"` before matching.
const QUOTE_CHARS: &[char] = &['\u{201C}', '\u{201D}', '\u{201E}', '\u{201F}', '\u{FF02}'];

/// Leftover of a `data-omni-type` match that ran into the next attribute.
const OVERMATCH_FRAGMENT: &str = "\" data-omni=";

/// Fold curly and full-width double quotes to `"` and collapse `""` to `"`.
///
/// Empty assignments such as `ga-ca=""` are removed first, so the collapse
/// cannot turn them into an opening quote for the next attribute.
pub fn normalize_quotes(text: &str) -> String {
    let folded = text.replace(QUOTE_CHARS, "\"");
    EMPTY_ASSIGNMENT
        .replace_all(&folded, "${1}")
        .replace("\"\"", "\"")
}

/// Extract the recognized attributes from free-form text.
///
/// The first match of each key wins. Values are trimmed; empty values are
/// treated as absent.
pub fn extract_attributes(text: &str) -> Attributes {
    let text = normalize_quotes(text);
    let mut attributes = Attributes::new();

    for (key, pattern) in ATTRIBUTE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(&text) else {
            continue;
        };
        let mut value = caps[1].trim().to_string();
        if *key == AttributeKey::DataOmniType {
            if let Some(pos) = value.find(OVERMATCH_FRAGMENT) {
                value.truncate(pos);
                value = value.trim().to_string();
            }
        }
        attributes.insert(*key, value);
    }

    attributes
}

/// Whether a trimmed cell reads like a user action.
///
/// This is a fuzzy heuristic: keyword cells qualify, and so does any
/// longer free-text cell without an `=`. Cells that mention tagging
/// markers never qualify.
pub fn is_action_candidate(cell: &str) -> bool {
    if cell.is_empty() || ATTRIBUTE_MARKERS.iter().any(|m| cell.contains(m)) {
        return false;
    }

    let lower = cell.to_lowercase();
    if ACTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }

    cell.chars().count() > 5 && !cell.contains('=') && !BLANK_MARKERS.contains(&cell)
}

/// Candidate actions of a group, in table order, without duplicates.
pub fn detect_actions(group: &RowGroup) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();

    for row in &group.rows {
        for (col, cell) in row.iter().enumerate() {
            if col == group.key_column {
                continue;
            }
            if is_action_candidate(cell) && !actions.iter().any(|a| a == cell) {
                actions.push(cell.clone());
            }
        }
    }

    actions
}

/// Turn a row group into one record per detected action.
///
/// Attributes found anywhere in the group apply to every record. Rows that
/// contain an action's text contribute attributes that override those, for
/// that action only.
pub fn build_records(group: &RowGroup, slide_index: usize, title: &str) -> Vec<TaggingRecord> {
    let baseline = extract_attributes(&group.joined_text());

    let mut actions = detect_actions(group);
    if actions.is_empty() {
        actions.push(String::new());
    }

    actions
        .into_iter()
        .map(|action| {
            let mut attributes = baseline.clone();
            if !action.is_empty() {
                for row in &group.rows {
                    let row_text = row.join(" ");
                    if row_text.contains(action.as_str()) {
                        attributes.merge(&extract_attributes(&row_text));
                    }
                }
            }

            TaggingRecord {
                slide_index,
                title: title.to_string(),
                no: group.no,
                action,
                attributes,
            }
        })
        .collect()
}
