//! Duplicate detection and removal under a caller-chosen key-column set.
//!
//! Key equality is deliberately looser than cell equality: two missing cells
//! in the same key column count as matching, so rows that are "the same
//! except both unknown" group together. Ordinary comparisons elsewhere never
//! treat missing as equal to anything.

use crate::error::{Result, ScourError};
use crate::frame::{Cell, Column, ColumnStore, Mask};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Which occurrences of a repeated key survive.
///
/// `First`/`Last` mark everything but the first/last occurrence as duplicate;
/// `None` marks every row whose key occurs more than once, first occurrence
/// included — that is "find all conflicts", not "find rows to remove".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keep {
    First,
    Last,
    None,
}

/// Hashable stand-in for a key cell. Floats compare by normalized bit
/// pattern; `Missing` equals `Missing` here, which is the whole point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyValue {
    Missing,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

fn key_of(cell: Cell) -> KeyValue {
    match cell {
        Cell::Missing => KeyValue::Missing,
        Cell::Int(v) => KeyValue::Int(v),
        Cell::Float(v) if v.is_nan() => KeyValue::Missing,
        Cell::Float(v) => {
            // fold -0.0 into 0.0 so the two hash alike
            let v = if v == 0.0 { 0.0 } else { v };
            KeyValue::Float(v.to_bits())
        }
        Cell::Bool(v) => KeyValue::Bool(v),
        Cell::Text(v) => KeyValue::Text(v),
        Cell::DateTime(v) => KeyValue::DateTime(v),
    }
}

fn key_columns<'a>(store: &'a ColumnStore, keys: &[String]) -> Result<Vec<&'a Column>> {
    if keys.is_empty() {
        // full row tuple
        return store
            .column_names()
            .iter()
            .map(|n| store.column(n))
            .collect();
    }
    keys.iter().map(|n| store.column(n)).collect()
}

fn group_rows(columns: &[&Column], rows: usize) -> HashMap<Vec<KeyValue>, Vec<usize>> {
    let mut groups: HashMap<Vec<KeyValue>, Vec<usize>> = HashMap::new();
    for row in 0..rows {
        let key: Vec<KeyValue> = columns.iter().map(|c| key_of(c.cell(row))).collect();
        groups.entry(key).or_default().push(row);
    }
    groups
}

/// Marks duplicate rows under `keys` (empty slice = whole row) per `keep`.
pub fn duplicate_mask(store: &ColumnStore, keys: &[String], keep: Keep) -> Result<Mask> {
    let columns = key_columns(store, keys)?;
    let rows = store.row_count();
    let mut bits = vec![false; rows];
    for occurrences in group_rows(&columns, rows).values() {
        match keep {
            Keep::First => {
                for &row in &occurrences[1..] {
                    bits[row] = true;
                }
            }
            Keep::Last => {
                for &row in &occurrences[..occurrences.len() - 1] {
                    bits[row] = true;
                }
            }
            Keep::None => {
                if occurrences.len() > 1 {
                    for &row in occurrences {
                        bits[row] = true;
                    }
                }
            }
        }
    }
    Ok(Mask::new(bits))
}

/// Drops duplicate rows, keeping the first or last occurrence of each key.
/// Kept rows stay in their original relative order. `Keep::None` would leave
/// nothing decidable to keep and is rejected.
pub fn drop_duplicates(store: &ColumnStore, keys: &[String], keep: Keep) -> Result<ColumnStore> {
    if keep == Keep::None {
        return Err(ScourError::InvalidKeepPolicy);
    }
    let mask = duplicate_mask(store, keys, keep)?;
    store.filter(&mask.invert())
}

/// Count of distinct non-missing values in a column. Missing never counts as
/// a distinct value.
pub fn nunique(store: &ColumnStore, name: &str) -> Result<usize> {
    let column = store.column(name)?;
    let mut seen: HashSet<KeyValue> = HashSet::new();
    for row in 0..column.len() {
        match key_of(column.cell(row)) {
            KeyValue::Missing => {}
            key => {
                seen.insert(key);
            }
        }
    }
    Ok(seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(values: Vec<Option<&str>>) -> ColumnStore {
        ColumnStore::from_columns(vec![(
            "k".to_string(),
            Column::Text(values.into_iter().map(|v| v.map(str::to_string)).collect()),
        )])
        .unwrap()
    }

    #[test]
    fn test_keep_first_vs_keep_none() {
        let store = keyed(vec![Some("A"), Some("A"), Some("B")]);
        let first = duplicate_mask(&store, &["k".to_string()], Keep::First).unwrap();
        assert_eq!(first.bits(), &[false, true, false]);

        let none = duplicate_mask(&store, &["k".to_string()], Keep::None).unwrap();
        assert_eq!(none.bits(), &[true, true, false]);
    }

    #[test]
    fn test_keep_last() {
        let store = keyed(vec![Some("A"), Some("A"), Some("B")]);
        let last = duplicate_mask(&store, &["k".to_string()], Keep::Last).unwrap();
        assert_eq!(last.bits(), &[true, false, false]);
    }

    #[test]
    fn test_missing_keys_match_each_other() {
        let store = keyed(vec![Some("A"), Some("B"), Some("C"), None, Some("D"), None]);
        let mask = duplicate_mask(&store, &["k".to_string()], Keep::None).unwrap();
        assert_eq!(mask.bits(), &[false, false, false, true, false, true]);
    }

    #[test]
    fn test_empty_key_means_full_row() {
        let store = ColumnStore::from_columns(vec![
            ("a".to_string(), Column::Int64(vec![Some(1), Some(1), Some(1)])),
            ("b".to_string(), Column::Int64(vec![Some(2), Some(2), Some(3)])),
        ])
        .unwrap();
        let mask = duplicate_mask(&store, &[], Keep::First).unwrap();
        assert_eq!(mask.bits(), &[false, true, false]);
    }

    #[test]
    fn test_drop_duplicates_is_stable() {
        let store = keyed(vec![Some("B"), Some("A"), Some("B"), Some("C"), Some("A")]);
        let out = drop_duplicates(&store, &["k".to_string()], Keep::First).unwrap();
        assert_eq!(out.row_count(), 3);
        let col = out.column("k").unwrap();
        let got: Vec<Cell> = (0..3).map(|i| col.cell(i)).collect();
        assert_eq!(
            got,
            vec![
                Cell::Text("B".to_string()),
                Cell::Text("A".to_string()),
                Cell::Text("C".to_string()),
            ]
        );
    }

    #[test]
    fn test_drop_duplicates_rejects_keep_none() {
        let store = keyed(vec![Some("A")]);
        let err = drop_duplicates(&store, &["k".to_string()], Keep::None).unwrap_err();
        assert!(matches!(err, ScourError::InvalidKeepPolicy));
    }

    #[test]
    fn test_duplicate_mask_unknown_key_column() {
        let store = keyed(vec![Some("A")]);
        let err = duplicate_mask(&store, &["nope".to_string()], Keep::First).unwrap_err();
        assert!(matches!(err, ScourError::UnknownColumn { .. }));
    }

    #[test]
    fn test_nunique_excludes_missing() {
        let store = ColumnStore::from_columns(vec![(
            "v".to_string(),
            Column::Int64(vec![Some(1), Some(1), None, Some(2)]),
        )])
        .unwrap();
        assert_eq!(nunique(&store, "v").unwrap(), 2);
    }

    #[test]
    fn test_nunique_on_floats() {
        let store = ColumnStore::from_columns(vec![(
            "v".to_string(),
            Column::Float64(vec![Some(0.0), Some(-0.0), Some(1.5), Some(f64::NAN)]),
        )])
        .unwrap();
        assert_eq!(nunique(&store, "v").unwrap(), 2);
    }
}
