//! Boolean masks over a store, either supplied by the caller or derived from
//! a column comparison, plus the projection that applies them. Missing values
//! never pass a derived predicate; they are excluded, not an error.

use crate::error::{Result, ScourError};
use crate::frame::{Column, ColumnStore, Mask};

/// Validates a caller-provided boolean array against the store's row count.
pub fn mask_from_bools(store: &ColumnStore, bits: &[bool]) -> Result<Mask> {
    if bits.len() != store.row_count() {
        return Err(ScourError::LengthMismatch {
            expected: store.row_count(),
            actual: bits.len(),
        });
    }
    Ok(Mask::new(bits.to_vec()))
}

/// Derives a mask from a Bool column; missing counts as not selected.
pub fn mask_from_column(store: &ColumnStore, name: &str) -> Result<Mask> {
    match store.column(name)? {
        Column::Bool(v) => Ok(Mask::new(v.iter().map(|c| c.unwrap_or(false)).collect())),
        other => Err(ScourError::TypeMismatch {
            column: name.to_string(),
            expected: "bool".to_string(),
            actual: other.dtype().to_string(),
        }),
    }
}

fn numeric_values(store: &ColumnStore, name: &str) -> Result<Vec<Option<f64>>> {
    match store.column(name)? {
        Column::Float64(v) => Ok(v.clone()),
        Column::Int64(v) => Ok(v.iter().map(|c| c.map(|x| x as f64)).collect()),
        other => Err(ScourError::TypeMismatch {
            column: name.to_string(),
            expected: "float64 or int64".to_string(),
            actual: other.dtype().to_string(),
        }),
    }
}

/// Inclusive range test over a numeric column. A row passes only if the value
/// is present and `low <= value <= high`.
pub fn range_mask(store: &ColumnStore, name: &str, low: f64, high: f64) -> Result<Mask> {
    let values = numeric_values(store, name)?;
    Ok(Mask::new(
        values
            .iter()
            .map(|c| matches!(c, Some(v) if *v >= low && *v <= high))
            .collect(),
    ))
}

/// Lower-bound-only variant of [`range_mask`].
pub fn min_mask(store: &ColumnStore, name: &str, low: f64) -> Result<Mask> {
    range_mask(store, name, low, f64::INFINITY)
}

/// Projects the store by the mask: same columns, masked rows, original order.
pub fn apply(store: &ColumnStore, mask: &Mask) -> Result<ColumnStore> {
    store.filter(mask)
}
