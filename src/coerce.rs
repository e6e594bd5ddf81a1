//! Column type coercion under the coerce-or-null policy: a value that cannot
//! be parsed as the target type becomes missing, never an error. The only
//! errors raised here are caller mistakes (unknown column, fill-value type
//! mismatch).

use crate::error::{Result, ScourError};
use crate::frame::{Cell, Column, ColumnStore};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

/// Options for [`to_numeric`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericOptions {
    /// Map `true`/`false` to `1.0`/`0.0`. Off by default: booleans are a
    /// distinct type and a bool column passes through untouched.
    pub coerce_bool: bool,
}

/// Options for [`to_datetime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeOptions {
    /// Prefer day-first reading of ambiguous two-digit-leading dates
    /// (`03-04-2025` as April 3rd). ISO-style strings are never affected.
    pub dayfirst: bool,
}

fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        // A literal "NaN" parses as a float NaN; fold it into missing so no
        // NaN ever becomes a live cell value.
        Ok(v) if v.is_nan() => None,
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

/// Converts one column to Float64. Integers widen, numeric strings (including
/// scientific notation) parse, everything else becomes missing. A bool column
/// is returned untouched unless `coerce_bool` is set.
pub fn numeric_column(column: &Column, options: NumericOptions) -> Column {
    match column {
        Column::Float64(v) => {
            Column::Float64(v.iter().map(|c| c.filter(|x| !x.is_nan())).collect())
        }
        Column::Int64(v) => Column::Float64(v.iter().map(|c| c.map(|x| x as f64)).collect()),
        Column::Text(v) => Column::Float64(
            v.iter()
                .map(|c| c.as_deref().and_then(parse_float))
                .collect(),
        ),
        Column::Bool(v) => {
            if options.coerce_bool {
                Column::Float64(
                    v.iter()
                        .map(|c| c.map(|b| if b { 1.0 } else { 0.0 }))
                        .collect(),
                )
            } else {
                column.clone()
            }
        }
        Column::DateTime(v) => Column::Float64(vec![None; v.len()]),
    }
}

/// Fixed-priority date formats. ISO forms come first so an unambiguous
/// `YYYY-MM-DD` can never be misread under `dayfirst`; only the
/// two-digit-leading forms reorder.
fn date_formats(dayfirst: bool) -> [&'static str; 6] {
    if dayfirst {
        [
            "%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%m-%d-%Y", "%m/%d/%Y",
        ]
    } else {
        [
            "%Y-%m-%d", "%Y/%m/%d", "%m-%d-%Y", "%m/%d/%Y", "%d-%m-%Y", "%d/%m/%Y",
        ]
    }
}

fn parse_datetime(raw: &str, options: DateTimeOptions) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in date_formats(options.dayfirst) {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Converts one column to DateTime. The first format that fully parses the
/// string wins; no partial parses, unparseable values become missing.
pub fn datetime_column(column: &Column, options: DateTimeOptions) -> Column {
    match column {
        Column::DateTime(v) => Column::DateTime(v.clone()),
        Column::Text(v) => Column::DateTime(
            v.iter()
                .map(|c| c.as_deref().and_then(|s| parse_datetime(s, options)))
                .collect(),
        ),
        other => Column::DateTime(vec![None; other.len()]),
    }
}

/// Converts one column to Bool. Accepts native booleans and case-insensitive
/// `"true"`/`"false"`; anything else becomes missing.
pub fn boolean_column(column: &Column) -> Column {
    match column {
        Column::Bool(v) => Column::Bool(v.clone()),
        Column::Text(v) => Column::Bool(
            v.iter()
                .map(|c| {
                    c.as_deref().and_then(|s| {
                        let trimmed = s.trim();
                        if trimmed.eq_ignore_ascii_case("true") {
                            Some(true)
                        } else if trimmed.eq_ignore_ascii_case("false") {
                            Some(false)
                        } else {
                            None
                        }
                    })
                })
                .collect(),
        ),
        other => Column::Bool(vec![None; other.len()]),
    }
}

/// Store-level `to_numeric`: replaces `name` with its Float64 coercion.
pub fn to_numeric(store: &ColumnStore, name: &str, options: NumericOptions) -> Result<ColumnStore> {
    let before = store.null_count(name)?;
    let coerced = numeric_column(store.column(name)?, options);
    let introduced = coerced.null_count() - before;
    if introduced > 0 {
        debug!(
            "to_numeric on '{}' turned {} unparseable value(s) missing",
            name, introduced
        );
    }
    store.with_column(name, coerced)
}

/// Store-level `to_datetime`: replaces `name` with its DateTime coercion.
pub fn to_datetime(
    store: &ColumnStore,
    name: &str,
    options: DateTimeOptions,
) -> Result<ColumnStore> {
    let before = store.null_count(name)?;
    let coerced = datetime_column(store.column(name)?, options);
    let introduced = coerced.null_count() - before;
    if introduced > 0 {
        debug!(
            "to_datetime on '{}' turned {} unparseable value(s) missing",
            name, introduced
        );
    }
    store.with_column(name, coerced)
}

/// Store-level `to_boolean`: replaces `name` with its Bool coercion.
pub fn to_boolean(store: &ColumnStore, name: &str) -> Result<ColumnStore> {
    let coerced = boolean_column(store.column(name)?);
    store.with_column(name, coerced)
}

/// Replaces missing cells in `name` with `value`. The fill value must match
/// the column's declared type; a mismatch is a caller error.
pub fn fill_null(store: &ColumnStore, name: &str, value: &Cell) -> Result<ColumnStore> {
    let column = store.column(name)?;
    let mismatch = |actual: &str| ScourError::TypeMismatch {
        column: name.to_string(),
        expected: column.dtype().to_string(),
        actual: actual.to_string(),
    };
    let filled = match (column, value) {
        (Column::Text(v), Cell::Text(fill)) => Column::Text(
            v.iter()
                .map(|c| c.clone().or_else(|| Some(fill.clone())))
                .collect(),
        ),
        (Column::Int64(v), Cell::Int(fill)) => {
            Column::Int64(v.iter().map(|c| c.or(Some(*fill))).collect())
        }
        (Column::Float64(v), Cell::Float(fill)) => {
            Column::Float64(v.iter().map(|c| c.or(Some(*fill))).collect())
        }
        (Column::Bool(v), Cell::Bool(fill)) => {
            Column::Bool(v.iter().map(|c| c.or(Some(*fill))).collect())
        }
        (Column::DateTime(v), Cell::DateTime(fill)) => {
            Column::DateTime(v.iter().map(|c| c.or(Some(*fill))).collect())
        }
        (_, Cell::Missing) => return Err(mismatch("missing")),
        (_, other) => {
            let actual = other
                .dtype()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "missing".to_string());
            return Err(mismatch(&actual));
        }
    };
    store.with_column(name, filled)
}
