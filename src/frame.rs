use crate::error::{Result, ScourError};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Declared type of a column. Raw, not-yet-coerced data is `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Text,
    Int64,
    Float64,
    Bool,
    DateTime,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::Text => "text",
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::DateTime => "datetime",
        };
        write!(f, "{}", s)
    }
}

/// Owned view of a single cell. `Missing` is representable regardless of the
/// column's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Declared type the cell belongs to; `Missing` carries none.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Cell::Missing => None,
            Cell::Text(_) => Some(DType::Text),
            Cell::Int(_) => Some(DType::Int64),
            Cell::Float(_) => Some(DType::Float64),
            Cell::Bool(_) => Some(DType::Bool),
            Cell::DateTime(_) => Some(DType::DateTime),
        }
    }
}

/// A homogeneously-typed sequence of cells with per-cell validity.
/// `None` is the missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<Option<String>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            Column::Text(_) => DType::Text,
            Column::Int64(_) => DType::Int64,
            Column::Float64(_) => DType::Float64,
            Column::Bool(_) => DType::Bool,
            Column::DateTime(_) => DType::DateTime,
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Text(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Int64(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Float64(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Bool(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::DateTime(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Owned view of the cell at `i`. Panics if `i` is out of bounds, like
    /// indexing a `Vec`; callers index within `0..len()`.
    pub fn cell(&self, i: usize) -> Cell {
        match self {
            Column::Text(v) => v[i].clone().map_or(Cell::Missing, Cell::Text),
            Column::Int64(v) => v[i].map_or(Cell::Missing, Cell::Int),
            Column::Float64(v) => v[i].map_or(Cell::Missing, Cell::Float),
            Column::Bool(v) => v[i].map_or(Cell::Missing, Cell::Bool),
            Column::DateTime(v) => v[i].map_or(Cell::Missing, Cell::DateTime),
        }
    }

    pub fn is_missing(&self, i: usize) -> bool {
        match self {
            Column::Text(v) => v[i].is_none(),
            Column::Int64(v) => v[i].is_none(),
            Column::Float64(v) => v[i].is_none(),
            Column::Bool(v) => v[i].is_none(),
            Column::DateTime(v) => v[i].is_none(),
        }
    }

    /// Rows of `self` where the mask bit is set, in order. The caller
    /// guarantees the mask length matches.
    pub(crate) fn filter(&self, mask: &Mask) -> Column {
        fn keep<T: Clone>(v: &[Option<T>], mask: &Mask) -> Vec<Option<T>> {
            v.iter()
                .zip(mask.bits())
                .filter(|(_, &m)| m)
                .map(|(c, _)| c.clone())
                .collect()
        }
        match self {
            Column::Text(v) => Column::Text(keep(v, mask)),
            Column::Int64(v) => Column::Int64(keep(v, mask)),
            Column::Float64(v) => Column::Float64(keep(v, mask)),
            Column::Bool(v) => Column::Bool(keep(v, mask)),
            Column::DateTime(v) => Column::DateTime(keep(v, mask)),
        }
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> Column {
        fn cut<T: Clone>(v: &[Option<T>], start: usize, end: usize) -> Vec<Option<T>> {
            v[start..end].to_vec()
        }
        match self {
            Column::Text(v) => Column::Text(cut(v, start, end)),
            Column::Int64(v) => Column::Int64(cut(v, start, end)),
            Column::Float64(v) => Column::Float64(cut(v, start, end)),
            Column::Bool(v) => Column::Bool(cut(v, start, end)),
            Column::DateTime(v) => Column::DateTime(cut(v, start, end)),
        }
    }
}

/// Row-aligned boolean selection vector. Valid only against a store with the
/// same row count; `ColumnStore::filter` enforces that.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask(Vec<bool>);

impl Mask {
    pub fn new(bits: Vec<bool>) -> Self {
        Mask(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn count_set(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    pub fn invert(&self) -> Mask {
        Mask(self.0.iter().map(|b| !b).collect())
    }
}

/// In-memory column-oriented table: ordered, uniquely named columns of equal
/// length. Every transform returns a new store; an existing store is never
/// mutated, so a caller can hold onto the input and reuse it after any
/// pipeline has run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnStore {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl ColumnStore {
    pub fn new() -> Self {
        ColumnStore::default()
    }

    /// Builds a store from `(name, column)` pairs, validating the equal-length
    /// invariant against the first column.
    pub fn from_columns(pairs: Vec<(String, Column)>) -> Result<Self> {
        let mut store = ColumnStore::new();
        for (name, column) in pairs {
            store = store.with_column(&name, column)?;
        }
        Ok(store)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ScourError::UnknownColumn {
                column: name.to_string(),
            })
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        Ok(&self.columns[self.position(name)?])
    }

    pub fn dtype_of(&self, name: &str) -> Result<DType> {
        Ok(self.column(name)?.dtype())
    }

    pub fn null_count(&self, name: &str) -> Result<usize> {
        Ok(self.column(name)?.null_count())
    }

    /// Projects the named columns in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<ColumnStore> {
        let mut pairs = Vec::with_capacity(names.len());
        for name in names {
            let idx = self.position(name.as_ref())?;
            pairs.push((self.names[idx].clone(), self.columns[idx].clone()));
        }
        ColumnStore::from_columns(pairs)
    }

    /// Positional row slice, `end` exclusive. Out-of-range bounds clamp to
    /// `[0, row_count]`; `start >= end` yields an empty store with the same
    /// columns.
    pub fn slice(&self, start: usize, end: usize) -> ColumnStore {
        let rows = self.row_count();
        let start = start.min(rows);
        let end = end.min(rows).max(start);
        ColumnStore {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.slice(start, end)).collect(),
        }
    }

    pub fn head(&self, n: usize) -> ColumnStore {
        self.slice(0, n)
    }

    pub fn tail(&self, n: usize) -> ColumnStore {
        self.slice(self.row_count().saturating_sub(n), self.row_count())
    }

    /// Returns a new store with the column added, or replaced if the name is
    /// already present. The first column added to an empty store sets the row
    /// count; afterwards a length mismatch is an error, never a truncate/pad.
    pub fn with_column(&self, name: &str, column: Column) -> Result<ColumnStore> {
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(ScourError::LengthMismatch {
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        let mut out = self.clone();
        match out.names.iter().position(|n| n == name) {
            Some(idx) => out.columns[idx] = column,
            None => {
                out.names.push(name.to_string());
                out.columns.push(column);
            }
        }
        Ok(out)
    }

    /// Keeps the rows where the mask is set, all columns, original order.
    pub fn filter(&self, mask: &Mask) -> Result<ColumnStore> {
        if mask.len() != self.row_count() {
            return Err(ScourError::LengthMismatch {
                expected: self.row_count(),
                actual: mask.len(),
            });
        }
        Ok(ColumnStore {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.filter(mask)).collect(),
        })
    }
}
