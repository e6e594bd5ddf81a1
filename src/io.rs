//! Load/save collaborators. The engine itself only ever sees in-memory
//! stores; this module owns all file/text framing. CSV loads produce raw
//! `Text` columns for the coercion stages to type later.

use crate::error::Result;
use crate::frame::{Cell, Column, ColumnStore};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Field values that load as missing rather than as text.
const MISSING_MARKERS: [&str; 5] = ["", "NaN", "nan", "NA", "null"];

fn is_missing_marker(field: &str) -> bool {
    MISSING_MARKERS.contains(&field)
}

/// Reads delimited text into a store of raw `Text` columns. The header row
/// names the columns; source field order is preserved.
pub fn read_csv_from<R: Read>(reader: R) -> Result<ColumnStore> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let names: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for record in csv_reader.records() {
        let record = record?;
        for (idx, field) in record.iter().enumerate() {
            if idx < columns.len() {
                let cell = if is_missing_marker(field) {
                    None
                } else {
                    Some(field.to_string())
                };
                columns[idx].push(cell);
            }
        }
    }
    ColumnStore::from_columns(
        names
            .into_iter()
            .zip(columns.into_iter().map(Column::Text))
            .collect(),
    )
}

pub fn read_csv(path: impl AsRef<Path>) -> Result<ColumnStore> {
    let store = read_csv_from(File::open(path.as_ref())?)?;
    info!(
        "loaded {} row(s), {} column(s) from {}",
        store.row_count(),
        store.column_names().len(),
        path.as_ref().display()
    );
    Ok(store)
}

fn render_field(cell: &Cell) -> String {
    match cell {
        Cell::Missing => String::new(),
        Cell::Text(v) => v.clone(),
        Cell::Int(v) => v.to_string(),
        Cell::Float(v) => v.to_string(),
        Cell::Bool(v) => v.to_string(),
        Cell::DateTime(v) => v.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}

/// Writes the store as delimited text, row order preserved. Missing renders
/// as the empty field, datetimes as ISO.
pub fn write_csv_to<W: Write>(store: &ColumnStore, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(store.column_names())?;
    let columns: Vec<&Column> = store
        .column_names()
        .iter()
        .filter_map(|n| store.column(n).ok())
        .collect();
    for row in 0..store.row_count() {
        let record: Vec<String> = columns.iter().map(|c| render_field(&c.cell(row))).collect();
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv(store: &ColumnStore, path: impl AsRef<Path>) -> Result<()> {
    write_csv_to(store, File::create(path.as_ref())?)?;
    info!("wrote {} row(s) to {}", store.row_count(), path.as_ref().display());
    Ok(())
}

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Missing => Value::Null,
        Cell::Text(v) => Value::String(v.clone()),
        Cell::Int(v) => Value::Number((*v).into()),
        // live float cells are never NaN, from_f64 cannot decline
        Cell::Float(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Cell::Bool(v) => Value::Bool(*v),
        Cell::DateTime(v) => Value::String(v.format("%Y-%m-%dT%H:%M:%S").to_string()),
    }
}

/// Writes the store as a JSON array of row objects, missing as `null`,
/// datetimes as ISO strings.
pub fn write_json_records_to<W: Write>(store: &ColumnStore, writer: W) -> Result<()> {
    let columns: Vec<(&String, &Column)> = store
        .column_names()
        .iter()
        .filter_map(|n| store.column(n).ok().map(|c| (n, c)))
        .collect();
    let mut records = Vec::with_capacity(store.row_count());
    for row in 0..store.row_count() {
        let mut object = Map::new();
        for (name, column) in &columns {
            object.insert((*name).clone(), cell_to_json(&column.cell(row)));
        }
        records.push(Value::Object(object));
    }
    serde_json::to_writer_pretty(writer, &Value::Array(records))?;
    Ok(())
}

pub fn write_json_records(store: &ColumnStore, path: impl AsRef<Path>) -> Result<()> {
    write_json_records_to(store, File::create(path.as_ref())?)?;
    info!("wrote {} row(s) to {}", store.row_count(), path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DType;

    const SAMPLE: &str = "\
id,name,age
1,Alice,25
2,,thirty
3,Charlie,NaN
";

    #[test]
    fn test_read_csv_raw_text_with_missing_markers() {
        let store = read_csv_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(store.column_names(), &["id", "name", "age"]);
        assert_eq!(store.row_count(), 3);
        for name in store.column_names() {
            assert_eq!(store.dtype_of(name).unwrap(), DType::Text);
        }
        assert_eq!(store.null_count("name").unwrap(), 1);
        assert_eq!(store.null_count("age").unwrap(), 1);
    }

    #[test]
    fn test_csv_round_trip_preserves_missing() {
        let store = read_csv_from(SAMPLE.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        write_csv_to(&store, &mut buffer).unwrap();
        let reread = read_csv_from(buffer.as_slice()).unwrap();
        assert_eq!(reread, store);
    }

    #[test]
    fn test_json_records_render_missing_as_null() {
        let store = read_csv_from(SAMPLE.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        write_json_records_to(&store, &mut buffer).unwrap();
        let parsed: Value = serde_json::from_slice(&buffer).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["name"], Value::Null);
        assert_eq!(rows[0]["name"], Value::String("Alice".to_string()));
    }

    #[test]
    fn test_typed_cells_render_canonically() {
        use chrono::NaiveDate;
        let store = ColumnStore::from_columns(vec![
            (
                "score".to_string(),
                Column::Float64(vec![Some(85.5), None]),
            ),
            (
                "signup".to_string(),
                Column::DateTime(vec![
                    NaiveDate::from_ymd_opt(2025, 1, 10)
                        .unwrap()
                        .and_hms_opt(0, 0, 0),
                    None,
                ]),
            ),
        ])
        .unwrap();
        let mut buffer = Vec::new();
        write_csv_to(&store, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("85.5"));
        assert!(text.contains("2025-01-10T00:00:00"));
    }
}
