use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Dataset};

/// Tokens read as a missing value, in addition to the empty string.
const MISSING_TOKENS: &[&str] = &["na", "n/a", "nan", "null", "none"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// chrono accepts one-digit years, so `1-2-3` would parse as a date.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one column per field
/// * `.json`    – `[{ "Temp °C": 28.1, "pH": 8.0, ... }, ...]`
/// * `.parquet` – flat scalar columns (as written by `df.to_parquet()`)
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(
        "loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.columns().len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    parse_csv(file)
}

/// CSV layout: header row with column names, then one record per row.
/// Every cell is typed on its own; the column type follows from its cells.
pub fn parse_csv<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(guess_cell_type(record.get(col_idx).unwrap_or("")));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();

    Dataset::from_columns(columns).context("assembling CSV columns")
}

fn guess_cell_type(raw: &str) -> CellValue {
    let s = raw.trim();
    if s.is_empty() || MISSING_TOKENS.contains(&s.to_ascii_lowercase().as_str()) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    match s.to_ascii_lowercase().as_str() {
        "true" => return CellValue::Bool(true),
        "false" => return CellValue::Bool(false),
        _ => {}
    }
    text_cell(s)
}

/// Text that looks like a date or a time of day becomes a timestamp cell.
fn text_cell(s: &str) -> CellValue {
    if looks_like_timestamp(s) {
        CellValue::Timestamp(s.to_string())
    } else {
        CellValue::Text(s.to_string())
    }
}

/// Accepts the layouts in [`DATETIME_FORMATS`], [`DATE_FORMATS`] and
/// [`TIME_FORMATS`] plus RFC 3339. Dates must parse to a real calendar day
/// inside [`YEAR_RANGE`], times to a real time of day.
fn looks_like_timestamp(s: &str) -> bool {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return YEAR_RANGE.contains(&dt.year());
    }
    if DATETIME_FORMATS.iter().any(|fmt| {
        NaiveDateTime::parse_from_str(s, fmt).is_ok_and(|dt| YEAR_RANGE.contains(&dt.year()))
    }) {
        return true;
    }
    if DATE_FORMATS.iter().any(|fmt| {
        NaiveDate::parse_from_str(s, fmt).is_ok_and(|d| YEAR_RANGE.contains(&d.year()))
    }) {
        return true;
    }
    TIME_FORMATS
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(s, fmt).is_ok())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Time": "10:00:00", "Temp °C": 28.1, "pH": 8.02 },
///   ...
/// ]
/// ```
///
/// Columns appear in the order keys are first seen (`serde_json` is built
/// with `preserve_order`). A key missing from a record is a missing value
/// for that row.
pub fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut objects = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if seen.insert(key.as_str()) {
                names.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let columns = names
        .iter()
        .map(|name| {
            let values = objects
                .iter()
                .map(|obj| obj.get(name).map_or(CellValue::Null, json_to_cell))
                .collect();
            Column::new(name.clone(), values)
        })
        .collect();

    Dataset::from_columns(columns).context("assembling JSON columns")
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => text_cell(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns.
///
/// Integer and float columns become numeric, strings become text (or
/// timestamps when they look like one), booleans stay booleans, and Arrow
/// date/time types are kept as their display text.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); schema.fields().len()];

    for (batch_no, batch_result) in reader.enumerate() {
        let batch = batch_result.context("reading parquet record batch")?;
        debug!("parquet batch {batch_no}: {} rows", batch.num_rows());

        for (col_idx, column) in cells.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                column.push(extract_cell(array, row));
            }
        }
    }

    let columns = schema
        .fields()
        .iter()
        .zip(cells)
        .map(|(field, values)| Column::new(field.name().clone(), values))
        .collect();

    Dataset::from_columns(columns).context("assembling parquet columns")
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let cell = match col.data_type() {
        DataType::Utf8 => col.as_string_opt::<i32>().map(|s| text_cell(s.value(row))),
        DataType::LargeUtf8 => col.as_string_opt::<i64>().map(|s| text_cell(s.value(row))),
        DataType::Int16 => col
            .as_primitive_opt::<Int16Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| CellValue::from(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| CellValue::from(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| CellValue::Bool(a.value(row))),
        DataType::Timestamp(_, _)
        | DataType::Date32
        | DataType::Date64
        | DataType::Time32(_)
        | DataType::Time64(_) => array_value_to_string(col.as_ref(), row).ok().map(CellValue::Timestamp),
        _ => array_value_to_string(col.as_ref(), row).ok().map(CellValue::Text),
    };
    cell.unwrap_or(CellValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnType;

    #[test]
    fn csv_infers_column_types() {
        let csv = "Time,Latitude,Temp °C,pH,Station\n\
                   10:00:00,25.71,28.1,8.0,A\n\
                   10:00:01,25.72,NA,8.1,B\n\
                   10:00:02,25.73,28.3,,C\n";
        let ds = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.column_names(),
            vec!["Time", "Latitude", "Temp °C", "pH", "Station"]
        );
        assert_eq!(ds.column("Time").unwrap().kind, ColumnType::Timestamp);
        assert!(ds.column("Latitude").unwrap().is_numeric());
        assert_eq!(ds.column("Temp °C").unwrap().missing_count(), 1);
        assert_eq!(ds.column("pH").unwrap().present_values(), vec![8.0, 8.1]);
        assert_eq!(ds.column("Station").unwrap().kind, ColumnType::Text);
    }

    #[test]
    fn csv_integer_and_float_cells_share_a_column() {
        let ds = parse_csv("depth\n1\n2.5\n".as_bytes()).unwrap();
        let col = ds.column("depth").unwrap();
        assert_eq!(col.kind, ColumnType::Numeric);
        assert_eq!(col.present_values(), vec![1.0, 2.5]);
    }

    #[test]
    fn timestamp_shapes() {
        assert!(looks_like_timestamp("2024-10-25"));
        assert!(looks_like_timestamp("2024-10-25 13:45:00"));
        assert!(looks_like_timestamp("2024-10-25T13:45:00Z"));
        assert!(looks_like_timestamp("10/25/2024 13:45"));
        assert!(looks_like_timestamp("13:45:07"));
        assert!(!looks_like_timestamp("Biscayne Bay"));
        assert!(!looks_like_timestamp("1-2"));
        assert!(!looks_like_timestamp("12345-1-1"));
        assert!(!looks_like_timestamp("1-2-3"));
        assert!(!looks_like_timestamp("99:99"));
        assert!(!looks_like_timestamp("13:61:75"));
        assert!(!looks_like_timestamp("2024-02-30"));
    }

    #[test]
    fn invalid_dates_and_times_stay_text() {
        let ds = parse_csv("Time,Station\n99:99,1-2-3\n13:61:75,4-5-6\n".as_bytes()).unwrap();
        assert_eq!(ds.column("Time").unwrap().kind, ColumnType::Text);
        assert_eq!(ds.column("Station").unwrap().kind, ColumnType::Text);
    }

    #[test]
    fn json_records_fill_missing_keys() {
        let text = r#"[{"pH": 8.0, "site": "A"}, {"pH": 7, "depth": 1.5}]"#;
        let ds = parse_json(text).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("depth").unwrap().missing_count(), 1);
        assert_eq!(ds.column("pH").unwrap().present_values(), vec![8.0, 7.0]);
        assert_eq!(ds.column("site").unwrap().kind, ColumnType::Text);
    }

    #[test]
    fn json_keeps_key_order() {
        let text = r#"[
            {"pH": 1.0, "Temp": 1.0, "Depth": 4.0},
            {"pH": 2.0, "Temp": 2.0, "Depth": 3.0},
            {"pH": 3.0, "Temp": 3.0, "Depth": 2.0}
        ]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.column_names(), vec!["pH", "Temp", "Depth"]);

        let ex = crate::stats::StatisticsEngine::new(&ds)
            .correlation_extremes(true)
            .unwrap();
        assert_eq!(ex.max_pair, ("pH".to_string(), "Temp".to_string()));
        assert_eq!(ex.min_pair, ("pH".to_string(), "Depth".to_string()));
    }

    #[test]
    fn json_must_be_array_of_objects() {
        assert!(parse_json(r#"{"pH": 8.0}"#).is_err());
        assert!(parse_json(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("readings.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
