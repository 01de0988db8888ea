use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Date/time kept as its source text.
    Timestamp(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) | CellValue::Timestamp(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. Missing cells and NaN yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    fn is_number(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            CellValue::Null
        } else {
            CellValue::Float(v)
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(CellValue::Null, CellValue::from)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// ColumnType – declared type of a whole column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoAxis {
    Latitude,
    Longitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    /// Numeric column holding a geographic coordinate.
    Coordinate(GeoAxis),
    Text,
    Timestamp,
    Boolean,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Numeric | ColumnType::Coordinate(_))
    }

    /// Infer the column type from its cells.
    ///
    /// Rules, applied to the non-missing cells only:
    /// * all integers / floats → numeric (coordinate when the name says so)
    /// * all booleans → boolean
    /// * all timestamps → timestamp
    /// * anything else → text
    ///
    /// A column with no values at all is numeric, matching how an
    /// all-empty CSV column is read as a float column.
    pub fn infer(name: &str, values: &[CellValue]) -> Self {
        let mut present = values.iter().filter(|v| !v.is_missing()).peekable();
        if present.peek().is_none() {
            return numeric_or_coordinate(name);
        }

        let (mut numbers, mut bools, mut stamps, mut total) = (0usize, 0usize, 0usize, 0usize);
        for v in present {
            total += 1;
            match v {
                CellValue::Integer(_) | CellValue::Float(_) => numbers += 1,
                CellValue::Bool(_) => bools += 1,
                CellValue::Timestamp(_) => stamps += 1,
                _ => {}
            }
        }

        if numbers == total {
            numeric_or_coordinate(name)
        } else if bools == total {
            ColumnType::Boolean
        } else if stamps == total {
            ColumnType::Timestamp
        } else {
            ColumnType::Text
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Coordinate(GeoAxis::Latitude) => write!(f, "latitude"),
            ColumnType::Coordinate(GeoAxis::Longitude) => write!(f, "longitude"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Boolean => write!(f, "boolean"),
        }
    }
}

fn numeric_or_coordinate(name: &str) -> ColumnType {
    match name.trim().to_ascii_lowercase().as_str() {
        "lat" | "latitude" => ColumnType::Coordinate(GeoAxis::Latitude),
        "lon" | "lng" | "longitude" => ColumnType::Coordinate(GeoAxis::Longitude),
        _ => ColumnType::Numeric,
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// One named column of the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
    pub values: Vec<CellValue>,
}

impl Column {
    /// Build a column, inferring its type from the values.
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        let name = name.into();
        let kind = ColumnType::infer(&name, &values);
        Column { name, kind, values }
    }

    /// Float column; NaN entries become missing cells.
    pub fn numeric(name: impl Into<String>, values: &[f64]) -> Self {
        Column::new(name, values.iter().map(|&v| CellValue::from(v)).collect())
    }

    pub fn text(name: impl Into<String>, values: &[&str]) -> Self {
        Column::new(name, values.iter().map(|&s| CellValue::from(s)).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric() && self.values.iter().all(|v| v.is_missing() || v.is_number())
    }

    /// Value of row `row` as a number, `None` when missing.
    pub fn f64_at(&self, row: usize) -> Option<f64> {
        self.values.get(row).and_then(CellValue::as_f64)
    }

    /// All non-missing numeric values in row order.
    pub fn present_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(CellValue::as_f64).collect()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    fn take(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            kind: self.kind,
            values: rows
                .iter()
                .map(|&r| self.values.get(r).cloned().unwrap_or(CellValue::Null))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset, checking that names are unique and lengths agree.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let rows = columns.first().map_or(0, Column::len);
        let mut seen = BTreeSet::new();

        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(col.name.clone()));
            }
            if col.len() != rows {
                return Err(DatasetError::LengthMismatch {
                    column: col.name.clone(),
                    expected: rows,
                    found: col.len(),
                });
            }
        }

        Ok(Dataset { columns, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    /// Numeric columns in dataset order.
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    /// Missing-value count per column, in dataset order.
    pub fn missing_counts(&self) -> Vec<(&str, usize)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.missing_count()))
            .collect()
    }

    /// Cells of row `row` in column order.
    pub fn row(&self, row: usize) -> Vec<CellValue> {
        self.columns
            .iter()
            .map(|c| c.values.get(row).cloned().unwrap_or(CellValue::Null))
            .collect()
    }

    /// Copy of the dataset restricted to `rows`, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            rows: rows.len(),
        }
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Dataset {
        let rows: Vec<usize> = (0..n.min(self.rows)).collect();
        self.take_rows(&rows)
    }
}
