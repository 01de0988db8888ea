use crate::error::DatasetError;

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Row predicate: a closed numeric range over one column
// ---------------------------------------------------------------------------

/// Which side of the range a row must fall on to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// `lower <= v <= upper`
    Inside,
    /// `v < lower || v > upper`
    Outside,
}

/// A numeric range test applied to a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub column: String,
    pub lower: f64,
    pub upper: f64,
    pub mode: RangeMode,
}

impl RangeFilter {
    pub fn inside(column: impl Into<String>, lower: f64, upper: f64) -> Self {
        RangeFilter {
            column: column.into(),
            lower,
            upper,
            mode: RangeMode::Inside,
        }
    }

    pub fn outside(column: impl Into<String>, lower: f64, upper: f64) -> Self {
        RangeFilter {
            column: column.into(),
            lower,
            upper,
            mode: RangeMode::Outside,
        }
    }

    /// Whether a cell value passes. Missing values never pass either mode.
    pub fn accepts(&self, value: Option<f64>) -> bool {
        let Some(v) = value else {
            return false;
        };
        match self.mode {
            RangeMode::Inside => v >= self.lower && v <= self.upper,
            RangeMode::Outside => v < self.lower || v > self.upper,
        }
    }
}

/// Return indices of rows that pass the filter, in row order.
pub fn filtered_indices(dataset: &Dataset, filter: &RangeFilter) -> Result<Vec<usize>, DatasetError> {
    let column = dataset.column(&filter.column)?;
    Ok((0..column.len())
        .filter(|&row| filter.accepts(column.f64_at(row)))
        .collect())
}

/// Copy of `dataset` keeping only the rows that pass. `dataset` is untouched.
pub fn retain_rows(dataset: &Dataset, filter: &RangeFilter) -> Result<Dataset, DatasetError> {
    let rows = filtered_indices(dataset, filter)?;
    Ok(dataset.take_rows(&rows))
}
