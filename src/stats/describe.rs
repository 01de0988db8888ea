use serde::Serialize;

use crate::error::StatsError;

use super::quantile::{quantile_sorted, sorted_present};

/// Summary of one numeric column, as `DataFrame.describe()` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl ColumnStatistics {
    /// Describe the non-missing values of a column. `None` when there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_present(values);
        let count = sorted.len();
        if count == 0 {
            return None;
        }

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Some(ColumnStatistics {
            count,
            mean,
            std,
            min: sorted[0],
            q1: quantile_sorted(&sorted, 0.25)?,
            median: quantile_sorted(&sorted, 0.5)?,
            q3: quantile_sorted(&sorted, 0.75)?,
            max: sorted[count - 1],
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// One column's entry in a [`Description`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    pub column: String,
    pub stats: Result<ColumnStatistics, StatsError>,
}

/// Descriptive statistics for every numeric column, in dataset order.
///
/// A column without values carries its [`StatsError::EmptyColumn`]; the
/// other columns are described regardless.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Description {
    pub entries: Vec<ColumnDescription>,
}

impl Description {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Result<ColumnStatistics, StatsError>> {
        self.entries
            .iter()
            .find(|e| e.column == column)
            .map(|e| &e.stats)
    }
}
