use serde::Serialize;

use crate::data::filter::RangeFilter;
use crate::error::StatsError;

use super::describe::ColumnStatistics;

/// Tukey fence multiplier applied to the IQR.
pub const DEFAULT_FENCE_MULTIPLIER: f64 = 1.5;

/// The IQR rule: a value is an outlier when it falls more than
/// `multiplier * IQR` below Q1 or above Q3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierRule {
    multiplier: f64,
}

impl Default for OutlierRule {
    fn default() -> Self {
        OutlierRule {
            multiplier: DEFAULT_FENCE_MULTIPLIER,
        }
    }
}

impl OutlierRule {
    pub fn new(multiplier: f64) -> Result<Self, StatsError> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(StatsError::InvalidRule(multiplier));
        }
        Ok(OutlierRule { multiplier })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Fences from a column's quartiles.
    pub fn fences(&self, q1: f64, q3: f64) -> Fences {
        let iqr = q3 - q1;
        Fences {
            q1,
            q3,
            iqr,
            lower: q1 - self.multiplier * iqr,
            upper: q3 + self.multiplier * iqr,
        }
    }

    pub fn fences_for(&self, stats: &ColumnStatistics) -> Fences {
        self.fences(stats.q1, stats.q3)
    }
}

/// Outlier bounds of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    /// `v < lower || v > upper`. With a zero IQR every value other than
    /// the constant is flagged.
    pub fn is_outlier(&self, v: f64) -> bool {
        v < self.lower || v > self.upper
    }

    /// Predicate selecting the rows flagged by these fences.
    pub fn outside(&self, column: &str) -> RangeFilter {
        RangeFilter::outside(column, self.lower, self.upper)
    }

    /// Predicate selecting the rows kept by outlier removal (inclusive).
    pub fn inside(&self, column: &str) -> RangeFilter {
        RangeFilter::inside(column, self.lower, self.upper)
    }
}

/// Rows of one column that fall outside its fences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSet {
    pub column: String,
    pub fences: Fences,
    /// Row indices into the dataset the set was computed on.
    pub rows: Vec<usize>,
    /// Values at `rows`, same order.
    pub values: Vec<f64>,
}

impl OutlierSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
