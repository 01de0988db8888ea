//! Statistics engine: descriptive statistics, covariance / correlation,
//! correlation extremes and IQR outliers over the numeric columns of a
//! [`Dataset`].
//!
//! Every operation is a pure function of the dataset. Per-column failures
//! stay with their column: batch operations collect them instead of
//! stopping at the first one.

pub mod correlation;
pub mod describe;
pub mod outliers;
pub mod quantile;

use log::{debug, warn};

use crate::data::filter::{filtered_indices, retain_rows};
use crate::data::model::{Column, Dataset};
use crate::error::StatsError;

use correlation::{CorrelationExtremes, SquareMatrix, find_extremes};
use describe::{ColumnDescription, ColumnStatistics, Description};
use outliers::{Fences, OutlierRule, OutlierSet};

/// Statistics over one dataset.
///
/// The numeric columns are resolved once, when the engine is built, and
/// reused by every operation.
#[derive(Debug, Clone)]
pub struct StatisticsEngine<'a> {
    dataset: &'a Dataset,
    numeric: Vec<&'a Column>,
    rule: OutlierRule,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        let numeric = dataset.numeric_columns();
        debug!(
            "statistics engine: {} of {} columns numeric",
            numeric.len(),
            dataset.columns().len()
        );
        StatisticsEngine {
            dataset,
            numeric,
            rule: OutlierRule::default(),
        }
    }

    /// Replace the default (1.5 x IQR) outlier rule.
    pub fn with_rule(mut self, rule: OutlierRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn rule(&self) -> OutlierRule {
        self.rule
    }

    pub fn numeric_columns(&self) -> &[&'a Column] {
        &self.numeric
    }

    fn numeric_column(&self, name: &str) -> Result<&'a Column, StatsError> {
        let column = self.dataset.column(name)?;
        if !column.is_numeric() {
            return Err(StatsError::NotNumeric(name.to_string()));
        }
        Ok(column)
    }

    // -- Descriptive statistics --

    /// Statistics of a single numeric column.
    pub fn column_statistics(&self, name: &str) -> Result<ColumnStatistics, StatsError> {
        let column = self.numeric_column(name)?;
        describe_column(column)
    }

    /// count, mean, std, min, Q1, median, Q3 and max of every numeric column.
    pub fn describe(&self) -> Description {
        let entries = self
            .numeric
            .iter()
            .map(|column| ColumnDescription {
                column: column.name.clone(),
                stats: describe_column(column),
            })
            .collect();
        Description { entries }
    }

    // -- Outliers --

    /// IQR fences of a numeric column under the engine's rule.
    pub fn fences(&self, name: &str) -> Result<Fences, StatsError> {
        let stats = self.column_statistics(name)?;
        Ok(self.rule.fences_for(&stats))
    }

    /// Rows of `name` outside its own IQR fences.
    pub fn detect_outliers(&self, name: &str) -> Result<OutlierSet, StatsError> {
        let fences = self.fences(name)?;
        self.detect_outliers_with_fences(name, fences)
    }

    /// Rows of `name` outside fences computed elsewhere, e.g. on the data
    /// before outlier removal.
    pub fn detect_outliers_with_fences(
        &self,
        name: &str,
        fences: Fences,
    ) -> Result<OutlierSet, StatsError> {
        let column = self.numeric_column(name)?;
        let rows = filtered_indices(self.dataset, &fences.outside(name))?;
        let values = rows.iter().filter_map(|&r| column.f64_at(r)).collect();
        debug!("{name}: {} outliers outside [{}, {}]", rows.len(), fences.lower, fences.upper);
        Ok(OutlierSet {
            column: name.to_string(),
            fences,
            rows,
            values,
        })
    }

    /// Outlier detection over every numeric column, in dataset order.
    pub fn detect_all_outliers(&self) -> Vec<(String, Result<OutlierSet, StatsError>)> {
        self.numeric
            .iter()
            .map(|column| (column.name.clone(), self.detect_outliers(&column.name)))
            .collect()
    }

    /// Copy of the dataset keeping the rows whose `name` value lies within
    /// the fences (inclusive). Rows missing a value in `name` are dropped.
    /// Other columns are not filtered on, and the engine's dataset is left
    /// unchanged.
    pub fn remove_outliers(&self, name: &str) -> Result<Dataset, StatsError> {
        let fences = self.fences(name)?;
        Ok(retain_rows(self.dataset, &fences.inside(name))?)
    }

    // -- Covariance / correlation --

    pub fn covariance_matrix(&self) -> SquareMatrix {
        correlation::covariance_matrix(&self.numeric)
    }

    /// Pearson correlation matrix with its 1.0 diagonal intact.
    pub fn correlation_matrix(&self) -> SquareMatrix {
        correlation::correlation_matrix(&self.numeric)
    }

    /// Strongest positive and negative correlation between numeric columns.
    ///
    /// See [`find_extremes`] for the visiting order and tie-break.
    pub fn correlation_extremes(
        &self,
        exclude_self_pairs: bool,
    ) -> Result<CorrelationExtremes, StatsError> {
        if self.numeric.len() < 2 {
            return Err(StatsError::InsufficientData {
                found: self.numeric.len(),
            });
        }
        find_extremes(&self.correlation_matrix(), exclude_self_pairs)
    }
}

fn describe_column(column: &Column) -> Result<ColumnStatistics, StatsError> {
    ColumnStatistics::from_values(&column.present_values()).ok_or_else(|| {
        warn!("column '{}' has no values to describe", column.name);
        StatsError::EmptyColumn(column.name.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;

    fn dataset(columns: Vec<Column>) -> Dataset {
        Dataset::from_columns(columns).unwrap()
    }

    #[test]
    fn iqr_outlier_scenario() {
        let ds = dataset(vec![Column::numeric("v", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0])]);
        let engine = StatisticsEngine::new(&ds);

        let set = engine.detect_outliers("v").unwrap();
        assert!((set.fences.q1 - 2.25).abs() < 1e-12);
        assert!((set.fences.q3 - 4.75).abs() < 1e-12);
        assert!((set.fences.iqr - 2.5).abs() < 1e-12);
        assert!((set.fences.lower + 1.5).abs() < 1e-12);
        assert!((set.fences.upper - 8.5).abs() < 1e-12);
        assert_eq!(set.rows, vec![5]);
        assert_eq!(set.values, vec![100.0]);
    }

    #[test]
    fn correlation_extremes_scenario() {
        let ds = dataset(vec![
            Column::numeric("A", &[1.0, 2.0, 3.0, 4.0]),
            Column::numeric("B", &[4.0, 3.0, 2.0, 1.0]),
            Column::numeric("C", &[1.0, 2.0, 3.0, 4.0]),
        ]);
        let ex = StatisticsEngine::new(&ds).correlation_extremes(true).unwrap();

        assert_eq!(ex.max_pair, ("A".to_string(), "C".to_string()));
        assert!((ex.max_value - 1.0).abs() < 1e-12);
        assert_eq!(ex.min_pair, ("A".to_string(), "B".to_string()));
        assert!((ex.min_value + 1.0).abs() < 1e-12);
    }

    #[test]
    fn extremes_need_two_numeric_columns() {
        let ds = dataset(vec![
            Column::numeric("A", &[1.0, 2.0, 3.0]),
            Column::text("site", &["x", "y", "z"]),
        ]);
        let err = StatisticsEngine::new(&ds).correlation_extremes(true).unwrap_err();
        assert_eq!(err, StatsError::InsufficientData { found: 1 });
    }

    #[test]
    fn extremes_leave_the_matrix_diagonal_alone() {
        let ds = dataset(vec![
            Column::numeric("A", &[1.0, 2.0, 3.0, 4.0]),
            Column::numeric("B", &[2.0, 1.0, 4.0, 3.0]),
        ]);
        let engine = StatisticsEngine::new(&ds);
        engine.correlation_extremes(true).unwrap();
        let corr = engine.correlation_matrix();
        assert!((corr.rows[0][0] - 1.0).abs() < 1e-12);
        assert!((corr.rows[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn removal_then_detection_with_original_fences_is_empty() {
        let ds = dataset(vec![
            Column::numeric("v", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0, -40.0, 3.5]),
            Column::text("site", &["a", "b", "c", "d", "e", "f", "g", "h"]),
        ]);
        let engine = StatisticsEngine::new(&ds);
        let original = engine.fences("v").unwrap();

        let cleaned = engine.remove_outliers("v").unwrap();
        assert_eq!(cleaned.len(), 6);
        assert_eq!(ds.len(), 8);

        let again = StatisticsEngine::new(&cleaned)
            .detect_outliers_with_fences("v", original)
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn removal_does_not_cascade() {
        let ds = dataset(vec![
            Column::numeric("v", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]),
            Column::numeric("w", &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]),
        ]);
        let cleaned = StatisticsEngine::new(&ds).remove_outliers("w").unwrap();
        assert_eq!(cleaned.len(), 6);
    }

    #[test]
    fn constant_column_flags_any_deviation() {
        let ds = dataset(vec![Column::numeric("k", &[7.0, 7.0, 7.0, 7.0, 7.0, 7.1])]);
        let set = StatisticsEngine::new(&ds).detect_outliers("k").unwrap();
        assert_eq!(set.fences.iqr, 0.0);
        assert_eq!(set.rows, vec![5]);
    }

    #[test]
    fn missing_values_are_not_outliers() {
        let ds = dataset(vec![Column::numeric("v", &[1.0, f64::NAN, 2.0, 3.0, 50.0])]);
        let engine = StatisticsEngine::new(&ds);
        let set = engine.detect_outliers("v").unwrap();
        assert_eq!(set.rows, vec![4]);
        assert_eq!(engine.remove_outliers("v").unwrap().len(), 3);
    }

    #[test]
    fn empty_column_does_not_stop_the_others() {
        let ds = dataset(vec![
            Column::numeric("empty", &[f64::NAN, f64::NAN]),
            Column::numeric("full", &[1.0, 2.0]),
        ]);
        let engine = StatisticsEngine::new(&ds);
        let description = engine.describe();

        assert_eq!(description.len(), 2);
        assert_eq!(
            description.get("empty"),
            Some(&Err(StatsError::EmptyColumn("empty".into())))
        );
        assert_eq!(description.get("full").unwrap().as_ref().unwrap().count, 2);

        let all = engine.detect_all_outliers();
        assert!(all[0].1.is_err());
        assert!(all[1].1.is_ok());
    }

    #[test]
    fn no_numeric_columns_describes_nothing() {
        let ds = dataset(vec![Column::text("site", &["a", "b"])]);
        assert!(StatisticsEngine::new(&ds).describe().is_empty());
    }

    #[test]
    fn column_lookup_errors() {
        let ds = dataset(vec![Column::text("site", &["a"])]);
        let engine = StatisticsEngine::new(&ds);
        assert_eq!(
            engine.detect_outliers("site"),
            Err(StatsError::NotNumeric("site".into()))
        );
        assert_eq!(
            engine.detect_outliers("pH"),
            Err(StatsError::Dataset(DatasetError::UnknownColumn("pH".into())))
        );
    }

    #[test]
    fn custom_rule_widens_fences() {
        let ds = dataset(vec![Column::numeric("v", &[1.0, 2.0, 3.0, 4.0, 5.0, 9.0])]);
        let strict = StatisticsEngine::new(&ds);
        let loose = StatisticsEngine::new(&ds).with_rule(OutlierRule::new(3.0).unwrap());
        assert_eq!(strict.detect_outliers("v").unwrap().len(), 1);
        assert!(loose.detect_outliers("v").unwrap().is_empty());
    }
}
