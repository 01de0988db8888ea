//! EDA report: everything the engine computes for one dataset, gathered
//! into plain serializable sections, plus a text rendering.

use std::fmt::Write;

use anyhow::Result;
use log::info;
use serde::Serialize;

use crate::config::ReportConfig;
use crate::data::model::{CellValue, ColumnType, Dataset};
use crate::stats::StatisticsEngine;
use crate::stats::correlation::{CorrelationExtremes, SquareMatrix};
use crate::stats::describe::ColumnStatistics;
use crate::stats::outliers::Fences;

// ---------------------------------------------------------------------------
// Report sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ColumnOverview {
    pub name: String,
    pub kind: ColumnType,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub columns: Vec<ColumnOverview>,
    /// First rows of the dataset, cells in column order.
    pub preview: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveRow {
    pub column: String,
    pub stats: Option<ColumnStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierSummary {
    pub column: String,
    pub fences: Option<Fences>,
    pub outlier_rows: Vec<usize>,
    /// Size of the outliers-removed copy. The copy itself is discarded.
    pub rows_after_removal: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtremesSection {
    pub exclude_self_pairs: bool,
    pub extremes: Option<CorrelationExtremes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full exploratory report of one dataset.
///
/// Outlier removal is diagnostic: every section is computed on the
/// dataset as loaded.
#[derive(Debug, Clone, Serialize)]
pub struct EdaReport {
    pub fence_multiplier: f64,
    pub overview: Overview,
    pub descriptive: Vec<DescriptiveRow>,
    pub outliers: Vec<OutlierSummary>,
    pub covariance: SquareMatrix,
    pub correlation: SquareMatrix,
    pub correlation_extremes: ExtremesSection,
}

impl EdaReport {
    pub fn build(dataset: &Dataset, config: &ReportConfig) -> Result<Self> {
        let rule = config.outlier_rule()?;
        let engine = StatisticsEngine::new(dataset).with_rule(rule);

        let head = dataset.head(config.head_rows);
        let overview = Overview {
            rows: dataset.len(),
            columns: dataset
                .columns()
                .iter()
                .map(|c| ColumnOverview {
                    name: c.name.clone(),
                    kind: c.kind,
                    missing: c.missing_count(),
                })
                .collect(),
            preview: (0..head.len()).map(|r| head.row(r)).collect(),
        };

        let descriptive = engine
            .describe()
            .entries
            .into_iter()
            .map(|entry| match entry.stats {
                Ok(stats) => DescriptiveRow {
                    column: entry.column,
                    stats: Some(stats),
                    error: None,
                },
                Err(e) => DescriptiveRow {
                    column: entry.column,
                    stats: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        let outliers = engine
            .detect_all_outliers()
            .into_iter()
            .map(|(column, result)| match result {
                Ok(set) => OutlierSummary {
                    rows_after_removal: engine.remove_outliers(&column).ok().map(|d| d.len()),
                    column,
                    fences: Some(set.fences),
                    outlier_rows: set.rows,
                    error: None,
                },
                Err(e) => OutlierSummary {
                    column,
                    fences: None,
                    outlier_rows: Vec::new(),
                    rows_after_removal: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        let (extremes, extremes_error) = match engine.correlation_extremes(config.exclude_self_pairs)
        {
            Ok(ex) => (Some(ex), None),
            Err(e) => (None, Some(e.to_string())),
        };

        info!(
            "report built: {} rows, {} numeric columns",
            dataset.len(),
            engine.numeric_columns().len()
        );

        Ok(EdaReport {
            fence_multiplier: rule.multiplier(),
            overview,
            descriptive,
            outliers,
            covariance: engine.covariance_matrix(),
            correlation: engine.correlation_matrix(),
            correlation_extremes: ExtremesSection {
                exclude_self_pairs: config.exclude_self_pairs,
                extremes,
                error: extremes_error,
            },
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text rendering with `precision` decimal places.
    pub fn render_text(&self, precision: usize) -> String {
        let num = |v: f64| fmt_num(v, precision);
        let mut out = String::new();

        // ---- Dataset ----
        let _ = writeln!(out, "== Dataset ==");
        let _ = writeln!(
            out,
            "{} rows, {} columns\n",
            self.overview.rows,
            self.overview.columns.len()
        );
        let rows: Vec<Vec<String>> = self
            .overview
            .columns
            .iter()
            .map(|c| vec![c.name.clone(), c.kind.to_string(), c.missing.to_string()])
            .collect();
        out.push_str(&table(&["column", "type", "missing"], &rows));

        if !self.overview.preview.is_empty() {
            let headers: Vec<&str> = self.overview.columns.iter().map(|c| c.name.as_str()).collect();
            let rows: Vec<Vec<String>> = self
                .overview
                .preview
                .iter()
                .map(|r| r.iter().map(|cell| fmt_cell(cell, precision)).collect())
                .collect();
            let _ = writeln!(out, "\nFirst {} rows:", rows.len());
            out.push_str(&table(&headers, &rows));
        }

        // ---- Descriptive statistics ----
        let _ = writeln!(out, "\n== Descriptive statistics ==");
        let rows: Vec<Vec<String>> = self
            .descriptive
            .iter()
            .map(|d| match (&d.stats, &d.error) {
                (Some(s), _) => vec![
                    d.column.clone(),
                    s.count.to_string(),
                    num(s.mean),
                    s.std.map_or_else(|| "-".to_string(), num),
                    num(s.min),
                    num(s.q1),
                    num(s.median),
                    num(s.q3),
                    num(s.max),
                ],
                (None, _) => {
                    let mut row = vec![d.column.clone(), "0".to_string()];
                    row.resize(9, "-".to_string());
                    row
                }
            })
            .collect();
        out.push_str(&table(
            &["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"],
            &rows,
        ));
        for d in &self.descriptive {
            if let Some(err) = &d.error {
                let _ = writeln!(out, "{}: {err}", d.column);
            }
        }

        // ---- Outliers ----
        let _ = writeln!(out, "\n== Outliers (IQR x {}) ==", self.fence_multiplier);
        let rows: Vec<Vec<String>> = self
            .outliers
            .iter()
            .map(|o| match &o.fences {
                Some(f) => vec![
                    o.column.clone(),
                    num(f.q1),
                    num(f.q3),
                    num(f.iqr),
                    num(f.lower),
                    num(f.upper),
                    o.outlier_rows.len().to_string(),
                    o.rows_after_removal.map_or_else(|| "-".to_string(), |n| n.to_string()),
                ],
                None => vec![o.column.clone(), o.error.clone().unwrap_or_default()],
            })
            .collect();
        out.push_str(&table(
            &["column", "Q1", "Q3", "IQR", "lower", "upper", "outliers", "rows kept"],
            &rows,
        ));
        let _ = writeln!(
            out,
            "(rows kept: size of the outliers-removed copy; other sections use all rows)"
        );

        // ---- Covariance / correlation ----
        let _ = writeln!(out, "\n== Covariance ==");
        out.push_str(&matrix_table(&self.covariance, precision));
        let _ = writeln!(out, "\n== Correlation ==");
        out.push_str(&matrix_table(&self.correlation, precision));

        let _ = writeln!(out, "\n== Strongest correlations ==");
        match (&self.correlation_extremes.extremes, &self.correlation_extremes.error) {
            (Some(ex), _) => {
                let _ = writeln!(
                    out,
                    "highest positive: ({}, {}) = {}",
                    ex.max_pair.0,
                    ex.max_pair.1,
                    num(ex.max_value)
                );
                let _ = writeln!(
                    out,
                    "highest negative: ({}, {}) = {}",
                    ex.min_pair.0,
                    ex.min_pair.1,
                    num(ex.min_value)
                );
            }
            (None, err) => {
                let _ = writeln!(out, "unavailable: {}", err.as_deref().unwrap_or("unknown"));
            }
        }

        out
    }
}

// ---------------------------------------------------------------------------
// Text table helpers
// ---------------------------------------------------------------------------

fn fmt_num(v: f64, precision: usize) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.precision$}")
    }
}

fn fmt_cell(cell: &CellValue, precision: usize) -> String {
    match cell {
        CellValue::Float(v) => fmt_num(*v, precision),
        CellValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn matrix_table(matrix: &SquareMatrix, precision: usize) -> String {
    let mut headers = vec![""];
    headers.extend(matrix.labels.iter().map(String::as_str));
    let rows: Vec<Vec<String>> = matrix
        .labels
        .iter()
        .zip(&matrix.rows)
        .map(|(label, row)| {
            std::iter::once(label.clone())
                .chain(row.iter().map(|&v| fmt_num(v, precision)))
                .collect()
        })
        .collect();
    table(&headers, &rows)
}

/// Left-aligned first column, right-aligned rest. Short rows are padded.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let n = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(n) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &widths, headers);
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_line(&mut out, &widths, &cells);
    }
    out
}

fn push_line(out: &mut String, widths: &[usize], cells: &[&str]) {
    let parts: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let cell = cells.get(i).copied().unwrap_or("");
            let pad = " ".repeat(width.saturating_sub(cell.chars().count()));
            if i == 0 {
                format!("{cell}{pad}")
            } else {
                format!("{pad}{cell}")
            }
        })
        .collect();
    let _ = writeln!(out, "{}", parts.join("  ").trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::text("Station", &["a", "b", "c", "d", "e", "f"]),
            Column::numeric("Temp °C", &[28.0, 28.5, 29.0, 29.5, 30.0, 45.0]),
            Column::numeric("Sal psu", &[36.0, 35.5, 35.0, 34.5, 34.0, 20.0]),
            Column::numeric("ODO mg/L", &[f64::NAN; 6]),
        ])
        .unwrap()
    }

    #[test]
    fn build_collects_every_section() {
        let report = EdaReport::build(&sample(), &ReportConfig::default()).unwrap();

        assert_eq!(report.overview.rows, 6);
        assert_eq!(report.overview.preview.len(), 5);
        assert_eq!(report.overview.columns[3].missing, 6);

        assert_eq!(report.descriptive.len(), 3);
        assert!(report.descriptive[2].stats.is_none());
        assert!(report.descriptive[2].error.is_some());

        let temp = &report.outliers[0];
        assert_eq!(temp.outlier_rows, vec![5]);
        assert_eq!(temp.rows_after_removal, Some(5));

        let ex = report.correlation_extremes.extremes.as_ref().unwrap();
        assert_eq!(ex.min_pair, ("Temp °C".to_string(), "Sal psu".to_string()));
        assert_eq!(report.correlation.size(), 3);
    }

    #[test]
    fn extremes_error_is_reported_not_raised() {
        let ds = Dataset::from_columns(vec![Column::numeric("pH", &[8.0, 8.1])]).unwrap();
        let report = EdaReport::build(&ds, &ReportConfig::default()).unwrap();
        assert!(report.correlation_extremes.extremes.is_none());
        assert!(
            report
                .correlation_extremes
                .error
                .as_deref()
                .unwrap()
                .contains("at least 2 numeric columns")
        );
    }

    #[test]
    fn json_renders_nan_as_null() {
        let report = EdaReport::build(&sample(), &ReportConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value["correlation"]["rows"][2][2].is_null());
        assert_eq!(value["overview"]["columns"][1]["kind"], "numeric");
    }

    #[test]
    fn text_rendering_mentions_each_section() {
        let report = EdaReport::build(&sample(), &ReportConfig::default()).unwrap();
        let text = report.render_text(2);
        for heading in [
            "== Dataset ==",
            "== Descriptive statistics ==",
            "== Outliers (IQR x 1.5) ==",
            "== Covariance ==",
            "== Correlation ==",
            "highest negative: (Temp °C, Sal psu)",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("28.00"));
    }

    #[test]
    fn empty_column_row_is_padded() {
        let report = EdaReport::build(&sample(), &ReportConfig::default()).unwrap();
        let text = report.render_text(2);

        let row = text
            .lines()
            .find(|l| l.starts_with("ODO mg/L") && l.ends_with('-'))
            .unwrap();
        let cells: Vec<&str> = row["ODO mg/L".len()..].split_whitespace().collect();
        assert_eq!(cells, vec!["0", "-", "-", "-", "-", "-", "-", "-"]);
        assert!(text.contains("ODO mg/L: column 'ODO mg/L' has no non-missing values"));
    }

    #[test]
    fn table_aligns_columns() {
        let t = table(&["a", "bb"], &[vec!["xyz".into(), "1".into()]]);
        assert_eq!(t, "a    bb\nxyz   1\n");
    }
}
