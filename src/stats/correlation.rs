use serde::Serialize;

use crate::data::model::Column;
use crate::error::StatsError;

// ---------------------------------------------------------------------------
// SquareMatrix – labelled symmetric matrix (covariance / correlation)
// ---------------------------------------------------------------------------

/// A square matrix indexed by column names. Undefined entries are NaN
/// (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquareMatrix {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl SquareMatrix {
    /// Fill a matrix from a symmetric pair function, evaluating each
    /// unordered pair once.
    fn symmetric(columns: &[&Column], mut pair: impl FnMut(&Column, &Column) -> f64) -> Self {
        let n = columns.len();
        let mut rows = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let v = pair(columns[i], columns[j]);
                rows[i][j] = v;
                rows[j][i] = v;
            }
        }
        SquareMatrix {
            labels: columns.iter().map(|c| c.name.clone()).collect(),
            rows,
        }
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        self.rows.get(i).and_then(|r| r.get(j)).copied()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.value(i, j)
    }
}

// ---------------------------------------------------------------------------
// Pairwise-complete estimators
// ---------------------------------------------------------------------------

/// Rows where both columns have a value.
fn complete_pairs(a: &Column, b: &Column) -> Vec<(f64, f64)> {
    (0..a.len().min(b.len()))
        .filter_map(|row| Some((a.f64_at(row)?, b.f64_at(row)?)))
        .collect()
}

/// Centered sums `(Sxx, Syy, Sxy)` and the pair count.
fn centered_sums(pairs: &[(f64, f64)]) -> (f64, f64, f64, usize) {
    let n = pairs.len();
    if n == 0 {
        return (0.0, 0.0, 0.0, 0);
    }
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    pairs.iter().fold((0.0, 0.0, 0.0, n), |(sxx, syy, sxy, n), &(x, y)| {
        let (dx, dy) = (x - mean_x, y - mean_y);
        (sxx + dx * dx, syy + dy * dy, sxy + dx * dy, n)
    })
}

/// Sample covariance (n - 1) over pairwise-complete rows; NaN below two pairs.
pub fn covariance(a: &Column, b: &Column) -> f64 {
    let (_, _, sxy, n) = centered_sums(&complete_pairs(a, b));
    if n < 2 {
        return f64::NAN;
    }
    sxy / (n - 1) as f64
}

/// Pearson correlation over pairwise-complete rows.
///
/// NaN below two pairs or when either side has zero variance.
pub fn pearson(a: &Column, b: &Column) -> f64 {
    let (sxx, syy, sxy, n) = centered_sums(&complete_pairs(a, b));
    if n < 2 || sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

pub fn covariance_matrix(columns: &[&Column]) -> SquareMatrix {
    SquareMatrix::symmetric(columns, covariance)
}

pub fn correlation_matrix(columns: &[&Column]) -> SquareMatrix {
    SquareMatrix::symmetric(columns, pearson)
}

// ---------------------------------------------------------------------------
// Extremes
// ---------------------------------------------------------------------------

/// The most positive and most negative entries of a correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationExtremes {
    pub max_pair: (String, String),
    pub max_value: f64,
    pub min_pair: (String, String),
    pub min_value: f64,
}

/// Search `matrix` for its largest and smallest entries.
///
/// Entries are visited row by row, columns ascending; on ties the first
/// visited pair wins. NaN entries are skipped. With `exclude_self_pairs`
/// the diagonal is not visited at all, so no column is ever reported
/// against itself; the matrix is left as is.
pub fn find_extremes(
    matrix: &SquareMatrix,
    exclude_self_pairs: bool,
) -> Result<CorrelationExtremes, StatsError> {
    let mut max: Option<(usize, usize, f64)> = None;
    let mut min: Option<(usize, usize, f64)> = None;

    for (i, row) in matrix.rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            if v.is_nan() || (exclude_self_pairs && i == j) {
                continue;
            }
            if max.map_or(true, |(_, _, m)| v > m) {
                max = Some((i, j, v));
            }
            if min.map_or(true, |(_, _, m)| v < m) {
                min = Some((i, j, v));
            }
        }
    }

    let (Some((ai, aj, max_value)), Some((bi, bj, min_value))) = (max, min) else {
        return Err(StatsError::NoDefinedCorrelation);
    };
    let label = |i: usize, j: usize| (matrix.labels[i].clone(), matrix.labels[j].clone());

    Ok(CorrelationExtremes {
        max_pair: label(ai, aj),
        max_value,
        min_pair: label(bi, bj),
        min_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_perfect_relations() {
        let a = Column::numeric("a", &[1.0, 2.0, 3.0, 4.0]);
        let b = Column::numeric("b", &[4.0, 3.0, 2.0, 1.0]);
        let c = Column::numeric("c", &[2.0, 4.0, 6.0, 8.0]);
        assert!((pearson(&a, &b) + 1.0).abs() < 1e-12);
        assert!((pearson(&a, &c) - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pairwise_complete_rows_only() {
        let a = Column::numeric("a", &[1.0, 2.0, f64::NAN, 4.0, 5.0]);
        let b = Column::numeric("b", &[2.0, 4.0, 100.0, f64::NAN, 10.0]);
        // Complete rows: (1,2), (2,4), (5,10).
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-12);
        let expected_cov = {
            let (mx, my) = (8.0 / 3.0, 16.0 / 3.0);
            ((1.0 - mx) * (2.0 - my) + (2.0 - mx) * (4.0 - my) + (5.0 - mx) * (10.0 - my)) / 2.0
        };
        assert!((covariance(&a, &b) - expected_cov).abs() < 1e-12);
    }

    #[test]
    fn undefined_entries_are_nan() {
        let constant = Column::numeric("k", &[3.0, 3.0, 3.0]);
        let other = Column::numeric("x", &[1.0, 2.0, 3.0]);
        assert!(pearson(&constant, &other).is_nan());
        assert!(pearson(&constant, &constant).is_nan());

        let single = Column::numeric("s", &[1.0, f64::NAN, f64::NAN]);
        assert!(covariance(&single, &other).is_nan());
    }

    #[test]
    fn matrix_is_symmetric() {
        let cols = [
            Column::numeric("t", &[28.1, 28.4, 27.9, 29.0, 28.7]),
            Column::numeric("s", &[35.2, 35.0, 35.9, 34.1, 34.8]),
            Column::numeric("p", &[8.0, 8.1, f64::NAN, 7.9, 8.05]),
        ];
        let refs: Vec<&Column> = cols.iter().collect();
        let corr = correlation_matrix(&refs);
        let cov = covariance_matrix(&refs);
        for i in 0..3 {
            assert!((corr.rows[i][i] - 1.0).abs() < 1e-12);
            for j in 0..3 {
                assert_eq!(corr.rows[i][j], corr.rows[j][i]);
                assert_eq!(cov.rows[i][j], cov.rows[j][i]);
            }
        }
        assert_eq!(corr.get("t", "s"), corr.get("s", "t"));
    }

    #[test]
    fn extremes_break_ties_row_major() {
        let matrix = SquareMatrix {
            labels: vec!["A".into(), "B".into(), "C".into()],
            rows: vec![
                vec![1.0, -1.0, 1.0],
                vec![-1.0, 1.0, -1.0],
                vec![1.0, -1.0, 1.0],
            ],
        };
        let ex = find_extremes(&matrix, true).unwrap();
        assert_eq!(ex.max_pair, ("A".into(), "C".into()));
        assert_eq!(ex.max_value, 1.0);
        assert_eq!(ex.min_pair, ("A".into(), "B".into()));
        assert_eq!(ex.min_value, -1.0);

        let with_self = find_extremes(&matrix, false).unwrap();
        assert_eq!(with_self.max_pair, ("A".into(), "A".into()));
    }

    #[test]
    fn extremes_skip_nan() {
        let matrix = SquareMatrix {
            labels: vec!["A".into(), "B".into()],
            rows: vec![vec![1.0, f64::NAN], vec![f64::NAN, 1.0]],
        };
        assert_eq!(find_extremes(&matrix, true), Err(StatsError::NoDefinedCorrelation));
    }
}
