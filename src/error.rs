use thiserror::Error;

/// Structural problems with a [`Dataset`](crate::data::model::Dataset).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    #[error("column '{column}' has {found} rows but the dataset has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

/// Failures of a single statistics computation.
///
/// Every variant is local to one column or one pair of columns.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("correlation needs at least 2 numeric columns, found {found}")]
    InsufficientData { found: usize },

    #[error("column '{0}' has no non-missing values")]
    EmptyColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("no pair of columns has a defined correlation")]
    NoDefinedCorrelation,

    #[error("outlier fence multiplier must be finite and non-negative, got {0}")]
    InvalidRule(f64),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
