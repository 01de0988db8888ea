//! Exploratory data analysis for water-quality datasets.
//!
//! ```text
//!   data::loader ──► Dataset ──► stats::StatisticsEngine ──► report::EdaReport
//! ```
//!
//! The engine only distinguishes numeric from non-numeric columns; column
//! names are opaque.

pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod stats;

pub use data::model::{CellValue, Column, ColumnType, Dataset};
pub use error::{DatasetError, StatsError};
pub use stats::StatisticsEngine;
