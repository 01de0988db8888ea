use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::stats::outliers::{DEFAULT_FENCE_MULTIPLIER, OutlierRule};

// ---------------------------------------------------------------------------
// Report configuration
// ---------------------------------------------------------------------------

/// Options for building and rendering an EDA report.
///
/// Loaded from JSON; every field is optional:
///
/// ```json
/// { "fence_multiplier": 3.0, "precision": 2, "head_rows": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// IQR multiplier for outlier fences.
    pub fence_multiplier: f64,
    /// Decimal places in the text rendering.
    pub precision: usize,
    /// Rows shown in the dataset preview.
    pub head_rows: usize,
    /// Skip the diagonal when searching for the strongest correlations.
    pub exclude_self_pairs: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            fence_multiplier: DEFAULT_FENCE_MULTIPLIER,
            precision: 4,
            head_rows: 5,
            exclude_self_pairs: true,
        }
    }
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(text)?;
        config.outlier_rule()?;
        Ok(config)
    }

    pub fn outlier_rule(&self) -> Result<OutlierRule> {
        Ok(OutlierRule::new(self.fence_multiplier)?)
    }
}
