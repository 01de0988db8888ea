use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::debug;

use water_quality_eda::config::ReportConfig;
use water_quality_eda::data::loader::load_file;
use water_quality_eda::report::EdaReport;

#[derive(Parser, Debug)]
#[command(name = "water-quality-eda")]
#[command(about = "Descriptive statistics, IQR outliers and correlations for a water-quality table")]
#[command(version)]
struct Args {
    /// CSV, JSON or Parquet file to analyse
    input: PathBuf,

    /// Print the report as JSON instead of text tables
    #[arg(long)]
    json: bool,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Decimal places in text tables
    #[arg(long)]
    precision: Option<usize>,

    /// Rows shown in the preview
    #[arg(long)]
    head: Option<usize>,

    /// IQR fence multiplier
    #[arg(long)]
    fence: Option<f64>,
}

/// Settings file first, then flags on top.
fn resolve_config(args: &Args) -> Result<ReportConfig> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(p) = args.precision {
        config.precision = p;
    }
    if let Some(n) = args.head {
        config.head_rows = n;
    }
    if let Some(k) = args.fence {
        config.fence_multiplier = k;
    }
    config.outlier_rule()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    debug!("{config:?}");

    let dataset = load_file(&args.input)?;
    let report = EdaReport::build(&dataset, &config)?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text(config.precision));
    }
    Ok(())
}
