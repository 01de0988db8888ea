use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use log::info;
use parquet::arrow::ArrowWriter;

#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Write a synthetic water-quality transect as CSV or Parquet")]
struct Args {
    /// Output file; the extension picks the format
    #[arg(default_value = "sample_water_quality.csv")]
    output: PathBuf,

    /// Number of readings
    #[arg(long, default_value_t = 1000)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Ok(OutputFormat::Csv),
            Some("parquet") | Some("pq") => Ok(OutputFormat::Parquet),
            _ => bail!("output must end in .csv or .parquet: {}", path.display()),
        }
    }
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Synthetic boat transect
// ---------------------------------------------------------------------------

const NUMERIC_COLUMNS: [&str; 6] = [
    "Latitude",
    "Longitude",
    "Total Water Column (m)",
    "Temp °C",
    "Sal psu",
    "pH",
];

/// One reading per second along a slow transect, with a warm/fresh plume
/// in the middle and a handful of sensor glitches.
struct Transect {
    time: Vec<String>,
    columns: Vec<Vec<f64>>,
}

fn generate(rows: usize, rng: &mut SimpleRng) -> Transect {
    let mut time = Vec::with_capacity(rows);
    let mut columns = vec![Vec::with_capacity(rows); NUMERIC_COLUMNS.len()];

    for i in 0..rows {
        let t = i as f64 / rows.max(1) as f64;
        let secs = 10 * 3600 + i;
        time.push(format!("{:02}:{:02}:{:02}", secs / 3600 % 24, secs / 60 % 60, secs % 60));

        let plume = (-((t - 0.5) / 0.12).powi(2)).exp();
        let depth = 1.2 + 0.8 * t + rng.gauss(0.0, 0.05);
        let mut temp = 28.4 + 0.9 * plume + rng.gauss(0.0, 0.08);
        let mut sal = 36.1 - 2.5 * plume + rng.gauss(0.0, 0.1);
        let ph = 8.05 - 0.1 * plume + rng.gauss(0.0, 0.02);

        if i % 97 == 13 {
            temp -= 6.0;
            sal = 0.0;
        }

        let row = [
            25.7135 + 0.0006 * t + rng.gauss(0.0, 0.00002),
            -80.1531 + 0.0004 * t + rng.gauss(0.0, 0.00002),
            depth,
            temp,
            sal,
            ph,
        ];
        for (col, v) in columns.iter_mut().zip(row) {
            col.push(v);
        }
    }

    Transect { time, columns }
}

fn write_csv(path: &Path, data: &Transect) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    let mut header = vec!["Time"];
    header.extend(NUMERIC_COLUMNS);
    writer.write_record(&header)?;

    for (row, time) in data.time.iter().enumerate() {
        let mut record = vec![time.clone()];
        record.extend(data.columns.iter().map(|c| format!("{:.6}", c[row])));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, data: &Transect) -> Result<()> {
    let mut fields = vec![Field::new("Time", DataType::Utf8, false)];
    fields.extend(NUMERIC_COLUMNS.iter().map(|&n| Field::new(n, DataType::Float64, false)));
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
        data.time.iter().map(String::as_str).collect::<Vec<_>>(),
    ))];
    arrays.extend(
        data.columns
            .iter()
            .map(|c| Arc::new(Float64Array::from(c.clone())) as ArrayRef),
    );

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let format = OutputFormat::from_path(&args.output)?;

    info!("generating {} readings with seed {}", args.rows, args.seed);
    let mut rng = SimpleRng::new(args.seed);
    let data = generate(args.rows, &mut rng);

    match format {
        OutputFormat::Csv => write_csv(&args.output, &data)?,
        OutputFormat::Parquet => write_parquet(&args.output, &data)?,
    }

    println!("Wrote {} readings to {}", args.rows, args.output.display());
    Ok(())
}
