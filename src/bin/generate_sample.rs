//! Generate a synthetic `processed_data` dataset (CSV and Parquet) for
//! trying out the dashboard and the analyze script. Deterministic output.
//!
//! A few deliberately dirty rows are included so the loader's cleaning path
//! has something to drop: an unparseable count, a malformed timestamp, and
//! a zero-confirmed cruise ship row with undefined ratios.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;

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

const REGIONS: [&str; 12] = [
    "Alabama",
    "Alaska",
    "California",
    "Florida",
    "Guam",
    "Iowa",
    "Michigan",
    "New York",
    "Ohio",
    "Texas",
    "Washington",
    "Wyoming",
];

const DAYS: i64 = 45;

struct SampleRow {
    region: String,
    last_update: String,
    confirmed: String,
    deaths: String,
    recovered: String,
    active: String,
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();

    let mut rows: Vec<SampleRow> = Vec::new();

    for (r, region) in REGIONS.iter().enumerate() {
        // Per-region epidemic scale, drawn once.
        let growth = 30.0 + 40.0 * rng.next_f64() + r as f64;
        let mut confirmed: f64 = 0.0;
        let mut deaths: f64 = 0.0;
        let mut recovered: f64 = 0.0;

        for day in 0..DAYS {
            let new_cases = rng.gauss(growth, growth / 4.0).max(0.0).round();
            confirmed += new_cases;
            deaths += (new_cases * (0.02 + 0.03 * rng.next_f64())).round();
            recovered += (new_cases * (0.3 + 0.4 * rng.next_f64())).round();
            deaths = deaths.min(confirmed);
            recovered = recovered.min(confirmed - deaths);
            let active = confirmed - deaths - recovered;

            let date = start + chrono::Duration::days(day);
            rows.push(SampleRow {
                region: region.to_string(),
                last_update: format!("{} 23:18:15", date.format("%Y-%m-%d")),
                confirmed: format!("{confirmed}"),
                deaths: format!("{deaths}"),
                recovered: format!("{recovered}"),
                active: format!("{active}"),
            });
        }
    }

    // Dirty rows for the cleaning path.
    rows.push(SampleRow {
        region: "Puerto Rico".to_string(),
        last_update: "2020-03-15 23:18:15".to_string(),
        confirmed: "unknown".to_string(),
        deaths: "0".to_string(),
        recovered: "0".to_string(),
        active: "0".to_string(),
    });
    rows.push(SampleRow {
        region: "Diamond Princess".to_string(),
        last_update: "2020-03-20 23:18:15".to_string(),
        confirmed: "0".to_string(),
        deaths: "0".to_string(),
        recovered: "0".to_string(),
        active: "0".to_string(),
    });
    rows.push(SampleRow {
        region: "Ohio".to_string(),
        last_update: "sometime in march".to_string(),
        confirmed: "100".to_string(),
        deaths: "2".to_string(),
        recovered: "30".to_string(),
        active: "68".to_string(),
    });

    write_csv("processed_data.csv", &rows)?;
    write_parquet("processed_data.parquet", &rows)?;

    println!(
        "Wrote {} rows ({} regions × {DAYS} days + 3 dirty rows) to processed_data.{{csv,parquet}}",
        rows.len(),
        REGIONS.len()
    );
    Ok(())
}

fn write_csv(path: &str, rows: &[SampleRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record([
        "Province_State",
        "Last_Update",
        "Confirmed",
        "Deaths",
        "Recovered",
        "Active",
    ])?;
    for row in rows {
        writer.write_record([
            row.region.as_str(),
            row.last_update.as_str(),
            row.confirmed.as_str(),
            row.deaths.as_str(),
            row.recovered.as_str(),
            row.active.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Parquet variant: counts as nullable Float64, unparseable cells as null.
fn write_parquet(path: &str, rows: &[SampleRow]) -> Result<()> {
    fn float_col(rows: &[SampleRow], get: impl Fn(&SampleRow) -> &str) -> Float64Array {
        rows.iter().map(|r| get(r).parse::<f64>().ok()).collect()
    }

    let region_array =
        StringArray::from(rows.iter().map(|r| r.region.as_str()).collect::<Vec<_>>());
    let date_array = StringArray::from(
        rows.iter()
            .map(|r| r.last_update.as_str())
            .collect::<Vec<_>>(),
    );
    let confirmed_array = float_col(rows, |r: &SampleRow| r.confirmed.as_str());
    let deaths_array = float_col(rows, |r: &SampleRow| r.deaths.as_str());
    let recovered_array = float_col(rows, |r: &SampleRow| r.recovered.as_str());
    let active_array = float_col(rows, |r: &SampleRow| r.active.as_str());

    let schema = Arc::new(Schema::new(vec![
        Field::new("Province_State", DataType::Utf8, false),
        Field::new("Last_Update", DataType::Utf8, false),
        Field::new("Confirmed", DataType::Float64, true),
        Field::new("Deaths", DataType::Float64, true),
        Field::new("Recovered", DataType::Float64, true),
        Field::new("Active", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(region_array),
            Arc::new(date_array),
            Arc::new(confirmed_array),
            Arc::new(deaths_array),
            Arc::new(recovered_array),
            Arc::new(active_array),
        ],
    )
    .context("creating record batch")?;

    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
