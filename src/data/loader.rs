use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::metrics;
use super::model::{
    CaseRecord, CaseTable, COL_ACTIVE, COL_CONFIRMED, COL_DEATHS, COL_LAST_UPDATE, COL_RECOVERED,
    COL_REGION, COUNT_COLUMNS,
};

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Fatal load failures. Cell-level problems (unparseable numbers, malformed
/// dates) are not errors; they are handled by dropping or blanking the cell
/// during cleaning.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("expected a top-level JSON array of records")]
    JsonShape,
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and clean a case dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – delimited text with a header row (the canonical format)
/// * `.parquet` – flat columnar file with the same column names
/// * `.json`    – records orientation, `[{ "Province_State": ..., ... }]`
pub fn load_file(path: &Path) -> Result<CaseTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "csv" => read_csv_path(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    Ok(clean(raw))
}

// ---------------------------------------------------------------------------
// Raw rows (pre-cleaning)
// ---------------------------------------------------------------------------

/// One parsed-but-uncleaned row. Counts are `None` when the cell failed
/// numeric coercion; the timestamp is `None` when malformed.
#[derive(Debug)]
struct RawRow {
    region: String,
    last_update: Option<NaiveDateTime>,
    /// Confirmed, Deaths, Recovered, Active – in that order.
    counts: [Option<f64>; 4],
}

/// Best-effort numeric coercion of a text cell. Anything that does not
/// parse to a finite number is missing.
fn parse_count(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M",
];

/// Best-effort timestamp parse against the formats seen in the source data.
fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, fmt) {
            return Some(dt);
        }
    }
    // Date-only cells are valid too.
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Cleaning: raw rows → CaseTable
// ---------------------------------------------------------------------------

/// Drop rows with a missing (or negative) value in any count column, then
/// compute the two derived ratio columns.
fn clean(raw: Vec<RawRow>) -> CaseTable {
    let total = raw.len();
    let records: Vec<CaseRecord> = raw
        .into_iter()
        .filter_map(|row| {
            let [confirmed, deaths, recovered, active] = row.counts;
            let (confirmed, deaths, recovered, active) =
                (confirmed?, deaths?, recovered?, active?);
            if confirmed < 0.0 || deaths < 0.0 || recovered < 0.0 || active < 0.0 {
                return None;
            }
            Some(CaseRecord {
                region: row.region,
                last_update: row.last_update,
                confirmed,
                deaths,
                recovered,
                active,
                case_fatality_ratio: metrics::case_fatality_ratio(deaths, confirmed),
                recovery_rate: metrics::recovery_rate(recovered, confirmed),
            })
        })
        .collect();

    if records.len() < total {
        log::info!(
            "dropped {} of {} rows with missing or invalid count values",
            total - records.len(),
            total
        );
    }
    CaseTable::from_records(records)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv_path(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let reader = csv::Reader::from_path(path)?;
    read_csv(reader)
}

fn read_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRow>, LoadError> {
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let region_idx = column_index(&headers, COL_REGION)?;
    let date_idx = column_index(&headers, COL_LAST_UPDATE)?;
    let count_idx = [
        column_index(&headers, COL_CONFIRMED)?,
        column_index(&headers, COL_DEATHS)?,
        column_index(&headers, COL_RECOVERED)?,
        column_index(&headers, COL_ACTIVE)?,
    ];

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        rows.push(RawRow {
            region: cell(region_idx).trim().to_string(),
            last_update: parse_timestamp(cell(date_idx)),
            counts: count_idx.map(|i| parse_count(cell(i))),
        });
    }
    Ok(rows)
}

fn column_index(headers: &[String], name: &'static str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or(LoadError::MissingColumn(name))
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records orientation (the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Province_State": "Ohio",
///     "Last_Update": "2020-04-12 23:18:15",
///     "Confirmed": 6518, "Deaths": 253, "Recovered": 0, "Active": 6265
///   },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text)?;
    let records = root.as_array().ok_or(LoadError::JsonShape)?;

    let mut rows = Vec::with_capacity(records.len());
    for rec in records {
        let obj = match rec.as_object() {
            Some(obj) => obj,
            None => return Err(LoadError::JsonShape),
        };

        let region = match obj.get(COL_REGION) {
            Some(JsonValue::String(s)) => s.trim().to_string(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let last_update = obj
            .get(COL_LAST_UPDATE)
            .and_then(|v| v.as_str())
            .and_then(parse_timestamp);
        let counts = COUNT_COLUMNS.map(|col| json_count(obj.get(col)));

        rows.push(RawRow {
            region,
            last_update,
            counts,
        });
    }
    Ok(rows)
}

/// Numeric coercion of a JSON cell: numbers pass through, numeric strings
/// parse, everything else is missing.
fn json_count(val: Option<&JsonValue>) -> Option<f64> {
    match val? {
        JsonValue::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        JsonValue::String(s) => parse_count(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Flat columnar schema with the same column names as the CSV. Count columns
/// may be any integer/float/string type; `Last_Update` may be a timestamp or
/// a string. Works with files written by both Pandas and Polars.
fn read_parquet(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;

        let region_col = batch_column(&batch, COL_REGION)?;
        let date_col = batch_column(&batch, COL_LAST_UPDATE)?;
        let count_cols = [
            batch_column(&batch, COL_CONFIRMED)?,
            batch_column(&batch, COL_DEATHS)?,
            batch_column(&batch, COL_RECOVERED)?,
            batch_column(&batch, COL_ACTIVE)?,
        ];

        for row in 0..batch.num_rows() {
            rows.push(RawRow {
                region: text_cell(region_col, row).unwrap_or_default(),
                last_update: timestamp_cell(date_col, row),
                counts: count_cols.map(|c| numeric_cell(c, row)),
            });
        }
    }
    Ok(rows)
}

fn batch_column<'a>(
    batch: &'a arrow::record_batch::RecordBatch,
    name: &'static str,
) -> Result<&'a ArrayRef, LoadError> {
    batch
        .schema_ref()
        .index_of(name)
        .map(|i| batch.column(i))
        .map_err(|_| LoadError::MissingColumn(name))
}

// -- Arrow cell helpers --

/// Extract a numeric cell, coercing string cells the same way as CSV.
fn numeric_cell(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>()?;
            Some(arr.value(row)).filter(|v| v.is_finite())
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>()?;
            Some(arr.value(row) as f64).filter(|v| v.is_finite())
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>()?;
            Some(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>()?;
            Some(arr.value(row) as f64)
        }
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>()?;
            parse_count(arr.value(row))
        }
        _ => None,
    }
}

/// Normalize a cell to text, coercing numeric region codes to their string
/// form.
fn text_cell(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>()?;
            Some(arr.value(row).trim().to_string())
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>()?;
            Some(arr.value(row).to_string())
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>()?;
            Some(arr.value(row).to_string())
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>()?;
            Some(arr.value(row).to_string())
        }
        _ => None,
    }
}

fn timestamp_cell(col: &Arc<dyn Array>, row: usize) -> Option<NaiveDateTime> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>()?;
            parse_timestamp(arr.value(row))
        }
        DataType::Timestamp(unit, _) => {
            let raw = match unit {
                TimeUnit::Second => col
                    .as_any()
                    .downcast_ref::<TimestampSecondArray>()?
                    .value(row)
                    .checked_mul(1_000_000_000)?,
                TimeUnit::Millisecond => col
                    .as_any()
                    .downcast_ref::<TimestampMillisecondArray>()?
                    .value(row)
                    .checked_mul(1_000_000)?,
                TimeUnit::Microsecond => col
                    .as_any()
                    .downcast_ref::<TimestampMicrosecondArray>()?
                    .value(row)
                    .checked_mul(1_000)?,
                TimeUnit::Nanosecond => col
                    .as_any()
                    .downcast_ref::<TimestampNanosecondArray>()?
                    .value(row),
            };
            DateTime::from_timestamp(raw.div_euclid(1_000_000_000), raw.rem_euclid(1_000_000_000) as u32)
                .map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::COL_CASE_FATALITY;

    fn table_from_csv(text: &str) -> CaseTable {
        let reader = csv::Reader::from_reader(text.as_bytes());
        clean(read_csv(reader).expect("csv parse"))
    }

    const HEADER: &str = "Province_State,Last_Update,Confirmed,Deaths,Recovered,Active\n";

    #[test]
    fn all_valid_rows_survive_cleaning() {
        let table = table_from_csv(&format!(
            "{HEADER}Ohio,2020-04-12 23:18:15,100,5,20,75\n\
             Alaska,2020-04-13 23:18:15,50,1,10,39\n"
        ));
        assert_eq!(table.len(), 2);
        for rec in &table.records {
            assert!(rec.confirmed >= 0.0);
            assert!(rec.deaths >= 0.0);
            assert!(rec.recovered >= 0.0);
            assert!(rec.active >= 0.0);
        }
    }

    #[test]
    fn unparseable_count_drops_the_row() {
        let table = table_from_csv(&format!(
            "{HEADER}Ohio,2020-04-12 23:18:15,100,5,20,75\n\
             Guam,2020-04-12 23:18:15,not-a-number,0,0,0\n\
             Iowa,2020-04-12 23:18:15,40,,4,36\n"
        ));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].region, "Ohio");
    }

    #[test]
    fn negative_count_drops_the_row() {
        let table = table_from_csv(&format!(
            "{HEADER}Ohio,2020-04-12 23:18:15,100,-5,20,75\n"
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_date_keeps_the_row() {
        let table = table_from_csv(&format!(
            "{HEADER}Ohio,someday soon,100,5,20,75\n"
        ));
        assert_eq!(table.len(), 1);
        assert!(table.records[0].last_update.is_none());
    }

    #[test]
    fn zero_confirmed_yields_missing_ratio_not_infinity() {
        let table = table_from_csv(&format!(
            "{HEADER}Diamond Princess,2020-04-12 23:18:15,0,0,0,0\n"
        ));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].case_fatality_ratio, None);
        assert_eq!(table.records[0].recovery_rate, None);
        assert!(table.column_values(COL_CASE_FATALITY).is_empty());
    }

    #[test]
    fn ratios_are_derived_during_cleaning() {
        let table = table_from_csv(&format!(
            "{HEADER}Ohio,2020-04-12 23:18:15,200,10,50,140\n"
        ));
        let rec = &table.records[0];
        assert_eq!(rec.case_fatality_ratio, Some(5.0));
        assert_eq!(rec.recovery_rate, Some(25.0));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let reader =
            csv::Reader::from_reader("Province_State,Confirmed\nOhio,1\n".as_bytes());
        let err = read_csv(reader).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == COL_LAST_UPDATE));
    }

    #[test]
    fn timestamp_formats_parse_best_effort() {
        assert!(parse_timestamp("2020-04-12 23:18:15").is_some());
        assert!(parse_timestamp("2020-04-12T23:18:15").is_some());
        assert!(parse_timestamp("4/12/2020 23:18").is_some());
        assert!(parse_timestamp("2020-04-12").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn json_records_load_with_string_coercion() {
        let dir = std::env::temp_dir().join("casewatch-json-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cases.json");
        std::fs::write(
            &path,
            r#"[
              {"Province_State": "Ohio", "Last_Update": "2020-04-12 23:18:15",
               "Confirmed": 100, "Deaths": "5", "Recovered": 20, "Active": 75},
              {"Province_State": 66, "Last_Update": null,
               "Confirmed": 10, "Deaths": 0, "Recovered": 9, "Active": 1},
              {"Province_State": "Guam", "Last_Update": null,
               "Confirmed": 10, "Deaths": 0, "Recovered": "junk", "Active": 1}
            ]"#,
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        // The row with the unparseable Recovered cell is dropped; the numeric
        // region code is stringified.
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].region, "Ohio");
        assert_eq!(table.records[0].deaths, 5.0);
        assert_eq!(table.records[1].region, "66");
    }

    #[test]
    fn parquet_round_trip_with_nulls_and_typed_timestamps() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let stamp = |day: u32, hour: u32| {
            NaiveDate::from_ymd_opt(2020, 4, day)
                .unwrap()
                .and_hms_opt(hour, 18, 15)
                .unwrap()
                .and_utc()
                .timestamp_micros()
        };
        let schema = Arc::new(Schema::new(vec![
            Field::new(COL_REGION, DataType::Int64, false),
            Field::new(
                COL_LAST_UPDATE,
                DataType::Timestamp(TimeUnit::Microsecond, None),
                false,
            ),
            Field::new(COL_CONFIRMED, DataType::Float64, true),
            Field::new(COL_DEATHS, DataType::Float64, true),
            Field::new(COL_RECOVERED, DataType::Float64, true),
            Field::new(COL_ACTIVE, DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![39, 2, 15])),
                Arc::new(TimestampMicrosecondArray::from(vec![
                    stamp(12, 23),
                    stamp(12, 23),
                    stamp(13, 1),
                ])),
                Arc::new(Float64Array::from(vec![Some(100.0), None, Some(50.0)])),
                Arc::new(Float64Array::from(vec![Some(5.0), Some(0.0), Some(1.0)])),
                Arc::new(Float64Array::from(vec![Some(20.0), Some(0.0), Some(10.0)])),
                Arc::new(Float64Array::from(vec![Some(75.0), Some(0.0), Some(39.0)])),
            ],
        )
        .unwrap();

        let dir = std::env::temp_dir().join("casewatch-parquet-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cases.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        // The null-Confirmed row is dropped; numeric region codes are
        // stringified; typed timestamps survive as dates.
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].region, "39");
        assert_eq!(table.records[1].region, "15");
        assert_eq!(
            table.records[0].last_update.unwrap().date(),
            NaiveDate::from_ymd_opt(2020, 4, 12).unwrap()
        );
        assert_eq!(
            table.records[1].last_update.unwrap().date(),
            NaiveDate::from_ymd_opt(2020, 4, 13).unwrap()
        );
        assert_eq!(table.records[0].case_fatality_ratio, Some(5.0));
        assert_eq!(table.records[1].recovery_rate, Some(20.0));
        assert_eq!(table.regions, vec!["15", "39"]);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(e) if e == "xlsx"));
    }
}
