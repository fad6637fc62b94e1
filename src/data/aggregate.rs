use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{CaseMetric, CaseTable, NUMERIC_COLUMNS};

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Descriptive statistics for one numeric column. Missing values are
/// excluded; a column with no usable values has `count == 0` and NaN stats.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Per-column summary statistics over all six numeric columns, in
/// [`NUMERIC_COLUMNS`] order. `None` when the table has no rows.
pub fn summary_stats(table: &CaseTable) -> Option<Vec<(String, ColumnSummary)>> {
    if table.is_empty() {
        return None;
    }
    Some(
        NUMERIC_COLUMNS
            .iter()
            .map(|col| (col.to_string(), column_summary(&table.column_values(col))))
            .collect(),
    )
}

fn column_summary(values: &[f64]) -> ColumnSummary {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    if sorted.is_empty() {
        return ColumnSummary {
            count: 0,
            mean: f64::NAN,
            std_dev: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }
    ColumnSummary {
        count: sorted.len(),
        mean: mean(&sorted),
        std_dev: std_dev(&sorted),
        min: sorted[0],
        q25: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.50),
        q75: percentile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); NaN below two values.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Linearly interpolated percentile over an already-sorted slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let idx = q * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = idx - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

// ---------------------------------------------------------------------------
// Pearson correlation matrix
// ---------------------------------------------------------------------------

/// Symmetric pairwise-Pearson matrix. `values[i][j]` correlates
/// `columns[i]` with `columns[j]`; the diagonal is exactly 1.0; degenerate
/// pairs (fewer than two complete observations, or zero variance) are NaN.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Correlation over the six numeric columns of a table. `None` when the
/// table has no rows.
pub fn correlation_matrix(table: &CaseTable) -> Option<CorrelationMatrix> {
    let columns: Vec<(String, Vec<Option<f64>>)> = NUMERIC_COLUMNS
        .iter()
        .map(|col| {
            let cells = table.records.iter().map(|r| r.numeric_value(col)).collect();
            (col.to_string(), cells)
        })
        .collect();
    pearson_matrix(columns)
}

/// Pairwise Pearson correlation over column-oriented data with missing
/// cells. Each pair uses only the rows where both cells are present.
/// `None` when there are no columns or no rows.
pub fn pearson_matrix(columns: Vec<(String, Vec<Option<f64>>)>) -> Option<CorrelationMatrix> {
    if columns.is_empty() || columns[0].1.is_empty() {
        return None;
    }
    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pairwise_pearson(&columns[i].1, &columns[j].1);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    Some(CorrelationMatrix {
        columns: columns.into_iter().map(|(name, _)| name).collect(),
        values,
    })
}

fn pairwise_pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        cov / denom
    }
}

// ---------------------------------------------------------------------------
// Daily totals (time series)
// ---------------------------------------------------------------------------

/// Confirmed cases summed per calendar day of `Last_Update`, ascending by
/// date. Rows whose timestamp failed to parse are excluded here (and only
/// here). `None` when no row has a usable date.
pub fn daily_totals(table: &CaseTable) -> Option<Vec<(NaiveDate, f64)>> {
    let mut totals: std::collections::BTreeMap<NaiveDate, f64> = Default::default();
    for rec in &table.records {
        if let Some(dt) = rec.last_update {
            *totals.entry(dt.date()).or_insert(0.0) += rec.confirmed;
        }
    }
    if totals.is_empty() {
        return None;
    }
    Some(totals.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Top-K regions
// ---------------------------------------------------------------------------

/// The `top_n` regions by the summed value of `case_type`, descending.
/// An invalid `case_type` falls back to `Confirmed`; ties keep the order in
/// which the regions were first encountered. `None` when the table has no
/// rows.
pub fn top_regions(table: &CaseTable, case_type: &str, top_n: usize) -> Option<Vec<(String, f64)>> {
    if table.is_empty() {
        return None;
    }
    let metric = CaseMetric::parse_or_default(case_type);

    // Totals in first-encountered region order so the later stable sort
    // breaks ties deterministically.
    let mut totals: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for rec in &table.records {
        match index.get(rec.region.as_str()) {
            Some(&i) => totals[i].1 += metric.value_of(rec),
            None => {
                totals.push((rec.region.clone(), metric.value_of(rec)));
                // Key borrowed from the record, which outlives this loop.
                index.insert(rec.region.as_str(), totals.len() - 1);
            }
        }
    }

    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals.truncate(top_n);
    Some(totals)
}

// ---------------------------------------------------------------------------
// Histogram binning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        self.bins.first().map(|b| b.end - b.start).unwrap_or(0.0)
    }
}

/// Equal-width histogram with √n bins (clamped to 1..=30).  Non-finite
/// values are excluded; `None` when nothing remains to bin.
pub fn histogram(values: &[f64]) -> Option<Histogram> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let n_bins = ((finite.len() as f64).sqrt().ceil() as usize).clamp(1, 30);

    if min == max {
        // Degenerate range: one bin holding everything.
        return Some(Histogram {
            bins: vec![HistogramBin {
                start: min,
                end: max,
                count: finite.len(),
            }],
        });
    }

    let width = (max - min) / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for v in &finite {
        let idx = (((v - min) / width) as usize).min(n_bins - 1);
        counts[idx] += 1;
    }

    Some(Histogram {
        bins: counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                start: min + i as f64 * width,
                end: min + (i + 1) as f64 * width,
                count,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CaseRecord, COL_CONFIRMED};
    use chrono::NaiveDate;

    fn record(region: &str, date: Option<&str>, confirmed: f64) -> CaseRecord {
        CaseRecord {
            region: region.to_string(),
            last_update: date.map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
            }),
            confirmed,
            deaths: confirmed / 10.0,
            recovered: confirmed / 2.0,
            active: confirmed,
            case_fatality_ratio: Some(10.0),
            recovery_rate: Some(50.0),
        }
    }

    #[test]
    fn summary_stats_on_empty_table_is_no_result() {
        assert!(summary_stats(&CaseTable::default()).is_none());
    }

    #[test]
    fn summary_stats_match_pandas_describe() {
        let table = CaseTable::from_records(vec![
            record("A", None, 1.0),
            record("A", None, 2.0),
            record("A", None, 3.0),
            record("A", None, 4.0),
        ]);
        let stats = summary_stats(&table).unwrap();
        let (name, confirmed) = &stats[0];
        assert_eq!(name, COL_CONFIRMED);
        assert_eq!(confirmed.count, 4);
        assert_eq!(confirmed.mean, 2.5);
        assert!((confirmed.std_dev - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(confirmed.min, 1.0);
        assert_eq!(confirmed.q25, 1.75);
        assert_eq!(confirmed.median, 2.5);
        assert_eq!(confirmed.q75, 3.25);
        assert_eq!(confirmed.max, 4.0);
    }

    #[test]
    fn single_value_column_has_nan_std() {
        let table = CaseTable::from_records(vec![record("A", None, 7.0)]);
        let stats = summary_stats(&table).unwrap();
        assert_eq!(stats[0].1.count, 1);
        assert!(stats[0].1.std_dev.is_nan());
    }

    #[test]
    fn one_column_matrix_is_unit_diagonal() {
        let m = pearson_matrix(vec![("x".to_string(), vec![Some(1.0), Some(2.0)])]).unwrap();
        assert_eq!(m.columns, vec!["x"]);
        assert_eq!(m.values, vec![vec![1.0]]);
    }

    #[test]
    fn empty_input_matrix_is_no_result() {
        assert!(pearson_matrix(Vec::new()).is_none());
        assert!(pearson_matrix(vec![("x".to_string(), Vec::new())]).is_none());
        assert!(correlation_matrix(&CaseTable::default()).is_none());
    }

    #[test]
    fn perfectly_linear_columns_correlate_to_one() {
        let xs = vec![Some(1.0), Some(2.0), Some(3.0)];
        let ys = vec![Some(10.0), Some(20.0), Some(30.0)];
        let zs = vec![Some(3.0), Some(2.0), Some(1.0)];
        let m = pearson_matrix(vec![
            ("x".to_string(), xs),
            ("y".to_string(), ys),
            ("z".to_string(), zs),
        ])
        .unwrap();
        assert!((m.values[0][1] - 1.0).abs() < 1e-12);
        assert!((m.values[0][2] + 1.0).abs() < 1e-12);
        assert_eq!(m.values[0][1], m.values[1][0]);
    }

    #[test]
    fn missing_cells_are_excluded_pairwise() {
        // The None row would flip the sign if it were zero-filled.
        let xs = vec![Some(1.0), Some(2.0), None];
        let ys = vec![Some(5.0), Some(6.0), Some(-100.0)];
        let m = pearson_matrix(vec![("x".to_string(), xs), ("y".to_string(), ys)]).unwrap();
        assert!((m.values[0][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_correlation_is_nan() {
        let xs = vec![Some(1.0), Some(1.0), Some(1.0)];
        let ys = vec![Some(1.0), Some(2.0), Some(3.0)];
        let m = pearson_matrix(vec![("x".to_string(), xs), ("y".to_string(), ys)]).unwrap();
        assert!(m.values[0][1].is_nan());
        assert_eq!(m.values[0][0], 1.0);
    }

    #[test]
    fn daily_totals_group_sum_and_sort_ascending() {
        let table = CaseTable::from_records(vec![
            record("A", Some("2020-01-02"), 10.0),
            record("B", Some("2020-01-01"), 5.0),
            record("C", Some("2020-01-02"), 7.0),
        ]);
        let series = daily_totals(&table).unwrap();
        assert_eq!(
            series,
            vec![
                (NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), 5.0),
                (NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), 17.0),
            ]
        );
    }

    #[test]
    fn daily_totals_without_usable_dates_is_no_result() {
        assert!(daily_totals(&CaseTable::default()).is_none());
        let table = CaseTable::from_records(vec![record("A", None, 10.0)]);
        assert!(daily_totals(&table).is_none());
    }

    #[test]
    fn top_regions_orders_by_total_with_first_seen_ties() {
        let table = CaseTable::from_records(vec![
            record("D", None, 10.0),
            record("B", None, 30.0),
            record("A", None, 20.0),
            record("C", None, 30.0),
            record("A", None, 30.0),
        ]);
        // Totals: A=50, B=30, C=30, D=10; B was seen before C.
        let top = top_regions(&table, "Confirmed", 3).unwrap();
        assert_eq!(
            top,
            vec![
                ("A".to_string(), 50.0),
                ("B".to_string(), 30.0),
                ("C".to_string(), 30.0),
            ]
        );
    }

    #[test]
    fn top_regions_invalid_column_falls_back_to_confirmed() {
        let table = CaseTable::from_records(vec![record("A", None, 40.0)]);
        let top = top_regions(&table, "NotAColumn", 10).unwrap();
        assert_eq!(top, vec![("A".to_string(), 40.0)]);
    }

    #[test]
    fn top_regions_on_empty_table_is_no_result() {
        assert!(top_regions(&CaseTable::default(), "Confirmed", 10).is_none());
    }

    #[test]
    fn histogram_counts_every_finite_value_once() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let hist = histogram(&values).unwrap();
        assert_eq!(hist.bins.len(), 10);
        assert_eq!(hist.bins.iter().map(|b| b.count).sum::<usize>(), 100);
    }

    #[test]
    fn histogram_of_nothing_is_no_result() {
        assert!(histogram(&[]).is_none());
        assert!(histogram(&[f64::NAN]).is_none());
    }

    #[test]
    fn histogram_handles_constant_values() {
        let hist = histogram(&[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(hist.bins.len(), 1);
        assert_eq!(hist.bins[0].count, 3);
    }
}
