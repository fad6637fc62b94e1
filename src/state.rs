use std::path::PathBuf;

use chrono::NaiveDate;

use crate::data::aggregate::{
    self, ColumnSummary, CorrelationMatrix, Histogram,
};
use crate::data::filter::by_region;
use crate::data::loader;
use crate::data::model::{CaseMetric, CaseTable, COL_CASE_FATALITY, COL_RECOVERY_RATE};

// ---------------------------------------------------------------------------
// ChartData – the dashboard boundary
// ---------------------------------------------------------------------------

/// Everything one dashboard refresh needs, recomputed from scratch each
/// time. Each field is `None` when the corresponding aggregator had no
/// eligible rows; the UI renders a placeholder pane in that case.
pub struct ChartData {
    pub case_fatality: Option<Histogram>,
    pub recovery: Option<Histogram>,
    pub correlation: Option<CorrelationMatrix>,
    pub daily: Option<Vec<(NaiveDate, f64)>>,
    pub top_regions: Option<Vec<(String, f64)>>,
    pub active_vs_confirmed: Option<Vec<[f64; 2]>>,
    pub summary: Option<Vec<(String, ColumnSummary)>>,
}

impl ChartData {
    /// Compute all chart datasets for one (region, case_type, top_n)
    /// request. The top-N ranking always runs over the unfiltered table;
    /// every other aggregator sees only the region-filtered rows.
    pub fn build(
        table: &CaseTable,
        region: Option<&str>,
        case_type: &str,
        top_n: usize,
    ) -> Self {
        let filtered = by_region(table, region);

        let scatter: Vec<[f64; 2]> = filtered
            .records
            .iter()
            .map(|r| [r.confirmed, r.active])
            .collect();

        ChartData {
            case_fatality: aggregate::histogram(&filtered.column_values(COL_CASE_FATALITY)),
            recovery: aggregate::histogram(&filtered.column_values(COL_RECOVERY_RATE)),
            correlation: aggregate::correlation_matrix(&filtered),
            daily: aggregate::daily_totals(&filtered),
            top_regions: aggregate::top_regions(table, case_type, top_n),
            active_vs_confirmed: (!scatter.is_empty()).then_some(scatter),
            summary: aggregate::summary_stats(&filtered),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
pub struct AppState {
    /// Source file of the current dataset; re-read on every refresh.
    pub data_path: Option<PathBuf>,

    /// Cleaned dataset (None until a file is loaded).
    pub table: Option<CaseTable>,

    /// Region filter; `None` means all regions.
    pub selected_region: Option<String>,

    /// Count column for the top-N ranking.
    pub case_metric: CaseMetric,

    /// Number of regions in the top-N chart.
    pub top_n: usize,

    /// Chart datasets for the current filter selection.
    pub charts: Option<ChartData>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            data_path: None,
            table: None,
            selected_region: None,
            case_metric: CaseMetric::Confirmed,
            top_n: 10,
            charts: None,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Load a dataset file and compute the initial (unfiltered) charts.
    pub fn open(&mut self, path: PathBuf) {
        self.loading = true;
        match loader::load_file(&path) {
            Ok(table) => {
                log::info!(
                    "loaded {} rows across {} regions from {}",
                    table.len(),
                    table.regions.len(),
                    path.display()
                );
                self.data_path = Some(path);
                self.selected_region = None;
                self.status_message = None;
                self.set_table(table);
            }
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                self.loading = false;
            }
        }
    }

    fn set_table(&mut self, table: CaseTable) {
        self.table = Some(table);
        self.rebuild_charts();
        self.loading = false;
    }

    /// Re-read the source file and recompute every chart. Each refresh is a
    /// fresh invocation: no aggregate is cached across it.
    pub fn refresh(&mut self) {
        let Some(path) = self.data_path.clone() else {
            return;
        };
        self.loading = true;
        match loader::load_file(&path) {
            Ok(table) => {
                self.status_message = None;
                self.set_table(table);
            }
            Err(e) => {
                log::error!("refresh of {} failed: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                self.loading = false;
            }
        }
    }

    /// Recompute charts for the current filter selection without re-reading
    /// the file (used when a side-panel control changes).
    pub fn rebuild_charts(&mut self) {
        if let Some(table) = &self.table {
            self.charts = Some(ChartData::build(
                table,
                self.selected_region.as_deref(),
                self.case_metric.column_name(),
                self.top_n,
            ));
        }
    }

    pub fn set_region(&mut self, region: Option<String>) {
        self.selected_region = region;
        self.rebuild_charts();
    }

    pub fn set_case_metric(&mut self, metric: CaseMetric) {
        self.case_metric = metric;
        self.rebuild_charts();
    }

    pub fn set_top_n(&mut self, top_n: usize) {
        self.top_n = top_n.max(1);
        self.rebuild_charts();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CaseRecord;
    use chrono::NaiveDate;

    fn record(region: &str, confirmed: f64) -> CaseRecord {
        CaseRecord {
            region: region.to_string(),
            last_update: NaiveDate::from_ymd_opt(2020, 4, 12)
                .unwrap()
                .and_hms_opt(0, 0, 0),
            confirmed,
            deaths: confirmed / 10.0,
            recovered: confirmed / 2.0,
            active: confirmed / 3.0,
            case_fatality_ratio: Some(10.0),
            recovery_rate: Some(50.0),
        }
    }

    #[test]
    fn build_produces_all_panes_for_unfiltered_data() {
        let table = CaseTable::from_records(vec![
            record("Ohio", 100.0),
            record("Alaska", 40.0),
        ]);
        let charts = ChartData::build(&table, None, "Confirmed", 10);
        assert!(charts.case_fatality.is_some());
        assert!(charts.recovery.is_some());
        assert!(charts.correlation.is_some());
        assert!(charts.daily.is_some());
        assert!(charts.active_vs_confirmed.is_some());
        assert!(charts.summary.is_some());
        assert_eq!(charts.top_regions.unwrap().len(), 2);
    }

    #[test]
    fn unmatched_region_yields_placeholder_panes_not_errors() {
        let table = CaseTable::from_records(vec![record("Ohio", 100.0)]);
        let charts = ChartData::build(&table, Some("Atlantis"), "Confirmed", 10);
        assert!(charts.case_fatality.is_none());
        assert!(charts.correlation.is_none());
        assert!(charts.daily.is_none());
        assert!(charts.active_vs_confirmed.is_none());
        assert!(charts.summary.is_none());
        // Top-N ignores the region filter, matching the source dashboard.
        assert!(charts.top_regions.is_some());
    }

    #[test]
    fn top_n_ranking_ignores_region_filter() {
        let table = CaseTable::from_records(vec![
            record("Ohio", 100.0),
            record("Alaska", 40.0),
            record("Guam", 10.0),
        ]);
        let charts = ChartData::build(&table, Some("Guam"), "Confirmed", 2);
        let top = charts.top_regions.unwrap();
        assert_eq!(top[0].0, "Ohio");
        assert_eq!(top.len(), 2);
    }
}
