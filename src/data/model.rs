use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Column names (as they appear in the source dataset header)
// ---------------------------------------------------------------------------

pub const COL_REGION: &str = "Province_State";
pub const COL_LAST_UPDATE: &str = "Last_Update";
pub const COL_CONFIRMED: &str = "Confirmed";
pub const COL_DEATHS: &str = "Deaths";
pub const COL_RECOVERED: &str = "Recovered";
pub const COL_ACTIVE: &str = "Active";
pub const COL_CASE_FATALITY: &str = "Case_Fatality_Ratio";
pub const COL_RECOVERY_RATE: &str = "Recovery_Rate";

/// The four count columns that must survive numeric coercion.
pub const COUNT_COLUMNS: [&str; 4] = [COL_CONFIRMED, COL_DEATHS, COL_RECOVERED, COL_ACTIVE];

/// All numeric columns, counts first, derived ratios last (the order used by
/// summary tables and the correlation matrix).
pub const NUMERIC_COLUMNS: [&str; 6] = [
    COL_CONFIRMED,
    COL_DEATHS,
    COL_RECOVERED,
    COL_ACTIVE,
    COL_CASE_FATALITY,
    COL_RECOVERY_RATE,
];

// ---------------------------------------------------------------------------
// CaseMetric – a selectable count column
// ---------------------------------------------------------------------------

/// One of the four cumulative count columns a caller can rank regions by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMetric {
    #[default]
    Confirmed,
    Deaths,
    Recovered,
    Active,
}

impl CaseMetric {
    pub const ALL: [CaseMetric; 4] = [
        CaseMetric::Confirmed,
        CaseMetric::Deaths,
        CaseMetric::Recovered,
        CaseMetric::Active,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            CaseMetric::Confirmed => COL_CONFIRMED,
            CaseMetric::Deaths => COL_DEATHS,
            CaseMetric::Recovered => COL_RECOVERED,
            CaseMetric::Active => COL_ACTIVE,
        }
    }

    /// Exact column-name match; `None` for anything else.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.column_name() == name)
    }

    /// Resolve a caller-supplied column name, falling back to `Confirmed`
    /// when the name is not a count column.
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    pub fn value_of(self, record: &CaseRecord) -> f64 {
        match self {
            CaseMetric::Confirmed => record.confirmed,
            CaseMetric::Deaths => record.deaths,
            CaseMetric::Recovered => record.recovered,
            CaseMetric::Active => record.active,
        }
    }
}

impl fmt::Display for CaseMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

// ---------------------------------------------------------------------------
// CaseRecord – one row of the cleaned dataset
// ---------------------------------------------------------------------------

/// A single observational record (one cleaned row of the source table).
///
/// Invariants established by the loader:
/// * the four counts are finite and non-negative
/// * `region` is always text (possibly empty), never missing
/// * the two ratios are `None` exactly when `confirmed == 0`
#[derive(Debug, Clone)]
pub struct CaseRecord {
    pub region: String,
    /// Best-effort parse of the `Last_Update` column; `None` when malformed.
    pub last_update: Option<NaiveDateTime>,
    pub confirmed: f64,
    pub deaths: f64,
    pub recovered: f64,
    pub active: f64,
    pub case_fatality_ratio: Option<f64>,
    pub recovery_rate: Option<f64>,
}

impl CaseRecord {
    /// Look up a numeric column by name. Counts are always present; the two
    /// ratio columns are `None` when undefined. Unknown names yield `None`.
    pub fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            COL_CONFIRMED => Some(self.confirmed),
            COL_DEATHS => Some(self.deaths),
            COL_RECOVERED => Some(self.recovered),
            COL_ACTIVE => Some(self.active),
            COL_CASE_FATALITY => self.case_fatality_ratio,
            COL_RECOVERY_RATE => self.recovery_rate,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CaseTable – the complete cleaned dataset
// ---------------------------------------------------------------------------

/// The cleaned table plus the sorted set of unique regions (used to populate
/// the region filter combo box).
#[derive(Debug, Clone, Default)]
pub struct CaseTable {
    pub records: Vec<CaseRecord>,
    /// Sorted unique region names.
    pub regions: Vec<String>,
}

impl CaseTable {
    /// Build the region index from the cleaned records.
    pub fn from_records(records: Vec<CaseRecord>) -> Self {
        let regions: BTreeSet<String> = records.iter().map(|r| r.region.clone()).collect();
        CaseTable {
            records,
            regions: regions.into_iter().collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All non-missing values of one numeric column, in row order.
    pub fn column_values(&self, column: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.numeric_value(column))
            .collect()
    }
}
