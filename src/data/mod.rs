/// Data layer: core types, loading/cleaning, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse → coerce numerics → drop bad rows → derive ratios
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ CaseTable │  Vec<CaseRecord>, region index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  exact-match region restriction
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  summary stats · correlation · daily totals · top-K
///   └───────────┘
/// ```
///
/// Every aggregator is a pure function of its input table and signals
/// "no result" on empty input with `None`.

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
