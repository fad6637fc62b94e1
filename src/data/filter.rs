use super::model::CaseTable;

// ---------------------------------------------------------------------------
// Region filter
// ---------------------------------------------------------------------------

/// Restrict a table to rows whose region equals `region` exactly
/// (case-sensitive, no partial match).
///
/// * `None` → the table is returned unchanged.
/// * No matching rows → an empty table, not an error.
pub fn by_region(table: &CaseTable, region: Option<&str>) -> CaseTable {
    match region {
        None => table.clone(),
        Some(wanted) => CaseTable::from_records(
            table
                .records
                .iter()
                .filter(|r| r.region == wanted)
                .cloned()
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CaseRecord;

    fn table() -> CaseTable {
        let record = |region: &str, confirmed: f64| CaseRecord {
            region: region.to_string(),
            last_update: None,
            confirmed,
            deaths: 0.0,
            recovered: 0.0,
            active: confirmed,
            case_fatality_ratio: Some(0.0),
            recovery_rate: Some(0.0),
        };
        CaseTable::from_records(vec![
            record("Ohio", 10.0),
            record("Alaska", 5.0),
            record("Ohio", 7.0),
        ])
    }

    #[test]
    fn no_region_returns_table_unchanged() {
        let t = table();
        assert_eq!(by_region(&t, None).len(), t.len());
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        let t = table();
        let ohio = by_region(&t, Some("Ohio"));
        assert_eq!(ohio.len(), 2);
        assert!(ohio.records.iter().all(|r| r.region == "Ohio"));
        assert!(by_region(&t, Some("ohio")).is_empty());
        assert!(by_region(&t, Some("Oh")).is_empty());
    }

    #[test]
    fn absent_region_returns_empty_table() {
        let t = table();
        let none = by_region(&t, Some("Atlantis"));
        assert!(none.is_empty());
        assert!(none.regions.is_empty());
    }
}
