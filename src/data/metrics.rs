// ---------------------------------------------------------------------------
// Derived ratio columns
// ---------------------------------------------------------------------------

/// Deaths as a percentage of confirmed cases.
/// Undefined (`None`) when there are no confirmed cases.
pub fn case_fatality_ratio(deaths: f64, confirmed: f64) -> Option<f64> {
    ratio_percent(deaths, confirmed)
}

/// Recoveries as a percentage of confirmed cases.
/// Undefined (`None`) when there are no confirmed cases.
pub fn recovery_rate(recovered: f64, confirmed: f64) -> Option<f64> {
    ratio_percent(recovered, confirmed)
}

fn ratio_percent(numerator: f64, confirmed: f64) -> Option<f64> {
    if confirmed == 0.0 {
        None
    } else {
        Some(numerator / confirmed * 100.0)
    }
}
