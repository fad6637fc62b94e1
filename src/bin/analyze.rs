//! Non-interactive analysis entry point: load the dataset, print summary
//! statistics and the correlation matrix to stdout.
//!
//! Usage: `analyze [--json] [path]` (path defaults to `CASEWATCH_DATA`,
//! then `processed_data.csv`).

use std::path::Path;

use anyhow::{Context, Result};
use casewatch::data::aggregate::{correlation_matrix, summary_stats, ColumnSummary};
use casewatch::data::loader::load_file;

fn main() -> Result<()> {
    env_logger::init();

    let mut as_json = false;
    let mut path_arg = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => as_json = true,
            other => path_arg = Some(other.to_string()),
        }
    }
    let path = path_arg
        .or_else(|| std::env::var("CASEWATCH_DATA").ok())
        .unwrap_or_else(|| "processed_data.csv".to_string());

    let table = load_file(Path::new(&path)).with_context(|| format!("loading {path}"))?;
    log::info!("loaded {} rows across {} regions", table.len(), table.regions.len());

    let summary = summary_stats(&table);
    let correlation = correlation_matrix(&table);

    if as_json {
        let out = serde_json::json!({
            "rows": table.len(),
            "summary": summary.as_ref().map(|stats| {
                stats
                    .iter()
                    .map(|(name, s)| (name.clone(), serde_json::to_value(s).unwrap_or_default()))
                    .collect::<serde_json::Map<_, _>>()
            }),
            "correlation": correlation,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match summary {
        Some(stats) => print_summary(&stats),
        None => println!("Summary Statistics: no data"),
    }
    println!();
    match correlation {
        Some(matrix) => {
            println!("Correlation Matrix:");
            print!("{:>14}", "");
            for col in &matrix.columns {
                print!("{:>22}", col);
            }
            println!();
            for (name, row) in matrix.columns.iter().zip(&matrix.values) {
                print!("{:>14}", truncate(name, 14));
                for v in row {
                    print!("{:>22}", format_stat(*v));
                }
                println!();
            }
        }
        None => println!("Correlation Matrix: no data"),
    }

    Ok(())
}

const STAT_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn print_summary(stats: &[(String, ColumnSummary)]) {
    println!("Summary Statistics:");
    print!("{:>7}", "");
    for (name, _) in stats {
        print!("{:>22}", name);
    }
    println!();
    for label in STAT_ROWS {
        print!("{:>7}", label);
        for (_, s) in stats {
            let value = match label {
                "count" => s.count as f64,
                "mean" => s.mean,
                "std" => s.std_dev,
                "min" => s.min,
                "25%" => s.q25,
                "50%" => s.median,
                "75%" => s.q75,
                _ => s.max,
            };
            print!("{:>22}", format_stat(value));
        }
        println!();
    }
}

fn format_stat(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.6}")
    }
}

/// Truncate to at most `max` characters, never splitting a multibyte char.
fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Confirmed", 14), "Confirmed");
        assert_eq!(truncate("Case_Fatality_Ratio", 14), "Case_Fatality_");
        // Multibyte labels must not split mid-character.
        assert_eq!(truncate("Åland_Östersjön", 6), "Åland_");
        assert_eq!(truncate("日本地域", 2), "日本");
    }

    #[test]
    fn stat_formatting_marks_missing_values() {
        assert_eq!(format_stat(f64::NAN), "NaN");
        assert_eq!(format_stat(2.5), "2.500000");
    }
}
