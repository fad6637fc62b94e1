use chrono::NaiveDate;
use eframe::egui::{Align2, Color32, FontId, Sense, Ui, Vec2};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, Points};

use crate::color::{contrast_text, diverging_color, generate_palette};
use crate::data::aggregate::{CorrelationMatrix, Histogram};
use crate::state::AppState;

const PANE_HEIGHT: f32 = 240.0;

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

/// Render the six dashboard panes in a two-column grid.
pub fn charts_grid(ui: &mut Ui, state: &AppState) {
    let charts = match &state.charts {
        Some(c) => c,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a dataset to view charts  (File → Open…)");
            });
            return;
        }
    };

    ui.columns(2, |cols| {
        histogram_pane(
            &mut cols[0],
            "Case Fatality Ratio Distribution",
            charts.case_fatality.as_ref(),
            Color32::from_rgb(204, 85, 85),
        );
        heatmap_pane(&mut cols[1], charts.correlation.as_ref());
    });
    ui.columns(2, |cols| {
        daily_pane(&mut cols[0], charts.daily.as_deref());
        top_regions_pane(
            &mut cols[1],
            charts.top_regions.as_deref(),
            state.case_metric.column_name(),
            state.top_n,
        );
    });
    ui.columns(2, |cols| {
        histogram_pane(
            &mut cols[0],
            "Recovery Rate Distribution",
            charts.recovery.as_ref(),
            Color32::from_rgb(85, 160, 204),
        );
        scatter_pane(&mut cols[1], charts.active_vs_confirmed.as_deref());
    });
}

/// Shown in place of any pane whose aggregator returned no result.
fn placeholder(ui: &mut Ui, title: &str) {
    ui.heading(title);
    ui.add_space(PANE_HEIGHT / 2.0 - 20.0);
    ui.vertical_centered(|ui: &mut Ui| {
        ui.weak("No data for this selection");
    });
    ui.add_space(PANE_HEIGHT / 2.0 - 20.0);
}

// ---------------------------------------------------------------------------
// Histograms (case fatality ratio, recovery rate)
// ---------------------------------------------------------------------------

fn histogram_pane(ui: &mut Ui, title: &str, hist: Option<&Histogram>, color: Color32) {
    let Some(hist) = hist else {
        placeholder(ui, title);
        return;
    };
    ui.heading(title);

    let width = hist.bin_width();
    let bars: Vec<Bar> = hist
        .bins
        .iter()
        .map(|b| {
            Bar::new((b.start + b.end) / 2.0, b.count as f64)
                .width(width * 0.95)
                .fill(color)
        })
        .collect();

    Plot::new(title.to_owned())
        .height(PANE_HEIGHT)
        .x_axis_label("Percent")
        .y_axis_label("Rows")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap (painter-drawn)
// ---------------------------------------------------------------------------

fn heatmap_pane(ui: &mut Ui, matrix: Option<&CorrelationMatrix>) {
    let title = "Correlation Matrix Heatmap";
    let Some(matrix) = matrix else {
        placeholder(ui, title);
        return;
    };
    ui.heading(title);

    let n = matrix.columns.len();
    let label_w = 86.0;
    let label_h = 16.0;
    let cell = ((ui.available_width() - label_w) / n as f32)
        .min((PANE_HEIGHT - label_h) / n as f32)
        .max(18.0);

    let size = Vec2::new(label_w + cell * n as f32, label_h + cell * n as f32);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;
    let text_color = ui.visuals().text_color();
    let small = FontId::proportional(9.0);

    for (i, name) in matrix.columns.iter().enumerate() {
        // Column headers along the top, row labels down the left.
        painter.text(
            origin + Vec2::new(label_w + (i as f32 + 0.5) * cell, label_h - 3.0),
            Align2::CENTER_BOTTOM,
            short_label(name),
            small.clone(),
            text_color,
        );
        painter.text(
            origin + Vec2::new(label_w - 4.0, label_h + (i as f32 + 0.5) * cell),
            Align2::RIGHT_CENTER,
            short_label(name),
            small.clone(),
            text_color,
        );
    }

    for (i, row) in matrix.values.iter().enumerate() {
        for (j, &r) in row.iter().enumerate() {
            let min = origin + Vec2::new(label_w + j as f32 * cell, label_h + i as f32 * cell);
            let rect = eframe::egui::Rect::from_min_size(min, Vec2::splat(cell - 1.0));
            let rounding = eframe::egui::CornerRadius::same(2);
            if r.is_nan() {
                painter.rect_filled(rect, rounding, Color32::from_gray(120));
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    "–",
                    small.clone(),
                    Color32::WHITE,
                );
            } else {
                painter.rect_filled(rect, rounding, diverging_color(r));
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    format!("{r:.2}"),
                    small.clone(),
                    contrast_text(r),
                );
            }
        }
    }
}

fn short_label(name: &str) -> String {
    // "Case_Fatality_Ratio" → "CFR", "Recovery_Rate" → "RR", counts as-is.
    if name.contains('_') {
        name.split('_')
            .filter_map(|part| part.chars().next())
            .collect()
    } else {
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// Daily cases trend
// ---------------------------------------------------------------------------

fn daily_pane(ui: &mut Ui, series: Option<&[(NaiveDate, f64)]>) {
    let title = "Daily Cases Trend";
    let Some(series) = series else {
        placeholder(ui, title);
        return;
    };
    ui.heading(title);

    let first = series[0].0;
    let points: PlotPoints = series
        .iter()
        .map(|(date, total)| [(*date - first).num_days() as f64, *total])
        .collect();

    Plot::new(title)
        .height(PANE_HEIGHT)
        .y_axis_label("Confirmed")
        .x_axis_formatter(move |mark, _range| {
            let days = mark.value.round() as i64;
            (first + chrono::Duration::days(days))
                .format("%m-%d")
                .to_string()
        })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(Color32::from_rgb(85, 160, 204)).width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Top-N regions bar chart
// ---------------------------------------------------------------------------

fn top_regions_pane(ui: &mut Ui, top: Option<&[(String, f64)]>, case_type: &str, top_n: usize) {
    let title = format!("Top {top_n} Regions by {case_type}");
    let Some(top) = top else {
        placeholder(ui, &title);
        return;
    };
    ui.heading(&title);

    let palette = generate_palette(top.len());
    let n = top.len();
    // Largest total at the top of the chart.
    let bars: Vec<Bar> = top
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(i, ((_, total), color))| {
            Bar::new((n - 1 - i) as f64, *total).width(0.7).fill(color)
        })
        .collect();

    let names: Vec<String> = top.iter().map(|(region, _)| region.clone()).collect();
    Plot::new(title)
        .height(PANE_HEIGHT)
        .x_axis_label(case_type.to_owned())
        .y_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            names
                .get(n.saturating_sub(1).saturating_sub(idx as usize))
                .cloned()
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

// ---------------------------------------------------------------------------
// Active vs confirmed scatter
// ---------------------------------------------------------------------------

fn scatter_pane(ui: &mut Ui, points: Option<&[[f64; 2]]>) {
    let title = "Active vs. Confirmed Cases";
    let Some(points) = points else {
        placeholder(ui, title);
        return;
    };
    ui.heading(title);

    let plot_points: PlotPoints = points.iter().copied().collect();
    Plot::new(title)
        .height(PANE_HEIGHT)
        .x_axis_label("Confirmed")
        .y_axis_label("Active")
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(plot_points)
                    .radius(2.5)
                    .color(Color32::from_rgb(120, 110, 200)),
            );
        });
}

// ---------------------------------------------------------------------------
// Summary statistics table
// ---------------------------------------------------------------------------

/// Collapsible table of per-column descriptive statistics for the current
/// filter selection.
pub fn summary_section(ui: &mut Ui, state: &AppState) {
    let Some(charts) = &state.charts else {
        return;
    };

    eframe::egui::CollapsingHeader::new("Summary statistics")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let Some(summary) = &charts.summary else {
                ui.weak("No data for this selection");
                return;
            };

            use egui_extras::{Column, TableBuilder};
            TableBuilder::new(ui)
                .striped(true)
                .column(Column::auto().at_least(130.0))
                .columns(Column::remainder(), 8)
                .header(18.0, |mut header| {
                    for label in [
                        "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
                    ] {
                        header.col(|ui| {
                            ui.strong(label);
                        });
                    }
                })
                .body(|mut body| {
                    for (name, s) in summary {
                        body.row(16.0, |mut row| {
                            row.col(|ui| {
                                ui.label(name);
                            });
                            row.col(|ui| {
                                ui.label(s.count.to_string());
                            });
                            for v in [s.mean, s.std_dev, s.min, s.q25, s.median, s.q75, s.max] {
                                row.col(|ui| {
                                    ui.label(format_stat(v));
                                });
                            }
                        });
                    }
                });
        });
}

fn format_stat(v: f64) -> String {
    if v.is_nan() {
        "–".to_string()
    } else {
        format!("{v:.2}")
    }
}
