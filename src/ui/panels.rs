use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::model::CaseMetric;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter controls
// ---------------------------------------------------------------------------

/// Render the filter panel: region, case type, top-N, refresh.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(table) = &state.table else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone so we can mutate state inside the combo closures.
    let regions = table.regions.clone();

    // ---- Region filter ----
    ui.strong("Region");
    let selected_text = state
        .selected_region
        .clone()
        .unwrap_or_else(|| "All regions".to_string());
    egui::ComboBox::from_id_salt("region_filter")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(state.selected_region.is_none(), "All regions")
                .clicked()
            {
                state.set_region(None);
            }
            for region in &regions {
                let label = if region.is_empty() { "(unnamed)" } else { region };
                if ui
                    .selectable_label(state.selected_region.as_deref() == Some(region), label)
                    .clicked()
                {
                    state.set_region(Some(region.clone()));
                }
            }
        });
    ui.add_space(8.0);

    // ---- Case type for the top-N ranking ----
    ui.strong("Case type");
    egui::ComboBox::from_id_salt("case_type")
        .selected_text(state.case_metric.column_name())
        .show_ui(ui, |ui: &mut Ui| {
            for metric in CaseMetric::ALL {
                if ui
                    .selectable_label(state.case_metric == metric, metric.column_name())
                    .clicked()
                {
                    state.set_case_metric(metric);
                }
            }
        });
    ui.add_space(8.0);

    // ---- Top-N ----
    ui.strong("Top N regions");
    let mut top_n = state.top_n;
    if ui.add(egui::Slider::new(&mut top_n, 1..=25)).changed() {
        state.set_top_n(top_n);
    }
    ui.add_space(12.0);

    // ---- Refresh: fresh read of the source file ----
    if ui.button("Refresh charts").clicked() {
        state.refresh();
    }
    if state.loading {
        ui.spinner();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status bar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            let filtered = state
                .selected_region
                .as_deref()
                .map(|region| {
                    table
                        .records
                        .iter()
                        .filter(|r| r.region == region)
                        .count()
                })
                .unwrap_or(table.len());
            ui.label(format!(
                "{} rows, {} regions, {} in view",
                table.len(),
                table.regions.len(),
                filtered
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open case dataset")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open(path);
    }
}
