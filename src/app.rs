use eframe::egui;

use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CaseWatchApp {
    pub state: AppState,
}

impl CaseWatchApp {
    /// Start with a dataset already loaded (CLI argument / env var).
    pub fn with_dataset(path: std::path::PathBuf) -> Self {
        let mut app = Self::default();
        app.state.open(path);
        app
    }
}

impl eframe::App for CaseWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart grid + summary table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    charts::charts_grid(ui, &self.state);
                    ui.separator();
                    charts::summary_section(ui, &self.state);
                });
        });
    }
}
