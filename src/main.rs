use std::path::PathBuf;

use casewatch::app::CaseWatchApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Dataset path: first CLI argument, else CASEWATCH_DATA, else open via
    // the File menu.
    let data_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CASEWATCH_DATA").ok())
        .map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Casewatch – COVID-19 Case Explorer",
        options,
        Box::new(|_cc| {
            let app = match data_path {
                Some(path) => CaseWatchApp::with_dataset(path),
                None => CaseWatchApp::default(),
            };
            Ok(Box::new(app))
        }),
    )
}
