mod analysis;
mod app;
mod color;
mod config;
mod data;
mod error;
mod manifest;
mod ml;
mod pipeline;
mod state;
mod ui;

use app::RustyInsightApp;
use config::Settings;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::load_or_default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Insight – Data Analysis & ML",
        options,
        Box::new(|_cc| Ok(Box::new(RustyInsightApp::new(settings)))),
    )
}
