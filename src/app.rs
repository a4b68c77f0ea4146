use eframe::egui::{self, Color32, RichText, Ui};

use crate::config::Settings;
use crate::error::PipelineError;
use crate::ml::trainer::Scores;
use crate::pipeline::PipelineReport;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyInsightApp {
    pub state: AppState,
}

impl RustyInsightApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
        }
    }
}

impl eframe::App for RustyInsightApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: pipeline controls ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        self.state.rerun_if_changed();

        // ---- Central panel: results ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let state = &self.state;
            let (Some(raw), Some(report)) = (&state.dataset, &state.report) else {
                plot::placeholder(ui);
                return;
            };
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.heading("Raw Data Preview");
                    table::dataset_preview(ui, "raw_preview", raw, state.settings.preview_rows);
                    ui.add_space(8.0);
                    results(ui, report, state.settings.preview_rows);
                });
        });
    }
}

/// Everything below the raw preview, in pipeline order.
fn results(ui: &mut Ui, report: &PipelineReport, preview_rows: usize) {
    ui.heading("Cleaned Data Preview");
    cleaning_notes(ui, report);
    table::dataset_preview(ui, "cleaned_preview", &report.cleaned, preview_rows);
    if !report.encodings.is_empty() {
        table::encoding_legend(ui, &report.encodings);
    }

    if let Some(summary) = &report.summary {
        section(ui, "Summary Statistics");
        table::summary_table(ui, summary);
    }

    if let Some(matrix) = &report.correlation {
        section(ui, "Correlation Heatmap");
        plot::correlation_heatmap(ui, matrix);
    }

    if let Some(chart) = &report.chart {
        section(ui, "Visualization");
        match chart {
            Ok(data) => plot::chart(ui, data),
            Err(e) => error_label(ui, e),
        }
    }

    if let Some(model) = &report.model {
        section(ui, "Model Performance");
        match model {
            Ok(outcome) => {
                ui.label(format!(
                    "{} on '{}': {} training rows, {} test rows",
                    outcome.task, outcome.target, outcome.n_train, outcome.n_test
                ));
                match &outcome.scores {
                    Scores::Classification(cr) => {
                        ui.label(RichText::new(format!("Accuracy: {:.4}", cr.accuracy)).strong());
                        table::classification_report(ui, cr);
                    }
                    Scores::Regression { mse, r2 } => {
                        ui.label(RichText::new(format!("Mean Squared Error: {mse:.4}")).strong());
                        ui.label(RichText::new(format!("R² Score: {r2:.4}")).strong());
                    }
                }

                section(ui, "Actual vs Predicted");
                plot::actual_vs_predicted(ui, outcome);

                section(ui, "Feature Importances");
                plot::feature_importances(ui, outcome);
            }
            Err(e) => error_label(ui, e),
        }
    }
}

fn cleaning_notes(ui: &mut Ui, report: &PipelineReport) {
    if let Some(missing) = &report.missing {
        if missing.rows_dropped > 0 {
            ui.label(format!("Dropped {} rows with missing values", missing.rows_dropped));
        }
        for (column, n) in &missing.filled {
            ui.label(format!("Filled {n} missing values in '{column}'"));
        }
    }
    if let Some(n) = report.duplicates_removed {
        ui.label(format!("Removed {n} duplicate rows"));
    }
    ui.label(format!(
        "{} rows × {} columns",
        report.cleaned.n_rows(),
        report.cleaned.n_cols()
    ));
    if report.cleaned.is_empty() {
        ui.label(RichText::new("No rows left after cleaning.").color(Color32::YELLOW));
    }
}

fn section(ui: &mut Ui, title: &str) {
    ui.add_space(8.0);
    ui.separator();
    ui.heading(title);
}

fn error_label(ui: &mut Ui, e: &PipelineError) {
    ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
}
