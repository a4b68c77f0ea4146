use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::analysis::charts::{ChartKind, ChartRequest};
use crate::data::clean::MissingPolicy;
use crate::ml::trainer::TaskKind;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – pipeline controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Controls");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let columns = state.current_columns();
    let options = &mut state.options;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Data cleaning ----
            egui::CollapsingHeader::new(RichText::new("Data Cleaning Options").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Handle missing values");
                    let selected = options
                        .missing
                        .map_or_else(|| "Leave as is".to_string(), |p| p.to_string());
                    egui::ComboBox::from_id_salt("missing_policy")
                        .selected_text(selected)
                        .show_ui(ui, |ui: &mut Ui| {
                            ui.selectable_value(&mut options.missing, None, "Leave as is");
                            for policy in MissingPolicy::ALL {
                                ui.selectable_value(
                                    &mut options.missing,
                                    Some(policy),
                                    policy.to_string(),
                                );
                            }
                        });
                    ui.checkbox(&mut options.remove_duplicates, "Remove Duplicates");
                    ui.checkbox(&mut options.encode_categoricals, "Encode Categorical Variables");
                });

            // ---- Exploration ----
            egui::CollapsingHeader::new(RichText::new("Exploratory Data Analysis").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.checkbox(&mut options.show_summary, "Show Summary Statistics");
                    ui.checkbox(&mut options.show_correlation, "Show Correlation Heatmap");
                });

            // ---- Visualization ----
            egui::CollapsingHeader::new(RichText::new("Visualization").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    let Some(request) = options.chart.as_mut() else {
                        ui.label("No columns to plot.");
                        return;
                    };
                    chart_controls(ui, request, &columns);
                });

            // ---- Machine learning ----
            egui::CollapsingHeader::new(RichText::new("Machine Learning").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Select Task");
                    for task in TaskKind::ALL {
                        ui.radio_value(&mut options.task, task, task.to_string());
                    }
                    ui.add_space(4.0);

                    ui.label("Select Target Variable");
                    let current = options.target.clone().unwrap_or_default();
                    egui::ComboBox::from_id_salt("target")
                        .selected_text(&current)
                        .show_ui(ui, |ui: &mut Ui| {
                            for col in &columns {
                                if ui.selectable_label(current == *col, col).clicked() {
                                    options.target = Some(col.clone());
                                }
                            }
                        });
                });
        });
}

fn chart_controls(ui: &mut Ui, request: &mut ChartRequest, columns: &[String]) {
    ui.label("Select Chart Type");
    egui::ComboBox::from_id_salt("chart_kind")
        .selected_text(request.kind.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ChartKind::ALL {
                ui.selectable_value(&mut request.kind, kind, kind.to_string());
            }
        });

    column_selector(ui, "chart_x", "Select X-axis", &mut request.x, columns);
    if request.kind == ChartKind::Scatter {
        column_selector(ui, "chart_y", "Select Y-axis", &mut request.y, columns);
    }
}

fn column_selector(ui: &mut Ui, id: &str, label: &str, value: &mut String, columns: &[String]) {
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(value.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                ui.selectable_value(value, col.clone(), col);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export dependency manifest…").clicked() {
                export_manifest_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let name = state.file_name.as_deref().unwrap_or("dataset");
            ui.label(format!("{name}: {} rows × {} columns", ds.n_rows(), ds.n_cols()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Upload your dataset")
        .add_filter(
            "Supported files",
            &["csv", "xlsx", "xlsm", "xls", "ods", "parquet", "pq", "json"],
        )
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows with columns {:?}",
                    dataset.n_rows(),
                    dataset.column_names()
                );
                state.set_dataset(dataset, &path);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn export_manifest_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export dependency manifest")
        .set_file_name(state.settings.manifest_file_name.as_str())
        .add_filter("Text", &["txt"])
        .save_file();

    if let Some(path) = file {
        match crate::manifest::write_manifest(&path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to export manifest: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
