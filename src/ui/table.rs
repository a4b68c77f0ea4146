use eframe::egui::{self, Layout, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::analysis::stats::{NumericSummary, Summary};
use crate::data::clean::LabelEncoding;
use crate::data::model::{CellValue, Dataset};
use crate::ml::metrics::ClassificationReport;

// ---------------------------------------------------------------------------
// Generic string table
// ---------------------------------------------------------------------------

const ROW_HEIGHT: f32 = 18.0;

/// Striped, non-scrolling table of pre-formatted cells.
fn string_table(ui: &mut Ui, id: &str, headers: &[String], rows: &[Vec<String>]) {
    ui.push_id(id, |ui: &mut Ui| {
        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .cell_layout(Layout::left_to_right(egui::Align::Center));
        for _ in headers {
            builder = builder.column(Column::auto().at_least(60.0));
        }

        builder
            .header(20.0, |mut header| {
                for name in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let cells = &rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// Dataset previews
// ---------------------------------------------------------------------------

/// First `n` rows of a dataset, with the index as the first column.
pub fn dataset_preview(ui: &mut Ui, id: &str, dataset: &Dataset, n: usize) {
    let head = dataset.head(n);
    let mut headers = vec![String::new()];
    headers.extend(head.column_names());

    let rows: Vec<Vec<String>> = (0..head.n_rows())
        .map(|i| {
            let mut cells = vec![i.to_string()];
            cells.extend(head.row(i).iter().map(format_cell));
            cells
        })
        .collect();

    egui::ScrollArea::horizontal()
        .id_salt(id)
        .show(ui, |ui: &mut Ui| string_table(ui, id, &headers, &rows));
}

fn format_cell(value: &CellValue) -> String {
    match value {
        CellValue::Null => "NaN".to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// `describe()`-style table: one row per statistic, one column per feature.
pub fn summary_table(ui: &mut Ui, summary: &Summary) {
    let (headers, rows) = match summary {
        Summary::Numeric(cols) => {
            let stats: [(&str, fn(&NumericSummary) -> String); 8] = [
                ("count", |s| s.count.to_string()),
                ("mean", |s| format_number(s.mean)),
                ("std", |s| format_number(s.std)),
                ("min", |s| format_number(s.min)),
                ("25%", |s| format_number(s.q25)),
                ("50%", |s| format_number(s.median)),
                ("75%", |s| format_number(s.q75)),
                ("max", |s| format_number(s.max)),
            ];
            let headers = header_row(cols.iter().map(|s| s.column.clone()));
            let rows = stats
                .iter()
                .map(|(name, f)| {
                    let mut row = vec![name.to_string()];
                    row.extend(cols.iter().map(f));
                    row
                })
                .collect::<Vec<_>>();
            (headers, rows)
        }
        Summary::Categorical(cols) => {
            let headers = header_row(cols.iter().map(|s| s.column.clone()));
            let rows = vec![
                labelled("count", cols.iter().map(|s| s.count.to_string())),
                labelled("unique", cols.iter().map(|s| s.unique.to_string())),
                labelled(
                    "top",
                    cols.iter()
                        .map(|s| s.top.as_ref().map(|v| v.to_string()).unwrap_or_default()),
                ),
                labelled("freq", cols.iter().map(|s| s.freq.to_string())),
            ];
            (headers, rows)
        }
    };

    egui::ScrollArea::horizontal()
        .id_salt("summary_scroll")
        .show(ui, |ui: &mut Ui| string_table(ui, "summary", &headers, &rows));
}

fn header_row(columns: impl Iterator<Item = String>) -> Vec<String> {
    std::iter::once(String::new()).chain(columns).collect()
}

fn labelled(name: &str, cells: impl Iterator<Item = String>) -> Vec<String> {
    std::iter::once(name.to_string()).chain(cells).collect()
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.4}")
    }
}

// ---------------------------------------------------------------------------
// Label encodings and classification report
// ---------------------------------------------------------------------------

/// One collapsible code → value table per encoded column.
pub fn encoding_legend(ui: &mut Ui, encodings: &[LabelEncoding]) {
    for enc in encodings {
        egui::CollapsingHeader::new(format!("{}  ({} codes)", enc.column, enc.classes.len()))
            .id_salt(("encoding", &enc.column))
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                let rows: Vec<Vec<String>> = enc
                    .classes
                    .iter()
                    .enumerate()
                    .map(|(code, value)| vec![code.to_string(), value.to_string()])
                    .collect();
                string_table(
                    ui,
                    &format!("encoding_{}", enc.column),
                    &["code".to_string(), "value".to_string()],
                    &rows,
                );
            });
    }
}

/// Fixed-width classification report.
pub fn classification_report(ui: &mut Ui, report: &ClassificationReport) {
    ui.label(RichText::new(report.to_text()).monospace());
}
