use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{
    uniform_grid_spacer, Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line,
    LineStyle, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
};

use crate::analysis::charts::{Axis, ChartData};
use crate::analysis::stats::CorrelationMatrix;
use crate::color::{self, ClassColors};
use crate::ml::trainer::{ModelOutcome, TaskKind};

const PLOT_HEIGHT: f32 = 320.0;
const BAR_COLOR: Color32 = Color32::from_rgb(100, 149, 237);

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Label integer grid marks with category names; other marks stay blank.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

/// Category axes get one grid mark per integer.
fn unit_spacer() -> impl Fn(egui_plot::GridInput) -> Vec<GridMark> {
    uniform_grid_spacer(|_| [1.0, 1.0, 1.0])
}

fn base_plot(id: &str, x_label: &str, y_label: &str) -> Plot<'static> {
    Plot::new(id.to_string())
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(x_label.to_string())
        .y_axis_label(y_label.to_string())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
}

// ---------------------------------------------------------------------------
// Placeholder
// ---------------------------------------------------------------------------

pub fn placeholder(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading("Upload a CSV or Excel file to begin  (File → Open…)");
    });
}

// ---------------------------------------------------------------------------
// Visualization section
// ---------------------------------------------------------------------------

/// Render one of the prepared charts.
pub fn chart(ui: &mut Ui, data: &ChartData) {
    match data {
        ChartData::Histogram { column, bins } => {
            let bars: Vec<Bar> = bins
                .iter()
                .map(|b| {
                    Bar::new((b.start + b.end) / 2.0, b.count as f64)
                        .width(b.end - b.start)
                        .fill(BAR_COLOR)
                })
                .collect();
            base_plot("histogram", column, "count").show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(column));
            });
        }
        ChartData::CategoryCounts { column, counts } => {
            let bars: Vec<Bar> = counts
                .iter()
                .enumerate()
                .map(|(i, (label, n))| {
                    Bar::new(i as f64, *n as f64)
                        .width(0.8)
                        .name(label)
                        .fill(BAR_COLOR)
                })
                .collect();
            let labels = counts.iter().map(|(label, _)| label.clone()).collect();
            base_plot("category_counts", column, "count")
                .x_axis_formatter(category_formatter(labels))
                .x_grid_spacer(unit_spacer())
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(BarChart::new(bars).name(column));
                });
        }
        ChartData::Scatter { x, y, points } => {
            let mut plot = base_plot("scatter", &x.name, &y.name);
            plot = with_category_axes(plot, x, y);
            let name = format!("{} vs {}", y.name, x.name);
            plot.show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(PlotPoints::from(points.clone()))
                        .radius(2.5)
                        .color(BAR_COLOR)
                        .name(&name),
                );
            });
        }
        ChartData::Box { column, stats } => {
            let spread = BoxSpread::new(
                stats.lower_whisker,
                stats.q1,
                stats.median,
                stats.q3,
                stats.upper_whisker,
            );
            let elem = BoxElem::new(0.0, spread)
                .name(column)
                .box_width(0.5)
                .fill(BAR_COLOR.gamma_multiply(0.4))
                .stroke(Stroke::new(1.5, BAR_COLOR));
            let outliers: Vec<[f64; 2]> = stats.outliers.iter().map(|&v| [0.0, v]).collect();

            base_plot("box_plot", "", column)
                .x_axis_formatter(category_formatter(vec![column.clone()]))
                .x_grid_spacer(unit_spacer())
                .show(ui, |plot_ui| {
                    plot_ui.box_plot(BoxPlot::new(vec![elem]).name(column));
                    if !outliers.is_empty() {
                        plot_ui.points(
                            Points::new(PlotPoints::from(outliers))
                                .radius(3.0)
                                .color(Color32::LIGHT_RED)
                                .name("outliers"),
                        );
                    }
                });
        }
    }
}

fn with_category_axes<'a>(mut plot: Plot<'a>, x: &Axis, y: &Axis) -> Plot<'a> {
    if let Some(categories) = &x.categories {
        plot = plot
            .x_axis_formatter(category_formatter(categories.clone()))
            .x_grid_spacer(unit_spacer());
    }
    if let Some(categories) = &y.categories {
        plot = plot
            .y_axis_formatter(category_formatter(categories.clone()))
            .y_grid_spacer(unit_spacer());
    }
    plot
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

/// Annotated heatmap; row 0 is drawn at the top.
pub fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    let k = matrix.columns.len();
    if k == 0 {
        ui.label("No numeric columns to correlate.");
        return;
    }

    let x_labels = matrix.columns.clone();
    let y_labels: Vec<String> = matrix.columns.iter().rev().cloned().collect();

    Plot::new("correlation_heatmap")
        .height(PLOT_HEIGHT.max(40.0 * k as f32))
        .data_aspect(1.0)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(category_formatter(x_labels))
        .y_axis_formatter(category_formatter(y_labels))
        .x_grid_spacer(unit_spacer())
        .y_grid_spacer(unit_spacer())
        .show(ui, |plot_ui| {
            for i in 0..k {
                let y = (k - 1 - i) as f64;
                for j in 0..k {
                    let x = j as f64;
                    let r = matrix.get(i, j);
                    let cell = vec![
                        [x - 0.5, y - 0.5],
                        [x + 0.5, y - 0.5],
                        [x + 0.5, y + 0.5],
                        [x - 0.5, y + 0.5],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(cell))
                            .fill_color(color::diverging(r))
                            .stroke(Stroke::new(0.5, Color32::WHITE)),
                    );
                    let label = if r.is_nan() { "NaN".to_string() } else { format!("{r:.2}") };
                    plot_ui.text(Text::new(
                        PlotPoint::new(x, y),
                        RichText::new(label).color(color::text_color_on(r)),
                    ));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Model plots
// ---------------------------------------------------------------------------

/// Scatter of actual against predicted values for the held-out rows.
pub fn actual_vs_predicted(ui: &mut Ui, outcome: &ModelOutcome) {
    let points = &outcome.actual_vs_predicted;
    let mut plot = base_plot("actual_vs_predicted", "Actual", "Predicted");

    match outcome.task {
        TaskKind::Classification => {
            let labels = outcome.class_labels.clone();
            plot = plot
                .x_axis_formatter(category_formatter(labels.clone()))
                .y_axis_formatter(category_formatter(labels))
                .x_grid_spacer(unit_spacer())
                .y_grid_spacer(unit_spacer());
            let colors = ClassColors::new(&outcome.class_labels);
            plot.show(ui, |plot_ui| {
                for (class, (label, color)) in colors.legend_entries().into_iter().enumerate() {
                    let class_points: Vec<[f64; 2]> = points
                        .iter()
                        .filter(|p| p[0] as usize == class)
                        .copied()
                        .collect();
                    if class_points.is_empty() {
                        continue;
                    }
                    plot_ui.points(
                        Points::new(PlotPoints::from(class_points))
                            .radius(4.0)
                            .color(color)
                            .name(label),
                    );
                }
            });
        }
        TaskKind::Regression => {
            let (lo, hi) = points
                .iter()
                .flat_map(|p| p.iter().copied())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
            plot.show(ui, |plot_ui| {
                if lo.is_finite() && hi.is_finite() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(vec![[lo, lo], [hi, hi]]))
                            .name("ideal")
                            .color(Color32::GRAY)
                            .style(LineStyle::dashed_loose()),
                    );
                }
                plot_ui.points(
                    Points::new(PlotPoints::from(points.clone()))
                        .radius(3.0)
                        .color(BAR_COLOR)
                        .name(&outcome.target),
                );
            });
        }
    }
}

/// Horizontal bars, most important feature on top.
pub fn feature_importances(ui: &mut Ui, outcome: &ModelOutcome) {
    let n = outcome.feature_importances.len();
    if n == 0 {
        return;
    }
    let bars: Vec<Bar> = outcome
        .feature_importances
        .iter()
        .enumerate()
        .map(|(i, (name, value))| {
            Bar::new((n - 1 - i) as f64, *value)
                .width(0.7)
                .name(name)
                .fill(BAR_COLOR)
        })
        .collect();
    let labels: Vec<String> = outcome
        .feature_importances
        .iter()
        .rev()
        .map(|(name, _)| name.clone())
        .collect();

    base_plot("feature_importances", "importance", "")
        .height(PLOT_HEIGHT.min(60.0 + 24.0 * n as f32))
        .y_axis_formatter(category_formatter(labels))
        .y_grid_spacer(unit_spacer())
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().name("importance"));
        });
}
