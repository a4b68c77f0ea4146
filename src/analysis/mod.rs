//! Exploratory analysis: descriptive statistics, correlation, chart data.

pub mod charts;
pub mod stats;
