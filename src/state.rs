use std::path::Path;

use crate::config::Settings;
use crate::data::model::Dataset;
use crate::pipeline::{self, PipelineOptions, PipelineReport};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Table as loaded from disk (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Name of the loaded file, shown in the top bar.
    pub file_name: Option<String>,

    pub settings: Settings,

    /// Current control values.
    pub options: PipelineOptions,

    /// Output of the last pipeline pass over `dataset`.
    pub report: Option<PipelineReport>,

    /// Options the current `report` was computed with.
    last_run: Option<PipelineOptions>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            dataset: None,
            file_name: None,
            settings,
            options: PipelineOptions::default(),
            report: None,
            last_run: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and reset the controls for it.
    pub fn set_dataset(&mut self, dataset: Dataset, path: &Path) {
        self.options = PipelineOptions::for_dataset(&dataset);
        self.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.dataset = Some(dataset);
        self.report = None;
        self.last_run = None;
        self.status_message = None;
    }

    /// Re-run the pipeline when the controls changed since the last pass.
    /// Returns whether a pass ran.
    pub fn rerun_if_changed(&mut self) -> bool {
        let Some(dataset) = &self.dataset else {
            return false;
        };
        if self.last_run.as_ref() == Some(&self.options) {
            return false;
        }
        log::debug!("Controls changed, re-running pipeline");
        self.report = Some(pipeline::run(dataset, &self.options, &self.settings));
        self.last_run = Some(self.options.clone());
        true
    }

    /// Column names of the cleaned table, falling back to the raw one.
    pub fn current_columns(&self) -> Vec<String> {
        match (&self.report, &self.dataset) {
            (Some(report), _) => report.cleaned.column_names(),
            (None, Some(dataset)) => dataset.column_names(),
            (None, None) => Vec::new(),
        }
    }
}
