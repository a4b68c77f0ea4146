//! Tunables for the pipeline, with an optional JSON override file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File looked up in the working directory at start-up.
pub const SETTINGS_FILE: &str = "rusty-insight.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rows shown in the dataset previews.
    pub preview_rows: usize,
    /// Share of rows held out for testing.
    pub test_fraction: f64,
    /// Seed for the train/test split and the forest.
    pub random_seed: u64,
    /// Trees per forest.
    pub n_estimators: usize,
    /// Depth cap per tree (unbounded when absent).
    pub max_depth: Option<usize>,
    /// Histogram bin count (Sturges' rule when absent).
    pub histogram_bins: Option<usize>,
    /// Default name offered when exporting the dependency manifest.
    pub manifest_file_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            test_fraction: 0.2,
            random_seed: 42,
            n_estimators: 100,
            max_depth: None,
            histogram_bins: None,
            manifest_file_name: "requirements.txt".to_string(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text).context("parsing settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings from [`SETTINGS_FILE`] when present and valid, defaults otherwise.
    pub fn load_or_default() -> Self {
        let path = Path::new(SETTINGS_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {SETTINGS_FILE}");
                settings
            }
            Err(e) => {
                log::warn!("Ignoring {SETTINGS_FILE}: {e:#}");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            anyhow::bail!("test_fraction must be in (0, 1), got {}", self.test_fraction);
        }
        if self.n_estimators == 0 {
            anyhow::bail!("n_estimators must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "n_estimators": 10, "histogram_bins": 12 }"#).unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.n_estimators, 10);
        assert_eq!(settings.histogram_bins, Some(12));
        assert_eq!(settings.random_seed, 42);
        assert_eq!(settings.preview_rows, 5);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "test_fraction": 1.5 }"#).unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}
