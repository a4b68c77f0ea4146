//! Dependency manifest export (File → Export dependency manifest…).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Libraries the tool is built on, one per manifest line.
pub const DEPENDENCIES: &[&str] = &[
    "eframe",
    "egui_plot",
    "egui_extras",
    "rfd",
    "csv",
    "calamine",
    "arrow",
    "parquet",
    "ndarray",
    "rand",
    "rayon",
];

/// Manifest contents: dependency names separated by newlines.
pub fn manifest_text() -> String {
    DEPENDENCIES.join("\n")
}

/// Write the manifest to `path`, replacing any existing file.
pub fn write_manifest(path: &Path) -> Result<()> {
    fs::write(path, manifest_text())
        .with_context(|| format!("writing manifest to {}", path.display()))?;
    log::info!("Wrote dependency manifest to {}", path.display());
    Ok(())
}
