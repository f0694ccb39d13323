//! JSON analysis export and zip bundling
//!
//! Generates a machine-readable record of one pipeline run (cleaning stats,
//! correlation matrix, ranked pairs and artifact paths) next to the HTML report.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use super::artifacts::{AnalysisArtifacts, ArtifactHandle};
use crate::pipeline::{
    AnalysisOutcome, CleaningStats, CorrelationMethod, Stage, VariablePair, Workspace,
};

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub timestamp: String,
    pub version: String,
    pub input_file: String,
    pub report_file: String,
    pub top_k: usize,
    pub method: CorrelationMethod,
}

/// Outcome of the analysis stage in the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportOutcome {
    Correlated,
    InsufficientData,
}

/// Complete analysis export
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisExport {
    pub metadata: ExportMetadata,
    pub stage: Stage,
    pub cleaning: CleaningStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_column: Option<String>,
    pub outcome: ExportOutcome,
    pub columns: Vec<String>,
    /// Correlation matrix rows; undefined cells are `null`
    pub matrix: Vec<Vec<Option<f64>>>,
    pub qualifying_pairs: usize,
    pub ranked_pairs: Vec<VariablePair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<AnalysisArtifacts>,
}

impl AnalysisExport {
    /// Collect the export from a workspace that has completed the analysis stage
    pub fn from_workspace(workspace: &Workspace, report_file: &Path) -> Result<Self> {
        let (Some(cleaned), Some(sorted), Some(analysis)) = (
            workspace.cleaned(),
            workspace.sorted(),
            workspace.analysis(),
        ) else {
            anyhow::bail!("Analysis export requires a completed analysis stage");
        };

        let input_file = workspace
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let config = workspace.config();

        let metadata = ExportMetadata {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_file,
            report_file: report_file.display().to_string(),
            top_k: config.top_k,
            method: config.method,
        };

        let export = match analysis {
            AnalysisOutcome::Correlated {
                matrix,
                ranked,
                artifacts,
            } => Self {
                metadata,
                stage: workspace.stage(),
                cleaning: cleaned.stats.clone(),
                sort_column: sorted.sort_column.clone(),
                outcome: ExportOutcome::Correlated,
                columns: matrix.columns().to_vec(),
                matrix: matrix.rows(),
                qualifying_pairs: ranked.qualifying,
                ranked_pairs: ranked.pairs.clone(),
                artifacts: Some(artifacts.clone()),
            },
            AnalysisOutcome::InsufficientData { numeric_columns } => Self {
                metadata,
                stage: workspace.stage(),
                cleaning: cleaned.stats.clone(),
                sort_column: sorted.sort_column.clone(),
                outcome: ExportOutcome::InsufficientData,
                columns: numeric_columns.clone(),
                matrix: Vec::new(),
                qualifying_pairs: 0,
                ranked_pairs: Vec::new(),
                artifacts: None,
            },
        };

        Ok(export)
    }
}

/// Export the analysis record to a JSON file
pub fn export_analysis(export: &AnalysisExport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(export)
        .context("Failed to serialize analysis export to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write analysis export to {}", output_path.display()))?;

    Ok(())
}

/// Package the report, the JSON export and every plot into one zip archive.
///
/// Plots are stored under `plots/`; the source files are left in place.
pub fn bundle_report(
    report_path: &Path,
    analysis_path: &Path,
    artifacts: &[ArtifactHandle],
    zip_path: &Path,
) -> Result<()> {
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let zip_file = std::fs::File::create(zip_path)
        .with_context(|| format!("Failed to create zip file: {}", zip_path.display()))?;

    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut add_file_to_zip = |path: &Path, entry_name: String| -> Result<()> {
        zip.start_file(entry_name.as_str(), options)
            .with_context(|| format!("Failed to add {} to zip", entry_name))?;
        let content = std::fs::read(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        zip.write_all(&content)?;
        Ok(())
    };

    add_file_to_zip(report_path, entry_name(report_path, "report.html"))?;
    add_file_to_zip(analysis_path, entry_name(analysis_path, "analysis.json"))?;
    for handle in artifacts {
        let name = format!("plots/{}", entry_name(handle.path(), "plot.png"));
        add_file_to_zip(handle.path(), name)?;
    }

    zip.finish().context("Failed to finalize zip file")?;

    log::info!(
        "Bundled report, export and {} plot(s) into {}",
        artifacts.len(),
        zip_path.display()
    );

    Ok(())
}

fn entry_name(path: &Path, default_name: &str) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(default_name)
        .to_string()
}
