//! Pipeline workspace: the stage state machine and its named views
//!
//! ```text
//! Empty → Loaded → Cleaned → Sorted → Analyzed → Reported
//! ```
//!
//! Each stage reads the previous stage's view and stores a new one; earlier
//! views are never modified. Re-running a stage replaces its own view and
//! discards everything downstream of it.

use std::fmt;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;

use super::analysis::{analyze_dataset, AnalysisOutcome};
use super::cleaning::{clean_dataset, CleaningStats};
use super::correlation::CorrelationMethod;
use super::error::PipelineError;
use super::loader::load_dataset;
use super::ranking::DEFAULT_TOP_K;
use super::sorting::sort_dataset;
use crate::report::{render_report, ArtifactEmitter, ArtifactHandle, ImageEmbedding, ReportContext};

/// Position of the workspace in the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Empty,
    Loaded,
    Cleaned,
    Sorted,
    Analyzed,
    Reported,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Empty => "empty",
            Stage::Loaded => "load",
            Stage::Cleaned => "clean",
            Stage::Sorted => "sort",
            Stage::Analyzed => "analyze",
            Stage::Reported => "report",
        };
        write!(f, "{}", name)
    }
}

/// Settings consumed by the stages
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Rows sampled for CSV schema inference (0 = full scan)
    pub infer_schema_length: usize,
    /// Maximum number of scatter-pair artifacts to request
    pub top_k: usize,
    pub method: CorrelationMethod,
    /// Rows shown in the report's sample table
    pub sample_rows: usize,
    pub images: ImageEmbedding,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            infer_schema_length: 10_000,
            top_k: DEFAULT_TOP_K,
            method: CorrelationMethod::Auto,
            sample_rows: 5,
            images: ImageEmbedding::Inline,
        }
    }
}

/// Output of the clean stage
#[derive(Debug, Clone)]
pub struct CleanedView {
    pub data: DataFrame,
    pub stats: CleaningStats,
}

/// Output of the sort stage
#[derive(Debug, Clone)]
pub struct SortedView {
    pub data: DataFrame,
    /// `None` when the dataset had no numeric column to sort by
    pub sort_column: Option<String>,
}

/// Output of the report stage
#[derive(Debug, Clone)]
pub struct ReportView {
    pub html: String,
    /// Every artifact the report depends on, in request order
    pub artifacts: Vec<ArtifactHandle>,
}

/// Sole owner of the dataset views threaded through the pipeline
#[derive(Debug, Default)]
pub struct Workspace {
    config: PipelineConfig,
    stage: Stage,
    source: Option<PathBuf>,
    raw: Option<DataFrame>,
    cleaned: Option<CleanedView>,
    sorted: Option<SortedView>,
    analysis: Option<AnalysisOutcome>,
    report: Option<ReportView>,
}

impl Workspace {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn raw(&self) -> Option<&DataFrame> {
        self.raw.as_ref()
    }

    pub fn cleaned(&self) -> Option<&CleanedView> {
        self.cleaned.as_ref()
    }

    pub fn sorted(&self) -> Option<&SortedView> {
        self.sorted.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisOutcome> {
        self.analysis.as_ref()
    }

    pub fn report_view(&self) -> Option<&ReportView> {
        self.report.as_ref()
    }

    /// Read the source file into the raw view. Loading again starts a fresh run.
    pub fn load(&mut self, path: &Path) -> Result<&DataFrame, PipelineError> {
        let df = load_dataset(path, self.config.infer_schema_length)
            .map_err(|source| failed(Stage::Loaded, source))?;

        self.enter(Stage::Loaded);
        self.source = Some(path.to_path_buf());
        Ok(self.raw.insert(df))
    }

    /// Raw view → cleaned view
    pub fn clean(&mut self) -> Result<&CleanedView, PipelineError> {
        let raw = self.raw.as_ref().ok_or(PipelineError::OutOfOrder {
            stage: Stage::Cleaned,
            requires: Stage::Loaded,
        })?;

        let (data, stats) = clean_dataset(raw).map_err(|source| failed(Stage::Cleaned, source))?;

        self.enter(Stage::Cleaned);
        Ok(self.cleaned.insert(CleanedView { data, stats }))
    }

    /// Cleaned view → sorted view
    pub fn sort(&mut self) -> Result<&SortedView, PipelineError> {
        let cleaned = self.cleaned.as_ref().ok_or(PipelineError::OutOfOrder {
            stage: Stage::Sorted,
            requires: Stage::Cleaned,
        })?;

        let (data, sort_column) =
            sort_dataset(&cleaned.data).map_err(|source| failed(Stage::Sorted, source))?;

        self.enter(Stage::Sorted);
        Ok(self.sorted.insert(SortedView { data, sort_column }))
    }

    /// Sorted view → correlation matrix, ranked pairs and rendered artifacts
    pub fn analyze(
        &mut self,
        emitter: &mut dyn ArtifactEmitter,
    ) -> Result<&AnalysisOutcome, PipelineError> {
        let sorted = self.sorted.as_ref().ok_or(PipelineError::OutOfOrder {
            stage: Stage::Analyzed,
            requires: Stage::Sorted,
        })?;

        let outcome = analyze_dataset(
            &sorted.data,
            self.config.top_k,
            self.config.method,
            emitter,
        )
        .map_err(|source| failed(Stage::Analyzed, source))?;

        self.enter(Stage::Analyzed);
        Ok(self.analysis.insert(outcome))
    }

    /// Assemble the HTML report from the sorted view and the analysis outcome
    pub fn report(&mut self) -> Result<&ReportView, PipelineError> {
        let out_of_order = PipelineError::OutOfOrder {
            stage: Stage::Reported,
            requires: Stage::Analyzed,
        };
        let (Some(cleaned), Some(sorted), Some(analysis)) =
            (&self.cleaned, &self.sorted, &self.analysis)
        else {
            return Err(out_of_order);
        };

        let ctx = ReportContext {
            data: &sorted.data,
            cleaning: &cleaned.stats,
            sort_column: sorted.sort_column.as_deref(),
            outcome: analysis,
            sample_rows: self.config.sample_rows,
            images: self.config.images,
        };
        let html = render_report(&ctx).map_err(|source| failed(Stage::Reported, source))?;
        let artifacts = analysis
            .artifacts()
            .map(|a| a.handles().cloned().collect())
            .unwrap_or_default();

        self.enter(Stage::Reported);
        Ok(self.report.insert(ReportView { html, artifacts }))
    }

    /// Run every stage in order, halting on the first failure
    pub fn run_all(
        &mut self,
        path: &Path,
        emitter: &mut dyn ArtifactEmitter,
    ) -> Result<&ReportView, PipelineError> {
        self.load(path)?;
        self.clean()?;
        self.sort()?;
        self.analyze(emitter)?;
        self.report()
    }

    /// Move to `stage`, discarding every view produced after it
    fn enter(&mut self, stage: Stage) {
        if stage <= Stage::Loaded {
            self.raw = None;
            self.source = None;
        }
        if stage <= Stage::Cleaned {
            self.cleaned = None;
        }
        if stage <= Stage::Sorted {
            self.sorted = None;
        }
        if stage <= Stage::Analyzed {
            self.analysis = None;
        }
        self.report = None;

        log::debug!("Workspace entered {} stage", stage);
        self.stage = stage;
    }
}

fn failed(stage: Stage, source: anyhow::Error) -> PipelineError {
    log::error!("{} stage failed: {:#}", stage, source);
    PipelineError::StageFailed { stage, source }
}
