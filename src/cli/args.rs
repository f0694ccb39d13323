//! Command-line argument definitions using clap

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::pipeline::{CorrelationMethod, PipelineConfig, DEFAULT_TOP_K};
use crate::report::ImageEmbedding;

/// eda-report - Clean a dataset, rank its strongest correlations and write an HTML report
#[derive(Parser, Debug)]
#[command(name = "eda-report")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output HTML report path.
    /// Defaults to input directory with '_report' suffix (e.g., data.csv → data_report.html).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for the rendered heatmap and scatter plots.
    /// Defaults to 'eda_plots' next to the report.
    #[arg(long)]
    pub plots_dir: Option<PathBuf>,

    /// Maximum number of correlated pairs to plot as scatter charts
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K, value_parser = validate_top_k)]
    pub top_k: usize,

    /// Number of rows shown in the report's sample table
    #[arg(long, default_value = "5")]
    pub sample_rows: usize,

    /// Correlation computation strategy.
    /// Options: "auto" (default, matrix method at 15+ numeric columns), "pairwise" or "matrix"
    #[arg(long, default_value = "auto", value_parser = parse_method)]
    pub method: CorrelationMethod,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Reference plot files from the report instead of embedding them
    #[arg(long, default_value = "false")]
    pub link_images: bool,

    /// Also package report, JSON export and plots into a zip archive
    #[arg(long, default_value = "false")]
    pub bundle: bool,
}

impl Cli {
    /// Get the report path, deriving from input if not explicitly provided.
    /// The derived path will be in the same directory as the input with a '_report.html' suffix.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.sibling_of_input("report.html"))
    }

    /// Get the plots directory, defaulting to 'eda_plots' beside the report
    pub fn plots_dir(&self) -> PathBuf {
        self.plots_dir.clone().unwrap_or_else(|| {
            let output = self.output_path();
            let parent = output.parent().unwrap_or_else(|| Path::new("."));
            parent.join("eda_plots")
        })
    }

    /// Get the JSON analysis export path, next to the report with an '_analysis.json' suffix
    pub fn analysis_path(&self) -> PathBuf {
        self.beside_output("analysis.json")
    }

    /// Get the zip bundle path, next to the report with a '.zip' extension
    pub fn bundle_path(&self) -> PathBuf {
        self.output_path().with_extension("zip")
    }

    /// Settings for the pipeline stages
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            infer_schema_length: self.infer_schema_length,
            top_k: self.top_k,
            method: self.method,
            sample_rows: self.sample_rows,
            images: if self.link_images {
                ImageEmbedding::Linked
            } else {
                ImageEmbedding::Inline
            },
        }
    }

    fn sibling_of_input(&self, suffix: &str) -> PathBuf {
        let parent = self.input.parent().unwrap_or_else(|| Path::new("."));
        let stem = self
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");
        parent.join(format!("{}_{}", stem, suffix))
    }

    fn beside_output(&self, suffix: &str) -> PathBuf {
        let output = self.output_path();
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("report");
        let stem = stem.strip_suffix("_report").unwrap_or(stem);
        parent.join(format!("{}_{}", stem, suffix))
    }
}

/// Validator for top_k parameter
fn validate_top_k(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid positive integer", s))?;

    if value == 0 {
        Err("top_k must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Parser for the correlation method
fn parse_method(s: &str) -> Result<CorrelationMethod, String> {
    s.parse()
}
