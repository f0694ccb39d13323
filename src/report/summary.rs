//! Run summary printed at the end of the pipeline

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{AnalysisOutcome, VariablePair, Workspace};

/// Wall-clock time spent in each stage
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    pub load: Duration,
    pub clean: Duration,
    pub sort: Duration,
    pub analyze: Duration,
    pub report: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.load + self.clean + self.sort + self.analyze + self.report
    }
}

/// Summary of one pipeline run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub duplicates_removed: usize,
    pub null_rows_removed: usize,
    pub rows_analyzed: usize,
    pub sort_column: Option<String>,
    pub numeric_columns: usize,
    pub qualifying_pairs: usize,
    pub top_pairs: Vec<VariablePair>,
    pub artifacts: usize,
    pub timings: StageTimings,
}

impl RunSummary {
    /// Collect the summary from whatever views the workspace holds
    pub fn from_workspace(workspace: &Workspace, timings: StageTimings) -> Self {
        let mut summary = Self {
            timings,
            ..Default::default()
        };

        if let Some(cleaned) = workspace.cleaned() {
            summary.rows_loaded = cleaned.stats.rows_before;
            summary.duplicates_removed = cleaned.stats.duplicates_removed;
            summary.null_rows_removed = cleaned.stats.null_rows_removed;
            summary.rows_analyzed = cleaned.stats.rows_after;
        }
        if let Some(sorted) = workspace.sorted() {
            summary.sort_column = sorted.sort_column.clone();
        }
        match workspace.analysis() {
            Some(AnalysisOutcome::Correlated {
                matrix,
                ranked,
                artifacts,
            }) => {
                summary.numeric_columns = matrix.len();
                summary.qualifying_pairs = ranked.qualifying;
                summary.top_pairs = ranked.pairs.clone();
                summary.artifacts = artifacts.handles().count();
            }
            Some(AnalysisOutcome::InsufficientData { numeric_columns }) => {
                summary.numeric_columns = numeric_columns.len();
            }
            None => {}
        }

        summary
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Rows Loaded"), Cell::new(self.rows_loaded)]);

        let removed = self.duplicates_removed + self.null_rows_removed;
        table.add_row(vec![
            Cell::new("🗑️  Rows Removed"),
            Cell::new(format!(
                "{} ({} duplicate, {} null)",
                removed, self.duplicates_removed, self.null_rows_removed
            ))
            .fg(if removed == 0 { Color::White } else { Color::Red }),
        ]);

        table.add_row(vec![
            Cell::new("✅ Rows Analyzed"),
            Cell::new(self.rows_analyzed)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("↕️  Sorted By"),
            Cell::new(self.sort_column.as_deref().unwrap_or("-")),
        ]);

        table.add_row(vec![
            Cell::new("🔢 Numeric Columns"),
            Cell::new(self.numeric_columns).fg(if self.numeric_columns < 2 {
                Color::Yellow
            } else {
                Color::White
            }),
        ]);

        table.add_row(vec![
            Cell::new("🔗 Qualifying Pairs"),
            Cell::new(self.qualifying_pairs),
        ]);

        table.add_row(vec![Cell::new("🖼️  Plots Rendered"), Cell::new(self.artifacts)]);

        table.add_row(vec![
            Cell::new("⏱️  Total Time"),
            Cell::new(format!("{:.2}s", self.timings.total().as_secs_f64())).fg(Color::Cyan),
        ]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if !self.top_pairs.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("🏆").cyan(),
                style("TOP CORRELATED PAIRS").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            println!();
            for (rank, pair) in self.top_pairs.iter().enumerate() {
                let value = style(format!("{:+.4}", pair.correlation));
                let value = if pair.correlation < 0.0 {
                    value.blue()
                } else {
                    value.red()
                };
                println!(
                    "      {}. {} {} {}  {}",
                    rank + 1,
                    pair.first,
                    style("↔").dim(),
                    pair.second,
                    value
                );
            }
        } else if self.numeric_columns < 2 {
            println!();
            println!(
                "    {} {}",
                style("⚠️").yellow(),
                style("No numeric columns to correlate").yellow()
            );
        }
    }
}
