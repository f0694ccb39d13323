//! eda-report: Exploratory Data Analysis CLI Tool
//!
//! A command-line tool that loads a dataset, cleans and sorts it, ranks its
//! strongest correlations and writes a self-contained HTML report.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use eda_report::cli::Cli;
use eda_report::pipeline::{dataset_stats, AnalysisOutcome, Workspace};
use eda_report::report::{
    bundle_report, export_analysis, AnalysisExport, PngEmitter, RunSummary, StageTimings,
};
use eda_report::utils::{
    create_spinner, finish_with_error, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_count, print_info, print_step_header, print_step_time,
    print_success, print_warning,
};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let output_path = cli.output_path();
    let plots_dir = cli.plots_dir();

    // Print styled banner
    print_banner(env!("CARGO_PKG_VERSION"));

    // Print configuration card
    print_config(
        &cli.input,
        &output_path,
        &plots_dir,
        cli.top_k,
        &cli.method.to_string(),
    );

    let mut workspace = Workspace::new(cli.pipeline_config());
    let mut emitter = PngEmitter::new(&plots_dir);
    let mut timings = StageTimings::default();

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading dataset...");
    let raw = match workspace.load(&cli.input) {
        Ok(df) => df,
        Err(e) => {
            finish_with_error(&spinner, "Failed to load dataset");
            return Err(e.into());
        }
    };
    let stats = dataset_stats(raw);
    finish_with_success(&spinner, "Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", stats.rows);
    println!("      Columns: {}", stats.columns);
    println!("      Estimated memory: {:.2} MB", stats.memory_mb);
    timings.load = step_start.elapsed();
    print_step_time(timings.load);

    // Step 2: Clean
    print_step_header(2, "Clean Data");
    let step_start = Instant::now();
    let spinner = create_spinner("Removing duplicates and null rows...");
    let cleaned = match workspace.clean() {
        Ok(view) => view,
        Err(e) => {
            finish_with_error(&spinner, "Cleaning failed");
            return Err(e.into());
        }
    };
    finish_with_success(&spinner, "Cleaning complete");

    let removed = cleaned.stats.duplicates_removed + cleaned.stats.null_rows_removed;
    if removed == 0 {
        print_info("No duplicate or incomplete rows found");
    } else {
        print_count(
            "row(s) removed",
            removed,
            Some(&format!(
                "({} duplicate, {} with nulls)",
                cleaned.stats.duplicates_removed, cleaned.stats.null_rows_removed
            )),
        );
    }
    if !cleaned.stats.renamed_columns.is_empty() {
        print_count("column name(s) normalised", cleaned.stats.renamed_columns.len(), None);
    }
    print_success(&format!("{} rows remain", cleaned.stats.rows_after));
    timings.clean = step_start.elapsed();
    print_step_time(timings.clean);

    // Step 3: Sort
    print_step_header(3, "Sort Data");
    let step_start = Instant::now();
    let sorted = workspace.sort()?;
    match &sorted.sort_column {
        Some(column) => print_success(&format!("Sorted by column: {}", column)),
        None => print_warning("No numeric columns found to sort"),
    }
    timings.sort = step_start.elapsed();
    print_step_time(timings.sort);

    // Step 4: Correlation analysis
    print_step_header(4, "Correlation Analysis");
    let step_start = Instant::now();
    let spinner = create_spinner("Computing correlations and rendering plots...");
    let analysis = match workspace.analyze(&mut emitter) {
        Ok(outcome) => outcome,
        Err(e) => {
            finish_with_error(&spinner, "Analysis failed");
            return Err(e.into());
        }
    };

    match analysis {
        AnalysisOutcome::Correlated {
            matrix,
            ranked,
            artifacts,
        } => {
            finish_with_success(&spinner, "Correlation analysis complete");
            print_count(
                "correlated pair(s)",
                ranked.qualifying,
                Some(&format!("across {} numeric columns", matrix.len())),
            );
            for pair in ranked.iter() {
                println!(
                    "      {} {} vs {} (corr={:.2})",
                    style("•").dim(),
                    pair.first,
                    pair.second,
                    pair.correlation
                );
            }
            print_success(&format!(
                "Rendered {} plot(s) to {}",
                artifacts.handles().count(),
                plots_dir.display()
            ));
        }
        AnalysisOutcome::InsufficientData { numeric_columns } => {
            finish_with_warning(&spinner, "Analysis skipped");
            print_warning(&format!(
                "No numeric columns to correlate ({} found, 2 required)",
                numeric_columns.len()
            ));
        }
    }
    timings.analyze = step_start.elapsed();
    print_step_time(timings.analyze);

    // Step 5: Report
    print_step_header(5, "Generate Report");
    let step_start = Instant::now();
    let spinner = create_spinner("Assembling HTML report...");
    let report = match workspace.report() {
        Ok(view) => view,
        Err(e) => {
            finish_with_error(&spinner, "Report generation failed");
            return Err(e.into());
        }
    };
    std::fs::write(&output_path, &report.html)
        .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
    let artifacts = report.artifacts.clone();
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));

    let analysis_path = cli.analysis_path();
    let export = AnalysisExport::from_workspace(&workspace, &output_path)?;
    export_analysis(&export, &analysis_path)?;
    print_success(&format!("Analysis exported to {}", analysis_path.display()));

    if cli.bundle {
        let bundle_path = cli.bundle_path();
        bundle_report(&output_path, &analysis_path, &artifacts, &bundle_path)?;
        print_success(&format!("Bundle written to {}", bundle_path.display()));
    }
    timings.report = step_start.elapsed();
    print_step_time(timings.report);

    // Display summary
    RunSummary::from_workspace(&workspace, timings).display();

    // Final completion message
    print_completion(&output_path);

    Ok(())
}
