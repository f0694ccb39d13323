//! Self-contained HTML report assembly

use std::fmt::Write;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use polars::prelude::*;

use super::artifacts::ArtifactHandle;
use super::statistics::{describe, ColumnSummary};
use crate::pipeline::{AnalysisOutcome, CleaningStats, CorrelationMatrix, RankedPairs};

/// How rendered images end up in the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageEmbedding {
    /// Base64 data URIs; the HTML file stands alone
    #[default]
    Inline,
    /// `src` points at the artifact path
    Linked,
}

/// Everything the report stage reads
pub struct ReportContext<'a> {
    pub data: &'a DataFrame,
    pub cleaning: &'a CleaningStats,
    pub sort_column: Option<&'a str>,
    pub outcome: &'a AnalysisOutcome,
    pub sample_rows: usize,
    pub images: ImageEmbedding,
}

const STYLE: &str = r#"
        body {
            font-family: Arial, sans-serif;
            margin: 40px;
            background-color: #f8f9fa;
            color: #333;
        }
        h1, h2, h3 {
            color: #2c3e50;
        }
        .table {
            width: 100%;
            border-collapse: collapse;
            margin-bottom: 20px;
        }
        .table th, .table td {
            border: 1px solid #ccc;
            padding: 8px;
            text-align: left;
        }
        .table-striped tbody tr:nth-of-type(odd) {
            background-color: #f2f2f2;
        }
        .notice {
            padding: 12px;
            border-left: 4px solid #e67e22;
            background-color: #fdf2e9;
        }
        figure {
            margin: 0 0 30px 0;
        }
"#;

/// Render the full report as one HTML document
pub fn render_report(ctx: &ReportContext<'_>) -> Result<String> {
    let mut html = String::new();

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html>")?;
    writeln!(html, "<head>")?;
    writeln!(html, "    <meta charset=\"utf-8\">")?;
    writeln!(html, "    <title>Dataset Report</title>")?;
    writeln!(html, "    <style>{}    </style>", STYLE)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "    <h1>📊 Business Report on Dataset Analysis</h1>")?;

    write_overview(&mut html, ctx)?;
    write_cleaning(&mut html, ctx)?;
    write_visualizations(&mut html, ctx)?;

    let summaries = describe(ctx.data).context("Failed to compute summary statistics")?;
    write_statistics(&mut html, &summaries)?;
    write_observations(&mut html, ctx)?;

    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;

    Ok(html)
}

fn write_overview(html: &mut String, ctx: &ReportContext<'_>) -> Result<()> {
    let columns: Vec<String> = ctx
        .data
        .get_column_names()
        .iter()
        .map(|s| escape_html(s.as_str()))
        .collect();

    writeln!(html, "    <h2>1. Dataset Overview</h2>")?;
    writeln!(
        html,
        "    <p><strong>Total Rows:</strong> {}</p>",
        ctx.data.height()
    )?;
    writeln!(
        html,
        "    <p><strong>Columns:</strong> {}</p>",
        columns.join(", ")
    )?;

    let sample = ctx.data.head(Some(ctx.sample_rows));
    writeln!(
        html,
        "    <h3>Sample Data (Top {} rows)</h3>",
        sample.height()
    )?;
    writeln!(html, "    <table class=\"table table-bordered\">")?;
    writeln!(html, "        <thead><tr>")?;
    for name in &columns {
        writeln!(html, "            <th>{}</th>", name)?;
    }
    writeln!(html, "        </tr></thead>")?;
    writeln!(html, "        <tbody>")?;
    for row in 0..sample.height() {
        write!(html, "            <tr>")?;
        for col in sample.get_columns() {
            let value = col.as_materialized_series().get(row)?;
            write!(html, "<td>{}</td>", escape_html(&cell_text(&value)))?;
        }
        writeln!(html, "</tr>")?;
    }
    writeln!(html, "        </tbody>")?;
    writeln!(html, "    </table>")?;

    Ok(())
}

fn write_cleaning(html: &mut String, ctx: &ReportContext<'_>) -> Result<()> {
    let stats = ctx.cleaning;

    writeln!(html, "    <h2>2. Data Cleaning</h2>")?;
    writeln!(
        html,
        "    <p>Removed {} duplicate row(s) and {} row(s) with missing values \
         ({} of {} rows kept). Data is clean and ready for analysis.</p>",
        stats.duplicates_removed, stats.null_rows_removed, stats.rows_after, stats.rows_before
    )?;

    if !stats.renamed_columns.is_empty() {
        writeln!(html, "    <p>Normalised column names:</p>")?;
        writeln!(html, "    <ul>")?;
        for (original, renamed) in &stats.renamed_columns {
            writeln!(
                html,
                "        <li><code>{}</code> → <code>{}</code></li>",
                escape_html(original),
                escape_html(renamed)
            )?;
        }
        writeln!(html, "    </ul>")?;
    }

    match ctx.sort_column {
        Some(column) => writeln!(
            html,
            "    <p>Rows sorted by <code>{}</code>.</p>",
            escape_html(column)
        )?,
        None => writeln!(html, "    <p>No numeric columns found to sort.</p>")?,
    }

    Ok(())
}

fn write_visualizations(html: &mut String, ctx: &ReportContext<'_>) -> Result<()> {
    writeln!(html, "    <h2>3. EDA Visualizations</h2>")?;

    let (matrix, ranked, artifacts) = match ctx.outcome {
        AnalysisOutcome::Correlated {
            matrix,
            ranked,
            artifacts,
        } => (matrix, ranked, artifacts),
        AnalysisOutcome::InsufficientData { numeric_columns } => {
            writeln!(
                html,
                "    <p class=\"notice\">No numeric columns to correlate: found {} numeric \
                 column(s), at least 2 are required.</p>",
                numeric_columns.len()
            )?;
            return Ok(());
        }
    };

    writeln!(html, "    <h3>Correlation Heatmap</h3>")?;
    write_image(html, &artifacts.heatmap, "Correlation Heatmap", ctx.images)?;
    write_matrix_table(html, matrix)?;
    write_ranked_table(html, ranked)?;

    for scatter in &artifacts.scatters {
        let caption = format!(
            "{} vs {} (corr={:.2})",
            scatter.pair.first, scatter.pair.second, scatter.pair.correlation
        );
        write_image(html, &scatter.handle, &caption, ctx.images)?;
    }

    Ok(())
}

fn write_matrix_table(html: &mut String, matrix: &CorrelationMatrix) -> Result<()> {
    writeln!(html, "    <table class=\"table table-bordered\">")?;
    write!(html, "        <thead><tr><th></th>")?;
    for name in matrix.columns() {
        write!(html, "<th>{}</th>", escape_html(name))?;
    }
    writeln!(html, "</tr></thead>")?;
    writeln!(html, "        <tbody>")?;
    for (i, name) in matrix.columns().iter().enumerate() {
        write!(html, "            <tr><th>{}</th>", escape_html(name))?;
        for j in 0..matrix.len() {
            write!(html, "<td>{}</td>", format_number(matrix.value(i, j), 2))?;
        }
        writeln!(html, "</tr>")?;
    }
    writeln!(html, "        </tbody>")?;
    writeln!(html, "    </table>")?;
    Ok(())
}

fn write_ranked_table(html: &mut String, ranked: &RankedPairs) -> Result<()> {
    writeln!(
        html,
        "    <h3>Top Correlated Pairs (showing {} of {})</h3>",
        ranked.len(),
        ranked.qualifying
    )?;

    if ranked.is_empty() {
        writeln!(
            html,
            "    <p class=\"notice\">No column pair has a defined correlation.</p>"
        )?;
        return Ok(());
    }

    writeln!(html, "    <table class=\"table table-striped\">")?;
    writeln!(
        html,
        "        <thead><tr><th>Rank</th><th>Feature 1</th><th>Feature 2</th><th>Correlation</th></tr></thead>"
    )?;
    writeln!(html, "        <tbody>")?;
    for (rank, pair) in ranked.iter().enumerate() {
        writeln!(
            html,
            "            <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            rank + 1,
            escape_html(&pair.first),
            escape_html(&pair.second),
            format_number(pair.correlation, 4)
        )?;
    }
    writeln!(html, "        </tbody>")?;
    writeln!(html, "    </table>")?;
    Ok(())
}

fn write_image(
    html: &mut String,
    handle: &ArtifactHandle,
    caption: &str,
    mode: ImageEmbedding,
) -> Result<()> {
    let src = match mode {
        ImageEmbedding::Inline => {
            let bytes = std::fs::read(handle.path())
                .with_context(|| format!("Failed to read image: {}", handle))?;
            format!("data:image/png;base64,{}", STANDARD.encode(bytes))
        }
        ImageEmbedding::Linked => escape_html(&handle.path().display().to_string()),
    };

    writeln!(html, "    <figure>")?;
    writeln!(
        html,
        "        <img src=\"{}\" alt=\"{}\" width=\"700px\"/>",
        src,
        escape_html(caption)
    )?;
    writeln!(html, "        <figcaption>{}</figcaption>", escape_html(caption))?;
    writeln!(html, "    </figure>")?;
    Ok(())
}

fn write_statistics(html: &mut String, summaries: &[ColumnSummary]) -> Result<()> {
    writeln!(html, "    <h2>4. Summary Statistics</h2>")?;

    if summaries.is_empty() {
        writeln!(html, "    <p>No numeric columns to summarise.</p>")?;
        return Ok(());
    }

    writeln!(html, "    <table class=\"table table-striped\">")?;
    write!(html, "        <thead><tr><th></th>")?;
    for s in summaries {
        write!(html, "<th>{}</th>", escape_html(&s.name))?;
    }
    writeln!(html, "</tr></thead>")?;
    writeln!(html, "        <tbody>")?;

    for (row, label) in STAT_LABELS.iter().enumerate() {
        write!(html, "            <tr><th>{}</th>", label)?;
        for s in summaries {
            write!(html, "<td>{}</td>", format_number(stat_values(s)[row], 6))?;
        }
        writeln!(html, "</tr>")?;
    }

    writeln!(html, "        </tbody>")?;
    writeln!(html, "    </table>")?;
    Ok(())
}

const STAT_LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn stat_values(s: &ColumnSummary) -> [f64; 8] {
    [
        s.count as f64,
        s.mean,
        s.std,
        s.min,
        s.q25,
        s.median,
        s.q75,
        s.max,
    ]
}

fn write_observations(html: &mut String, ctx: &ReportContext<'_>) -> Result<()> {
    writeln!(html, "    <h2>5. Observations</h2>")?;
    writeln!(html, "    <ul>")?;
    match ctx.outcome.ranked().and_then(|r| r.pairs.first()) {
        Some(top) => writeln!(
            html,
            "        <li>The strongest relationship is between <code>{}</code> and \
             <code>{}</code> (corr={:.2}).</li>",
            escape_html(&top.first),
            escape_html(&top.second),
            top.correlation
        )?,
        None => writeln!(
            html,
            "        <li>No correlated column pairs were found.</li>"
        )?,
    }
    writeln!(
        html,
        "        <li>Top correlations are visualized using scatter plots.</li>"
    )?;
    writeln!(
        html,
        "        <li>Data distribution and outliers can be inferred from summary statistics and plots.</li>"
    )?;
    writeln!(html, "    </ul>")?;
    Ok(())
}

fn cell_text(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn format_number(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.*}", decimals, value)
    }
}

/// Escape text for use in element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
