//! eda-report: Exploratory Data Analysis Report Library
//!
//! A library for cleaning a tabular dataset, ranking its strongest
//! correlations and assembling a self-contained HTML report.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
