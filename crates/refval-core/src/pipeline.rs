use std::path::PathBuf;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::categorizer::categorize_sources;
use crate::coercion::{fix_types, strip_timezones};
use crate::error::Result;
use crate::joiner::join_all;
use crate::loader::{load_all, Datasets};
use crate::normalizer::normalize;
use crate::profiler::Profiler;
use crate::reporter::{count_valid, project_final, write_csv};
use crate::validator::apply_business_rules;

pub const PROFILING_REPORT_FILE: &str = "profiling_report.xlsx";
pub const OUTPUT_FILE: &str = "referral_reward_validation.csv";

/// Where a run reads its inputs and writes its artifacts.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub profiling_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            profiling_dir: PathBuf::from("profiling"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PipelineConfig {
    pub fn profiling_report_path(&self) -> PathBuf {
        self.profiling_dir.join(PROFILING_REPORT_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_FILE)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableRows {
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input_rows: Vec<TableRows>,
    pub joined_rows: usize,
    pub output_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub profiling_report: PathBuf,
    pub output_file: PathBuf,
}

/// Load, profile, transform and write one batch.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let datasets = load_all(&config.data_dir)?;

    let input_rows = datasets
        .iter()
        .map(|(table, df)| TableRows {
            table: table.name().to_string(),
            rows: df.height(),
        })
        .collect();

    let profiler = profile_all(&datasets)?;
    let profiling_report = config.profiling_report_path();
    profiler.write_report(&profiling_report)?;

    let validated = transform(datasets)?;
    let joined_rows = validated.height();

    let final_df = project_final(&validated)?;
    let output_file = config.output_path();
    write_csv(&final_df, &output_file)?;

    let valid_rows = count_valid(&final_df)?;
    let summary = RunSummary {
        input_rows,
        joined_rows,
        output_rows: final_df.height(),
        valid_rows,
        invalid_rows: final_df.height() - valid_rows,
        profiling_report,
        output_file,
    };
    info!(
        rows = summary.output_rows,
        valid = summary.valid_rows,
        "Referral validation finished"
    );
    Ok(summary)
}

/// Profiles every raw table, in load order.
pub fn profile_all(datasets: &Datasets) -> Result<Profiler> {
    let mut profiler = Profiler::new();
    for (table, df) in datasets.iter() {
        profiler.profile(df, table.name())?;
    }
    Ok(profiler)
}

/// Every in-memory stage after loading: clean, join, coerce, categorize, validate.
pub fn transform(datasets: Datasets) -> Result<DataFrame> {
    let cleaned = normalize(datasets)?;
    let joined = join_all(&cleaned)?;
    let typed = fix_types(joined)?;
    let naive = strip_timezones(typed)?;
    let categorized = categorize_sources(naive)?;
    Ok(apply_business_rules(categorized)?)
}
