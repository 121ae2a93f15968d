use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;
use refval_core::{pipeline, PipelineConfig, RunSummary};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Referral reward validation batch job", long_about = None)]
struct Cli {
    /// Directory holding the seven input CSV files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
    /// Directory the profiling workbook is written to
    #[arg(long, default_value = "profiling")]
    profiling_dir: PathBuf,
    /// Directory the validated referral CSV is written to
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// Emit JSON log lines and a JSON run summary
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = PipelineConfig {
        data_dir: cli.data_dir,
        profiling_dir: cli.profiling_dir,
        output_dir: cli.output_dir,
    };
    info!(data_dir = %config.data_dir.display(), "Starting referral validation");

    let summary = pipeline::run(&config).context("referral validation run failed")?;

    if cli.log_json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.set_header(vec!["stage", "rows"]);
    for entry in &summary.input_rows {
        table.add_row(vec![format!("input: {}", entry.table), entry.rows.to_string()]);
    }
    table.add_row(vec!["joined referrals".to_string(), summary.joined_rows.to_string()]);
    table.add_row(vec!["valid".to_string(), summary.valid_rows.to_string()]);
    table.add_row(vec!["invalid".to_string(), summary.invalid_rows.to_string()]);

    println!("{table}");
    println!("Profiling report: {}", summary.profiling_report.display());
    println!("Final report: {}", summary.output_file.display());
    println!("Total rows: {}", summary.output_rows);
}
