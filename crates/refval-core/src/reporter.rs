use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;
use tracing::{info, warn};

use crate::error::Result;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Zone-aware timestamps keep their offset in the output.
pub const AWARE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

pub const FINAL_COLUMNS: [&str; 21] = [
    "referral_id",
    "referral_source",
    "referral_source_category",
    "referral_at",
    "referrer_user_id",
    "referrer_name",
    "referrer_phone_number",
    "referrer_homeclub",
    "referee_id",
    "referee_name",
    "referee_phone",
    "description",
    "reward_value",
    "transaction_id",
    "transaction_status",
    "transaction_at",
    "transaction_location",
    "transaction_type",
    "updated_at",
    "created_at",
    "is_business_logic_valid",
];

/// Selects the report columns in their fixed order. Columns the joins never produced are
/// emitted as null text so the output layout stays stable.
pub fn project_final(df: &DataFrame) -> PolarsResult<DataFrame> {
    let height = df.height();
    let columns: Vec<Column> = FINAL_COLUMNS
        .iter()
        .map(|&name| match df.column(name) {
            Ok(column) => column.clone(),
            Err(_) => {
                warn!(column = name, "column missing from joined table, writing nulls");
                Column::full_null(name.into(), height, &DataType::String)
            }
        })
        .collect();
    DataFrame::new(columns)
}

/// Writes `df` as comma-delimited text with a header row, creating parent directories.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut rendered = render_aware_timestamps(df)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_datetime_format(Some(DATETIME_FORMAT.to_string()))
        .finish(&mut rendered)?;

    info!(path = %path.display(), rows = df.height(), "Final report generated");
    Ok(())
}

/// Zone-aware datetime columns as text with their UTC offset; naive ones are left to the
/// writer's format.
pub fn render_aware_timestamps(df: &DataFrame) -> PolarsResult<DataFrame> {
    let exprs: Vec<Expr> = df
        .get_columns()
        .iter()
        .filter(|column| matches!(column.dtype(), DataType::Datetime(_, Some(_))))
        .map(|column| {
            let name = column.name().as_str();
            col(name).dt().strftime(AWARE_DATETIME_FORMAT).alias(name)
        })
        .collect();

    if exprs.is_empty() {
        return Ok(df.clone());
    }
    df.clone().lazy().with_columns(exprs).collect()
}

/// Number of rows flagged valid by the business rule.
pub fn count_valid(df: &DataFrame) -> PolarsResult<usize> {
    let flags = df.column(crate::validator::IS_BUSINESS_LOGIC_VALID)?.bool()?;
    Ok(flags.into_iter().filter(|flag| *flag == Some(true)).count())
}
