use polars::prelude::*;
use tracing::{debug, info};

pub const REWARD_VALUE: &str = "reward_value";
pub const UPPERCASE_COLUMNS: [&str; 2] = ["transaction_status", "transaction_type"];
pub const NAIVE_TIMESTAMP_COLUMNS: [&str; 3] = [
    "transaction_at",
    "referral_at",
    "referrer_membership_expired_date",
];

/// Literal that missing status/type values turn into once coerced to text.
pub const MISSING_TEXT: &str = "NAN";

/// Numeric reward values and uppercase transaction status/type.
pub fn fix_types(df: DataFrame) -> PolarsResult<DataFrame> {
    let mut exprs: Vec<Expr> = Vec::new();

    match df.column(REWARD_VALUE) {
        Ok(column) => exprs.push(reward_expr(column.dtype())),
        Err(_) => debug!(column = REWARD_VALUE, "column absent, skipping numeric coercion"),
    }

    for name in UPPERCASE_COLUMNS {
        if df.column(name).is_err() {
            debug!(column = name, "column absent, skipping uppercase");
            continue;
        }
        exprs.push(
            col(name)
                .cast(DataType::String)
                .str()
                .to_uppercase()
                .fill_null(lit(MISSING_TEXT))
                .alias(name),
        );
    }

    let fixed = if exprs.is_empty() {
        df
    } else {
        df.lazy().with_columns(exprs).collect()?
    };
    info!("Data type fixes done");
    Ok(fixed)
}

/// Text rewards lose their thousands separators; anything that still is not a number
/// becomes null.
fn reward_expr(dtype: &DataType) -> Expr {
    let numeric = if dtype.is_integer() || dtype.is_float() {
        col(REWARD_VALUE).cast(DataType::Float64)
    } else {
        col(REWARD_VALUE)
            .cast(DataType::String)
            .str()
            .replace_all(lit(","), lit(""), true)
            .str()
            .strip_chars(lit(NULL))
            .cast(DataType::Float64)
    };
    when(numeric.clone().is_nan())
        .then(lit(NULL).cast(DataType::Float64))
        .otherwise(numeric)
        .alias(REWARD_VALUE)
}

/// Drops the zone from the comparison timestamps, keeping their UTC wall-clock value.
pub fn strip_timezones(df: DataFrame) -> PolarsResult<DataFrame> {
    let exprs: Vec<Expr> = NAIVE_TIMESTAMP_COLUMNS
        .iter()
        .filter(|name| {
            df.column(name)
                .is_ok_and(|column| matches!(column.dtype(), DataType::Datetime(_, Some(_))))
        })
        .map(|name| {
            col(*name)
                .cast(DataType::Datetime(TimeUnit::Microseconds, None))
                .alias(*name)
        })
        .collect();

    let naive = if exprs.is_empty() {
        df
    } else {
        df.lazy().with_columns(exprs).collect()?
    };
    info!("Timezone normalization done");
    Ok(naive)
}
