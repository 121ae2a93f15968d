use std::borrow::Cow;

use polars::prelude::*;
use tracing::{debug, info};

use crate::columns::{column_bools, column_strings, datetime_series, is_text};
use crate::error::{PipelineError, Result};
use crate::loader::Datasets;
use crate::tables::TableSpec;
use crate::text::title_case;
use crate::timestamps::parse_timestamp_micros;

/// Cleans every input table according to its `TableSpec`.
pub fn normalize(datasets: Datasets) -> Result<Datasets> {
    let cleaned = datasets.try_map(|table, df| normalize_table(table.spec(), df))?;
    info!("Data cleaning done");
    Ok(cleaned)
}

/// Timestamp parsing, required-field drop, boolean defaulting, then title-casing.
pub fn normalize_table(spec: &TableSpec, df: DataFrame) -> Result<DataFrame> {
    let before = df.height();
    let df = parse_timestamp_columns(df, spec.timestamp_columns)?;
    let df = drop_missing_required(df, spec)?;
    let df = default_boolean_columns(df, spec.boolean_columns)?;
    let df = title_case_text_columns(df, spec.title_case_exclusions)?;

    debug!(
        table = spec.name,
        rows_in = before,
        rows_out = df.height(),
        "Normalized table"
    );
    Ok(df)
}

/// Re-types the named text columns as UTC datetimes. Cells that do not parse become null.
pub fn parse_timestamp_columns(mut df: DataFrame, columns: &[&str]) -> PolarsResult<DataFrame> {
    for &name in columns {
        let Ok(column) = df.column(name) else {
            continue;
        };
        if matches!(column.dtype(), DataType::Datetime(_, _)) {
            continue;
        }

        let micros: Vec<Option<i64>> = column_strings(column)?
            .into_iter()
            .map(|value| value.as_deref().and_then(parse_timestamp_micros))
            .collect();
        let parsed = datetime_series(name.into(), micros, true)?;
        df.with_column(parsed)?;
    }
    Ok(df)
}

pub fn drop_missing_required(df: DataFrame, spec: &TableSpec) -> Result<DataFrame> {
    if spec.required_columns.is_empty() {
        return Ok(df);
    }

    let mut predicate: Option<Expr> = None;
    for &name in spec.required_columns {
        if df.column(name).is_err() {
            return Err(PipelineError::missing_column(spec.name, name));
        }
        let present = col(name).is_not_null();
        predicate = Some(match predicate {
            Some(existing) => existing.and(present),
            None => present,
        });
    }

    match predicate {
        Some(predicate) => Ok(df.lazy().filter(predicate).collect()?),
        None => Ok(df),
    }
}

/// Nulls become `false`; every other value is cast to a boolean.
pub fn default_boolean_columns(mut df: DataFrame, columns: &[&str]) -> PolarsResult<DataFrame> {
    for &name in columns {
        let Ok(column) = df.column(name) else {
            debug!(column = name, "boolean column absent, skipping");
            continue;
        };
        let values: Vec<bool> = column_bools(column)?
            .into_iter()
            .map(|value| value.unwrap_or(false))
            .collect();
        df.with_column(Series::new(name.into(), values))?;
    }
    Ok(df)
}

/// Title-cases every text column not listed in `exclusions`. Nulls stay null.
pub fn title_case_text_columns(mut df: DataFrame, exclusions: &[&str]) -> PolarsResult<DataFrame> {
    let targets: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|column| is_text(column) && !exclusions.contains(&column.name().as_str()))
        .map(|column| column.name().clone())
        .collect();

    for name in targets {
        let titled = df
            .column(name.as_str())?
            .str()?
            .apply_values(|value| Cow::Owned(title_case(value)));
        df.with_column(titled.into_series())?;
    }
    Ok(df)
}
