//! Typed, null-preserving reads of DataFrame columns.
//!
//! Every reader accepts whatever dtype the CSV inference produced and returns one value per
//! row. Missing columns read as all-null so row rules can treat absent data as unknown.

use polars::prelude::*;

use crate::text::{parse_amount, parse_flag};

pub fn strings(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    match df.column(name) {
        Ok(column) => column_strings(column),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

pub fn column_strings(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let cast = column.cast(&DataType::String)?;
    let values = cast.str()?;
    Ok(values
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

pub fn floats(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let dtype = column.dtype();
    if dtype.is_float() || dtype.is_integer() {
        let cast = column.cast(&DataType::Float64)?;
        let values = cast.f64()?;
        Ok(values
            .into_iter()
            .map(|value| value.filter(|v| !v.is_nan()))
            .collect())
    } else {
        Ok(column_strings(column)?
            .into_iter()
            .map(|value| value.as_deref().and_then(parse_amount))
            .collect())
    }
}

pub fn bools(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<bool>>> {
    match df.column(name) {
        Ok(column) => column_bools(column),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

pub fn column_bools(column: &Column) -> PolarsResult<Vec<Option<bool>>> {
    let dtype = column.dtype();
    if matches!(dtype, DataType::Boolean) {
        let values = column.bool()?;
        Ok(values.into_iter().collect())
    } else if dtype.is_float() || dtype.is_integer() {
        let cast = column.cast(&DataType::Float64)?;
        let values = cast.f64()?;
        Ok(values
            .into_iter()
            .map(|value| value.filter(|v| !v.is_nan()).map(|v| v != 0.0))
            .collect())
    } else {
        Ok(column_strings(column)?
            .into_iter()
            .map(|value| value.as_deref().map(parse_flag))
            .collect())
    }
}

/// UTC microseconds for a datetime column, whatever its time unit or zone.
/// Columns that are not datetimes read as all-null.
pub fn timestamps(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    column_timestamps(column)
}

pub fn column_timestamps(column: &Column) -> PolarsResult<Vec<Option<i64>>> {
    let DataType::Datetime(_, tz) = column.dtype() else {
        return Ok(vec![None; column.len()]);
    };
    let cast = column.cast(&DataType::Datetime(TimeUnit::Microseconds, tz.clone()))?;
    let values = cast.datetime()?;
    Ok((0..values.len()).map(|idx| values.get(idx)).collect())
}

/// Builds a microsecond datetime series, optionally pinned to UTC.
pub fn datetime_series(
    name: PlSmallStr,
    micros: Vec<Option<i64>>,
    utc: bool,
) -> PolarsResult<Series> {
    let tz = if utc {
        Some(polars::prelude::TimeZone::UTC)
    } else {
        None
    };
    Series::new(name, micros).cast(&DataType::Datetime(TimeUnit::Microseconds, tz))
}

pub fn is_text(column: &Column) -> bool {
    matches!(column.dtype(), DataType::String)
}
